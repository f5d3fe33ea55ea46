use inkwarp::algorithms::distort::{sample_count, DistortParams, RenderMode};
use inkwarp::svg::{baked_markup, filter_markup, path_data};
use inkwarp::{distort_markup, DistortionMode, Distorter};

const SQUARE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 200 200"><rect x="50" y="50" width="100" height="100" fill="#222" class="mark"/></svg>"##;

#[test]
fn open_line_without_amount_generates_nothing() {
    let markup = r#"<svg xmlns="http://www.w3.org/2000/svg"><line x1="0" y1="0" x2="120" y2="40"/></svg>"#;
    let params = DistortParams { amount: 0.0, ..Default::default() };
    let r = distort_markup(markup, &params);
    assert!(r.error.is_none());
    assert!(r.baked.is_none());
    assert_eq!(r.base_node_count, 2);
    assert_eq!(r.node_count, 2, "node count falls back to the base count");
}

#[test]
fn jittered_square_has_sample_count_anchors() {
    let params = DistortParams {
        mode: DistortionMode::Jitter,
        render: RenderMode::Bake,
        amount: 10.0,
        frequency: 20.0,
        smoothness: 0.0,
        seed: 8.0,
    };
    let r = distort_markup(SQUARE, &params);
    let expected = sample_count(400.0, 4, 20.0);
    assert_eq!(expected, 9);
    let baked = r.baked.expect("baked geometry");
    assert_eq!(baked.len(), 1);
    let path = baked.get(0).unwrap();
    assert!(path.closed);
    assert_eq!(path.id, "rect-0");
    assert_eq!(path.node_count(), expected);
    assert_eq!(r.node_count, expected);
    assert_eq!(r.base_node_count, 4);
    assert!(path_data(path).ends_with(" Z"));
    assert_eq!(path.style.fill, "#222");
    assert_eq!(path.style.stroke, "none");
}

#[test]
fn same_parameters_same_geometry() {
    let params = DistortParams { mode: DistortionMode::Tear, smoothness: 60.0, ..Default::default() };
    let a = distort_markup(SQUARE, &params);
    let b = distort_markup(SQUARE, &params);
    assert_eq!(a, b);
    let c = distort_markup(SQUARE, &DistortParams { seed: 9.0, ..params });
    assert_ne!(a.baked, c.baked);
}

#[test]
fn every_mode_bakes_finite_geometry() {
    for mode in DistortionMode::ALL {
        let params = DistortParams { mode, amount: 25.0, frequency: 45.0, smoothness: 120.0, ..Default::default() };
        let r = distort_markup(SQUARE, &params);
        let baked = r.baked.unwrap_or_else(|| panic!("{mode} produced no geometry"));
        assert!(baked.iter().all(|p| p.segments.iter().all(|s| s.is_finite())), "{mode}");
    }
}

#[test]
fn element_ids_count_skipped_elements() {
    let markup = r#"<svg xmlns="http://www.w3.org/2000/svg">
        <circle cx="50" cy="50" r="20"/>
        <rect x="0" y="0" width="0" height="10"/>
        <g><polyline points="0,0 30,0 30,30"/></g>
    </svg>"#;
    let r = distort_markup(markup, &DistortParams::default());
    let ids: Vec<&str> = r.baked.as_ref().unwrap().iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, ["circle-0", "polyline-2"]);
    assert_eq!(r.base_node_count, 4 + 3);
}

#[test]
fn invalid_markup_is_reported_in_the_result() {
    let r = distort_markup("<svg><rect></svg>", &DistortParams::default());
    assert!(r.error.as_deref().is_some_and(|e| e.starts_with("Invalid SVG markup")));
    assert_eq!(r.node_count, 0);
    assert!(r.baked.is_none());

    let empty = distort_markup("   ", &DistortParams::default());
    assert!(empty.error.is_none());
    assert_eq!(empty.node_count, 0);
}

#[test]
fn filter_mode_describes_instead_of_baking() {
    let params = DistortParams { mode: DistortionMode::InkSpread, render: RenderMode::Filter, ..Default::default() };
    let r = distort_markup(SQUARE, &params);
    assert!(r.baked.is_none());
    assert_eq!(r.node_count, 4);
    let desc = r.descriptor.expect("descriptor");
    let f = filter_markup(&desc);
    assert!(f.starts_with("<filter id=\"edgeDistort\""));
    assert!(f.contains("feGaussianBlur"));
    assert!(f.contains("baseFrequency=\"0.0250\""));
}

#[test]
fn distorter_memoises_and_always_exports_geometry() {
    let d = Distorter::from_markup(SQUARE).unwrap();
    let params = DistortParams { render: RenderMode::Filter, ..Default::default() };
    assert!(!d.is_cached(&params));
    let first = d.render(&params);
    assert!(d.is_cached(&params));
    assert!(first.preview.baked.is_none());
    assert!(first.export.baked.is_some());
    assert_eq!(d.render(&params), first);
    assert!(!d.is_cached(&DistortParams { amount: 13.0, ..params }));
}

#[test]
fn baked_markup_keeps_presentation_attributes() {
    let r = distort_markup(SQUARE, &DistortParams::default());
    let out = baked_markup(&r);
    assert!(out.contains("viewBox=\"0 0 200 200\""));
    assert!(out.contains("class=\"mark\""));
    assert!(out.contains("fill=\"#222\""));
    assert!(!out.contains(" width=\"100\""));
}
