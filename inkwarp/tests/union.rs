use inkwarp::algorithms::union::{unite, unite_with, BoundaryGeometry, Contour, ContourNode};
use inkwarp::{distort_markup, DistortParams, Path, PathSet, Point, Style};

fn circle(id: &str, cx: f64, cy: f64, r: f64) -> Path {
    let mut p = PathSet::fallback_circle(cx, cy, r).paths.remove(0);
    p.id = id.to_string();
    p
}

#[test]
fn overlapping_circles_become_one_closed_outline() {
    let set = PathSet::new(vec![circle("a", 0.0, 0.0, 50.0), circle("b", 60.0, 0.0, 50.0)]);
    let out = unite(&set);
    assert_eq!(out.len(), 1);
    let p = out.get(0).unwrap();
    assert_eq!(p.id, "unified-0");
    assert!(p.closed);
    assert!(p.segments.iter().all(|s| s.is_finite()));
    // the outline passes through both far ends
    let xs: Vec<f64> = p.segments.iter().map(|s| s.p1.x).collect();
    let min = xs.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = xs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    assert!(min < -45.0 && max > 105.0, "extent {min}..{max}");
    for w in p.segments.windows(2) {
        assert!(w[0].p2.distance(w[1].p1) < 1e-3);
    }
}

#[test]
fn jittered_circles_unite_into_one_outline() {
    let markup = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 400 300">
        <circle cx="150" cy="150" r="100"/>
        <circle cx="250" cy="150" r="100"/>
    </svg>"#;
    let params = DistortParams { amount: 40.0, frequency: 50.0, ..Default::default() };
    let baked = distort_markup(markup, &params).baked.expect("baked geometry");
    assert_eq!(baked.len(), 2);
    let out = unite(&baked);
    assert_eq!(out.len(), 1, "self-crossings of the jittered outlines leave no loops of their own");
    let p = out.get(0).unwrap();
    assert!(p.closed);
    assert!(p.segments.iter().all(|s| s.is_finite()));
}

#[test]
fn union_takes_style_from_first_path() {
    let mut a = circle("a", 0.0, 0.0, 20.0);
    a.style = Style { fill: "#abcdef".into(), ..Style::default() };
    a.attributes.push(("class".into(), "ink".into()));
    let b = circle("b", 15.0, 0.0, 20.0);
    let out = unite(&PathSet::new(vec![a, b]));
    let p = out.get(0).unwrap();
    assert_eq!(p.style.fill, "#abcdef");
    assert_eq!(p.attributes, vec![("class".to_string(), "ink".to_string())]);
}

/// Backend that counts the paths folded into it and reports one triangle.
struct Counting;

impl BoundaryGeometry for Counting {
    type Boundary = usize;

    fn boundary(&self, _path: &Path) -> usize {
        1
    }

    fn unite(&self, a: &usize, b: &usize) -> usize {
        a + b
    }

    fn contours(&self, boundary: &usize) -> Vec<Contour> {
        let node = |x: f64| ContourNode { point: Point::new(x, *boundary as f64), handle_in: Point::ZERO, handle_out: Point::ZERO };
        vec![Contour { nodes: vec![node(0.0), node(1.0), node(2.0)], closed: true }]
    }
}

#[test]
fn union_folds_every_path_through_the_backend() {
    let set = PathSet::new((0..5).map(|i| circle(&format!("c{i}"), i as f64, 0.0, 1.0)).collect());
    let out = unite_with(&Counting, &set);
    assert_eq!(out.len(), 1);
    let p = out.get(0).unwrap();
    assert_eq!(p.segments.len(), 3);
    assert_eq!(p.segments[0].p1.y, 5.0);
    assert_eq!(p.segments[2].p2, p.segments[0].p1);
}
