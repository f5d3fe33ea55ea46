use inkwarp::{distort_markup, DistortParams, EditSession, EditorSettings, HandleKind, MirrorMode, Point};

const MARKUP: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 400 400">
    <circle cx="120" cy="200" r="80" fill="#334455"/>
    <circle cx="220" cy="200" r="80"/>
</svg>"##;

fn session() -> EditSession {
    EditSession::from_result(&distort_markup(MARKUP, &DistortParams { amount: 3.0, frequency: 50.0, ..Default::default() }))
}

#[test]
fn starts_from_first_path_paint() {
    let s = session();
    assert_eq!(s.paths().len(), 2);
    assert_eq!(s.style().fill, "#334455");
    assert_eq!(s.style().stroke_width, 1.0);
    assert!(s.paths().iter().all(|p| p.style.fill == "#334455"));
}

#[test]
fn anchor_drag_then_undo_redo() {
    let mut s = session();
    let before = s.paths().clone();
    let start = before.get(0).unwrap().segments[3].p1;
    assert!(s.begin_drag(0, 3, HandleKind::P1, start));
    assert!(s.drag_to(start.add(Point::new(5.0, 5.0))));
    assert!(s.end_drag());
    let p = s.paths().get(0).unwrap();
    assert_eq!(p.segments[3].p1, start.add(Point::new(5.0, 5.0)));
    assert_eq!(p.segments[2].p2, p.segments[3].p1);

    assert!(s.undo());
    assert_eq!(s.paths(), &before);
    assert!(s.redo());
    assert_ne!(s.paths(), &before);
}

#[test]
fn handle_drag_is_stored_at_unit_tension() {
    let mut s = session();
    s.set_settings(EditorSettings { tension: 2.0, mirror: MirrorMode::MirrorAngle, link_handles: false });
    let seg = s.paths().get(1).unwrap().segments[0];
    let shown = s.display_paths().get(1).unwrap().segments[0].cp1;
    assert!(s.begin_drag(1, 0, HandleKind::Cp1, shown));
    let target = seg.p1.add(Point::new(10.0, 0.0));
    assert!(s.drag_to(target));
    assert!(s.end_drag());
    let stored = s.paths().get(1).unwrap().segments[0].cp1;
    assert!(stored.distance(seg.p1.add(Point::new(5.0, 0.0))) < 1e-9);
    let displayed = s.display_paths().get(1).unwrap().segments[0].cp1;
    assert!(displayed.distance(target) < 1e-9);
}

#[test]
fn tension_is_clamped() {
    let mut s = session();
    s.set_tension(0.01);
    assert_eq!(s.settings().tension, 0.2);
    s.set_tension(f64::NAN);
    assert_eq!(s.settings().tension, 1.0);
}

#[test]
fn decimation_reads_from_unedited_geometry() {
    let mut s = session();
    let full = s.paths().get(0).unwrap().segments.len();
    s.decimate(50.0);
    let half = s.paths().get(0).unwrap().segments.len();
    assert_eq!(half, (full + 1) / 2);
    s.decimate(100.0);
    assert_eq!(s.paths().get(0).unwrap().segments.len(), full);
    assert_eq!(s.history_meta().len, 3);
}

#[test]
fn union_then_decimate_works_on_merged_outline() {
    let mut s = session();
    assert!(s.unite());
    assert_eq!(s.paths().len(), 1);
    let merged = s.paths().get(0).unwrap().segments.len();
    s.decimate(100.0);
    assert_eq!(s.paths().get(0).unwrap().segments.len(), merged);
    assert!(s.undo());
    assert!(s.undo());
    assert_eq!(s.paths().len(), 2);
}

#[test]
fn undone_union_no_longer_feeds_decimation() {
    let mut s = session();
    assert!(s.unite());
    assert!(s.undo());
    assert_eq!(s.paths().len(), 2);
    s.decimate(100.0);
    assert_eq!(s.paths().len(), 2);
}

#[test]
fn redone_union_feeds_decimation_again() {
    let mut s = session();
    assert!(s.unite());
    assert!(s.undo());
    assert!(s.redo());
    assert_eq!(s.paths().len(), 1);
    s.decimate(100.0);
    assert_eq!(s.paths().len(), 1);
}

#[test]
fn decimated_session_loads_back_from_json() {
    let mut s = session();
    s.decimate(50.0);
    let doc = s.to_json();
    assert_eq!(doc["decimated"], true);
    let restored = EditSession::from_json(doc).expect("decimated document loads");
    assert_eq!(restored.metrics(), s.metrics());
}

#[test]
fn copy_path_text_has_one_line_per_path() {
    let s = session();
    let text = s.path_data_text();
    assert_eq!(text.lines().count(), 2);
    assert!(text.lines().all(|l| l.starts_with("M ") && l.ends_with(" Z")));
}
