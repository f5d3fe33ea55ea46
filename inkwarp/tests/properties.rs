use inkwarp::algorithms::displacement::rand;
use inkwarp::algorithms::editor::{move_anchor, move_handle, EditorSettings, HandleKind, MirrorMode};
use inkwarp::algorithms::fit::catmull_rom_centripetal;
use inkwarp::{DistortionMode, HistoryStack, Path, Point, Style};
use proptest::prelude::*;

fn ring(n: usize, radius: f64) -> Path {
    let pts: Vec<Point> = (0..n)
        .map(|i| {
            let a = i as f64 / n as f64 * std::f64::consts::TAU;
            Point::new(radius * a.cos(), radius * a.sin())
        })
        .collect();
    Path::new("ring", catmull_rom_centripetal(&pts, true), true, Style::default())
}

fn assert_chained(path: &Path) {
    let n = path.segments.len();
    for i in 0..n {
        let next = (i + 1) % n;
        assert_eq!(path.segments[i].p2, path.segments[next].p1, "break after segment {i}");
    }
}

#[derive(Clone, Debug)]
enum HistOp {
    Commit(u16),
    Undo,
    Redo,
}

fn hist_op() -> impl Strategy<Value = HistOp> {
    prop_oneof![any::<u16>().prop_map(HistOp::Commit), Just(HistOp::Undo), Just(HistOp::Redo)]
}

proptest! {
    #[test]
    fn displacement_is_reproducible(
        mode in 0usize..8,
        index in 0usize..100_000,
        t in 0.0f64..1.0,
        strength in 0.0f64..80.0,
        frequency in 1.0f64..20.0,
        seed in 0.0f64..1000.0,
    ) {
        let m = DistortionMode::ALL[mode];
        let a = m.offset(index, t, strength, frequency, seed);
        let b = m.offset(index, t, strength, frequency, seed);
        prop_assert_eq!(a.0.to_bits(), b.0.to_bits());
        prop_assert_eq!(a.1.to_bits(), b.1.to_bits());
        prop_assert!(a.0.is_finite() && a.1.is_finite());
        let r = rand(seed + index as f64);
        prop_assert!((0.0..=1.0).contains(&r));
        prop_assert_eq!(r.to_bits(), rand(seed + index as f64).to_bits());
    }

    #[test]
    fn closed_paths_stay_chained(
        n in 3usize..24,
        moves in proptest::collection::vec((any::<u16>(), any::<bool>(), -500.0f64..500.0, -500.0f64..500.0), 1..40),
    ) {
        let mut path = ring(n, 100.0);
        for (seg, first, x, y) in moves {
            let which = if first { HandleKind::P1 } else { HandleKind::P2 };
            let seg = seg as usize % n;
            prop_assert!(move_anchor(&mut path, seg, which, Point::new(x, y)));
        }
        assert_chained(&path);
    }

    #[test]
    fn history_matches_a_list_model(ops in proptest::collection::vec(hist_op(), 0..60)) {
        let mut h = HistoryStack::new(0u16);
        let mut model = vec![0u16];
        let mut cursor = 0usize;
        for op in ops {
            match op {
                HistOp::Commit(v) => {
                    h.commit(&v);
                    model.truncate(cursor + 1);
                    model.push(v);
                    cursor = model.len() - 1;
                }
                HistOp::Undo => {
                    let expect = if cursor > 0 { cursor -= 1; Some(model[cursor]) } else { None };
                    prop_assert_eq!(h.undo(), expect);
                }
                HistOp::Redo => {
                    let expect = if cursor + 1 < model.len() { cursor += 1; Some(model[cursor]) } else { None };
                    prop_assert_eq!(h.redo(), expect);
                }
            }
            prop_assert_eq!(h.entries(), model.as_slice());
            prop_assert_eq!(h.cursor(), cursor);
        }
    }
}

#[test]
fn mirror_angle_keeps_opposite_length() {
    let mut path = ring(8, 50.0);
    let before = path.segments[1].cp1;
    let anchor = path.segments[0].p2;
    let settings = EditorSettings { mirror: MirrorMode::MirrorAngle, ..Default::default() };
    let target = anchor.add(Point::new(3.0, 17.0));
    assert!(move_handle(&mut path, 0, HandleKind::Cp2, target, &settings, Point::ZERO));

    let moved = path.segments[0].cp2.sub(anchor);
    let opposite = path.segments[1].cp1.sub(anchor);
    assert!((opposite.length() - before.distance(anchor)).abs() < 1e-9);
    // anti-parallel
    let cos = (moved.x * opposite.x + moved.y * opposite.y) / (moved.length() * opposite.length());
    assert!((cos + 1.0).abs() < 1e-9);
    assert_chained(&path);
}

#[test]
fn mirror_angle_length_copies_magnitude() {
    let mut path = ring(6, 50.0);
    let anchor = path.segments[2].p1;
    let settings = EditorSettings { mirror: MirrorMode::MirrorAngleLength, ..Default::default() };
    assert!(move_handle(&mut path, 2, HandleKind::Cp1, anchor.add(Point::new(-4.0, 3.0)), &settings, Point::ZERO));
    let opposite = path.segments[1].cp2;
    assert!((opposite.distance(anchor) - 5.0).abs() < 1e-9);
    assert!(opposite.distance(anchor.add(Point::new(4.0, -3.0))) < 1e-9);
}

#[test]
fn linked_handles_follow_pointer_delta() {
    let mut path = ring(5, 40.0);
    let before: Vec<Point> = path.segments.iter().map(|s| s.cp1).collect();
    let settings = EditorSettings { link_handles: true, ..Default::default() };
    let target = path.segments[0].cp1.add(Point::new(2.0, 2.0));
    assert!(move_handle(&mut path, 0, HandleKind::Cp1, target, &settings, Point::new(1.0, -1.0)));
    for i in 1..5 {
        assert!(path.segments[i].cp1.distance(before[i].add(Point::new(1.0, -1.0))) < 1e-12);
    }
}

#[test]
fn collinear_samples_fit_collinear_controls() {
    let pts = [Point::new(0.0, 0.0), Point::new(1.0, 2.0), Point::new(3.0, 6.0), Point::new(4.0, 8.0)];
    for s in catmull_rom_centripetal(&pts, false) {
        for c in [s.cp1, s.cp2] {
            assert!((c.y - 2.0 * c.x).abs() < 1e-9, "{c:?} off the line");
        }
    }
}
