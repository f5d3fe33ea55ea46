//! Centripetal Catmull-Rom fitting of sample points to cubic segments.

use crate::model::{Point, Segment};

const ALPHA: f64 = 0.5;

/// Knot after `t` for the span `a → b`; a span that yields no advance moves
/// the knot by 1.
fn next_knot(t: f64, a: Point, b: Point) -> f64 {
    let next = t + a.distance(b).powf(ALPHA);
    if next == t {
        t + 1.0
    } else {
        next
    }
}

/// Fit a cubic through consecutive `points`.
///
/// Closed input produces one segment per point with wrap-around neighbours;
/// open input produces `n - 1` segments with the end points repeated as
/// their own outer neighbours. Fewer than 2 points yields nothing.
pub fn catmull_rom_centripetal(points: &[Point], closed: bool) -> Vec<Segment> {
    let n = points.len();
    if n < 2 {
        return Vec::new();
    }
    let get = |i: isize| -> Point {
        if closed {
            points[i.rem_euclid(n as isize) as usize]
        } else {
            points[i.clamp(0, n as isize - 1) as usize]
        }
    };
    let count = if closed { n } else { n - 1 };
    let mut out = Vec::with_capacity(count);
    for i in 0..count as isize {
        let p0 = get(i - 1);
        let p1 = get(i);
        let p2 = get(i + 1);
        let p3 = get(i + 2);
        let t0 = 0.0;
        let t1 = next_knot(t0, p0, p1);
        let t2 = next_knot(t1, p1, p2);
        let t3 = next_knot(t2, p2, p3);

        let m1 = p2.sub(p0).scale((t1 - t0) / (t2 - t0));
        let m2 = p3.sub(p1).scale((t2 - t1) / (t3 - t1));
        out.push(Segment::new(p1, p1.add(m1.scale(1.0 / 3.0)), p2.sub(m2.scale(1.0 / 3.0)), p2));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::math::cross;

    #[test]
    fn too_few_points() {
        assert!(catmull_rom_centripetal(&[], false).is_empty());
        assert!(catmull_rom_centripetal(&[Point::new(1.0, 1.0)], true).is_empty());
    }

    #[test]
    fn segment_counts() {
        let pts = [Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 10.0)];
        assert_eq!(catmull_rom_centripetal(&pts, false).len(), 2);
        assert_eq!(catmull_rom_centripetal(&pts, true).len(), 3);
    }

    #[test]
    fn interpolates_the_samples() {
        let pts = [Point::new(0.0, 0.0), Point::new(10.0, 5.0), Point::new(20.0, -3.0), Point::new(30.0, 8.0)];
        let segs = catmull_rom_centripetal(&pts, false);
        for (i, s) in segs.iter().enumerate() {
            assert_eq!(s.p1, pts[i]);
            assert_eq!(s.p2, pts[i + 1]);
        }
    }

    #[test]
    fn repeated_points_stay_finite() {
        let p = Point::new(4.0, 4.0);
        let segs = catmull_rom_centripetal(&[p, p, p], true);
        assert!(segs.iter().all(Segment::is_finite));
        assert!(segs.iter().all(|s| s.cp1 == p && s.cp2 == p));
    }

    #[test]
    fn closed_ring_wraps() {
        let pts = [Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 10.0), Point::new(0.0, 10.0)];
        let segs = catmull_rom_centripetal(&pts, true);
        assert_eq!(segs[3].p2, segs[0].p1);
        // Tangent through the first anchor is continuous
        let in_dir = segs[3].p2.sub(segs[3].cp2);
        let out_dir = segs[0].cp1.sub(segs[0].p1);
        assert!(cross(in_dir, out_dir).abs() < 1e-9);
    }
}
