use crate::geometry::cubic::CubicBezier;
use crate::geometry::math::dist_point_to_seg_sq;
use crate::geometry::tolerance::MAX_FLATTEN_DEPTH;
use crate::model::Point;

/// Flatten `c` into chord end points, each tagged with its curve parameter.
/// The start point is not pushed; callers seed it.
pub fn flatten_cubic(out: &mut Vec<(Point, f64)>, c: &CubicBezier, tol: f64) {
    flatten_rec(out, c, 0.0, 1.0, tol, 0);
}

fn flatten_rec(out: &mut Vec<(Point, f64)>, c: &CubicBezier, t0: f64, t1: f64, tol: f64, depth: u32) {
    let d1 = dist_point_to_seg_sq(c.p1, c.p0, c.p3);
    let d2 = dist_point_to_seg_sq(c.p2, c.p0, c.p3);
    let tol2 = tol * tol;
    if d1.max(d2) <= tol2 || depth > MAX_FLATTEN_DEPTH {
        out.push((c.p3, t1));
        return;
    }
    let tm = 0.5 * (t0 + t1);
    let (a, b) = c.split_at(0.5);
    flatten_rec(out, &a, t0, tm, tol, depth + 1);
    flatten_rec(out, &b, tm, t1, tol, depth + 1);
}
