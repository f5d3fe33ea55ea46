use crate::model::Point;

/// Squared distance from `p` to the segment `a→b`.
pub fn dist_point_to_seg_sq(p: Point, a: Point, b: Point) -> f64 {
    let v = b.sub(a);
    let vv = v.x * v.x + v.y * v.y;
    let t = if vv > 0.0 { (dot(p.sub(a), v) / vv).clamp(0.0, 1.0) } else { 0.0 };
    let d = p.sub(a.lerp(b, t));
    d.x * d.x + d.y * d.y
}

#[inline]
pub fn cross(a: Point, b: Point) -> f64 { a.x*b.y - a.y*b.x }

#[inline]
pub fn dot(a: Point, b: Point) -> f64 { a.x*b.x + a.y*b.y }

/// Signed area by the shoelace formula; positive for counter-clockwise in a
/// y-up frame.
pub fn signed_area(poly: &[Point]) -> f64 {
    let n = poly.len();
    if n < 3 { return 0.0; }
    let mut acc = 0.0;
    for i in 0..n {
        let a = poly[i]; let b = poly[(i + 1) % n];
        acc += a.x*b.y - b.x*a.y;
    }
    0.5 * acc
}

/// Intersection of segments `a0→a1` and `b0→b1` as `(t, u)` parameters on each.
pub fn segment_intersection(a0: Point, a1: Point, b0: Point, b1: Point) -> Option<(f64, f64)> {
    let r = a1.sub(a0);
    let s = b1.sub(b0);
    let denom = cross(r, s);
    if denom.abs() < 1e-12 {
        return None; // Parallel
    }
    let q = b0.sub(a0);
    let t = cross(q, s) / denom;
    let u = cross(q, r) / denom;
    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) { Some((t, u)) } else { None }
}
