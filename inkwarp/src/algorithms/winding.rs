//! Winding numbers for point-in-region tests.
//!
//! Signed crossings of a horizontal ray; a boundary made of several contours
//! sums the winding of each.

use crate::geometry::math::{cross, dist_point_to_seg_sq};
use crate::model::Point;

/// Winding number of `p` relative to a closed polygon.
///
/// Positive for counter-clockwise turns in a y-up frame, zero outside.
pub fn winding_number(p: Point, polygon: &[Point]) -> i32 {
    if polygon.len() < 3 {
        return 0;
    }
    let mut winding = 0i32;
    let n = polygon.len();
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[(i + 1) % n];
        if a.y <= p.y {
            if b.y > p.y && cross(a.sub(p), b.sub(p)) > 0.0 {
                winding += 1; // Upward
            }
        } else if b.y <= p.y && cross(a.sub(p), b.sub(p)) < 0.0 {
            winding -= 1; // Downward
        }
    }
    winding
}

/// Sum of the winding numbers of `p` over every contour of a boundary.
pub fn winding_number_multi(p: Point, contours: &[Vec<Point>]) -> i32 {
    contours.iter().map(|c| winding_number(p, c)).sum()
}

#[inline]
pub fn point_in_nonzero(p: Point, contours: &[Vec<Point>]) -> bool {
    winding_number_multi(p, contours) != 0
}

/// True when `p` lies within `tol` of any edge of the polygon.
pub fn point_on_polygon_edge(p: Point, polygon: &[Point], tol: f64) -> bool {
    let n = polygon.len();
    if n == 0 {
        return false;
    }
    let tol_sq = tol * tol;
    (0..n).any(|i| dist_point_to_seg_sq(p, polygon[i], polygon[(i + 1) % n]) <= tol_sq)
}
