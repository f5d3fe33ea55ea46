//! Cubic Bézier curve utilities for evaluation, subdivision and length.
//!
//! Outlines use these to measure and sample path elements, and the union
//! rebuilds kept boundary runs with [`CubicBezier::subcurve`].

use crate::geometry::tolerance::{EPS_PARAM, MAX_FLATTEN_DEPTH};
use crate::model::{Point, Segment};

/// Control points of a cubic Bézier curve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CubicBezier {
    pub p0: Point, // Start point
    pub p1: Point, // First control point
    pub p2: Point, // Second control point
    pub p3: Point, // End point
}

impl CubicBezier {
    pub fn new(p0: Point, p1: Point, p2: Point, p3: Point) -> Self {
        Self { p0, p1, p2, p3 }
    }

    pub fn line(a: Point, b: Point) -> Self {
        Self::new(a, a.lerp(b, 1.0 / 3.0), a.lerp(b, 2.0 / 3.0), b)
    }

    /// Degree-elevate a quadratic with control point `c`.
    pub fn from_quad(a: Point, c: Point, b: Point) -> Self {
        Self::new(a, a.lerp(c, 2.0 / 3.0), b.lerp(c, 2.0 / 3.0), b)
    }

    /// The same curve traversed from `p3` back to `p0`.
    pub fn reversed(&self) -> Self {
        Self::new(self.p3, self.p2, self.p1, self.p0)
    }

    pub fn to_segment(&self) -> Segment {
        Segment::new(self.p0, self.p1, self.p2, self.p3)
    }

    /// Evaluate the curve at parameter t ∈ [0, 1].
    pub fn eval(&self, t: f64) -> Point {
        let t2 = t * t;
        let t3 = t2 * t;
        let mt = 1.0 - t;
        let mt2 = mt * mt;
        let mt3 = mt2 * mt;

        Point {
            x: mt3 * self.p0.x + 3.0 * mt2 * t * self.p1.x + 3.0 * mt * t2 * self.p2.x + t3 * self.p3.x,
            y: mt3 * self.p0.y + 3.0 * mt2 * t * self.p1.y + 3.0 * mt * t2 * self.p2.y + t3 * self.p3.y,
        }
    }

    /// Split the curve at parameter t using de Casteljau subdivision.
    ///
    /// Returns two cubic curves: the first from 0..t, the second from t..1.
    pub fn split_at(&self, t: f64) -> (CubicBezier, CubicBezier) {
        let p01 = self.p0.lerp(self.p1, t);
        let p12 = self.p1.lerp(self.p2, t);
        let p23 = self.p2.lerp(self.p3, t);

        let p012 = p01.lerp(p12, t);
        let p123 = p12.lerp(p23, t);

        let p0123 = p012.lerp(p123, t); // The split point

        (
            CubicBezier::new(self.p0, p01, p012, p0123),
            CubicBezier::new(p0123, p123, p23, self.p3),
        )
    }

    /// Extract the portion of the curve from t0 to t1.
    pub fn subcurve(&self, t0: f64, t1: f64) -> CubicBezier {
        if t1 - t0 <= EPS_PARAM {
            let p = self.eval(t0);
            return CubicBezier::new(p, p, p, p);
        }
        if t0 <= EPS_PARAM && t1 >= 1.0 - EPS_PARAM {
            return *self;
        }

        let (curve_to_t1, _) = self.split_at(t1);
        let (_, result) = curve_to_t1.split_at(t0 / t1);
        result
    }

    /// Approximate arc length using adaptive subdivision.
    pub fn arc_length(&self, tolerance: f64) -> f64 {
        arc_length_recursive(self.p0, self.p1, self.p2, self.p3, tolerance, 0)
    }

    pub fn is_finite(&self) -> bool {
        self.p0.is_finite() && self.p1.is_finite() && self.p2.is_finite() && self.p3.is_finite()
    }
}

impl From<&Segment> for CubicBezier {
    fn from(s: &Segment) -> Self {
        CubicBezier::new(s.p1, s.cp1, s.cp2, s.p2)
    }
}

/// Recursive arc length computation with adaptive subdivision.
fn arc_length_recursive(p0: Point, p1: Point, p2: Point, p3: Point, tolerance: f64, depth: u32) -> f64 {
    let chord = p0.distance(p3);
    let poly_len = p0.distance(p1) + p1.distance(p2) + p2.distance(p3);

    // Flat enough or max depth: average of chord and control polygon
    if depth >= MAX_FLATTEN_DEPTH || (poly_len - chord).abs() < tolerance {
        return (chord + poly_len) * 0.5;
    }

    let p01 = p0.lerp(p1, 0.5);
    let p12 = p1.lerp(p2, 0.5);
    let p23 = p2.lerp(p3, 0.5);
    let p012 = p01.lerp(p12, 0.5);
    let p123 = p12.lerp(p23, 0.5);
    let mid = p012.lerp(p123, 0.5);

    arc_length_recursive(p0, p01, p012, mid, tolerance, depth + 1)
        + arc_length_recursive(mid, p123, p23, p3, tolerance, depth + 1)
}
