// Numeric tolerances shared by parsing, fitting and the union

pub const EPS_POS: f64 = 1e-6; // coincident points (user units)
pub const EPS_PARAM: f64 = 1e-9; // curve parameter slack
pub const EPS_AREA: f64 = 1e-6; // contours below this area are dropped

// Endpoint keys for linking union pieces: 1e-4 units
pub const QUANT_SCALE: f64 = 10_000.0;

pub const MAX_FLATTEN_DEPTH: u32 = 16;

#[inline]
pub fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
    (a - b).abs() <= eps
}

/// Replace a non-finite value.
#[inline]
pub fn finite_or(x: f64, fallback: f64) -> f64 {
    if x.is_finite() {
        x
    } else {
        fallback
    }
}

#[inline]
pub fn quantize(p: crate::model::Point) -> (i64, i64) {
    ((p.x * QUANT_SCALE).round() as i64, (p.y * QUANT_SCALE).round() as i64)
}
