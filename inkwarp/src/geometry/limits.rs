// Centralized ingestion limits to harden against untrusted input (markup/JSON)

// Document size caps
pub const MAX_ELEMENTS: usize = 20_000;
pub const MAX_PATHS: usize = 20_000;
pub const MAX_SEGMENTS_PER_PATH: usize = 100_000;
pub const MAX_SEGMENTS_TOTAL: usize = 2_000_000;

// Markup caps
pub const MAX_MARKUP_BYTES: usize = 32 * 1024 * 1024;
pub const MAX_POLY_POINTS: usize = 100_000;

// Path data caps
pub const MAX_PATH_DATA_BYTES: usize = 8 * 1024 * 1024; // characters in one 'd' string
pub const MAX_PATH_COMMANDS: usize = 200_000;
pub const MAX_PATH_SUBPATHS: usize = 10_000;
pub const MAX_PATH_SEGMENTS: usize = 500_000; // expanded segments across all commands

// Sampling
pub const MAX_SAMPLES_PER_ELEMENT: usize = 2_000;
pub const ELEMENT_INDEX_STRIDE: usize = 1_000;

// Numeric bounds
pub const COORD_MIN: f64 = -10_000_000.0;
pub const COORD_MAX: f64 =  10_000_000.0;
pub const WIDTH_MAX: f64 = 10_000.0;

// Tolerated parameter ranges; sliders stop lower, the math does not.
pub const TENSION_MIN: f64 = 0.2;
pub const TENSION_MAX: f64 = 2.0;
pub const DENSITY_MIN: f64 = 1.0;
pub const DENSITY_MAX: f64 = 100.0;
pub const MIN_DECIMATED_SEGMENTS: usize = 4;

#[inline]
pub fn in_coord_bounds(x: f64) -> bool { x.is_finite() && x >= COORD_MIN && x <= COORD_MAX }

#[inline]
pub fn in_width_bounds(w: f64) -> bool { w.is_finite() && w >= 0.0 && w <= WIDTH_MAX }
