use crate::geometry::limits;
use crate::geometry::tolerance::{approx_eq, EPS_POS};
use crate::model::{Dimensions, Path, PathSet, Point, Segment};
use crate::{Error, Result};
use serde::Deserialize;
use serde_json::{json, Value};

pub const FORMAT_VERSION: u32 = 1;

fn same_point(a: Point, b: Point) -> bool {
    approx_eq(a.x, b.x, EPS_POS) && approx_eq(a.y, b.y, EPS_POS)
}

/// True when some segment does not start where the previous one ended, as
/// after decimation.
fn breaks(path: &Path) -> bool {
    let joints = path.segments.windows(2).map(|w| (w[0].p2, w[1].p1));
    let wrap = path.segments.last().zip(path.segments.first()).filter(|_| path.closed).map(|(l, f)| (l.p2, f.p1));
    joints.chain(wrap).any(|(a, b)| !same_point(a, b))
}

/// Session document. Geometry whose chains break is marked `decimated` so
/// it loads back.
pub fn to_json(paths: &PathSet, dimensions: &Dimensions) -> Value {
    let mut v = json!({
        "version": FORMAT_VERSION,
        "dimensions": dimensions,
        "paths": paths,
    });
    if paths.iter().any(breaks) {
        v["decimated"] = json!(true);
    }
    v
}

fn check_segment(s: &Segment) -> Result<()> {
    for p in [s.p1, s.cp1, s.cp2, s.p2] {
        if !limits::in_coord_bounds(p.x) || !limits::in_coord_bounds(p.y) {
            return Err(Error::OutOfBounds("segment coordinate".into()));
        }
    }
    Ok(())
}

fn check_path(path: &Path, allow_breaks: bool) -> Result<()> {
    if path.segments.is_empty() {
        return Err(Error::InvalidStructure(format!("path {} has no segments", path.id)));
    }
    if path.segments.len() > limits::MAX_SEGMENTS_PER_PATH {
        return Err(Error::CapsExceeded(format!("segments>{} in {}", limits::MAX_SEGMENTS_PER_PATH, path.id)));
    }
    for s in &path.segments {
        check_segment(s)?;
    }
    if !allow_breaks {
        for (i, w) in path.segments.windows(2).enumerate() {
            if !same_point(w[0].p2, w[1].p1) {
                return Err(Error::InvalidStructure(format!("path {} breaks after segment {}", path.id, i)));
            }
        }
        if path.closed {
            if let (Some(first), Some(last)) = (path.segments.first(), path.segments.last()) {
                if !same_point(last.p2, first.p1) {
                    return Err(Error::InvalidStructure(format!("closed path {} does not return to its start", path.id)));
                }
            }
        }
    }
    let style = &path.style;
    if !limits::in_width_bounds(style.stroke_width) {
        return Err(Error::OutOfBounds("stroke width".into()));
    }
    for o in [style.fill_opacity, style.stroke_opacity].into_iter().flatten() {
        if !(0.0..=1.0).contains(&o) {
            return Err(Error::OutOfBounds("opacity".into()));
        }
    }
    Ok(())
}

/// Validate and load a document written by [`to_json`]. Segment chains must
/// be continuous unless the document is marked decimated.
pub fn from_json(v: Value) -> Result<(PathSet, Dimensions)> {
    #[derive(Deserialize)]
    struct Doc {
        version: Option<u32>,
        #[serde(default)]
        dimensions: Dimensions,
        paths: Vec<Path>,
        #[serde(default)]
        decimated: bool,
    }
    let doc: Doc = serde_json::from_value(v)?;
    if let Some(version) = doc.version {
        if version == 0 || version > FORMAT_VERSION {
            return Err(Error::InvalidStructure(format!("unsupported version {}", version)));
        }
    }
    if doc.paths.len() > limits::MAX_PATHS {
        return Err(Error::CapsExceeded(format!("paths>{}", limits::MAX_PATHS)));
    }
    let total: usize = doc.paths.iter().map(|p| p.segments.len()).sum();
    if total > limits::MAX_SEGMENTS_TOTAL {
        return Err(Error::CapsExceeded(format!("segments>{}", limits::MAX_SEGMENTS_TOTAL)));
    }
    for p in &doc.paths {
        check_path(p, doc.decimated)?;
    }
    if let Some(vb) = doc.dimensions.view_box {
        if !(vb.width.is_finite() && vb.height.is_finite() && vb.width >= 0.0 && vb.height >= 0.0) {
            return Err(Error::OutOfBounds("viewBox".into()));
        }
    }
    Ok((PathSet::new(doc.paths), doc.dimensions))
}

pub fn from_json_str(s: &str) -> Result<(PathSet, Dimensions)> {
    from_json(serde_json::from_str(s)?)
}
