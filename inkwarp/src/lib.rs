pub mod model;
pub mod geometry {
    pub mod cubic;
    pub mod flatten;
    pub mod limits;
    pub mod math;
    pub mod outline;
    pub mod path_data;
    pub mod tolerance;
}
pub mod algorithms {
    pub mod displacement;
    pub mod distort;
    pub mod editor;
    pub mod fit;
    pub mod union;
    pub mod winding;
}
pub mod history;
pub mod json;
pub mod svg;

pub use algorithms::displacement::DistortionMode;
pub use algorithms::distort::{
    distort, distort_markup, DisplacementDescriptor, DistortParams, DistortionResult, Distorter, RenderMode, Rendered,
};
pub use algorithms::editor::{EditorSettings, HandleKind, MirrorMode};
pub use history::HistoryStack;
pub use model::{Dimensions, Metrics, Path, PathSet, Point, Segment, Style, ViewBox};
pub use svg::{ExportOptions, SvgDocument};

use algorithms::editor;
use algorithms::union;
use geometry::limits;
use geometry::tolerance::finite_or;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid SVG markup: {0}")]
    InvalidMarkup(String),
    #[error("input too large: {0}")]
    CapsExceeded(String),
    #[error("value out of bounds: {0}")]
    OutOfBounds(String),
    #[error("invalid structure: {0}")]
    InvalidStructure(String),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Stable machine-readable code for error envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidMarkup(_) => "invalid_markup",
            Error::CapsExceeded(_) => "caps_exceeded",
            Error::OutOfBounds(_) => "out_of_bounds",
            Error::InvalidStructure(_) => "invalid_structure",
            Error::Json(_) => "json_parse",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Radius of the circle a session starts from when it has nothing to edit.
pub const FALLBACK_RADIUS: f64 = 180.0;

#[derive(Clone, Copy, Debug)]
struct DragState {
    path: usize,
    segment: usize,
    handle: HandleKind,
    last_pointer: Point,
    changed: bool,
}

/// One history entry: the live paths and the geometry decimation reads from.
#[derive(Clone, Debug, PartialEq)]
struct Snapshot {
    paths: PathSet,
    decimation_source: PathSet,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryMeta {
    pub len: usize,
    pub cursor: usize,
    pub can_undo: bool,
    pub can_redo: bool,
}

/// The refine step: one editable document with its undo history, paint and
/// editor settings.
///
/// Handles are stored at tension 1; everything handed to a renderer or
/// exported goes through [`EditSession::display_paths`].
pub struct EditSession {
    paths: PathSet,
    original: PathSet,
    decimation_source: PathSet,
    history: HistoryStack<Snapshot>,
    dimensions: Dimensions,
    style: Style,
    export: ExportOptions,
    settings: EditorSettings,
    density: f64,
    drag: Option<DragState>,
}

impl EditSession {
    /// Start editing `paths`. Every path takes the leading path's paint with
    /// a stroke width of 1; an empty set is replaced by a circle centred on
    /// the canvas.
    pub fn new(paths: PathSet, dimensions: Dimensions) -> Self {
        let mut paths = if paths.is_empty() {
            let (w, h) = dimensions.size();
            log::debug!("session started without paths; using fallback circle");
            PathSet::fallback_circle(w / 2.0, h / 2.0, FALLBACK_RADIUS)
        } else {
            paths
        };
        let mut style = paths.leading_style().cloned().unwrap_or_default().for_editing();
        style.stroke_width = 1.0;
        paths.apply_style(&style);
        EditSession {
            original: paths.clone(),
            decimation_source: paths.clone(),
            history: HistoryStack::new(Snapshot { paths: paths.clone(), decimation_source: paths.clone() }),
            paths,
            dimensions,
            style,
            export: ExportOptions::default(),
            settings: EditorSettings::default(),
            density: limits::DENSITY_MAX,
            drag: None,
        }
    }

    /// Session over the baked geometry of a distortion run.
    pub fn from_result(result: &DistortionResult) -> Self {
        Self::new(result.baked.clone().unwrap_or_default(), result.dimensions.clone())
    }

    pub fn from_json(v: serde_json::Value) -> Result<Self> {
        let (paths, dimensions) = json::from_json(v)?;
        Ok(Self::new(paths, dimensions))
    }

    pub fn paths(&self) -> &PathSet {
        &self.paths
    }

    pub fn display_paths(&self) -> PathSet {
        editor::display_paths(&self.paths, self.settings.sanitized().tension)
    }

    pub fn dimensions(&self) -> &Dimensions {
        &self.dimensions
    }

    pub fn style(&self) -> &Style {
        &self.style
    }

    pub fn settings(&self) -> EditorSettings {
        self.settings
    }

    pub fn export_options(&self) -> ExportOptions {
        self.export
    }

    pub fn density(&self) -> f64 {
        self.density
    }

    pub fn metrics(&self) -> Metrics {
        self.paths.metrics()
    }

    pub fn history_meta(&self) -> HistoryMeta {
        HistoryMeta {
            len: self.history.len(),
            cursor: self.history.cursor(),
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
        }
    }

    pub fn set_settings(&mut self, settings: EditorSettings) {
        self.settings = settings.sanitized();
    }

    pub fn set_tension(&mut self, tension: f64) {
        self.set_settings(EditorSettings { tension, ..self.settings });
    }

    pub fn set_mirror(&mut self, mirror: MirrorMode) {
        self.settings.mirror = mirror;
    }

    pub fn set_link_handles(&mut self, on: bool) {
        self.settings.link_handles = on;
    }

    // Gestures

    /// Grab a control point. Returns false when the indices do not name one.
    pub fn begin_drag(&mut self, path: usize, segment: usize, handle: HandleKind, pointer: Point) -> bool {
        let valid = self.paths.get(path).is_some_and(|p| segment < p.segments.len());
        if !valid || !pointer.is_finite() {
            return false;
        }
        self.drag = Some(DragState { path, segment, handle, last_pointer: pointer, changed: false });
        true
    }

    /// Move the grabbed control point to the displayed position `pointer`.
    pub fn drag_to(&mut self, pointer: Point) -> bool {
        let Some(mut drag) = self.drag else {
            return false;
        };
        if !pointer.is_finite() {
            return false;
        }
        let delta = pointer.sub(drag.last_pointer);
        let settings = self.settings.sanitized();
        let Some(path) = self.paths.get_mut(drag.path) else {
            return false;
        };
        let moved = editor::drag_to(path, drag.segment, drag.handle, pointer, &settings, delta);
        drag.last_pointer = pointer;
        drag.changed |= moved;
        self.drag = Some(drag);
        moved
    }

    /// Release the grabbed point; commits one history entry if anything moved.
    pub fn end_drag(&mut self) -> bool {
        match self.drag.take() {
            Some(d) if d.changed => {
                log::trace!("drag committed on path {} segment {}", d.path, d.segment);
                self.commit();
                true
            }
            _ => false,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    // Paint

    fn restyle(&mut self) {
        self.paths.apply_style(&self.style);
        self.commit();
    }

    pub fn set_fill(&mut self, color: &str) {
        self.style.fill = color.to_string();
        self.restyle();
    }

    pub fn set_stroke(&mut self, color: &str) {
        self.style.stroke = color.to_string();
        self.restyle();
    }

    pub fn set_fill_opacity(&mut self, opacity: f64) -> bool {
        if !opacity.is_finite() {
            return false;
        }
        self.style.fill_opacity = Some(opacity.clamp(0.0, 1.0));
        self.restyle();
        true
    }

    pub fn set_stroke_opacity(&mut self, opacity: f64) -> bool {
        if !opacity.is_finite() {
            return false;
        }
        self.style.stroke_opacity = Some(opacity.clamp(0.0, 1.0));
        self.restyle();
        true
    }

    pub fn set_stroke_width(&mut self, width: f64) -> bool {
        if !limits::in_width_bounds(width) {
            return false;
        }
        self.style.stroke_width = width;
        self.restyle();
        true
    }

    pub fn set_fill_enabled(&mut self, on: bool) {
        self.export.fill_enabled = on;
    }

    pub fn set_stroke_enabled(&mut self, on: bool) {
        self.export.stroke_enabled = on;
    }

    // Whole-document actions

    /// Thin the unedited geometry to `density` percent of its segments.
    pub fn decimate(&mut self, density: f64) {
        self.density = finite_or(density, limits::DENSITY_MAX).clamp(limits::DENSITY_MIN, limits::DENSITY_MAX);
        self.paths = editor::decimate(&self.decimation_source, self.density);
        self.restyle();
    }

    /// Back to the session's starting geometry with a fresh history.
    pub fn reset(&mut self) {
        self.paths = self.original.clone();
        self.decimation_source = self.original.clone();
        self.density = limits::DENSITY_MAX;
        self.drag = None;
        self.history.reset(Snapshot { paths: self.paths.clone(), decimation_source: self.original.clone() });
        self.sync_style();
    }

    /// Merge every path into the outline of their union. The merged geometry
    /// becomes the source for later decimation until the union is undone.
    pub fn unite(&mut self) -> bool {
        if self.paths.len() < 2 {
            return false;
        }
        let display = self.display_paths();
        let merged = union::unite(&display);
        if merged == display {
            return false;
        }
        self.paths = merged;
        self.decimation_source = self.paths.clone();
        self.restyle();
        true
    }

    // History

    fn commit(&mut self) {
        let snapshot = Snapshot { paths: self.paths.clone(), decimation_source: self.decimation_source.clone() };
        self.history.commit(&snapshot);
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.paths = snapshot.paths;
        self.decimation_source = snapshot.decimation_source;
        self.drag = None;
        self.sync_style();
    }

    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(snapshot) => {
                self.restore(snapshot);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(snapshot) => {
                self.restore(snapshot);
                true
            }
            None => false,
        }
    }

    fn sync_style(&mut self) {
        if let Some(s) = self.paths.leading_style() {
            self.style = s.clone();
        }
    }

    // Output

    pub fn to_document(&self) -> SvgDocument {
        svg::to_document(&self.display_paths(), &self.style, self.export, &self.dimensions)
    }

    pub fn to_svg_string(&self) -> String {
        self.to_document().to_markup()
    }

    pub fn path_data_text(&self) -> String {
        svg::path_data_text(&self.display_paths())
    }

    pub fn to_json(&self) -> serde_json::Value {
        json::to_json(&self.paths, &self.dimensions)
    }
}
