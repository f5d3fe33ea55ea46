use crate::interop::{segment_arrays, to_js};
use crate::{error, Preview, Session};
use inkwarp::geometry::limits;
use inkwarp::{
    DisplacementDescriptor, DistortParams, Distorter, EditSession, EditorSettings, HandleKind, MirrorMode, PathSet,
    Point,
};
use wasm_bindgen::prelude::*;

/// `undefined`/`null` mean defaults; anything else must deserialize.
fn params_from(v: JsValue) -> Result<DistortParams, JsValue> {
    if v.is_undefined() || v.is_null() {
        return Ok(DistortParams::default());
    }
    serde_wasm_bindgen::from_value::<DistortParams>(v)
        .map_err(|e| error::err("invalid_params", format!("{}", e), None))
}

fn handle_from(code: u8) -> Option<HandleKind> {
    match code {
        0 => Some(HandleKind::P1),
        1 => Some(HandleKind::Cp1),
        2 => Some(HandleKind::Cp2),
        3 => Some(HandleKind::P2),
        _ => None,
    }
}

fn mirror_from(code: u8) -> Option<MirrorMode> {
    match code {
        0 => Some(MirrorMode::Disconnected),
        1 => Some(MirrorMode::MirrorAngle),
        2 => Some(MirrorMode::MirrorAngleLength),
        _ => None,
    }
}

/// Distortion result for `markup`; unparseable markup is reported in its
/// `error` field.
#[wasm_bindgen]
pub fn distort(markup: &str, params: JsValue) -> JsValue {
    let params = params_from(params).unwrap_or_default();
    to_js(&inkwarp::distort_markup(markup, &params))
}

#[wasm_bindgen]
pub fn distort_res(markup: &str, params: JsValue) -> JsValue {
    let params = match params_from(params) {
        Ok(p) => p,
        Err(e) => return e,
    };
    match Distorter::from_markup(markup) {
        Ok(d) => error::ok(to_js(&inkwarp::distort(d.source(), &params))),
        Err(e) => error::from_core(&e),
    }
}

/// The distorted document as markup, ready for download.
#[wasm_bindgen]
pub fn baked_svg(markup: &str, params: JsValue) -> String {
    let params = params_from(params).unwrap_or_default();
    inkwarp::svg::baked_markup(&inkwarp::distort_markup(markup, &params))
}

/// `<filter>` markup previewing `params` without baking.
#[wasm_bindgen]
pub fn filter_markup(params: JsValue) -> String {
    let params = params_from(params).unwrap_or_default();
    inkwarp::svg::filter_markup(&DisplacementDescriptor::from_params(&params.sanitized()))
}

#[wasm_bindgen]
impl Preview {
    #[wasm_bindgen(constructor)]
    pub fn new(markup: &str) -> Preview {
        match Distorter::from_markup(markup) {
            Ok(inner) => Preview { inner, error: None },
            Err(e) => {
                log::warn!("preview source rejected: {}", e);
                Preview { inner: Distorter::new(Default::default()), error: Some(e.to_string()) }
            }
        }
    }

    pub fn error(&self) -> Option<String> {
        self.error.clone()
    }

    pub fn element_count(&self) -> u32 {
        self.inner.source().elements.len() as u32
    }

    /// `{preview, export}` for `params`; repeated calls with equal
    /// parameters reuse the last result.
    pub fn render(&self, params: JsValue) -> JsValue {
        let params = params_from(params).unwrap_or_default();
        to_js(&self.inner.render(&params))
    }

    pub fn render_res(&self, params: JsValue) -> JsValue {
        if let Some(e) = &self.error {
            return error::err("invalid_markup", e.clone(), None);
        }
        match params_from(params) {
            Ok(p) => error::ok(to_js(&self.inner.render(&p))),
            Err(e) => e,
        }
    }

    /// A refine session over the baked export of `params`.
    pub fn session(&self, params: JsValue) -> Session {
        let params = params_from(params).unwrap_or_default();
        Session { inner: EditSession::from_result(&self.inner.render(&params).export) }
    }
}

#[wasm_bindgen]
impl Session {
    /// A session on an empty canvas: a single circle to play with.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Session {
        Session { inner: EditSession::new(PathSet::default(), Default::default()) }
    }

    // Loading
    pub fn load_markup(&mut self, markup: &str, params: JsValue) -> bool {
        let params = params_from(params).unwrap_or_default();
        let result = inkwarp::distort_markup(markup, &params.with_render(inkwarp::RenderMode::Bake));
        if result.error.is_some() {
            return false;
        }
        self.inner = EditSession::from_result(&result);
        true
    }
    pub fn load_markup_res(&mut self, markup: &str, params: JsValue) -> JsValue {
        let params = match params_from(params) {
            Ok(p) => p.with_render(inkwarp::RenderMode::Bake),
            Err(e) => return e,
        };
        match Distorter::from_markup(markup) {
            Ok(d) => {
                self.inner = EditSession::from_result(&inkwarp::distort(d.source(), &params));
                error::ok(to_js(&self.inner.metrics()))
            }
            Err(e) => error::from_core(&e),
        }
    }
    pub fn to_json(&self) -> String {
        self.inner.to_json().to_string()
    }
    pub fn from_json(&mut self, text: &str) -> bool {
        match serde_json::from_str::<serde_json::Value>(text) {
            Ok(v) => match EditSession::from_json(v) {
                Ok(s) => {
                    self.inner = s;
                    true
                }
                Err(_) => false,
            },
            Err(_) => false,
        }
    }
    pub fn from_json_res(&mut self, text: &str) -> JsValue {
        let v = match serde_json::from_str::<serde_json::Value>(text) {
            Ok(v) => v,
            Err(e) => return error::err("json_parse", format!("{}", e), None),
        };
        match EditSession::from_json(v) {
            Ok(s) => {
                self.inner = s;
                error::ok(to_js(&self.inner.metrics()))
            }
            Err(e) => error::from_core(&e),
        }
    }

    // Reading
    pub fn paths(&self) -> JsValue {
        to_js(&self.inner.display_paths())
    }
    pub fn segment_data(&self) -> JsValue {
        segment_arrays(&self.inner.display_paths())
    }
    pub fn metrics(&self) -> JsValue {
        to_js(&self.inner.metrics())
    }
    pub fn history(&self) -> JsValue {
        to_js(&self.inner.history_meta())
    }
    pub fn style(&self) -> JsValue {
        to_js(self.inner.style())
    }
    pub fn settings(&self) -> JsValue {
        to_js(&self.inner.settings())
    }
    pub fn export_options(&self) -> JsValue {
        to_js(&self.inner.export_options())
    }
    pub fn density(&self) -> f64 {
        self.inner.density()
    }
    pub fn path_count(&self) -> u32 {
        self.inner.paths().len() as u32
    }

    // Gestures
    pub fn begin_drag(&mut self, path: u32, segment: u32, handle: u8, x: f64, y: f64) -> bool {
        match handle_from(handle) {
            Some(h) => self.inner.begin_drag(path as usize, segment as usize, h, Point::new(x, y)),
            None => false,
        }
    }
    pub fn begin_drag_res(&mut self, path: u32, segment: u32, handle: u8, x: f64, y: f64) -> JsValue {
        if !x.is_finite() {
            return error::non_finite("x");
        }
        if !y.is_finite() {
            return error::non_finite("y");
        }
        let Some(h) = handle_from(handle) else {
            return error::out_of_range("handle", 0.0, 3.0, handle as f64);
        };
        let Some(p) = self.inner.paths().get(path as usize) else {
            return error::invalid_index("path", path);
        };
        if segment as usize >= p.segments.len() {
            return error::invalid_index("segment", segment);
        }
        error::ok(JsValue::from_bool(self.inner.begin_drag(path as usize, segment as usize, h, Point::new(x, y))))
    }
    pub fn drag_to(&mut self, x: f64, y: f64) -> bool {
        self.inner.drag_to(Point::new(x, y))
    }
    pub fn drag_to_res(&mut self, x: f64, y: f64) -> JsValue {
        if !x.is_finite() {
            return error::non_finite("x");
        }
        if !y.is_finite() {
            return error::non_finite("y");
        }
        if !self.inner.is_dragging() {
            return error::err("no_drag", "no control point is being dragged", None);
        }
        error::ok(JsValue::from_bool(self.inner.drag_to(Point::new(x, y))))
    }
    /// Release the dragged point; true when a history entry was recorded.
    pub fn end_drag(&mut self) -> bool {
        self.inner.end_drag()
    }

    // Editor settings
    pub fn set_tension(&mut self, tension: f64) {
        self.inner.set_tension(tension)
    }
    pub fn set_tension_res(&mut self, tension: f64) -> JsValue {
        if !tension.is_finite() {
            return error::non_finite("tension");
        }
        if !(limits::TENSION_MIN..=limits::TENSION_MAX).contains(&tension) {
            return error::out_of_range("tension", limits::TENSION_MIN, limits::TENSION_MAX, tension);
        }
        self.inner.set_tension(tension);
        error::ok(JsValue::from_bool(true))
    }
    pub fn set_mirror(&mut self, mode: u8) -> bool {
        match mirror_from(mode) {
            Some(m) => {
                self.inner.set_mirror(m);
                true
            }
            None => false,
        }
    }
    pub fn set_mirror_res(&mut self, mode: u8) -> JsValue {
        if mirror_from(mode).is_none() {
            return error::out_of_range("mode", 0.0, 2.0, mode as f64);
        }
        error::ok(JsValue::from_bool(self.set_mirror(mode)))
    }
    pub fn set_link_handles(&mut self, on: bool) {
        self.inner.set_link_handles(on)
    }
    pub fn set_settings(&mut self, v: JsValue) -> bool {
        match serde_wasm_bindgen::from_value::<EditorSettings>(v) {
            Ok(s) => {
                self.inner.set_settings(s);
                true
            }
            Err(_) => false,
        }
    }

    // Paint
    pub fn set_fill(&mut self, color: &str) {
        self.inner.set_fill(color)
    }
    pub fn set_stroke(&mut self, color: &str) {
        self.inner.set_stroke(color)
    }
    pub fn set_fill_opacity(&mut self, v: f64) -> bool {
        self.inner.set_fill_opacity(v)
    }
    pub fn set_fill_opacity_res(&mut self, v: f64) -> JsValue {
        if !v.is_finite() {
            return error::non_finite("opacity");
        }
        if !(0.0..=1.0).contains(&v) {
            return error::out_of_range("opacity", 0.0, 1.0, v);
        }
        error::ok(JsValue::from_bool(self.inner.set_fill_opacity(v)))
    }
    pub fn set_stroke_opacity(&mut self, v: f64) -> bool {
        self.inner.set_stroke_opacity(v)
    }
    pub fn set_stroke_opacity_res(&mut self, v: f64) -> JsValue {
        if !v.is_finite() {
            return error::non_finite("opacity");
        }
        if !(0.0..=1.0).contains(&v) {
            return error::out_of_range("opacity", 0.0, 1.0, v);
        }
        error::ok(JsValue::from_bool(self.inner.set_stroke_opacity(v)))
    }
    pub fn set_stroke_width(&mut self, w: f64) -> bool {
        self.inner.set_stroke_width(w)
    }
    pub fn set_stroke_width_res(&mut self, w: f64) -> JsValue {
        if !w.is_finite() {
            return error::non_finite("width");
        }
        if !limits::in_width_bounds(w) {
            return error::out_of_range("width", 0.0, limits::WIDTH_MAX, w);
        }
        error::ok(JsValue::from_bool(self.inner.set_stroke_width(w)))
    }
    pub fn set_fill_enabled(&mut self, on: bool) {
        self.inner.set_fill_enabled(on)
    }
    pub fn set_stroke_enabled(&mut self, on: bool) {
        self.inner.set_stroke_enabled(on)
    }

    // Document actions
    pub fn decimate(&mut self, density: f64) {
        self.inner.decimate(density)
    }
    pub fn decimate_res(&mut self, density: f64) -> JsValue {
        if !density.is_finite() {
            return error::non_finite("density");
        }
        if !(limits::DENSITY_MIN..=limits::DENSITY_MAX).contains(&density) {
            return error::out_of_range("density", limits::DENSITY_MIN, limits::DENSITY_MAX, density);
        }
        self.inner.decimate(density);
        error::ok(to_js(&self.inner.metrics()))
    }
    pub fn unite(&mut self) -> bool {
        self.inner.unite()
    }
    pub fn reset(&mut self) {
        self.inner.reset()
    }
    pub fn undo(&mut self) -> bool {
        self.inner.undo()
    }
    pub fn redo(&mut self) -> bool {
        self.inner.redo()
    }

    // Output
    pub fn to_svg(&self) -> String {
        self.inner.to_svg_string()
    }
    pub fn to_document(&self) -> JsValue {
        to_js(&self.inner.to_document())
    }
    pub fn path_data_text(&self) -> String {
        self.inner.path_data_text()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
