//! Distortion of source outlines into editable cubic paths.
//!
//! Every measurable source element is resampled along its arc length, each
//! sample is pushed by the displacement field, offsets are optionally
//! smoothed, and a centripetal Catmull-Rom spline is fitted through the
//! displaced samples. In filter mode no geometry is produced; instead a
//! displacement descriptor for an external renderer is returned.

use std::cell::RefCell;

use serde::{Deserialize, Serialize};

use crate::algorithms::displacement::{effective_frequency, round_half_up, DistortionMode};
use crate::algorithms::fit::catmull_rom_centripetal;
use crate::geometry::limits;
use crate::geometry::outline::{CircleOutline, LineOutline, Outline, RectOutline, TabulatedOutline};
use crate::geometry::path_data::{count_node_commands, has_close_command, parse_path_data};
use crate::model::{Dimensions, Path, PathSet, Point, Style};

/// Attributes that define geometry and are never carried to baked paths.
pub const GEOMETRY_ATTRIBUTES: [&str; 15] =
    ["d", "points", "x", "y", "width", "height", "cx", "cy", "r", "rx", "ry", "x1", "y1", "x2", "y2"];

#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Path { d: String },
    Rect { x: f64, y: f64, width: f64, height: f64, rx: Option<f64>, ry: Option<f64> },
    Circle { cx: f64, cy: f64, r: f64 },
    Ellipse { cx: f64, cy: f64, rx: f64, ry: f64 },
    Line { x1: f64, y1: f64, x2: f64, y2: f64 },
    Polyline { points: Vec<Point> },
    Polygon { points: Vec<Point> },
}

impl Shape {
    pub fn tag(&self) -> &'static str {
        match self {
            Shape::Path { .. } => "path",
            Shape::Rect { .. } => "rect",
            Shape::Circle { .. } => "circle",
            Shape::Ellipse { .. } => "ellipse",
            Shape::Line { .. } => "line",
            Shape::Polyline { .. } => "polyline",
            Shape::Polygon { .. } => "polygon",
        }
    }

    /// Anchor count of the undistorted shape.
    pub fn base_node_count(&self) -> usize {
        match self {
            Shape::Rect { .. } | Shape::Circle { .. } | Shape::Ellipse { .. } => 4,
            Shape::Line { .. } => 2,
            Shape::Polyline { points } | Shape::Polygon { points } => points.len(),
            Shape::Path { d } => count_node_commands(d),
        }
    }

    pub fn is_closed(&self) -> bool {
        match self {
            Shape::Rect { .. } | Shape::Circle { .. } | Shape::Ellipse { .. } | Shape::Polygon { .. } => true,
            Shape::Path { d } => has_close_command(d),
            Shape::Line { .. } | Shape::Polyline { .. } => false,
        }
    }

    fn numbers_finite(&self) -> bool {
        let all = |v: &[f64]| v.iter().all(|x| x.is_finite());
        match self {
            Shape::Path { .. } => true,
            Shape::Rect { x, y, width, height, rx, ry } => {
                all(&[*x, *y, *width, *height, rx.unwrap_or(0.0), ry.unwrap_or(0.0)])
            }
            Shape::Circle { cx, cy, r } => all(&[*cx, *cy, *r]),
            Shape::Ellipse { cx, cy, rx, ry } => all(&[*cx, *cy, *rx, *ry]),
            Shape::Line { x1, y1, x2, y2 } => all(&[*x1, *y1, *x2, *y2]),
            Shape::Polyline { points } | Shape::Polygon { points } => points.iter().all(|p| p.is_finite()),
        }
    }

    /// The measurable outline, or `None` when the shape has no finite geometry.
    pub fn outline(&self) -> Option<Box<dyn Outline>> {
        if !self.numbers_finite() {
            return None;
        }
        let outline: Box<dyn Outline> = match self {
            Shape::Line { x1, y1, x2, y2 } => Box::new(LineOutline { a: Point::new(*x1, *y1), b: Point::new(*x2, *y2) }),
            Shape::Rect { x, y, width, height, rx, ry } => {
                if *width <= 0.0 || *height <= 0.0 {
                    return None;
                }
                // A single radius applies to both axes
                let rx_v = rx.filter(|v| *v > 0.0).or(ry.filter(|v| *v > 0.0)).unwrap_or(0.0);
                let ry_v = ry.filter(|v| *v > 0.0).or(rx.filter(|v| *v > 0.0)).unwrap_or(0.0);
                if rx_v > 0.0 && ry_v > 0.0 {
                    Box::new(TabulatedOutline::rounded_rect(*x, *y, *width, *height, rx_v, ry_v))
                } else {
                    Box::new(RectOutline { x: *x, y: *y, width: *width, height: *height })
                }
            }
            Shape::Circle { cx, cy, r } => {
                if *r <= 0.0 {
                    return None;
                }
                Box::new(CircleOutline { cx: *cx, cy: *cy, r: *r })
            }
            Shape::Ellipse { cx, cy, rx, ry } => {
                if *rx <= 0.0 || *ry <= 0.0 {
                    return None;
                }
                Box::new(TabulatedOutline::ellipse(*cx, *cy, *rx, *ry))
            }
            Shape::Polyline { points } => Box::new(TabulatedOutline::from_points(points, false)),
            Shape::Polygon { points } => Box::new(TabulatedOutline::from_points(points, true)),
            Shape::Path { d } => Box::new(TabulatedOutline::from_subpaths(&parse_path_data(d))),
        };
        Some(outline)
    }
}

/// One geometry element of a source document with its attributes in
/// document order.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceElement {
    pub shape: Shape,
    pub attributes: Vec<(String, String)>,
}

impl SourceElement {
    pub fn new(shape: Shape) -> Self {
        SourceElement { shape, attributes: Vec::new() }
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.push((name.to_string(), value.to_string()));
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    /// Paint of the distorted path; absent or empty attributes fall back to
    /// a white fill and no stroke.
    pub fn style(&self) -> Style {
        let non_empty = |name: &str| self.attr(name).filter(|v| !v.is_empty());
        Style {
            fill: non_empty("fill").unwrap_or("#ffffff").to_string(),
            stroke: non_empty("stroke").unwrap_or("none").to_string(),
            fill_opacity: None,
            stroke_opacity: None,
            stroke_width: non_empty("stroke-width")
                .and_then(|v| v.trim().parse::<f64>().ok())
                .filter(|v| v.is_finite())
                .unwrap_or(0.0),
        }
    }

    pub fn carried_attributes(&self) -> Vec<(String, String)> {
        self.attributes
            .iter()
            .filter(|(k, _)| !GEOMETRY_ATTRIBUTES.contains(&k.as_str()))
            .cloned()
            .collect()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SourceDocument {
    pub elements: Vec<SourceElement>,
    pub dimensions: Dimensions,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    #[default]
    Bake,
    Filter,
}

/// Distortion parameters. Values outside the slider ranges are accepted;
/// only non-finite values are replaced by [`DistortParams::sanitized`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistortParams {
    pub mode: DistortionMode,
    pub render: RenderMode,
    pub amount: f64,
    pub frequency: f64,
    pub smoothness: f64,
    pub seed: f64,
}

impl Default for DistortParams {
    fn default() -> Self {
        DistortParams {
            mode: DistortionMode::Jitter,
            render: RenderMode::Bake,
            amount: 12.0,
            frequency: 20.0,
            smoothness: 0.0,
            seed: 8.0,
        }
    }
}

impl DistortParams {
    pub fn sanitized(&self) -> DistortParams {
        let d = DistortParams::default();
        let fin = |v: f64, fallback: f64| if v.is_finite() { v } else { fallback };
        DistortParams {
            mode: self.mode,
            render: self.render,
            amount: fin(self.amount, d.amount),
            frequency: fin(self.frequency, d.frequency).max(0.0),
            smoothness: fin(self.smoothness, d.smoothness).max(0.0),
            seed: fin(self.seed, d.seed),
        }
    }

    pub fn with_render(mut self, render: RenderMode) -> DistortParams {
        self.render = render;
        self
    }

    fn key(&self) -> ParamKey {
        ParamKey {
            mode: self.mode,
            render: self.render,
            bits: [self.amount.to_bits(), self.frequency.to_bits(), self.smoothness.to_bits(), self.seed.to_bits()],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ParamKey {
    mode: DistortionMode,
    render: RenderMode,
    bits: [u64; 4],
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoiseKind {
    Fractal,
    Turbulence,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PostEffect {
    Blur { std_deviation: f64 },
    DuplicateOffset { dx: f64, dy: f64 },
}

/// Parameters of a renderer-side displacement filter.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DisplacementDescriptor {
    pub kind: NoiseKind,
    pub base_frequency: f64,
    pub displacement_scale: f64,
    pub octaves: u32,
    pub seed: f64,
    pub post_effect: Option<PostEffect>,
}

impl DisplacementDescriptor {
    pub fn from_params(p: &DistortParams) -> Self {
        let post_effect = match p.mode {
            DistortionMode::InkSpread => Some(PostEffect::Blur { std_deviation: p.amount / 18.0 + 0.6 }),
            DistortionMode::Offset => {
                Some(PostEffect::DuplicateOffset { dx: p.amount / 8.0 + 1.0, dy: p.amount / 12.0 + 0.5 })
            }
            _ => None,
        };
        DisplacementDescriptor {
            kind: if p.mode == DistortionMode::Noise { NoiseKind::Fractal } else { NoiseKind::Turbulence },
            base_frequency: (p.frequency / 800.0).max(0.002),
            displacement_scale: (p.amount * 1.1).max(0.0),
            octaves: round_half_up(1.0 + p.smoothness / 45.0).max(1.0) as u32,
            seed: p.seed,
            post_effect,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DistortionResult {
    pub node_count: usize,
    pub base_node_count: usize,
    pub baked: Option<PathSet>,
    pub descriptor: Option<DisplacementDescriptor>,
    pub dimensions: Dimensions,
    pub error: Option<String>,
}

impl DistortionResult {
    pub fn failed(message: impl Into<String>) -> Self {
        DistortionResult { error: Some(message.into()), ..Default::default() }
    }
}

/// Sample spacing along the outline for a frequency.
pub fn sample_spacing(frequency: f64) -> f64 {
    let base = (70.0 - frequency.min(50.0) * 1.2).max(6.0);
    let extra = (frequency - 50.0).max(0.0);
    (base - extra * 0.3).max(2.0)
}

pub fn sample_count(length: f64, base_nodes: usize, frequency: f64) -> usize {
    let floor = if base_nodes == 0 { 4 } else { base_nodes };
    let by_length = round_half_up(length / sample_spacing(frequency)).max(0.0) as usize;
    by_length.max(floor).min(limits::MAX_SAMPLES_PER_ELEMENT)
}

/// Moving average of `offsets` over `±window` neighbours; closed sequences
/// wrap, open ones average only the neighbours that exist.
pub fn smooth_offsets(offsets: &[Point], window: usize, closed: bool) -> Vec<Point> {
    let n = offsets.len() as isize;
    let w = window as isize;
    (0..n)
        .map(|idx| {
            let mut sum = Point::ZERO;
            let mut count = 0usize;
            for step in -w..=w {
                let mut k = idx + step;
                if closed {
                    k = k.rem_euclid(n);
                } else if k < 0 || k >= n {
                    continue;
                }
                sum = sum.add(offsets[k as usize]);
                count += 1;
            }
            sum.scale(1.0 / count as f64)
        })
        .collect()
}

/// Run one distortion pass over `doc`.
pub fn distort(doc: &SourceDocument, params: &DistortParams) -> DistortionResult {
    let p = params.sanitized();
    let needs_bake = p.render == RenderMode::Bake && p.amount > 0.0;
    let strength = p.amount.max(0.0);
    let freq = effective_frequency(p.frequency);
    let window = round_half_up(p.smoothness / 30.0).max(1.0) as usize;

    let mut base_nodes_total = 0usize;
    let mut generated = 0usize;
    let mut paths = Vec::new();

    for (index, element) in doc.elements.iter().enumerate() {
        let Some(outline) = element.shape.outline() else {
            continue;
        };
        let length = outline.length();
        if !length.is_finite() || length <= 0.0 {
            continue;
        }
        let base_nodes = element.shape.base_node_count();
        base_nodes_total += base_nodes;
        if !needs_bake {
            continue;
        }

        let count = sample_count(length, base_nodes, p.frequency);
        let closed = element.shape.is_closed();
        let mut samples = Vec::with_capacity(count);
        let mut offsets = Vec::with_capacity(count);
        for i in 0..count {
            let t = if count == 1 {
                0.0
            } else if closed {
                i as f64 / count as f64
            } else {
                i as f64 / (count - 1) as f64
            };
            samples.push(outline.point_at_length(length * t));
            let (dx, dy) = p.mode.offset(i + index * limits::ELEMENT_INDEX_STRIDE, t, strength, freq, p.seed);
            offsets.push(Point::new(dx, dy));
        }
        if p.smoothness > 0.0 {
            offsets = smooth_offsets(&offsets, window, closed);
        }
        let points: Vec<Point> = samples.iter().zip(&offsets).map(|(b, o)| b.add(*o)).collect();
        if points.iter().any(|q| !q.is_finite()) {
            log::warn!("{}-{} produced non-finite samples; skipped", element.shape.tag(), index);
            base_nodes_total -= base_nodes;
            continue;
        }
        generated += count;

        let mut path = Path::new(
            format!("{}-{}", element.shape.tag(), index),
            catmull_rom_centripetal(&points, closed),
            closed,
            element.style(),
        );
        path.attributes = element.carried_attributes();
        paths.push(path);
    }

    log::debug!(
        "distort {} ({:?}): {} elements, {} base nodes, {} generated",
        p.mode,
        p.render,
        doc.elements.len(),
        base_nodes_total,
        generated
    );

    DistortionResult {
        node_count: if needs_bake { generated } else { base_nodes_total },
        base_node_count: base_nodes_total,
        baked: needs_bake.then(|| PathSet::new(paths)),
        descriptor: (p.render == RenderMode::Filter).then(|| DisplacementDescriptor::from_params(&p)),
        dimensions: doc.dimensions.clone(),
        error: None,
    }
}

/// Distort raw markup. Unparseable markup is reported in the result.
pub fn distort_markup(markup: &str, params: &DistortParams) -> DistortionResult {
    if markup.trim().is_empty() {
        return DistortionResult::default();
    }
    match crate::svg::parse_document(markup) {
        Ok(doc) => distort(&doc, params),
        Err(e) => {
            log::warn!("distortion input rejected: {}", e);
            DistortionResult::failed(e.to_string())
        }
    }
}

/// Preview and export results of one parameter set. The export is always
/// baked so the refine step receives geometry even while previewing a filter.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rendered {
    pub preview: DistortionResult,
    pub export: DistortionResult,
}

/// A source document with the last rendering memoised by parameters.
pub struct Distorter {
    source: SourceDocument,
    cache: RefCell<Option<(ParamKey, Rendered)>>,
}

impl Distorter {
    pub fn new(source: SourceDocument) -> Self {
        Distorter { source, cache: RefCell::new(None) }
    }

    pub fn from_markup(markup: &str) -> crate::Result<Self> {
        Ok(Self::new(crate::svg::parse_document(markup)?))
    }

    pub fn source(&self) -> &SourceDocument {
        &self.source
    }

    pub fn render(&self, params: &DistortParams) -> Rendered {
        let params = params.sanitized();
        let key = params.key();
        if let Some((k, r)) = self.cache.borrow().as_ref() {
            if *k == key {
                return r.clone();
            }
        }
        let preview = distort(&self.source, &params);
        let export = if params.render == RenderMode::Bake {
            preview.clone()
        } else {
            distort(&self.source, &params.with_render(RenderMode::Bake))
        };
        let rendered = Rendered { preview, export };
        *self.cache.borrow_mut() = Some((key, rendered.clone()));
        rendered
    }

    pub fn is_cached(&self, params: &DistortParams) -> bool {
        let key = params.sanitized().key();
        matches!(self.cache.borrow().as_ref(), Some((k, _)) if *k == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spacing_curve() {
        assert_eq!(sample_spacing(20.0), 46.0);
        assert_eq!(sample_spacing(50.0), 10.0);
        assert_eq!(sample_spacing(100.0), 2.0);
        assert_eq!(sample_spacing(0.0), 70.0);
    }

    #[test]
    fn sample_count_respects_floor_and_cap() {
        assert_eq!(sample_count(10.0, 4, 20.0), 4);
        assert_eq!(sample_count(10.0, 0, 20.0), 4);
        assert_eq!(sample_count(400.0, 4, 20.0), 9);
        assert_eq!(sample_count(1e9, 4, 20.0), limits::MAX_SAMPLES_PER_ELEMENT);
    }

    #[test]
    fn open_smoothing_clips_at_ends() {
        let offs = [Point::new(3.0, 0.0), Point::new(0.0, 0.0), Point::new(0.0, 0.0)];
        let open = smooth_offsets(&offs, 1, false);
        assert_eq!(open[0], Point::new(1.5, 0.0));
        let closed = smooth_offsets(&offs, 1, true);
        assert_eq!(closed[2], Point::new(1.0, 0.0));
    }

    #[test]
    fn element_style_defaults() {
        let el = SourceElement::new(Shape::Circle { cx: 0.0, cy: 0.0, r: 5.0 });
        let s = el.style();
        assert_eq!(s.fill, "#ffffff");
        assert_eq!(s.stroke, "none");
        assert_eq!(s.stroke_width, 0.0);
        let el = el.with_attr("stroke", "red").with_attr("stroke-width", "2.5").with_attr("r", "5");
        assert_eq!(el.style().stroke_width, 2.5);
        assert_eq!(el.carried_attributes(), vec![("stroke".to_string(), "red".to_string()), ("stroke-width".to_string(), "2.5".to_string())]);
    }

    #[test]
    fn descriptor_post_effects() {
        let mut p = DistortParams { mode: DistortionMode::InkSpread, amount: 18.0, ..Default::default() };
        let d = DisplacementDescriptor::from_params(&p);
        assert_eq!(d.kind, NoiseKind::Turbulence);
        match d.post_effect {
            Some(PostEffect::Blur { std_deviation }) => assert!((std_deviation - 1.6).abs() < 1e-12),
            other => panic!("unexpected post effect {other:?}"),
        }
        p.mode = DistortionMode::Noise;
        p.smoothness = 90.0;
        let d = DisplacementDescriptor::from_params(&p);
        assert_eq!(d.kind, NoiseKind::Fractal);
        assert_eq!(d.octaves, 3);
        assert_eq!(d.post_effect, None);
    }
}
