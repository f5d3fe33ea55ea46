use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }
    #[inline]
    pub fn add(self, o: Point) -> Point {
        Point { x: self.x + o.x, y: self.y + o.y }
    }
    #[inline]
    pub fn sub(self, o: Point) -> Point {
        Point { x: self.x - o.x, y: self.y - o.y }
    }
    #[inline]
    pub fn scale(self, s: f64) -> Point {
        Point { x: self.x * s, y: self.y * s }
    }
    #[inline]
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }
    #[inline]
    pub fn distance(self, o: Point) -> f64 {
        self.sub(o).length()
    }
    #[inline]
    pub fn lerp(self, o: Point, t: f64) -> Point {
        Point { x: self.x + t * (o.x - self.x), y: self.y + t * (o.y - self.y) }
    }
    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// One cubic span. Handles are stored at tension 1.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub p1: Point,
    pub cp1: Point,
    pub cp2: Point,
    pub p2: Point,
}

impl Segment {
    pub fn new(p1: Point, cp1: Point, cp2: Point, p2: Point) -> Self {
        Segment { p1, cp1, cp2, p2 }
    }

    /// A straight span with handles sitting on their anchors.
    pub fn line(p1: Point, p2: Point) -> Self {
        Segment { p1, cp1: p1, cp2: p2, p2 }
    }

    pub fn is_finite(&self) -> bool {
        self.p1.is_finite() && self.cp1.is_finite() && self.cp2.is_finite() && self.p2.is_finite()
    }
}

/// Global document style. Paint values are kept as the CSS strings the
/// source carried (`#ffffff`, `none`, `rgb(...)`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Style {
    pub fill: String,
    pub stroke: String,
    pub fill_opacity: Option<f64>,
    pub stroke_opacity: Option<f64>,
    pub stroke_width: f64,
}

impl Default for Style {
    fn default() -> Self {
        Style {
            fill: "#ffffff".to_string(),
            stroke: "none".to_string(),
            fill_opacity: None,
            stroke_opacity: None,
            stroke_width: 0.0,
        }
    }
}

impl Style {
    pub const DEFAULT_OPACITY: f64 = 0.1;

    /// Style a refine session starts from: opacities default to 0.1 and an
    /// absent stroke colour becomes black so toggling the stroke on shows it.
    pub fn for_editing(&self) -> Style {
        Style {
            fill: if self.fill.is_empty() { "#ffffff".into() } else { self.fill.clone() },
            stroke: if self.stroke.is_empty() { "#000000".into() } else { self.stroke.clone() },
            fill_opacity: Some(self.fill_opacity.unwrap_or(Self::DEFAULT_OPACITY)),
            stroke_opacity: Some(self.stroke_opacity.unwrap_or(Self::DEFAULT_OPACITY)),
            stroke_width: if self.stroke_width.is_finite() { self.stroke_width } else { 1.0 },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Path {
    pub id: String,
    pub segments: Vec<Segment>,
    pub closed: bool,
    pub style: Style,
    /// Non-geometric attributes carried over from the source element
    /// (`class`, `transform`, ...), written back only on the baked document.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<(String, String)>,
}

impl Path {
    pub fn new(id: impl Into<String>, segments: Vec<Segment>, closed: bool, style: Style) -> Self {
        Path { id: id.into(), segments, closed, style, attributes: Vec::new() }
    }

    /// Anchor count as shown to the user: closed paths reuse the first anchor.
    pub fn node_count(&self) -> usize {
        if self.segments.is_empty() {
            0
        } else if self.closed {
            self.segments.len()
        } else {
            self.segments.len() + 1
        }
    }

    /// Index of the segment sharing `p1` of segment `i`, if any. A closed
    /// path of one segment is its own neighbour.
    pub fn prev_index(&self, i: usize) -> Option<usize> {
        let n = self.segments.len();
        if i >= n {
            None
        } else if i > 0 {
            Some(i - 1)
        } else if self.closed {
            Some(n - 1)
        } else {
            None
        }
    }

    /// Index of the segment sharing `p2` of segment `i`, if any.
    pub fn next_index(&self, i: usize) -> Option<usize> {
        let n = self.segments.len();
        if i + 1 < n {
            Some(i + 1)
        } else if i + 1 == n && self.closed {
            Some(0)
        } else {
            None
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub nodes: usize,
    pub control_points: usize,
    pub paths: usize,
}

/// The editable document: every path of the current session in paint order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PathSet {
    pub paths: Vec<Path>,
}

impl PathSet {
    pub fn new(paths: Vec<Path>) -> Self {
        PathSet { paths }
    }
    pub fn len(&self) -> usize {
        self.paths.len()
    }
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
    pub fn get(&self, i: usize) -> Option<&Path> {
        self.paths.get(i)
    }
    pub fn get_mut(&mut self, i: usize) -> Option<&mut Path> {
        self.paths.get_mut(i)
    }
    pub fn iter(&self) -> std::slice::Iter<'_, Path> {
        self.paths.iter()
    }

    pub fn segment_count(&self) -> usize {
        self.paths.iter().map(|p| p.segments.len()).sum()
    }

    pub fn metrics(&self) -> Metrics {
        let nodes: usize = self.paths.iter().map(Path::node_count).sum();
        Metrics { nodes, control_points: nodes * 2, paths: self.paths.len() }
    }

    /// Style of the document as the UI shows it: the first path's.
    pub fn leading_style(&self) -> Option<&Style> {
        self.paths.first().map(|p| &p.style)
    }

    pub fn apply_style(&mut self, style: &Style) {
        for p in &mut self.paths {
            p.style = style.clone();
        }
    }

    /// A lone circle of four quarter arcs, used when a session starts
    /// without any distortion output.
    pub fn fallback_circle(cx: f64, cy: f64, radius: f64) -> PathSet {
        const KAPPA: f64 = 0.552_284_749_8;
        let k = radius * KAPPA;
        let top = Point::new(cx, cy - radius);
        let right = Point::new(cx + radius, cy);
        let bottom = Point::new(cx, cy + radius);
        let left = Point::new(cx - radius, cy);
        let segments = vec![
            Segment::new(top, Point::new(cx + k, cy - radius), Point::new(cx + radius, cy - k), right),
            Segment::new(right, Point::new(cx + radius, cy + k), Point::new(cx + k, cy + radius), bottom),
            Segment::new(bottom, Point::new(cx - k, cy + radius), Point::new(cx - radius, cy + k), left),
            Segment::new(left, Point::new(cx - radius, cy - k), Point::new(cx - k, cy - radius), top),
        ];
        let style = Style {
            fill: "#ffffff".into(),
            stroke: "#000000".into(),
            fill_opacity: Some(Style::DEFAULT_OPACITY),
            stroke_opacity: Some(Style::DEFAULT_OPACITY),
            stroke_width: 1.0,
        };
        PathSet::new(vec![Path::new("fallback-circle", segments, true, style)])
    }
}

impl From<Vec<Path>> for PathSet {
    fn from(paths: Vec<Path>) -> Self {
        PathSet { paths }
    }
}

impl<'a> IntoIterator for &'a PathSet {
    type Item = &'a Path;
    type IntoIter = std::slice::Iter<'a, Path>;
    fn into_iter(self) -> Self::IntoIter {
        self.paths.iter()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ViewBox {
    /// Parse `min-x min-y width height`; anything but four finite numbers is rejected.
    pub fn parse(s: &str) -> Option<ViewBox> {
        let parts: Vec<f64> = s
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|p| !p.is_empty())
            .map(|p| p.parse::<f64>())
            .collect::<Result<_, _>>()
            .ok()?;
        if parts.len() != 4 || parts.iter().any(|v| !v.is_finite()) {
            return None;
        }
        Some(ViewBox { x: parts[0], y: parts[1], width: parts[2], height: parts[3] })
    }
}

impl std::fmt::Display for ViewBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {} {}", self.x, self.y, self.width, self.height)
    }
}

/// Canvas size of a document as declared on its root.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dimensions {
    pub view_box: Option<ViewBox>,
    pub width: Option<String>,
    pub height: Option<String>,
}

impl Dimensions {
    pub const FALLBACK_SIZE: f64 = 800.0;

    /// Width and height in user units: the view box if present, else the
    /// numeric prefix of `width`/`height`, else 800.
    pub fn size(&self) -> (f64, f64) {
        if let Some(vb) = self.view_box {
            return (vb.width, vb.height);
        }
        let num = |s: &Option<String>| {
            s.as_deref()
                .and_then(|v| {
                    let end = v
                        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-' || c == '+' || c == 'e' || c == 'E'))
                        .unwrap_or(v.len());
                    v[..end].parse::<f64>().ok()
                })
                .filter(|v| v.is_finite() && *v > 0.0)
                .unwrap_or(Self::FALLBACK_SIZE)
        };
        (num(&self.width), num(&self.height))
    }

    /// The view box to write on export, synthesised from the size when the
    /// source declared none.
    pub fn export_view_box(&self) -> ViewBox {
        self.view_box.unwrap_or_else(|| {
            let (width, height) = self.size();
            ViewBox { x: 0.0, y: 0.0, width, height }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_box_parses_commas_and_spaces() {
        let vb = ViewBox::parse("0,0 120 80").unwrap();
        assert_eq!(vb.width, 120.0);
        assert_eq!(vb.height, 80.0);
        assert!(ViewBox::parse("0 0 nan 10").is_none());
        assert!(ViewBox::parse("0 0 10").is_none());
    }

    #[test]
    fn dimensions_fall_back_to_800() {
        let d = Dimensions::default();
        assert_eq!(d.size(), (800.0, 800.0));
        let d = Dimensions { view_box: None, width: Some("300px".into()), height: None };
        assert_eq!(d.size(), (300.0, 800.0));
    }

    #[test]
    fn closed_neighbours_wrap() {
        let seg = Segment::line(Point::ZERO, Point::new(1.0, 0.0));
        let closed = Path::new("a", vec![seg; 3], true, Style::default());
        assert_eq!(closed.prev_index(0), Some(2));
        assert_eq!(closed.next_index(2), Some(0));
        let open = Path::new("b", vec![seg; 3], false, Style::default());
        assert_eq!(open.prev_index(0), None);
        assert_eq!(open.next_index(2), None);
        assert_eq!(open.node_count(), 4);
        assert_eq!(closed.node_count(), 3);
    }
}
