//! SVG reading and writing.
//!
//! Reading extracts the geometry elements (`path`, `rect`, `circle`,
//! `ellipse`, `line`, `polyline`, `polygon`) and the root dimensions from
//! markup; every other element is ignored. Writing produces path-only
//! documents for export, the baked distortion document, and the displacement
//! filter used by the filter preview.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::algorithms::distort::{
    DisplacementDescriptor, DistortionResult, NoiseKind, PostEffect, Shape, SourceDocument, SourceElement,
};
use crate::geometry::limits;
use crate::geometry::path_data::parse_path_data;
use crate::model::{Dimensions, Path, PathSet, Point, Style, ViewBox};
use crate::{Error, Result};

pub const SVG_NS: &str = "http://www.w3.org/2000/svg";
pub const FILTER_ID: &str = "edgeDistort";

/// Whether the exported document paints fills and strokes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportOptions {
    pub fill_enabled: bool,
    pub stroke_enabled: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        ExportOptions { fill_enabled: true, stroke_enabled: true }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SvgPath {
    pub d: String,
    pub fill: String,
    pub fill_opacity: Option<f64>,
    pub stroke: String,
    pub stroke_width: f64,
    pub stroke_opacity: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SvgDocument {
    pub view_box: ViewBox,
    pub width: Option<String>,
    pub height: Option<String>,
    pub paths: Vec<SvgPath>,
}

impl SvgDocument {
    pub fn to_markup(&self) -> String {
        let mut s = String::new();
        let _ = write!(s, "<svg xmlns=\"{}\" viewBox=\"{}\"", SVG_NS, self.view_box);
        if let Some(w) = &self.width {
            let _ = write!(s, " width=\"{}\"", escape_attr(w));
        }
        if let Some(h) = &self.height {
            let _ = write!(s, " height=\"{}\"", escape_attr(h));
        }
        s.push('>');
        for p in &self.paths {
            let _ = write!(s, "<path d=\"{}\" fill=\"{}\"", p.d, escape_attr(&p.fill));
            if let Some(o) = p.fill_opacity {
                let _ = write!(s, " fill-opacity=\"{}\"", o);
            }
            let _ = write!(s, " stroke=\"{}\" stroke-width=\"{}\"", escape_attr(&p.stroke), p.stroke_width);
            if let Some(o) = p.stroke_opacity {
                let _ = write!(s, " stroke-opacity=\"{}\"", o);
            }
            s.push_str("/>");
        }
        s.push_str("</svg>");
        s
    }
}

fn escape_attr(v: &str) -> String {
    let mut out = String::with_capacity(v.len());
    for c in v.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// `M x y` then one `C` per segment, `Z` when closed; three decimals.
pub fn path_data(path: &Path) -> String {
    let Some(first) = path.segments.first() else {
        return String::new();
    };
    let mut d = format!("M {:.3} {:.3}", first.p1.x, first.p1.y);
    for s in &path.segments {
        let _ = write!(
            d,
            " C {:.3} {:.3} {:.3} {:.3} {:.3} {:.3}",
            s.cp1.x, s.cp1.y, s.cp2.x, s.cp2.y, s.p2.x, s.p2.y
        );
    }
    if path.closed {
        d.push_str(" Z");
    }
    d
}

/// Path data of every path, one per line.
pub fn path_data_text(paths: &PathSet) -> String {
    paths.iter().map(path_data).filter(|d| !d.is_empty()).collect::<Vec<_>>().join("\n")
}

/// Export document for `paths` painted with the document `style`.
pub fn to_document(paths: &PathSet, style: &Style, options: ExportOptions, dimensions: &Dimensions) -> SvgDocument {
    let fill = if !options.fill_enabled {
        "none".to_string()
    } else if style.fill.is_empty() {
        "#ffffff".to_string()
    } else {
        style.fill.clone()
    };
    let stroke = if !options.stroke_enabled {
        "none".to_string()
    } else if style.stroke.is_empty() {
        "#000000".to_string()
    } else {
        style.stroke.clone()
    };
    let stroke_width = if options.stroke_enabled { style.stroke_width } else { 0.0 };
    let paths = paths
        .iter()
        .filter(|p| !p.segments.is_empty())
        .map(|p| SvgPath {
            d: path_data(p),
            fill: fill.clone(),
            fill_opacity: style.fill_opacity,
            stroke: stroke.clone(),
            stroke_width,
            stroke_opacity: style.stroke_opacity,
        })
        .collect();
    SvgDocument {
        view_box: dimensions.export_view_box(),
        width: dimensions.width.clone(),
        height: dimensions.height.clone(),
        paths,
    }
}

/// The baked distortion as a document: one path per distorted element with
/// the element's non-geometric attributes.
pub fn baked_markup(result: &DistortionResult) -> String {
    let mut s = format!("<svg xmlns=\"{}\"", SVG_NS);
    let dims = &result.dimensions;
    if let Some(vb) = dims.view_box {
        let _ = write!(s, " viewBox=\"{}\"", vb);
    }
    if let Some(w) = &dims.width {
        let _ = write!(s, " width=\"{}\"", escape_attr(w));
    }
    if let Some(h) = &dims.height {
        let _ = write!(s, " height=\"{}\"", escape_attr(h));
    }
    s.push_str(" overflow=\"visible\">");
    if let Some(baked) = &result.baked {
        for p in baked {
            let _ = write!(s, "<path d=\"{}\"", path_data(p));
            for (k, v) in &p.attributes {
                if k == "xmlns" || k.starts_with("xmlns:") {
                    continue;
                }
                let _ = write!(s, " {}=\"{}\"", k, escape_attr(v));
            }
            s.push_str("/>");
        }
    }
    s.push_str("</svg>");
    s
}

/// `<filter>` element reproducing a displacement descriptor.
pub fn filter_markup(desc: &DisplacementDescriptor) -> String {
    let kind = match desc.kind {
        NoiseKind::Fractal => "fractalNoise",
        NoiseKind::Turbulence => "turbulence",
    };
    let mut s = format!("<filter id=\"{}\" x=\"-50%\" y=\"-50%\" width=\"200%\" height=\"200%\">", FILTER_ID);
    let _ = write!(
        s,
        "<feTurbulence type=\"{}\" baseFrequency=\"{:.4}\" numOctaves=\"{}\" seed=\"{}\" result=\"noise\"/>",
        kind, desc.base_frequency, desc.octaves, desc.seed
    );
    let _ = write!(
        s,
        "<feDisplacementMap in=\"SourceGraphic\" in2=\"noise\" scale=\"{}\" xChannelSelector=\"R\" yChannelSelector=\"G\" result=\"distort\"/>",
        desc.displacement_scale
    );
    match desc.post_effect {
        Some(PostEffect::Blur { std_deviation }) => {
            let _ = write!(
                s,
                "<feGaussianBlur in=\"distort\" stdDeviation=\"{:.2}\" result=\"blur\"/><feMerge><feMergeNode in=\"blur\"/><feMergeNode in=\"distort\"/></feMerge>",
                std_deviation
            );
        }
        Some(PostEffect::DuplicateOffset { dx, dy }) => {
            let _ = write!(
                s,
                "<feOffset in=\"distort\" dx=\"{:.1}\" dy=\"{:.1}\" result=\"offset\"/><feMerge><feMergeNode in=\"distort\"/><feMergeNode in=\"offset\"/></feMerge>",
                dx, dy
            );
        }
        None => {}
    }
    s.push_str("</filter>");
    s
}

fn parse_xml(markup: &str) -> Result<roxmltree::Document<'_>> {
    if markup.len() > limits::MAX_MARKUP_BYTES {
        return Err(Error::CapsExceeded(format!("markup of {} bytes", markup.len())));
    }
    let opts = roxmltree::ParsingOptions { allow_dtd: true, ..Default::default() };
    roxmltree::Document::parse_with_options(markup, opts).map_err(|e| Error::InvalidMarkup(e.to_string()))
}

/// Leading number of a length attribute (`"12.5px"` is 12.5).
fn parse_length(v: &str) -> Option<f64> {
    let v = v.trim();
    let end = v
        .char_indices()
        .find(|&(i, c)| {
            !(c.is_ascii_digit()
                || c == '.'
                || ((c == '-' || c == '+') && (i == 0 || matches!(v.as_bytes()[i - 1], b'e' | b'E')))
                || ((c == 'e' || c == 'E') && i > 0))
        })
        .map(|(i, _)| i)
        .unwrap_or(v.len());
    v[..end].parse::<f64>().ok()
}

fn num_attr(node: &roxmltree::Node<'_, '_>, name: &str) -> f64 {
    node.attribute(name).and_then(parse_length).unwrap_or(0.0)
}

fn opt_attr(node: &roxmltree::Node<'_, '_>, name: &str) -> Option<f64> {
    node.attribute(name).and_then(parse_length)
}

/// Coordinate pairs of a `points` attribute; a dangling odd value is dropped.
pub fn parse_points(v: &str) -> Vec<Point> {
    let nums: Vec<f64> = v
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .map(|t| t.parse::<f64>().unwrap_or(f64::NAN))
        .collect();
    nums.chunks_exact(2).take(limits::MAX_POLY_POINTS).map(|c| Point::new(c[0], c[1])).collect()
}

fn shape_of(node: &roxmltree::Node<'_, '_>) -> Option<Shape> {
    let shape = match node.tag_name().name() {
        "path" => Shape::Path { d: node.attribute("d").unwrap_or("").to_string() },
        "rect" => Shape::Rect {
            x: num_attr(node, "x"),
            y: num_attr(node, "y"),
            width: num_attr(node, "width"),
            height: num_attr(node, "height"),
            rx: opt_attr(node, "rx"),
            ry: opt_attr(node, "ry"),
        },
        "circle" => Shape::Circle { cx: num_attr(node, "cx"), cy: num_attr(node, "cy"), r: num_attr(node, "r") },
        "ellipse" => Shape::Ellipse {
            cx: num_attr(node, "cx"),
            cy: num_attr(node, "cy"),
            rx: num_attr(node, "rx"),
            ry: num_attr(node, "ry"),
        },
        "line" => Shape::Line {
            x1: num_attr(node, "x1"),
            y1: num_attr(node, "y1"),
            x2: num_attr(node, "x2"),
            y2: num_attr(node, "y2"),
        },
        "polyline" => Shape::Polyline { points: parse_points(node.attribute("points").unwrap_or("")) },
        "polygon" => Shape::Polygon { points: parse_points(node.attribute("points").unwrap_or("")) },
        _ => return None,
    };
    Some(shape)
}

fn dimensions_of(root: &roxmltree::Node<'_, '_>) -> Dimensions {
    let non_empty = |name: &str| root.attribute(name).filter(|v| !v.trim().is_empty()).map(str::to_string);
    Dimensions {
        view_box: root.attribute("viewBox").and_then(ViewBox::parse),
        width: non_empty("width"),
        height: non_empty("height"),
    }
}

/// Extract geometry elements and dimensions from SVG markup.
pub fn parse_document(markup: &str) -> Result<SourceDocument> {
    let doc = parse_xml(markup)?;
    let root = doc.root_element();
    let mut elements = Vec::new();
    for node in root.descendants().filter(|n| n.is_element()) {
        let Some(shape) = shape_of(&node) else {
            continue;
        };
        if elements.len() >= limits::MAX_ELEMENTS {
            return Err(Error::CapsExceeded(format!("more than {} geometry elements", limits::MAX_ELEMENTS)));
        }
        let attributes = node.attributes().map(|a| (a.name().to_string(), a.value().to_string())).collect();
        elements.push(SourceElement { shape, attributes });
    }
    log::debug!("parsed {} geometry elements", elements.len());
    Ok(SourceDocument { elements, dimensions: dimensions_of(&root) })
}

/// Read the `path` elements of a document back as editable paths, one per
/// subpath, without distorting them.
pub fn import_paths(markup: &str) -> Result<(PathSet, Dimensions)> {
    let source = parse_document(markup)?;
    let mut paths = Vec::new();
    for (index, element) in source.elements.iter().enumerate() {
        let Shape::Path { d } = &element.shape else {
            continue;
        };
        let style = Style {
            fill_opacity: element.attr("fill-opacity").and_then(parse_length),
            stroke_opacity: element.attr("stroke-opacity").and_then(parse_length),
            ..element.style()
        };
        for (k, sub) in parse_path_data(d).into_iter().enumerate() {
            let segments = sub.curves.iter().map(|c| c.to_segment()).collect();
            let mut path = Path::new(format!("path-{index}-{k}"), segments, sub.closed, style.clone());
            path.attributes = element.carried_attributes();
            paths.push(path);
        }
    }
    if paths.len() > limits::MAX_PATHS {
        return Err(Error::CapsExceeded(format!("more than {} paths", limits::MAX_PATHS)));
    }
    Ok((PathSet::new(paths), source.dimensions))
}
