//! SVG path data (`d` attribute) parsing into cubic subpaths.
//!
//! Every command is normalised to cubics: lines become straight cubics,
//! quadratics are degree-elevated and elliptical arcs are split into
//! quarter-or-smaller cubic approximations. Parsing stops at the first
//! malformed token and keeps what was read so far, the way renderers draw
//! path data up to an error.

use crate::geometry::cubic::CubicBezier;
use crate::geometry::limits;
use crate::model::Point;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SubPath {
    pub curves: Vec<CubicBezier>,
    pub closed: bool,
}

fn is_cmd(c: u8) -> bool {
    matches!(
        c,
        b'M' | b'm' | b'L' | b'l' | b'H' | b'h' | b'V' | b'v' | b'C' | b'c' | b'S' | b's'
            | b'Q' | b'q' | b'T' | b't' | b'A' | b'a' | b'Z' | b'z'
    )
}

fn skip_ws(bytes: &[u8], i: &mut usize) {
    while *i < bytes.len() {
        let c = bytes[*i];
        if c == b' ' || c == b'\n' || c == b'\t' || c == b'\r' || c == b',' {
            *i += 1;
        } else {
            break;
        }
    }
}

fn parse_num(bytes: &[u8], i: &mut usize) -> Option<f64> {
    skip_ws(bytes, i);
    let start = *i;
    let mut j = *i;
    if j < bytes.len() && (bytes[j] == b'-' || bytes[j] == b'+') {
        j += 1;
    }
    let mut digits = 0;
    while j < bytes.len() && bytes[j].is_ascii_digit() {
        j += 1;
        digits += 1;
    }
    if j < bytes.len() && bytes[j] == b'.' {
        j += 1;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
            digits += 1;
        }
    }
    if digits == 0 {
        return None;
    }
    if j < bytes.len() && (bytes[j] == b'e' || bytes[j] == b'E') {
        let mut k = j + 1;
        if k < bytes.len() && (bytes[k] == b'-' || bytes[k] == b'+') {
            k += 1;
        }
        if k < bytes.len() && bytes[k].is_ascii_digit() {
            while k < bytes.len() && bytes[k].is_ascii_digit() {
                k += 1;
            }
            j = k;
        }
    }
    let s = std::str::from_utf8(&bytes[start..j]).ok()?;
    let v = s.parse::<f64>().ok()?;
    *i = j;
    if limits::in_coord_bounds(v) {
        Some(v)
    } else {
        None
    }
}

fn parse_flag(bytes: &[u8], i: &mut usize) -> Option<bool> {
    skip_ws(bytes, i);
    match bytes.get(*i) {
        Some(b'0') => {
            *i += 1;
            Some(false)
        }
        Some(b'1') => {
            *i += 1;
            Some(true)
        }
        _ => None,
    }
}

/// True when another argument group follows (no command letter next).
fn more_args(bytes: &[u8], i: &mut usize) -> bool {
    skip_ws(bytes, i);
    *i < bytes.len() && !is_cmd(bytes[*i])
}

/// Parse `d` into cubic subpaths.
pub fn parse_path_data(d: &str) -> Vec<SubPath> {
    if d.len() > limits::MAX_PATH_DATA_BYTES {
        log::warn!("path data of {} bytes exceeds the ingestion cap", d.len());
        return Vec::new();
    }
    let bytes = d.as_bytes();
    let mut i = 0usize;
    let mut out: Vec<SubPath> = Vec::new();
    let mut current = SubPath::default();
    let mut cur = Point::ZERO;
    let mut start_sub = Point::ZERO;
    // Reflection sources for S/T
    let mut last_cubic_ctrl: Option<Point> = None;
    let mut last_quad_ctrl: Option<Point> = None;
    let mut cmd_count = 0usize;
    let mut segs = 0usize;

    macro_rules! num {
        () => {
            match parse_num(bytes, &mut i) {
                Some(v) => v,
                None => break,
            }
        };
    }

    let flush = |current: &mut SubPath, out: &mut Vec<SubPath>| {
        if !current.curves.is_empty() {
            out.push(std::mem::take(current));
        } else {
            current.closed = false;
        }
    };

    'outer: while i < bytes.len() {
        skip_ws(bytes, &mut i);
        if i >= bytes.len() {
            break;
        }
        let cmd = bytes[i];
        if !is_cmd(cmd) {
            log::warn!("unexpected byte {:?} in path data at {}", cmd as char, i);
            break;
        }
        i += 1;
        cmd_count += 1;
        if cmd_count > limits::MAX_PATH_COMMANDS || out.len() > limits::MAX_PATH_SUBPATHS {
            break;
        }
        let rel = cmd.is_ascii_lowercase();
        let base = |cur: Point, x: f64, y: f64| if rel { Point::new(cur.x + x, cur.y + y) } else { Point::new(x, y) };
        match cmd.to_ascii_uppercase() {
            b'M' => {
                let x = match parse_num(bytes, &mut i) {
                    Some(v) => v,
                    None => break,
                };
                let y = match parse_num(bytes, &mut i) {
                    Some(v) => v,
                    None => break,
                };
                flush(&mut current, &mut out);
                cur = base(cur, x, y);
                start_sub = cur;
                last_cubic_ctrl = None;
                last_quad_ctrl = None;
                // Extra pairs are implicit line-tos
                while more_args(bytes, &mut i) {
                    let x = num!();
                    let y = num!();
                    let p = base(cur, x, y);
                    current.curves.push(CubicBezier::line(cur, p));
                    cur = p;
                    segs += 1;
                }
            }
            b'L' => loop {
                let x = num!();
                let y = num!();
                let p = base(cur, x, y);
                current.curves.push(CubicBezier::line(cur, p));
                cur = p;
                segs += 1;
                last_cubic_ctrl = None;
                last_quad_ctrl = None;
                if !more_args(bytes, &mut i) {
                    break;
                }
            },
            b'H' => loop {
                let x = num!();
                let p = Point::new(if rel { cur.x + x } else { x }, cur.y);
                current.curves.push(CubicBezier::line(cur, p));
                cur = p;
                segs += 1;
                last_cubic_ctrl = None;
                last_quad_ctrl = None;
                if !more_args(bytes, &mut i) {
                    break;
                }
            },
            b'V' => loop {
                let y = num!();
                let p = Point::new(cur.x, if rel { cur.y + y } else { y });
                current.curves.push(CubicBezier::line(cur, p));
                cur = p;
                segs += 1;
                last_cubic_ctrl = None;
                last_quad_ctrl = None;
                if !more_args(bytes, &mut i) {
                    break;
                }
            },
            b'C' => loop {
                let (x1, y1, x2, y2, x, y) = (num!(), num!(), num!(), num!(), num!(), num!());
                let c1 = base(cur, x1, y1);
                let c2 = base(cur, x2, y2);
                let p = base(cur, x, y);
                current.curves.push(CubicBezier::new(cur, c1, c2, p));
                last_cubic_ctrl = Some(c2);
                last_quad_ctrl = None;
                cur = p;
                segs += 1;
                if !more_args(bytes, &mut i) {
                    break;
                }
            },
            b'S' => loop {
                let (x2, y2, x, y) = (num!(), num!(), num!(), num!());
                let c1 = match last_cubic_ctrl {
                    Some(c) => Point::new(2.0 * cur.x - c.x, 2.0 * cur.y - c.y),
                    None => cur,
                };
                let c2 = base(cur, x2, y2);
                let p = base(cur, x, y);
                current.curves.push(CubicBezier::new(cur, c1, c2, p));
                last_cubic_ctrl = Some(c2);
                last_quad_ctrl = None;
                cur = p;
                segs += 1;
                if !more_args(bytes, &mut i) {
                    break;
                }
            },
            b'Q' => loop {
                let (x1, y1, x, y) = (num!(), num!(), num!(), num!());
                let c = base(cur, x1, y1);
                let p = base(cur, x, y);
                current.curves.push(CubicBezier::from_quad(cur, c, p));
                last_quad_ctrl = Some(c);
                last_cubic_ctrl = None;
                cur = p;
                segs += 1;
                if !more_args(bytes, &mut i) {
                    break;
                }
            },
            b'T' => loop {
                let (x, y) = (num!(), num!());
                let c = match last_quad_ctrl {
                    Some(q) => Point::new(2.0 * cur.x - q.x, 2.0 * cur.y - q.y),
                    None => cur,
                };
                let p = base(cur, x, y);
                current.curves.push(CubicBezier::from_quad(cur, c, p));
                last_quad_ctrl = Some(c);
                last_cubic_ctrl = None;
                cur = p;
                segs += 1;
                if !more_args(bytes, &mut i) {
                    break;
                }
            },
            b'A' => loop {
                let rx = num!();
                let ry = num!();
                let rot = num!();
                let large = match parse_flag(bytes, &mut i) {
                    Some(f) => f,
                    None => break 'outer,
                };
                let sweep = match parse_flag(bytes, &mut i) {
                    Some(f) => f,
                    None => break 'outer,
                };
                let (x, y) = (num!(), num!());
                let p = base(cur, x, y);
                let arcs = arc_to_cubics(cur, rx, ry, rot, large, sweep, p);
                segs += arcs.len();
                current.curves.extend(arcs);
                last_cubic_ctrl = None;
                last_quad_ctrl = None;
                cur = p;
                if !more_args(bytes, &mut i) {
                    break;
                }
            },
            b'Z' => {
                if cur.distance(start_sub) > 0.0 {
                    current.curves.push(CubicBezier::line(cur, start_sub));
                    segs += 1;
                }
                current.closed = true;
                flush(&mut current, &mut out);
                cur = start_sub;
                last_cubic_ctrl = None;
                last_quad_ctrl = None;
            }
            _ => {}
        }
        if segs > limits::MAX_PATH_SEGMENTS {
            log::warn!("path data expands past {} segments; truncated", limits::MAX_PATH_SEGMENTS);
            break;
        }
    }
    flush(&mut current, &mut out);
    out
}

/// Number of node-producing commands (`M L C Q S T A`), at least 1. Used as
/// the cheap base node estimate for path elements.
pub fn count_node_commands(d: &str) -> usize {
    d.bytes()
        .filter(|c| matches!(c.to_ascii_uppercase(), b'M' | b'L' | b'C' | b'Q' | b'S' | b'T' | b'A'))
        .count()
        .max(1)
}

pub fn has_close_command(d: &str) -> bool {
    d.bytes().any(|c| c == b'z' || c == b'Z')
}

/// Endpoint-parameterised elliptical arc to cubics (SVG implementation notes, F.6).
pub fn arc_to_cubics(from: Point, rx: f64, ry: f64, x_rot_deg: f64, large: bool, sweep: bool, to: Point) -> Vec<CubicBezier> {
    let mut rx = rx.abs();
    let mut ry = ry.abs();
    if from.distance(to) == 0.0 {
        return Vec::new();
    }
    if rx == 0.0 || ry == 0.0 {
        return vec![CubicBezier::line(from, to)];
    }
    let phi = x_rot_deg.to_radians();
    let (sin_phi, cos_phi) = phi.sin_cos();
    let dx2 = (from.x - to.x) / 2.0;
    let dy2 = (from.y - to.y) / 2.0;
    let x1p = cos_phi * dx2 + sin_phi * dy2;
    let y1p = -sin_phi * dx2 + cos_phi * dy2;

    let lambda = (x1p * x1p) / (rx * rx) + (y1p * y1p) / (ry * ry);
    if lambda > 1.0 {
        let s = lambda.sqrt();
        rx *= s;
        ry *= s;
    }
    let rx2 = rx * rx;
    let ry2 = ry * ry;
    let num = rx2 * ry2 - rx2 * y1p * y1p - ry2 * x1p * x1p;
    let den = rx2 * y1p * y1p + ry2 * x1p * x1p;
    let mut coef = if den > 0.0 { (num / den).max(0.0).sqrt() } else { 0.0 };
    if large == sweep {
        coef = -coef;
    }
    let cxp = coef * rx * y1p / ry;
    let cyp = -coef * ry * x1p / rx;
    let cx = cos_phi * cxp - sin_phi * cyp + (from.x + to.x) / 2.0;
    let cy = sin_phi * cxp + cos_phi * cyp + (from.y + to.y) / 2.0;

    let angle = |ux: f64, uy: f64, vx: f64, vy: f64| (ux * vy - uy * vx).atan2(ux * vx + uy * vy);
    let ux = (x1p - cxp) / rx;
    let uy = (y1p - cyp) / ry;
    let vx = (-x1p - cxp) / rx;
    let vy = (-y1p - cyp) / ry;
    let theta1 = angle(1.0, 0.0, ux, uy);
    let mut delta = angle(ux, uy, vx, vy);
    if !sweep && delta > 0.0 {
        delta -= std::f64::consts::TAU;
    } else if sweep && delta < 0.0 {
        delta += std::f64::consts::TAU;
    }
    if !delta.is_finite() || !cx.is_finite() || !cy.is_finite() {
        return vec![CubicBezier::line(from, to)];
    }

    let pieces = (delta.abs() / std::f64::consts::FRAC_PI_2).ceil().max(1.0) as usize;
    let step = delta / pieces as f64;
    let k = 4.0 / 3.0 * (step / 4.0).tan();
    let map = |ex: f64, ey: f64| Point::new(cx + rx * ex * cos_phi - ry * ey * sin_phi, cy + rx * ex * sin_phi + ry * ey * cos_phi);
    let mut out = Vec::with_capacity(pieces);
    let mut t = theta1;
    let mut start = from;
    for n in 0..pieces {
        let t2 = t + step;
        let (s1, c1) = t.sin_cos();
        let (s2, c2) = t2.sin_cos();
        let cp1 = map(c1 - k * s1, s1 + k * c1);
        let cp2 = map(c2 + k * s2, s2 - k * c2);
        let end = if n + 1 == pieces { to } else { map(c2, s2) };
        out.push(CubicBezier::new(start, cp1, cp2, end));
        start = end;
        t = t2;
    }
    out
}
