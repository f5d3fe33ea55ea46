//! Arc-length measurement and sampling of source outlines.
//!
//! Each source shape exposes its outline as something that can report its
//! total length and the point at a given distance along it. Lines,
//! rectangles and circles answer in closed form; everything else (ellipses,
//! rounded rectangles, point lists and general path data) is flattened once
//! into a chord table that is searched by cumulative length.
//!
//! Starting points and directions follow what renderers report for the same
//! shapes: rectangles start at their top-left corner and circles at
//! `(cx + r, cy)`, both running clockwise on screen (y down).

use std::f64::consts::TAU;

use crate::geometry::cubic::CubicBezier;
use crate::geometry::flatten::flatten_cubic;
use crate::geometry::path_data::{arc_to_cubics, SubPath};
use crate::model::Point;

/// Chord tolerance used when tabulating curved outlines.
pub const TABLE_TOLERANCE: f64 = 0.05;
const ELLIPSE_STEPS: usize = 360;

pub trait Outline {
    fn length(&self) -> f64;
    /// Point at distance `s` from the start; `s` is clamped to `[0, length]`.
    fn point_at_length(&self, s: f64) -> Point;
}

pub struct LineOutline {
    pub a: Point,
    pub b: Point,
}

impl Outline for LineOutline {
    fn length(&self) -> f64 {
        self.a.distance(self.b)
    }

    fn point_at_length(&self, s: f64) -> Point {
        let len = self.length();
        if len <= 0.0 {
            return self.a;
        }
        self.a.lerp(self.b, (s / len).clamp(0.0, 1.0))
    }
}

pub struct RectOutline {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Outline for RectOutline {
    fn length(&self) -> f64 {
        2.0 * (self.width + self.height)
    }

    fn point_at_length(&self, s: f64) -> Point {
        let (w, h) = (self.width, self.height);
        let s = s.clamp(0.0, self.length());
        if s <= w {
            Point::new(self.x + s, self.y)
        } else if s <= w + h {
            Point::new(self.x + w, self.y + (s - w))
        } else if s <= 2.0 * w + h {
            Point::new(self.x + w - (s - w - h), self.y + h)
        } else {
            Point::new(self.x, self.y + h - (s - 2.0 * w - h))
        }
    }
}

pub struct CircleOutline {
    pub cx: f64,
    pub cy: f64,
    pub r: f64,
}

impl Outline for CircleOutline {
    fn length(&self) -> f64 {
        TAU * self.r
    }

    fn point_at_length(&self, s: f64) -> Point {
        if self.r <= 0.0 {
            return Point::new(self.cx, self.cy);
        }
        let theta = s.clamp(0.0, self.length()) / self.r;
        Point::new(self.cx + self.r * theta.cos(), self.cy + self.r * theta.sin())
    }
}

#[derive(Clone, Copy, Debug)]
struct Chord {
    a: Point,
    b: Point,
    start: f64,
    len: f64,
}

/// Numeric outline: a flattened chord table with cumulative lengths.
#[derive(Clone, Debug, Default)]
pub struct TabulatedOutline {
    chords: Vec<Chord>,
    total: f64,
}

impl TabulatedOutline {
    fn push_chord(&mut self, a: Point, b: Point) {
        let len = a.distance(b);
        if !len.is_finite() || len <= 0.0 {
            return;
        }
        self.chords.push(Chord { a, b, start: self.total, len });
        self.total += len;
    }

    /// Straight runs through `points`, closing back to the first when `closed`.
    pub fn from_points(points: &[Point], closed: bool) -> Self {
        let mut out = TabulatedOutline::default();
        for w in points.windows(2) {
            out.push_chord(w[0], w[1]);
        }
        if closed && points.len() >= 2 {
            out.push_chord(points[points.len() - 1], points[0]);
        }
        out
    }

    /// Flatten a chain of cubics; consecutive subpaths are measured end to end
    /// without a connecting chord.
    pub fn from_subpaths(subpaths: &[SubPath]) -> Self {
        let mut out = TabulatedOutline::default();
        let mut buf: Vec<(Point, f64)> = Vec::new();
        for sub in subpaths {
            for c in &sub.curves {
                buf.clear();
                flatten_cubic(&mut buf, c, TABLE_TOLERANCE);
                let mut prev = c.p0;
                for &(p, _) in &buf {
                    out.push_chord(prev, p);
                    prev = p;
                }
            }
        }
        out
    }

    pub fn from_curves(curves: Vec<CubicBezier>) -> Self {
        Self::from_subpaths(&[SubPath { curves, closed: true }])
    }

    /// Axis-aligned ellipse sampled from its parametric form.
    pub fn ellipse(cx: f64, cy: f64, rx: f64, ry: f64) -> Self {
        let points: Vec<Point> = (0..ELLIPSE_STEPS)
            .map(|i| {
                let theta = TAU * i as f64 / ELLIPSE_STEPS as f64;
                Point::new(cx + rx * theta.cos(), cy + ry * theta.sin())
            })
            .collect();
        Self::from_points(&points, true)
    }

    /// Rectangle with rounded corners, starting where the top edge leaves
    /// the top-left corner.
    pub fn rounded_rect(x: f64, y: f64, w: f64, h: f64, rx: f64, ry: f64) -> Self {
        let rx = rx.min(w / 2.0);
        let ry = ry.min(h / 2.0);
        let p = Point::new;
        let mut curves = Vec::new();
        curves.push(CubicBezier::line(p(x + rx, y), p(x + w - rx, y)));
        curves.extend(arc_to_cubics(p(x + w - rx, y), rx, ry, 0.0, false, true, p(x + w, y + ry)));
        curves.push(CubicBezier::line(p(x + w, y + ry), p(x + w, y + h - ry)));
        curves.extend(arc_to_cubics(p(x + w, y + h - ry), rx, ry, 0.0, false, true, p(x + w - rx, y + h)));
        curves.push(CubicBezier::line(p(x + w - rx, y + h), p(x + rx, y + h)));
        curves.extend(arc_to_cubics(p(x + rx, y + h), rx, ry, 0.0, false, true, p(x, y + h - ry)));
        curves.push(CubicBezier::line(p(x, y + h - ry), p(x, y + ry)));
        curves.extend(arc_to_cubics(p(x, y + ry), rx, ry, 0.0, false, true, p(x + rx, y)));
        Self::from_curves(curves)
    }
}

impl Outline for TabulatedOutline {
    fn length(&self) -> f64 {
        self.total
    }

    fn point_at_length(&self, s: f64) -> Point {
        let Some(first) = self.chords.first() else {
            return Point::ZERO;
        };
        if s <= 0.0 {
            return first.a;
        }
        // Last chord whose start is not past s
        let idx = self.chords.partition_point(|c| c.start <= s).saturating_sub(1);
        let c = self.chords[idx];
        let t = ((s - c.start) / c.len).clamp(0.0, 1.0);
        c.a.lerp(c.b, t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Point, b: Point) -> bool {
        a.distance(b) < 1e-6
    }

    #[test]
    fn rect_walks_clockwise_from_corner() {
        let r = RectOutline { x: 10.0, y: 20.0, width: 100.0, height: 50.0 };
        assert_eq!(r.length(), 300.0);
        assert!(close(r.point_at_length(0.0), Point::new(10.0, 20.0)));
        assert!(close(r.point_at_length(125.0), Point::new(110.0, 45.0)));
        assert!(close(r.point_at_length(200.0), Point::new(60.0, 70.0)));
        assert!(close(r.point_at_length(300.0), Point::new(10.0, 20.0)));
    }

    #[test]
    fn circle_starts_at_right_and_turns_down() {
        let c = CircleOutline { cx: 0.0, cy: 0.0, r: 10.0 };
        assert!(close(c.point_at_length(0.0), Point::new(10.0, 0.0)));
        let quarter = c.length() / 4.0;
        assert!(close(c.point_at_length(quarter), Point::new(0.0, 10.0)));
    }

    #[test]
    fn polyline_table_is_exact() {
        let pts = [Point::new(0.0, 0.0), Point::new(3.0, 4.0), Point::new(3.0, 10.0)];
        let t = TabulatedOutline::from_points(&pts, false);
        assert!((t.length() - 11.0).abs() < 1e-12);
        assert!(close(t.point_at_length(7.0), Point::new(3.0, 6.0)));
        assert!(close(t.point_at_length(99.0), Point::new(3.0, 10.0)));
    }

    #[test]
    fn ellipse_length_close_to_circle_when_round() {
        let e = TabulatedOutline::ellipse(0.0, 0.0, 50.0, 50.0);
        assert!((e.length() - TAU * 50.0).abs() < 0.1);
        assert!(close(e.point_at_length(0.0), Point::new(50.0, 0.0)));
    }

    #[test]
    fn rounded_rect_is_shorter_than_sharp() {
        let r = TabulatedOutline::rounded_rect(0.0, 0.0, 100.0, 50.0, 10.0, 10.0);
        let expected = 2.0 * (80.0 + 30.0) + TAU * 10.0;
        assert!((r.length() - expected).abs() < 0.1);
        assert!(close(r.point_at_length(0.0), Point::new(10.0, 0.0)));
    }
}
