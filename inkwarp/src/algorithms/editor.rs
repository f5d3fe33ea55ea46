//! Interactive bezier editing: anchor and handle drags, handle mirroring,
//! display tension and decimation.
//!
//! Handles are stored at tension 1. The editor shows them scaled about their
//! anchors by the current tension and maps dragged handle positions back
//! through the inverse before storing them.

use serde::{Deserialize, Serialize};

use crate::algorithms::displacement::round_half_up;
use crate::geometry::limits::{DENSITY_MAX, DENSITY_MIN, MIN_DECIMATED_SEGMENTS, TENSION_MAX, TENSION_MIN};
use crate::model::{Path, PathSet, Point, Segment};

/// Which control point of a segment a gesture grabbed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleKind {
    P1,
    P2,
    Cp1,
    Cp2,
}

impl HandleKind {
    pub fn is_anchor(self) -> bool {
        matches!(self, HandleKind::P1 | HandleKind::P2)
    }
}

/// How the paired handle at a shared anchor follows a dragged handle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MirrorMode {
    #[default]
    Disconnected,
    /// Opposite direction, own length kept.
    MirrorAngle,
    /// Opposite direction, length copied from the dragged handle.
    MirrorAngleLength,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    pub tension: f64,
    pub mirror: MirrorMode,
    pub link_handles: bool,
}

impl Default for EditorSettings {
    fn default() -> Self {
        EditorSettings { tension: 1.0, mirror: MirrorMode::Disconnected, link_handles: false }
    }
}

impl EditorSettings {
    pub fn sanitized(&self) -> EditorSettings {
        let tension = if self.tension.is_finite() { self.tension.clamp(TENSION_MIN, TENSION_MAX) } else { 1.0 };
        EditorSettings { tension, ..*self }
    }

    /// Tension used to invert dragged handles; never below the minimum.
    pub fn safe_tension(&self) -> f64 {
        if self.tension.is_finite() {
            self.tension.max(TENSION_MIN)
        } else {
            1.0
        }
    }
}

pub fn apply_tension(seg: &Segment, tension: f64) -> Segment {
    Segment {
        p1: seg.p1,
        cp1: seg.p1.add(seg.cp1.sub(seg.p1).scale(tension)),
        cp2: seg.p2.add(seg.cp2.sub(seg.p2).scale(tension)),
        p2: seg.p2,
    }
}

/// Map a displayed handle position back to stored (tension 1) space.
pub fn invert_tension(point: Point, anchor: Point, tension: f64) -> Point {
    anchor.add(point.sub(anchor).scale(1.0 / tension))
}

/// The path as displayed at `tension`.
pub fn display_path(path: &Path, tension: f64) -> Path {
    Path { segments: path.segments.iter().map(|s| apply_tension(s, tension)).collect(), ..path.clone() }
}

pub fn display_paths(paths: &PathSet, tension: f64) -> PathSet {
    PathSet::new(paths.iter().map(|p| display_path(p, tension)).collect())
}

/// Move an anchor of segment `seg` to `target`, carrying its handle and the
/// coincident anchor of the neighbouring segment.
pub fn move_anchor(path: &mut Path, seg: usize, which: HandleKind, target: Point) -> bool {
    if !target.is_finite() || seg >= path.segments.len() {
        return false;
    }
    match which {
        HandleKind::P1 => {
            let s = &mut path.segments[seg];
            let d = target.sub(s.p1);
            s.p1 = target;
            s.cp1 = s.cp1.add(d);
            if let Some(prev) = path.prev_index(seg) {
                let p = &mut path.segments[prev];
                p.p2 = target;
                p.cp2 = p.cp2.add(d);
            }
            true
        }
        HandleKind::P2 => {
            let s = &mut path.segments[seg];
            let d = target.sub(s.p2);
            s.p2 = target;
            s.cp2 = s.cp2.add(d);
            if let Some(next) = path.next_index(seg) {
                let n = &mut path.segments[next];
                n.p1 = target;
                n.cp1 = n.cp1.add(d);
            }
            true
        }
        HandleKind::Cp1 | HandleKind::Cp2 => false,
    }
}

/// Opposite handle for `moved` around `anchor`. A zero-length moved handle
/// collapses the opposite handle onto the anchor.
pub fn mirror_handle(moved: Point, opposite: Point, anchor: Point, mode: MirrorMode) -> Point {
    let v = moved.sub(anchor);
    let len = v.length();
    let len = if len > 0.0 { len } else { 1.0 };
    let unit = v.scale(1.0 / len);
    let mirror_len = match mode {
        MirrorMode::Disconnected => return opposite,
        MirrorMode::MirrorAngle => opposite.distance(anchor),
        MirrorMode::MirrorAngleLength => len,
    };
    anchor.sub(unit.scale(mirror_len))
}

/// Move handle `which` of segment `seg` to the displayed position `target`.
///
/// `pointer_delta` is the pointer motion since the previous drag event,
/// applied to every other segment's same-kind handle when handles are linked.
pub fn move_handle(
    path: &mut Path,
    seg: usize,
    which: HandleKind,
    target: Point,
    settings: &EditorSettings,
    pointer_delta: Point,
) -> bool {
    if !target.is_finite() || !pointer_delta.is_finite() || seg >= path.segments.len() {
        return false;
    }
    let tension = settings.safe_tension();
    match which {
        HandleKind::Cp1 => {
            let anchor = path.segments[seg].p1;
            let base = invert_tension(target, anchor, tension);
            path.segments[seg].cp1 = base;
            if settings.mirror != MirrorMode::Disconnected {
                if let Some(prev) = path.prev_index(seg) {
                    let opp = path.segments[prev].cp2;
                    path.segments[prev].cp2 = mirror_handle(base, opp, anchor, settings.mirror);
                }
            }
        }
        HandleKind::Cp2 => {
            let anchor = path.segments[seg].p2;
            let base = invert_tension(target, anchor, tension);
            path.segments[seg].cp2 = base;
            if settings.mirror != MirrorMode::Disconnected {
                if let Some(next) = path.next_index(seg) {
                    let opp = path.segments[next].cp1;
                    path.segments[next].cp1 = mirror_handle(base, opp, anchor, settings.mirror);
                }
            }
        }
        HandleKind::P1 | HandleKind::P2 => return false,
    }
    if settings.link_handles {
        for (i, s) in path.segments.iter_mut().enumerate() {
            if i == seg {
                continue;
            }
            match which {
                HandleKind::Cp1 => s.cp1 = s.cp1.add(pointer_delta),
                _ => s.cp2 = s.cp2.add(pointer_delta),
            }
        }
    }
    true
}

/// Dispatch a drag of any control point.
pub fn drag_to(
    path: &mut Path,
    seg: usize,
    which: HandleKind,
    target: Point,
    settings: &EditorSettings,
    pointer_delta: Point,
) -> bool {
    if which.is_anchor() {
        move_anchor(path, seg, which, target)
    } else {
        move_handle(path, seg, which, target, settings, pointer_delta)
    }
}

/// Keep every `round(100 / density)`-th segment of each path. Paths that
/// would drop below the minimum keep all their segments.
pub fn decimate(source: &PathSet, density: f64) -> PathSet {
    let density = if density.is_finite() { density.clamp(DENSITY_MIN, DENSITY_MAX) } else { DENSITY_MAX };
    let step = (round_half_up(100.0 / density) as usize).max(1);
    let paths = source
        .iter()
        .map(|p| {
            let kept: Vec<Segment> = p.segments.iter().step_by(step).copied().collect();
            let segments = if kept.len() >= MIN_DECIMATED_SEGMENTS { kept } else { p.segments.clone() };
            Path { segments, ..p.clone() }
        })
        .collect();
    PathSet::new(paths)
}
