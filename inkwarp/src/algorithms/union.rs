//! Boundary union of paths.
//!
//! The union itself sits behind [`BoundaryGeometry`] so the session only
//! deals in paths and contour nodes. [`PlanarUnion`] is the bundled
//! implementation:
//! 1. Flatten every cubic into chords that remember their source curve and
//!    parameter range
//! 2. Split every chord at its crossings with any other chord, including
//!    crossings within its own operand
//! 3. Keep a piece when exactly one of its sides is filled under the
//!    non-zero rule of either operand, turned so the filled side is on its left
//! 4. Link kept pieces head to tail into closed contours and drop holes
//! 5. Merge runs of pieces from one source curve back into a sub-curve

use std::collections::HashMap;
use std::f64::consts::TAU;

use crate::algorithms::winding::{point_in_nonzero, point_on_polygon_edge};
use crate::geometry::cubic::CubicBezier;
use crate::geometry::flatten::flatten_cubic;
use crate::geometry::math::{cross, dot, segment_intersection, signed_area};
use crate::geometry::tolerance::{quantize, EPS_AREA, EPS_PARAM, EPS_POS};
use crate::model::{Path, PathSet, Point, Segment};

/// One anchor of a contour with handles relative to it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContourNode {
    pub point: Point,
    pub handle_in: Point,
    pub handle_out: Point,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Contour {
    pub nodes: Vec<ContourNode>,
    pub closed: bool,
}

impl Contour {
    /// Segments between consecutive nodes, wrapping when closed.
    pub fn to_segments(&self) -> Vec<Segment> {
        let n = self.nodes.len();
        if n == 0 {
            return Vec::new();
        }
        let count = if self.closed { n } else { n - 1 };
        (0..count)
            .map(|i| {
                let cur = self.nodes[i];
                let next = self.nodes[(i + 1) % n];
                Segment::new(cur.point, cur.point.add(cur.handle_out), next.point.add(next.handle_in), next.point)
            })
            .collect()
    }
}

/// What a union backend must provide.
pub trait BoundaryGeometry {
    type Boundary;

    fn boundary(&self, path: &Path) -> Self::Boundary;
    fn unite(&self, a: &Self::Boundary, b: &Self::Boundary) -> Self::Boundary;
    fn contours(&self, boundary: &Self::Boundary) -> Vec<Contour>;
}

/// Unite every path into one boundary. Each resulting contour becomes a
/// closed path styled like the first input. Fewer than two paths, or a union
/// that yields nothing, returns the input unchanged.
pub fn unite_with<G: BoundaryGeometry>(geometry: &G, paths: &PathSet) -> PathSet {
    if paths.len() < 2 {
        return paths.clone();
    }
    let mut iter = paths.iter();
    let Some(first) = iter.next() else {
        return paths.clone();
    };
    let mut acc = geometry.boundary(first);
    for p in iter {
        let next = geometry.boundary(p);
        acc = geometry.unite(&acc, &next);
    }
    let contours = geometry.contours(&acc);
    if contours.is_empty() {
        log::warn!("union of {} paths produced no contours", paths.len());
        return paths.clone();
    }
    let united: Vec<Path> = contours
        .iter()
        .enumerate()
        .map(|(i, c)| Path {
            id: format!("unified-{i}"),
            segments: c.to_segments(),
            closed: c.closed,
            style: first.style.clone(),
            attributes: first.attributes.clone(),
        })
        .collect();
    log::debug!("united {} paths into {} contours", paths.len(), united.len());
    PathSet::new(united)
}

pub fn unite(paths: &PathSet) -> PathSet {
    unite_with(&PlanarUnion::default(), paths)
}

/// A filled region: closed loops of cubics, outer loops counter-clockwise
/// and holes clockwise (positive shoelace area = counter-clockwise).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Region {
    pub loops: Vec<Vec<CubicBezier>>,
}

#[derive(Clone, Copy, Debug)]
pub struct PlanarUnion {
    /// Chord tolerance for flattening.
    pub tolerance: f64,
}

impl Default for PlanarUnion {
    fn default() -> Self {
        PlanarUnion { tolerance: 0.05 }
    }
}

/// A chord of a flattened loop.
#[derive(Clone, Copy, Debug)]
struct FlatSegment {
    start: Point,
    end: Point,
    curve: usize,
    t_start: f64,
    t_end: f64,
}

/// A kept sub-chord, after splitting at crossings.
#[derive(Clone, Copy, Debug)]
struct Piece {
    start: Point,
    end: Point,
    curve: usize,
    t_start: f64,
    t_end: f64,
}

impl Piece {
    fn forward(&self) -> bool {
        self.t_end >= self.t_start
    }

    fn reversed(self) -> Piece {
        Piece { start: self.end, end: self.start, curve: self.curve, t_start: self.t_end, t_end: self.t_start }
    }
}

impl PlanarUnion {
    fn flatten_loop(&self, curves: &[CubicBezier], first_curve_id: usize) -> Vec<FlatSegment> {
        let mut out = Vec::new();
        let mut buf = Vec::new();
        for (k, c) in curves.iter().enumerate() {
            buf.clear();
            flatten_cubic(&mut buf, c, self.tolerance);
            let mut prev = (c.p0, 0.0);
            for &(p, t) in &buf {
                out.push(FlatSegment { start: prev.0, end: p, curve: first_curve_id + k, t_start: prev.1, t_end: t });
                prev = (p, t);
            }
        }
        out
    }

    fn polygon(flat: &[FlatSegment]) -> Vec<Point> {
        flat.iter().map(|s| s.start).collect()
    }
}

impl BoundaryGeometry for PlanarUnion {
    type Boundary = Region;

    fn boundary(&self, path: &Path) -> Region {
        let mut curves: Vec<CubicBezier> = path
            .segments
            .iter()
            .filter(|s| s.is_finite())
            .map(CubicBezier::from)
            .filter(|c| c.p0.distance(c.p3) > EPS_POS || c.p1.distance(c.p0) > EPS_POS || c.p2.distance(c.p3) > EPS_POS)
            .collect();
        let (Some(first), Some(last)) = (curves.first().copied(), curves.last().copied()) else {
            return Region::default();
        };
        // Open paths fill as if closed by a straight line
        if last.p3.distance(first.p0) > EPS_POS {
            curves.push(CubicBezier::line(last.p3, first.p0));
        }
        let flat = self.flatten_loop(&curves, 0);
        let area = signed_area(&Self::polygon(&flat));
        if area.abs() < EPS_AREA {
            return Region::default();
        }
        if area < 0.0 {
            curves = curves.iter().rev().map(CubicBezier::reversed).collect();
        }
        Region { loops: vec![curves] }
    }

    fn unite(&self, a: &Region, b: &Region) -> Region {
        if a.loops.is_empty() {
            return b.clone();
        }
        if b.loops.is_empty() {
            return a.clone();
        }

        let mut sources: Vec<CubicBezier> = Vec::new();
        let flatten = |region: &Region, sources: &mut Vec<CubicBezier>| -> Vec<Vec<FlatSegment>> {
            region
                .loops
                .iter()
                .map(|l| {
                    let id = sources.len();
                    sources.extend_from_slice(l);
                    self.flatten_loop(l, id)
                })
                .collect()
        };
        let flat_a = flatten(a, &mut sources);
        let flat_b = flatten(b, &mut sources);
        let polys_a: Vec<Vec<Point>> = flat_a.iter().map(|f| Self::polygon(f)).collect();
        let polys_b: Vec<Vec<Point>> = flat_b.iter().map(|f| Self::polygon(f)).collect();

        // Chords of a first, then b; each operand is also split at its own crossings
        let segs: Vec<FlatSegment> = flat_a.into_iter().chain(flat_b).flatten().collect();
        let count_a: usize = polys_a.iter().map(Vec::len).sum();
        let splits = find_splits(&segs);

        let scale = bbox_diagonal(polys_a.iter().chain(polys_b.iter()).flatten());
        let nudge = (scale * 1e-5).max(1e-6);
        let on_edge_tol = nudge;
        let inside = |q: Point| point_in_nonzero(q, &polys_a) || point_in_nonzero(q, &polys_b);

        let mut kept: Vec<Piece> = Vec::new();
        for (k, (seg, cuts)) in segs.iter().zip(&splits).enumerate() {
            for piece in split_segment(seg, cuts) {
                // Edges shared with the first operand are contributed by it
                if k >= count_a {
                    let mid = piece.start.lerp(piece.end, 0.5);
                    if polys_a.iter().any(|p| point_on_polygon_edge(mid, p, on_edge_tol)) {
                        continue;
                    }
                }
                if let Some(p) = orient_boundary(piece, nudge, &inside) {
                    kept.push(p);
                }
            }
        }

        let min_area = EPS_AREA.max(scale * scale * 1e-9);
        let loops: Vec<Vec<CubicBezier>> = chain_pieces(&kept)
            .into_iter()
            .map(|chain| rebuild_curves(&chain, &sources))
            .filter(|curves| {
                // Holes would be filled as paths of their own, so only outer loops stay
                let flat = self.flatten_loop(curves, 0);
                signed_area(&Self::polygon(&flat)) >= min_area
            })
            .collect();
        log::debug!("planar union: {} pieces kept, {} loops", kept.len(), loops.len());
        Region { loops }
    }

    fn contours(&self, boundary: &Region) -> Vec<Contour> {
        boundary
            .loops
            .iter()
            .filter(|l| !l.is_empty())
            .map(|l| {
                let n = l.len();
                let nodes = (0..n)
                    .map(|i| {
                        let c = l[i];
                        let prev = l[(i + n - 1) % n];
                        ContourNode { point: c.p0, handle_in: prev.p2.sub(c.p0), handle_out: c.p1.sub(c.p0) }
                    })
                    .collect();
                Contour { nodes, closed: true }
            })
            .collect()
    }
}

fn bbox_diagonal<'a>(points: impl Iterator<Item = &'a Point>) -> f64 {
    let mut min = Point::new(f64::INFINITY, f64::INFINITY);
    let mut max = Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
    for p in points {
        min = Point::new(min.x.min(p.x), min.y.min(p.y));
        max = Point::new(max.x.max(p.x), max.y.max(p.y));
    }
    let d = min.distance(max);
    if d.is_finite() {
        d
    } else {
        0.0
    }
}

/// Crossing parameters and points for every chord, against every other
/// chord of either operand.
fn find_splits(segs: &[FlatSegment]) -> Vec<Vec<(f64, Point)>> {
    let mut splits = vec![Vec::new(); segs.len()];

    let all = segs.iter().flat_map(|s| [s.start, s.end]);
    let (mut lo, mut hi) = (Point::new(f64::INFINITY, f64::INFINITY), Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY));
    for p in all {
        lo = Point::new(lo.x.min(p.x), lo.y.min(p.y));
        hi = Point::new(hi.x.max(p.x), hi.y.max(p.y));
    }
    let extent = (hi.x - lo.x).max(hi.y - lo.y);
    if !extent.is_finite() || extent <= 0.0 {
        return splits;
    }
    // Uniform grid over all chords
    let cells = ((segs.len() as f64).sqrt().ceil() as usize).clamp(1, 256);
    let cell = extent / cells as f64;
    let cell_of = |v: f64, origin: f64| (((v - origin) / cell).floor() as i64).clamp(0, cells as i64);
    let range = |s: &FlatSegment| {
        (
            cell_of(s.start.x.min(s.end.x), lo.x),
            cell_of(s.start.x.max(s.end.x), lo.x),
            cell_of(s.start.y.min(s.end.y), lo.y),
            cell_of(s.start.y.max(s.end.y), lo.y),
        )
    };
    let mut grid: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
    for (j, s) in segs.iter().enumerate() {
        let (x0, x1, y0, y1) = range(s);
        for cx in x0..=x1 {
            for cy in y0..=y1 {
                grid.entry((cx, cy)).or_default().push(j);
            }
        }
    }

    let mut seen: Vec<usize> = Vec::new();
    for (i, sa) in segs.iter().enumerate() {
        let (x0, x1, y0, y1) = range(sa);
        seen.clear();
        for cx in x0..=x1 {
            for cy in y0..=y1 {
                let Some(list) = grid.get(&(cx, cy)) else { continue };
                for &j in list {
                    // Each pair once
                    if j <= i || seen.contains(&j) {
                        continue;
                    }
                    seen.push(j);
                    let sb = &segs[j];
                    if let Some((t, u)) = segment_intersection(sa.start, sa.end, sb.start, sb.end) {
                        let p = sa.start.lerp(sa.end, t);
                        splits[i].push((t, p));
                        splits[j].push((u, p));
                    }
                }
            }
        }
    }
    splits
}

/// Cut a chord at its crossing points into pieces, dropping slivers.
fn split_segment(seg: &FlatSegment, splits: &[(f64, Point)]) -> Vec<Piece> {
    let mut cuts: Vec<(f64, Point)> = splits
        .iter()
        .copied()
        .filter(|(t, _)| *t > EPS_PARAM && *t < 1.0 - EPS_PARAM)
        .collect();
    cuts.sort_by(|x, y| x.0.total_cmp(&y.0));
    let mut out = Vec::with_capacity(cuts.len() + 1);
    let mut prev = (0.0, seg.start);
    for (s, p) in cuts.into_iter().chain(std::iter::once((1.0, seg.end))) {
        if p.distance(prev.1) > EPS_POS {
            let t_at = |s: f64| seg.t_start + s * (seg.t_end - seg.t_start);
            out.push(Piece { start: prev.1, end: p, curve: seg.curve, t_start: t_at(prev.0), t_end: t_at(s) });
            prev = (s, p);
        }
    }
    out
}

/// A piece lies on the boundary of the united region when exactly one of its
/// sides is filled. Boundary pieces come back with the filled side on their
/// left, reversed if needed.
fn orient_boundary(piece: Piece, nudge: f64, inside: impl Fn(Point) -> bool) -> Option<Piece> {
    let d = piece.end.sub(piece.start);
    let len = d.length();
    if len <= 0.0 {
        return None;
    }
    let mid = piece.start.lerp(piece.end, 0.5);
    let left = Point::new(-d.y / len, d.x / len).scale(nudge);
    match (inside(mid.add(left)), inside(mid.sub(left))) {
        (true, false) => Some(piece),
        (false, true) => Some(piece.reversed()),
        _ => None,
    }
}

/// Counter-clockwise turn from the way back along `incoming` to `outgoing`,
/// in (0, 2π].
fn turn(incoming: &Piece, outgoing: &Piece) -> f64 {
    let back = incoming.start.sub(incoming.end);
    let d = outgoing.end.sub(outgoing.start);
    let a = cross(back, d).atan2(dot(back, d));
    if a <= 0.0 {
        a + TAU
    } else {
        a
    }
}

/// Link pieces head to tail. Where several pieces leave one point the
/// smallest counter-clockwise turn wins, so regions touching at a point stay
/// in one contour. Chains that never return to their start are dropped.
fn chain_pieces(pieces: &[Piece]) -> Vec<Vec<Piece>> {
    let mut by_start: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
    for (i, p) in pieces.iter().enumerate() {
        by_start.entry(quantize(p.start)).or_default().push(i);
    }
    let mut used = vec![false; pieces.len()];
    let mut chains = Vec::new();
    let snap = EPS_POS * 1000.0;

    // Seeds at branch points would close their chain after the first lobe
    let mut seeds: Vec<usize> = (0..pieces.len()).collect();
    seeds.sort_by_key(|&i| by_start.get(&quantize(pieces[i].start)).map_or(0, Vec::len));

    for seed in seeds {
        if used[seed] {
            continue;
        }
        used[seed] = true;
        let origin = pieces[seed].start;
        let mut chain = vec![pieces[seed]];
        let mut closed = false;
        loop {
            let last = chain[chain.len() - 1];
            let tail = last.end;
            if chain.len() > 1 && tail.distance(origin) <= snap {
                closed = true;
                break;
            }
            let best = |candidates: &mut dyn Iterator<Item = usize>| {
                candidates.min_by(|&x, &y| turn(&last, &pieces[x]).total_cmp(&turn(&last, &pieces[y])))
            };
            let next = by_start
                .get(&quantize(tail))
                .and_then(|list| best(&mut list.iter().copied().filter(|&i| !used[i])))
                .or_else(|| best(&mut (0..pieces.len()).filter(|&i| !used[i] && pieces[i].start.distance(tail) <= snap)));
            match next {
                Some(i) => {
                    used[i] = true;
                    chain.push(pieces[i]);
                }
                None => {
                    closed = chain.len() > 1 && tail.distance(origin) <= snap;
                    break;
                }
            }
        }
        if closed && chain.len() >= 2 {
            chains.push(chain);
        } else {
            log::debug!("dropping open chain of {} pieces", chain.len());
        }
    }
    chains
}

/// True when `b` continues `a` along the same source curve, in the same
/// direction.
fn continues(a: &Piece, b: &Piece) -> bool {
    a.curve == b.curve && a.forward() == b.forward() && (a.t_end - b.t_start).abs() <= 1e-6
}

/// Turn a closed chain of pieces into cubics, one per run of pieces taken
/// from a single source curve.
fn rebuild_curves(chain: &[Piece], sources: &[CubicBezier]) -> Vec<CubicBezier> {
    let n = chain.len();
    // Start at a run boundary so no run wraps around the chain start
    let start = (0..n).find(|&i| !continues(&chain[(i + n - 1) % n], &chain[i])).unwrap_or(0);
    let mut out = Vec::new();
    let mut i = 0;
    while i < n {
        let first = chain[(start + i) % n];
        let mut last = first;
        let mut j = i + 1;
        while j < n && continues(&last, &chain[(start + j) % n]) {
            last = chain[(start + j) % n];
            j += 1;
        }
        let Some(src) = sources.get(first.curve) else {
            i = j;
            continue;
        };
        let mut c = if first.forward() {
            src.subcurve(first.t_start, last.t_end)
        } else {
            src.subcurve(last.t_end, first.t_start).reversed()
        };
        // Pin the ends to the chain so consecutive curves meet exactly
        let d0 = first.start.sub(c.p0);
        let d3 = last.end.sub(c.p3);
        c = CubicBezier::new(first.start, c.p1.add(d0), c.p2.add(d3), last.end);
        out.push(c);
        i = j;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Style;

    fn square(id: &str, x: f64, y: f64, s: f64) -> Path {
        let pts = [Point::new(x, y), Point::new(x + s, y), Point::new(x + s, y + s), Point::new(x, y + s)];
        let segs = (0..4).map(|i| CubicBezier::line(pts[i], pts[(i + 1) % 4]).to_segment()).collect();
        Path::new(id, segs, true, Style::default())
    }

    fn area(p: &Path) -> f64 {
        let pts: Vec<Point> = p.segments.iter().map(|s| s.p1).collect();
        signed_area(&pts).abs()
    }

    #[test]
    fn contour_nodes_to_segments() {
        let c = Contour {
            nodes: vec![
                ContourNode { point: Point::new(0.0, 0.0), handle_in: Point::new(0.0, -1.0), handle_out: Point::new(1.0, 0.0) },
                ContourNode { point: Point::new(10.0, 0.0), handle_in: Point::new(-1.0, 0.0), handle_out: Point::new(0.0, 1.0) },
            ],
            closed: true,
        };
        let segs = c.to_segments();
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[0].cp1, Point::new(1.0, 0.0));
        assert_eq!(segs[0].cp2, Point::new(9.0, 0.0));
        assert_eq!(segs[1].cp2, Point::new(0.0, -1.0));
    }

    #[test]
    fn overlapping_squares_merge() {
        let set = PathSet::new(vec![square("a", 0.0, 0.0, 10.0), square("b", 5.0, 5.0, 10.0)]);
        let out = unite(&set);
        assert_eq!(out.len(), 1);
        let p = &out.paths[0];
        assert_eq!(p.id, "unified-0");
        assert!(p.closed);
        assert!((area(p) - 175.0).abs() < 1e-6);
    }

    #[test]
    fn disjoint_squares_stay_separate() {
        let set = PathSet::new(vec![square("a", 0.0, 0.0, 10.0), square("b", 20.0, 0.0, 10.0)]);
        let out = unite(&set);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|p| (area(p) - 100.0).abs() < 1e-6));
    }

    #[test]
    fn contained_square_disappears() {
        let set = PathSet::new(vec![square("a", 0.0, 0.0, 10.0), square("b", 2.0, 2.0, 3.0)]);
        let out = unite(&set);
        assert_eq!(out.len(), 1);
        assert!((area(&out.paths[0]) - 100.0).abs() < 1e-6);
    }

    #[test]
    fn twisted_lobe_is_filled_and_joined_at_its_crossing() {
        // The top edge crosses itself at (10, 23), leaving a clockwise lobe above it
        let pts = [(0.0, 0.0), (20.0, 0.0), (20.0, 20.0), (14.0, 20.0), (6.0, 26.0), (14.0, 26.0), (6.0, 20.0), (0.0, 20.0)]
            .map(|(x, y)| Point::new(x, y));
        let segs = (0..pts.len()).map(|i| CubicBezier::line(pts[i], pts[(i + 1) % pts.len()]).to_segment()).collect();
        let twisted = Path::new("a", segs, true, Style::default());
        let set = PathSet::new(vec![twisted, square("b", 100.0, 0.0, 10.0)]);
        let out = unite(&set);
        assert_eq!(out.len(), 2);
        let mut areas: Vec<f64> = out.iter().map(area).collect();
        areas.sort_by(f64::total_cmp);
        assert!((areas[0] - 100.0).abs() < 1e-6);
        assert!((areas[1] - 424.0).abs() < 1e-6, "{areas:?}");
    }

    #[test]
    fn pieces_turn_to_keep_the_fill_on_their_left() {
        let inside = |q: Point| q.y > 0.0;
        let piece = Piece { start: Point::new(0.0, 0.0), end: Point::new(-4.0, 0.0), curve: 3, t_start: 0.2, t_end: 0.6 };
        let kept = orient_boundary(piece, 1e-3, inside).unwrap();
        assert_eq!(kept.start, Point::new(-4.0, 0.0));
        assert_eq!((kept.t_start, kept.t_end), (0.6, 0.2));
        assert!(!kept.forward());
        assert!(orient_boundary(piece, 1e-3, |_| true).is_none());
    }

    #[test]
    fn single_path_is_untouched() {
        let set = PathSet::new(vec![square("a", 0.0, 0.0, 10.0)]);
        assert_eq!(unite(&set), set);
    }
}
