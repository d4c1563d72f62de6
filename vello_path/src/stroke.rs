// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Expanding strokes into fillable outlines.
//!
//! Each sub-path is offset to both sides by half the stroke width. The right
//! side runs with the path and the left side against it, so that joining
//! them with caps (open sub-paths) or closing each (closed sub-paths) gives
//! outlines that fill correctly under the non-zero rule.

use core::borrow::Borrow;
use std::borrow::Cow;

use smallvec::SmallVec;

use crate::bezier::CubicBez;
use crate::ellipse::SvgArc;
use crate::flatten::{flatten_arc, flatten_cubic};
use crate::path::{Command, Path, Segment, Segments};
use crate::{Config, Point};

/// Shape drawn at the ends of open sub-paths.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Cap {
    /// Flat cap through the end point.
    Butt,
    /// Semicircle of radius half the stroke width.
    Round,
    /// Square extending half the stroke width beyond the end point.
    Square,
}

/// Join used by a miter join that exceeds its limit.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum GapJoin {
    Bevel,
    Round,
}

/// Connection between consecutive segments.
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum Join {
    /// A straight line across the gap.
    Bevel,
    /// An arc of radius half the stroke width around the vertex.
    Round,
    /// The offset edges extended to their intersection.
    ///
    /// `limit` bounds the ratio of the miter length to the stroke width;
    /// sharper corners use `fallback` instead.
    Miter { limit: f64, fallback: GapJoin },
    /// A miter cut off at `limit` times half the stroke width from the
    /// vertex.
    MiterClip { limit: f64 },
}

/// Collection of values representing lengths in a dash pattern.
pub type Dashes = SmallVec<[f64; 4]>;

/// Describes the visual style of a stroke.
#[derive(Clone, Debug, PartialEq)]
pub struct Stroke {
    /// Width of the stroke.
    pub width: f64,
    /// Style for the ends of open sub-paths.
    pub cap: Cap,
    /// Style for connecting segments.
    pub join: Join,
    /// Lengths of dashes in alternating on/off order.
    pub dash_pattern: Dashes,
    /// Offset of the first dash.
    pub dash_offset: f64,
}

impl Default for Stroke {
    fn default() -> Self {
        Self {
            width: 1.0,
            cap: Cap::Butt,
            join: Join::Miter {
                limit: 4.0,
                fallback: GapJoin::Bevel,
            },
            dash_pattern: Dashes::new(),
            dash_offset: 0.0,
        }
    }
}

impl Stroke {
    /// Creates a new stroke with the specified width.
    pub fn new(width: f64) -> Self {
        Self {
            width,
            ..Default::default()
        }
    }

    /// Builder method for setting the join style.
    pub fn with_join(mut self, join: Join) -> Self {
        self.join = join;
        self
    }

    /// Builder method for setting the cap style.
    pub fn with_caps(mut self, cap: Cap) -> Self {
        self.cap = cap;
        self
    }

    /// Builder method for setting the dashing parameters.
    pub fn with_dashes<P>(mut self, offset: f64, pattern: P) -> Self
    where
        P: IntoIterator,
        P::Item: Borrow<f64>,
    {
        self.dash_offset = offset;
        self.dash_pattern.clear();
        self.dash_pattern
            .extend(pattern.into_iter().map(|dash| *dash.borrow()));
        self
    }
}

#[derive(Clone, Copy, Debug)]
enum Shape {
    Line,
    Cubic(CubicBez),
    Arc(SvgArc),
}

/// A segment of non-zero length with its normals at both ends, of length
/// half the stroke width and pointing to the right.
#[derive(Clone, Copy, Debug)]
struct Piece {
    start: Point,
    end: Point,
    n0: Point,
    n1: Point,
    shape: Shape,
}

impl Piece {
    fn new(seg: &Segment, hw: f64, config: &Config) -> Option<Self> {
        let eps = config.epsilon;
        let (n0, n1, shape) = match seg.cmd {
            Command::MoveTo(_) => return None,
            Command::LineTo(_) | Command::Close => {
                if seg.start.is_near(seg.end, eps) {
                    return None;
                }
                let n = (seg.end - seg.start).rot90_cw().with_length(hw);
                (n, n, Shape::Line)
            }
            Command::QuadTo(..) | Command::CubicTo(..) => {
                let c = seg.as_cubic()?;
                if [c.p1, c.p2, c.p3].iter().all(|p| p.is_near(c.p0, eps)) {
                    return None;
                }
                (c.normal(0.0, hw), c.normal(1.0, hw), Shape::Cubic(c))
            }
            Command::ArcTo { .. } => {
                let arc = seg.as_arc()?;
                if seg.start.is_near(seg.end, eps) {
                    return None;
                }
                let e = arc.to_center();
                (e.normal(e.theta0, hw), e.normal(e.theta1, hw), Shape::Arc(arc))
            }
        };
        Some(Self {
            start: seg.start,
            end: seg.end,
            n0,
            n1,
            shape,
        })
    }
}

/// Intersection of the segments `a0 a1` and `b0 b1`, if they cross.
fn intersect_lines(a0: Point, a1: Point, b0: Point, b1: Point) -> Option<Point> {
    let da = a1 - a0;
    let db = b1 - b0;
    let denom = da.cross(db);
    if denom.abs() < 1e-12 * da.length() * db.length() {
        return None;
    }
    let s = (b0 - a0).cross(db) / denom;
    let u = (b0 - a0).cross(da) / denom;
    if (0.0..=1.0).contains(&s) && (0.0..=1.0).contains(&u) {
        Some(a0 + da * s)
    } else {
        None
    }
}

/// Longest run of flattened lines searched for the crossing of an inner join.
const CROSSING_SEARCH: usize = 32;

/// The straight line ending at command `i`, as `(i, from, to)`.
fn line_at(cmds: &[Command], i: usize) -> Option<(usize, Point, Point)> {
    match cmds[i] {
        Command::LineTo(to) => Some((i, cmds[i - 1].end()?, to)),
        _ => None,
    }
}

/// First crossing of one of the trailing lines of `tail` with one of the
/// leading lines of `head`, nearest to the join first. Returns the indices
/// of both lines and the crossing point.
///
/// With `same`, both slices are the same sub-path and the lines must not
/// touch.
fn find_crossing(tail: &[Command], head: &[Command], same: bool) -> Option<(usize, usize, Point)> {
    let tail_lines = (1..tail.len())
        .rev()
        .take(CROSSING_SEARCH)
        .map_while(|i| line_at(tail, i));
    for (i, a0, a1) in tail_lines {
        let head_lines = (1..head.len())
            .take(CROSSING_SEARCH)
            .map_while(|j| line_at(head, j));
        for (j, b0, b1) in head_lines {
            if same && i <= j + 1 {
                break;
            }
            if let Some(x) = intersect_lines(a0, a1, b0, b1) {
                return Some((i, j, x));
            }
        }
    }
    None
}

/// Copy of `path` with the arc at command `i` replaced by lines.
fn with_flat_arc(path: &Path, i: usize, config: &Config) -> Option<Path> {
    let cmds = path.commands();
    let Command::ArcTo {
        rx,
        ry,
        rotation,
        large_arc,
        sweep,
        end,
    } = *cmds.get(i)?
    else {
        return None;
    };
    let arc = SvgArc {
        start: cmds[i - 1].end()?,
        end,
        rx,
        ry,
        rotation,
        large_arc,
        sweep,
    };
    let mut flat = Path::new();
    flat.extend(&cmds[..i]);
    flatten_arc(&mut flat, &arc, 0.0, config);
    flat.extend(&cmds[i + 1..]);
    Some(flat)
}

/// Crossing of the end of `side` with the start of `next`, or with its own
/// start when there is no `next`.
fn side_crossing(side: &Path, next: Option<&Path>) -> Option<(usize, usize, Point)> {
    match next {
        Some(next) => find_crossing(side.commands(), next.commands(), false),
        None => find_crossing(side.commands(), side.commands(), true),
    }
}

struct Stroker<'a> {
    hw: f64,
    cap: Cap,
    join: Join,
    config: &'a Config,
}

impl Stroker<'_> {
    fn stroke_subpath(&self, segs: &[Segment], out: &mut Path) {
        let closed = matches!(segs.last(), Some(seg) if seg.cmd == Command::Close);
        let pieces: Vec<Piece> = segs
            .iter()
            .filter_map(|seg| Piece::new(seg, self.hw, self.config))
            .collect();
        let (Some(first), Some(last)) = (pieces.first(), pieces.last()) else {
            if segs.iter().any(Segment::is_drawing) {
                self.dot(segs[0].end, out);
            }
            return;
        };

        let mut rhs = self.offset(first, 1.0);
        let mut lhs = self.offset(first, -1.0);
        for pair in pieces.windows(2) {
            let next = (self.offset(&pair[1], 1.0), self.offset(&pair[1], -1.0));
            self.join(&mut rhs, &mut lhs, &pair[0], &pair[1], Some((&next.0, &next.1)));
        }

        if closed {
            self.join(&mut rhs, &mut lhs, last, first, None);
            rhs.close();
            lhs.close();
            out.append(&rhs);
            out.append(&lhs.reverse());
        } else {
            self.cap(&mut rhs, last.end, last.n1);
            // The end cap already led to the start of the reversed left side.
            for cmd in lhs.reverse().commands().iter().skip(1) {
                rhs.push(*cmd);
            }
            self.cap(&mut rhs, first.start, -first.n0);
            rhs.close();
            out.append(&rhs);
        }
    }

    /// Offsets a piece to the side `sign` (`1` right, `-1` left).
    fn offset(&self, piece: &Piece, sign: f64) -> Path {
        let mut side = Path::new();
        side.move_to(piece.start + piece.n0 * sign);
        let end = piece.end + piece.n1 * sign;
        match piece.shape {
            Shape::Line => {}
            Shape::Cubic(c) => flatten_cubic(&mut side, &c, self.hw * sign, self.config),
            Shape::Arc(arc) if arc.rx == arc.ry => {
                // Right of a counter-clockwise arc is outside.
                let grow = if arc.sweep { sign } else { -sign };
                let r = arc.rx + grow * self.hw;
                if r <= self.config.epsilon {
                    side.line_to(arc.to_center().center);
                } else {
                    side.arc_to(r, r, 0.0, arc.large_arc, arc.sweep, end);
                }
            }
            Shape::Arc(arc) => flatten_arc(&mut side, &arc, self.hw * sign, self.config),
        }
        side.line_to(end);
        side
    }

    /// Joins `prev` to `next` at their common point and continues both sides
    /// with `next_sides`, the right and left offsets of `next`.
    ///
    /// Without `next_sides` this is the join back to the first piece of a
    /// closed sub-path, where both sides end on their own start.
    fn join(
        &self,
        rhs: &mut Path,
        lhs: &mut Path,
        prev: &Piece,
        next: &Piece,
        next_sides: Option<(&Path, &Path)>,
    ) {
        let (rhs_next, lhs_next) = match next_sides {
            Some((r, l)) => (Some(r), Some(l)),
            None => (None, None),
        };
        let (n0, n1) = (prev.n1, next.n0);
        if n0.is_near(n1, self.config.epsilon) {
            for (side, next_side) in [(rhs, rhs_next), (lhs, lhs_next)] {
                if let Some(next_side) = next_side {
                    side.extend(&next_side.commands()[1..]);
                }
            }
            return;
        }
        let pivot = next.start;
        // Turning left puts the outside of the corner on the right.
        let ccw = n0.rot90_cw().dot(n1) < 0.0;
        let (outer, outer_next, inner, inner_next, sign) = if ccw {
            (rhs, rhs_next, lhs, lhs_next, 1.0)
        } else {
            (lhs, lhs_next, rhs, rhs_next, -1.0)
        };
        self.outer_join(outer, pivot, n0 * sign, n1 * sign, ccw);
        if let Some(next_side) = outer_next {
            outer.extend(&next_side.commands()[1..]);
        }
        self.inner_join(inner, pivot, pivot - n1 * sign, inner_next);
    }

    /// Draws the outside of a corner from `pivot + n0` to `pivot + n1`.
    fn outer_join(&self, side: &mut Path, pivot: Point, n0: Point, n1: Point, ccw: bool) {
        let hw = self.hw;
        let end = pivot + n1;
        let (limit, fallback) = match self.join {
            Join::Bevel => {
                side.line_to(end);
                return;
            }
            Join::Round => {
                side.arc_to(hw, hw, 0.0, false, ccw, end);
                return;
            }
            Join::Miter { limit, fallback } => (limit, Some(fallback)),
            Join::MiterClip { limit } => (limit, None),
        };

        // Cosine of half the turn of the normal.
        let cos_half = ((1.0 + n0.dot(n1) / (hw * hw)) / 2.0).max(0.0).sqrt();
        let bisector = (n0 + n1).normalize();
        if cos_half > self.config.epsilon && cos_half * limit >= 1.0 {
            side.line_to(pivot + bisector * (hw / cos_half));
            side.line_to(end);
            return;
        }
        match fallback {
            Some(GapJoin::Bevel) => side.line_to(end),
            Some(GapJoin::Round) => side.arc_to(hw, hw, 0.0, false, ccw, end),
            None => {
                // Walk along both offset edges up to the clip line.
                let t0 = n0.rot90_ccw().normalize();
                let t1 = n1.rot90_ccw().normalize();
                let reach = limit * hw - hw * cos_half;
                let (along0, along1) = (t0.dot(bisector), -t1.dot(bisector));
                if reach > 0.0 && along0 > self.config.epsilon && along1 > self.config.epsilon {
                    side.line_to(pivot + n0 + t0 * (reach / along0));
                    side.line_to(end - t1 * (reach / along1));
                }
                side.line_to(end);
            }
        }
    }

    /// Draws the inside of a corner ending at `end` and continues with
    /// `next`, the offset of the following piece on the same side. Without
    /// `next` the side closes onto its own start.
    ///
    /// Both offsets are cut where their lines cross, so the band is covered
    /// once and fills alike under both fill rules. Offsets that never cross
    /// pass through the pivot instead.
    fn inner_join(&self, side: &mut Path, pivot: Point, end: Point, next: Option<&Path>) {
        let mut next = next.map(Cow::Borrowed);
        let mut crossing = side_crossing(side, next.as_deref());
        if crossing.is_none() {
            // Circular arcs are only flattened where they meet at a corner.
            let mut flattened = false;
            if let Some(flat) = with_flat_arc(side, side.len() - 1, self.config) {
                *side = flat;
                flattened = true;
            }
            let head = match next.as_deref() {
                Some(next) => with_flat_arc(next, 1, self.config),
                None => with_flat_arc(side, 1, self.config),
            };
            if let Some(flat) = head {
                if next.is_some() {
                    next = Some(Cow::Owned(flat));
                } else {
                    *side = flat;
                }
                flattened = true;
            }
            if flattened {
                crossing = side_crossing(side, next.as_deref());
            }
        }
        match (crossing, next) {
            (Some((i, j, x)), Some(next)) => {
                side.truncate(i);
                side.line_to(x);
                side.extend(&next.commands()[j..]);
            }
            (Some((i, j, x)), None) => {
                side.truncate(i);
                side.line_to(x);
                side.trim_start(x, j);
            }
            (None, next) => {
                side.line_to(pivot);
                side.line_to(end);
                if let Some(next) = next {
                    side.extend(&next.commands()[1..]);
                }
            }
        }
    }

    /// Caps the end of a side at `pivot + n`, going round to `pivot - n`.
    fn cap(&self, side: &mut Path, pivot: Point, n: Point) {
        let end = pivot - n;
        match self.cap {
            Cap::Butt => side.line_to(end),
            Cap::Round => side.arc_to(self.hw, self.hw, 0.0, false, true, end),
            Cap::Square => {
                let e = n.rot90_ccw();
                side.line_to(pivot + e + n);
                side.line_to(pivot + e - n);
                side.line_to(end);
            }
        }
    }

    /// Outline of a sub-path without extent.
    fn dot(&self, p: Point, out: &mut Path) {
        let hw = self.hw;
        match self.cap {
            Cap::Butt => {}
            Cap::Round => {
                out.move_to(p + Point::new(hw, 0.0));
                out.arc_to(hw, hw, 0.0, false, true, p - Point::new(hw, 0.0));
                out.arc_to(hw, hw, 0.0, false, true, p + Point::new(hw, 0.0));
                out.close();
            }
            Cap::Square => {
                out.move_to(p + Point::new(-hw, -hw));
                out.line_to(p + Point::new(hw, -hw));
                out.line_to(p + Point::new(hw, hw));
                out.line_to(p + Point::new(-hw, hw));
                out.close();
            }
        }
    }
}

impl Path {
    /// Expands the stroke of the path into an outline to be filled with the
    /// non-zero rule.
    ///
    /// Dashing is applied first when the style has a dash pattern. Curves are
    /// offset within `config.tolerance`; circular arcs stay exact arcs.
    pub fn stroke(&self, style: &Stroke, config: &Config) -> Self {
        let mut out = Self::new();
        if style.width <= 0.0 || style.width.is_nan() {
            return out;
        }
        let dashed;
        let path = if style.dash_pattern.is_empty() {
            self
        } else {
            dashed = self.dash(style.dash_offset, &style.dash_pattern);
            &dashed
        };

        let stroker = Stroker {
            hw: style.width / 2.0,
            cap: style.cap,
            join: style.join,
            config,
        };
        for range in path.subpath_ranges() {
            let segs: Vec<Segment> = Segments::new(&path.commands()[range]).collect();
            stroker.stroke_subpath(&segs, &mut out);
        }
        out
    }
}
