// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The path command stream.

use core::f64::consts::PI;
use core::ops::Range;

use log::warn;
use peniko::Fill;

use crate::bezier::{CubicBez, QuadBez};
use crate::ellipse::{EllipseArc, SvgArc};
use crate::{Config, Point, Rect, Transform};

/// A single path command. Coordinates are absolute.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    /// Starts a new sub-path.
    MoveTo(Point),
    LineTo(Point),
    /// Quadratic Bézier with a control point and an end point.
    QuadTo(Point, Point),
    /// Cubic Bézier with two control points and an end point.
    CubicTo(Point, Point, Point),
    /// Elliptical arc in SVG endpoint form. The rotation is in radians.
    ArcTo {
        rx: f64,
        ry: f64,
        rotation: f64,
        large_arc: bool,
        sweep: bool,
        end: Point,
    },
    /// Closes the sub-path with a straight line back to its start.
    Close,
}

impl Command {
    /// The end point of the command; `None` for [`Command::Close`], whose end
    /// depends on the sub-path.
    pub fn end(&self) -> Option<Point> {
        match *self {
            Self::MoveTo(p) | Self::LineTo(p) | Self::QuadTo(_, p) | Self::CubicTo(_, _, p) => {
                Some(p)
            }
            Self::ArcTo { end, .. } => Some(end),
            Self::Close => None,
        }
    }

    fn is_finite(&self) -> bool {
        match *self {
            Self::MoveTo(p) | Self::LineTo(p) => p.is_finite(),
            Self::QuadTo(c, p) => c.is_finite() && p.is_finite(),
            Self::CubicTo(c1, c2, p) => c1.is_finite() && c2.is_finite() && p.is_finite(),
            Self::ArcTo {
                rx,
                ry,
                rotation,
                end,
                ..
            } => rx.is_finite() && ry.is_finite() && rotation.is_finite() && end.is_finite(),
            Self::Close => true,
        }
    }
}

/// A command together with the points it runs between.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
    pub cmd: Command,
}

impl Segment {
    /// Whether the segment draws geometry, that is, it is not a move.
    pub fn is_drawing(&self) -> bool {
        !matches!(self.cmd, Command::MoveTo(_))
    }

    pub fn as_quad(&self) -> Option<QuadBez> {
        match self.cmd {
            Command::QuadTo(c, _) => Some(QuadBez::new(self.start, c, self.end)),
            _ => None,
        }
    }

    /// The segment as a cubic Bézier; quadratics are raised exactly.
    pub fn as_cubic(&self) -> Option<CubicBez> {
        match self.cmd {
            Command::QuadTo(..) => self.as_quad().map(CubicBez::from),
            Command::CubicTo(c1, c2, _) => Some(CubicBez::new(self.start, c1, c2, self.end)),
            _ => None,
        }
    }

    pub fn as_arc(&self) -> Option<SvgArc> {
        match self.cmd {
            Command::ArcTo {
                rx,
                ry,
                rotation,
                large_arc,
                sweep,
                ..
            } => Some(SvgArc {
                start: self.start,
                end: self.end,
                rx,
                ry,
                rotation,
                large_arc,
                sweep,
            }),
            _ => None,
        }
    }

    /// Arc length of the segment. Moves have zero length.
    pub fn length(&self) -> f64 {
        match self.cmd {
            Command::MoveTo(_) => 0.0,
            Command::LineTo(_) | Command::Close => self.start.distance(self.end),
            Command::QuadTo(..) => self.as_quad().map_or(0.0, |q| q.length()),
            Command::CubicTo(..) => self.as_cubic().map_or(0.0, |c| c.length()),
            Command::ArcTo { .. } => self.as_arc().map_or(0.0, |a| a.to_center().length()),
        }
    }

    /// Tight bounds of the drawn segment, or of the target point for moves.
    pub fn bounds(&self) -> Rect {
        match self.cmd {
            Command::MoveTo(p) => Rect::from_points(p, p),
            Command::LineTo(_) | Command::Close => Rect::from_points(self.start, self.end),
            Command::QuadTo(..) => self
                .as_quad()
                .map_or_else(|| Rect::from_points(self.start, self.end), |q| q.bounds()),
            Command::CubicTo(..) => self
                .as_cubic()
                .map_or_else(|| Rect::from_points(self.start, self.end), |c| c.bounds()),
            Command::ArcTo { .. } => self.as_arc().map_or_else(
                || Rect::from_points(self.start, self.end),
                |a| a.to_center().bounds(),
            ),
        }
    }

    /// The same segment traversed backwards.
    pub fn reversed(&self) -> Command {
        match self.cmd {
            Command::MoveTo(_) => Command::MoveTo(self.start),
            Command::LineTo(_) | Command::Close => Command::LineTo(self.start),
            Command::QuadTo(c, _) => Command::QuadTo(c, self.start),
            Command::CubicTo(c1, c2, _) => Command::CubicTo(c2, c1, self.start),
            Command::ArcTo {
                rx,
                ry,
                rotation,
                large_arc,
                sweep,
                ..
            } => Command::ArcTo {
                rx,
                ry,
                rotation,
                large_arc,
                sweep: !sweep,
                end: self.start,
            },
        }
    }
}

/// Iterator over the [`Segment`]s of a path, in order.
#[derive(Clone, Debug)]
pub struct Segments<'a> {
    cmds: core::slice::Iter<'a, Command>,
    start: Point,
    current: Point,
}

impl<'a> Segments<'a> {
    pub(crate) fn new(cmds: &'a [Command]) -> Self {
        Self {
            cmds: cmds.iter(),
            start: Point::ZERO,
            current: Point::ZERO,
        }
    }
}

impl Iterator for Segments<'_> {
    type Item = Segment;

    fn next(&mut self) -> Option<Segment> {
        let cmd = *self.cmds.next()?;
        let start = self.current;
        let end = match cmd {
            Command::MoveTo(p) => {
                self.start = p;
                p
            }
            Command::Close => self.start,
            _ => cmd.end().unwrap_or(start),
        };
        self.current = end;
        Some(Segment { start, end, cmd })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.cmds.size_hint()
    }
}

/// A path made of sub-paths of lines, Béziers and elliptical arcs.
///
/// The builder methods keep the command stream normalized: every sub-path
/// begins with a move, degenerate curves are stored as lines and a closing
/// line to the start point is folded into the close.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Path {
    cmds: Vec<Command>,
    /// Start of the current sub-path.
    start: Point,
    /// Current point.
    current: Point,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[Command] {
        &self.cmds
    }

    pub fn len(&self) -> usize {
        self.cmds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cmds.is_empty()
    }

    pub fn segments(&self) -> Segments<'_> {
        Segments::new(&self.cmds)
    }

    /// The current point.
    pub fn pos(&self) -> Point {
        self.current
    }

    /// Start point of the current sub-path.
    pub fn start_pos(&self) -> Point {
        self.start
    }

    /// Whether the last sub-path is closed.
    pub fn is_closed(&self) -> bool {
        matches!(self.cmds.last(), Some(Command::Close))
    }

    /// Appends a command without normalization.
    pub(crate) fn push(&mut self, cmd: Command) {
        match cmd {
            Command::MoveTo(p) => {
                self.start = p;
                self.current = p;
            }
            Command::Close => self.current = self.start,
            _ => {
                if let Some(p) = cmd.end() {
                    self.current = p;
                }
            }
        }
        self.cmds.push(cmd);
    }

    /// Appends commands without normalization, except that lines to the
    /// current point are dropped.
    pub(crate) fn extend(&mut self, cmds: &[Command]) {
        for cmd in cmds {
            match *cmd {
                Command::LineTo(p) => self.line_to(p),
                cmd => self.push(cmd),
            }
        }
    }

    /// Drops the commands from index `len` on. The move starting the last
    /// sub-path must be kept.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.cmds.truncate(len);
        if let Some(p) = self.cmds.last().and_then(Command::end) {
            self.current = p;
        }
    }

    /// Moves the start of a single sub-path to `p`, dropping the commands
    /// between the move and index `keep`.
    pub(crate) fn trim_start(&mut self, p: Point, keep: usize) {
        if let Some(Command::MoveTo(start)) = self.cmds.first_mut() {
            *start = p;
            self.cmds.drain(1..keep.max(1));
            self.start = p;
            if self.cmds.len() == 1 {
                self.current = p;
            }
        }
    }

    fn accept(&self, cmd: &Command) -> bool {
        if cmd.is_finite() {
            true
        } else {
            warn!("A path contains NaN or infinite coordinates, ignoring the segment.");
            false
        }
    }

    /// Inserts the implicit move a drawing command needs after a close or on
    /// an empty path.
    fn ensure_subpath(&mut self) {
        match self.cmds.last() {
            None => self.push(Command::MoveTo(Point::ZERO)),
            Some(Command::Close) => self.push(Command::MoveTo(self.start)),
            _ => {}
        }
    }

    /// Starts a new sub-path at `p`. A move directly following another move
    /// replaces it.
    pub fn move_to(&mut self, p: impl Into<Point>) {
        let cmd = Command::MoveTo(p.into());
        if !self.accept(&cmd) {
            return;
        }
        if let Some(Command::MoveTo(_)) = self.cmds.last() {
            self.cmds.pop();
        }
        self.push(cmd);
    }

    /// Adds a line to `p`.
    ///
    /// A line to the current point is dropped, except directly after a move
    /// where it marks a dot.
    pub fn line_to(&mut self, p: impl Into<Point>) {
        let p = p.into();
        if !self.accept(&Command::LineTo(p)) {
            return;
        }
        self.ensure_subpath();
        if p == self.current && !matches!(self.cmds.last(), Some(Command::MoveTo(_))) {
            return;
        }
        self.push(Command::LineTo(p));
    }

    /// Adds a quadratic Bézier with control point `c` ending at `p`.
    pub fn quad_to(&mut self, c: impl Into<Point>, p: impl Into<Point>) {
        let (c, p) = (c.into(), p.into());
        if !self.accept(&Command::QuadTo(c, p)) {
            return;
        }
        self.ensure_subpath();
        if c == self.current || c == p {
            self.line_to(p);
            return;
        }
        self.push(Command::QuadTo(c, p));
    }

    /// Adds a cubic Bézier with control points `c1` and `c2` ending at `p`.
    pub fn cubic_to(&mut self, c1: impl Into<Point>, c2: impl Into<Point>, p: impl Into<Point>) {
        let (c1, c2, p) = (c1.into(), c2.into(), p.into());
        if !self.accept(&Command::CubicTo(c1, c2, p)) {
            return;
        }
        self.ensure_subpath();
        let start = self.current;
        if (c1 == start || c1 == p) && (c2 == start || c2 == p) {
            self.line_to(p);
            return;
        }
        self.push(Command::CubicTo(c1, c2, p));
    }

    /// Adds an elliptical arc to `p` in SVG endpoint form, with `rotation` in
    /// radians.
    ///
    /// Negative radii are made positive and radii too small to reach `p` are
    /// scaled up. A zero radius draws a line.
    pub fn arc_to(
        &mut self,
        rx: f64,
        ry: f64,
        rotation: f64,
        large_arc: bool,
        sweep: bool,
        p: impl Into<Point>,
    ) {
        let end = p.into();
        let cmd = Command::ArcTo {
            rx,
            ry,
            rotation,
            large_arc,
            sweep,
            end,
        };
        if !self.accept(&cmd) {
            return;
        }
        self.ensure_subpath();
        if end == self.current {
            return;
        }
        let (mut rx, mut ry) = (rx.abs(), ry.abs());
        if rx == 0.0 || ry == 0.0 {
            self.line_to(end);
            return;
        }
        let mut rotation = rotation.rem_euclid(PI);
        if rx == ry || rotation >= PI {
            rotation = 0.0;
        }
        let lambda = SvgArc {
            start: self.current,
            end,
            rx,
            ry,
            rotation,
            large_arc,
            sweep,
        }
        .radii_correction();
        if lambda > 1.0 {
            rx *= lambda;
            ry *= lambda;
        }
        self.push(Command::ArcTo {
            rx,
            ry,
            rotation,
            large_arc,
            sweep,
            end,
        });
    }

    /// Draws an elliptical arc from the current point, which lies at angle
    /// `theta0` on the ellipse, to angle `theta1`. Angles are in radians and
    /// the arc turns counter-clockwise when `theta1 > theta0`.
    pub fn arc(&mut self, rx: f64, ry: f64, rotation: f64, theta0: f64, theta1: f64) {
        let shape = EllipseArc {
            center: Point::ZERO,
            rx,
            ry,
            rotation,
            theta0,
            theta1,
        };
        self.ensure_subpath();
        let center = self.current - shape.pos(theta0);
        let sweep = theta0 < theta1;
        // Half turns at most, so the large arc flag is never needed.
        let n = ((theta1 - theta0).abs() / PI).ceil().max(1.0) as usize;
        let dtheta = (theta1 - theta0) / n as f64;
        for i in 1..=n {
            let end = center + shape.pos(theta0 + i as f64 * dtheta);
            self.arc_to(rx, ry, rotation, false, sweep, end);
        }
    }

    /// Closes the current sub-path.
    pub fn close(&mut self) {
        match self.cmds.last() {
            None | Some(Command::Close) => return,
            Some(&Command::LineTo(p)) if p == self.start => {
                self.cmds.pop();
            }
            _ => {}
        }
        self.push(Command::Close);
    }

    /// Appends the commands of `other`. Its sub-paths stay separate.
    pub fn append(&mut self, other: &Self) {
        if let (Some(Command::MoveTo(_)), Some(Command::MoveTo(_))) =
            (self.cmds.last(), other.cmds.first())
        {
            self.cmds.pop();
        }
        for cmd in &other.cmds {
            self.push(*cmd);
        }
    }

    /// Appends `other`, continuing the last open sub-path when `other` starts
    /// at the current point.
    pub fn join(&mut self, other: &Self) {
        let mut cmds = other.cmds.as_slice();
        if let (Some(Command::MoveTo(p)), Some(last)) = (cmds.first(), self.cmds.last()) {
            if *last != Command::Close && *p == self.current {
                cmds = &cmds[1..];
            }
        }
        if cmds.len() < other.cmds.len() {
            for cmd in cmds {
                self.push(*cmd);
            }
        } else {
            self.append(other);
        }
    }

    /// Applies an affine transform to every coordinate.
    ///
    /// Arc radii and rotation are transformed exactly, and mirroring flips
    /// the sweep direction. Arcs collapsed by a singular transform become
    /// lines.
    pub fn transform(&self, t: &Transform) -> Self {
        let mut path = Self::new();
        for cmd in &self.cmds {
            let cmd = match *cmd {
                Command::MoveTo(p) => Command::MoveTo(t.apply(p)),
                Command::LineTo(p) => Command::LineTo(t.apply(p)),
                Command::QuadTo(c, p) => Command::QuadTo(t.apply(c), t.apply(p)),
                Command::CubicTo(c1, c2, p) => {
                    Command::CubicTo(t.apply(c1), t.apply(c2), t.apply(p))
                }
                Command::ArcTo {
                    rx,
                    ry,
                    rotation,
                    large_arc,
                    sweep,
                    end,
                } => {
                    let (rx, ry, rotation, mirrored) = t.transform_ellipse(rx, ry, rotation);
                    if t.determinant() == 0.0 || rx == 0.0 || ry == 0.0 {
                        Command::LineTo(t.apply(end))
                    } else {
                        Command::ArcTo {
                            rx,
                            ry,
                            rotation: if rx == ry { 0.0 } else { rotation },
                            large_arc,
                            sweep: sweep != mirrored,
                            end: t.apply(end),
                        }
                    }
                }
                Command::Close => Command::Close,
            };
            path.push(cmd);
        }
        path
    }

    pub fn translate(&self, x: f64, y: f64) -> Self {
        self.transform(&Transform::translate(x, y))
    }

    pub fn scale(&self, sx: f64, sy: f64) -> Self {
        self.transform(&Transform::scale(sx, sy))
    }

    /// Rotates counter-clockwise by `theta` radians around the origin.
    pub fn rotate(&self, theta: f64) -> Self {
        self.transform(&Transform::rotate(theta))
    }

    /// Tight bounding box. Empty paths have an empty box at the origin.
    pub fn bounds(&self) -> Rect {
        self.segments()
            .map(|seg| seg.bounds())
            .reduce(|a, b| a.union(&b))
            .unwrap_or_default()
    }

    /// Total arc length, including closing lines.
    pub fn length(&self) -> f64 {
        self.segments().map(|seg| seg.length()).sum()
    }

    /// Index ranges of the sub-paths in [`Path::commands`].
    pub(crate) fn subpath_ranges(&self) -> Vec<Range<usize>> {
        let mut ranges = Vec::new();
        let mut begin = 0;
        for (i, cmd) in self.cmds.iter().enumerate() {
            if i > begin && matches!(cmd, Command::MoveTo(_)) {
                ranges.push(begin..i);
                begin = i;
            }
        }
        if begin < self.cmds.len() {
            ranges.push(begin..self.cmds.len());
        }
        ranges
    }

    /// Splits the path into its sub-paths.
    pub fn split(&self) -> Vec<Self> {
        self.subpath_ranges()
            .into_iter()
            .map(|range| {
                let mut path = Self::new();
                for cmd in &self.cmds[range] {
                    path.push(*cmd);
                }
                path
            })
            .collect()
    }

    /// Reverses the direction of every sub-path.
    ///
    /// Closed sub-paths keep their start point and stay closed; open ones
    /// start at their former end.
    pub fn reverse(&self) -> Self {
        let mut path = Self::new();
        for range in self.subpath_ranges() {
            let segs: Vec<Segment> = Segments::new(&self.cmds[range]).collect();
            let Some(first) = segs.first() else {
                continue;
            };
            let start = first.end;
            let closed = matches!(segs.last(), Some(seg) if seg.cmd == Command::Close);
            let drawn: Vec<&Segment> = segs
                .iter()
                .filter(|seg| seg.is_drawing() && seg.cmd != Command::Close)
                .collect();
            let end = drawn.last().map_or(start, |seg| seg.end);

            if closed {
                path.push(Command::MoveTo(start));
                if end != start {
                    path.push(Command::LineTo(end));
                }
                for (i, seg) in drawn.iter().enumerate().rev() {
                    let cmd = seg.reversed();
                    // The close draws this line already.
                    if i == 0 && cmd == Command::LineTo(start) {
                        continue;
                    }
                    path.push(cmd);
                }
                path.push(Command::Close);
            } else {
                path.push(Command::MoveTo(end));
                for seg in drawn.iter().rev() {
                    path.push(seg.reversed());
                }
            }
        }
        path
    }

    /// Calls `f` for every edge of the flattened path, closing open
    /// sub-paths implicitly as filling does.
    pub(crate) fn for_each_edge(&self, config: &Config, mut f: impl FnMut(Point, Point)) {
        let flat = self.flatten(config);
        let mut start = Point::ZERO;
        let mut current = Point::ZERO;
        let mut open = false;
        for seg in flat.segments() {
            match seg.cmd {
                Command::MoveTo(p) => {
                    if open {
                        f(current, start);
                    }
                    start = p;
                    open = true;
                }
                Command::Close => {
                    f(seg.start, seg.end);
                    open = false;
                }
                _ => f(seg.start, seg.end),
            }
            current = seg.end;
        }
        if open {
            f(current, start);
        }
    }

    /// Whether the path winds counter-clockwise, using the shoelace formula
    /// on the flattened path.
    pub fn is_ccw(&self, config: &Config) -> bool {
        let mut area = 0.0;
        self.for_each_edge(config, |a, b| area += (b.x - a.x) * (a.y + b.y));
        area < 0.0
    }

    /// Winding number of the path around `p`. Counter-clockwise loops count
    /// positive.
    pub fn fill_count(&self, p: Point, config: &Config) -> i32 {
        let mut count = 0;
        self.for_each_edge(config, |a, b| {
            let side = (b - a).cross(p - a);
            if a.y <= p.y {
                if b.y > p.y && side > 0.0 {
                    count += 1;
                }
            } else if b.y <= p.y && side < 0.0 {
                count -= 1;
            }
        });
        count
    }

    /// Whether `p` lies inside the path under the fill rule.
    pub fn contains(&self, p: Point, fill: Fill, config: &Config) -> bool {
        let count = self.fill_count(p, config);
        match fill {
            Fill::NonZero => count != 0,
            Fill::EvenOdd => count % 2 != 0,
        }
    }
}
