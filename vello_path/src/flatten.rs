// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Flattening curves into polylines.
//!
//! Cubic Béziers are flattened with the method of R. Hain et al., "Fast,
//! precise flattening of cubic Bézier path and offset curves" (2005). The
//! curve is cut at its inflection points; each smooth stretch is subdivided
//! by a parabolic estimate of the flatness, and the neighborhood of an
//! inflection is approximated by straight lines. The same routine flattens
//! offset curves, with the step shrunk according to the offset distance.

use bytemuck::{Pod, Zeroable};
use log::debug;

use crate::bezier::CubicBez;
use crate::ellipse::SvgArc;
use crate::path::{Command, Path};
use crate::{Config, Point};

/// Upper bound on subdivision steps for one smooth stretch.
const MAX_STEPS: usize = 1 << 12;

/// Upper bound on bisection depth across an inflection.
const MAX_DEPTH: u32 = 16;

/// Smallest angular step of a flattened arc.
const MIN_THETA: f64 = 1e-4;

/// A line segment, laid out for upload to the GPU.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Line {
    pub p0: Point,
    pub p1: Point,
}

impl Line {
    pub const fn new(p0: Point, p1: Point) -> Self {
        Self { p0, p1 }
    }
}

/// Appends to `path` the lines approximating the curve at offset `d` from
/// `cubic`, positive to the right of the direction of travel.
///
/// The path is expected to be at the start of the offset curve already; the
/// last line ends exactly on the offset end point. Degenerate cubics whose
/// end points coincide with one of the controls emit nothing.
pub fn flatten_cubic(path: &mut Path, cubic: &CubicBez, d: f64, config: &Config) {
    if cubic.is_degenerate() {
        return;
    }

    // Parameter ranges around the inflections that are replaced by lines.
    let mut ranges: Vec<(f64, f64)> = Vec::with_capacity(2);
    for t in cubic.inflections() {
        let (lo, hi) = cubic.inflection_range(t, config);
        let (lo, hi) = (lo.max(0.0), hi.min(1.0));
        match ranges.last_mut() {
            Some(last) if lo <= last.1 => last.1 = last.1.max(hi),
            _ => ranges.push((lo, hi)),
        }
    }

    let mut t = 0.0;
    for (lo, hi) in ranges {
        if lo > t {
            flatten_smooth(path, &cubic.subsegment(t, lo), d, config);
        }
        flatten_inflection(path, &cubic.subsegment(lo, hi), d, config, 0);
        t = hi;
    }
    if t < 1.0 {
        flatten_smooth(path, &cubic.subsegment(t, 1.0), d, config);
    }
}

/// Flattens a cubic without inflection points by parabolic approximation.
pub(crate) fn flatten_smooth(path: &mut Path, cubic: &CubicBez, d: f64, config: &Config) {
    let tolerance = config.tolerance;
    let mut c = *cubic;
    let mut steps = 0;
    loop {
        if steps == MAX_STEPS {
            debug!("Flattening stopped after {MAX_STEPS} steps");
            break;
        }
        steps += 1;

        let mut dir = c.p1 - c.p0;
        if dir.is_near(Point::ZERO, config.epsilon) {
            dir = c.p2 - c.p0;
            if dir.is_near(Point::ZERO, config.epsilon) {
                break;
            }
        }
        let len = dir.length();
        let s2 = (c.p2 - c.p0).cross(dir) / len;
        let t = if s2.abs() < config.epsilon {
            let s3 = (c.p3 - c.p0).cross(dir) / len;
            if s3.abs() < config.epsilon {
                break;
            }
            2.0 * (tolerance / s3.abs()).cbrt()
        } else {
            // Curving away from the offset side gives the offset curve a
            // larger radius and permits longer steps, and vice versa.
            let denom = 1.0 - d * s2 / (len * len) * 2.0 / 3.0;
            let tolerance = if denom > 0.0 {
                tolerance / denom
            } else {
                tolerance
            };
            2.0 * (tolerance / (3.0 * s2.abs())).sqrt()
        };
        if t >= 1.0 {
            break;
        }
        c = c.subdivide(t).1;
        path.line_to(c.p0 + c.normal(0.0, d));
    }
    path.line_to(c.p3 + c.normal(1.0, d));
}

/// Approximates the stretch around an inflection by its chord, bisecting
/// while the control points stray more than the tolerance from it.
fn flatten_inflection(path: &mut Path, cubic: &CubicBez, d: f64, config: &Config, depth: u32) {
    let flatness = segment_distance(cubic.p1, cubic.p0, cubic.p3)
        .max(segment_distance(cubic.p2, cubic.p0, cubic.p3));
    if depth >= MAX_DEPTH || flatness <= config.tolerance {
        path.line_to(cubic.p3 + cubic.normal(1.0, d));
        return;
    }
    let (head, tail) = cubic.subdivide(0.5);
    flatten_inflection(path, &head, d, config, depth + 1);
    flatten_inflection(path, &tail, d, config, depth + 1);
}

fn segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 == 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    p.distance(a.lerp(b, t))
}

/// Appends to `path` the lines approximating the curve at offset `d` from
/// an elliptical arc.
///
/// The angular step is `2 acos(1 - tolerance / r)` for the largest radius
/// `r` of the offset ellipse, which bounds the deviation of every chord.
pub fn flatten_arc(path: &mut Path, arc: &SvgArc, d: f64, config: &Config) {
    let ellipse = arc.to_center();
    let radius = config
        .tolerance
        .max(ellipse.rx.max(ellipse.ry) + d.abs());
    let step = (2.0 * (1.0 - config.tolerance / radius).acos()).max(MIN_THETA);
    let extent = ellipse.theta1 - ellipse.theta0;
    let n = ((extent.abs() / step).ceil() as usize).max(1);
    let dtheta = extent / n as f64;
    for i in 1..n {
        let theta = ellipse.theta0 + i as f64 * dtheta;
        path.line_to(ellipse.pos(theta) + ellipse.normal(theta, d));
    }
    if d == 0.0 {
        path.line_to(arc.end);
    } else {
        path.line_to(arc.end + ellipse.normal(ellipse.theta1, d));
    }
}

impl Path {
    /// Replaces every curve by lines within `config.tolerance`.
    pub fn flatten(&self, config: &Config) -> Self {
        let mut path = Self::new();
        for seg in self.segments() {
            match seg.cmd {
                Command::MoveTo(p) => path.move_to(p),
                Command::LineTo(p) => path.line_to(p),
                Command::QuadTo(..) | Command::CubicTo(..) => {
                    if let Some(cubic) = seg.as_cubic() {
                        flatten_cubic(&mut path, &cubic, 0.0, config);
                    }
                }
                Command::ArcTo { .. } => {
                    if let Some(arc) = seg.as_arc() {
                        flatten_arc(&mut path, &arc, 0.0, config);
                    }
                }
                Command::Close => path.close(),
            }
        }
        path
    }

    /// Replaces every arc by `config.arc_segments` quadratic Béziers, for
    /// consumers without an arc primitive.
    pub fn replace_arcs(&self, config: &Config) -> Self {
        let mut path = Self::new();
        for seg in self.segments() {
            match seg.as_arc() {
                Some(arc) => {
                    for q in arc.to_quads(config.arc_segments) {
                        path.quad_to(q.p1, q.p2);
                    }
                }
                None => path.push(seg.cmd),
            }
        }
        path
    }

    /// Replaces every arc by cubic Béziers, one per quarter turn at most.
    pub fn arcs_to_cubics(&self) -> Self {
        let mut path = Self::new();
        for seg in self.segments() {
            match seg.as_arc() {
                Some(arc) => {
                    for c in arc.to_cubics() {
                        path.cubic_to(c.p1, c.p2, c.p3);
                    }
                }
                None => path.push(seg.cmd),
            }
        }
        path
    }

    /// Flattens the path into a list of lines ready for filling.
    ///
    /// Open sub-paths are closed implicitly and zero-length lines are
    /// dropped.
    pub fn to_lines(&self, config: &Config) -> Vec<Line> {
        let mut lines = Vec::new();
        self.for_each_edge(config, |p0, p1| {
            if p0 != p1 {
                lines.push(Line::new(p0, p1));
            }
        });
        lines
    }
}

#[cfg(test)]
mod tests {
    use core::f64::consts::PI;

    use super::{flatten_arc, flatten_cubic, flatten_smooth, segment_distance};
    use crate::bezier::CubicBez;
    use crate::ellipse::SvgArc;
    use crate::path::{Command, Path};
    use crate::{Config, Point};

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    fn vertices(path: &Path) -> Vec<Point> {
        path.commands().iter().filter_map(|cmd| cmd.end()).collect()
    }

    fn assert_vertices(path: &Path, expected: &[(f64, f64)]) {
        let got = vertices(path);
        assert_eq!(got.len(), expected.len() + 1, "{got:?}");
        for (v, &(x, y)) in got[1..].iter().zip(expected) {
            assert!(v.is_near(p(x, y), 1e-6), "{v:?} != ({x}, {y})");
        }
    }

    fn smooth(c: CubicBez, d: f64, tolerance: f64) -> Path {
        let config = Config::default().with_tolerance(tolerance);
        let mut path = Path::new();
        path.move_to(c.p0 + c.normal(0.0, d));
        flatten_smooth(&mut path, &c, d, &config);
        path
    }

    /// Largest distance from samples of the curve to the polyline.
    fn deviation(c: &CubicBez, path: &Path) -> f64 {
        let pts = vertices(path);
        (0..=1000)
            .map(|i| {
                let q = c.eval(i as f64 / 1000.0);
                pts.windows(2)
                    .map(|w| segment_distance(q, w[0], w[1]))
                    .fold(f64::INFINITY, f64::min)
            })
            .fold(0.0, f64::max)
    }

    #[test]
    fn smooth_subdivision() {
        let c = CubicBez::new(p(0.0, 0.0), p(1.0, 0.0), p(2.0, 1.0), p(3.0, 2.0));
        assert_vertices(
            &smooth(c, 0.0, 0.1),
            &[(1.095445, 0.351314), (2.579154, 1.581915), (3.0, 2.0)],
        );
        // Coinciding first control point.
        let c = CubicBez::new(p(0.0, 0.0), p(0.0, 0.0), p(1.0, 0.0), p(2.0, 2.0));
        assert_vertices(&smooth(c, 0.0, 0.1), &[(1.22865, 0.8), (2.0, 2.0)]);
        let c = CubicBez::new(p(0.0, 0.0), p(1.0, 1.0), p(2.0, 2.0), p(3.0, 5.0));
        assert_vertices(&smooth(c, 0.0, 0.1), &[(2.481111, 3.612482), (3.0, 5.0)]);
    }

    #[test]
    fn smooth_offset() {
        let c = CubicBez::new(
            p(0.0, 0.0),
            p(0.666667, 0.0),
            p(1.0, 0.333333),
            p(1.0, 1.0),
        );
        let path = smooth(c, 0.5, 0.5);
        assert!(path.commands()[0].end().unwrap().is_near(p(0.0, -0.5), 1e-12));
        assert_vertices(&path, &[(1.5, 1.0)]);
    }

    #[test]
    fn inflections_within_tolerance() {
        let config = Config::default().with_tolerance(0.01);
        for c in [
            CubicBez::new(p(0.0, 0.0), p(30.0, 40.0), p(60.0, -40.0), p(100.0, 0.0)),
            // Cusp.
            CubicBez::new(p(0.0, 0.0), p(100.0, 100.0), p(0.0, 100.0), p(100.0, 0.0)),
            CubicBez::new(p(16.0, 467.0), p(185.0, 95.0), p(673.0, 545.0), p(810.0, 17.0)),
        ] {
            let mut path = Path::new();
            path.move_to(c.p0);
            flatten_cubic(&mut path, &c, 0.0, &config);
            assert_eq!(path.pos(), c.p3);
            let dev = deviation(&c, &path);
            assert!(dev <= 2.0 * config.tolerance, "deviation {dev} for {c:?}");
        }
    }

    #[test]
    fn degenerate_cubic_is_skipped() {
        let c = CubicBez::new(p(1.0, 1.0), p(1.0, 1.0), p(3.0, 3.0), p(1.0, 1.0));
        let mut path = Path::new();
        path.move_to(c.p0);
        flatten_cubic(&mut path, &c, 0.5, &Config::default());
        assert_eq!(path.len(), 1);
    }

    #[test]
    fn arc_steps_follow_tolerance() {
        let arc = SvgArc {
            start: p(0.0, 0.0),
            end: p(200.0, 0.0),
            rx: 100.0,
            ry: 100.0,
            rotation: 0.0,
            large_arc: false,
            sweep: false,
        };
        let config = Config::default();
        let mut path = Path::new();
        path.move_to(arc.start);
        flatten_arc(&mut path, &arc, 0.0, &config);
        // A step of 2 acos(1 - 1e-4) covers the half turn in 112 lines.
        assert_eq!(path.len(), 113);
        assert_eq!(path.pos(), arc.end);
        for v in vertices(&path) {
            assert!((v.distance(p(100.0, 0.0)) - 100.0).abs() < 1e-9);
        }

        let mut offset = Path::new();
        offset.move_to(p(-10.0, 0.0));
        flatten_arc(&mut offset, &arc, -10.0, &config);
        for v in vertices(&offset) {
            assert!((v.distance(p(100.0, 0.0)) - 110.0).abs() < 1e-9);
        }
        assert!(offset.pos().is_near(p(210.0, 0.0), 1e-9));
    }

    #[test]
    fn flatten_path() {
        let mut path = Path::new();
        path.move_to((0.0, 0.0));
        path.quad_to((1.0, 2.0), (2.0, 0.0));
        path.arc_to(1.0, 1.0, 0.0, false, false, (4.0, 0.0));
        path.close();
        let flat = path.flatten(&Config::default());
        assert!(flat
            .commands()
            .iter()
            .all(|cmd| matches!(cmd, Command::MoveTo(_) | Command::LineTo(_) | Command::Close)));
        assert!(flat.commands().contains(&Command::LineTo(p(2.0, 0.0))));
        assert!(flat.is_closed());
        assert!((flat.length() - path.length()).abs() < 0.05);
    }

    #[test]
    fn arc_replacement() {
        let mut path = Path::new();
        path.move_to((0.0, 0.0));
        path.arc_to(100.0, 100.0, 0.0, false, false, (200.0, 0.0));
        path.line_to((0.0, 0.0));

        let quads = path.replace_arcs(&Config::default());
        assert_eq!(quads.len(), 18);
        assert!(matches!(
            quads.commands()[16],
            Command::QuadTo(_, end) if end == p(200.0, 0.0)
        ));

        let cubics = path.arcs_to_cubics();
        assert_eq!(cubics.len(), 4);
        assert!((cubics.bounds().height() - 100.0).abs() < 1e-9);
        assert!((cubics.length() - (100.0 * PI + 200.0)).abs() < 0.1);
    }

    #[test]
    fn lines_close_open_subpaths() {
        let mut path = Path::new();
        path.move_to((0.0, 0.0));
        path.line_to((1.0, 0.0));
        path.line_to((1.0, 1.0));
        let lines = path.to_lines(&Config::default());
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2].p0, p(1.0, 1.0));
        assert_eq!(lines[2].p1, p(0.0, 0.0));
        let raw: &[f64] = bytemuck::cast_slice(&lines);
        assert_eq!(raw.len(), 12);
    }
}
