// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cutting paths by arc length, and dashing.

use log::warn;
use smallvec::SmallVec;

use crate::ellipse::EllipseArc;
use crate::math::{gauss_legendre5, inv_polynomial_approx3};
use crate::path::{Command, Path, Segment};
use crate::stroke::Dashes;
use crate::Point;

/// Newton steps refining the inverse arc length fit.
const NEWTON_STEPS: usize = 3;

/// Solves `length(x) = s` for `x` in `[lo, hi]`, starting from `x`, where
/// the length grows with speed `speed` in the direction of `sign`.
fn refine(
    speed: &dyn Fn(f64) -> f64,
    length: &dyn Fn(f64) -> f64,
    s: f64,
    mut x: f64,
    sign: f64,
    (lo, hi): (f64, f64),
) -> f64 {
    for _ in 0..NEWTON_STEPS {
        let v = speed(x);
        if v <= 0.0 {
            break;
        }
        x = (x - sign * (length(x) - s) / v).clamp(lo, hi);
    }
    x
}

/// Fractions in `[0, 1]` of the parameter range of `seg` at which the arc
/// lengths `lengths` (ascending, from the segment start) are reached.
///
/// For arcs the fraction is of the angular range of `ellipse`. Curves start
/// from a cubic fit of the inverse arc length and refine it by Newton steps.
fn params_at_lengths(
    seg: &Segment,
    ellipse: Option<&EllipseArc>,
    length: f64,
    lengths: &[f64],
) -> SmallVec<[f64; 4]> {
    let mut params = SmallVec::new();
    if length <= 0.0 {
        params.extend(lengths.iter().map(|_| 0.0));
        return params;
    }
    match seg.cmd {
        Command::MoveTo(_) => {}
        Command::LineTo(_) | Command::Close => {
            params.extend(lengths.iter().map(|s| (s / length).clamp(0.0, 1.0)));
        }
        Command::QuadTo(..) | Command::CubicTo(..) => {
            let Some(cubic) = seg.as_cubic() else {
                return params;
            };
            let speed = |t: f64| cubic.deriv(t).length();
            // One fit per stretch between inflections, where the speed is well
            // behaved.
            let mut bounds: SmallVec<[f64; 4]> = SmallVec::new();
            bounds.push(0.0);
            bounds.extend(cubic.inflections());
            bounds.push(1.0);
            let mut stretches = bounds.windows(2).map(|w| {
                let (fit, len) = inv_polynomial_approx3(gauss_legendre5, &speed, w[0], w[1]);
                (fit, len, w[0], w[1])
            });
            let Some(mut stretch) = stretches.next() else {
                return params;
            };
            let mut walked = 0.0;
            let mut prev = 0.0_f64;
            for &s in lengths {
                while s > walked + stretch.1 {
                    match stretches.next() {
                        Some(next) => {
                            walked += stretch.1;
                            stretch = next;
                        }
                        None => break,
                    }
                }
                let (fit, _, lo, hi) = stretch;
                let s = s - walked;
                let guess = fit.eval(s).clamp(lo, hi);
                let arc_length = |t: f64| gauss_legendre5(&speed, lo, t);
                let t = refine(&speed, &arc_length, s, guess, 1.0, (lo, hi)).max(prev);
                params.push(t);
                prev = t;
            }
        }
        Command::ArcTo { .. } => {
            let Some(e) = ellipse else {
                return params;
            };
            let extent = e.theta1 - e.theta0;
            if extent == 0.0 {
                params.extend(lengths.iter().map(|_| 0.0));
                return params;
            }
            let speed = |theta: f64| e.deriv(theta).length();
            let arc_length = |theta: f64| gauss_legendre5(&speed, e.theta0, theta).abs();
            let range = (e.theta0.min(e.theta1), e.theta0.max(e.theta1));
            let (fit, _) = inv_polynomial_approx3(gauss_legendre5, &speed, e.theta0, e.theta1);
            let mut prev = 0.0_f64;
            for &s in lengths {
                let guess = fit.eval(s).clamp(range.0, range.1);
                let theta = refine(&speed, &arc_length, s, guess, extent.signum(), range);
                let u = ((theta - e.theta0) / extent).clamp(0.0, 1.0).max(prev);
                params.push(u);
                prev = u;
            }
        }
    }
    params
}

/// Position at parameter fraction `u` of a drawing segment.
fn point_at(seg: &Segment, ellipse: Option<&EllipseArc>, u: f64) -> Point {
    if u >= 1.0 {
        return seg.end;
    }
    if u <= 0.0 {
        return seg.start;
    }
    match seg.cmd {
        Command::MoveTo(_) | Command::LineTo(_) | Command::Close => seg.start.lerp(seg.end, u),
        Command::QuadTo(..) => seg.as_quad().map_or(seg.end, |q| q.eval(u)),
        Command::CubicTo(..) => seg.as_cubic().map_or(seg.end, |c| c.eval(u)),
        Command::ArcTo { .. } => ellipse.map_or(seg.end, |e| {
            e.pos(e.theta0 + (e.theta1 - e.theta0) * u)
        }),
    }
}

/// Appends the part of `seg` between the fractions `u0` and `u1`.
///
/// `whole_subpath` tells whether the path holds the sub-path of a close
/// uncut, so that the close can stay a close.
fn push_part(
    path: &mut Path,
    seg: &Segment,
    ellipse: Option<&EllipseArc>,
    u0: f64,
    u1: f64,
    whole_subpath: bool,
) {
    if u1 <= u0 {
        return;
    }
    match seg.cmd {
        Command::MoveTo(_) => {}
        Command::Close if whole_subpath && u0 <= 0.0 && u1 >= 1.0 => path.close(),
        Command::LineTo(_) | Command::Close => path.line_to(point_at(seg, ellipse, u1)),
        Command::QuadTo(..) => {
            if let Some(q) = seg.as_quad() {
                let q = q.subsegment(u0, u1);
                path.quad_to(q.p1, point_at(seg, ellipse, u1));
            }
        }
        Command::CubicTo(..) => {
            if let Some(c) = seg.as_cubic() {
                let c = c.subsegment(u0, u1);
                path.cubic_to(c.p1, c.p2, point_at(seg, ellipse, u1));
            }
        }
        Command::ArcTo { sweep, .. } => {
            if let Some(e) = ellipse {
                let extent = e.theta1 - e.theta0;
                let large_arc = (extent * (u1 - u0)).abs() > core::f64::consts::PI;
                let end = point_at(seg, ellipse, u1);
                path.arc_to(e.rx, e.ry, e.rotation, large_arc, sweep, end);
            }
        }
    }
}

impl Path {
    /// Cuts the path at the given arc lengths from its start.
    ///
    /// Lengths outside `(0, length)` are ignored; the rest yield one more path
    /// than there are lengths, so equal lengths give paths holding a single
    /// move. Sub-path boundaries inside a piece are kept, and a close stays a
    /// close only when its sub-path is not cut.
    pub fn split_at_lengths(&self, lengths: &[f64]) -> Vec<Self> {
        let total = self.length();
        let mut cuts: Vec<f64> = lengths
            .iter()
            .copied()
            .filter(|&s| s > 0.0 && s < total)
            .collect();
        cuts.sort_by(f64::total_cmp);

        let mut pieces = Vec::with_capacity(cuts.len() + 1);
        let mut piece = Self::new();
        let mut next = 0;
        let mut walked = 0.0;
        let mut whole_subpath = true;
        for seg in self.segments() {
            if let Command::MoveTo(p) = seg.cmd {
                piece.move_to(p);
                whole_subpath = true;
                continue;
            }
            let length = seg.length();
            let ellipse = seg.as_arc().map(|arc| arc.to_center());
            let ellipse = ellipse.as_ref();

            let first = next;
            while next < cuts.len() && cuts[next] <= walked + length {
                next += 1;
            }
            let local: SmallVec<[f64; 4]> = cuts[first..next].iter().map(|s| s - walked).collect();
            let mut u0 = 0.0;
            for u in params_at_lengths(&seg, ellipse, length, &local) {
                push_part(&mut piece, &seg, ellipse, u0, u, whole_subpath);
                pieces.push(core::mem::take(&mut piece));
                piece.move_to(point_at(&seg, ellipse, u));
                whole_subpath = false;
                u0 = u;
            }
            push_part(&mut piece, &seg, ellipse, u0, 1.0, whole_subpath);
            walked += length;
        }
        // Lengths that rounding kept from matching a segment end the path.
        for _ in next..cuts.len() {
            let end = piece.pos();
            pieces.push(core::mem::take(&mut piece));
            piece.move_to(end);
        }
        pieces.push(piece);
        pieces
    }

    /// Dashes the path with alternating on and off lengths, starting
    /// `offset` into the pattern.
    ///
    /// A pattern of odd length is repeated once to make it even. The pattern
    /// runs on across sub-paths, and a closed sub-path that starts and ends
    /// inside a dash has those two parts merged. An unusable pattern (a
    /// negative or non-finite entry, or a zero sum) leaves the path undashed.
    pub fn dash(&self, offset: f64, pattern: &[f64]) -> Self {
        if pattern.is_empty() {
            return self.clone();
        }
        let sum: f64 = pattern.iter().sum();
        let unusable = sum <= 0.0 || sum.is_nan() || !offset.is_finite();
        if unusable || pattern.iter().any(|d| !d.is_finite() || *d < 0.0) {
            warn!("Invalid dash pattern {pattern:?}, ignoring it.");
            return self.clone();
        }
        let mut dashes = Dashes::from_slice(pattern);
        if dashes.len() % 2 == 1 {
            dashes.extend_from_slice(pattern);
        }
        let total: f64 = dashes.iter().sum();

        let mut phase = offset.rem_euclid(total);
        let mut i = 0;
        for _ in 0..dashes.len() {
            if phase < dashes[i] {
                break;
            }
            phase -= dashes[i];
            i = (i + 1) % dashes.len();
        }
        let mut remaining = (dashes[i] - phase).max(0.0);

        let mut out = Self::new();
        for sub in self.split() {
            // A lone move draws nothing, not even a dot.
            if !sub.segments().any(|seg| seg.is_drawing()) {
                continue;
            }
            while remaining <= 0.0 {
                i = (i + 1) % dashes.len();
                remaining = dashes[i];
            }
            let first_on = i % 2 == 0;
            let length = sub.length();
            let mut cuts = Vec::new();
            let mut pos = 0.0;
            while pos + remaining < length {
                pos += remaining;
                cuts.push(pos);
                i = (i + 1) % dashes.len();
                remaining = dashes[i];
            }
            remaining -= length - pos;

            let parts = sub.split_at_lengths(&cuts);
            let last_on = (parts.len() % 2 == 1) == first_on;
            let mut on: Vec<Self> = parts
                .into_iter()
                .skip(usize::from(!first_on))
                .step_by(2)
                .map(|mut part| {
                    // A zero-length dash still marks its position.
                    if part.len() == 1 {
                        let p = part.pos();
                        part.line_to(p);
                    }
                    part
                })
                .collect();
            if sub.is_closed() && !cuts.is_empty() && first_on && last_on {
                if let Some(mut merged) = on.pop() {
                    if let Some(first) = on.first_mut() {
                        merged.join(first);
                        *first = merged;
                    }
                }
            }
            for part in &on {
                out.append(part);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use peniko::Fill;

    use super::Path;
    use crate::path::Command;
    use crate::stroke::{Cap, Stroke};
    use crate::{Config, Point};

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    fn assert_near(a: f64, b: f64, tolerance: f64) {
        assert!((a - b).abs() <= tolerance, "{a} != {b} (±{tolerance})");
    }

    fn line(length: f64) -> Path {
        let mut path = Path::new();
        path.move_to((0.0, 0.0));
        path.line_to((length, 0.0));
        path
    }

    fn square() -> Path {
        let mut path = Path::new();
        path.move_to((0.0, 0.0));
        path.line_to((2.0, 0.0));
        path.line_to((2.0, 2.0));
        path.line_to((0.0, 2.0));
        path.close();
        path
    }

    fn x_ranges(path: &Path) -> Vec<(f64, f64)> {
        path.split()
            .iter()
            .map(|sub| {
                let b = sub.bounds();
                (b.x0, b.x1)
            })
            .collect()
    }

    #[test]
    fn split_lines() {
        let pieces = square().split_at_lengths(&[5.0, 1.0, 0.0, 8.0]);
        assert_eq!(pieces.len(), 3);
        assert_eq!(
            pieces[0].commands(),
            &[Command::MoveTo(p(0.0, 0.0)), Command::LineTo(p(1.0, 0.0))]
        );
        assert_eq!(
            pieces[1].commands(),
            &[
                Command::MoveTo(p(1.0, 0.0)),
                Command::LineTo(p(2.0, 0.0)),
                Command::LineTo(p(2.0, 2.0)),
                Command::LineTo(p(1.0, 2.0)),
            ]
        );
        // The close of a cut sub-path becomes a line.
        assert_eq!(
            pieces[2].commands(),
            &[
                Command::MoveTo(p(1.0, 2.0)),
                Command::LineTo(p(0.0, 2.0)),
                Command::LineTo(p(0.0, 0.0)),
            ]
        );

        let whole = square().split_at_lengths(&[]);
        assert_eq!(whole, vec![square()]);
        let repeated = line(4.0).split_at_lengths(&[2.0, 2.0]);
        assert_eq!(repeated.len(), 3);
        assert_eq!(repeated[1].commands(), &[Command::MoveTo(p(2.0, 0.0))]);
    }

    #[test]
    fn split_curves() {
        let mut path = Path::new();
        path.move_to((0.0, 0.0));
        path.cubic_to((0.0, 10.0), (10.0, 10.0), (10.0, 0.0));
        path.quad_to((15.0, -5.0), (20.0, 0.0));
        path.arc_to(5.0, 5.0, 0.0, false, true, (30.0, 0.0));
        let total = path.length();
        let cuts = [0.2 * total, 0.5 * total, 0.9 * total];
        let pieces = path.split_at_lengths(&cuts);
        assert_eq!(pieces.len(), 4);

        let lengths: Vec<f64> = pieces.iter().map(Path::length).collect();
        assert_near(lengths.iter().sum(), total, 1e-6 * total);
        let mut at = 0.0;
        for (length, cut) in lengths.iter().zip(cuts) {
            at += length;
            assert_near(at, cut, 1e-6 * total);
        }
        for pair in pieces.windows(2) {
            assert_eq!(Some(pair[0].pos()), pair[1].commands()[0].end());
        }
        assert_eq!(pieces[3].pos(), p(30.0, 0.0));
    }

    #[test]
    fn dash_line() {
        // Negative offsets wrap around the pattern.
        let dashed = line(20.0).dash(-3.0, &[4.0, 2.0]);
        assert_eq!(
            x_ranges(&dashed),
            vec![(0.0, 1.0), (3.0, 7.0), (9.0, 13.0), (15.0, 19.0)]
        );
        assert_eq!(dashed, line(20.0).dash(3.0, &[4.0, 2.0]));
        assert_near(dashed.length(), 13.0, 1e-12);

        // Odd patterns alternate their meaning on repetition.
        let odd = line(20.0).dash(0.0, &[5.0]);
        assert_eq!(x_ranges(&odd), vec![(0.0, 5.0), (10.0, 15.0)]);
    }

    #[test]
    fn dash_length_accounts_for_path() {
        let mut path = Path::new();
        path.move_to((0.0, 0.0));
        path.cubic_to((0.0, 10.0), (10.0, 10.0), (10.0, 0.0));
        path.arc_to(10.0, 5.0, 0.3, false, false, (30.0, 0.0));
        let total = path.length();
        for offset in [-7.5, -1.0, 0.0, 2.5, 11.0] {
            let on = path.dash(offset, &[2.0, 2.0]).length();
            let off = path.dash(offset + 2.0, &[2.0, 2.0]).length();
            assert_near(on + off, total, 0.01 * total);
        }
    }

    #[test]
    fn dash_closed_merges_ends() {
        let dashed = square().dash(1.0, &[3.0, 1.0]);
        let parts = dashed.split();
        assert_eq!(parts.len(), 2);
        assert_eq!(
            parts[0].commands(),
            &[
                Command::MoveTo(p(0.0, 1.0)),
                Command::LineTo(p(0.0, 0.0)),
                Command::LineTo(p(2.0, 0.0)),
            ]
        );
        assert_near(parts[0].length(), 3.0, 1e-12);
        assert_near(parts[1].length(), 3.0, 1e-12);
        assert!(!dashed.is_closed());
    }

    #[test]
    fn dash_continues_across_subpaths() {
        let mut path = line(3.0);
        path.move_to((0.0, 5.0));
        path.line_to((3.0, 5.0));
        let dashed = path.dash(0.0, &[2.0, 2.0]);
        let parts = dashed.split();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[1].bounds().x0, 1.0);
        assert_eq!(parts[1].bounds().x1, 3.0);
    }

    #[test]
    fn zero_length_dashes_are_dots() {
        let dashed = line(10.0).dash(-2.0, &[0.0, 4.0]);
        assert_eq!(
            dashed.commands(),
            &[
                Command::MoveTo(p(2.0, 0.0)),
                Command::LineTo(p(2.0, 0.0)),
                Command::MoveTo(p(6.0, 0.0)),
                Command::LineTo(p(6.0, 0.0)),
            ]
        );
    }

    #[test]
    fn lone_moves_stay_undrawn() {
        let config = Config::default();
        let path: Path = "M0 0L10 0M50 50".parse().unwrap();
        let dashed = path.dash(0.0, &[100.0, 1.0]);
        assert_eq!(
            dashed.commands(),
            &[Command::MoveTo(p(0.0, 0.0)), Command::LineTo(p(10.0, 0.0))]
        );

        let style = Stroke::new(2.0).with_caps(Cap::Round);
        let dotted = style.clone().with_dashes(0.0, [100.0, 1.0]);
        for style in [&style, &dotted] {
            let out = path.stroke(style, &config);
            assert!(out.contains(p(5.0, 0.5), Fill::NonZero, &config));
            assert!(!out.contains(p(50.0, 50.0), Fill::NonZero, &config));
        }
    }

    #[test]
    fn unusable_patterns() {
        let path = square();
        assert_eq!(path.dash(0.0, &[]), path);
        assert_eq!(path.dash(0.0, &[0.0, 0.0]), path);
        assert_eq!(path.dash(0.0, &[2.0, -1.0]), path);
        assert_eq!(path.dash(f64::NAN, &[2.0, 1.0]), path);
    }
}
