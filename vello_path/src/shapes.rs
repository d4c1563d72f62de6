// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Constructors for common shapes.
//!
//! Every shape is a single closed sub-path running counter-clockwise. Shapes
//! with a zero or non-finite size are empty.

use core::f64::consts::{FRAC_PI_2, TAU};

use crate::{Path, Point};

fn is_empty_size(w: f64, h: f64) -> bool {
    w == 0.0 || h == 0.0 || !w.is_finite() || !h.is_finite()
}

/// A rectangle with its corner at `origin`, extending by `w` along x and `h`
/// along y.
pub fn rectangle(origin: impl Into<Point>, w: f64, h: f64) -> Path {
    let o = origin.into();
    let mut path = Path::new();
    if is_empty_size(w, h) {
        return path;
    }
    path.move_to(o);
    path.line_to((o.x + w, o.y));
    path.line_to((o.x + w, o.y + h));
    path.line_to((o.x, o.y + h));
    path.close();
    path
}

/// A rectangle with corners rounded by quarter circles of radius `r`.
///
/// A negative radius cuts the corners inwards instead, giving concave
/// corners. The radius is limited to half the shorter side.
pub fn rounded_rectangle(origin: impl Into<Point>, w: f64, h: f64, r: f64) -> Path {
    let o = origin.into();
    if r == 0.0 || is_empty_size(w, h) {
        return rectangle(o, w, h);
    }
    let sweep = r > 0.0;
    let r = r.abs().min(w.abs() / 2.0).min(h.abs() / 2.0);
    let (x0, y0, x1, y1) = (o.x, o.y, o.x + w, o.y + h);
    // Corner offsets carry the sign of the sides.
    let (rx, ry) = (r.copysign(w), r.copysign(h));

    let mut path = Path::new();
    path.move_to((x0, y0 + ry));
    path.arc_to(r, r, 0.0, false, sweep, (x0 + rx, y0));
    path.line_to((x1 - rx, y0));
    path.arc_to(r, r, 0.0, false, sweep, (x1, y0 + ry));
    path.line_to((x1, y1 - ry));
    path.arc_to(r, r, 0.0, false, sweep, (x1 - rx, y1));
    path.line_to((x0 + rx, y1));
    path.arc_to(r, r, 0.0, false, sweep, (x0, y1 - ry));
    path.close();
    path
}

/// A rectangle with its corners cut off at distance `r` along both sides.
pub fn beveled_rectangle(origin: impl Into<Point>, w: f64, h: f64, r: f64) -> Path {
    let o = origin.into();
    if r == 0.0 || is_empty_size(w, h) {
        return rectangle(o, w, h);
    }
    let r = r.abs().min(w.abs() / 2.0).min(h.abs() / 2.0);
    let (x0, y0, x1, y1) = (o.x, o.y, o.x + w, o.y + h);
    let (rx, ry) = (r.copysign(w), r.copysign(h));

    let mut path = Path::new();
    path.move_to((x0, y0 + ry));
    path.line_to((x0 + rx, y0));
    path.line_to((x1 - rx, y0));
    path.line_to((x1, y0 + ry));
    path.line_to((x1, y1 - ry));
    path.line_to((x1 - rx, y1));
    path.line_to((x0 + rx, y1));
    path.line_to((x0, y1 - ry));
    path.close();
    path
}

pub fn circle(center: impl Into<Point>, r: f64) -> Path {
    ellipse(center, r, r)
}

/// An axis-aligned ellipse made of two half arcs, starting on its right.
pub fn ellipse(center: impl Into<Point>, rx: f64, ry: f64) -> Path {
    let c = center.into();
    let mut path = Path::new();
    if is_empty_size(rx, ry) {
        return path;
    }
    let (rx, ry) = (rx.abs(), ry.abs());
    path.move_to((c.x + rx, c.y));
    path.arc_to(rx, ry, 0.0, false, true, (c.x - rx, c.y));
    path.arc_to(rx, ry, 0.0, false, true, (c.x + rx, c.y));
    path.close();
    path
}

/// A regular polygon with `n` vertices on a circle of radius `r`.
///
/// The first vertex points up, turned counter-clockwise by `rotation`
/// radians. Fewer than three vertices give an empty path.
pub fn regular_polygon(n: usize, center: impl Into<Point>, r: f64, rotation: f64) -> Path {
    let c = center.into();
    let mut path = Path::new();
    if n < 3 || r == 0.0 || !r.is_finite() {
        return path;
    }
    let dtheta = TAU / n as f64;
    for i in 0..n {
        let p = c + Point::from_angle(FRAC_PI_2 + rotation + i as f64 * dtheta) * r;
        if i == 0 {
            path.move_to(p);
        } else {
            path.line_to(p);
        }
    }
    path.close();
    path
}
