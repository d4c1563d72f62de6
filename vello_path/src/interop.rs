// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Conversions to and from kurbo.

use peniko::kurbo::{self, PathEl};

use crate::path::{Command, Path};
use crate::{Config, Point};

impl From<kurbo::Point> for Point {
    fn from(p: kurbo::Point) -> Self {
        Self::new(p.x, p.y)
    }
}

impl From<Point> for kurbo::Point {
    fn from(p: Point) -> Self {
        Self::new(p.x, p.y)
    }
}

impl Path {
    /// Converts to a kurbo path.
    ///
    /// kurbo has no arc element, so arcs become cubic Béziers within
    /// `config.tolerance`.
    pub fn to_kurbo(&self, config: &Config) -> kurbo::BezPath {
        let mut bez = kurbo::BezPath::new();
        for seg in self.segments() {
            match seg.cmd {
                Command::MoveTo(p) => bez.move_to(p),
                Command::LineTo(p) => bez.line_to(p),
                Command::QuadTo(c, p) => bez.quad_to(c, p),
                Command::CubicTo(c1, c2, p) => bez.curve_to(c1, c2, p),
                Command::ArcTo {
                    rx,
                    ry,
                    rotation,
                    large_arc,
                    sweep,
                    end,
                } => {
                    let arc = kurbo::SvgArc {
                        from: seg.start.into(),
                        to: end.into(),
                        radii: kurbo::Vec2::new(rx, ry),
                        x_rotation: rotation,
                        large_arc,
                        sweep,
                    };
                    let Some(arc) = kurbo::Arc::from_svg_arc(&arc) else {
                        bez.line_to(end);
                        continue;
                    };
                    let mut cubics = Vec::new();
                    arc.to_cubic_beziers(config.tolerance, |p1, p2, p3| {
                        cubics.push((p1, p2, p3));
                    });
                    // Land exactly on the end point rather than on the
                    // evaluated ellipse.
                    if let Some(last) = cubics.last_mut() {
                        last.2 = end.into();
                    }
                    for (p1, p2, p3) in cubics {
                        bez.curve_to(p1, p2, p3);
                    }
                }
                Command::Close => bez.close_path(),
            }
        }
        bez
    }
}

impl From<&kurbo::BezPath> for Path {
    fn from(bez: &kurbo::BezPath) -> Self {
        let mut path = Self::new();
        for el in bez.elements() {
            match *el {
                PathEl::MoveTo(p) => path.move_to(p),
                PathEl::LineTo(p) => path.line_to(p),
                PathEl::QuadTo(c, p) => path.quad_to(c, p),
                PathEl::CurveTo(c1, c2, p) => path.cubic_to(c1, c2, p),
                PathEl::ClosePath => path.close(),
            }
        }
        path
    }
}
