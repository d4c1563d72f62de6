// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Elliptical arcs.
//!
//! Arcs are stored the way SVG writes them ([`SvgArc`]: end points, radii,
//! rotation and two flags) and converted to center form ([`EllipseArc`]) for
//! evaluation. Angles are in radians; `sweep == true` runs towards increasing
//! angles, which is counter-clockwise with the y axis pointing up.

use core::f64::consts::{FRAC_PI_2, PI, TAU};

use smallvec::SmallVec;

use crate::bezier::{CubicBez, QuadBez};
use crate::math::{angle_between, angle_norm, gauss_legendre5};
use crate::{Point, Rect};

/// An elliptical arc in endpoint parametrization.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SvgArc {
    pub start: Point,
    pub end: Point,
    pub rx: f64,
    pub ry: f64,
    /// Rotation of the x radius from the x axis, in radians.
    pub rotation: f64,
    pub large_arc: bool,
    pub sweep: bool,
}

/// An elliptical arc in center parametrization.
///
/// The arc runs from `theta0` to `theta1`; `theta1 < theta0` encodes a
/// clockwise arc. `theta0` lies in `[0, 2π)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EllipseArc {
    pub center: Point,
    pub rx: f64,
    pub ry: f64,
    pub rotation: f64,
    pub theta0: f64,
    pub theta1: f64,
}

impl SvgArc {
    /// The factor by which both radii must grow for the ellipse to reach from
    /// `start` to `end`. Values at or below one mean the radii suffice.
    pub fn radii_correction(&self) -> f64 {
        let (sin, cos) = self.rotation.sin_cos();
        let half = (self.start - self.end) / 2.0;
        let x1p = cos * half.x + sin * half.y;
        let y1p = -sin * half.x + cos * half.y;
        (x1p * x1p / (self.rx * self.rx) + y1p * y1p / (self.ry * self.ry)).sqrt()
    }

    /// Converts to center parametrization.
    ///
    /// Radii too small to span the end points are scaled up uniformly, as SVG
    /// prescribes. Coinciding end points or a zero radius give an arc of zero
    /// extent centered on `start`.
    ///
    /// See <https://www.w3.org/TR/SVG/implnote.html#ArcImplementationNotes>.
    pub fn to_center(&self) -> EllipseArc {
        let mut rx = self.rx.abs();
        let mut ry = self.ry.abs();
        if self.start == self.end || rx == 0.0 || ry == 0.0 {
            return EllipseArc {
                center: self.start,
                rx,
                ry,
                rotation: self.rotation,
                theta0: 0.0,
                theta1: 0.0,
            };
        }

        // Half the chord, in the frame of the unrotated ellipse.
        let (sin, cos) = self.rotation.sin_cos();
        let half = (self.start - self.end) / 2.0;
        let x1p = cos * half.x + sin * half.y;
        let y1p = -sin * half.x + cos * half.y;

        let lambda = x1p * x1p / (rx * rx) + y1p * y1p / (ry * ry);
        if lambda > 1.0 {
            let scale = lambda.sqrt();
            rx *= scale;
            ry *= scale;
        }

        let num = rx * rx * ry * ry - rx * rx * y1p * y1p - ry * ry * x1p * x1p;
        let den = rx * rx * y1p * y1p + ry * ry * x1p * x1p;
        // Chords through the center, the common case of half ellipses, leave
        // only rounding noise in `num`.
        let sq = num / den;
        let sq = if sq <= 4.0 * f64::EPSILON { 0.0 } else { sq };
        let mut coef = sq.sqrt();
        if self.large_arc == self.sweep {
            coef = -coef;
        }
        let cxp = coef * rx * y1p / ry;
        let cyp = -coef * ry * x1p / rx;
        let mid = self.start.midpoint(self.end);
        let center = Point::new(cos * cxp - sin * cyp + mid.x, sin * cxp + cos * cyp + mid.y);

        let u = Point::new((x1p - cxp) / rx, (y1p - cyp) / ry);
        let v = Point::new((-x1p - cxp) / rx, (-y1p - cyp) / ry);
        let theta0 = angle_norm(u.y.atan2(u.x));
        let mut delta = u.cross(v).atan2(u.dot(v));
        if !self.sweep && delta > 0.0 {
            delta -= TAU;
        } else if self.sweep && delta < 0.0 {
            delta += TAU;
        }

        EllipseArc {
            center,
            rx,
            ry,
            rotation: self.rotation,
            theta0,
            theta1: theta0 + delta,
        }
    }

    /// Approximates the arc by `segments` quadratic Béziers of equal angular
    /// extent, each with its control point where the tangents at its ends
    /// meet. The last segment ends exactly on `end`.
    pub fn to_quads(&self, segments: usize) -> Vec<QuadBez> {
        let arc = self.to_center();
        let n = segments.max(1);
        let dtheta = (arc.theta1 - arc.theta0) / n as f64;
        let kappa = (dtheta.abs() / 2.0).tan();

        let mut quads = Vec::with_capacity(n);
        let mut start = self.start;
        let mut start_deriv = arc.deriv(arc.theta0);
        for i in 1..=n {
            let theta = arc.theta0 + i as f64 * dtheta;
            let end = if i == n { self.end } else { arc.pos(theta) };
            quads.push(QuadBez::new(start, start + start_deriv * kappa, end));
            start = end;
            start_deriv = arc.deriv(theta);
        }
        quads
    }

    /// Approximates the arc by cubic Béziers, one per quarter turn or less.
    ///
    /// The control points lie along the end tangents at `4/3 tan(Δθ/4)`
    /// times the derivative, which puts the midpoint of each cubic on the
    /// ellipse. A quarter circle strays less than `2.8e-4` of its radius.
    pub fn to_cubics(&self) -> SmallVec<[CubicBez; 4]> {
        let arc = self.to_center();
        let extent = (arc.theta1 - arc.theta0).abs();
        let n = ((extent / FRAC_PI_2).ceil() as usize).max(1);
        let dtheta = (arc.theta1 - arc.theta0) / n as f64;
        let kappa = 4.0 / 3.0 * (dtheta.abs() / 4.0).tan();

        let mut cubics = SmallVec::new();
        let mut start = self.start;
        let mut start_deriv = arc.deriv(arc.theta0);
        for i in 1..=n {
            let theta = arc.theta0 + i as f64 * dtheta;
            let end = if i == n { self.end } else { arc.pos(theta) };
            let end_deriv = arc.deriv(theta);
            cubics.push(CubicBez::new(
                start,
                start + start_deriv * kappa,
                end - end_deriv * kappa,
                end,
            ));
            start = end;
            start_deriv = end_deriv;
        }
        cubics
    }
}

impl EllipseArc {
    /// Whether the arc runs towards increasing angles.
    pub fn sweep(&self) -> bool {
        self.theta1 >= self.theta0
    }

    /// Position at angle `theta`.
    pub fn pos(&self, theta: f64) -> Point {
        let (sin_t, cos_t) = theta.sin_cos();
        let (sin_r, cos_r) = self.rotation.sin_cos();
        Point::new(
            self.center.x + self.rx * cos_t * cos_r - self.ry * sin_t * sin_r,
            self.center.y + self.rx * cos_t * sin_r + self.ry * sin_t * cos_r,
        )
    }

    /// Derivative of the position with respect to the angle, oriented along
    /// the direction of travel.
    pub fn deriv(&self, theta: f64) -> Point {
        let (sin_t, cos_t) = theta.sin_cos();
        let (sin_r, cos_r) = self.rotation.sin_cos();
        let d = Point::new(
            -self.rx * sin_t * cos_r - self.ry * cos_t * sin_r,
            -self.rx * sin_t * sin_r + self.ry * cos_t * cos_r,
        );
        if self.sweep() {
            d
        } else {
            -d
        }
    }

    /// Second derivative of the position with respect to the angle.
    pub fn deriv2(&self, theta: f64) -> Point {
        let (sin_t, cos_t) = theta.sin_cos();
        let (sin_r, cos_r) = self.rotation.sin_cos();
        Point::new(
            -self.rx * cos_t * cos_r + self.ry * sin_t * sin_r,
            -self.rx * cos_t * sin_r - self.ry * sin_t * cos_r,
        )
    }

    /// Signed radius of curvature at `theta`, positive for counter-clockwise
    /// arcs. `None` for a flattened ellipse.
    pub fn curvature_radius(&self, theta: f64) -> Option<f64> {
        let dp = self.deriv(theta);
        let ddp = self.deriv2(theta);
        let a = dp.cross(ddp);
        if a == 0.0 {
            return None;
        }
        Some(dp.length_squared().powf(1.5) / a)
    }

    /// Normal at `theta` of length `d`, to the right of the direction of
    /// travel.
    pub fn normal(&self, theta: f64, d: f64) -> Point {
        self.deriv(theta).rot90_cw().with_length(d)
    }

    /// Arc length by Gauss-Legendre quadrature.
    pub fn length(&self) -> f64 {
        let (lo, hi) = if self.theta0 <= self.theta1 {
            (self.theta0, self.theta1)
        } else {
            (self.theta1, self.theta0)
        };
        gauss_legendre5(&|theta| self.deriv(theta).length(), lo, hi)
    }

    /// Splits the arc at angle `theta`.
    ///
    /// Returns the split point and the large-arc flags of the two halves, or
    /// `None` when `theta` lies outside the arc.
    pub fn split(&self, theta: f64) -> Option<(Point, bool, bool)> {
        if !angle_between(theta, self.theta0, self.theta1) {
            return None;
        }
        // Bring theta onto the same turn as the arc.
        let offset = angle_norm(theta - self.theta0);
        let theta = if self.sweep() {
            self.theta0 + offset
        } else {
            self.theta0 - angle_norm(-offset)
        };
        let large0 = (theta - self.theta0).abs() > PI;
        let large1 = (self.theta1 - theta).abs() > PI;
        Some((self.pos(theta), large0, large1))
    }

    /// Tight bounding box.
    pub fn bounds(&self) -> Rect {
        let mut rect = Rect::from_points(self.pos(self.theta0), self.pos(self.theta1));
        let (sin_r, cos_r) = self.rotation.sin_cos();
        let theta_x = (-self.ry * sin_r).atan2(self.rx * cos_r);
        let theta_y = (self.ry * cos_r).atan2(self.rx * sin_r);
        for theta in [theta_x, theta_x + PI, theta_y, theta_y + PI] {
            if angle_between(theta, self.theta0, self.theta1) {
                rect.add_point(self.pos(theta));
            }
        }
        rect
    }
}
