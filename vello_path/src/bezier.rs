// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Quadratic and cubic Bézier segments.

use smallvec::SmallVec;

use crate::math::{gauss_legendre5, solve_quadratic, solve_quadratic_unit};
use crate::{Config, Point, Rect};

/// A quadratic Bézier segment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QuadBez {
    pub p0: Point,
    pub p1: Point,
    pub p2: Point,
}

/// A cubic Bézier segment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CubicBez {
    pub p0: Point,
    pub p1: Point,
    pub p2: Point,
    pub p3: Point,
}

impl QuadBez {
    pub const fn new(p0: Point, p1: Point, p2: Point) -> Self {
        Self { p0, p1, p2 }
    }

    pub fn eval(&self, t: f64) -> Point {
        let mt = 1.0 - t;
        self.p0 * (mt * mt) + self.p1 * (2.0 * mt * t) + self.p2 * (t * t)
    }

    pub fn deriv(&self, t: f64) -> Point {
        (self.p1 - self.p0) * (2.0 * (1.0 - t)) + (self.p2 - self.p1) * (2.0 * t)
    }

    pub fn deriv2(&self) -> Point {
        (self.p0 - self.p1 * 2.0 + self.p2) * 2.0
    }

    /// Splits at `t` by de Casteljau's algorithm.
    pub fn subdivide(&self, t: f64) -> (Self, Self) {
        debug_assert!((0.0..=1.0).contains(&t), "split parameter {t} outside [0, 1]");
        let q0 = self.p0.lerp(self.p1, t);
        let q1 = self.p1.lerp(self.p2, t);
        let mid = q0.lerp(q1, t);
        (Self::new(self.p0, q0, mid), Self::new(mid, q1, self.p2))
    }

    /// The piece of the curve between `t0` and `t1`.
    pub fn subsegment(&self, t0: f64, t1: f64) -> Self {
        let (_, tail) = self.subdivide(t0);
        if t0 >= 1.0 || t1 >= 1.0 {
            return tail;
        }
        let (head, _) = tail.subdivide(((t1 - t0) / (1.0 - t0)).clamp(0.0, 1.0));
        head
    }

    /// The exactly equivalent cubic.
    pub fn raise(&self) -> CubicBez {
        CubicBez::new(
            self.p0,
            self.p0.lerp(self.p1, 2.0 / 3.0),
            self.p2.lerp(self.p1, 2.0 / 3.0),
            self.p2,
        )
    }

    /// Arc length in closed form.
    ///
    /// Collinear control points, where the closed form divides by zero, are
    /// measured as straight runs out to the turning point and back.
    pub fn length(&self) -> f64 {
        let a = self.p0 - self.p1 * 2.0 + self.p2;
        let b = (self.p1 - self.p0) * 2.0;
        let aa = 4.0 * a.dot(a);
        let bb = 4.0 * a.dot(b);
        let cc = b.dot(b);
        if aa <= 1e-24 * cc || aa == 0.0 {
            // p1 is the midpoint of p0 and p2
            return self.p0.distance(self.p2);
        }

        let s_abc = 2.0 * (aa + bb + cc).sqrt();
        let a2 = aa.sqrt();
        let a32 = 2.0 * aa * a2;
        let c2 = 2.0 * cc.sqrt();
        let ba = bb / a2;
        let num = 2.0 * a2 + ba + s_abc;
        let den = ba + c2;
        if num > 0.0 && den > 0.0 {
            let length = (a32 * s_abc
                + a2 * bb * (s_abc - c2)
                + (4.0 * cc * aa - bb * bb) * (num / den).ln())
                / (4.0 * a32);
            if length.is_finite() {
                return length;
            }
        }
        // The curve runs along a line, possibly turning back where B' = 0.
        let t = ((self.p0 - self.p1).dot(a) / a.dot(a)).clamp(0.0, 1.0);
        let turn = self.eval(t);
        self.p0.distance(turn) + turn.distance(self.p2)
    }

    /// Tight bounding box.
    pub fn bounds(&self) -> Rect {
        let mut rect = Rect::from_points(self.p0, self.p2);
        let den = self.p0 - self.p1 * 2.0 + self.p2;
        for (num, den) in [(self.p0.x - self.p1.x, den.x), (self.p0.y - self.p1.y, den.y)] {
            if den != 0.0 {
                let t = num / den;
                if 0.0 < t && t < 1.0 {
                    rect.add_point(self.eval(t));
                }
            }
        }
        rect
    }
}

impl CubicBez {
    pub const fn new(p0: Point, p1: Point, p2: Point, p3: Point) -> Self {
        Self { p0, p1, p2, p3 }
    }

    pub fn eval(&self, t: f64) -> Point {
        let mt = 1.0 - t;
        self.p0 * (mt * mt * mt)
            + self.p1 * (3.0 * mt * mt * t)
            + self.p2 * (3.0 * mt * t * t)
            + self.p3 * (t * t * t)
    }

    pub fn deriv(&self, t: f64) -> Point {
        let mt = 1.0 - t;
        (self.p1 - self.p0) * (3.0 * mt * mt)
            + (self.p2 - self.p1) * (6.0 * mt * t)
            + (self.p3 - self.p2) * (3.0 * t * t)
    }

    pub fn deriv2(&self, t: f64) -> Point {
        (self.p0 - self.p1 * 2.0 + self.p2) * (6.0 * (1.0 - t))
            + (self.p1 - self.p2 * 2.0 + self.p3) * (6.0 * t)
    }

    /// Signed radius of curvature at `t`: positive when the curve turns
    /// counter-clockwise, negative when it turns clockwise. `None` where the
    /// curve is locally straight.
    pub fn curvature_radius(&self, t: f64) -> Option<f64> {
        let dp = self.deriv(t);
        let ddp = self.deriv2(t);
        let a = dp.cross(ddp);
        if a == 0.0 {
            return None;
        }
        Some(dp.length_squared().powf(1.5) / a)
    }

    /// Tangent direction at `t`.
    ///
    /// At the end points a vanishing derivative falls back to the next distinct
    /// control point, so cusps caused by coincident control points still get a
    /// direction. Returns zero only when all control points coincide.
    pub fn tangent(&self, t: f64) -> Point {
        let candidates = if t <= 0.0 {
            [self.p1 - self.p0, self.p2 - self.p0, self.p3 - self.p0]
        } else if t >= 1.0 {
            [self.p3 - self.p2, self.p3 - self.p1, self.p3 - self.p0]
        } else {
            [self.deriv(t), self.deriv2(t), self.p3 - self.p0]
        };
        candidates
            .into_iter()
            .find(|v| *v != Point::ZERO)
            .unwrap_or(Point::ZERO)
    }

    /// Normal at `t` of length `d`, pointing to the right of the direction of
    /// travel.
    pub fn normal(&self, t: f64, d: f64) -> Point {
        self.tangent(t).rot90_cw().with_length(d)
    }

    /// Splits at `t` by de Casteljau's algorithm.
    pub fn subdivide(&self, t: f64) -> (Self, Self) {
        debug_assert!((0.0..=1.0).contains(&t), "split parameter {t} outside [0, 1]");
        let q0 = self.p0.lerp(self.p1, t);
        let q1 = self.p1.lerp(self.p2, t);
        let q2 = self.p2.lerp(self.p3, t);
        let r0 = q0.lerp(q1, t);
        let r1 = q1.lerp(q2, t);
        let mid = r0.lerp(r1, t);
        (
            Self::new(self.p0, q0, r0, mid),
            Self::new(mid, r1, q2, self.p3),
        )
    }

    /// The piece of the curve between `t0` and `t1`.
    pub fn subsegment(&self, t0: f64, t1: f64) -> Self {
        let (_, tail) = self.subdivide(t0);
        if t0 >= 1.0 || t1 >= 1.0 {
            return tail;
        }
        let (head, _) = tail.subdivide(((t1 - t0) / (1.0 - t0)).clamp(0.0, 1.0));
        head
    }

    /// Parameters in `(0, 1)` where the curvature changes sign, in ascending
    /// order.
    ///
    /// These are the roots of `B' × B''`, a quadratic after dropping the
    /// common factor.
    pub fn inflections(&self) -> SmallVec<[f64; 2]> {
        let a = self.p3 - self.p0 + (self.p1 - self.p2) * 3.0;
        let b = self.p0 - self.p1 * 2.0 + self.p2;
        let c = self.p1 - self.p0;
        solve_quadratic_unit(a.y * b.x - a.x * b.y, a.y * c.x - a.x * c.y, b.y * c.x - b.x * c.y)
            .into_iter()
            .filter(|&t| t > 0.0)
            .collect()
    }

    /// The parameter range around the inflection point `t` within which the
    /// curve stays within `config.tolerance` of a straight line.
    ///
    /// Near an inflection the distance from the tangent grows as `s3 t³`
    /// (Hain et al., "Fast, precise flattening of cubic Bézier path and offset
    /// curves"), giving a half width of `∛(tolerance / s3)` in the parameter
    /// of the remaining curve. The range may extend past `[0, 1]`.
    pub fn inflection_range(&self, t: f64, config: &Config) -> (f64, f64) {
        debug_assert!((0.0..=1.0).contains(&t), "inflection {t} outside [0, 1]");
        let tail = if t > 0.0 { self.subdivide(t).1 } else { *self };
        let ns = tail.p3 - tail.p0;
        let mut nr = tail.p1 - tail.p0;
        if nr.is_near(Point::ZERO, config.epsilon) {
            // The velocity at the start vanishes, use the direction to p2.
            nr = tail.p2 - tail.p0;
            if nr.is_near(Point::ZERO, config.epsilon) {
                // p0 == p1 == p2, a straight line
                return (0.0, 1.0);
            }
        }
        let s3 = ns.cross(nr).abs() / nr.length();
        if s3 < config.epsilon {
            return (0.0, 1.0);
        }
        let tf = (config.tolerance / s3).cbrt();
        (t - tf * (1.0 - t), t + tf * (1.0 - t))
    }

    /// Arc length by Gauss-Legendre quadrature, one integration per stretch
    /// between inflection points.
    pub fn length(&self) -> f64 {
        let speed = |t: f64| self.deriv(t).length();
        let mut length = 0.0;
        let mut t0 = 0.0;
        for t in self.inflections().into_iter().chain([1.0]) {
            length += gauss_legendre5(&speed, t0, t);
            t0 = t;
        }
        length
    }

    /// Tight bounding box.
    pub fn bounds(&self) -> Rect {
        let mut rect = Rect::from_points(self.p0, self.p3);
        let a = self.p3 - self.p0 + (self.p1 - self.p2) * 3.0;
        let b = (self.p0 - self.p1 * 2.0 + self.p2) * 2.0;
        let c = self.p1 - self.p0;
        for (a, b, c) in [(a.x, b.x, c.x), (a.y, b.y, c.y)] {
            let (t1, t2) = solve_quadratic(a, b, c);
            for t in [t1, t2].into_iter().flatten() {
                if 0.0 < t && t < 1.0 {
                    rect.add_point(self.eval(t));
                }
            }
        }
        rect
    }

    /// Whether the control points coincide in a way that leaves no area to
    /// draw (`p0 == p3` and `p0` equal to one of the controls).
    pub fn is_degenerate(&self) -> bool {
        self.p0 == self.p3 && (self.p0 == self.p1 || self.p0 == self.p2)
    }
}

impl From<QuadBez> for CubicBez {
    fn from(q: QuadBez) -> Self {
        q.raise()
    }
}
