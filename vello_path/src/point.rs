// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Points and rectangles.

use core::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use bytemuck::{Pod, Zeroable};

/// A point (or vector) in the plane.
///
/// The y axis points up: rotating the direction of travel clockwise gives the
/// right-hand side of a path.
#[derive(Clone, Copy, Default, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Add for Point {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl AddAssign for Point {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Point {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl SubAssign for Point {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Mul<f64> for Point {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: f64) -> Self {
        Self {
            x: self.x * rhs,
            y: self.y * rhs,
        }
    }
}

impl Mul<Point> for f64 {
    type Output = Point;

    #[inline]
    fn mul(self, rhs: Point) -> Point {
        rhs * self
    }
}

impl Div<f64> for Point {
    type Output = Self;

    #[inline]
    fn div(self, rhs: f64) -> Self {
        Self {
            x: self.x / rhs,
            y: self.y / rhs,
        }
    }
}

impl Neg for Point {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl Point {
    /// The origin.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Unit vector at angle `theta` (radians) from the x axis.
    pub fn from_angle(theta: f64) -> Self {
        let (sin, cos) = theta.sin_cos();
        Self::new(cos, sin)
    }

    #[inline]
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// The z component of the 3D cross product, positive when `other` lies
    /// counter-clockwise of `self`.
    #[inline]
    pub fn cross(self, other: Self) -> f64 {
        (self.x * other.y) - (self.y * other.x)
    }

    #[inline]
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    #[inline]
    pub fn length_squared(self) -> f64 {
        self.dot(self)
    }

    #[inline]
    pub fn distance(self, other: Self) -> f64 {
        (self - other).length()
    }

    /// Linear interpolation, `t = 0` gives `self`.
    #[inline]
    pub fn lerp(self, other: Self, t: f64) -> Self {
        let x = self.x + (other.x - self.x) * t;
        let y = self.y + (other.y - self.y) * t;
        Self { x, y }
    }

    pub fn midpoint(self, other: Self) -> Self {
        self.lerp(other, 0.5)
    }

    /// Vector with the same direction and length `length`.
    ///
    /// The zero vector stays zero.
    pub fn with_length(self, length: f64) -> Self {
        let d = self.length();
        if d == 0.0 {
            return Self::ZERO;
        }
        self * (length / d)
    }

    pub fn normalize(self) -> Self {
        self.with_length(1.0)
    }

    /// Rotates by 90 degrees clockwise.
    #[inline]
    pub fn rot90_cw(self) -> Self {
        Self::new(self.y, -self.x)
    }

    /// Rotates by 90 degrees counter-clockwise.
    #[inline]
    pub fn rot90_ccw(self) -> Self {
        Self::new(-self.y, self.x)
    }

    /// Rotates by `phi` radians counter-clockwise around `center`.
    pub fn rotate_around(self, phi: f64, center: Self) -> Self {
        let (sin, cos) = phi.sin_cos();
        let d = self - center;
        center + Self::new(cos * d.x - sin * d.y, sin * d.x + cos * d.y)
    }

    /// Angle from the x axis in radians, in `(-π, π]`.
    #[inline]
    pub fn atan2(self) -> f64 {
        self.y.atan2(self.x)
    }

    pub fn is_nan(self) -> bool {
        self.x.is_nan() || self.y.is_nan()
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Both coordinates differ by less than `epsilon`.
    pub fn is_near(self, other: Self, epsilon: f64) -> bool {
        (self.x - other.x).abs() < epsilon && (self.y - other.y).abs() < epsilon
    }

    pub fn min(self, other: Self) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y))
    }

    pub fn max(self, other: Self) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y))
    }
}

/// An axis-aligned rectangle given by its two corners.
#[derive(Clone, Copy, Default, Debug, PartialEq)]
pub struct Rect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Rect {
    pub const fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// The smallest rectangle containing both points.
    pub fn from_points(a: Point, b: Point) -> Self {
        let min = a.min(b);
        let max = a.max(b);
        Self::new(min.x, min.y, max.x, max.y)
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    /// Grows the rectangle to include `p`.
    pub fn add_point(&mut self, p: Point) {
        self.x0 = self.x0.min(p.x);
        self.y0 = self.y0.min(p.y);
        self.x1 = self.x1.max(p.x);
        self.y1 = self.y1.max(p.y);
    }

    pub fn union(&self, other: &Self) -> Self {
        Self::new(
            self.x0.min(other.x0),
            self.y0.min(other.y0),
            self.x1.max(other.x1),
            self.y1.max(other.y1),
        )
    }

    pub fn contains(&self, p: Point) -> bool {
        self.x0 <= p.x && p.x <= self.x1 && self.y0 <= p.y && p.y <= self.y1
    }
}

#[cfg(test)]
mod tests {
    use super::{Point, Rect};

    #[test]
    fn rotations() {
        let p = Point::new(1.0, 2.0);
        assert_eq!(p.rot90_cw(), Point::new(2.0, -1.0));
        assert_eq!(p.rot90_ccw(), Point::new(-2.0, 1.0));
        assert_eq!(p.rot90_cw().rot90_ccw(), p);
        let center = Point::new(1.0, 0.0);
        let q = Point::new(2.0, 0.0).rotate_around(core::f64::consts::FRAC_PI_2, center);
        assert!(q.is_near(Point::new(1.0, 1.0), 1e-12));
    }

    #[test]
    fn with_length_of_zero_vector() {
        assert_eq!(Point::ZERO.with_length(3.0), Point::ZERO);
        let v = Point::new(3.0, 4.0).with_length(10.0);
        assert!(v.is_near(Point::new(6.0, 8.0), 1e-12));
    }

    #[test]
    fn cross_sign() {
        let x = Point::new(1.0, 0.0);
        let y = Point::new(0.0, 1.0);
        assert!(x.cross(y) > 0.0);
        assert!(y.cross(x) < 0.0);
    }

    #[test]
    fn rect_grows() {
        let mut r = Rect::from_points(Point::new(2.0, 3.0), Point::new(0.0, 1.0));
        assert_eq!(r, Rect::new(0.0, 1.0, 2.0, 3.0));
        r.add_point(Point::new(-1.0, 5.0));
        assert_eq!(r, Rect::new(-1.0, 1.0, 2.0, 5.0));
        assert_eq!(r.width(), 3.0);
        assert!(r.contains(Point::new(0.0, 4.0)));
    }
}
