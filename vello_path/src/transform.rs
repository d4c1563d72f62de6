// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::f64::consts::PI;
use core::ops::Mul;

use bytemuck::{Pod, Zeroable};
use peniko::kurbo;

use crate::Point;

/// Affine transformation matrix.
///
/// A point `(x, y)` maps to
/// `(m[0] x + m[2] y + t[0], m[1] x + m[3] y + t[1])`.
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Transform {
    /// 2x2 matrix, column major.
    pub matrix: [f64; 4],
    /// Translation.
    pub translation: [f64; 2],
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    /// Identity transform.
    pub const IDENTITY: Self = Self {
        matrix: [1.0, 0.0, 0.0, 1.0],
        translation: [0.0; 2],
    };

    pub const fn new(matrix: [f64; 4], translation: [f64; 2]) -> Self {
        Self {
            matrix,
            translation,
        }
    }

    pub const fn translate(x: f64, y: f64) -> Self {
        Self::new([1.0, 0.0, 0.0, 1.0], [x, y])
    }

    pub const fn scale(sx: f64, sy: f64) -> Self {
        Self::new([sx, 0.0, 0.0, sy], [0.0, 0.0])
    }

    /// Counter-clockwise rotation by `theta` radians around the origin.
    pub fn rotate(theta: f64) -> Self {
        let (sin, cos) = theta.sin_cos();
        Self::new([cos, sin, -sin, cos], [0.0, 0.0])
    }

    /// Counter-clockwise rotation by `theta` radians around `center`.
    pub fn rotate_about(theta: f64, center: Point) -> Self {
        Self::translate(center.x, center.y)
            * Self::rotate(theta)
            * Self::translate(-center.x, -center.y)
    }

    /// Shear by the factors `kx` (x grows with y) and `ky` (y grows with x).
    pub const fn skew(kx: f64, ky: f64) -> Self {
        Self::new([1.0, ky, kx, 1.0], [0.0, 0.0])
    }

    /// Creates a transform from a kurbo affine matrix.
    pub fn from_kurbo(transform: &kurbo::Affine) -> Self {
        let c = transform.as_coeffs();
        Self {
            matrix: [c[0], c[1], c[2], c[3]],
            translation: [c[4], c[5]],
        }
    }

    /// Converts the transform to a kurbo affine matrix.
    pub fn to_kurbo(&self) -> kurbo::Affine {
        kurbo::Affine::new([
            self.matrix[0],
            self.matrix[1],
            self.matrix[2],
            self.matrix[3],
            self.translation[0],
            self.translation[1],
        ])
    }

    pub fn determinant(&self) -> f64 {
        self.matrix[0] * self.matrix[3] - self.matrix[1] * self.matrix[2]
    }

    /// The inverse transform, or `None` when the matrix is singular.
    pub fn inverse(&self) -> Option<Self> {
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let inv_det = det.recip();
        let [a, b, c, d] = self.matrix;
        let [x, y] = self.translation;
        Some(Self {
            matrix: [d * inv_det, -b * inv_det, -c * inv_det, a * inv_det],
            translation: [(c * y - d * x) * inv_det, (b * x - a * y) * inv_det],
        })
    }

    /// Applies the transform to a point.
    #[inline]
    pub fn apply(&self, p: Point) -> Point {
        let z = self.matrix;
        let x = z[0] * p.x + z[2] * p.y + self.translation[0];
        let y = z[1] * p.x + z[3] * p.y + self.translation[1];
        Point { x, y }
    }

    /// Applies the linear part of the transform to a vector.
    #[inline]
    pub fn apply_vector(&self, v: Point) -> Point {
        let z = self.matrix;
        Point::new(z[0] * v.x + z[2] * v.y, z[1] * v.x + z[3] * v.y)
    }

    /// Maps the axes of an ellipse through the linear part of the transform.
    ///
    /// The image of an ellipse with radii `rx`, `ry` and rotation `phi` under
    /// `A = M R(phi) diag(rx, ry)` is the ellipse whose squared radii are the
    /// eigenvalues of `A Aᵀ`. The major axis direction is the eigenvector of
    /// the larger eigenvalue. Returns the new radii and rotation in `[0, π)`,
    /// plus whether the transform mirrors (and so flips the arc's sweep).
    pub fn transform_ellipse(&self, rx: f64, ry: f64, phi: f64) -> (f64, f64, f64, bool) {
        let (sin, cos) = phi.sin_cos();
        let [m0, m1, m2, m3] = self.matrix;
        // Columns of A.
        let a0 = Point::new((m0 * cos + m2 * sin) * rx, (m1 * cos + m3 * sin) * rx);
        let a1 = Point::new((-m0 * sin + m2 * cos) * ry, (-m1 * sin + m3 * cos) * ry);
        let s11 = a0.x * a0.x + a1.x * a1.x;
        let s12 = a0.x * a0.y + a1.x * a1.y;
        let s22 = a0.y * a0.y + a1.y * a1.y;

        let mean = (s11 + s22) / 2.0;
        let spread = ((s11 - s22) / 2.0).hypot(s12);
        let lambda1 = mean + spread;
        let lambda2 = (mean - spread).max(0.0);

        let axis = if s12 != 0.0 {
            Point::new(lambda1 - s22, s12)
        } else if s11 >= s22 {
            Point::new(1.0, 0.0)
        } else {
            Point::new(0.0, 1.0)
        };
        let mut rotation = axis.atan2();
        if rotation < 0.0 {
            rotation += PI;
        }
        if rotation >= PI {
            rotation -= PI;
        }
        (
            lambda1.sqrt(),
            lambda2.sqrt(),
            rotation,
            self.determinant() < 0.0,
        )
    }
}

impl Mul for Transform {
    type Output = Self;

    /// Composition; `(a * b).apply(p)` equals `a.apply(b.apply(p))`.
    #[inline]
    fn mul(self, other: Self) -> Self {
        Self {
            matrix: [
                self.matrix[0] * other.matrix[0] + self.matrix[2] * other.matrix[1],
                self.matrix[1] * other.matrix[0] + self.matrix[3] * other.matrix[1],
                self.matrix[0] * other.matrix[2] + self.matrix[2] * other.matrix[3],
                self.matrix[1] * other.matrix[2] + self.matrix[3] * other.matrix[3],
            ],
            translation: [
                self.matrix[0] * other.translation[0]
                    + self.matrix[2] * other.translation[1]
                    + self.translation[0],
                self.matrix[1] * other.translation[0]
                    + self.matrix[3] * other.translation[1]
                    + self.translation[1],
            ],
        }
    }
}

impl Mul<Point> for Transform {
    type Output = Point;

    #[inline]
    fn mul(self, p: Point) -> Point {
        self.apply(p)
    }
}

#[cfg(test)]
mod tests {
    use core::f64::consts::{FRAC_PI_2, FRAC_PI_4};

    use super::Transform;
    use crate::Point;

    fn assert_near(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn compose_and_invert() {
        let t = Transform::translate(1.0, 2.0) * Transform::rotate(FRAC_PI_2);
        let p = t.apply(Point::new(1.0, 0.0));
        assert!(p.is_near(Point::new(1.0, 3.0), 1e-12));
        let back = t.inverse().unwrap().apply(p);
        assert!(back.is_near(Point::new(1.0, 0.0), 1e-12));
        assert!(Transform::scale(0.0, 1.0).inverse().is_none());
    }

    #[test]
    fn rotate_about_center() {
        let t = Transform::rotate_about(FRAC_PI_2, Point::new(1.0, 1.0));
        assert!(t.apply(Point::new(2.0, 1.0)).is_near(Point::new(1.0, 2.0), 1e-12));
    }

    #[test]
    fn kurbo_round_trip() {
        let t = Transform::new([1.0, 2.0, 3.0, 4.0], [5.0, 6.0]);
        assert_eq!(Transform::from_kurbo(&t.to_kurbo()), t);
    }

    #[test]
    fn ellipse_axes() {
        // Scaling a circle gives an axis-aligned ellipse.
        let (rx, ry, rot, mirrored) = Transform::scale(2.0, 1.0).transform_ellipse(1.0, 1.0, 0.0);
        assert_near(rx, 2.0);
        assert_near(ry, 1.0);
        assert_near(rot, 0.0);
        assert!(!mirrored);

        // A tall ellipse reports its major axis along y.
        let (rx, ry, rot, _) = Transform::IDENTITY.transform_ellipse(1.0, 3.0, 0.0);
        assert_near(rx, 3.0);
        assert_near(ry, 1.0);
        assert_near(rot, FRAC_PI_2);

        let (rx, ry, rot, _) = Transform::rotate(FRAC_PI_4).transform_ellipse(2.0, 1.0, 0.0);
        assert_near(rx, 2.0);
        assert_near(ry, 1.0);
        assert_near(rot, FRAC_PI_4);

        let (.., mirrored) = Transform::scale(-1.0, 1.0).transform_ellipse(2.0, 1.0, 0.0);
        assert!(mirrored);
    }
}
