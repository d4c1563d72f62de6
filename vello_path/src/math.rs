// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Numeric kernel: root finding, quadrature and arc length parametrization.

use core::f64::consts::TAU;

use smallvec::SmallVec;

/// Maximum number of bisection steps in [`bisect`].
const BISECTION_ITERATIONS: usize = 100;

/// Relative tolerance at which [`bisect`] stops.
const BISECTION_TOLERANCE: f64 = 1e-3;

/// Solves `a x² + b x + c = 0` for real `x`.
///
/// Roots are returned in ascending order, so the first slot is filled before
/// the second. A double root is reported once. When every coefficient is zero
/// every `x` is a solution; this is reported as `(Some(0.0), None)`.
///
/// The larger-magnitude root is computed first and the other one is derived
/// from it by Vieta's formula (the "citardauq" form), which avoids the
/// catastrophic cancellation of the textbook formula when `b² ≫ 4ac`.
pub fn solve_quadratic(a: f64, b: f64, c: f64) -> (Option<f64>, Option<f64>) {
    if a == 0.0 {
        if b == 0.0 {
            if c == 0.0 {
                return (Some(0.0), None);
            }
            return (None, None);
        }
        return (Some(-c / b), None);
    } else if c == 0.0 {
        let r = -b / a;
        return match r.partial_cmp(&0.0) {
            Some(core::cmp::Ordering::Less) => (Some(r), Some(0.0)),
            Some(core::cmp::Ordering::Greater) => (Some(0.0), Some(r)),
            _ => (Some(0.0), None),
        };
    } else if b == 0.0 {
        let s = -c / a;
        if s < 0.0 {
            return (None, None);
        }
        let r = s.sqrt();
        return (Some(-r), Some(r));
    }

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 || !discriminant.is_finite() {
        return (None, None);
    } else if discriminant == 0.0 {
        return (Some(-b / (2.0 * a)), None);
    }

    let q = discriminant.sqrt().copysign(b);
    let x1 = -(b + q) / (2.0 * a);
    let x2 = c / (a * x1);
    if x1 < x2 {
        (Some(x1), Some(x2))
    } else {
        (Some(x2), Some(x1))
    }
}

/// Real roots of `a x² + b x + c` that are valid curve parameters, in `[0, 1)`.
///
/// An all-zero polynomial yields the single parameter `0`.
pub fn solve_quadratic_unit(a: f64, b: f64, c: f64) -> SmallVec<[f64; 2]> {
    let (x1, x2) = solve_quadratic(a, b, c);
    [x1, x2]
        .into_iter()
        .flatten()
        .filter(|x| (0.0..1.0).contains(x))
        .collect()
}

/// A quadrature rule integrating `f` over `[a, b]`.
pub type Quadrature = fn(&dyn Fn(f64) -> f64, f64, f64) -> f64;

// Nodes and weights from https://pomax.github.io/bezierinfo/legendre-gauss.html
const GL3: [(f64, f64); 3] = [
    (-0.774_596_669_241_483_4, 0.555_555_555_555_555_6),
    (0.0, 0.888_888_888_888_888_8),
    (0.774_596_669_241_483_4, 0.555_555_555_555_555_6),
];

const GL5: [(f64, f64); 5] = [
    (-0.906_179_845_938_664, 0.236_926_885_056_189_1),
    (-0.538_469_310_105_683_1, 0.478_628_670_499_366_5),
    (0.0, 0.568_888_888_888_888_9),
    (0.538_469_310_105_683_1, 0.478_628_670_499_366_5),
    (0.906_179_845_938_664, 0.236_926_885_056_189_1),
];

const GL7: [(f64, f64); 7] = [
    (-0.949_107_912_342_758_5, 0.129_484_966_168_869_7),
    (-0.741_531_185_599_394_4, 0.279_705_391_489_276_7),
    (-0.405_845_151_377_397_2, 0.381_830_050_505_118_9),
    (0.0, 0.417_959_183_673_469_4),
    (0.405_845_151_377_397_2, 0.381_830_050_505_118_9),
    (0.741_531_185_599_394_4, 0.279_705_391_489_276_7),
    (0.949_107_912_342_758_5, 0.129_484_966_168_869_7),
];

#[inline]
fn gauss_legendre(table: &[(f64, f64)], f: &dyn Fn(f64) -> f64, a: f64, b: f64) -> f64 {
    let c = (b - a) / 2.0;
    let d = (a + b) / 2.0;
    c * table.iter().map(|&(x, w)| w * f(c * x + d)).sum::<f64>()
}

/// Three point Gauss-Legendre quadrature of `f` over `[a, b]`.
pub fn gauss_legendre3(f: &dyn Fn(f64) -> f64, a: f64, b: f64) -> f64 {
    gauss_legendre(&GL3, f, a, b)
}

/// Five point Gauss-Legendre quadrature of `f` over `[a, b]`.
///
/// This is the rule used for arc lengths.
pub fn gauss_legendre5(f: &dyn Fn(f64) -> f64, a: f64, b: f64) -> f64 {
    gauss_legendre(&GL5, f, a, b)
}

/// Seven point Gauss-Legendre quadrature of `f` over `[a, b]`.
pub fn gauss_legendre7(f: &dyn Fn(f64) -> f64, a: f64, b: f64) -> f64 {
    gauss_legendre(&GL7, f, a, b)
}

/// Finds `x` in `[xmin, xmax]` with `f(x) = y` for monotonically increasing `f`.
///
/// Stops when either `x` or `f(x)` is within 0.1% of its range, or after a
/// fixed number of halvings.
pub fn bisect(f: &dyn Fn(f64) -> f64, y: f64, mut xmin: f64, mut xmax: f64) -> f64 {
    let tolerance_x = (xmax - xmin).abs() * BISECTION_TOLERANCE;
    let tolerance_y = (f(xmax) - f(xmin)).abs() * BISECTION_TOLERANCE;
    let mut x = (xmin + xmax) / 2.0;
    for _ in 0..BISECTION_ITERATIONS {
        x = (xmin + xmax) / 2.0;
        let dy = f(x) - y;
        if dy.abs() < tolerance_y || (xmax - xmin).abs() / 2.0 < tolerance_x {
            break;
        } else if dy > 0.0 {
            xmax = x;
        } else {
            xmin = x;
        }
    }
    x
}

/// A cubic fit of the arc length `L(x)` of a curve with speed `speed`, over
/// `[xmin, xmax]`.
///
/// The length is sampled by quadrature at one third, two thirds and the end of
/// the interval; the cubic `a t³ + b t² + c t` (with `t` the normalized
/// parameter) through these samples and the origin is the
/// Walter-Fournier approximation. Returns the fit and the total length.
pub fn polynomial_approx3(
    quadrature: Quadrature,
    speed: &dyn Fn(f64) -> f64,
    xmin: f64,
    xmax: f64,
) -> (CubicFit, f64) {
    let dx = xmax - xmin;
    let y1 = quadrature(speed, xmin, xmin + dx / 3.0).abs();
    let y2 = quadrature(speed, xmin, xmin + 2.0 * dx / 3.0).abs();
    let y3 = quadrature(speed, xmin, xmax).abs();

    // [y1; y2; y3] = [1/27, 1/9, 1/3; 8/27, 4/9, 2/3; 1, 1, 1] * [a; b; c]
    let a = 13.5 * y1 - 13.5 * y2 + 4.5 * y3;
    let b = -22.5 * y1 + 18.0 * y2 - 4.5 * y3;
    let c = 9.0 * y1 - 4.5 * y2 + y3;
    let fit = CubicFit {
        a,
        b,
        c,
        scale: 1.0 / dx,
        x0: xmin,
        out0: 0.0,
        out_scale: 1.0,
    };
    (fit, y3)
}

/// A cubic fit of the inverse arc length, mapping a length `s` in
/// `[0, total]` to the curve parameter in `[xmin, xmax]`.
///
/// The parameters at one and two thirds of the total length are located by
/// bisection once; evaluating the fit afterwards is a polynomial evaluation.
/// Returns the fit and the total length.
pub fn inv_polynomial_approx3(
    quadrature: Quadrature,
    speed: &dyn Fn(f64) -> f64,
    xmin: f64,
    xmax: f64,
) -> (CubicFit, f64) {
    let length = |t: f64| quadrature(speed, xmin, xmin + (xmax - xmin) * t).abs();
    let total = length(1.0);
    if total == 0.0 || !total.is_finite() {
        let fit = CubicFit {
            a: 0.0,
            b: 0.0,
            c: 0.0,
            scale: 0.0,
            x0: 0.0,
            out0: xmin,
            out_scale: 0.0,
        };
        return (fit, 0.0);
    }
    let t1 = bisect(&length, total / 3.0, 0.0, 1.0);
    let t2 = bisect(&length, 2.0 * total / 3.0, 0.0, 1.0);
    let t3 = 1.0;

    // The inverse of the matrix in `polynomial_approx3`.
    let a = 0.5 * (27.0 * t1 - 27.0 * t2 + 9.0 * t3);
    let b = 0.5 * (-45.0 * t1 + 36.0 * t2 - 9.0 * t3);
    let c = 0.5 * (18.0 * t1 - 9.0 * t2 + 2.0 * t3);
    let fit = CubicFit {
        a,
        b,
        c,
        scale: 1.0 / total,
        x0: 0.0,
        out0: xmin,
        out_scale: xmax - xmin,
    };
    (fit, total)
}

/// The cubic `out0 + out_scale * (a u³ + b u² + c u)` with `u = (x - x0) * scale`.
#[derive(Clone, Copy, Debug)]
pub struct CubicFit {
    a: f64,
    b: f64,
    c: f64,
    scale: f64,
    x0: f64,
    out0: f64,
    out_scale: f64,
}

impl CubicFit {
    pub fn eval(&self, x: f64) -> f64 {
        let u = (x - self.x0) * self.scale;
        self.out0 + self.out_scale * (((self.a * u + self.b) * u + self.c) * u)
    }
}

/// Normalizes an angle in radians into `[0, 2π)`.
pub fn angle_norm(theta: f64) -> f64 {
    let theta = theta % TAU;
    if theta < 0.0 {
        // A tiny negative remainder rounds up to exactly 2π.
        let theta = theta + TAU;
        if theta >= TAU {
            return 0.0;
        }
        return theta;
    }
    theta
}

/// Whether `theta` lies on the angular span running from `lower` to `upper`,
/// end points included.
///
/// The span runs counter-clockwise when `lower <= upper` and clockwise
/// otherwise; all three angles may lie outside `[0, 2π)`.
pub fn angle_between(theta: f64, lower: f64, upper: f64) -> bool {
    if (upper - lower).abs() >= TAU {
        return true;
    }
    let ccw = lower <= upper;
    let theta = angle_norm(theta - lower);
    let upper = angle_norm(upper - lower);
    if ccw {
        theta <= upper
    } else {
        theta >= upper || theta == 0.0
    }
}

/// Whether two angles denote the same direction, to within `epsilon`.
pub fn angle_equal(a: f64, b: f64, epsilon: f64) -> bool {
    let d = angle_norm(a - b);
    d < epsilon || TAU - d < epsilon
}
