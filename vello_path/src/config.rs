// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

/// Numeric settings shared by the geometry algorithms.
///
/// Every operation that approximates geometry or compares coordinates takes a
/// `&Config`, so independent callers can use different settings at the same
/// time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    /// Maximum distance between a curve and its flattened polyline, in path
    /// units.
    pub tolerance: f64,
    /// Coordinates closer than this are considered equal.
    pub epsilon: f64,
    /// Number of quadratic Béziers used to approximate an elliptical arc.
    pub arc_segments: usize,
    /// Number of decimals written when serializing to SVG path data.
    pub precision: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tolerance: 0.01,
            epsilon: 1e-10,
            arc_segments: 16,
            precision: 8,
        }
    }
}

impl Config {
    /// Builder method for setting the flattening tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Builder method for setting the equality threshold.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Builder method for setting the number of segments per arc.
    pub fn with_arc_segments(mut self, arc_segments: usize) -> Self {
        self.arc_segments = arc_segments.max(1);
        self
    }

    /// Builder method for setting the serialization precision.
    pub fn with_precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    /// Whether two scalars are equal to within `epsilon`.
    #[inline]
    pub fn equal(&self, a: f64, b: f64) -> bool {
        (a - b).abs() < self.epsilon
    }
}
