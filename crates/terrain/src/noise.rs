//! One-dimensional pseudo-noise built from three fixed sine harmonics.

use std::f64::consts::{E, PI};

const A: f64 = -1.8;
const B: f64 = -1.5;
const C: f64 = 0.4;
const D: f64 = 2.6;
const F: f64 = 0.9;
const G: f64 = 0.4;

/// Lower bound of [`noise`]: `1 - 0.5 * (|A| + |C| + |F|)`.
pub const MIN: f64 = 1.0 - 0.5 * (1.8 + 0.4 + 0.9);
/// Upper bound of [`noise`].
pub const MAX: f64 = 1.0 + 0.5 * (1.8 + 0.4 + 0.9);

/// Deterministic noise sample at `x` for `seed`. The seed shifts the
/// phase of all three harmonics together.
///
/// Total over all finite inputs and bounded by [`MIN`]..=[`MAX`].
pub fn noise(x: f64, seed: i64) -> f64 {
    let t = x + seed as f64;
    let sum = A * (B * t).sin() - C * (D * E * t).sin() + F * (G * PI * t).sin();
    1.0 + 0.5 * sum
}
