//! Angle math helpers.

use std::f32::consts::TAU;

/// Normalize an angle into `[0, 2π)`.
#[inline]
pub fn normalize_angle(theta: f32) -> f32 {
    let wrapped = theta.rem_euclid(TAU);
    // rem_euclid can return exactly TAU when theta is a tiny negative value
    if wrapped >= TAU { wrapped - TAU } else { wrapped }
}
