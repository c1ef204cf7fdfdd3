// src/angle.rs

use std::f64::consts::PI;

/// Wrap an angle into (-pi, pi] via atan2(sin, cos).
///
/// atan2 itself may return -pi for inputs sitting exactly on the branch cut;
/// that value is folded onto +pi so the half-open interval holds.
#[inline]
pub fn normalize(theta: f64) -> f64 {
    let w = theta.sin().atan2(theta.cos());
    if w <= -PI {
        PI
    } else {
        w
    }
}

/// Signed shortest-path difference `to - from`, in (-pi, pi].
#[inline]
pub fn shortest_delta(from: f64, to: f64) -> f64 {
    normalize(to - from)
}

/// Absolute shortest-path separation between two angles, in [0, pi].
#[inline]
pub fn separation(a: f64, b: f64) -> f64 {
    shortest_delta(a, b).abs()
}

/// First-order approach: move `current` a fraction of the shortest residual
/// toward `target`. The result is normalized.
#[inline]
pub fn approach(current: f64, target: f64, fraction: f64) -> f64 {
    normalize(current + fraction * shortest_delta(current, target))
}
