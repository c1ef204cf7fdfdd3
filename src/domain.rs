// src/domain.rs
//
// One magnetic domain and its switching state machine.
//
//   AtRest --(wavefront trigger)--> Holding --(retention expired)--> Relaxing
//      ^                                                                |
//      +-------------------(back within epsilon of rest)---------------+
//
// Rotation is a first-order approach: each tick the cell covers a fixed
// fraction of the remaining shortest-path residual, so it never overshoots.

use serde::{Deserialize, Serialize};

use crate::angle::{approach, normalize, separation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainState {
    /// At the original orientation; eligible for a trigger.
    AtRest,
    /// Rotating toward (or sitting at) the flip target while retention counts down.
    Holding,
    /// Rotating back toward the original orientation.
    Relaxing,
}

/// Displayed polarity, with a deadband around the in-plane orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Up,
    Down,
    Neutral,
}

impl Polarity {
    /// |cos(theta)| must exceed this to count as Up/Down.
    pub const DEADBAND: f64 = 0.1;

    pub fn from_angle(theta: f64) -> Self {
        let c = theta.cos();
        if c > Self::DEADBAND {
            Polarity::Up
        } else if c < -Self::DEADBAND {
            Polarity::Down
        } else {
            Polarity::Neutral
        }
    }
}

/// Which way a triggered cell turns, decided from the sign of cos(original).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationSense {
    /// cos >= 0 turns negative, otherwise positive.
    #[default]
    Standard,
    /// cos >= 0 turns positive, otherwise negative.
    Mirrored,
}

impl RotationSense {
    pub fn sign_for(self, original: f64) -> f64 {
        let up = original.cos() >= 0.0;
        match (self, up) {
            (Self::Standard, true) | (Self::Mirrored, false) => -1.0,
            _ => 1.0,
        }
    }
}

/// What a trigger assigns to a cell: rotation magnitude (rad), retention (s)
/// and turning direction.
///
/// Built once per tick from the enhancement flag so that every cell triggered
/// in that tick sees the same values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Excitation {
    pub rotation: f64,
    pub retention: f64,
    pub sense: RotationSense,
}

impl Excitation {
    pub fn new(rotation: f64, retention: f64) -> Self {
        Self {
            rotation,
            retention,
            sense: RotationSense::Standard,
        }
    }
}

/// Per-tick approach fractions and the settling threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dynamics {
    /// Fraction of the residual covered per tick while Holding.
    pub holding_fraction: f64,
    /// Fraction of the residual covered per tick while Relaxing.
    pub relaxing_fraction: f64,
    /// Angular threshold (rad) for "reached target" / "back at rest".
    pub epsilon: f64,
}

impl Default for Dynamics {
    fn default() -> Self {
        Self {
            holding_fraction: 0.2,
            relaxing_fraction: 0.05,
            epsilon: 0.5_f64.to_radians(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DomainCell {
    position: (f64, f64),
    original_angle: f64,
    current_angle: f64,
    target_angle: f64,
    max_rotation_angle: f64,
    retention_remaining: f64,
    state: DomainState,
}

impl DomainCell {
    /// A resting cell at `position` (x across, y along the film), oriented at `angle`.
    pub fn new(position: (f64, f64), angle: f64) -> Self {
        let original = normalize(angle);
        Self {
            position,
            original_angle: original,
            current_angle: original,
            target_angle: original,
            max_rotation_angle: 0.0,
            retention_remaining: 0.0,
            state: DomainState::AtRest,
        }
    }

    pub fn position(&self) -> (f64, f64) {
        self.position
    }

    /// Coordinate along the propagation axis.
    #[inline]
    pub fn longitudinal(&self) -> f64 {
        self.position.1
    }

    pub fn original_angle(&self) -> f64 {
        self.original_angle
    }

    pub fn current_angle(&self) -> f64 {
        self.current_angle
    }

    pub fn target_angle(&self) -> f64 {
        self.target_angle
    }

    /// Target captured at the most recent trigger (0 while at rest).
    pub fn max_rotation_angle(&self) -> f64 {
        self.max_rotation_angle
    }

    pub fn retention_remaining(&self) -> f64 {
        self.retention_remaining
    }

    pub fn state(&self) -> DomainState {
        self.state
    }

    pub fn is_at_rest(&self) -> bool {
        self.state == DomainState::AtRest
    }

    pub fn polarity(&self) -> Polarity {
        Polarity::from_angle(self.current_angle)
    }

    /// In-plane arrow for rendering: (length·cos θ, length·sin θ).
    pub fn arrow(&self, length: f64) -> (f64, f64) {
        (
            length * self.current_angle.cos(),
            length * self.current_angle.sin(),
        )
    }

    /// Shortest-path distance of the live orientation from rest.
    pub fn displacement(&self) -> f64 {
        separation(self.current_angle, self.original_angle)
    }

    /// Rotation assigned by the most recent trigger, or `None` while at rest.
    pub fn assigned_rotation(&self) -> Option<f64> {
        match self.state {
            DomainState::AtRest => None,
            _ => Some(separation(self.max_rotation_angle, self.original_angle)),
        }
    }

    /// AtRest -> Holding. Returns false (and changes nothing) unless at rest.
    ///
    /// With the standard sense, cells leaning "up" (cos >= 0) rotate negative
    /// and the others positive.
    pub fn trigger(&mut self, excitation: Excitation) -> bool {
        if self.state != DomainState::AtRest {
            return false;
        }
        let sign = excitation.sense.sign_for(self.original_angle);
        self.target_angle = normalize(self.original_angle + sign * excitation.rotation.abs());
        self.max_rotation_angle = self.target_angle;
        self.retention_remaining = excitation.retention.max(0.0);
        self.state = DomainState::Holding;
        true
    }

    /// Advance the state machine by one tick of length `dt` seconds.
    ///
    /// A non-positive `dt` is a no-op.
    pub fn step(&mut self, dt: f64, dynamics: &Dynamics) {
        if !(dt > 0.0) {
            return;
        }
        match self.state {
            DomainState::AtRest => {}
            DomainState::Holding => {
                if separation(self.current_angle, self.target_angle) > dynamics.epsilon {
                    self.current_angle = approach(
                        self.current_angle,
                        self.target_angle,
                        dynamics.holding_fraction,
                    );
                }
                self.retention_remaining = (self.retention_remaining - dt).max(0.0);
                if self.retention_remaining == 0.0 {
                    self.target_angle = self.original_angle;
                    self.state = DomainState::Relaxing;
                }
            }
            DomainState::Relaxing => {
                if separation(self.current_angle, self.original_angle) > dynamics.epsilon {
                    self.current_angle = approach(
                        self.current_angle,
                        self.original_angle,
                        dynamics.relaxing_fraction,
                    );
                }
                if separation(self.current_angle, self.original_angle) <= dynamics.epsilon {
                    self.settle();
                }
            }
        }
    }

    /// Relaxing -> AtRest.
    fn settle(&mut self) {
        self.current_angle = self.original_angle;
        self.target_angle = self.original_angle;
        self.max_rotation_angle = 0.0;
        self.retention_remaining = 0.0;
        self.state = DomainState::AtRest;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn plain() -> Excitation {
        Excitation::new(15.0_f64.to_radians(), 2.0)
    }

    #[test]
    fn up_leaning_cell_rotates_negative() {
        let mut c = DomainCell::new((0.0, 0.0), 3.0_f64.to_radians());
        assert!(c.trigger(plain()));
        assert_eq!(c.state(), DomainState::Holding);
        assert!((c.target_angle().to_degrees() - (-12.0)).abs() < 1e-9);
        assert_eq!(c.max_rotation_angle(), c.target_angle());
        assert_eq!(c.retention_remaining(), 2.0);
    }

    #[test]
    fn down_leaning_cell_rotates_positive_and_wraps() {
        // 175° + 15° = 190° -> -170°
        let mut c = DomainCell::new((0.0, 0.0), 175.0_f64.to_radians());
        c.trigger(plain());
        assert!((c.target_angle().to_degrees() - (-170.0)).abs() < 1e-9);
        assert!(c.target_angle() > -PI && c.target_angle() <= PI);
    }

    #[test]
    fn mirrored_sense_flips_the_direction() {
        let exc = Excitation {
            sense: RotationSense::Mirrored,
            ..plain()
        };
        let mut up = DomainCell::new((0.0, 0.0), 3.0_f64.to_radians());
        up.trigger(exc);
        assert!((up.target_angle().to_degrees() - 18.0).abs() < 1e-9);

        let mut down = DomainCell::new((0.0, 0.0), 170.0_f64.to_radians());
        down.trigger(exc);
        assert!((down.target_angle().to_degrees() - 155.0).abs() < 1e-9);
    }

    #[test]
    fn trigger_is_ignored_until_back_at_rest() {
        let dyn_ = Dynamics::default();
        let mut c = DomainCell::new((0.0, 0.0), 0.0);
        assert!(c.trigger(plain()));
        c.step(0.01, &dyn_);
        let target = c.target_angle();
        let retention = c.retention_remaining();

        let stronger = Excitation::new(40.0_f64.to_radians(), 9.0);
        assert!(!c.trigger(stronger));
        assert_eq!(c.target_angle(), target);
        assert_eq!(c.retention_remaining(), retention);
    }

    #[test]
    fn holding_covers_twenty_percent_of_residual_per_tick() {
        let dyn_ = Dynamics::default();
        let mut c = DomainCell::new((0.0, 0.0), 0.0);
        c.trigger(plain());
        c.step(0.01, &dyn_);
        assert!((c.current_angle().to_degrees() - (-3.0)).abs() < 1e-9);
        c.step(0.01, &dyn_);
        // residual 12° -> +2.4°
        assert!((c.current_angle().to_degrees() - (-5.4)).abs() < 1e-9);
    }

    #[test]
    fn retention_floors_at_zero_and_starts_relaxation() {
        let dyn_ = Dynamics::default();
        let mut c = DomainCell::new((0.0, 0.0), 0.0);
        c.trigger(Excitation::new(15.0_f64.to_radians(), 0.015));
        c.step(0.01, &dyn_);
        assert_eq!(c.state(), DomainState::Holding);
        c.step(0.01, &dyn_);
        assert_eq!(c.retention_remaining(), 0.0);
        assert_eq!(c.state(), DomainState::Relaxing);
        assert_eq!(c.target_angle(), c.original_angle());
    }

    #[test]
    fn relaxation_returns_exactly_to_rest() {
        let dyn_ = Dynamics::default();
        let orig = -2.0_f64.to_radians();
        let mut c = DomainCell::new((0.0, 0.0), orig);
        c.trigger(Excitation::new(15.0_f64.to_radians(), 0.1));
        for _ in 0..1000 {
            c.step(0.01, &dyn_);
            if c.is_at_rest() {
                break;
            }
        }
        assert!(c.is_at_rest());
        assert_eq!(c.current_angle(), c.original_angle());
        assert!((c.current_angle() - orig).abs() < 1e-12);
        assert_eq!(c.max_rotation_angle(), 0.0);
        assert_eq!(c.retention_remaining(), 0.0);
        assert!(c.assigned_rotation().is_none());
    }

    #[test]
    fn zero_dt_changes_nothing() {
        let dyn_ = Dynamics::default();
        let mut c = DomainCell::new((0.0, 0.0), 0.0);
        c.trigger(plain());
        let before = c.clone();
        c.step(0.0, &dyn_);
        assert_eq!(c, before);
    }

    #[test]
    fn polarity_has_a_deadband() {
        assert_eq!(Polarity::from_angle(0.0), Polarity::Up);
        assert_eq!(Polarity::from_angle(PI), Polarity::Down);
        assert_eq!(Polarity::from_angle(PI / 2.0), Polarity::Neutral);
        // cos(85°) ≈ 0.087 sits inside the deadband
        assert_eq!(Polarity::from_angle(85.0_f64.to_radians()), Polarity::Neutral);
        assert_eq!(Polarity::from_angle(80.0_f64.to_radians()), Polarity::Up);
    }

    #[test]
    fn arrow_follows_current_angle() {
        let c = DomainCell::new((0.0, 0.0), PI / 2.0);
        let (ay, az) = c.arrow(2.0);
        assert!(ay.abs() < 1e-12);
        assert!((az - 2.0).abs() < 1e-12);
    }
}
