// src/params.rs
//
// Every tunable constant of the simulator lives here. Values are demo-scale:
// retention times stand in for minutes, the SAW speed is chosen so a pass
// takes a few seconds on screen, and the field estimate is a readout, not a
// computed magnetostatic field.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{Dynamics, Excitation, RotationSense};
use crate::error::{SimError, SimResult};
use crate::grid::Grid2D;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// 200 nm × 1000 nm CoFeB strip, 25 nm domains (8 × 40).
    Demo,
    /// Small 4 × 10 strip with a faster wave, for quick runs and tests.
    Toy,
}

impl Preset {
    pub fn from_arg(s: &str) -> Option<Self> {
        match s {
            "demo" => Some(Self::Demo),
            "toy" => Some(Self::Toy),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Demo => "demo",
            Self::Toy => "toy",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimParams {
    // --- lattice ---
    pub nx: usize,
    pub ny: usize,
    /// Domain pitch (m).
    pub pitch: f64,

    // --- initial orientation ---
    pub base_angle_deg: f64,
    /// Half-width of the uniform random perturbation around the base angle.
    pub perturbation_deg: f64,
    pub seed: u64,

    // --- switching ---
    /// Magnetoelastic (plain) rotation magnitude.
    pub rotation_deg: f64,
    /// Enhanced rotation = rotation_deg × enhancement_factor.
    pub enhancement_factor: f64,
    pub retention_plain_s: f64,
    pub retention_enhanced_s: f64,
    pub holding_fraction: f64,
    pub relaxing_fraction: f64,
    pub epsilon_deg: f64,
    pub rotation_sense: RotationSense,

    // --- wavefront ---
    /// Band width along the propagation axis (m).
    pub band_width: f64,
    /// Propagation speed (m/s, demo time).
    pub saw_speed: f64,
    /// Frequency label for the readout only.
    pub saw_freq_hz: f64,

    // --- field readout ---
    pub field_base_nt: f64,
    pub field_max_plain_nt: f64,
    pub field_max_enhanced_nt: f64,

    // --- timing ---
    /// Tick size (s).
    pub dt: f64,
}

impl Default for SimParams {
    fn default() -> Self {
        Self::new(Preset::Demo)
    }
}

impl SimParams {
    pub fn new(preset: Preset) -> Self {
        match preset {
            Preset::Demo => {
                let pitch = 25e-9;
                let grid = Grid2D::fit(200e-9, 1000e-9, pitch);
                Self {
                    nx: grid.nx,
                    ny: grid.ny,
                    pitch,
                    base_angle_deg: 0.0,
                    perturbation_deg: 5.0,
                    seed: 42,
                    rotation_deg: 15.0,
                    enhancement_factor: 1.4,
                    retention_plain_s: 2.0,
                    retention_enhanced_s: 6.0,
                    holding_fraction: 0.2,
                    relaxing_fraction: 0.05,
                    epsilon_deg: 0.5,
                    rotation_sense: RotationSense::Standard,
                    band_width: pitch,
                    // one pass over the 1 µm strip in 5 s
                    saw_speed: grid.ly() / 5.0,
                    saw_freq_hz: 62.5e6,
                    field_base_nt: 10.0,
                    field_max_plain_nt: 30.0,
                    field_max_enhanced_nt: 50.0,
                    dt: 0.01,
                }
            }
            Preset::Toy => {
                let mut p = Self::new(Preset::Demo);
                p.nx = 4;
                p.ny = 10;
                p.saw_speed = p.film_length() / 1.0;
                p
            }
        }
    }

    pub fn grid(&self) -> Grid2D {
        Grid2D::new(self.nx, self.ny, self.pitch)
    }

    pub fn film_width(&self) -> f64 {
        self.grid().lx()
    }

    /// Length of the film along the propagation axis.
    pub fn film_length(&self) -> f64 {
        self.grid().ly()
    }

    pub fn max_rotation_deg(&self, enhanced: bool) -> f64 {
        if enhanced {
            self.rotation_deg * self.enhancement_factor
        } else {
            self.rotation_deg
        }
    }

    pub fn retention_s(&self, enhanced: bool) -> f64 {
        if enhanced {
            self.retention_enhanced_s
        } else {
            self.retention_plain_s
        }
    }

    pub fn field_ceiling_nt(&self, enhanced: bool) -> f64 {
        if enhanced {
            self.field_max_enhanced_nt
        } else {
            self.field_max_plain_nt
        }
    }

    /// Trigger payload for the given enhancement state.
    pub fn excitation(&self, enhanced: bool) -> Excitation {
        Excitation {
            rotation: self.max_rotation_deg(enhanced).to_radians(),
            retention: self.retention_s(enhanced),
            sense: self.rotation_sense,
        }
    }

    pub fn dynamics(&self) -> Dynamics {
        Dynamics {
            holding_fraction: self.holding_fraction,
            relaxing_fraction: self.relaxing_fraction,
            epsilon: self.epsilon_deg.to_radians(),
        }
    }

    /// Reject values that would make the model meaningless.
    ///
    /// Zero lattice dimensions are allowed (empty, inert grid).
    pub fn validate(&self) -> SimResult<()> {
        fn bad(name: &'static str, reason: impl Into<String>) -> SimError {
            SimError::InvalidParams {
                name,
                reason: reason.into(),
            }
        }

        let finite = [
            ("pitch", self.pitch),
            ("base_angle_deg", self.base_angle_deg),
            ("perturbation_deg", self.perturbation_deg),
            ("rotation_deg", self.rotation_deg),
            ("enhancement_factor", self.enhancement_factor),
            ("retention_plain_s", self.retention_plain_s),
            ("retention_enhanced_s", self.retention_enhanced_s),
            ("epsilon_deg", self.epsilon_deg),
            ("band_width", self.band_width),
            ("saw_speed", self.saw_speed),
            ("field_base_nt", self.field_base_nt),
            ("field_max_plain_nt", self.field_max_plain_nt),
            ("field_max_enhanced_nt", self.field_max_enhanced_nt),
            ("dt", self.dt),
        ];
        for (name, v) in finite {
            if !v.is_finite() {
                return Err(bad(name, format!("must be finite, got {v}")));
            }
        }

        if self.pitch <= 0.0 {
            return Err(bad("pitch", "must be > 0"));
        }
        if self.dt <= 0.0 {
            return Err(bad("dt", "must be > 0"));
        }
        for (name, v) in [
            ("retention_plain_s", self.retention_plain_s),
            ("retention_enhanced_s", self.retention_enhanced_s),
            ("band_width", self.band_width),
            ("saw_speed", self.saw_speed),
            ("perturbation_deg", self.perturbation_deg),
            ("epsilon_deg", self.epsilon_deg),
        ] {
            if v < 0.0 {
                return Err(bad(name, format!("must be >= 0, got {v}")));
            }
        }
        for (name, v) in [
            ("holding_fraction", self.holding_fraction),
            ("relaxing_fraction", self.relaxing_fraction),
        ] {
            if !(v > 0.0 && v <= 1.0) {
                return Err(bad(name, format!("must lie in (0, 1], got {v}")));
            }
        }
        if self.field_max_plain_nt < self.field_base_nt
            || self.field_max_enhanced_nt < self.field_base_nt
        {
            return Err(bad("field_max_*_nt", "ceilings must not be below field_base_nt"));
        }
        Ok(())
    }

    /// Load a parameter set from JSON. Missing keys take the demo defaults.
    pub fn from_json_file(path: &Path) -> SimResult<Self> {
        Self::from_json_file_with(path, &Self::default())
    }

    /// Load a JSON parameter file laid over `base`: keys the file leaves out
    /// keep the values of `base` (usually the chosen preset).
    pub fn from_json_file_with(path: &Path, base: &SimParams) -> SimResult<Self> {
        let file = File::open(path)?;
        let overrides: Value = serde_json::from_reader(BufReader::new(file))?;
        let params = Self::overlay(base, overrides)?;
        params.validate()?;
        Ok(params)
    }

    fn overlay(base: &SimParams, overrides: Value) -> SimResult<Self> {
        let Value::Object(fields) = overrides else {
            return Err(SimError::InvalidParams {
                name: "params",
                reason: "expected a JSON object".to_string(),
            });
        };
        let mut merged = serde_json::to_value(base)?;
        if let Value::Object(target) = &mut merged {
            target.extend(fields);
        }
        Ok(serde_json::from_value(merged)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_preset_matches_strip_layout() {
        let p = SimParams::new(Preset::Demo);
        assert_eq!((p.nx, p.ny), (8, 40));
        assert!((p.film_length() - 1000e-9).abs() < 1e-15);
        assert!((p.saw_speed - 200e-9).abs() < 1e-15);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn enhanced_values_scale_as_configured() {
        let p = SimParams::default();
        assert!((p.max_rotation_deg(true) - 21.0).abs() < 1e-12);
        assert_eq!(p.retention_s(false), 2.0);
        assert_eq!(p.retention_s(true), 6.0);
        assert!(p.retention_s(true) > p.retention_s(false));
        let e = p.excitation(true);
        assert!((e.rotation - 1.4 * p.excitation(false).rotation).abs() < 1e-12);
    }

    #[test]
    fn missing_json_keys_fall_back_to_defaults() {
        let p: SimParams = serde_json::from_str(r#"{ "nx": 2, "ny": 3, "seed": 7 }"#).unwrap();
        assert_eq!((p.nx, p.ny, p.seed), (2, 3, 7));
        assert_eq!(p.rotation_deg, 15.0);
    }

    #[test]
    fn json_overrides_keep_the_chosen_preset() {
        let toy = SimParams::new(Preset::Toy);
        let p = SimParams::overlay(&toy, serde_json::json!({ "seed": 7, "rotation_deg": 20.0 }))
            .unwrap();
        assert_eq!((p.nx, p.ny), (4, 10));
        assert_eq!(p.seed, 7);
        assert_eq!(p.rotation_deg, 20.0);
        assert_eq!(p.saw_speed, toy.saw_speed);

        let err = SimParams::overlay(&toy, serde_json::json!([1, 2, 3]));
        assert!(matches!(err, Err(SimError::InvalidParams { name: "params", .. })));
    }

    #[test]
    fn json_file_is_laid_over_the_base() {
        let path = std::env::temp_dir().join(format!("tribomag_params_{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "ny": 12, "retention_plain_s": 1.5 }"#).unwrap();
        let p = SimParams::from_json_file_with(&path, &SimParams::new(Preset::Toy));
        std::fs::remove_file(&path).unwrap();

        let p = p.unwrap();
        assert_eq!((p.nx, p.ny), (4, 12));
        assert_eq!(p.retention_plain_s, 1.5);
        assert_eq!(p.retention_enhanced_s, 6.0);
    }

    #[test]
    fn validate_rejects_bad_fraction_and_dt() {
        let mut p = SimParams::default();
        p.relaxing_fraction = 0.0;
        assert!(matches!(
            p.validate(),
            Err(SimError::InvalidParams { name: "relaxing_fraction", .. })
        ));

        let mut p = SimParams::default();
        p.dt = f64::NAN;
        assert!(p.validate().is_err());
    }

    #[test]
    fn preset_round_trips_through_arg() {
        for p in [Preset::Demo, Preset::Toy] {
            assert_eq!(Preset::from_arg(p.as_str()), Some(p));
        }
        assert_eq!(Preset::from_arg("bloch"), None);
    }
}
