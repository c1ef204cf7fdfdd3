// src/config.rs
//
// Provenance record written next to the run outputs as config.json.

use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::domain::RotationSense;
use crate::error::SimResult;
use crate::params::SimParams;

#[derive(Serialize)]
pub struct RunConfig {
    pub geometry: GeometryConfig,
    pub dynamics: DynamicsConfig,
    pub excitation: ExcitationConfig,
    pub readout: ReadoutConfig,
    pub run: RunInfo,
}

#[derive(Serialize)]
pub struct GeometryConfig {
    pub nx: usize,
    pub ny: usize,
    pub pitch: f64,
    pub film_width: f64,
    pub film_length: f64,
    pub base_angle_deg: f64,
    pub perturbation_deg: f64,
    pub seed: u64,
}

#[derive(Serialize)]
pub struct DynamicsConfig {
    pub rotation_deg: f64,
    pub enhancement_factor: f64,
    pub retention_plain_s: f64,
    pub retention_enhanced_s: f64,
    pub holding_fraction: f64,
    pub relaxing_fraction: f64,
    pub epsilon_deg: f64,
    pub rotation_sense: RotationSense,
}

#[derive(Serialize)]
pub struct ExcitationConfig {
    pub band_width: f64,
    pub saw_speed: f64,
    pub saw_freq_hz: f64,
    /// Initial switch states.
    pub saw: bool,
    pub tribo: bool,
    /// Scheduled switch changes (s), headless runs only.
    pub saw_off_at: Option<f64>,
    pub tribo_at: Option<f64>,
    pub tribo_off_at: Option<f64>,
}

#[derive(Serialize)]
pub struct ReadoutConfig {
    pub field_base_nt: f64,
    pub field_max_plain_nt: f64,
    pub field_max_enhanced_nt: f64,
}

#[derive(Serialize)]
pub struct RunInfo {
    pub binary: String,
    pub run_id: String,
    pub preset: String,
    pub dt: f64,
    /// Simulated duration (s); `None` for open-ended real-time runs.
    pub duration: Option<f64>,
    pub realtime: bool,
    /// Ticks between saved frames; `None` when no periodic frames are written.
    pub output_stride: Option<usize>,
}

/// Switch schedule carried into the config record.
#[derive(Debug, Clone, Copy, Default)]
pub struct Schedule {
    pub saw: bool,
    pub tribo: bool,
    pub saw_off_at: Option<f64>,
    pub tribo_at: Option<f64>,
    pub tribo_off_at: Option<f64>,
}

impl RunConfig {
    pub fn new(params: &SimParams, schedule: Schedule, run: RunInfo) -> Self {
        Self {
            geometry: GeometryConfig {
                nx: params.nx,
                ny: params.ny,
                pitch: params.pitch,
                film_width: params.film_width(),
                film_length: params.film_length(),
                base_angle_deg: params.base_angle_deg,
                perturbation_deg: params.perturbation_deg,
                seed: params.seed,
            },
            dynamics: DynamicsConfig {
                rotation_deg: params.rotation_deg,
                enhancement_factor: params.enhancement_factor,
                retention_plain_s: params.retention_plain_s,
                retention_enhanced_s: params.retention_enhanced_s,
                holding_fraction: params.holding_fraction,
                relaxing_fraction: params.relaxing_fraction,
                epsilon_deg: params.epsilon_deg,
                rotation_sense: params.rotation_sense,
            },
            excitation: ExcitationConfig {
                band_width: params.band_width,
                saw_speed: params.saw_speed,
                saw_freq_hz: params.saw_freq_hz,
                saw: schedule.saw,
                tribo: schedule.tribo,
                saw_off_at: schedule.saw_off_at,
                tribo_at: schedule.tribo_at,
                tribo_off_at: schedule.tribo_off_at,
            },
            readout: ReadoutConfig {
                field_base_nt: params.field_base_nt,
                field_max_plain_nt: params.field_max_plain_nt,
                field_max_enhanced_nt: params.field_max_enhanced_nt,
            },
            run,
        }
    }

    pub fn write_to_dir(&self, out_dir: &Path) -> SimResult<()> {
        let path = out_dir.join("config.json");
        let file = File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Preset;

    #[test]
    fn config_serialises_all_sections() {
        let p = SimParams::new(Preset::Toy);
        let cfg = RunConfig::new(
            &p,
            Schedule {
                saw: true,
                tribo_at: Some(1.5),
                ..Schedule::default()
            },
            RunInfo {
                binary: "tribomag-sim".to_string(),
                run_id: "test".to_string(),
                preset: "toy".to_string(),
                dt: p.dt,
                duration: Some(3.0),
                realtime: false,
                output_stride: Some(10),
            },
        );
        let v = serde_json::to_value(&cfg).unwrap();
        assert_eq!(v["geometry"]["nx"], 4);
        assert_eq!(v["dynamics"]["retention_enhanced_s"], 6.0);
        assert_eq!(v["excitation"]["saw"], true);
        assert_eq!(v["excitation"]["tribo_at"], 1.5);
        assert!(v["excitation"]["saw_off_at"].is_null());
        assert_eq!(v["run"]["run_id"], "test");
    }
}
