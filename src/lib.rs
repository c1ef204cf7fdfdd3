// src/lib.rs

pub mod angle;
pub mod config;
pub mod control;
pub mod domain;
pub mod error;
pub mod grid;
pub mod metrics;
pub mod params;
pub mod readout;
pub mod simulation;
pub mod visualisation;
pub mod wavefront;
