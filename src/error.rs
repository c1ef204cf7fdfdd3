// src/error.rs

use thiserror::Error;

/// Errors raised at the edges of the simulator (parameter files, run outputs).
///
/// The tick itself is infallible.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParams { name: &'static str, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type SimResult<T> = Result<T, SimError>;
