use thiserror::Error;

use crate::models::Criterion;

/// Errors that can occur while scoring a specimen pair
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PairingError {
    #[error(
        "{criterion} is required by strategy '{strategy}' but unknown for: {}",
        .specimens.join(", ")
    )]
    MissingMeasurement {
        criterion: Criterion,
        specimens: Vec<String>,
        strategy: String,
    },

    #[error("invalid position for '{specimen}': latitude {latitude}, longitude {longitude}")]
    InvalidPosition {
        specimen: String,
        latitude: f64,
        longitude: f64,
    },

    #[error("distance provider returned {distance_km} km for {first} <-> {second}")]
    InvalidDistance {
        first: String,
        second: String,
        distance_km: f64,
    },

    #[error("unknown strategy '{name}' (valid strategies: {valid})")]
    UnknownStrategy { name: String, valid: String },

    #[error("unknown criterion '{name}' (valid criteria: {valid})")]
    UnknownCriterion { name: String, valid: String },

    #[error("invalid strategy '{name}': {}", .problems.join("; "))]
    InvalidStrategy { name: String, problems: Vec<String> },
}

impl PairingError {
    /// Whether the error is a data problem of the pair rather than of configuration
    pub fn is_precondition(&self) -> bool {
        matches!(self, PairingError::MissingMeasurement { .. })
    }
}
