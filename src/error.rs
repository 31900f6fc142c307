//! Error types of the demand model.

use thiserror::Error;

/// Errors raised by the calibration, generation and scenario routines.
#[derive(Debug, Error)]
pub enum DemandError {
    /// A parameter was rejected before any computation took place.
    #[error("invalid {name}: {reason}, but is {value}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    /// Per-household scenario data was requested before a scenario populated it.
    #[error("missing {field} for household {index}; run a scenario first")]
    MissingScenarioData { field: &'static str, index: usize },

    /// The scenario result does not belong to the population it is summarized with.
    #[error("scenario covers {outcomes} households, but the population has {households}")]
    PopulationMismatch { outcomes: usize, households: usize },

    #[error("failed to construct lognormal distribution")]
    LogNormal(#[from] rand_distr::NormalError),

    #[error("failed to construct uniform distribution")]
    Uniform(#[from] rand::distr::uniform::Error),
}

impl DemandError {
    pub(crate) fn invalid(name: &'static str, value: f64, reason: &'static str) -> Self {
        Self::InvalidParameter {
            name,
            value,
            reason,
        }
    }
}

/// Reject `value` unless it is finite and strictly positive.
pub(crate) fn check_positive(name: &'static str, value: f64) -> Result<f64, DemandError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(DemandError::invalid(
            name,
            value,
            "must be finite and greater than 0",
        ));
    }
    Ok(value)
}
