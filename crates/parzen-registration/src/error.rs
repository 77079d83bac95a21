//! Error types for metric evaluation.
//!
//! Input validation failures are reported before any histogram is built.
//! Histogram degeneracies (empty marginals, zero joint probability) are not
//! errors; they are resolved by the log-ratio substitution rules.

use parzen_core::CoreError;
use thiserror::Error;

/// Main error type for metric operations.
#[derive(Error, Debug)]
pub enum RegistrationError {
    /// Error in metric computation.
    #[error("Metric error: {0}")]
    MetricError(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A non-finite value reached the metric value or gradient.
    #[error("Numerical instability: {0}")]
    NumericalInstability(String),

    /// Shape mismatch between the two images.
    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// An intensity falls outside `0..bins`.
    #[error("Intensity {value} at index {index} is outside 0..{bins}")]
    IntensityOutOfRange {
        index: usize,
        value: f64,
        bins: usize,
    },

    /// Error raised by the numeric core.
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type for metric operations.
pub type Result<T> = std::result::Result<T, RegistrationError>;

impl RegistrationError {
    /// Create a metric error.
    pub fn metric(msg: impl Into<String>) -> Self {
        Self::MetricError(msg.into())
    }

    /// Create an invalid configuration error.
    pub fn invalid_configuration(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Create a numerical instability error.
    pub fn numerical_instability(msg: impl Into<String>) -> Self {
        Self::NumericalInstability(msg.into())
    }
}
