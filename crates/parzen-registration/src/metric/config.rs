//! Metric configuration.

use parzen_core::histogram::HistogramLayout;
use parzen_core::kernel::ParzenWindow;
use serde::{Deserialize, Serialize};

use crate::error::{RegistrationError, Result};
use crate::validation::{validate_bin_count, IntensityPolicy};

/// Logarithm base of the reported value and gradient.
///
/// Log ratios are always formed with the natural log; `Two` rescales the
/// outputs by `1 / ln 2` so the value is expressed in bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LogBase {
    #[default]
    Natural,
    Two,
}

impl LogBase {
    /// Factor converting a natural-log quantity into this base.
    pub fn scale(self) -> f64 {
        match self {
            Self::Natural => 1.0,
            Self::Two => std::f64::consts::LOG2_E,
        }
    }
}

/// How the per-pixel gradient is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GradientStrategy {
    /// Convolve the full alpha and beta matrices, then gather per pixel.
    #[default]
    Precomputed,
    /// Evaluate the stencil only around each pixel's own bin pair.
    Windowed,
}

/// Configuration for [`ParzenMutualInformation`](super::ParzenMutualInformation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricConfig {
    /// Number of intensity bins per axis.
    pub bins: usize,
    /// Smoothing and derivative kernels.
    pub window: ParzenWindow,
    /// Base of the reported logarithm.
    pub log_base: LogBase,
    /// Pad the histogram by the kernel radius so smoothing keeps all mass.
    pub padded: bool,
    /// Per-pixel gradient strategy.
    pub strategy: GradientStrategy,
    /// Treatment of intensities outside `0..bins`.
    pub intensity_policy: IntensityPolicy,
    /// Sample count from which the histogram is built in parallel.
    pub parallel_threshold: usize,
    /// Reject outputs holding NaN or infinity.
    pub check_numerical_stability: bool,
}

impl Default for MetricConfig {
    fn default() -> Self {
        Self {
            bins: 256,
            window: ParzenWindow::cubic_bspline(),
            log_base: LogBase::Natural,
            padded: true,
            strategy: GradientStrategy::Precomputed,
            intensity_policy: IntensityPolicy::Reject,
            parallel_threshold: 1 << 16,
            check_numerical_stability: true,
        }
    }
}

impl MetricConfig {
    /// Create a new config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of bins.
    pub fn with_bins(mut self, bins: usize) -> Self {
        self.bins = bins;
        self
    }

    /// Set the Parzen window.
    pub fn with_window(mut self, window: ParzenWindow) -> Self {
        self.window = window;
        self
    }

    /// Set the logarithm base.
    pub fn with_log_base(mut self, log_base: LogBase) -> Self {
        self.log_base = log_base;
        self
    }

    /// Enable or disable histogram padding.
    pub fn with_padding(mut self, padded: bool) -> Self {
        self.padded = padded;
        self
    }

    /// Set the per-pixel gradient strategy.
    pub fn with_strategy(mut self, strategy: GradientStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the out-of-range intensity policy.
    pub fn with_intensity_policy(mut self, policy: IntensityPolicy) -> Self {
        self.intensity_policy = policy;
        self
    }

    /// Set the parallel histogram threshold.
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// Disable the NaN/infinity output check.
    pub fn without_numerical_checks(mut self) -> Self {
        self.check_numerical_stability = false;
        self
    }

    /// Check bins and kernel invariants.
    pub fn validate(&self) -> Result<()> {
        validate_bin_count(self.bins)?;
        self.window
            .validate()
            .map_err(|e| RegistrationError::invalid_configuration(e.to_string()))?;
        if self.parallel_threshold == 0 {
            return Err(RegistrationError::invalid_configuration(
                "parallel_threshold must be positive",
            ));
        }
        Ok(())
    }

    /// Histogram layout implied by `bins`, `padded` and the window radius.
    pub fn layout(&self) -> Result<HistogramLayout> {
        let padding = if self.padded { self.window.radius() } else { 0 };
        Ok(HistogramLayout::new(self.bins, padding)?)
    }
}
