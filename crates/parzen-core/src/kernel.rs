//! Parzen window kernels.
//!
//! A window is a smoothing kernel `omega` used to turn raw co-occurrence counts
//! into a density estimate, together with the two derivative kernels the
//! gradient needs: `derivative` for the log-ratio term and `derivative_k` for
//! the conditional-probability term. The default is the cubic B-spline sampled
//! at integer offsets, `{1/6, 2/3, 1/6}`, whose derivative at the same offsets
//! is `{-1/2, 0, 1/2}`.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Tolerance on `sum(omega) == 1`.
const NORMALIZATION_TOLERANCE: f64 = 1e-6;

/// Smoothing and derivative kernels of a Parzen window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParzenWindow {
    smoothing: Vec<f64>,
    derivative: Vec<f64>,
    derivative_k: Vec<f64>,
}

impl ParzenWindow {
    /// Build a window from explicit kernels.
    ///
    /// # Errors
    /// Every kernel must have odd, non-zero length and the smoothing kernel
    /// must sum to 1. Derivative kernels are not required to sum to zero; the
    /// [`correction_constant`](Self::correction_constant) absorbs any bias.
    pub fn new(smoothing: Vec<f64>, derivative: Vec<f64>, derivative_k: Vec<f64>) -> Result<Self> {
        let window = Self {
            smoothing,
            derivative,
            derivative_k,
        };
        window.validate()?;
        Ok(window)
    }

    /// Cubic B-spline window: `{1/6, 2/3, 1/6}` with derivative `{-1/2, 0, 1/2}`.
    pub fn cubic_bspline() -> Self {
        Self {
            smoothing: vec![1.0 / 6.0, 2.0 / 3.0, 1.0 / 6.0],
            derivative: vec![-0.5, 0.0, 0.5],
            derivative_k: vec![-0.5, 0.0, 0.5],
        }
    }

    /// No smoothing: the estimate reduces to the plain discrete histogram.
    pub fn identity() -> Self {
        Self {
            smoothing: vec![1.0],
            derivative: vec![0.0],
            derivative_k: vec![0.0],
        }
    }

    /// Check kernel lengths and mass preservation.
    pub fn validate(&self) -> Result<()> {
        for kernel in [&self.smoothing, &self.derivative, &self.derivative_k] {
            if kernel.is_empty() || kernel.len() % 2 == 0 {
                return Err(CoreError::KernelLength { len: kernel.len() });
            }
        }
        let sum: f64 = self.smoothing.iter().sum();
        if (sum - 1.0).abs() > NORMALIZATION_TOLERANCE {
            return Err(CoreError::KernelNormalization { sum });
        }
        Ok(())
    }

    pub fn smoothing(&self) -> &[f64] {
        &self.smoothing
    }

    pub fn derivative(&self) -> &[f64] {
        &self.derivative
    }

    pub fn derivative_k(&self) -> &[f64] {
        &self.derivative_k
    }

    /// Half-width of the smoothing kernel.
    pub fn radius(&self) -> usize {
        self.smoothing.len() / 2
    }

    /// `sum_i sum_j omega[i] * derivative[j]`.
    ///
    /// Zero whenever the derivative kernel sums to zero, but computed rather
    /// than assumed so that other windows stay correct.
    pub fn correction_constant(&self) -> f64 {
        let mut bigc = 0.0;
        for &w in &self.smoothing {
            for &d in &self.derivative {
                bigc += w * d;
            }
        }
        bigc
    }
}

impl Default for ParzenWindow {
    fn default() -> Self {
        Self::cubic_bspline()
    }
}
