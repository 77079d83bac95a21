//! Metric trait and request/response types.
//!
//! A call states up front which outputs it needs, so the engine can skip the
//! value reduction or the gradient pass entirely.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use parzen_core::matrix;

use crate::error::Result;

/// Shape of a requested gradient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradientMode {
    /// One derivative per pixel, length N.
    PerPixel,
    /// One derivative per bin pair, `bins x bins`, rows indexed by moving intensity.
    Matrix,
}

/// Which outputs an evaluation should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputRequest {
    Value,
    Gradient(GradientMode),
    ValueAndGradient(GradientMode),
}

impl OutputRequest {
    pub fn wants_value(&self) -> bool {
        matches!(self, Self::Value | Self::ValueAndGradient(_))
    }

    pub fn gradient_mode(&self) -> Option<GradientMode> {
        match self {
            Self::Value => None,
            Self::Gradient(mode) | Self::ValueAndGradient(mode) => Some(*mode),
        }
    }
}

/// Analytic gradient of the metric value with respect to moving intensities.
///
/// Each entry is `beta - correction - alpha` at a bin pair. The `-alpha` part
/// equals `N * dV/dm`, the derivative of the value `V` with respect to one
/// moving sample scaled by the sample count `N`; `beta` adds the
/// conditional-probability term and `correction` is zero for the cubic
/// B-spline window. Use it as a descent direction, or divide by `N` for a
/// per-sample slope. Entries are in the configured log base.
#[derive(Debug, Clone)]
pub enum Gradient<B: Backend> {
    /// Length N, one entry per pixel at its own bin pair.
    PerPixel(Tensor<B, 1>),
    /// `bins x bins`, rows indexed by moving intensity.
    Matrix(Tensor<B, 2>),
}

impl<B: Backend> Gradient<B> {
    pub fn as_per_pixel(&self) -> Option<&Tensor<B, 1>> {
        match self {
            Self::PerPixel(g) => Some(g),
            Self::Matrix(_) => None,
        }
    }

    pub fn as_matrix(&self) -> Option<&Tensor<B, 2>> {
        match self {
            Self::Matrix(m) => Some(m),
            Self::PerPixel(_) => None,
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        match self {
            Self::PerPixel(g) => g.dims()[0],
            Self::Matrix(m) => m.dims().iter().product(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Multiply every entry by `factor`.
    pub fn scaled(self, factor: f64) -> Self {
        match self {
            Self::PerPixel(g) => Self::PerPixel(g.mul_scalar(factor)),
            Self::Matrix(m) => Self::Matrix(m.mul_scalar(factor)),
        }
    }

    /// Gradient values on the host, row-major for the matrix form.
    pub fn to_vec(&self) -> Result<Vec<f64>> {
        let values = match self {
            Self::PerPixel(g) => matrix::to_vec(g.clone())?,
            Self::Matrix(m) => matrix::to_vec(m.clone())?,
        };
        Ok(values)
    }
}

/// Result of a metric evaluation.
///
/// `value` is the loss `-sum(P * L)`, i.e. the negated mutual information, so
/// that lower is better as for every other registration metric.
#[derive(Debug, Clone)]
pub struct MetricOutput<B: Backend> {
    pub value: Option<f64>,
    pub gradient: Option<Gradient<B>>,
}

impl<B: Backend> Default for MetricOutput<B> {
    fn default() -> Self {
        Self {
            value: None,
            gradient: None,
        }
    }
}

impl<B: Backend> MetricOutput<B> {
    /// Mutual information (the negated loss), if the value was requested.
    pub fn mutual_information(&self) -> Option<f64> {
        self.value.map(|v| -v)
    }
}

/// Similarity metric over two equally long 8-bit images.
pub trait Metric<B: Backend> {
    /// Evaluate the metric between `moving` and `fixed`.
    fn evaluate(&self, moving: &[u8], fixed: &[u8], request: OutputRequest) -> Result<MetricOutput<B>>;

    /// Get the name of this metric.
    fn name(&self) -> &'static str;
}
