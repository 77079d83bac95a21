//! Parzen-window mutual information with an analytic gradient.

use std::borrow::Cow;

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use parzen_core::histogram::{HistogramLayout, JointHistogram};
use parzen_core::matrix;
use tracing::debug;

use super::config::{GradientStrategy, MetricConfig};
use super::entropy::Entropies;
use super::gradient::{gather_per_pixel, windowed_per_pixel, GradientTerms};
use super::log_ratio::{log_ratio, reduce_value};
use super::probability::JointProbability;
use super::trait_::{Gradient, GradientMode, Metric, MetricOutput, OutputRequest};
use crate::error::{RegistrationError, Result};
use crate::validation::{sanitize_intensities, validate_finite, validate_finite_tensor, validate_sample_lengths};

/// Samples per task when the histogram is built in parallel.
const HISTOGRAM_CHUNK: usize = 1 << 14;

/// Mutual information metric over a Parzen-smoothed joint histogram.
///
/// The reported value is `-sum(P * L)`, the negated mutual information.
/// Counting happens on the host; smoothing, normalisation, log ratios and
/// gradient passes run as tensor operations on `device`. Every call recomputes
/// all matrices from scratch, so one instance can serve concurrent callers.
#[derive(Debug, Clone)]
pub struct ParzenMutualInformation<B: Backend> {
    config: MetricConfig,
    device: B::Device,
}

/// Sanitised inputs and the probability model built from them.
struct Estimate<'a, B: Backend> {
    moving: Cow<'a, [u8]>,
    fixed: Cow<'a, [u8]>,
    layout: HistogramLayout,
    prob: JointProbability<B>,
}

impl<B: Backend> Default for ParzenMutualInformation<B> {
    fn default() -> Self {
        Self {
            config: MetricConfig::default(),
            device: Default::default(),
        }
    }
}

impl<B: Backend> ParzenMutualInformation<B> {
    /// Create a metric on the default device after validating `config`.
    pub fn new(config: MetricConfig) -> Result<Self> {
        Self::with_device(config, Default::default())
    }

    /// Create a metric whose tensors live on `device`.
    pub fn with_device(config: MetricConfig, device: B::Device) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, device })
    }

    /// Default configuration with `bins` bins.
    pub fn with_bins(bins: usize) -> Result<Self> {
        Self::new(MetricConfig::new().with_bins(bins))
    }

    pub fn config(&self) -> &MetricConfig {
        &self.config
    }

    pub fn device(&self) -> &B::Device {
        &self.device
    }

    /// Build the joint histogram, using rayon for large images.
    fn joint_histogram(&self, moving: &[u8], fixed: &[u8]) -> Result<JointHistogram> {
        let layout = self.config.layout()?;
        let hist = if moving.len() >= self.config.parallel_threshold {
            JointHistogram::build_parallel(moving, fixed, layout, HISTOGRAM_CHUNK)?
        } else {
            JointHistogram::build(moving, fixed, layout)?
        };
        debug!(
            bins = layout.bins(),
            padding = layout.padding(),
            samples = hist.samples(),
            "joint histogram built"
        );
        Ok(hist)
    }

    fn estimate<'a>(&self, moving: &'a [u8], fixed: &'a [u8]) -> Result<Estimate<'a, B>> {
        validate_sample_lengths(moving, fixed)?;
        let moving = sanitize_intensities(moving, self.config.bins, self.config.intensity_policy)?;
        let fixed = sanitize_intensities(fixed, self.config.bins, self.config.intensity_policy)?;

        let hist = self.joint_histogram(&moving, &fixed)?;
        let prob = JointProbability::estimate(&hist, &self.config.window, &self.device)?;
        debug!(mass = prob.total(), "joint probability normalised");

        Ok(Estimate {
            moving,
            fixed,
            layout: hist.layout(),
            prob,
        })
    }

    /// Joint probability after validation, clamping and smoothing.
    pub fn joint_probability(&self, moving: &[u8], fixed: &[u8]) -> Result<JointProbability<B>> {
        Ok(self.estimate(moving, fixed)?.prob)
    }

    /// `-sum(P * L)` in the configured log base.
    pub fn compute_mi(&self, moving: &[u8], fixed: &[u8]) -> Result<f64> {
        self.run(moving, fixed, OutputRequest::Value)?
            .value
            .ok_or_else(|| RegistrationError::metric("value was not produced"))
    }

    /// Analytic gradient of [`compute_mi`](Self::compute_mi) in the requested shape.
    ///
    /// Entries are `beta - correction - alpha`. The `-alpha` part is `N` times
    /// the derivative of the value with respect to a moving sample, and `beta`
    /// is an extra conditional-probability term, so the result tracks
    /// `N * dV/dm` closely but not exactly. See [`Gradient`].
    pub fn compute_mi_gradient(&self, moving: &[u8], fixed: &[u8], mode: GradientMode) -> Result<Gradient<B>> {
        self.run(moving, fixed, OutputRequest::Gradient(mode))?
            .gradient
            .ok_or_else(|| RegistrationError::metric("gradient was not produced"))
    }

    /// Value and gradient from a single histogram pass.
    ///
    /// The gradient is scaled as in [`compute_mi_gradient`](Self::compute_mi_gradient).
    pub fn compute_mi_and_gradient(
        &self,
        moving: &[u8],
        fixed: &[u8],
        mode: GradientMode,
    ) -> Result<(f64, Gradient<B>)> {
        let out = self.run(moving, fixed, OutputRequest::ValueAndGradient(mode))?;
        match (out.value, out.gradient) {
            (Some(value), Some(gradient)) => Ok((value, gradient)),
            _ => Err(RegistrationError::metric("value and gradient were not both produced")),
        }
    }

    /// Marginal and joint entropies in the configured log base.
    pub fn entropies(&self, moving: &[u8], fixed: &[u8]) -> Result<Entropies> {
        let est = self.estimate(moving, fixed)?;
        Ok(Entropies::from_probability(&est.prob).scaled(self.config.log_base.scale()))
    }

    /// Unscaled `alpha`, `beta` and correction over the full histogram layout.
    pub fn gradient_terms(&self, moving: &[u8], fixed: &[u8]) -> Result<GradientTerms<B>> {
        let est = self.estimate(moving, fixed)?;
        let l = log_ratio(&est.prob);
        GradientTerms::compute(&est.prob, &l, &self.config.window)
    }

    fn run(&self, moving: &[u8], fixed: &[u8], request: OutputRequest) -> Result<MetricOutput<B>> {
        let est = self.estimate(moving, fixed)?;
        let l = log_ratio(&est.prob);
        let scale = self.config.log_base.scale();

        let value = if request.wants_value() {
            let value = reduce_value(est.prob.p(), &l) * scale;
            debug!(value, "value reduced");
            if self.config.check_numerical_stability {
                validate_finite(&[value], "metric value")?;
            }
            Some(value)
        } else {
            None
        };

        let gradient = match request.gradient_mode() {
            None => None,
            Some(mode) => {
                let gradient = self.gradient(&est, &l, mode)?.scaled(scale);
                debug!(?mode, len = gradient.len(), "gradient produced");
                if self.config.check_numerical_stability {
                    match &gradient {
                        Gradient::PerPixel(g) => validate_finite_tensor(g, "metric gradient")?,
                        Gradient::Matrix(m) => validate_finite_tensor(m, "metric gradient")?,
                    }
                }
                Some(gradient)
            }
        };

        Ok(MetricOutput { value, gradient })
    }

    fn gradient(&self, est: &Estimate<'_, B>, l: &Tensor<B, 2>, mode: GradientMode) -> Result<Gradient<B>> {
        let window = &self.config.window;
        let layout = est.layout;

        Ok(match (mode, self.config.strategy) {
            (GradientMode::PerPixel, GradientStrategy::Windowed) => {
                let ratio = est.prob.conditional_on_fixed();
                Gradient::PerPixel(windowed_per_pixel(l, &ratio, window, &est.moving, &est.fixed, layout))
            }
            (GradientMode::PerPixel, GradientStrategy::Precomputed) => {
                let grad = GradientTerms::compute(&est.prob, l, window)?.gradient_matrix();
                Gradient::PerPixel(gather_per_pixel(&grad, &est.moving, &est.fixed, layout))
            }
            (GradientMode::Matrix, _) => {
                let grad = GradientTerms::compute(&est.prob, l, window)?.gradient_matrix();
                Gradient::Matrix(matrix::crop(grad, layout.padding(), layout.bins(), layout.bins())?)
            }
        })
    }
}

impl<B: Backend> Metric<B> for ParzenMutualInformation<B> {
    fn evaluate(&self, moving: &[u8], fixed: &[u8], request: OutputRequest) -> Result<MetricOutput<B>> {
        self.run(moving, fixed, request)
    }

    fn name(&self) -> &'static str {
        "ParzenMutualInformation"
    }
}
