//! Parzen-window mutual information for gradient-based image registration.
//!
//! The metric value is `-sum(P * L)` over a cubic B-spline smoothed joint
//! histogram, i.e. the negated mutual information, so it decreases as images
//! align. Gradients are analytic and come either per bin pair or per pixel.
//!
//! The metric is generic over a `burn` backend. The free functions below run
//! on [`DefaultBackend`], the `f64` ndarray backend.
//!
//! ```no_run
//! use parzen_registration::{compute_mi_and_gradient, GradientMode};
//!
//! let moving = vec![0u8, 1, 1, 2];
//! let fixed = vec![0u8, 0, 1, 1];
//! let (value, gradient) = compute_mi_and_gradient(&moving, &fixed, 256, GradientMode::PerPixel)?;
//! # let _ = (value, gradient);
//! # Ok::<(), parzen_registration::RegistrationError>(())
//! ```

pub mod error;
pub mod metric;
pub mod tensor;
pub mod validation;

use burn_ndarray::NdArray;
use nalgebra::Vector3;
use parzen_core::image::ImageShape;
use parzen_core::transform::RotateShiftJacobian;

pub use error::{RegistrationError, Result};
pub use metric::{
    Entropies, Gradient, GradientMode, GradientStrategy, GradientTerms, JointProbability, LogBase, Metric,
    MetricConfig, MetricOutput, OutputRequest, ParzenMutualInformation,
};
pub use tensor::quantize_tensor;
pub use validation::IntensityPolicy;

/// Backend used by the free entry points.
pub type DefaultBackend = NdArray<f64>;

/// `-sum(P * L)` with the default window and `bins` bins.
pub fn compute_mi(moving: &[u8], fixed: &[u8], bins: usize) -> Result<f64> {
    ParzenMutualInformation::<DefaultBackend>::with_bins(bins)?.compute_mi(moving, fixed)
}

/// Analytic gradient of the [`compute_mi`] value, per pixel or per bin pair.
///
/// This is not a plain `dV/dm`. Each entry is `beta - correction - alpha`,
/// where `-alpha` equals `N * dV/dm` for `N` samples and `beta` is the
/// conditional-probability term of the scheme. Per-pixel entries therefore
/// follow `N` times a finite difference of the value, with `beta` as the gap.
pub fn compute_mi_gradient(
    moving: &[u8],
    fixed: &[u8],
    bins: usize,
    mode: GradientMode,
) -> Result<Gradient<DefaultBackend>> {
    ParzenMutualInformation::<DefaultBackend>::with_bins(bins)?.compute_mi_gradient(moving, fixed, mode)
}

/// Value and gradient from one histogram pass, scaled as in [`compute_mi_gradient`].
pub fn compute_mi_and_gradient(
    moving: &[u8],
    fixed: &[u8],
    bins: usize,
    mode: GradientMode,
) -> Result<(f64, Gradient<DefaultBackend>)> {
    ParzenMutualInformation::<DefaultBackend>::with_bins(bins)?.compute_mi_and_gradient(moving, fixed, mode)
}

/// Per-pixel derivatives of a rotate-and-shift transform, one
/// `(d_theta, d_tx, d_ty)` row per pixel of `shape`.
pub fn apply_transform_jacobian(
    grad_x: &[f64],
    grad_y: &[f64],
    theta: f64,
    alpha: f64,
    shape: ImageShape,
) -> Result<Vec<Vector3<f64>>> {
    Ok(RotateShiftJacobian::new(theta, alpha).derivatives(grad_x, grad_y, shape)?)
}
