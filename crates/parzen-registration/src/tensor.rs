//! Interop with image tensors.
//!
//! Float tensors are quantised to 8-bit samples before entering the metric,
//! and the per-pixel gradient is handed back in the shape of the input image
//! on the caller's device.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use crate::error::{RegistrationError, Result};
use crate::metric::{Gradient, Metric, MetricOutput, OutputRequest, ParzenMutualInformation};
use crate::validation::{sanitize_intensities, IntensityPolicy};

/// Round every element of `tensor` to the nearest integer intensity.
///
/// Negative values become 0 and values above 255 become 255 before `policy`
/// is applied against `bins`, so `Reject` only reports values that survive
/// rounding but still fall outside `0..bins`.
///
/// # Errors
/// NaN or infinite elements are reported as numerical instability.
pub fn quantize_tensor<B: Backend, const D: usize>(
    tensor: &Tensor<B, D>,
    bins: usize,
    policy: IntensityPolicy,
) -> Result<Vec<u8>> {
    let values = tensor
        .clone()
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| RegistrationError::metric(format!("cannot read tensor data: {:?}", e)))?;

    let mut samples = Vec::with_capacity(values.len());
    for (index, v) in values.into_iter().enumerate() {
        if !v.is_finite() {
            return Err(RegistrationError::numerical_instability(format!(
                "tensor element {} is {}",
                index, v
            )));
        }
        samples.push(v.round().clamp(0.0, 255.0) as u8);
    }

    Ok(sanitize_intensities(&samples, bins, policy)?.into_owned())
}

impl<B: Backend> ParzenMutualInformation<B> {
    /// Evaluate on float image tensors of identical shape.
    ///
    /// Returns the metric output together with the per-pixel gradient reshaped
    /// to the input shape, on the device of `moving`, when a per-pixel
    /// gradient was requested.
    pub fn evaluate_tensors<const D: usize>(
        &self,
        moving: &Tensor<B, D>,
        fixed: &Tensor<B, D>,
        request: OutputRequest,
    ) -> Result<(MetricOutput<B>, Option<Tensor<B, D>>)> {
        let moving_dims = moving.dims();
        let fixed_dims = fixed.dims();
        if moving_dims != fixed_dims {
            return Err(RegistrationError::ShapeMismatch {
                expected: moving_dims.to_vec(),
                actual: fixed_dims.to_vec(),
            });
        }

        let bins = self.config().bins;
        let policy = self.config().intensity_policy;
        let moving_samples = quantize_tensor(moving, bins, policy)?;
        let fixed_samples = quantize_tensor(fixed, bins, policy)?;

        let output = self.evaluate(&moving_samples, &fixed_samples, request)?;
        let image = match &output.gradient {
            Some(Gradient::PerPixel(g)) => Some(g.clone().reshape(moving_dims).to_device(&moving.device())),
            _ => None,
        };
        Ok((output, image))
    }
}
