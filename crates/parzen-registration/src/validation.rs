//! Validation utilities for metric inputs and outputs.
//!
//! The numeric core assumes equally long images with intensities inside
//! `0..bins`. These checks establish that at the boundary, and verify on the
//! way out that no NaN or infinity escaped the degeneracy handling.

use std::borrow::Cow;

use burn::tensor::backend::Backend;
use burn::tensor::{ElementConversion, Tensor};
use parzen_core::histogram::MAX_BINS;
use serde::{Deserialize, Serialize};

use crate::error::{RegistrationError, Result};

/// What to do with intensities outside `0..bins`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IntensityPolicy {
    /// Fail with [`RegistrationError::IntensityOutOfRange`].
    #[default]
    Reject,
    /// Clamp to `bins - 1`.
    Clamp,
}

/// Validate that two images have the same number of samples.
pub fn validate_sample_lengths(moving: &[u8], fixed: &[u8]) -> Result<()> {
    if moving.len() != fixed.len() {
        return Err(RegistrationError::ShapeMismatch {
            expected: vec![moving.len()],
            actual: vec![fixed.len()],
        });
    }
    if moving.is_empty() {
        return Err(RegistrationError::metric("images must contain at least one sample"));
    }
    if moving.len() > u32::MAX as usize {
        return Err(RegistrationError::metric(format!(
            "{} samples exceed the joint histogram counter range",
            moving.len()
        )));
    }
    Ok(())
}

/// Validate the histogram bin count.
pub fn validate_bin_count(bins: usize) -> Result<()> {
    if bins == 0 {
        return Err(RegistrationError::invalid_configuration(
            "Number of bins must be positive",
        ));
    }
    if bins > MAX_BINS {
        return Err(RegistrationError::invalid_configuration(format!(
            "Number of bins too large for 8-bit intensities: {}",
            bins
        )));
    }
    Ok(())
}

/// Bring `samples` into `0..bins` according to `policy`.
///
/// Borrows the input when nothing needs to change.
pub fn sanitize_intensities(samples: &[u8], bins: usize, policy: IntensityPolicy) -> Result<Cow<'_, [u8]>> {
    validate_bin_count(bins)?;
    let Some(first) = samples.iter().position(|&v| v as usize >= bins) else {
        return Ok(Cow::Borrowed(samples));
    };

    match policy {
        IntensityPolicy::Reject => Err(RegistrationError::IntensityOutOfRange {
            index: first,
            value: samples[first] as f64,
            bins,
        }),
        IntensityPolicy::Clamp => {
            let max = (bins - 1) as u8;
            let clamped = samples.iter().filter(|&&v| v > max).count();
            tracing::warn!(clamped, bins, "clamping out-of-range intensities");
            Ok(Cow::Owned(samples.iter().map(|&v| v.min(max)).collect()))
        }
    }
}

/// Fail if any value is NaN or infinite.
pub fn validate_finite(values: &[f64], what: &str) -> Result<()> {
    if let Some(index) = values.iter().position(|v| !v.is_finite()) {
        return Err(RegistrationError::numerical_instability(format!(
            "{} holds non-finite value {} at index {}",
            what, values[index], index
        )));
    }
    Ok(())
}

/// Fail if any tensor element is NaN or infinite.
pub fn validate_finite_tensor<B: Backend, const D: usize>(tensor: &Tensor<B, D>, what: &str) -> Result<()> {
    let bad = tensor
        .clone()
        .is_finite()
        .bool_not()
        .int()
        .sum()
        .into_scalar()
        .elem::<i64>();
    if bad > 0 {
        return Err(RegistrationError::numerical_instability(format!(
            "{} holds {} non-finite values",
            what, bad
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::tensor::TensorData;
    use burn_ndarray::NdArray;

    #[test]
    fn test_length_mismatch() {
        let err = validate_sample_lengths(&[1, 2, 3], &[1, 2]).unwrap_err();
        assert!(matches!(err, RegistrationError::ShapeMismatch { .. }));
        assert!(validate_sample_lengths(&[], &[]).is_err());
        assert!(validate_sample_lengths(&[1], &[2]).is_ok());
    }

    #[test]
    fn test_bin_count() {
        assert!(validate_bin_count(0).is_err());
        assert!(validate_bin_count(257).is_err());
        assert!(validate_bin_count(1).is_ok());
        assert!(validate_bin_count(256).is_ok());
    }

    #[test]
    fn test_reject_out_of_range() {
        let err = sanitize_intensities(&[0, 3, 9, 2], 8, IntensityPolicy::Reject).unwrap_err();
        match err {
            RegistrationError::IntensityOutOfRange { index, value, bins } => {
                assert_eq!(index, 2);
                assert_eq!(value, 9.0);
                assert_eq!(bins, 8);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_clamp_out_of_range() {
        let out = sanitize_intensities(&[0, 3, 9, 255], 8, IntensityPolicy::Clamp).unwrap();
        assert_eq!(out.as_ref(), &[0, 3, 7, 7]);
    }

    #[test]
    fn test_in_range_is_borrowed() {
        let samples = [0u8, 1, 2];
        let out = sanitize_intensities(&samples, 3, IntensityPolicy::Reject).unwrap();
        assert!(matches!(out, Cow::Borrowed(_)));
    }

    #[test]
    fn test_validate_finite() {
        assert!(validate_finite(&[0.0, -1.0, 1e300], "gradient").is_ok());
        let err = validate_finite(&[0.0, f64::NAN], "gradient").unwrap_err();
        assert!(err.to_string().contains("index 1"));
        assert!(validate_finite(&[f64::NEG_INFINITY], "value").is_err());
    }

    #[test]
    fn test_validate_finite_tensor() {
        let device = Default::default();
        let ok = Tensor::<NdArray<f64>, 1>::from_data(TensorData::new(vec![0.0, -3.5, 1e300], [3]), &device);
        assert!(validate_finite_tensor(&ok, "gradient").is_ok());

        let bad = Tensor::<NdArray<f64>, 2>::from_data(
            TensorData::new(vec![0.0, f64::NAN, f64::INFINITY, 1.0], [2, 2]),
            &device,
        );
        let err = validate_finite_tensor(&bad, "gradient").unwrap_err();
        assert!(err.to_string().contains("2 non-finite"));
    }
}
