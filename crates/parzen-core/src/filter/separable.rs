//! Separable 1D stencils with implicit zero padding.
//!
//! A 2D convolution whose kernel is the outer product of two 1D kernels is
//! applied as two 1D passes along orthogonal axes. Each pass writes
//! `out[r][c] = sum_a in[r + a][c] * kernel[a + radius]` (vertical) or
//! `out[r][c] = sum_a in[r][c + a] * kernel[a + radius]` (horizontal), where
//! taps falling outside the matrix contribute zero. There is no wraparound and
//! no edge clamping.
//!
//! Passes run as `conv1d` over every line of the matrix at once: the lines
//! become the batch dimension and the sliding axis becomes the signal length.
//! `conv1d` is a cross-correlation, which is exactly the orientation above.

use burn::tensor::backend::Backend;
use burn::tensor::module::conv1d;
use burn::tensor::ops::ConvOptions;
use burn::tensor::{Tensor, TensorData};

use crate::error::{CoreError, Result};

/// Axis along which a 1D stencil slides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Neighbours vary by row, column fixed.
    Vertical,
    /// Neighbours vary by column, row fixed.
    Horizontal,
}

/// Apply a 1D stencil along `axis`.
///
/// The output has the same shape as the input.
///
/// # Errors
/// Returns [`CoreError::KernelLength`] for empty or even-length kernels.
pub fn convolve_axis<B: Backend>(input: Tensor<B, 2>, kernel: &[f64], axis: Axis) -> Result<Tensor<B, 2>> {
    if kernel.is_empty() || kernel.len() % 2 == 0 {
        return Err(CoreError::KernelLength { len: kernel.len() });
    }

    let [rows, cols] = input.dims();
    if rows == 0 || cols == 0 {
        return Ok(input);
    }
    let device = input.device();

    // Lines to filter run along the last dimension.
    let lines = match axis {
        Axis::Vertical => input.transpose(),
        Axis::Horizontal => input,
    };
    let [batch, len] = lines.dims();

    let weight = Tensor::<B, 1>::from_data(TensorData::new(kernel.to_vec(), [kernel.len()]), &device)
        .reshape([1, 1, kernel.len()]);
    let options = ConvOptions::new([1], [kernel.len() / 2], [1], 1);
    let filtered = conv1d(lines.reshape([batch, 1, len]), weight, None, options).reshape([batch, len]);

    Ok(match axis {
        Axis::Vertical => filtered.transpose(),
        Axis::Horizontal => filtered,
    })
}

/// Two sequential 1D passes realising a separable 2D stencil.
///
/// The first pass may use a different kernel from the second, which is how the
/// gradient terms mix a smoothing kernel on one axis with a derivative kernel
/// on the other.
#[derive(Debug, Clone)]
pub struct SeparableFilter<'a> {
    first: (Axis, &'a [f64]),
    second: (Axis, &'a [f64]),
}

impl<'a> SeparableFilter<'a> {
    /// Vertical pass with `vertical`, then horizontal pass with `horizontal`.
    pub fn vertical_then_horizontal(vertical: &'a [f64], horizontal: &'a [f64]) -> Self {
        Self {
            first: (Axis::Vertical, vertical),
            second: (Axis::Horizontal, horizontal),
        }
    }

    /// Horizontal pass with `horizontal`, then vertical pass with `vertical`.
    pub fn horizontal_then_vertical(horizontal: &'a [f64], vertical: &'a [f64]) -> Self {
        Self {
            first: (Axis::Horizontal, horizontal),
            second: (Axis::Vertical, vertical),
        }
    }

    /// Same kernel on both axes, vertical first.
    pub fn symmetric(kernel: &'a [f64]) -> Self {
        Self::vertical_then_horizontal(kernel, kernel)
    }

    /// Apply both passes.
    pub fn apply<B: Backend>(&self, input: Tensor<B, 2>) -> Result<Tensor<B, 2>> {
        let partial = convolve_axis(input, self.first.1, self.first.0)?;
        convolve_axis(partial, self.second.1, self.second.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{from_vec, sum, to_vec};
    use burn_ndarray::NdArray;

    type B = NdArray<f64>;

    fn impulse(size: usize, at: (usize, usize)) -> Tensor<B, 2> {
        let mut data = vec![0.0; size * size];
        data[at.0 * size + at.1] = 1.0;
        from_vec(size, size, data, &Default::default()).unwrap()
    }

    fn at(values: &[f64], size: usize, r: usize, c: usize) -> f64 {
        values[r * size + c]
    }

    #[test]
    fn test_vertical_spreads_along_rows() {
        let out = convolve_axis(impulse(5, (2, 2)), &[0.25, 0.5, 0.25], Axis::Vertical).unwrap();
        let out = to_vec(out).unwrap();
        assert_eq!(at(&out, 5, 1, 2), 0.25);
        assert_eq!(at(&out, 5, 2, 2), 0.5);
        assert_eq!(at(&out, 5, 3, 2), 0.25);
        assert_eq!(at(&out, 5, 2, 1), 0.0);
        assert_eq!(at(&out, 5, 2, 3), 0.0);
    }

    #[test]
    fn test_horizontal_spreads_along_columns() {
        let out = convolve_axis(impulse(5, (2, 2)), &[0.25, 0.5, 0.25], Axis::Horizontal).unwrap();
        let out = to_vec(out).unwrap();
        assert_eq!(at(&out, 5, 2, 1), 0.25);
        assert_eq!(at(&out, 5, 2, 3), 0.25);
        assert_eq!(at(&out, 5, 1, 2), 0.0);
    }

    #[test]
    fn test_correlation_orientation() {
        // out[r] = in[r-1]*k[0] + in[r]*k[1] + in[r+1]*k[2]
        let m = from_vec::<B>(3, 1, vec![1.0, 2.0, 4.0], &Default::default()).unwrap();
        let out = convolve_axis(m, &[-0.5, 0.0, 0.5], Axis::Vertical).unwrap();
        assert_eq!(out.dims(), [3, 1]);
        assert_eq!(to_vec(out).unwrap(), vec![1.0, 1.5, -1.0]);
    }

    #[test]
    fn test_rectangular_shape_is_kept() {
        let m = from_vec::<B>(2, 4, vec![1.0; 8], &Default::default()).unwrap();
        let out = convolve_axis(m.clone(), &[0.25, 0.5, 0.25], Axis::Vertical).unwrap();
        assert_eq!(out.dims(), [2, 4]);
        assert_eq!(to_vec(out).unwrap(), vec![0.75; 8]);
        let out = convolve_axis(m, &[0.25, 0.5, 0.25], Axis::Horizontal).unwrap();
        assert_eq!(to_vec(out).unwrap(), vec![0.75, 1.0, 1.0, 0.75, 0.75, 1.0, 1.0, 0.75]);
    }

    #[test]
    fn test_zero_padding_loses_edge_mass() {
        let out = SeparableFilter::symmetric(&[1.0 / 6.0, 2.0 / 3.0, 1.0 / 6.0])
            .apply(impulse(3, (0, 0)))
            .unwrap();
        let values = to_vec(out.clone()).unwrap();
        let expected = (5.0f64 / 6.0) * (5.0 / 6.0);
        assert!((sum(out) - expected).abs() < 1e-12);
        // No wraparound onto the far edge.
        assert_eq!(at(&values, 3, 2, 2), 0.0);
        assert_eq!(at(&values, 3, 0, 2), 0.0);
    }

    #[test]
    fn test_pass_order_commutes_for_outer_product() {
        let data: Vec<f64> = (0..36).map(|v| ((v * 7) % 11) as f64).collect();
        let m = from_vec::<B>(6, 6, data, &Default::default()).unwrap();
        let smooth = [1.0 / 6.0, 2.0 / 3.0, 1.0 / 6.0];
        let deriv = [-0.5, 0.0, 0.5];
        let a = SeparableFilter::vertical_then_horizontal(&deriv, &smooth).apply(m.clone()).unwrap();
        let b = SeparableFilter::horizontal_then_vertical(&smooth, &deriv).apply(m).unwrap();
        for (x, y) in to_vec(a).unwrap().iter().zip(to_vec(b).unwrap()) {
            assert!((x - y).abs() < 1e-12);
        }
    }

    #[test]
    fn test_even_kernel_rejected() {
        let err = convolve_axis(impulse(3, (1, 1)), &[0.5, 0.5], Axis::Vertical).unwrap_err();
        assert_eq!(err, CoreError::KernelLength { len: 2 });
    }

    #[test]
    fn test_identity_kernel() {
        let out = SeparableFilter::symmetric(&[1.0]).apply(impulse(4, (3, 1))).unwrap();
        let values = to_vec(out).unwrap();
        assert_eq!(at(&values, 4, 3, 1), 1.0);
        assert_eq!(values.iter().sum::<f64>(), 1.0);
    }
}
