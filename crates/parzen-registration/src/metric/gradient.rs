//! Gradient engine.
//!
//! With rows indexing the moving intensity, the smoothing of `P` is
//! differentiated along the row axis:
//!
//! - `alpha` = vertical pass of `derivative` then horizontal pass of
//!   `smoothing` over `L`,
//! - `beta` = vertical pass of `derivative_k` over `P / Pk`,
//! - `grad = beta - correction - alpha`.
//!
//! `-alpha[m][f]` alone is `N` times the derivative of the value with respect
//! to a moving sample at bin pair `(m, f)`. `beta` is the second term of the
//! scheme and `correction` vanishes for windows whose derivative sums to zero.
//!
//! The per-pixel gradient gathers `grad` at each pixel's own bin pair. The
//! windowed variant evaluates the same stencil only around that pair.

use burn::tensor::backend::Backend;
use burn::tensor::{Int, Tensor, TensorData};
use parzen_core::filter::{convolve_axis, Axis, SeparableFilter};
use parzen_core::histogram::HistogramLayout;
use parzen_core::kernel::ParzenWindow;

use super::probability::JointProbability;
use crate::error::Result;

/// The three terms of the per-bin gradient, over the full (padded) layout.
#[derive(Debug, Clone)]
pub struct GradientTerms<B: Backend> {
    pub alpha: Tensor<B, 2>,
    pub beta: Tensor<B, 2>,
    pub correction: f64,
}

impl<B: Backend> GradientTerms<B> {
    pub fn compute(prob: &JointProbability<B>, l: &Tensor<B, 2>, window: &ParzenWindow) -> Result<Self> {
        let alpha =
            SeparableFilter::vertical_then_horizontal(window.derivative(), window.smoothing()).apply(l.clone())?;
        let beta = convolve_axis(prob.conditional_on_fixed(), window.derivative_k(), Axis::Vertical)?;
        Ok(Self {
            alpha,
            beta,
            correction: window.correction_constant(),
        })
    }

    /// `beta - correction - alpha`, elementwise.
    pub fn gradient_matrix(&self) -> Tensor<B, 2> {
        self.beta
            .clone()
            .sub_scalar(self.correction)
            .sub(self.alpha.clone())
    }
}

/// Read `matrix` at every pixel's `(moving, fixed)` bin pair.
///
/// `layout` maps intensities to matrix indices; pass an unpadded layout for a
/// `bins x bins` matrix.
pub fn gather_per_pixel<B: Backend>(
    matrix: &Tensor<B, 2>,
    moving: &[u8],
    fixed: &[u8],
    layout: HistogramLayout,
) -> Tensor<B, 1> {
    let [rows, cols] = matrix.dims();
    let indices: Vec<i64> = moving
        .iter()
        .zip(fixed)
        .map(|(&m, &f)| (layout.index(m) * cols + layout.index(f)) as i64)
        .collect();
    let len = indices.len();
    let indices = Tensor::<B, 1, Int>::from_data(TensorData::new(indices, [len]), &matrix.device());
    matrix.clone().reshape([rows * cols]).select(0, indices)
}

/// Per-pixel gradient without running the full `alpha` and `beta` passes.
///
/// Every pixel reads only the taps of the stencil centred on its own bin pair.
/// Taps outside the layout contribute zero, as in the full passes, so the
/// result matches [`gather_per_pixel`] over [`GradientTerms::gradient_matrix`]
/// for every bin, edge bins included.
pub fn windowed_per_pixel<B: Backend>(
    l: &Tensor<B, 2>,
    ratio: &Tensor<B, 2>,
    window: &ParzenWindow,
    moving: &[u8],
    fixed: &[u8],
    layout: HistogramLayout,
) -> Tensor<B, 1> {
    let alpha_taps: Vec<(isize, isize, f64)> = taps(window.derivative())
        .flat_map(|(a, &d)| taps(window.smoothing()).map(move |(b, &w)| (a, b, d * w)))
        .collect();
    let beta_taps: Vec<(isize, isize, f64)> = taps(window.derivative_k()).map(|(a, &d)| (a, 0, d)).collect();

    let alpha = stencil_sum(l, &alpha_taps, moving, fixed, layout);
    let beta = stencil_sum(ratio, &beta_taps, moving, fixed, layout);

    beta.sub_scalar(window.correction_constant()).sub(alpha)
}

/// `sum_t matrix[m + dr_t][f + dc_t] * w_t` around every pixel's bin pair.
fn stencil_sum<B: Backend>(
    matrix: &Tensor<B, 2>,
    stencil: &[(isize, isize, f64)],
    moving: &[u8],
    fixed: &[u8],
    layout: HistogramLayout,
) -> Tensor<B, 1> {
    let [rows, cols] = matrix.dims();
    let n = moving.len();
    let mut indices = Vec::with_capacity(n * stencil.len());
    let mut weights = Vec::with_capacity(n * stencil.len());

    for (&m, &f) in moving.iter().zip(fixed) {
        let (m, f) = (layout.index(m) as isize, layout.index(f) as isize);
        for &(dr, dc, w) in stencil {
            let (r, c) = (m + dr, f + dc);
            if r < 0 || c < 0 || r >= rows as isize || c >= cols as isize {
                // out-of-range taps read cell 0 with no weight
                indices.push(0i64);
                weights.push(0.0);
            } else {
                indices.push(r as i64 * cols as i64 + c as i64);
                weights.push(w);
            }
        }
    }

    let device = matrix.device();
    let len = indices.len();
    let indices = Tensor::<B, 1, Int>::from_data(TensorData::new(indices, [len]), &device);
    let weights = Tensor::<B, 1>::from_data(TensorData::new(weights, [len]), &device);

    matrix
        .clone()
        .reshape([rows * cols])
        .select(0, indices)
        .mul(weights)
        .reshape([n, stencil.len()])
        .sum_dim(1)
        .reshape([n])
}

/// Kernel weights paired with their signed offset from the centre tap.
fn taps(kernel: &[f64]) -> impl Iterator<Item = (isize, &f64)> {
    let radius = (kernel.len() / 2) as isize;
    kernel
        .iter()
        .enumerate()
        .map(move |(i, w)| (i as isize - radius, w))
}
