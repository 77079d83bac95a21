//! Probability normalizer.
//!
//! Smooths the joint counts with the Parzen window (vertical pass, then
//! horizontal pass) and divides by the sample count.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use parzen_core::histogram::JointHistogram;
use parzen_core::kernel::ParzenWindow;
use parzen_core::matrix;
use parzen_core::SeparableFilter;

use crate::error::Result;

/// Joint probability `P` with its marginals.
///
/// `pj` sums over the fixed axis and is kept as a `[dim, 1]` column; `pk`
/// sums over the moving axis and is kept as a `[1, dim]` row, so both
/// broadcast against `P` directly.
#[derive(Debug, Clone)]
pub struct JointProbability<B: Backend> {
    p: Tensor<B, 2>,
    pj: Tensor<B, 2>,
    pk: Tensor<B, 2>,
}

impl<B: Backend> JointProbability<B> {
    /// Parzen estimate of `P` from a joint histogram.
    pub fn estimate(histogram: &JointHistogram, window: &ParzenWindow, device: &B::Device) -> Result<Self> {
        let counts = histogram.to_tensor::<B>(device);
        let smoothed = SeparableFilter::symmetric(window.smoothing()).apply(counts)?;
        Ok(Self::from_matrix(smoothed.div_scalar(histogram.samples() as f64)))
    }

    /// Take `p` as given and compute its marginals.
    pub fn from_matrix(p: Tensor<B, 2>) -> Self {
        let pj = p.clone().sum_dim(1);
        let pk = p.clone().sum_dim(0);
        Self { p, pj, pk }
    }

    pub fn p(&self) -> &Tensor<B, 2> {
        &self.p
    }

    /// Marginal of the moving image, one entry per row.
    pub fn pj(&self) -> Tensor<B, 1> {
        let [rows, _] = self.p.dims();
        self.pj.clone().reshape([rows])
    }

    /// Marginal of the fixed image, one entry per column.
    pub fn pk(&self) -> Tensor<B, 1> {
        let [_, cols] = self.p.dims();
        self.pk.clone().reshape([cols])
    }

    /// `Pj[j] * Pk[k]` for every bin pair.
    pub fn independent(&self) -> Tensor<B, 2> {
        self.pj.clone().matmul(self.pk.clone())
    }

    /// Total probability mass.
    pub fn total(&self) -> f64 {
        matrix::sum(self.p.clone())
    }

    /// `P[j][k] / Pk[k]`, zero in columns whose fixed marginal is empty.
    pub fn conditional_on_fixed(&self) -> Tensor<B, 2> {
        // An empty column of a non-negative P is all zeros, so dividing it by
        // one leaves it at zero.
        let empty = self.pk.clone().equal_elem(0.0);
        let pk = self.pk.clone().mask_fill(empty, 1.0);
        self.p.clone().div(pk.expand(self.p.dims()))
    }
}
