//! Log-ratio matrix and value reduction.
//!
//! `L[j][k] = ln(P[j][k] / (Pj[j] * Pk[k]))` with one degeneracy rule shared
//! by the value and the gradient:
//!
//! - `Pj[j] * Pk[k] == 0` gives `L = 0`,
//! - otherwise `P[j][k] == 0` gives `L = LOG_ZERO`,
//! - otherwise the natural log of the ratio.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use parzen_core::matrix;

use super::probability::JointProbability;

/// Finite stand-in for `ln(0)`: `ln(f64::MIN_POSITIVE)`.
pub const LOG_ZERO: f64 = -708.396_418_532_264_1;

/// Build `L` from a joint probability.
pub fn log_ratio<B: Backend>(prob: &JointProbability<B>) -> Tensor<B, 2> {
    let denom = prob.independent();
    let no_mass = denom.clone().equal_elem(0.0);
    let empty = prob.p().clone().equal_elem(0.0);

    let num = prob.p().clone().mask_fill(empty.clone(), 1.0);
    let denom = denom.mask_fill(no_mass.clone(), 1.0);

    num.div(denom)
        .log()
        .mask_fill(empty, LOG_ZERO)
        .mask_fill(no_mass, 0.0)
}

/// `-sum(P * L)`.
pub fn reduce_value<B: Backend>(p: &Tensor<B, 2>, l: &Tensor<B, 2>) -> f64 {
    -matrix::sum(p.clone().mul(l.clone()))
}
