//! Shannon entropies of the Parzen joint distribution.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use parzen_core::matrix;

use super::probability::JointProbability;

/// Marginal and joint entropies in nats.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Entropies {
    pub moving: f64,
    pub fixed: f64,
    pub joint: f64,
}

impl Entropies {
    /// Entropies of `P`, `Pj` and `Pk`, skipping zero-probability bins.
    pub fn from_probability<B: Backend>(prob: &JointProbability<B>) -> Self {
        Self {
            moving: shannon(prob.pj()),
            fixed: shannon(prob.pk()),
            joint: shannon(prob.p().clone()),
        }
    }

    /// `H(moving) + H(fixed) - H(moving, fixed)`.
    pub fn mutual_information(&self) -> f64 {
        self.moving + self.fixed - self.joint
    }

    /// Multiply every entropy by `factor` (e.g. to convert nats to bits).
    pub fn scaled(self, factor: f64) -> Self {
        Self {
            moving: self.moving * factor,
            fixed: self.fixed * factor,
            joint: self.joint * factor,
        }
    }
}

fn shannon<B: Backend, const D: usize>(p: Tensor<B, D>) -> f64 {
    // ln(1) = 0 drops the empty bins from the sum
    let empty = p.clone().equal_elem(0.0);
    let log_p = p.clone().mask_fill(empty, 1.0).log();
    -matrix::sum(p.mul(log_p))
}
