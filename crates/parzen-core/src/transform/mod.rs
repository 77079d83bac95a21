//! Transform derivatives.
//!
//! Only the pieces needed to carry a per-pixel metric gradient onto transform
//! parameters live here; resampling is the caller's concern.

pub mod rigid;

pub use rigid::{parameter_gradient, RotateShiftJacobian};
