//! Numeric building blocks for Parzen-window mutual information.
//!
//! This crate holds the pieces that carry no probability semantics of their
//! own: tensor helpers for bin matrices, the joint histogram builder, the
//! separable zero-padded stencil engine built on `conv1d`, Parzen window
//! kernels, image gradients and the rigid transform jacobian used to chain a
//! metric gradient back onto transform parameters.

pub mod error;
pub mod matrix;
pub mod filter;
pub mod kernel;
pub mod histogram;
pub mod image;
pub mod transform;

pub use error::{CoreError, Result};
pub use filter::{Axis, SeparableFilter};
pub use kernel::ParzenWindow;
pub use histogram::{HistogramLayout, JointHistogram};
pub use image::ImageShape;
pub use transform::RotateShiftJacobian;
