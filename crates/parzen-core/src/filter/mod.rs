//! Stencil filters over bin matrices.

pub mod separable;

pub use separable::{convolve_axis, Axis, SeparableFilter};
