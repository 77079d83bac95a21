//! Error types for the numeric core.

use thiserror::Error;

/// Errors raised by histogram, matrix and stencil construction.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Stencil kernels must have odd, non-zero length so they have a centre tap.
    #[error("Kernel length must be odd and non-zero, got {len}")]
    KernelLength { len: usize },

    /// The smoothing kernel does not preserve probability mass.
    #[error("Smoothing kernel must sum to 1, got {sum}")]
    KernelNormalization { sum: f64 },

    /// The two sample buffers differ in length.
    #[error("Sample length mismatch: moving has {moving}, fixed has {fixed}")]
    LengthMismatch { moving: usize, fixed: usize },

    /// Bin count outside the 8-bit intensity domain.
    #[error("Bin count must be in 1..=256, got {bins}")]
    InvalidBinCount { bins: usize },

    /// Backing buffer does not match the requested matrix shape.
    #[error("Matrix of {rows}x{cols} cannot be built from {len} elements")]
    MatrixShape { rows: usize, cols: usize, len: usize },

    /// A sub-block reaches past the edge of its matrix.
    #[error("Crop of {rows}x{cols} at offset {offset} exceeds a {height}x{width} matrix")]
    CropBounds {
        offset: usize,
        rows: usize,
        cols: usize,
        height: usize,
        width: usize,
    },

    /// Tensor contents could not be read back to the host.
    #[error("Tensor data error: {reason}")]
    TensorData { reason: String },

    /// No samples were supplied.
    #[error("Input is empty")]
    EmptyInput,
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
