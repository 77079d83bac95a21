//! Raster geometry and image derivatives.
//!
//! Images enter the metric as flat sample buffers; the 2D layout only matters
//! for spatial operations such as image gradients and transform jacobians.

pub mod gradient;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

pub use gradient::{forward_difference, sobel, ImageGradient};

/// Width and height of a row-major raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageShape {
    pub width: usize,
    pub height: usize,
}

impl ImageShape {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Number of pixels.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(x, y)` of the pixel at flat index `index`.
    #[inline]
    pub fn coordinates(&self, index: usize) -> (usize, usize) {
        (index % self.width, index / self.width)
    }

    /// Ensure a buffer holds exactly one value per pixel.
    pub fn check_buffer(&self, len: usize) -> Result<()> {
        if len != self.len() {
            return Err(CoreError::MatrixShape {
                rows: self.height,
                cols: self.width,
                len,
            });
        }
        Ok(())
    }
}
