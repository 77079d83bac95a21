//! Rotate-and-shift (2D rigid) transform jacobian.
//!
//! Parameters are `(theta, tx, ty)`. For a pixel at column `x`, row `y` with
//! image gradient `(gx, gy)` sampled at its transformed position, the
//! derivative of the transformed intensity is
//!
//! ```text
//! d/dtheta = alpha * (gx * (-x sin(theta) - y cos(theta)) + gy * (x cos(theta) - y sin(theta)))
//! d/dtx    = gy
//! d/dty    = gx
//! ```
//!
//! `alpha` rescales the angular component so that one step in theta is
//! comparable to one pixel of translation.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::image::ImageShape;

/// Jacobian of a rotate-shift transform at fixed parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RotateShiftJacobian {
    /// Rotation angle in radians.
    pub theta: f64,
    /// Scale applied to the angular derivative.
    pub alpha: f64,
}

impl RotateShiftJacobian {
    pub fn new(theta: f64, alpha: f64) -> Self {
        Self { theta, alpha }
    }

    /// One `(d/dtheta, d/dtx, d/dty)` row per pixel.
    ///
    /// # Errors
    /// Both gradient buffers must hold `shape.len()` values.
    pub fn derivatives(
        &self,
        gradient_x: &[f64],
        gradient_y: &[f64],
        shape: ImageShape,
    ) -> Result<Vec<Vector3<f64>>> {
        shape.check_buffer(gradient_x.len())?;
        shape.check_buffer(gradient_y.len())?;

        let (sin, cos) = self.theta.sin_cos();
        let rows = gradient_x
            .iter()
            .zip(gradient_y)
            .enumerate()
            .map(|(index, (&gx, &gy))| {
                let (x, y) = shape.coordinates(index);
                let (x, y) = (x as f64, y as f64);
                let d_theta = self.alpha * (gx * (-x * sin - y * cos) + gy * (x * cos - y * sin));
                Vector3::new(d_theta, gy, gx)
            })
            .collect();
        Ok(rows)
    }
}

/// Chain rule: `sum_i pixel_gradient[i] * jacobian[i]`.
pub fn parameter_gradient(pixel_gradient: &[f64], jacobian: &[Vector3<f64>]) -> Result<Vector3<f64>> {
    if pixel_gradient.len() != jacobian.len() {
        return Err(CoreError::MatrixShape {
            rows: jacobian.len(),
            cols: 3,
            len: pixel_gradient.len(),
        });
    }
    Ok(pixel_gradient
        .iter()
        .zip(jacobian)
        .fold(Vector3::zeros(), |acc, (&g, row)| acc + row * g))
}
