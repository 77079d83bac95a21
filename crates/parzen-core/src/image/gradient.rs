//! Image gradients: forward differences and the 3x3 Sobel operator.

use crate::error::Result;
use super::ImageShape;

/// Per-pixel partial derivatives of a raster.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageGradient {
    /// `d/dx`, differences along a row.
    pub x: Vec<f64>,
    /// `d/dy`, differences along a column.
    pub y: Vec<f64>,
}

/// `gx[y][x] = I[y][x+1] - I[y][x]` and `gy[y][x] = I[y+1][x] - I[y][x]`,
/// with zeros on the last column (for `gx`) and last row (for `gy`).
pub fn forward_difference<T>(pixels: &[T], shape: ImageShape) -> Result<ImageGradient>
where
    T: Copy + Into<f64>,
{
    shape.check_buffer(pixels.len())?;
    let ImageShape { width, height } = shape;
    let mut x = vec![0.0; pixels.len()];
    let mut y = vec![0.0; pixels.len()];

    for row in 0..height {
        for col in 0..width {
            let i = row * width + col;
            let here: f64 = pixels[i].into();
            if col + 1 < width {
                let right: f64 = pixels[i + 1].into();
                x[i] = right - here;
            }
            if row + 1 < height {
                let below: f64 = pixels[i + width].into();
                y[i] = below - here;
            }
        }
    }

    Ok(ImageGradient { x, y })
}

/// Smoothing taps of the 3x3 Sobel operator, across the derivative direction.
const SOBEL_SMOOTH: [f64; 3] = [1.0, 2.0, 1.0];
/// Derivative taps of the 3x3 Sobel operator.
const SOBEL_DIFF: [f64; 3] = [-1.0, 0.0, 1.0];

/// Unnormalised 3x3 Sobel derivatives.
///
/// `gx` correlates `[-1 0 1]` along each row with `[1 2 1]` down each column,
/// `gy` the other way round. Neighbours outside the raster are mirrored about
/// the edge pixel without repeating it (`dcb|abcd|cba`), so a linear ramp has
/// zero derivative on its border columns.
pub fn sobel<T>(pixels: &[T], shape: ImageShape) -> Result<ImageGradient>
where
    T: Copy + Into<f64>,
{
    shape.check_buffer(pixels.len())?;
    let ImageShape { width, height } = shape;
    let mut x = vec![0.0; pixels.len()];
    let mut y = vec![0.0; pixels.len()];

    for row in 0..height {
        for col in 0..width {
            let mut gx = 0.0;
            let mut gy = 0.0;
            for (a, (&smooth_a, &diff_a)) in SOBEL_SMOOTH.iter().zip(&SOBEL_DIFF).enumerate() {
                let r = reflect_101(row as isize + a as isize - 1, height);
                for (b, (&smooth_b, &diff_b)) in SOBEL_SMOOTH.iter().zip(&SOBEL_DIFF).enumerate() {
                    let c = reflect_101(col as isize + b as isize - 1, width);
                    let v: f64 = pixels[r * width + c].into();
                    gx += v * smooth_a * diff_b;
                    gy += v * diff_a * smooth_b;
                }
            }
            x[row * width + col] = gx;
            y[row * width + col] = gy;
        }
    }

    Ok(ImageGradient { x, y })
}

/// Mirror `index` into `0..len` about the edge pixels.
fn reflect_101(index: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let last = len as isize - 1;
    let mut i = index;
    while i < 0 || i > last {
        i = if i < 0 { -i } else { 2 * last - i };
    }
    i as usize
}
