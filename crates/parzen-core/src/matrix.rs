//! Bin matrices as 2D tensors.
//!
//! Every histogram-shaped quantity in the pipeline (counts, probabilities, log
//! ratios, gradient terms) is a `Tensor<B, 2>` whose rows index the moving
//! intensity and whose columns index the fixed intensity. These helpers build
//! such tensors from host buffers, read them back, and cut out sub-blocks with
//! their bounds checked.

use burn::tensor::backend::Backend;
use burn::tensor::{ElementConversion, Tensor, TensorData};

use crate::error::{CoreError, Result};

/// Wrap a row-major host buffer as a `rows x cols` tensor on `device`.
pub fn from_vec<B: Backend>(rows: usize, cols: usize, data: Vec<f64>, device: &B::Device) -> Result<Tensor<B, 2>> {
    if data.len() != rows * cols {
        return Err(CoreError::MatrixShape {
            rows,
            cols,
            len: data.len(),
        });
    }
    Ok(Tensor::from_data(TensorData::new(data, [rows, cols]), device))
}

/// The `rows x cols` block whose top-left corner is `(offset, offset)`.
///
/// # Errors
/// [`CoreError::CropBounds`] when the block does not fit inside `matrix`.
pub fn crop<B: Backend>(matrix: Tensor<B, 2>, offset: usize, rows: usize, cols: usize) -> Result<Tensor<B, 2>> {
    let [height, width] = matrix.dims();
    if offset + rows > height || offset + cols > width {
        return Err(CoreError::CropBounds {
            offset,
            rows,
            cols,
            height,
            width,
        });
    }
    Ok(matrix.slice([offset..offset + rows, offset..offset + cols]))
}

/// Copy a tensor of any rank back to the host as `f64`, row-major.
pub fn to_vec<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> Result<Vec<f64>> {
    tensor
        .into_data()
        .convert::<f64>()
        .to_vec::<f64>()
        .map_err(|e| CoreError::TensorData {
            reason: format!("{:?}", e),
        })
}

/// Sum of every element.
pub fn sum<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> f64 {
    tensor.sum().into_scalar().elem::<f64>()
}
