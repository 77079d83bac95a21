//! Joint intensity histograms.
//!
//! `counts[m][f]` is the number of positions where the moving image holds
//! intensity `m` and the fixed image holds intensity `f`. Rows index the moving
//! image and columns the fixed image throughout the crate.
//!
//! Counting is integer work on the host. The finished counts are handed to
//! the tensor pipeline through [`JointHistogram::to_tensor`].

use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Largest supported bin count (one bin per 8-bit intensity).
pub const MAX_BINS: usize = 256;

/// Shape of a (possibly padded) joint histogram.
///
/// Padding adds `padding` empty bins on every side so that a zero-padded
/// smoothing pass of matching radius keeps all of the probability mass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistogramLayout {
    bins: usize,
    padding: usize,
}

impl HistogramLayout {
    pub fn new(bins: usize, padding: usize) -> Result<Self> {
        if bins == 0 || bins > MAX_BINS {
            return Err(CoreError::InvalidBinCount { bins });
        }
        Ok(Self { bins, padding })
    }

    /// Unpadded layout.
    pub fn unpadded(bins: usize) -> Result<Self> {
        Self::new(bins, 0)
    }

    pub fn bins(&self) -> usize {
        self.bins
    }

    pub fn padding(&self) -> usize {
        self.padding
    }

    /// Side length of the stored matrix.
    pub fn dim(&self) -> usize {
        self.bins + 2 * self.padding
    }

    /// Matrix index of intensity `value`.
    #[inline]
    pub fn index(&self, value: u8) -> usize {
        value as usize + self.padding
    }
}

/// Integer joint histogram of two equally sized images.
///
/// Counts are stored row-major, `counts[m * dim + f]`.
#[derive(Debug, Clone, PartialEq)]
pub struct JointHistogram {
    layout: HistogramLayout,
    counts: Vec<u32>,
    samples: usize,
}

impl JointHistogram {
    /// Count intensity pairs in a single pass.
    ///
    /// Intensities must lie in `0..layout.bins()`; callers are expected to have
    /// validated or clamped them. This is checked in debug builds only.
    ///
    /// # Errors
    /// [`CoreError::LengthMismatch`] when the images differ in length and
    /// [`CoreError::EmptyInput`] when they are empty.
    pub fn build(moving: &[u8], fixed: &[u8], layout: HistogramLayout) -> Result<Self> {
        check_lengths(moving, fixed)?;
        let counts = count_pairs(moving, fixed, layout);
        Ok(Self {
            layout,
            counts,
            samples: moving.len(),
        })
    }

    /// Count intensity pairs over `chunk_size` slices in parallel and merge
    /// the partial counts by addition.
    ///
    /// Produces exactly the same counts as [`build`](Self::build).
    pub fn build_parallel(
        moving: &[u8],
        fixed: &[u8],
        layout: HistogramLayout,
        chunk_size: usize,
    ) -> Result<Self> {
        check_lengths(moving, fixed)?;
        let chunk_size = chunk_size.max(1);
        let dim = layout.dim();

        tracing::trace!(
            samples = moving.len(),
            chunk_size,
            chunks = moving.len().div_ceil(chunk_size),
            "parallel joint histogram"
        );

        let counts = moving
            .par_chunks(chunk_size)
            .zip(fixed.par_chunks(chunk_size))
            .map(|(m, f)| count_pairs(m, f, layout))
            .reduce(
                || vec![0u32; dim * dim],
                |mut acc, part| {
                    for (a, p) in acc.iter_mut().zip(&part) {
                        *a += p;
                    }
                    acc
                },
            );

        Ok(Self {
            layout,
            counts,
            samples: moving.len(),
        })
    }

    pub fn layout(&self) -> HistogramLayout {
        self.layout
    }

    /// Row-major counts over the padded layout.
    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    /// Count at matrix position `(row, col)` of the padded layout.
    pub fn count(&self, row: usize, col: usize) -> u32 {
        self.counts[row * self.layout.dim() + col]
    }

    /// Counts as a `dim x dim` float tensor on `device`.
    pub fn to_tensor<B: Backend>(&self, device: &B::Device) -> Tensor<B, 2> {
        let dim = self.layout.dim();
        let data: Vec<f64> = self.counts.iter().map(|&c| c as f64).collect();
        Tensor::from_data(TensorData::new(data, [dim, dim]), device)
    }

    /// Number of pixel pairs counted (N).
    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Total of all counts; always equal to [`samples`](Self::samples).
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| c as u64).sum()
    }
}

fn check_lengths(moving: &[u8], fixed: &[u8]) -> Result<()> {
    if moving.len() != fixed.len() {
        return Err(CoreError::LengthMismatch {
            moving: moving.len(),
            fixed: fixed.len(),
        });
    }
    if moving.is_empty() {
        return Err(CoreError::EmptyInput);
    }
    Ok(())
}

fn count_pairs(moving: &[u8], fixed: &[u8], layout: HistogramLayout) -> Vec<u32> {
    let dim = layout.dim();
    let mut counts = vec![0u32; dim * dim];
    for (&m, &f) in moving.iter().zip(fixed) {
        debug_assert!((m as usize) < layout.bins() && (f as usize) < layout.bins());
        counts[layout.index(m) * dim + layout.index(f)] += 1;
    }
    counts
}
