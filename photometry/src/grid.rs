//! Rectangular intensity grid backing every photometric measurement.
//!
//! A [`Grid`] owns a non-empty `ndarray::Array2<f64>` indexed `[[y, x]]`.
//! Reductions (`mean`, `median`, `std`) are recomputed from the current
//! contents on every call, so in-place accumulation by a synthetic canvas is
//! always reflected.

use ndarray::{Array2, ArrayView2};

use crate::coordinate::PixelIndex;
use crate::error::{PhotometryError, Result};
use crate::stats;

/// A 2-D array of pixel samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    data: Array2<f64>,
}

impl Grid {
    /// Build a grid from a source array, e.g. the primary HDU of a FITS frame.
    ///
    /// # Errors
    /// [`PhotometryError::EmptyGrid`] when either axis has zero length.
    pub fn from_array(data: Array2<f64>) -> Result<Self> {
        let (height, width) = data.dim();
        if height == 0 || width == 0 {
            return Err(PhotometryError::EmptyGrid { height, width });
        }
        Ok(Self { data })
    }

    /// Build a grid from row-major samples.
    pub fn from_shape_vec(height: usize, width: usize, samples: Vec<f64>) -> Result<Self> {
        if height == 0 || width == 0 {
            return Err(PhotometryError::EmptyGrid { height, width });
        }
        let data = Array2::from_shape_vec((height, width), samples).map_err(|e| {
            PhotometryError::InvalidGeometry(format!(
                "cannot shape samples into {height}x{width} grid: {e}"
            ))
        })?;
        Ok(Self { data })
    }

    /// An all-zero canvas of the given size.
    pub fn zeros(width: usize, height: usize) -> Result<Self> {
        Self::from_array(Array2::zeros((height, width)))
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    /// True when `(y, x)` addresses a cell of this grid.
    pub fn contains(&self, y: i64, x: i64) -> bool {
        y >= 0 && x >= 0 && (y as usize) < self.height() && (x as usize) < self.width()
    }

    fn checked_index(&self, y: i64, x: i64) -> Result<[usize; 2]> {
        if self.contains(y, x) {
            Ok([y as usize, x as usize])
        } else {
            Err(PhotometryError::OutOfBounds {
                y,
                x,
                height: self.height(),
                width: self.width(),
            })
        }
    }

    /// Sample at row `y`, column `x`.
    ///
    /// # Errors
    /// [`PhotometryError::OutOfBounds`] when `y ∉ [0, height)` or `x ∉ [0, width)`.
    pub fn value(&self, y: i64, x: i64) -> Result<f64> {
        let idx = self.checked_index(y, x)?;
        Ok(self.data[idx])
    }

    /// Sample at a pixel index.
    pub fn value_at(&self, pixel: PixelIndex) -> Result<f64> {
        self.value(pixel.y, pixel.x)
    }

    /// Add `delta` to the sample at `(y, x)`.
    pub fn accumulate(&mut self, y: i64, x: i64, delta: f64) -> Result<()> {
        let idx = self.checked_index(y, x)?;
        self.data[idx] += delta;
        Ok(())
    }

    /// Read-only view of the raw samples.
    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    /// Consume the grid, returning its array.
    pub fn into_array(self) -> Array2<f64> {
        self.data
    }

    /// All samples flattened in row-major order.
    pub fn values(&self) -> Vec<f64> {
        self.data.iter().copied().collect()
    }

    /// Sum of all samples.
    pub fn sum(&self) -> f64 {
        self.data.sum()
    }

    pub fn mean(&self) -> f64 {
        // Non-empty by construction
        self.data.sum() / self.data.len() as f64
    }

    pub fn median(&self) -> f64 {
        stats::median(&self.values()).unwrap_or(f64::NAN)
    }

    /// Population standard deviation.
    pub fn std(&self) -> f64 {
        self.data.std(0.0)
    }
}
