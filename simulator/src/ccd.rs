//! Synthetic CCD canvas built up from PSF-integrated point sources.
//!
//! Each source contributes only to pixels within `radius_pixels` of its center
//! (bounding-box scan plus circular distance test, measured to the pixel's
//! origin corner). Pixels outside the canvas are skipped. Contributions are
//! summed into the canvas, so the final frame does not depend on the order in
//! which sources are added beyond floating point rounding.

use photometry::{Coordinate, Grid, PhotometryError};
use rayon::prelude::*;
use thiserror::Error;

use crate::noise::{normal_field, NoiseError};
use crate::psf::{Psf, PsfError};

/// Window radius used when none is given.
pub const DEFAULT_WINDOW_RADIUS: f64 = 25.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CcdError {
    #[error(transparent)]
    Psf(#[from] PsfError),

    #[error(transparent)]
    Grid(#[from] PhotometryError),

    #[error(transparent)]
    Noise(#[from] NoiseError),

    #[error("window radius must be finite and non-negative, got {0}")]
    InvalidWindow(f64),

    #[error("source center must be finite, got ({x}, {y})")]
    InvalidCenter { x: f64, y: f64 },
}

/// Convert a source position on the canvas to the pixel-index frame used by
/// photometric regions, where pixel `(x, y)` sits at `(x, y)` rather than at
/// its footprint center `(x + 0.5, y + 0.5)`.
pub fn index_frame_center(source_center: Coordinate) -> Coordinate {
    source_center.offset(-0.5, -0.5)
}

/// A PSF placed at a sub-pixel position.
#[derive(Debug, Clone)]
pub struct PointSource {
    pub psf: Psf,
    pub center: Coordinate,
    pub radius_pixels: f64,
}

impl PointSource {
    pub fn new(psf: Psf, center: Coordinate) -> Self {
        Self {
            psf,
            center,
            radius_pixels: DEFAULT_WINDOW_RADIUS,
        }
    }

    pub fn with_radius(mut self, radius_pixels: f64) -> Self {
        self.radius_pixels = radius_pixels;
        self
    }
}

/// Per-pixel contributions `(y, x, counts)` of one source.
type Stamp = Vec<(i64, i64, f64)>;

#[derive(Debug, Clone)]
pub struct SyntheticCcd {
    grid: Grid,
    sources: Vec<PointSource>,
}

impl SyntheticCcd {
    /// An all-zero canvas.
    pub fn new(width: usize, height: usize) -> Result<Self, CcdError> {
        Ok(Self::from_grid(Grid::zeros(width, height)?))
    }

    /// Accumulate on top of an existing frame.
    pub fn from_grid(grid: Grid) -> Self {
        Self {
            grid,
            sources: Vec::new(),
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn into_grid(self) -> Grid {
        self.grid
    }

    /// Sources added so far, in insertion order.
    pub fn sources(&self) -> &[PointSource] {
        &self.sources
    }

    pub fn total_counts(&self) -> f64 {
        self.grid.sum()
    }

    pub fn add_point_source(
        &mut self,
        psf: Psf,
        center: Coordinate,
        radius_pixels: f64,
    ) -> Result<(), CcdError> {
        self.add_point_sources(vec![PointSource {
            psf,
            center,
            radius_pixels,
        }])
    }

    /// Render every source's stamp in parallel, then apply them to the canvas
    /// in the given order. Nothing is written if any stamp fails.
    pub fn add_point_sources(&mut self, sources: Vec<PointSource>) -> Result<(), CcdError> {
        let stamps = sources
            .par_iter()
            .map(|source| self.render_stamp(source))
            .collect::<Result<Vec<Stamp>, CcdError>>()?;

        for (source, stamp) in sources.iter().zip(stamps) {
            if stamp.is_empty() {
                log::warn!(
                    "Source at ({:.2}, {:.2}) has no pixels on the {}x{} canvas",
                    source.center.x,
                    source.center.y,
                    self.grid.width(),
                    self.grid.height()
                );
            }
            for (y, x, counts) in stamp {
                self.grid.accumulate(y, x, counts)?;
            }
        }

        log::debug!("Added {} point source(s)", sources.len());
        self.sources.extend(sources);
        Ok(())
    }

    /// Add seeded `Normal(mean, std_dev)` background to every pixel.
    pub fn add_gaussian_noise(&mut self, mean: f64, std_dev: f64, seed: u64) -> Result<(), CcdError> {
        let noise = normal_field((self.grid.height(), self.grid.width()), mean, std_dev, seed)?;
        for ((y, x), &v) in noise.indexed_iter() {
            self.grid.accumulate(y as i64, x as i64, v)?;
        }
        Ok(())
    }

    fn render_stamp(&self, source: &PointSource) -> Result<Stamp, CcdError> {
        let radius = source.radius_pixels;
        if !radius.is_finite() || radius < 0.0 {
            return Err(CcdError::InvalidWindow(radius));
        }
        let Coordinate { x: cx, y: cy } = source.center;
        if !cx.is_finite() || !cy.is_finite() {
            return Err(CcdError::InvalidCenter { x: cx, y: cy });
        }

        let x_range = ((cx - radius).floor() as i64 - 1)..=((cx + radius).floor() as i64 + 1);
        let y_range = ((cy - radius).floor() as i64 - 1)..=((cy + radius).floor() as i64 + 1);
        let radius_sq = radius * radius;

        let mut stamp = Vec::new();
        for y in y_range {
            for x in x_range.clone() {
                if !self.grid.contains(y, x) {
                    continue;
                }
                let dx = cx - x as f64;
                let dy = cy - y as f64;
                if dx * dx + dy * dy > radius_sq {
                    continue;
                }
                let counts = source.psf.counts_pixel(
                    source.center,
                    Coordinate::new(x as f64, y as f64),
                    (1.0, 1.0),
                )?;
                stamp.push((y, x, counts));
            }
        }
        Ok(stamp)
    }
}
