//! Aperture photometry of a single star.
//!
//! A [`Star`] anchors a circular aperture and a background annulus at a
//! common center and derives:
//!
//! - **Flux**: `aperture.sum − annulus.median × aperture.n`
//! - **Flux error**: `|annulus.median_error × aperture.n|`, the background
//!   level uncertainty only (no shot noise)
//! - **Magnitude / zero point** through `m = -2.5·log10(flux) + k`, with the
//!   caller supplying exactly one side (see [`crate::calibration`])
//!
//! # Error estimation
//!
//! Construction runs two resampling procedures eagerly:
//!
//! 1. **Aperture**: the aperture circle is rebuilt over a
//!    `resolution × resolution` grid of (radius offset, center offset) pairs,
//!    each offset spanning `±0.5` px. The center offset is applied to both
//!    axes at once. `median_error = std(medians) / resolution` and likewise
//!    for the mean. This measures sensitivity to sub-pixel centering and
//!    sizing, not photon noise.
//! 2. **Annulus**: the annulus is split into 8 equal angular wedges,
//!    `median_error = std(wedge medians) / sqrt(8)` and likewise for the
//!    mean. A background gradient or a contaminating source in one wedge
//!    inflates this error.
//!
//! Resampled regions are evaluated in parallel and collected in index order,
//! so the resulting standard deviations are reproducible bit for bit.

use std::fmt;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::calibration::{
    magnitude_from_zero_point, propagate_error, zero_point_from_magnitude, CalibrationPair,
};
use crate::config::{ApertureConfig, ErrorEstimationConfig};
use crate::coordinate::Coordinate;
use crate::error::{PhotometryError, Result};
use crate::grid::Grid;
use crate::region::Region;
use crate::sky::{SkyPosition, SkyPositionLookup};
use crate::stats;

/// A star measured with an aperture and a background annulus.
#[derive(Debug, Clone)]
pub struct Star<'g> {
    label: Option<String>,
    center: Coordinate,
    apertures: ApertureConfig,
    error_config: ErrorEstimationConfig,
    aperture: Region<'g>,
    annulus: Region<'g>,
    sub_annuli: Vec<Region<'g>>,
    /// primary = magnitude, secondary = zero point k
    calibration: CalibrationPair,
    /// primary = magnitude error, secondary = zero point error
    error_calibration: CalibrationPair,
}

impl<'g> Star<'g> {
    /// Build a star and evaluate its aperture and annulus errors.
    ///
    /// # Errors
    /// - `InvalidGeometry` for invalid radii
    /// - `OutOfBounds` when any resampled region reaches past the grid edge
    /// - `EmptyRegion` when the aperture, the annulus, or one of its wedges
    ///   encloses no pixel
    pub fn new(grid: &'g Grid, center: Coordinate, apertures: ApertureConfig) -> Result<Self> {
        Self::with_error_config(grid, center, apertures, ErrorEstimationConfig::default())
    }

    pub fn with_error_config(
        grid: &'g Grid,
        center: Coordinate,
        apertures: ApertureConfig,
        error_config: ErrorEstimationConfig,
    ) -> Result<Self> {
        apertures.validate()?;
        error_config.validate()?;

        let aperture = Region::circle(grid, center, apertures.aperture_radius)?;
        let annulus = Region::annulus(
            grid,
            center,
            apertures.annulus_inner_radius,
            apertures.annulus_outer_radius,
        )?;

        let mut star = Self {
            label: None,
            center,
            apertures,
            error_config,
            aperture,
            annulus,
            sub_annuli: Vec::new(),
            calibration: CalibrationPair::default(),
            error_calibration: CalibrationPair::default(),
        };

        star.evaluate_aperture_errors()?;
        star.evaluate_annulus_errors()?;

        log::debug!(
            "Star at ({:.2}, {:.2}): aperture n={}, annulus n={}",
            center.x,
            center.y,
            star.aperture.n(),
            star.annulus.n()
        );

        Ok(star)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn center(&self) -> Coordinate {
        self.center
    }

    pub fn apertures(&self) -> &ApertureConfig {
        &self.apertures
    }

    pub fn aperture(&self) -> &Region<'g> {
        &self.aperture
    }

    pub fn annulus(&self) -> &Region<'g> {
        &self.annulus
    }

    /// Wedges retained from the last annulus error evaluation.
    pub fn sub_annuli(&self) -> &[Region<'g>] {
        &self.sub_annuli
    }

    /// Re-evaluate the aperture's sensitivity to centering and radius.
    pub fn evaluate_aperture_errors(&mut self) -> Result<()> {
        let grid = self.aperture.grid();
        let offsets = self.error_config.offsets();
        let samples: Vec<(f64, f64)> = offsets
            .iter()
            .flat_map(|&dr| offsets.iter().map(move |&dc| (dr, dc)))
            .collect();

        let center = self.center;
        let radius = self.apertures.aperture_radius;

        let measured: Vec<(f64, f64)> = samples
            .par_iter()
            .map(|&(dr, dc)| {
                let region = Region::circle(grid, center.offset(dc, dc), (radius + dr).max(0.0))?;
                Ok((region.median()?, region.mean()?))
            })
            .collect::<Result<Vec<_>>>()?;

        let (medians, means): (Vec<f64>, Vec<f64>) = measured.into_iter().unzip();
        let resolution = self.error_config.aperture_resolution as f64;
        self.aperture.set_errors(
            spread(&means) / resolution,
            spread(&medians) / resolution,
        );
        Ok(())
    }

    /// Re-evaluate the background level's spatial uncertainty from annulus wedges.
    pub fn evaluate_annulus_errors(&mut self) -> Result<()> {
        let wedges = Region::annulus_wedges(
            self.annulus.grid(),
            self.center,
            self.apertures.annulus_inner_radius,
            self.apertures.annulus_outer_radius,
            self.error_config.annulus_wedges,
        )?;

        let measured: Vec<(f64, f64)> = wedges
            .par_iter()
            .map(|wedge| Ok((wedge.median()?, wedge.mean()?)))
            .collect::<Result<Vec<_>>>()?;

        let (medians, means): (Vec<f64>, Vec<f64>) = measured.into_iter().unzip();
        let norm = (wedges.len() as f64).sqrt();
        self.annulus
            .set_errors(spread(&means) / norm, spread(&medians) / norm);
        self.sub_annuli = wedges;
        Ok(())
    }

    /// Background-subtracted counts in the aperture.
    pub fn flux(&self) -> Result<f64> {
        let background = self.annulus.median()?;
        Ok(self.aperture.sum()? - background * self.aperture.n() as f64)
    }

    /// Uncertainty of [`Star::flux`] from the background level alone.
    pub fn flux_error(&self) -> Result<f64> {
        let median_error = self
            .annulus
            .median_error()
            .ok_or(PhotometryError::ErrorNotEvaluated("annulus median"))?;
        Ok((median_error * self.aperture.n() as f64).abs())
    }

    /// Supply the catalogue magnitude; the zero point becomes derivable.
    pub fn set_magnitude(&mut self, magnitude: f64) {
        self.calibration.supply_primary(magnitude);
    }

    /// Supply the zero point `k`; the magnitude becomes derivable.
    pub fn set_zero_point(&mut self, k: f64) {
        self.calibration.supply_secondary(k);
    }

    pub fn set_magnitude_error(&mut self, error: f64) {
        self.error_calibration.supply_primary(error);
    }

    pub fn set_zero_point_error(&mut self, error: f64) {
        self.error_calibration.supply_secondary(error);
    }

    /// Magnitude, derived from the supplied zero point on first request and cached.
    ///
    /// # Errors
    /// `CalibrationUndefined` when neither side has been supplied,
    /// `NonPositiveFlux` when the background-subtracted flux is not positive.
    /// Nothing is cached on failure.
    pub fn magnitude(&mut self) -> Result<f64> {
        if let Some(m) = self.calibration.primary().value() {
            return Ok(m);
        }
        let flux = self.flux();
        self.calibration.resolve_primary(
            |k| magnitude_from_zero_point(flux?, k),
            "the zero point k is not yet defined",
        )
    }

    /// Zero point, derived from the supplied magnitude on first request and cached.
    pub fn zero_point(&mut self) -> Result<f64> {
        if let Some(k) = self.calibration.secondary().value() {
            return Ok(k);
        }
        let flux = self.flux();
        self.calibration.resolve_secondary(
            |m| zero_point_from_magnitude(flux?, m),
            "the magnitude of the star is not yet defined",
        )
    }

    /// `sqrt(k_err² + (flux_err/flux)²)`, derived from the supplied zero point error.
    pub fn magnitude_error(&mut self) -> Result<f64> {
        if let Some(e) = self.error_calibration.primary().value() {
            return Ok(e);
        }
        let flux = self.flux();
        let flux_error = self.flux_error();
        self.error_calibration.resolve_primary(
            |k_err| propagate_error(k_err, flux?, flux_error?),
            "the error in the zero point k is not yet defined",
        )
    }

    /// `sqrt(m_err² + (flux_err/flux)²)`, derived from the supplied magnitude error.
    pub fn zero_point_error(&mut self) -> Result<f64> {
        if let Some(e) = self.error_calibration.secondary().value() {
            return Ok(e);
        }
        let flux = self.flux();
        let flux_error = self.flux_error();
        self.error_calibration.resolve_secondary(
            |m_err| propagate_error(m_err, flux?, flux_error?),
            "the error in the magnitude of the star is not yet defined",
        )
    }

    pub fn calibration(&self) -> &CalibrationPair {
        &self.calibration
    }

    pub fn error_calibration(&self) -> &CalibrationPair {
        &self.error_calibration
    }

    /// Summary record for reporting and overlays.
    pub fn statistics(&self) -> Result<StarStatistics> {
        Ok(StarStatistics {
            label: self.label.clone(),
            center: self.center,
            sky_position: None,
            aperture_pixels: self.aperture.n(),
            aperture_sum: self.aperture.sum()?,
            annulus_pixels: self.annulus.n(),
            background_median: self.annulus.median()?,
            flux: self.flux()?,
            flux_error: self.flux_error()?,
            magnitude: self.calibration.primary().value(),
            magnitude_error: self.error_calibration.primary().value(),
        })
    }

    /// Summary record labelled with the star's sky position.
    pub fn statistics_with_sky(&self, lookup: &dyn SkyPositionLookup) -> Result<StarStatistics> {
        let mut statistics = self.statistics()?;
        statistics.sky_position = lookup.sky_position(self.center);
        Ok(statistics)
    }
}

/// Population standard deviation of resampled statistics.
fn spread(values: &[f64]) -> f64 {
    stats::std_dev(values).unwrap_or(0.0)
}

/// Structured per-star summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StarStatistics {
    pub label: Option<String>,
    pub center: Coordinate,
    pub sky_position: Option<SkyPosition>,
    pub aperture_pixels: usize,
    pub aperture_sum: f64,
    pub annulus_pixels: usize,
    pub background_median: f64,
    pub flux: f64,
    pub flux_error: f64,
    /// Present once supplied or derived
    pub magnitude: Option<f64>,
    pub magnitude_error: Option<f64>,
}

impl fmt::Display for StarStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Star: {}", self.label.as_deref().unwrap_or("-"))?;
        writeln!(f, "----------------")?;
        if let Some(sky) = self.sky_position {
            writeln!(f, "RA: {:.6} deg, DEC: {:.6} deg", sky.ra_deg, sky.dec_deg)?;
            writeln!(f)?;
        }
        writeln!(f, "Aperture Statistics:")?;
        writeln!(f, "npix: {}", self.aperture_pixels)?;
        writeln!(f, "sum: {}", self.aperture_sum)?;
        writeln!(f)?;
        writeln!(f, "Annulus Statistics:")?;
        writeln!(f, "npix: {}", self.annulus_pixels)?;
        writeln!(f, "median background: {}", self.background_median)?;
        writeln!(f)?;
        writeln!(f, "Flux: {} +- {}", self.flux, self.flux_error)?;
        if let Some(m) = self.magnitude {
            match self.magnitude_error {
                Some(e) => writeln!(f, "Magnitude: {m:.4} +- {e:.4}")?,
                None => writeln!(f, "Magnitude: {m:.4}")?,
            }
        }
        Ok(())
    }
}
