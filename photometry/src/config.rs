//! Configuration records for aperture photometry.
//!
//! All records are plain serde structs with defaults, loadable from and
//! savable to pretty-printed JSON.

use std::path::Path;

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::{PhotometryError, Result};

/// Aperture and background annulus radii, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ApertureConfig {
    pub aperture_radius: f64,
    pub annulus_inner_radius: f64,
    pub annulus_outer_radius: f64,
}

impl Default for ApertureConfig {
    fn default() -> Self {
        Self {
            aperture_radius: 4.0,
            annulus_inner_radius: 8.0,
            annulus_outer_radius: 12.0,
        }
    }
}

impl ApertureConfig {
    pub fn new(aperture_radius: f64, annulus_inner_radius: f64, annulus_outer_radius: f64) -> Self {
        Self {
            aperture_radius,
            annulus_inner_radius,
            annulus_outer_radius,
        }
    }

    /// Reject non-finite or negative radii and an inverted annulus.
    pub fn validate(&self) -> Result<()> {
        let radii = [
            self.aperture_radius,
            self.annulus_inner_radius,
            self.annulus_outer_radius,
        ];
        if radii.iter().any(|r| !r.is_finite() || *r < 0.0) {
            return Err(PhotometryError::InvalidGeometry(format!(
                "aperture radii must be finite and non-negative: {radii:?}"
            )));
        }
        if self.annulus_inner_radius >= self.annulus_outer_radius {
            return Err(PhotometryError::InvalidGeometry(format!(
                "annulus inner radius ({}) must be smaller than outer radius ({})",
                self.annulus_inner_radius, self.annulus_outer_radius
            )));
        }
        Ok(())
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let config: Self = load_json(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        save_json(self, path)
    }
}

/// Resampling constants for aperture and annulus error estimation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErrorEstimationConfig {
    /// Samples per axis over center offset and radius offset
    pub aperture_resolution: usize,
    /// Half-width of the offset range in pixels
    pub aperture_offset: f64,
    /// Number of angular wedges the annulus is split into
    pub annulus_wedges: usize,
}

impl Default for ErrorEstimationConfig {
    fn default() -> Self {
        Self {
            aperture_resolution: 5,
            aperture_offset: 0.5,
            annulus_wedges: 8,
        }
    }
}

impl ErrorEstimationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.aperture_resolution < 2 {
            return Err(PhotometryError::Config(format!(
                "aperture_resolution must be at least 2, got {}",
                self.aperture_resolution
            )));
        }
        if self.annulus_wedges == 0 {
            return Err(PhotometryError::Config(
                "annulus_wedges must be at least 1".to_string(),
            ));
        }
        if !self.aperture_offset.is_finite() || self.aperture_offset < 0.0 {
            return Err(PhotometryError::Config(format!(
                "aperture_offset must be finite and non-negative, got {}",
                self.aperture_offset
            )));
        }
        Ok(())
    }

    /// Evenly spaced offsets over `[-aperture_offset, aperture_offset]`.
    pub fn offsets(&self) -> Vec<f64> {
        let n = self.aperture_resolution;
        let span = 2.0 * self.aperture_offset;
        (0..n)
            .map(|i| -self.aperture_offset + span * i as f64 / (n - 1) as f64)
            .collect()
    }
}

/// Local-maximum source finder parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Candidates must exceed this multiple of the grid median
    pub threshold_factor: f64,
    /// Side length of the square maximum filter, in pixels
    pub window: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            threshold_factor: 2.5,
            window: 5,
        }
    }
}

/// Read a JSON config record.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| PhotometryError::Config(format!("{}: {e}", path.display())))?;
    Ok(serde_json::from_str(&json)?)
}

/// Write a config record as pretty-printed JSON.
pub fn save_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)?;
    Ok(())
}
