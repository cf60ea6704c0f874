//! A frame grouped with its acquisition metadata.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::ApertureConfig;
use crate::coordinate::Coordinate;
use crate::error::Result;
use crate::grid::Grid;
use crate::star::Star;

/// Scalar header values carried alongside a frame. Never used in photometry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObservationMetadata {
    /// Exposure time in seconds
    pub exposure_time: Option<f64>,
    pub filter: Option<String>,
    /// Acquisition time as recorded in the source header
    pub timestamp: Option<String>,
}

/// A named position to measure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StarTarget {
    pub label: Option<String>,
    pub center: Coordinate,
}

impl StarTarget {
    pub fn new(label: impl Into<String>, center: Coordinate) -> Self {
        Self {
            label: Some(label.into()),
            center,
        }
    }

    pub fn unlabelled(center: Coordinate) -> Self {
        Self {
            label: None,
            center,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Observation {
    grid: Grid,
    metadata: ObservationMetadata,
}

impl Observation {
    pub fn new(grid: Grid, metadata: ObservationMetadata) -> Self {
        Self { grid, metadata }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn metadata(&self) -> &ObservationMetadata {
        &self.metadata
    }

    /// Build one [`Star`] per target with shared aperture radii.
    ///
    /// Fails on the first target whose regions cannot be evaluated.
    pub fn measure(&self, targets: &[StarTarget], config: ApertureConfig) -> Result<Vec<Star<'_>>> {
        targets
            .iter()
            .map(|target| {
                let star = Star::new(&self.grid, target.center, config)?;
                Ok(match &target.label {
                    Some(label) => star.with_label(label.clone()),
                    None => star,
                })
            })
            .collect()
    }
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Observation {}x{}",
            self.grid.width(),
            self.grid.height()
        )?;
        if let Some(filter) = &self.metadata.filter {
            write!(f, ", filter {filter}")?;
        }
        if let Some(timestamp) = &self.metadata.timestamp {
            write!(f, ", taken {timestamp}")?;
        }
        if let Some(exposure) = self.metadata.exposure_time {
            write!(f, ", exposure {exposure}s")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PhotometryError;
    use approx::assert_relative_eq;
    use ndarray::Array2;

    fn observation() -> Observation {
        let mut data = Array2::from_elem((50, 50), 20.0);
        data[[15, 15]] += 300.0;
        data[[32, 30]] += 150.0;
        Observation::new(
            Grid::from_array(data).unwrap(),
            ObservationMetadata {
                exposure_time: Some(30.0),
                filter: Some("V".to_string()),
                timestamp: Some("2024-03-01T02:15:00".to_string()),
            },
        )
    }

    #[test]
    fn test_measure_targets() {
        let obs = observation();
        let targets = [
            StarTarget::new("A", Coordinate::new(15.0, 15.0)),
            StarTarget::unlabelled(Coordinate::new(30.0, 32.0)),
        ];
        let stars = obs.measure(&targets, ApertureConfig::default()).unwrap();

        assert_eq!(stars.len(), 2);
        assert_eq!(stars[0].label(), Some("A"));
        assert_eq!(stars[1].label(), None);
        assert_relative_eq!(stars[0].flux().unwrap(), 300.0, epsilon = 1e-9);
        assert_relative_eq!(stars[1].flux().unwrap(), 150.0, epsilon = 1e-9);
    }

    #[test]
    fn test_measure_reports_out_of_bounds_target() {
        let obs = observation();
        let targets = [StarTarget::unlabelled(Coordinate::new(2.0, 2.0))];
        assert!(matches!(
            obs.measure(&targets, ApertureConfig::default()),
            Err(PhotometryError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_display_summary() {
        let text = observation().to_string();
        assert_eq!(
            text,
            "Observation 50x50, filter V, taken 2024-03-01T02:15:00, exposure 30s"
        );

        let bare = Observation::new(Grid::zeros(4, 3).unwrap(), ObservationMetadata::default());
        assert_eq!(bare.to_string(), "Observation 4x3");
    }

    #[test]
    fn test_metadata_json() {
        let meta = observation().metadata().clone();
        let json = serde_json::to_string(&meta).unwrap();
        let back: ObservationMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(back, meta);
    }
}
