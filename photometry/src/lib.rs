//! Aperture photometry over 2-D intensity grids.
//!
//! The crate measures point sources on a [`Grid`] with circular apertures and
//! background annuli ([`Region`]), estimates measurement error by resampling
//! the regions, and converts background-subtracted flux into calibrated
//! magnitudes through a zero-point constant ([`Star`]).
//!
//! Frames and their header metadata are grouped in an [`Observation`]; a
//! simple local-maximum finder ([`detection::find_local_maxima`]) can supply
//! star centers.

pub mod calibration;
pub mod config;
pub mod coordinate;
pub mod detection;
pub mod error;
pub mod grid;
pub mod observation;
pub mod region;
pub mod sky;
pub mod star;
pub mod stats;

pub use calibration::{CalibrationPair, Slot};
pub use config::{ApertureConfig, DetectionConfig, ErrorEstimationConfig};
pub use coordinate::{Coordinate, PixelIndex};
pub use detection::find_local_maxima;
pub use error::{PhotometryError, Result};
pub use grid::Grid;
pub use observation::{Observation, ObservationMetadata, StarTarget};
pub use region::{Estimate, Region, RegionShape};
pub use sky::{SkyPosition, SkyPositionLookup};
pub use star::{Star, StarStatistics};
