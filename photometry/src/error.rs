//! Error types for grid access, region geometry and calibration.

use thiserror::Error;

/// Errors raised by the photometry engine.
///
/// Every variant is a synchronous, caller-correctable condition. Geometry
/// problems are reported when a region is constructed; bounds problems when a
/// pixel is dereferenced; calibration problems when a derived quantity is
/// requested before its defining side has been supplied.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PhotometryError {
    /// Region parameters do not describe a valid shape.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// A pixel index lies outside the grid extent.
    #[error("pixel (y={y}, x={x}) is outside grid of height {height} and width {width}")]
    OutOfBounds {
        y: i64,
        x: i64,
        height: usize,
        width: usize,
    },

    /// A statistic was requested on a region that encloses no pixels.
    #[error("statistic requested on a region with zero enclosed pixels")]
    EmptyRegion,

    /// A magnitude/zero-point pair was queried before either side was supplied.
    #[error("calibration undefined: {0}")]
    CalibrationUndefined(&'static str),

    /// Magnitudes need a positive, finite flux.
    #[error("flux {0} is not positive, so no magnitude can be derived")]
    NonPositiveFlux(f64),

    /// An error estimate was read before the resampling that sets it.
    #[error("error estimate not evaluated: {0}")]
    ErrorNotEvaluated(&'static str),

    /// A grid was built from an array with a zero-length axis.
    #[error("grid must have non-zero dimensions, got height {height} and width {width}")]
    EmptyGrid { height: usize, width: usize },

    /// A configuration file could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<std::io::Error> for PhotometryError {
    fn from(err: std::io::Error) -> Self {
        PhotometryError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for PhotometryError {
    fn from(err: serde_json::Error) -> Self {
        PhotometryError::Config(err.to_string())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PhotometryError>;
