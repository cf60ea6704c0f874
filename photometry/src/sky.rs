//! Seam for world-coordinate lookups used to label measurements.

use serde::{Deserialize, Serialize};

use crate::coordinate::Coordinate;

/// Right ascension and declination in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkyPosition {
    pub ra_deg: f64,
    pub dec_deg: f64,
}

/// Maps a pixel position to a sky position, e.g. from a plate-solved frame's WCS.
///
/// Returns `None` when the frame is not plate-solved or the position falls
/// outside the solution. Only used to label output.
pub trait SkyPositionLookup {
    fn sky_position(&self, pixel: Coordinate) -> Option<SkyPosition>;
}

impl<F> SkyPositionLookup for F
where
    F: Fn(Coordinate) -> Option<SkyPosition>,
{
    fn sky_position(&self, pixel: Coordinate) -> Option<SkyPosition> {
        self(pixel)
    }
}
