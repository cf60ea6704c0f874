//! Continuous positions and discrete pixel indices.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// An immutable `(x, y)` position.
///
/// Used both for sub-pixel source positions and, when integral, for pixel
/// locations. Equality and hashing compare values, with `-0.0` treated as
/// equal to `0.0`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

impl Coordinate {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Translate by `(dx, dy)`.
    pub fn offset(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Euclidean distance to another position.
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    fn key(&self) -> (u64, u64) {
        // Adding 0.0 folds -0.0 into +0.0 so equal values hash equally.
        ((self.x + 0.0).to_bits(), (self.y + 0.0).to_bits())
    }
}

impl PartialEq for Coordinate {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Coordinate {}

impl Hash for Coordinate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl From<PixelIndex> for Coordinate {
    fn from(p: PixelIndex) -> Self {
        Coordinate::new(p.x as f64, p.y as f64)
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((x, y): (f64, f64)) -> Self {
        Coordinate::new(x, y)
    }
}

/// Integral pixel location indexed `(row, col)` = `(y, x)`.
///
/// Signed so that regions near a grid edge can enumerate indices that fall
/// outside the grid; the grid accessor is responsible for rejecting them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PixelIndex {
    pub y: i64,
    pub x: i64,
}

impl PixelIndex {
    pub const fn new(y: i64, x: i64) -> Self {
        Self { y, x }
    }

    /// Squared distance from a continuous center.
    pub fn distance_squared(&self, center: &Coordinate) -> f64 {
        let dy = self.y as f64 - center.y;
        let dx = self.x as f64 - center.x;
        dy * dy + dx * dx
    }

    /// Angle of this pixel about `center`, in degrees normalized to `[0, 360)`.
    pub fn angle_degrees(&self, center: &Coordinate) -> f64 {
        let dy = self.y as f64 - center.y;
        let dx = self.x as f64 - center.x;
        let angle = dy.atan2(dx).to_degrees().rem_euclid(360.0);
        // rem_euclid can round up to exactly 360 for tiny negative angles.
        if angle >= 360.0 {
            0.0
        } else {
            angle
        }
    }
}
