//! Geometric pixel regions over a [`Grid`] and their aggregate statistics.
//!
//! A region is a shape descriptor plus the list of integral pixel indices the
//! shape encloses. Enclosure is evaluated once, at construction, with the
//! "pixel center" rule: a pixel `(y, x)` belongs to the shape when the point
//! `(y, x)` itself satisfies the shape's distance (and angle) test. Boundary
//! ties are included.
//!
//! Enclosed indices are not clipped to the grid. A region hanging over an
//! edge enumerates indices outside the grid and fails with
//! [`PhotometryError::OutOfBounds`] when its statistics are evaluated.
//!
//! # Shapes
//!
//! - **Circle**: `dist² ≤ r²`
//! - **Annulus**: `r_inner² ≤ dist² ≤ r_outer²`
//! - **AngularSubAnnulus**: annulus pixels whose angle about the center,
//!   `atan2(Δy, Δx)` in degrees normalized to `[0, 360)`, satisfies
//!   `angle_min ≤ angle < angle_max`. The half-open interval lets a set of
//!   adjacent wedges partition an annulus with no gaps or overlaps.

use serde::{Deserialize, Serialize};

use crate::coordinate::{Coordinate, PixelIndex};
use crate::error::{PhotometryError, Result};
use crate::grid::Grid;
use crate::stats;

/// Shape of a region. One enclosure routine per variant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum RegionShape {
    Circle {
        center: Coordinate,
        radius: f64,
    },
    Annulus {
        center: Coordinate,
        inner_radius: f64,
        outer_radius: f64,
    },
    AngularSubAnnulus {
        center: Coordinate,
        inner_radius: f64,
        outer_radius: f64,
        /// Inclusive lower angle bound in degrees
        angle_min: f64,
        /// Exclusive upper angle bound in degrees
        angle_max: f64,
    },
}

impl RegionShape {
    pub fn center(&self) -> Coordinate {
        match *self {
            RegionShape::Circle { center, .. }
            | RegionShape::Annulus { center, .. }
            | RegionShape::AngularSubAnnulus { center, .. } => center,
        }
    }

    /// Check the shape parameters.
    ///
    /// # Errors
    /// [`PhotometryError::InvalidGeometry`] for non-finite values, a negative
    /// radius, `inner_radius >= outer_radius` or `angle_min >= angle_max`.
    pub fn validate(&self) -> Result<()> {
        let center = self.center();
        if !center.x.is_finite() || !center.y.is_finite() {
            return Err(PhotometryError::InvalidGeometry(format!(
                "center ({}, {}) is not finite",
                center.x, center.y
            )));
        }

        match *self {
            RegionShape::Circle { radius, .. } => validate_radius("radius", radius),
            RegionShape::Annulus {
                inner_radius,
                outer_radius,
                ..
            } => validate_radii(inner_radius, outer_radius),
            RegionShape::AngularSubAnnulus {
                inner_radius,
                outer_radius,
                angle_min,
                angle_max,
                ..
            } => {
                validate_radii(inner_radius, outer_radius)?;
                if !angle_min.is_finite() || !angle_max.is_finite() {
                    return Err(PhotometryError::InvalidGeometry(format!(
                        "angles [{angle_min}, {angle_max}) must be finite"
                    )));
                }
                if angle_min >= angle_max {
                    return Err(PhotometryError::InvalidGeometry(format!(
                        "angle_min ({angle_min}) must be smaller than angle_max ({angle_max})"
                    )));
                }
                Ok(())
            }
        }
    }

    /// Enumerate enclosed pixel indices in row-major scan order.
    ///
    /// Assumes [`RegionShape::validate`] has passed.
    fn enclose(&self) -> Vec<PixelIndex> {
        match *self {
            RegionShape::Circle { center, radius } => {
                let r_sq = radius * radius;
                scan_box(&center, radius, |p| p.distance_squared(&center) <= r_sq)
            }
            RegionShape::Annulus {
                center,
                inner_radius,
                outer_radius,
            } => annulus_pixels(&center, inner_radius, outer_radius),
            RegionShape::AngularSubAnnulus {
                center,
                inner_radius,
                outer_radius,
                angle_min,
                angle_max,
            } => annulus_pixels(&center, inner_radius, outer_radius)
                .into_iter()
                .filter(|p| {
                    let angle = p.angle_degrees(&center);
                    angle_min <= angle && angle < angle_max
                })
                .collect(),
        }
    }
}

fn validate_radius(name: &str, radius: f64) -> Result<()> {
    if !radius.is_finite() || radius < 0.0 {
        return Err(PhotometryError::InvalidGeometry(format!(
            "{name} must be finite and non-negative, got {radius}"
        )));
    }
    Ok(())
}

fn validate_radii(inner_radius: f64, outer_radius: f64) -> Result<()> {
    validate_radius("inner radius", inner_radius)?;
    validate_radius("outer radius", outer_radius)?;
    if inner_radius >= outer_radius {
        return Err(PhotometryError::InvalidGeometry(format!(
            "inner radius ({inner_radius}) must be smaller than outer radius ({outer_radius})"
        )));
    }
    Ok(())
}

fn annulus_pixels(center: &Coordinate, inner_radius: f64, outer_radius: f64) -> Vec<PixelIndex> {
    let inner_sq = inner_radius * inner_radius;
    let outer_sq = outer_radius * outer_radius;
    scan_box(center, outer_radius, |p| {
        let d_sq = p.distance_squared(center);
        inner_sq <= d_sq && d_sq <= outer_sq
    })
}

/// Scan the box `center ± (ceil(radius) + 1)` and keep pixels passing `include`.
fn scan_box<F>(center: &Coordinate, radius: f64, include: F) -> Vec<PixelIndex>
where
    F: Fn(&PixelIndex) -> bool,
{
    let reach = radius.ceil() as i64 + 1;
    let cy = center.y.floor() as i64;
    let cx = center.x.floor() as i64;

    let mut pixels = Vec::new();
    for y in (cy - reach)..=(cy + reach) {
        for x in (cx - reach)..=(cx + reach) {
            let p = PixelIndex::new(y, x);
            if include(&p) {
                pixels.push(p);
            }
        }
    }
    pixels
}

/// A cached statistic uncertainty: absent until explicitly evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Estimate {
    #[default]
    Unset,
    Computed(f64),
}

impl Estimate {
    pub fn value(&self) -> Option<f64> {
        match self {
            Estimate::Unset => None,
            Estimate::Computed(v) => Some(*v),
        }
    }
}

/// A set of pixels enclosed by a [`RegionShape`] on a borrowed [`Grid`].
///
/// Aggregates are computed from the grid at query time and never cached.
#[derive(Debug, Clone)]
pub struct Region<'g> {
    grid: &'g Grid,
    shape: RegionShape,
    pixels: Vec<PixelIndex>,
    mean_error: Estimate,
    median_error: Estimate,
}

impl<'g> Region<'g> {
    /// Validate `shape` and evaluate its enclosure against `grid`.
    pub fn new(grid: &'g Grid, shape: RegionShape) -> Result<Self> {
        shape.validate()?;
        let pixels = shape.enclose();
        Ok(Self {
            grid,
            shape,
            pixels,
            mean_error: Estimate::Unset,
            median_error: Estimate::Unset,
        })
    }

    pub fn circle(grid: &'g Grid, center: Coordinate, radius: f64) -> Result<Self> {
        Self::new(grid, RegionShape::Circle { center, radius })
    }

    pub fn annulus(
        grid: &'g Grid,
        center: Coordinate,
        inner_radius: f64,
        outer_radius: f64,
    ) -> Result<Self> {
        Self::new(
            grid,
            RegionShape::Annulus {
                center,
                inner_radius,
                outer_radius,
            },
        )
    }

    pub fn angular_sub_annulus(
        grid: &'g Grid,
        center: Coordinate,
        inner_radius: f64,
        outer_radius: f64,
        angle_min: f64,
        angle_max: f64,
    ) -> Result<Self> {
        Self::new(
            grid,
            RegionShape::AngularSubAnnulus {
                center,
                inner_radius,
                outer_radius,
                angle_min,
                angle_max,
            },
        )
    }

    /// Split an annulus into `count` equal angular wedges covering `[0, 360)`.
    pub fn annulus_wedges(
        grid: &'g Grid,
        center: Coordinate,
        inner_radius: f64,
        outer_radius: f64,
        count: usize,
    ) -> Result<Vec<Self>> {
        if count == 0 {
            return Err(PhotometryError::InvalidGeometry(
                "annulus must be split into at least one wedge".to_string(),
            ));
        }
        let step = 360.0 / count as f64;
        (0..count)
            .map(|i| {
                let angle_min = i as f64 * step;
                let angle_max = if i + 1 == count {
                    360.0
                } else {
                    (i + 1) as f64 * step
                };
                Self::angular_sub_annulus(
                    grid,
                    center,
                    inner_radius,
                    outer_radius,
                    angle_min,
                    angle_max,
                )
            })
            .collect()
    }

    pub fn grid(&self) -> &'g Grid {
        self.grid
    }

    pub fn shape(&self) -> &RegionShape {
        &self.shape
    }

    pub fn center(&self) -> Coordinate {
        self.shape.center()
    }

    /// Enclosed pixel indices in deterministic row-major order.
    pub fn pixels(&self) -> &[PixelIndex] {
        &self.pixels
    }

    /// Number of enclosed pixels.
    pub fn n(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Current grid values at every enclosed pixel.
    ///
    /// # Errors
    /// [`PhotometryError::EmptyRegion`] when nothing is enclosed,
    /// [`PhotometryError::OutOfBounds`] for the first index outside the grid.
    pub fn pixel_values(&self) -> Result<Vec<f64>> {
        if self.pixels.is_empty() {
            return Err(PhotometryError::EmptyRegion);
        }
        self.pixels.iter().map(|&p| self.grid.value_at(p)).collect()
    }

    pub fn sum(&self) -> Result<f64> {
        Ok(self.pixel_values()?.iter().sum())
    }

    pub fn mean(&self) -> Result<f64> {
        stats::mean(&self.pixel_values()?).ok_or(PhotometryError::EmptyRegion)
    }

    pub fn median(&self) -> Result<f64> {
        stats::median(&self.pixel_values()?).ok_or(PhotometryError::EmptyRegion)
    }

    pub fn std(&self) -> Result<f64> {
        stats::std_dev(&self.pixel_values()?).ok_or(PhotometryError::EmptyRegion)
    }

    /// Uncertainty of the mean, once evaluated by a resampling procedure.
    pub fn mean_error(&self) -> Option<f64> {
        self.mean_error.value()
    }

    /// Uncertainty of the median, once evaluated by a resampling procedure.
    pub fn median_error(&self) -> Option<f64> {
        self.median_error.value()
    }

    pub fn mean_error_estimate(&self) -> Estimate {
        self.mean_error
    }

    pub fn median_error_estimate(&self) -> Estimate {
        self.median_error
    }

    pub(crate) fn set_errors(&mut self, mean_error: f64, median_error: f64) {
        self.mean_error = Estimate::Computed(mean_error);
        self.median_error = Estimate::Computed(median_error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Array2;
    use std::collections::HashSet;

    fn spike_grid() -> Grid {
        let mut data = Array2::<f64>::zeros((11, 11));
        data[[5, 5]] = 100.0;
        Grid::from_array(data).unwrap()
    }

    #[test]
    fn test_circle_radius_one_includes_axis_neighbours() {
        let grid = spike_grid();
        let circle = Region::circle(&grid, Coordinate::new(5.0, 5.0), 1.0).unwrap();

        // Center plus four axis neighbours sit at distance <= 1; diagonals at sqrt(2)
        assert_eq!(circle.n(), 5);
        assert_eq!(circle.sum().unwrap(), 100.0);
        assert_eq!(circle.median().unwrap(), 0.0);
        assert_relative_eq!(circle.mean().unwrap(), 20.0);
    }

    #[test]
    fn test_circle_zero_radius_contains_center() {
        let grid = spike_grid();
        let circle = Region::circle(&grid, Coordinate::new(5.0, 5.0), 0.0).unwrap();
        assert_eq!(circle.pixels(), &[PixelIndex::new(5, 5)]);
    }

    #[test]
    fn test_circle_boundary_tie_included() {
        let grid = Grid::zeros(20, 20).unwrap();
        let circle = Region::circle(&grid, Coordinate::new(10.0, 10.0), 5.0).unwrap();
        // (3,4,5) triangle lands exactly on the boundary
        assert!(circle.pixels().contains(&PixelIndex::new(14, 13)));
        assert!(circle.pixels().contains(&PixelIndex::new(10, 15)));
        assert!(!circle.pixels().contains(&PixelIndex::new(14, 14)));
    }

    #[test]
    fn test_circle_pixel_count_near_area() {
        let grid = Grid::zeros(40, 40).unwrap();
        let circle = Region::circle(&grid, Coordinate::new(20.3, 19.7), 6.0).unwrap();
        let area = std::f64::consts::PI * 36.0;
        assert!((circle.n() as f64 - area).abs() < 8.0, "n = {}", circle.n());
    }

    #[test]
    fn test_negative_radius_rejected() {
        let grid = spike_grid();
        assert!(matches!(
            Region::circle(&grid, Coordinate::new(5.0, 5.0), -1.0),
            Err(PhotometryError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn test_annulus_invalid_radii() {
        let grid = spike_grid();
        let c = Coordinate::new(5.0, 5.0);
        assert!(matches!(
            Region::annulus(&grid, c, 3.0, 3.0),
            Err(PhotometryError::InvalidGeometry(_))
        ));
        assert!(matches!(
            Region::annulus(&grid, c, 4.0, 2.0),
            Err(PhotometryError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn test_sub_annulus_invalid_angles() {
        let grid = spike_grid();
        let c = Coordinate::new(5.0, 5.0);
        assert!(matches!(
            Region::angular_sub_annulus(&grid, c, 1.0, 3.0, 90.0, 90.0),
            Err(PhotometryError::InvalidGeometry(_))
        ));
        assert!(matches!(
            Region::angular_sub_annulus(&grid, c, 1.0, 3.0, 180.0, 45.0),
            Err(PhotometryError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn test_annulus_bounds_inclusive() {
        let grid = Grid::zeros(30, 30).unwrap();
        let c = Coordinate::new(15.0, 15.0);
        let annulus = Region::annulus(&grid, c, 3.0, 5.0).unwrap();
        let set: HashSet<_> = annulus.pixels().iter().copied().collect();

        assert!(set.contains(&PixelIndex::new(15, 18)), "inner boundary included");
        assert!(set.contains(&PixelIndex::new(15, 20)), "outer boundary included");
        assert!(!set.contains(&PixelIndex::new(15, 17)));
        assert!(!set.contains(&PixelIndex::new(15, 21)));
        assert!(!set.contains(&PixelIndex::new(15, 15)));
    }

    #[test]
    fn test_annulus_disjoint_from_inner_circle() {
        let grid = Grid::zeros(30, 30).unwrap();
        let c = Coordinate::new(14.6, 15.2);
        let aperture = Region::circle(&grid, c, 2.9).unwrap();
        let annulus = Region::annulus(&grid, c, 3.0, 6.0).unwrap();

        let ap: HashSet<_> = aperture.pixels().iter().copied().collect();
        assert!(annulus.pixels().iter().all(|p| !ap.contains(p)));
    }

    #[test]
    fn test_wedges_partition_annulus() {
        let grid = Grid::zeros(40, 40).unwrap();
        for &(cx, cy, r1, r2) in &[
            (20.0, 20.0, 3.0, 7.0),
            (19.5, 20.25, 2.5, 6.1),
            (20.7, 18.3, 0.0, 5.0),
            (21.0, 21.0, 4.0, 4.5),
        ] {
            let c = Coordinate::new(cx, cy);
            let annulus = Region::annulus(&grid, c, r1, r2).unwrap();
            let wedges = Region::annulus_wedges(&grid, c, r1, r2, 8).unwrap();

            let full: HashSet<_> = annulus.pixels().iter().copied().collect();
            let mut union = HashSet::new();
            let mut total = 0;
            for wedge in &wedges {
                total += wedge.n();
                union.extend(wedge.pixels().iter().copied());
            }

            assert_eq!(total, annulus.n(), "wedges overlap for center {c:?}");
            assert_eq!(union, full, "wedges leave gaps for center {c:?}");
        }
    }

    #[test]
    fn test_wedge_boundary_is_half_open() {
        let grid = Grid::zeros(20, 20).unwrap();
        let c = Coordinate::new(10.0, 10.0);
        // Pixel at exactly 90 degrees belongs to [90, 135), not [45, 90)
        let upper = Region::angular_sub_annulus(&grid, c, 1.0, 3.0, 90.0, 135.0).unwrap();
        let lower = Region::angular_sub_annulus(&grid, c, 1.0, 3.0, 45.0, 90.0).unwrap();
        let p = PixelIndex::new(12, 10);
        assert!(upper.pixels().contains(&p));
        assert!(!lower.pixels().contains(&p));
    }

    #[test]
    fn test_region_near_edge_fails_out_of_bounds() {
        let grid = Grid::zeros(10, 10).unwrap();
        let circle = Region::circle(&grid, Coordinate::new(0.0, 0.0), 2.0).unwrap();
        assert!(circle.n() > 0);
        assert!(matches!(
            circle.sum(),
            Err(PhotometryError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_empty_region_statistics() {
        let grid = Grid::zeros(20, 20).unwrap();
        // A thin annulus between lattice distances can contain nothing
        let annulus = Region::annulus(&grid, Coordinate::new(10.0, 10.0), 1.1, 1.2).unwrap();
        assert_eq!(annulus.n(), 0);
        assert_eq!(annulus.sum(), Err(PhotometryError::EmptyRegion));
        assert_eq!(annulus.mean(), Err(PhotometryError::EmptyRegion));
        assert_eq!(annulus.median(), Err(PhotometryError::EmptyRegion));
        assert_eq!(annulus.std(), Err(PhotometryError::EmptyRegion));
    }

    #[test]
    fn test_errors_unset_until_evaluated() {
        let grid = spike_grid();
        let mut circle = Region::circle(&grid, Coordinate::new(5.0, 5.0), 2.0).unwrap();
        assert_eq!(circle.mean_error(), None);
        assert_eq!(circle.median_error_estimate(), Estimate::Unset);

        circle.set_errors(0.5, 0.25);
        assert_eq!(circle.mean_error(), Some(0.5));
        assert_eq!(circle.median_error_estimate(), Estimate::Computed(0.25));
    }

    #[test]
    fn test_enumeration_is_row_major() {
        let grid = Grid::zeros(20, 20).unwrap();
        let circle = Region::circle(&grid, Coordinate::new(10.0, 10.0), 3.0).unwrap();
        let mut sorted = circle.pixels().to_vec();
        sorted.sort();
        assert_eq!(sorted, circle.pixels());
    }
}
