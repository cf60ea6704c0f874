//! Radially symmetric point spread functions and their pixel integrals.
//!
//! A [`Psf`] evaluates brightness as a function of distance from the source
//! center. [`Psf::counts_pixel`] integrates that brightness over a pixel's
//! rectangular footprint, giving the light the pixel actually receives rather
//! than a point sample at its center. Sharply peaked profiles make the
//! difference large, so the integral is adaptive (see [`crate::integrate`]).
//!
//! Pixel footprints are addressed by their origin corner: pixel `(x, y)`
//! covers `[x, x + 1) × [y, y + 1)`, so a source "on" that pixel's center sits
//! at `(x + 0.5, y + 0.5)`.

use std::f64::consts::{LN_2, PI};
use std::fmt;
use std::sync::Arc;

use photometry::Coordinate;
use thiserror::Error;

use crate::integrate::{integrate_2d, IntegrationError, IntegrationTolerance};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PsfError {
    #[error("invalid PSF parameter: {0}")]
    InvalidParameter(String),

    #[error("pixel integration failed: {0}")]
    IntegrationFailure(#[from] IntegrationError),
}

/// Brightness as a function of radius, for profiles without a built-in shape.
pub trait RadialProfile: Send + Sync {
    fn brightness(&self, radius: f64) -> f64;
}

impl<F> RadialProfile for F
where
    F: Fn(f64) -> f64 + Send + Sync,
{
    fn brightness(&self, radius: f64) -> f64 {
        self(radius)
    }
}

/// The analytic shape of a PSF.
#[derive(Clone)]
pub enum Profile {
    /// `max · exp(-0.5·(r/std)²)`
    Gaussian { max: f64, std: f64 },
    /// `max · (1 + (r/alpha)²)^(-beta)`
    Moffat { max: f64, alpha: f64, beta: f64 },
    Custom(Arc<dyn RadialProfile>),
}

impl fmt::Debug for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Profile::Gaussian { max, std } => f
                .debug_struct("Gaussian")
                .field("max", max)
                .field("std", std)
                .finish(),
            Profile::Moffat { max, alpha, beta } => f
                .debug_struct("Moffat")
                .field("max", max)
                .field("alpha", alpha)
                .field("beta", beta)
                .finish(),
            Profile::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// A point spread function with its integration tolerance.
#[derive(Debug, Clone)]
pub struct Psf {
    profile: Profile,
    tolerance: IntegrationTolerance,
}

fn check_positive(name: &str, value: f64) -> Result<(), PsfError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(PsfError::InvalidParameter(format!(
            "{name} must be finite and positive, got {value}"
        )))
    }
}

fn check_peak(max: f64) -> Result<(), PsfError> {
    if max.is_finite() && max >= 0.0 {
        Ok(())
    } else {
        Err(PsfError::InvalidParameter(format!(
            "max must be finite and non-negative, got {max}"
        )))
    }
}

impl Psf {
    pub fn gaussian(max: f64, std: f64) -> Result<Self, PsfError> {
        check_peak(max)?;
        check_positive("std", std)?;
        Ok(Self::from_profile(Profile::Gaussian { max, std }))
    }

    pub fn moffat(max: f64, alpha: f64, beta: f64) -> Result<Self, PsfError> {
        check_peak(max)?;
        check_positive("alpha", alpha)?;
        check_positive("beta", beta)?;
        Ok(Self::from_profile(Profile::Moffat { max, alpha, beta }))
    }

    /// Wrap an arbitrary radial profile. Its values must be finite and
    /// non-negative for `r ≥ 0`; a non-finite value surfaces as
    /// [`PsfError::IntegrationFailure`].
    pub fn custom(profile: impl RadialProfile + 'static) -> Self {
        Self::from_profile(Profile::Custom(Arc::new(profile)))
    }

    fn from_profile(profile: Profile) -> Self {
        Self {
            profile,
            tolerance: IntegrationTolerance::default(),
        }
    }

    pub fn with_tolerance(mut self, tolerance: IntegrationTolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn tolerance(&self) -> &IntegrationTolerance {
        &self.tolerance
    }

    /// Brightness at distance `radius` from the center.
    pub fn brightness(&self, radius: f64) -> f64 {
        match &self.profile {
            Profile::Gaussian { max, std } => {
                let u = radius / std;
                max * (-0.5 * u * u).exp()
            }
            Profile::Moffat { max, alpha, beta } => {
                let u = radius / alpha;
                max * (1.0 + u * u).powf(-beta)
            }
            Profile::Custom(profile) => profile.brightness(radius),
        }
    }

    /// Integral of the brightness over the whole plane, when it is finite and
    /// known in closed form.
    pub fn total_flux(&self) -> Option<f64> {
        match &self.profile {
            Profile::Gaussian { max, std } => Some(2.0 * PI * max * std * std),
            Profile::Moffat { max, alpha, beta } if *beta > 1.0 => {
                Some(PI * max * alpha * alpha / (beta - 1.0))
            }
            Profile::Moffat { .. } | Profile::Custom(_) => None,
        }
    }

    pub fn fwhm(&self) -> Option<f64> {
        match &self.profile {
            Profile::Gaussian { std, .. } => Some(2.0 * (2.0 * LN_2).sqrt() * std),
            Profile::Moffat { alpha, beta, .. } => {
                Some(2.0 * alpha * (2f64.powf(1.0 / beta) - 1.0).sqrt())
            }
            Profile::Custom(_) => None,
        }
    }

    /// Light received by the pixel whose origin corner is `pixel_origin`, for
    /// a source at `center`.
    ///
    /// Integrates the brightness over
    /// `[px − cx, px − cx + size_x] × [py − cy, py − cy + size_y]`.
    pub fn counts_pixel(
        &self,
        center: Coordinate,
        pixel_origin: Coordinate,
        pixel_size: (f64, f64),
    ) -> Result<f64, PsfError> {
        let (size_x, size_y) = pixel_size;
        check_positive("pixel width", size_x)?;
        check_positive("pixel height", size_y)?;

        let x0 = pixel_origin.x - center.x;
        let y0 = pixel_origin.y - center.y;

        let mut counts = 0.0;
        for x_span in split_at_peak(x0, x0 + size_x) {
            for y_span in split_at_peak(y0, y0 + size_y) {
                let quadrature = integrate_2d(
                    |x, y| self.brightness(x.hypot(y)),
                    x_span,
                    y_span,
                    &self.tolerance,
                )?;
                counts += quadrature.value;
            }
        }
        Ok(counts)
    }
}

/// Split `[lower, upper]` at 0, where every radial profile peaks, so no
/// sub-rectangle hides a narrow peak between its quadrature nodes.
fn split_at_peak(lower: f64, upper: f64) -> Vec<(f64, f64)> {
    if lower < 0.0 && 0.0 < upper {
        vec![(lower, 0.0), (0.0, upper)]
    } else {
        vec![(lower, upper)]
    }
}
