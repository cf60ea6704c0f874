//! Mutually derived calibration quantities.
//!
//! A star's magnitude `m` and the zero-point constant `k` are tied by
//! `m = -2.5·log10(flux) + k`, and their uncertainties by
//! `σ_m² = σ_k² + (σ_flux/flux)²` (and symmetrically for `σ_k`). The caller
//! supplies exactly one side of each pair; the other is derived on first
//! request and cached. [`CalibrationPair`] holds the two [`Slot`]s and makes
//! that state explicit.
//!
//! Both relations need a positive, finite flux. A failed derivation leaves
//! the derived slot `Unset`.

use serde::{Deserialize, Serialize};

use crate::error::{PhotometryError, Result};

/// State of one side of a calibration pair.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Slot {
    #[default]
    Unset,
    /// Provided by the caller.
    Supplied(f64),
    /// Derived from the other side and cached.
    Computed(f64),
}

impl Slot {
    pub fn value(&self) -> Option<f64> {
        match self {
            Slot::Unset => None,
            Slot::Supplied(v) | Slot::Computed(v) => Some(*v),
        }
    }

    pub fn is_supplied(&self) -> bool {
        matches!(self, Slot::Supplied(_))
    }
}

/// Two quantities where one is supplied and the other derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CalibrationPair {
    primary: Slot,
    secondary: Slot,
}

impl CalibrationPair {
    pub fn primary(&self) -> Slot {
        self.primary
    }

    pub fn secondary(&self) -> Slot {
        self.secondary
    }

    /// Supply the primary side, discarding anything derived from the old state.
    pub fn supply_primary(&mut self, value: f64) {
        self.primary = Slot::Supplied(value);
        self.secondary = Slot::Unset;
    }

    /// Supply the secondary side, discarding anything derived from the old state.
    pub fn supply_secondary(&mut self, value: f64) {
        self.secondary = Slot::Supplied(value);
        self.primary = Slot::Unset;
    }

    /// Primary value, deriving it from the supplied secondary and caching it.
    pub fn resolve_primary<F>(&mut self, derive: F, undefined: &'static str) -> Result<f64>
    where
        F: FnOnce(f64) -> Result<f64>,
    {
        if let Some(v) = self.primary.value() {
            return Ok(v);
        }
        match self.secondary {
            Slot::Supplied(other) => {
                let v = derive(other)?;
                self.primary = Slot::Computed(v);
                Ok(v)
            }
            _ => Err(PhotometryError::CalibrationUndefined(undefined)),
        }
    }

    /// Secondary value, deriving it from the supplied primary and caching it.
    pub fn resolve_secondary<F>(&mut self, derive: F, undefined: &'static str) -> Result<f64>
    where
        F: FnOnce(f64) -> Result<f64>,
    {
        if let Some(v) = self.secondary.value() {
            return Ok(v);
        }
        match self.primary {
            Slot::Supplied(other) => {
                let v = derive(other)?;
                self.secondary = Slot::Computed(v);
                Ok(v)
            }
            _ => Err(PhotometryError::CalibrationUndefined(undefined)),
        }
    }
}

/// Flux usable on a logarithmic scale.
fn positive_flux(flux: f64) -> Result<f64> {
    if flux.is_finite() && flux > 0.0 {
        Ok(flux)
    } else {
        Err(PhotometryError::NonPositiveFlux(flux))
    }
}

/// `m = -2.5·log10(flux) + k`
pub fn magnitude_from_zero_point(flux: f64, k: f64) -> Result<f64> {
    Ok(-2.5 * positive_flux(flux)?.log10() + k)
}

/// `k = 2.5·log10(flux) + m`
pub fn zero_point_from_magnitude(flux: f64, magnitude: f64) -> Result<f64> {
    Ok(2.5 * positive_flux(flux)?.log10() + magnitude)
}

/// Add the flux's relative uncertainty in quadrature to a supplied uncertainty.
pub fn propagate_error(supplied_error: f64, flux: f64, flux_error: f64) -> Result<f64> {
    let relative = flux_error / positive_flux(flux)?;
    Ok((supplied_error * supplied_error + relative * relative).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_undefined_until_supplied() {
        let mut pair = CalibrationPair::default();
        assert_eq!(
            pair.resolve_primary(Ok, "magnitude"),
            Err(PhotometryError::CalibrationUndefined("magnitude"))
        );
        assert_eq!(
            pair.resolve_secondary(Ok, "k"),
            Err(PhotometryError::CalibrationUndefined("k"))
        );
    }

    #[test]
    fn test_derive_once_and_cache() {
        let mut pair = CalibrationPair::default();
        pair.supply_secondary(20.0);
        assert_eq!(pair.primary(), Slot::Unset);

        let m = pair.resolve_primary(|k| magnitude_from_zero_point(100.0, k), "m").unwrap();
        assert_relative_eq!(m, 15.0);
        assert_eq!(pair.primary(), Slot::Computed(15.0));

        // A cached value wins over a different derivation
        let again = pair.resolve_primary(|_| Ok(-1.0), "m").unwrap();
        assert_relative_eq!(again, 15.0);
    }

    #[test]
    fn test_resupply_clears_derived_side() {
        let mut pair = CalibrationPair::default();
        pair.supply_primary(12.0);
        pair.resolve_secondary(|m| Ok(m + 1.0), "k").unwrap();
        assert_eq!(pair.secondary(), Slot::Computed(13.0));

        pair.supply_secondary(30.0);
        assert_eq!(pair.primary(), Slot::Unset);
        assert!(pair.secondary().is_supplied());
    }

    #[test]
    fn test_magnitude_zero_point_inverse() {
        let flux = 12_345.0;
        let k = zero_point_from_magnitude(flux, 11.2).unwrap();
        assert_relative_eq!(
            magnitude_from_zero_point(flux, k).unwrap(),
            11.2,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_error_propagation() {
        assert_relative_eq!(
            propagate_error(0.03, 100.0, 4.0).unwrap(),
            0.05,
            epsilon = 1e-12
        );
        assert_relative_eq!(propagate_error(0.0, 100.0, 0.0).unwrap(), 0.0);
    }

    #[test]
    fn test_non_positive_flux_is_not_calibrated() {
        for flux in [0.0, -30.0, f64::NAN] {
            assert!(matches!(
                magnitude_from_zero_point(flux, 25.0),
                Err(PhotometryError::NonPositiveFlux(_))
            ));
            assert!(zero_point_from_magnitude(flux, 10.0).is_err());
            assert!(propagate_error(0.02, flux, 1.0).is_err());
        }

        let mut pair = CalibrationPair::default();
        pair.supply_secondary(25.0);
        let result = pair.resolve_primary(|k| magnitude_from_zero_point(-30.0, k), "m");
        assert_eq!(result, Err(PhotometryError::NonPositiveFlux(-30.0)));
        assert_eq!(pair.primary(), Slot::Unset);
        assert!(pair.secondary().is_supplied());
    }
}
