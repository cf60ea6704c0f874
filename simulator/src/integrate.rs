//! Globally adaptive Gauss–Kronrod quadrature.
//!
//! One-dimensional integrals use the 7-point Gauss / 15-point Kronrod pair on
//! each segment. The segment with the largest error estimate is bisected until
//! the summed error satisfies `error ≤ max(absolute, relative·|I|)` or the
//! subdivision budget runs out. Two-dimensional integrals over rectangles are
//! evaluated as nested one-dimensional integrals; the inner integral runs at
//! one tenth of the outer tolerance so its residual error does not dominate
//! the outer estimate.
//!
//! The default tolerance is `absolute = 1e-10`, `relative = 1e-8`, with at
//! most 200 subdivisions per one-dimensional integral.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kronrod abscissae on [-1, 1]; odd indices are the embedded Gauss nodes.
const XGK: [f64; 8] = [
    0.991_455_371_120_812_6,
    0.949_107_912_342_758_5,
    0.864_864_423_359_769_1,
    0.741_531_185_599_394_4,
    0.586_087_235_467_691_1,
    0.405_845_151_377_397_2,
    0.207_784_955_007_898_5,
    0.0,
];

const WGK: [f64; 8] = [
    0.022_935_322_010_529_22,
    0.063_092_092_629_978_55,
    0.104_790_010_322_250_2,
    0.140_653_259_715_525_9,
    0.169_004_726_639_267_9,
    0.190_350_578_064_785_4,
    0.204_432_940_075_298_9,
    0.209_482_141_084_727_8,
];

/// Gauss weights for `XGK[1]`, `XGK[3]`, `XGK[5]` and the center.
const WG: [f64; 4] = [
    0.129_484_966_168_869_7,
    0.279_705_391_489_276_7,
    0.381_830_050_505_118_9,
    0.417_959_183_673_469_4,
];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IntegrationError {
    #[error("integral did not converge after {subdivisions} subdivisions: {estimate} ± {error}")]
    NotConverged {
        estimate: f64,
        error: f64,
        subdivisions: usize,
    },

    #[error("integrand is not finite at {at}")]
    NonFinite { at: f64 },

    #[error("integration bounds must be finite: [{lower}, {upper}]")]
    InvalidBounds { lower: f64, upper: f64 },
}

/// Requested accuracy for adaptive quadrature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntegrationTolerance {
    pub absolute: f64,
    pub relative: f64,
    pub max_subdivisions: usize,
}

impl Default for IntegrationTolerance {
    fn default() -> Self {
        Self {
            absolute: 1e-10,
            relative: 1e-8,
            max_subdivisions: 200,
        }
    }
}

impl IntegrationTolerance {
    fn accepts(&self, estimate: f64, error: f64) -> bool {
        error <= self.absolute.max(self.relative * estimate.abs())
    }

    fn tightened(&self) -> Self {
        Self {
            absolute: self.absolute * 0.1,
            relative: self.relative * 0.1,
            max_subdivisions: self.max_subdivisions,
        }
    }
}

/// Integral estimate with its error bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quadrature {
    pub value: f64,
    pub error: f64,
    pub subdivisions: usize,
}

#[derive(Debug, Clone, Copy)]
struct Segment {
    lower: f64,
    upper: f64,
    value: f64,
    error: f64,
}

impl PartialEq for Segment {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Segment {}

impl PartialOrd for Segment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Segment {
    fn cmp(&self, other: &Self) -> Ordering {
        self.error.total_cmp(&other.error)
    }
}

fn gauss_kronrod<F>(f: &mut F, lower: f64, upper: f64) -> Result<Segment, IntegrationError>
where
    F: FnMut(f64) -> Result<f64, IntegrationError>,
{
    let center = 0.5 * (lower + upper);
    let half = 0.5 * (upper - lower);

    let mut eval = |x: f64| -> Result<f64, IntegrationError> {
        let v = f(x)?;
        if v.is_finite() {
            Ok(v)
        } else {
            Err(IntegrationError::NonFinite { at: x })
        }
    };

    let fc = eval(center)?;
    let mut kronrod = fc * WGK[7];
    let mut gauss = fc * WG[3];

    for (i, (&node, &weight)) in XGK.iter().zip(WGK.iter()).take(7).enumerate() {
        let dx = half * node;
        let pair = eval(center - dx)? + eval(center + dx)?;
        kronrod += weight * pair;
        if i % 2 == 1 {
            gauss += WG[i / 2] * pair;
        }
    }

    Ok(Segment {
        lower,
        upper,
        value: kronrod * half,
        error: ((kronrod - gauss) * half).abs(),
    })
}

/// Integrate `f` over `[lower, upper]`.
///
/// `f` may itself fail, which lets nested integrals propagate their errors.
pub fn integrate<F>(
    mut f: F,
    lower: f64,
    upper: f64,
    tolerance: &IntegrationTolerance,
) -> Result<Quadrature, IntegrationError>
where
    F: FnMut(f64) -> Result<f64, IntegrationError>,
{
    if !lower.is_finite() || !upper.is_finite() {
        return Err(IntegrationError::InvalidBounds { lower, upper });
    }
    if lower == upper {
        return Ok(Quadrature {
            value: 0.0,
            error: 0.0,
            subdivisions: 0,
        });
    }
    if upper < lower {
        let reversed = integrate(f, upper, lower, tolerance)?;
        return Ok(Quadrature {
            value: -reversed.value,
            ..reversed
        });
    }

    let first = gauss_kronrod(&mut f, lower, upper)?;
    let mut total = first.value;
    let mut total_error = first.error;
    let mut heap = BinaryHeap::from([first]);
    let mut subdivisions = 0;

    while !tolerance.accepts(total, total_error) {
        if subdivisions >= tolerance.max_subdivisions {
            return Err(IntegrationError::NotConverged {
                estimate: total,
                error: total_error,
                subdivisions,
            });
        }
        let Some(worst) = heap.pop() else { break };
        let mid = 0.5 * (worst.lower + worst.upper);
        // Segment too narrow to split in floating point.
        if mid <= worst.lower || mid >= worst.upper {
            return Err(IntegrationError::NotConverged {
                estimate: total,
                error: total_error,
                subdivisions,
            });
        }

        let left = gauss_kronrod(&mut f, worst.lower, mid)?;
        let right = gauss_kronrod(&mut f, mid, worst.upper)?;

        total += left.value + right.value - worst.value;
        total_error += left.error + right.error - worst.error;
        heap.push(left);
        heap.push(right);
        subdivisions += 1;
    }

    // Re-sum to shed the drift from incremental updates.
    let value = heap.iter().map(|s| s.value).sum();
    let error = heap.iter().map(|s| s.error).sum();
    Ok(Quadrature {
        value,
        error,
        subdivisions,
    })
}

/// Integrate `f(x, y)` over `[x0, x1] × [y0, y1]`.
pub fn integrate_2d<F>(
    f: F,
    (x0, x1): (f64, f64),
    (y0, y1): (f64, f64),
    tolerance: &IntegrationTolerance,
) -> Result<Quadrature, IntegrationError>
where
    F: Fn(f64, f64) -> f64,
{
    let inner_tolerance = tolerance.tightened();
    integrate(
        |y| integrate(|x| Ok(f(x, y)), x0, x1, &inner_tolerance).map(|q| q.value),
        y0,
        y1,
        tolerance,
    )
}
