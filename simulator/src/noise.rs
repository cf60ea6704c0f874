//! Seeded Gaussian background noise for synthetic frames.

use ndarray::{Array2, ArrayViewMut2, Axis};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use rayon::prelude::*;
use thiserror::Error;

/// Rows per independently seeded chunk.
const CHUNK_ROWS: usize = 64;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NoiseError {
    #[error("invalid noise distribution (mean {mean}, std_dev {std_dev}): {reason}")]
    InvalidDistribution {
        mean: f64,
        std_dev: f64,
        reason: String,
    },
}

/// Fill `array` chunk by chunk in parallel, each row chunk drawing from its
/// own RNG seeded with `seed + chunk_index`.
///
/// The output depends only on `seed` and the array shape, not on thread
/// scheduling.
pub fn fill_in_parallel_chunks<F>(array: &mut Array2<f64>, seed: u64, fill: F)
where
    F: Fn(&mut ArrayViewMut2<f64>, &mut StdRng) + Send + Sync,
{
    array
        .axis_chunks_iter_mut(Axis(0), CHUNK_ROWS)
        .into_par_iter()
        .enumerate()
        .for_each(|(chunk_index, mut chunk)| {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(chunk_index as u64));
            fill(&mut chunk, &mut rng);
        });
}

/// A `(height, width)` array of samples from `Normal(mean, std_dev)`.
pub fn normal_field(
    size: (usize, usize),
    mean: f64,
    std_dev: f64,
    seed: u64,
) -> Result<Array2<f64>, NoiseError> {
    let normal = Normal::new(mean, std_dev).map_err(|e| NoiseError::InvalidDistribution {
        mean,
        std_dev,
        reason: e.to_string(),
    })?;
    if !mean.is_finite() {
        return Err(NoiseError::InvalidDistribution {
            mean,
            std_dev,
            reason: "mean must be finite".to_string(),
        });
    }

    let mut field = Array2::zeros(size);
    fill_in_parallel_chunks(&mut field, seed, |chunk, rng| {
        chunk.mapv_inplace(|_| normal.sample(&mut *rng));
    });
    Ok(field)
}
