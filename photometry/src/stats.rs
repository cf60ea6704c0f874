//! Population statistics over pixel samples.
//!
//! All reductions return `None` for an empty slice; callers decide which
//! error that maps to. Standard deviation is the population form (divide by
//! `n`), and the median of even-length data averages the two middle values.

/// Arithmetic mean.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Median of the values.
///
/// Sorts a copy with `total_cmp`, so NaN samples sort to the ends rather
/// than being dropped; the population is never silently shrunk.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mid = sorted.len() / 2;
    let median_value = if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    };

    Some(median_value)
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mean_basic() {
        assert_relative_eq!(mean(&[1.0, 2.0, 3.0, 4.0]).unwrap(), 2.5);
        assert!(mean(&[]).is_none());
    }

    #[test]
    fn test_median_odd_length() {
        let values = vec![1.0, 3.0, 2.0, 5.0, 4.0];
        assert_eq!(median(&values).unwrap(), 3.0);
    }

    #[test]
    fn test_median_even_length() {
        let values = vec![1.0, 2.0, 3.0, 4.0];
        assert_eq!(median(&values).unwrap(), 2.5);
    }

    #[test]
    fn test_median_single_value() {
        assert_eq!(median(&[42.0]).unwrap(), 42.0);
    }

    #[test]
    fn test_median_empty_slice() {
        assert!(median(&[]).is_none());
    }

    #[test]
    fn test_median_negative_values() {
        let values = vec![-5.0, -2.0, -8.0, -1.0, -3.0];
        assert_eq!(median(&values).unwrap(), -3.0);
    }

    #[test]
    fn test_median_duplicates() {
        let values = vec![1.0, 2.0, 2.0, 3.0, 3.0, 3.0];
        assert_eq!(median(&values).unwrap(), 2.5);
    }

    #[test]
    fn test_median_with_infinities() {
        let values = vec![f64::NEG_INFINITY, 1.0, 2.0, 3.0, f64::INFINITY];
        assert_eq!(median(&values).unwrap(), 2.0);
    }

    #[test]
    fn test_std_population() {
        // Population std of [2,4,4,4,5,5,7,9] is exactly 2
        let values = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_relative_eq!(std_dev(&values).unwrap(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_std_constant() {
        assert_eq!(std_dev(&[5.0; 10]).unwrap(), 0.0);
        assert!(std_dev(&[]).is_none());
    }
}
