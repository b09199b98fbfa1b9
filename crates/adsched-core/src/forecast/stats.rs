//! Small statistics helpers used by the forecaster.

/// Median of `values`, or `None` when empty. NaN values are ignored.
pub(crate) fn median<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let mut v: Vec<f64> = values.into_iter().filter(|x| !x.is_nan()).collect();
    if v.is_empty() {
        return None;
    }
    v.sort_by(f64::total_cmp);
    let mid = v.len() / 2;
    if v.len() % 2 == 0 {
        Some((v[mid - 1] + v[mid]) / 2.0)
    } else {
        Some(v[mid])
    }
}

/// Weighted average over the available terms. Unavailable terms (`None`) drop
/// out and the remaining weights renormalize; with no usable weight the result is 0.
pub(crate) fn weighted_average(terms: &[(Option<f64>, f64)]) -> f64 {
    let (sum, weight) = terms
        .iter()
        .filter_map(|(value, w)| value.map(|v| (v, *w)))
        .filter(|(_, w)| *w > 0.0)
        .fold((0.0, 0.0), |(s, ws), (v, w)| (s + v * w, ws + w));
    if weight > 0.0 {
        sum / weight
    } else {
        0.0
    }
}

/// Agreement between estimates: `1 - stddev/mean`, clamped to `[0, 1]`.
/// Uses the sample standard deviation; a zero (or non-positive) mean yields 0.
pub(crate) fn confidence(estimates: &[f64]) -> f64 {
    if estimates.len() < 2 {
        return 0.0;
    }
    let n = estimates.len() as f64;
    let mean = estimates.iter().sum::<f64>() / n;
    if mean <= 0.0 || !mean.is_finite() {
        return 0.0;
    }
    let var = estimates.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let cv = var.sqrt() / mean;
    (1.0 - cv).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_odd_even_empty() {
        assert_eq!(median([3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median([4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(std::iter::empty()), None);
    }

    #[test]
    fn median_resists_single_outlier() {
        let m = median([5_000_000.0, 5_100_000.0, 4_900_000.0, 3.0, 5_050_000.0]).unwrap();
        assert!(m > 4_000_000.0);
    }

    #[test]
    fn weighted_average_renormalizes_missing_terms() {
        let avg = weighted_average(&[(Some(100.0), 0.4), (None, 0.4), (Some(400.0), 0.2)]);
        assert!((avg - 200.0).abs() < 1e-9);
        assert_eq!(weighted_average(&[(None, 0.4), (None, 0.2)]), 0.0);
        assert_eq!(weighted_average(&[(Some(7.0), 0.0)]), 0.0);
    }

    #[test]
    fn confidence_bounds() {
        assert_eq!(confidence(&[0.0, 0.0, 0.0]), 0.0);
        assert!((confidence(&[10.0, 10.0, 10.0]) - 1.0).abs() < 1e-12);
        let c = confidence(&[10.0, 12.0, 8.0]);
        assert!(c > 0.7 && c < 1.0);
        // Wildly disagreeing estimates bottom out at zero.
        assert_eq!(confidence(&[0.0, 0.0, 1_000.0]), 0.0);
    }
}
