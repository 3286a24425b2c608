//! Trailing moving-average trend.

/// Window used for the dashboard trend line.
pub const DEFAULT_TREND_WINDOW: usize = 3;

/// Trailing moving average that shrinks at the start of the series.
///
/// `out[i]` is the mean of `values[i + 1 - window..=i]`, using however
/// many points exist when `i + 1 < window`. The first output therefore
/// always equals the first input, and no value looks ahead. A window of
/// zero is treated as one.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            let slice = &values[start..=i];
            slice.iter().sum::<f64>() / slice.len() as f64
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_point_equals_raw_value() {
        let trend = rolling_mean(&[5.0, 7.0, 9.0, 2.0], DEFAULT_TREND_WINDOW);
        assert!((trend[0] - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn uses_available_points_at_boundary() {
        let trend = rolling_mean(&[5.0, 7.0, 9.0, 2.0], 3);
        assert_eq!(trend, vec![5.0, 6.0, 7.0, 6.0]);
    }

    #[test]
    fn constant_series_has_constant_trend() {
        let trend = rolling_mean(&[4.5; 10], 3);
        assert!(trend.iter().all(|t| (t - 4.5).abs() < 1e-12));
    }

    #[test]
    fn ignores_future_values() {
        let a = rolling_mean(&[1.0, 2.0, 3.0, 100.0], 3);
        let b = rolling_mean(&[1.0, 2.0, 3.0, -100.0], 3);
        assert_eq!(a[..3], b[..3]);
    }

    #[test]
    fn empty_input_yields_empty_trend() {
        assert!(rolling_mean(&[], 3).is_empty());
    }
}
