//! Residual-threshold anomaly detection.
//!
//! A point is anomalous when its residual exceeds `sigma` sample standard
//! deviations of the city's residuals. Residuals come from a robust STL
//! fit when the series spans two seasonal cycles, and from the series
//! mean otherwise.

use crate::stl::{Stl, StlError};

/// Seasonal period (months) used by the dashboard.
pub const DEFAULT_SEASONAL_PERIOD: usize = 12;

/// Residual multiple above which a point is flagged.
pub const DEFAULT_SIGMA: f64 = 2.0;

/// Relative size below which a residual spread counts as zero. The
/// decomposition runs in single precision, so this sits above `f32` noise.
const DEGENERATE_SPREAD: f64 = 1e-5;

/// How residuals were obtained for a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResidualSource {
    /// Remainder of a robust seasonal-trend decomposition.
    Seasonal,
    /// Deviation from the series mean; used for series shorter than
    /// [`AnomalyDetector::min_seasonal_points`].
    SeriesMean,
}

/// Per-point anomaly flags for one series.
#[derive(Debug, Clone, PartialEq)]
pub struct AnomalyReport {
    /// One flag per input point.
    pub flags: Vec<bool>,
    /// Residual of each point.
    pub residuals: Vec<f64>,
    /// Absolute residual threshold (`sigma * std`); zero when degenerate.
    pub threshold: f64,
    /// Where the residuals came from.
    pub source: ResidualSource,
}

impl AnomalyReport {
    /// Number of flagged points.
    #[must_use]
    pub fn count(&self) -> usize {
        self.flags.iter().filter(|f| **f).count()
    }
}

/// Flags anomalous points in a single city's series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnomalyDetector {
    /// Seasonal period passed to STL.
    pub period: usize,
    /// Residual multiple above which a point is flagged.
    pub sigma: f64,
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self {
            period: DEFAULT_SEASONAL_PERIOD,
            sigma: DEFAULT_SIGMA,
        }
    }
}

impl AnomalyDetector {
    /// Shortest series that gets a seasonal decomposition.
    #[must_use]
    pub const fn min_seasonal_points(&self) -> usize {
        Stl::new(self.period).min_points()
    }

    /// Computes anomaly flags for `values`.
    ///
    /// Series shorter than [`Self::min_seasonal_points`] are measured
    /// against their mean and reported with [`ResidualSource::SeriesMean`].
    /// A residual spread of (numerically) zero flags nothing.
    ///
    /// # Errors
    ///
    /// Returns [`StlError`] if the decomposition is misconfigured or the
    /// series holds non-finite values.
    pub fn detect(&self, values: &[f64]) -> Result<AnomalyReport, StlError> {
        let (residuals, source) = match Stl::new(self.period).robust().decompose(values) {
            Ok(result) => (result.remainder, ResidualSource::Seasonal),
            Err(StlError::InsufficientData { .. }) => {
                if values.iter().any(|v| !v.is_finite()) {
                    return Err(StlError::NonFinite);
                }
                (deviation_from_mean(values), ResidualSource::SeriesMean)
            }
            Err(e) => return Err(e),
        };

        let scale = values.iter().fold(1.0_f64, |acc, v| acc.max(v.abs()));
        let threshold = match sample_std(&residuals) {
            Some(std) if std > DEGENERATE_SPREAD * scale => self.sigma * std,
            _ => 0.0,
        };

        let flags = residuals
            .iter()
            .map(|r| threshold > 0.0 && r.abs() > threshold)
            .collect();

        Ok(AnomalyReport {
            flags,
            residuals,
            threshold,
            source,
        })
    }
}

#[allow(clippy::cast_precision_loss)]
fn deviation_from_mean(values: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    values.iter().map(|v| v - mean).collect()
}

/// Sample standard deviation (`n - 1` denominator); `None` below two points.
#[allow(clippy::cast_precision_loss)]
fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    Some((ss / (n - 1.0)).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(clippy::cast_precision_loss)]
    fn seasonal(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| {
                let t = i as f64;
                let wobble = 0.3 * (t * 1.7).sin();
                15.0 + 10.0 * (std::f64::consts::TAU * t / 12.0).sin() + wobble
            })
            .collect()
    }

    #[test]
    fn flags_injected_spike() {
        let mut values = seasonal(36);
        values[20] += 25.0;
        let report = AnomalyDetector::default().detect(&values).unwrap();
        assert_eq!(report.source, ResidualSource::Seasonal);
        assert!(report.flags[20]);
        assert!(report.count() <= 3, "too many flags: {:?}", report.flags);
    }

    #[test]
    fn constant_series_flags_nothing() {
        let report = AnomalyDetector::default().detect(&[7.0; 36]).unwrap();
        assert_eq!(report.count(), 0);
        assert!(report.threshold.abs() < f64::EPSILON);
    }

    #[test]
    fn single_precision_rounding_flags_nothing() {
        let report = AnomalyDetector::default().detect(&[1234.567; 48]).unwrap();
        assert_eq!(report.source, ResidualSource::Seasonal);
        assert_eq!(report.count(), 0);
    }

    #[test]
    fn short_series_falls_back_to_mean() {
        let mut values = vec![1.0; 12];
        values[5] = 10.0;
        let report = AnomalyDetector::default().detect(&values).unwrap();
        assert_eq!(report.source, ResidualSource::SeriesMean);
        assert!(report.flags[5]);
        assert_eq!(report.count(), 1);
    }

    #[test]
    fn single_point_flags_nothing() {
        let report = AnomalyDetector::default().detect(&[3.0]).unwrap();
        assert_eq!(report.flags, vec![false]);
    }

    #[test]
    fn rejects_non_finite_short_series() {
        assert_eq!(
            AnomalyDetector::default().detect(&[1.0, f64::INFINITY]),
            Err(StlError::NonFinite)
        );
    }

    #[test]
    fn sample_std_uses_n_minus_one() {
        let std = sample_std(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert!((std - 1.290_994_448_735_805_6).abs() < 1e-12);
        assert!(sample_std(&[1.0]).is_none());
    }
}
