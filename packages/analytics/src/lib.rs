#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Analytics engine for the climate comparison dashboard.
//!
//! Builds the synthetic control, annotates every city with a trailing
//! trend and residual-based anomaly flags for one metric, and computes
//! latest-value comparisons and the difference-in-differences estimate.
//! Every function works on an in-memory [`ObservationTable`] and writes
//! results back by `(city, date)` key.

pub mod anomaly;
pub mod comparison;
pub mod stl;
pub mod synthetic;
pub mod trend;

use climate_compass_analytics_models::Diagnostic;
use climate_compass_climate_models::{Metric, ObservationTable, TableError};
use thiserror::Error;

use crate::anomaly::{AnomalyDetector, ResidualSource};
use crate::stl::StlError;

/// Errors that can occur during analytics operations.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// A city the computation depends on has no observations.
    #[error("City '{city}' has no observations")]
    MissingCity {
        /// Name of the missing city.
        city: String,
    },

    /// Keyed table insert or write-back failed.
    #[error("Table error: {0}")]
    Table(#[from] TableError),

    /// Seasonal decomposition failed.
    #[error("Decomposition error for {city}: {source}")]
    Decomposition {
        /// City whose series failed to decompose.
        city: String,
        /// Underlying decomposition error.
        source: StlError,
    },
}

/// Settings for [`annotate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnotationParams {
    /// Trailing moving-average window.
    pub trend_window: usize,
    /// Anomaly detection settings.
    pub detector: AnomalyDetector,
}

impl Default for AnnotationParams {
    fn default() -> Self {
        Self {
            trend_window: trend::DEFAULT_TREND_WINDOW,
            detector: AnomalyDetector::default(),
        }
    }
}

/// Fills the `trend` and `anomaly` columns of `table` for `metric`.
///
/// Previous annotations are cleared first, so values computed for another
/// metric never survive. Each city is processed independently from its
/// own date-ordered series and written back by key. Returns a
/// [`Diagnostic`] for every city whose anomalies had to be computed
/// without seasonal decomposition.
///
/// # Errors
///
/// * [`AnalyticsError::Decomposition`] if a city's series cannot be decomposed
/// * [`AnalyticsError::Table`] if a write-back misses its row
pub fn annotate(
    table: &mut ObservationTable,
    metric: Metric,
    params: &AnnotationParams,
) -> Result<Vec<Diagnostic>, AnalyticsError> {
    table.reset_annotations(metric);
    let mut diagnostics = Vec::new();

    for city in table.cities().to_vec() {
        let dates: Vec<_> = table.city_series(&city).map(|obs| obs.date).collect();
        let values = table.city_values(&city, metric);

        let trend = trend::rolling_mean(&values, params.trend_window);
        let report =
            params
                .detector
                .detect(&values)
                .map_err(|source| AnalyticsError::Decomposition {
                    city: city.clone(),
                    source,
                })?;

        if report.source == ResidualSource::SeriesMean {
            log::warn!(
                "{city}: {} points is too short for seasonal decomposition",
                values.len()
            );
            diagnostics.push(Diagnostic::SeasonalDecompositionSkipped {
                city: city.clone(),
                points: values.len(),
                required: params.detector.min_seasonal_points(),
            });
        }

        log::debug!(
            "{city}: {} anomalies in {metric} (threshold {:.3})",
            report.count(),
            report.threshold
        );

        for ((date, t), flag) in dates.iter().zip(&trend).zip(&report.flags) {
            table.set_trend(&city, *date, *t)?;
            table.set_anomaly(&city, *date, *flag)?;
        }
    }

    Ok(diagnostics)
}
