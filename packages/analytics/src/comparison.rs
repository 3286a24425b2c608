//! Latest-value comparison and difference-in-differences estimation.

use chrono::NaiveDate;
use climate_compass_analytics_models::{
    CityDifference, DidEstimate, DidInputs, LatestValue, UnavailableReason,
};
use climate_compass_climate_models::{Metric, ObservationTable, SYNTHETIC_CONTROL};

use crate::AnalyticsError;

/// Length of the pre and post windows, in grid periods.
pub const DEFAULT_DID_WINDOW: usize = 12;

/// The latest observation of `metric` for every city in `table`, in the
/// table's city order.
#[must_use]
pub fn latest_values(table: &ObservationTable, metric: Metric) -> Vec<LatestValue> {
    table
        .cities()
        .iter()
        .filter_map(|city| {
            table.city_series(city).last().map(|obs| LatestValue {
                city: city.clone(),
                date: obs.date,
                value: obs.value(metric),
            })
        })
        .collect()
}

/// Subtracts the base city's latest value from every city's latest value.
///
/// # Errors
///
/// Returns [`AnalyticsError::MissingCity`] if `base_city` is not in `latest`.
pub fn differences_from_base(
    latest: &[LatestValue],
    base_city: &str,
) -> Result<Vec<CityDifference>, AnalyticsError> {
    let base = latest
        .iter()
        .find(|l| l.city == base_city)
        .ok_or_else(|| AnalyticsError::MissingCity {
            city: base_city.to_string(),
        })?
        .value;

    Ok(latest
        .iter()
        .map(|l| CityDifference {
            city: l.city.clone(),
            value: l.value,
            difference: if l.city == base_city {
                0.0
            } else {
                l.value - base
            },
        })
        .collect())
}

/// Pre and post windows over a date grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DidPeriods {
    /// First `window` dates of the grid.
    pub pre: Vec<NaiveDate>,
    /// Last `window` dates of the grid.
    pub post: Vec<NaiveDate>,
}

impl DidPeriods {
    /// Splits `dates` (oldest first) into pre and post windows of at most
    /// `window` dates each. The windows overlap when the grid is shorter
    /// than `2 * window`.
    #[must_use]
    pub fn from_grid(dates: &[NaiveDate], window: usize) -> Self {
        let len = window.min(dates.len());
        Self {
            pre: dates[..len].to_vec(),
            post: dates[dates.len() - len..].to_vec(),
        }
    }

    /// Whether any date sits in both windows.
    #[must_use]
    pub fn overlaps(&self) -> bool {
        self.pre.iter().any(|d| self.post.contains(d))
    }
}

/// Mean of `metric` for `city` over `dates`; `None` if no row matches.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn period_mean(
    table: &ObservationTable,
    city: &str,
    metric: Metric,
    dates: &[NaiveDate],
) -> Option<f64> {
    let values: Vec<f64> = dates
        .iter()
        .filter_map(|d| table.get(city, *d))
        .map(|obs| obs.value(metric))
        .collect();
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Estimates the base city's treatment effect against its peers.
///
/// Peer means are taken per city first and then averaged, so every peer
/// carries equal weight regardless of its variance. The synthetic control
/// is never treated as a peer. With no peers the estimate is
/// [`DidEstimate::Unavailable`].
///
/// # Errors
///
/// Returns [`AnalyticsError::MissingCity`] if the base city or a peer
/// has no rows in either window.
pub fn difference_in_differences(
    table: &ObservationTable,
    base_city: &str,
    peers: &[String],
    metric: Metric,
    window: usize,
) -> Result<DidEstimate, AnalyticsError> {
    let peers: Vec<&str> = peers
        .iter()
        .map(String::as_str)
        .filter(|p| *p != SYNTHETIC_CONTROL)
        .collect();

    if peers.is_empty() {
        return Ok(DidEstimate::Unavailable {
            base_city: base_city.to_string(),
            metric,
            reason: UnavailableReason::NoPeers,
        });
    }

    let periods = DidPeriods::from_grid(&table.dates(), window);

    let city_means = |city: &str| -> Result<(f64, f64), AnalyticsError> {
        let missing = || AnalyticsError::MissingCity {
            city: city.to_string(),
        };
        let pre = period_mean(table, city, metric, &periods.pre).ok_or_else(missing)?;
        let post = period_mean(table, city, metric, &periods.post).ok_or_else(missing)?;
        Ok((pre, post))
    };

    let (base_pre, base_post) = city_means(base_city)?;

    let peer_means = peers
        .iter()
        .map(|p| city_means(*p))
        .collect::<Result<Vec<_>, _>>()?;
    #[allow(clippy::cast_precision_loss)]
    let count = peer_means.len() as f64;
    let peer_pre = peer_means.iter().map(|(pre, _)| pre).sum::<f64>() / count;
    let peer_post = peer_means.iter().map(|(_, post)| post).sum::<f64>() / count;

    let inputs = DidInputs {
        base_pre,
        base_post,
        peer_pre,
        peer_post,
    };
    let periods_overlap = periods.overlaps();
    if periods_overlap {
        log::warn!(
            "Pre and post windows overlap ({} dates, window {window}); DiD for {base_city} is degraded",
            table.dates().len()
        );
    }

    Ok(DidEstimate::Available {
        base_city: base_city.to_string(),
        metric,
        inputs,
        estimate: inputs.estimate(),
        periods_overlap,
    })
}
