#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Comparison, estimation, and diagnostic result types.
//!
//! These are the outputs of the analytics engine that the presentation
//! layer renders as tables and sentences. They carry no behavior beyond
//! small accessors.

use chrono::NaiveDate;
use climate_compass_climate_models::Metric;
use serde::{Deserialize, Serialize};

/// The most recent value of the selected metric for one city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestValue {
    /// City name.
    pub city: String,
    /// Date of the latest observation.
    pub date: NaiveDate,
    /// Metric value at that date.
    pub value: f64,
}

/// Latest value of a city relative to the base city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityDifference {
    /// City name.
    pub city: String,
    /// Latest metric value of this city.
    pub value: f64,
    /// `value` minus the base city's latest value.
    pub difference: f64,
}

/// Pre/post period means feeding a difference-in-differences estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidInputs {
    /// Base city mean over the pre-period.
    pub base_pre: f64,
    /// Base city mean over the post-period.
    pub base_post: f64,
    /// Unweighted mean of per-peer-city means over the pre-period.
    pub peer_pre: f64,
    /// Unweighted mean of per-peer-city means over the post-period.
    pub peer_post: f64,
}

impl DidInputs {
    /// `(base_post - base_pre) - (peer_post - peer_pre)`.
    #[must_use]
    pub fn estimate(&self) -> f64 {
        (self.base_post - self.base_pre) - (self.peer_post - self.peer_pre)
    }
}

/// Why a difference-in-differences estimate could not be produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnavailableReason {
    /// No peer cities were selected, so the control group is empty.
    NoPeers,
}

impl std::fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoPeers => write!(f, "no peer cities are selected"),
        }
    }
}

/// Result of the difference-in-differences computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DidEstimate {
    /// A numeric estimate.
    #[serde(rename_all = "camelCase")]
    Available {
        /// Base city name.
        base_city: String,
        /// Metric the estimate describes.
        metric: Metric,
        /// Period means the estimate was computed from.
        inputs: DidInputs,
        /// The estimate itself.
        estimate: f64,
        /// Whether the pre and post windows share dates.
        periods_overlap: bool,
    },
    /// The estimate is undefined for the current selection.
    #[serde(rename_all = "camelCase")]
    Unavailable {
        /// Base city name.
        base_city: String,
        /// Metric the estimate would describe.
        metric: Metric,
        /// Why no estimate exists.
        reason: UnavailableReason,
    },
}

impl DidEstimate {
    /// The numeric estimate, if available.
    #[must_use]
    pub const fn value(&self) -> Option<f64> {
        match self {
            Self::Available { estimate, .. } => Some(*estimate),
            Self::Unavailable { .. } => None,
        }
    }

    /// Whether a numeric estimate exists.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        matches!(self, Self::Available { .. })
    }

    /// Sentence summarizing the estimate for display.
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::Available {
                base_city,
                metric,
                estimate,
                ..
            } => format!(
                "The Difference-in-Differences estimate of the latest climate action in \
                 **{base_city}** for **{metric}** is **{estimate:.2}**."
            ),
            Self::Unavailable {
                base_city,
                metric,
                reason,
            } => format!(
                "The Difference-in-Differences estimate for **{base_city}** on **{metric}** \
                 is unavailable: {reason}."
            ),
        }
    }
}

/// A degraded-accuracy condition detected during computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// The series was too short for seasonal decomposition, so anomalies
    /// were flagged against the series mean instead.
    #[serde(rename_all = "camelCase")]
    SeasonalDecompositionSkipped {
        /// City whose anomalies are degraded.
        city: String,
        /// Number of points in the series.
        points: usize,
        /// Minimum number of points decomposition needs.
        required: usize,
    },
    /// The difference-in-differences pre and post windows share dates.
    #[serde(rename_all = "camelCase")]
    PeriodsOverlap {
        /// Number of dates on the grid.
        periods: usize,
        /// Length of each window.
        window: usize,
    },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SeasonalDecompositionSkipped {
                city,
                points,
                required,
            } => write!(
                f,
                "{city}: {points} points is fewer than the {required} needed for seasonal \
                 decomposition; anomalies are measured against the series mean"
            ),
            Self::PeriodsOverlap { periods, window } => write!(
                f,
                "pre and post windows of {window} periods overlap on a {periods}-period grid; \
                 the difference-in-differences estimate is less meaningful"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs() -> DidInputs {
        DidInputs {
            base_pre: 10.0,
            base_post: 14.0,
            peer_pre: 9.0,
            peer_post: 10.5,
        }
    }

    #[test]
    fn estimate_is_difference_of_changes() {
        assert!((inputs().estimate() - 2.5).abs() < 1e-12);
    }

    #[test]
    fn swapping_periods_negates_estimate() {
        let i = inputs();
        let swapped = DidInputs {
            base_pre: i.base_post,
            base_post: i.base_pre,
            peer_pre: i.peer_post,
            peer_post: i.peer_pre,
        };
        assert!((i.estimate() + swapped.estimate()).abs() < 1e-12);
    }

    #[test]
    fn summary_formats_two_decimals() {
        let did = DidEstimate::Available {
            base_city: "New York City".to_string(),
            metric: Metric::Temperature,
            inputs: inputs(),
            estimate: 2.5,
            periods_overlap: false,
        };
        assert_eq!(
            did.summary(),
            "The Difference-in-Differences estimate of the latest climate action in \
             **New York City** for **temperature** is **2.50**."
        );
    }

    #[test]
    fn unavailable_serializes_with_distinct_status() {
        let did = DidEstimate::Unavailable {
            base_city: "Paris".to_string(),
            metric: Metric::WellBeing,
            reason: UnavailableReason::NoPeers,
        };
        assert!(!did.is_available());
        assert_eq!(did.value(), None);

        let json = serde_json::to_value(&did).unwrap();
        assert_eq!(json["status"], "unavailable");
        assert_eq!(json["reason"], "no_peers");
        assert_eq!(json["baseCity"], "Paris");
        assert!(did.summary().contains("unavailable"));
    }
}
