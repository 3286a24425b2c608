#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Selection and render model types for the climate comparison dashboard.
//!
//! [`Selections`] is everything the user can change; [`RenderModel`] is
//! everything a presentation layer needs to draw the chart, the tables,
//! and the estimate sentence. Both serialize to camelCase JSON for the
//! REST API.

use chrono::NaiveDate;
use climate_compass_analytics_models::{CityDifference, Diagnostic, DidEstimate, LatestValue};
use climate_compass_climate_models::{Metric, Observation};
use serde::{Deserialize, Serialize};

/// The user's current widget state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selections {
    /// City being evaluated.
    pub base_city: String,
    /// Comparison cities (never includes the base city).
    pub peers: Vec<String>,
    /// Metric the chart, trend, and anomalies describe.
    pub metric: Metric,
    /// Whether to add the averaged "Synthetic Control" city.
    pub synthetic_control: bool,
}

impl Selections {
    /// Widget defaults for a city catalogue: the first city as base, the
    /// next `peer_count` cities as peers, synthetic control on, and the
    /// default metric. Returns `None` for an empty catalogue.
    #[must_use]
    pub fn defaults(cities: &[String], peer_count: usize) -> Option<Self> {
        let base_city = cities.first()?.clone();
        Some(Self {
            peers: cities.iter().skip(1).take(peer_count).cloned().collect(),
            base_city,
            metric: Metric::default(),
            synthetic_control: true,
        })
    }

    /// Cities a user may pick as peers for this base city.
    #[must_use]
    pub fn peer_options<'a>(cities: &'a [String], base_city: &str) -> Vec<&'a str> {
        cities
            .iter()
            .map(String::as_str)
            .filter(|c| *c != base_city)
            .collect()
    }
}

/// Query parameters for the dashboard endpoint.
///
/// Every field is optional; missing values fall back to [`Selections::defaults`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardQueryParams {
    /// Base city name.
    pub base: Option<String>,
    /// Comma-separated peer city names. An empty string selects no peers.
    pub peers: Option<String>,
    /// Metric id (e.g. `temperature`).
    pub metric: Option<String>,
    /// Whether to include the synthetic control.
    pub synthetic: Option<bool>,
}

/// A metric choice as offered by the metric selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricOption {
    /// Metric id.
    pub id: Metric,
    /// Display label.
    pub label: String,
}

impl From<Metric> for MetricOption {
    fn from(metric: Metric) -> Self {
        Self {
            id: metric,
            label: metric.label().to_string(),
        }
    }
}

/// The city catalogue and widget defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCatalogue {
    /// Every selectable city.
    pub cities: Vec<String>,
    /// Every selectable metric.
    pub metrics: Vec<MetricOption>,
    /// Initial widget state.
    pub defaults: Selections,
    /// Peers preselected when the base city changes: this many cities
    /// other than the base, in catalogue order.
    pub default_peer_count: usize,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
}

/// Everything needed to render one dashboard evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderModel {
    /// Page title.
    pub title: String,
    /// Page subtitle.
    pub subtitle: String,
    /// Selections this model was computed from.
    pub selections: Selections,
    /// Display label of the selected metric.
    pub metric_label: String,
    /// Whether synthetic control rows are present.
    pub synthetic_control_included: bool,
    /// The shared monthly date grid, oldest first.
    pub dates: Vec<NaiveDate>,
    /// Full table: every city and date with trend and anomaly columns.
    pub rows: Vec<Observation>,
    /// Subset of `rows` flagged as anomalous.
    pub anomalies: Vec<Observation>,
    /// "Latest Metric Values" table.
    pub latest: Vec<LatestValue>,
    /// "Difference from selected base city (Latest)" table.
    pub differences: Vec<CityDifference>,
    /// Difference-in-differences estimate.
    pub did: DidEstimate,
    /// Sentence describing `did`.
    pub did_summary: String,
    /// Degraded-accuracy conditions hit while computing.
    pub diagnostics: Vec<Diagnostic>,
    /// Vega-Lite layered chart specification.
    pub chart: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalogue() -> Vec<String> {
        ["New York City", "Los Angeles", "Chicago", "London"]
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn defaults_pick_first_city_and_next_peers() {
        let selections = Selections::defaults(&catalogue(), 2).unwrap();
        assert_eq!(selections.base_city, "New York City");
        assert_eq!(selections.peers, vec!["Los Angeles", "Chicago"]);
        assert_eq!(selections.metric, Metric::AirPollution);
        assert!(selections.synthetic_control);
    }

    #[test]
    fn defaults_require_a_city() {
        assert!(Selections::defaults(&[], 2).is_none());
    }

    #[test]
    fn peer_options_exclude_base() {
        let cities = catalogue();
        let options = Selections::peer_options(&cities, "Chicago");
        assert_eq!(options, vec!["New York City", "Los Angeles", "London"]);
    }

    #[test]
    fn selections_use_camel_case_on_the_wire() {
        let selections = Selections::defaults(&catalogue(), 1).unwrap();
        let json = serde_json::to_value(&selections).unwrap();
        assert_eq!(json["baseCity"], "New York City");
        assert_eq!(json["metric"], "air_pollution");
        assert_eq!(json["syntheticControl"], true);
    }
}
