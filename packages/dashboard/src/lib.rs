#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Dashboard evaluation: user selections in, render model out.
//!
//! [`compute`] runs the whole pipeline for one set of [`Selections`]:
//! generate the base and peer series over a shared monthly grid, append
//! the synthetic control, annotate trend and anomalies for the selected
//! metric, and compare latest values and the difference-in-differences
//! estimate. Nothing is cached between calls; every evaluation starts
//! from freshly generated data.

pub mod chart;
pub mod config;
pub mod report;

use chrono::NaiveDate;
use climate_compass_analytics::comparison::{
    difference_in_differences, differences_from_base, latest_values,
};
use climate_compass_analytics::synthetic::append_synthetic_control;
use climate_compass_analytics::{AnalyticsError, annotate};
use climate_compass_analytics_models::{Diagnostic, DidEstimate};
use climate_compass_climate_models::{Metric, ObservationTable, SYNTHETIC_CONTROL, TableError};
use climate_compass_dashboard_models::{
    ApiCatalogue, DashboardQueryParams, MetricOption, RenderModel, Selections,
};
use climate_compass_generate::{GenerateError, generate_city_series, monthly_grid};
use thiserror::Error;

pub use crate::config::DashboardConfig;

/// Errors that can occur while evaluating the dashboard.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// The user's selections are not valid for the city catalogue.
    #[error("Invalid selection: {message}")]
    InvalidSelection {
        /// What is wrong with the selection.
        message: String,
    },

    /// A configuration value is out of range.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// What is wrong with the configuration.
        message: String,
    },

    /// The configuration is not valid TOML for [`DashboardConfig`].
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// A configuration file could not be read.
    #[error("Failed to read configuration file {path}: {source}")]
    ConfigRead {
        /// Path that was read.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Series generation failed.
    #[error(transparent)]
    Generate(#[from] GenerateError),

    /// An analytics step failed.
    #[error(transparent)]
    Analytics(#[from] AnalyticsError),

    /// A table insert failed.
    #[error(transparent)]
    Table(#[from] TableError),
}

fn invalid(message: String) -> DashboardError {
    DashboardError::InvalidSelection { message }
}

/// Checks `selections` against the configured city catalogue.
///
/// The base city must be in the catalogue. Peers must be in the
/// catalogue, distinct, and different from the base city.
///
/// # Errors
///
/// Returns [`DashboardError::InvalidSelection`] for the first violation.
pub fn validate_selections(
    config: &DashboardConfig,
    selections: &Selections,
) -> Result<(), DashboardError> {
    let known = |city: &str| config.cities.iter().any(|c| c == city);

    if !known(&selections.base_city) {
        return Err(invalid(format!(
            "unknown base city '{}'",
            selections.base_city
        )));
    }

    for (i, peer) in selections.peers.iter().enumerate() {
        if peer == SYNTHETIC_CONTROL {
            return Err(invalid(format!(
                "'{SYNTHETIC_CONTROL}' is derived from the peers and cannot be selected"
            )));
        }
        if !known(peer) {
            return Err(invalid(format!("unknown peer city '{peer}'")));
        }
        if *peer == selections.base_city {
            return Err(invalid(format!("'{peer}' is the base city and cannot be a peer")));
        }
        if selections.peers[..i].contains(peer) {
            return Err(invalid(format!("peer city '{peer}' is selected twice")));
        }
    }

    Ok(())
}

/// Turns query parameters into validated [`Selections`].
///
/// A missing base city falls back to the first catalogue city. Missing
/// peers fall back to the first `default_peer_count` cities other than
/// the base; an empty `peers` string selects no peers. A missing metric
/// is the default metric and a missing synthetic flag is `true`.
///
/// # Errors
///
/// Returns [`DashboardError::InvalidSelection`] for an unknown metric or
/// any violation reported by [`validate_selections`].
pub fn resolve_selections(
    config: &DashboardConfig,
    params: &DashboardQueryParams,
) -> Result<Selections, DashboardError> {
    let defaults = config.default_selections()?;

    let base_city = params
        .base
        .as_deref()
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .map_or(defaults.base_city, ToString::to_string);

    let peers = params.peers.as_deref().map_or_else(
        || {
            Selections::peer_options(&config.cities, &base_city)
                .into_iter()
                .take(config.default_peer_count)
                .map(ToString::to_string)
                .collect()
        },
        |peers| {
            peers
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(ToString::to_string)
                .collect()
        },
    );

    let metric = match params.metric.as_deref().map(str::trim) {
        None | Some("") => defaults.metric,
        Some(id) => id
            .parse::<Metric>()
            .map_err(|_| invalid(format!("unknown metric '{id}'")))?,
    };

    let selections = Selections {
        base_city,
        peers,
        metric,
        synthetic_control: params.synthetic.unwrap_or(defaults.synthetic_control),
    };
    validate_selections(config, &selections)?;
    Ok(selections)
}

/// The city catalogue, metric options, and widget defaults.
///
/// # Errors
///
/// Returns [`DashboardError::InvalidConfig`] if the catalogue is empty.
pub fn catalogue(config: &DashboardConfig) -> Result<ApiCatalogue, DashboardError> {
    Ok(ApiCatalogue {
        cities: config.cities.clone(),
        metrics: Metric::all().iter().copied().map(MetricOption::from).collect(),
        defaults: config.default_selections()?,
        default_peer_count: config.default_peer_count,
    })
}

/// Evaluates the dashboard for `selections` on a grid ending at `as_of`.
///
/// # Errors
///
/// * [`DashboardError::InvalidSelection`] if the selections are invalid
/// * [`DashboardError::Generate`] if the grid or a series cannot be built
/// * [`DashboardError::Analytics`] if an analytics step fails
pub fn compute(
    config: &DashboardConfig,
    selections: &Selections,
    as_of: NaiveDate,
) -> Result<RenderModel, DashboardError> {
    validate_selections(config, selections)?;

    let metric = selections.metric;
    log::debug!(
        "Computing dashboard: base={} peers={:?} metric={metric} synthetic={}",
        selections.base_city,
        selections.peers,
        selections.synthetic_control
    );

    let dates = monthly_grid(as_of, config.periods)?;

    let mut table = ObservationTable::new();
    for city in std::iter::once(&selections.base_city).chain(&selections.peers) {
        table.extend(generate_city_series(city, &dates)?)?;
    }

    let synthetic_rows =
        append_synthetic_control(&mut table, &selections.peers, selections.synthetic_control)?;

    let mut diagnostics = annotate(&mut table, metric, &config.annotation_params())?;

    let latest = latest_values(&table, metric);
    let differences = differences_from_base(&latest, &selections.base_city)?;

    let did = difference_in_differences(
        &table,
        &selections.base_city,
        &selections.peers,
        metric,
        config.did_window,
    )?;
    if let DidEstimate::Available {
        periods_overlap: true,
        ..
    } = did
    {
        diagnostics.push(Diagnostic::PeriodsOverlap {
            periods: dates.len(),
            window: config.did_window,
        });
    }

    let rows: Vec<_> = table.rows().cloned().collect();
    let anomalies: Vec<_> = rows.iter().filter(|o| o.anomaly).cloned().collect();
    log::debug!(
        "Dashboard computed: {} rows, {} anomalies, did={:?}",
        rows.len(),
        anomalies.len(),
        did.value()
    );

    Ok(RenderModel {
        title: config.title.clone(),
        subtitle: config.subtitle.clone(),
        selections: selections.clone(),
        metric_label: metric.label().to_string(),
        synthetic_control_included: synthetic_rows > 0,
        chart: chart::layered_chart(metric, &rows, &anomalies),
        dates,
        rows,
        anomalies,
        latest,
        differences,
        did_summary: did.summary(),
        did,
        diagnostics,
    })
}
