#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Climate metric, city, and observation table types.
//!
//! This crate defines the shared vocabulary of the dashboard: the four
//! tracked [`Metric`]s, the default city catalogue, a single
//! [`Observation`] row, and the [`ObservationTable`] that keys every row
//! by `(city, date)`.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Label of the virtual city built from the average of the selected peers.
pub const SYNTHETIC_CONTROL: &str = "Synthetic Control";

/// Cities offered by the dashboard when no other catalogue is configured.
pub const DEFAULT_CITIES: &[&str] = &[
    "New York City",
    "Los Angeles",
    "Chicago",
    "London",
    "Paris",
    "Berlin",
    "Madrid",
];

/// One of the four tracked climate and well-being metrics.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Metric {
    /// Air pollution index (random walk with upward drift)
    #[default]
    AirPollution,
    /// Resident well-being index
    WellBeing,
    /// Mean monthly temperature in degrees Celsius
    Temperature,
    /// Climate-related deaths per period
    ClimateDeaths,
}

impl Metric {
    /// Human-readable label used in selectors and chart axes.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::AirPollution => "Air Pollution",
            Self::WellBeing => "Well-Being",
            Self::Temperature => "Temperature (°C)",
            Self::ClimateDeaths => "Climate-Related Deaths",
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::AirPollution,
            Self::WellBeing,
            Self::Temperature,
            Self::ClimateDeaths,
        ]
    }
}

/// The four metric values recorded for one city in one period.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Readings {
    /// Air pollution index.
    pub air_pollution: f64,
    /// Well-being index.
    pub well_being: f64,
    /// Temperature in degrees Celsius.
    pub temperature: f64,
    /// Climate-related deaths (never negative).
    pub climate_deaths: f64,
}

impl Readings {
    /// Returns the value of `metric`.
    #[must_use]
    pub const fn value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::AirPollution => self.air_pollution,
            Metric::WellBeing => self.well_being,
            Metric::Temperature => self.temperature,
            Metric::ClimateDeaths => self.climate_deaths,
        }
    }

    /// Component-wise arithmetic mean. Returns `None` for an empty input.
    #[must_use]
    pub fn mean<'a>(readings: impl IntoIterator<Item = &'a Self>) -> Option<Self> {
        let mut sum = Self::default();
        let mut count = 0_u32;

        for r in readings {
            sum.air_pollution += r.air_pollution;
            sum.well_being += r.well_being;
            sum.temperature += r.temperature;
            sum.climate_deaths += r.climate_deaths;
            count += 1;
        }

        if count == 0 {
            return None;
        }

        let n = f64::from(count);
        Some(Self {
            air_pollution: sum.air_pollution / n,
            well_being: sum.well_being / n,
            temperature: sum.temperature / n,
            climate_deaths: sum.climate_deaths / n,
        })
    }
}

/// A single `(city, date)` row of the dashboard table.
///
/// `trend` and `anomaly` describe whichever metric the owning
/// [`ObservationTable`] was last annotated for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    /// City name (or [`SYNTHETIC_CONTROL`]).
    pub city: String,
    /// Month-end date of the period.
    pub date: NaiveDate,
    /// Metric values for the period.
    #[serde(flatten)]
    pub readings: Readings,
    /// Moving-average trend of the annotated metric.
    pub trend: Option<f64>,
    /// Whether the annotated metric is anomalous at this date.
    pub anomaly: bool,
}

impl Observation {
    /// Creates an unannotated observation.
    #[must_use]
    pub fn new(city: impl Into<String>, date: NaiveDate, readings: Readings) -> Self {
        Self {
            city: city.into(),
            date,
            readings,
            trend: None,
            anomaly: false,
        }
    }

    /// Returns the value of `metric` for this observation.
    #[must_use]
    pub const fn value(&self, metric: Metric) -> f64 {
        self.readings.value(metric)
    }

    /// Returns the `(city, date)` key of this observation.
    #[must_use]
    pub fn key(&self) -> ObservationKey {
        ObservationKey {
            city: self.city.clone(),
            date: self.date,
        }
    }
}

/// Unique key of an [`Observation`] within an [`ObservationTable`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObservationKey {
    /// City name.
    pub city: String,
    /// Month-end date.
    pub date: NaiveDate,
}

impl std::fmt::Display for ObservationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.city, self.date)
    }
}

/// Error returned by keyed [`ObservationTable`] operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    /// A row with the same `(city, date)` already exists.
    Duplicate(ObservationKey),
    /// No row exists for the `(city, date)` key.
    Missing(ObservationKey),
}

impl std::fmt::Display for TableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Duplicate(key) => write!(f, "duplicate observation for {key}"),
            Self::Missing(key) => write!(f, "no observation for {key}"),
        }
    }
}

impl std::error::Error for TableError {}

/// Every observation of one evaluation, keyed by `(city, date)`.
///
/// Cities iterate in insertion order (base city, peers, then the
/// synthetic control); rows within a city iterate in date order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservationTable {
    cities: Vec<String>,
    rows: BTreeMap<ObservationKey, Observation>,
    annotated_for: Option<Metric>,
}

impl ObservationTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a row.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Duplicate`] if the `(city, date)` key is
    /// already present. The table is left unchanged in that case.
    pub fn insert(&mut self, observation: Observation) -> Result<(), TableError> {
        let key = observation.key();
        if self.rows.contains_key(&key) {
            return Err(TableError::Duplicate(key));
        }
        if !self.contains_city(&key.city) {
            self.cities.push(key.city.clone());
        }
        self.rows.insert(key, observation);
        Ok(())
    }

    /// Inserts every row from `observations`.
    ///
    /// # Errors
    ///
    /// Returns the first [`TableError::Duplicate`] encountered. Rows
    /// inserted before the duplicate remain in the table.
    pub fn extend(
        &mut self,
        observations: impl IntoIterator<Item = Observation>,
    ) -> Result<(), TableError> {
        for observation in observations {
            self.insert(observation)?;
        }
        Ok(())
    }

    /// City names in insertion order.
    #[must_use]
    pub fn cities(&self) -> &[String] {
        &self.cities
    }

    /// Whether any row exists for `city`.
    #[must_use]
    pub fn contains_city(&self, city: &str) -> bool {
        self.cities.iter().any(|c| c == city)
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Looks up a single row.
    #[must_use]
    pub fn get(&self, city: &str, date: NaiveDate) -> Option<&Observation> {
        self.rows.get(&ObservationKey {
            city: city.to_string(),
            date,
        })
    }

    /// Rows of `city`, oldest first.
    pub fn city_series<'a>(
        &'a self,
        city: &str,
    ) -> impl Iterator<Item = &'a Observation> + use<'a> {
        let start = ObservationKey {
            city: city.to_string(),
            date: NaiveDate::MIN,
        };
        let end = ObservationKey {
            city: city.to_string(),
            date: NaiveDate::MAX,
        };
        self.rows.range(start..=end).map(|(_, obs)| obs)
    }

    /// Values of `metric` for `city`, oldest first.
    #[must_use]
    pub fn city_values(&self, city: &str, metric: Metric) -> Vec<f64> {
        self.city_series(city).map(|obs| obs.value(metric)).collect()
    }

    /// Distinct dates across all cities, oldest first.
    #[must_use]
    pub fn dates(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self.rows.keys().map(|k| k.date).collect();
        dates.sort_unstable();
        dates.dedup();
        dates
    }

    /// All rows, grouped by city in insertion order.
    pub fn rows(&self) -> impl Iterator<Item = &Observation> {
        self.cities.iter().flat_map(|city| self.city_series(city))
    }

    /// The metric that `trend` and `anomaly` currently describe.
    #[must_use]
    pub const fn annotated_for(&self) -> Option<Metric> {
        self.annotated_for
    }

    /// Clears every `trend` and `anomaly` value and marks the table as
    /// annotated for `metric`.
    ///
    /// Annotations never carry over between metrics, so this must run
    /// before any per-metric write-back.
    pub fn reset_annotations(&mut self, metric: Metric) {
        for obs in self.rows.values_mut() {
            obs.trend = None;
            obs.anomaly = false;
        }
        self.annotated_for = Some(metric);
    }

    /// Writes the trend value for one row.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Missing`] if no such row exists.
    pub fn set_trend(&mut self, city: &str, date: NaiveDate, trend: f64) -> Result<(), TableError> {
        self.row_mut(city, date)?.trend = Some(trend);
        Ok(())
    }

    /// Writes the anomaly flag for one row.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Missing`] if no such row exists.
    pub fn set_anomaly(
        &mut self,
        city: &str,
        date: NaiveDate,
        anomaly: bool,
    ) -> Result<(), TableError> {
        self.row_mut(city, date)?.anomaly = anomaly;
        Ok(())
    }

    fn row_mut(&mut self, city: &str, date: NaiveDate) -> Result<&mut Observation, TableError> {
        let key = ObservationKey {
            city: city.to_string(),
            date,
        };
        match self.rows.get_mut(&key) {
            Some(obs) => Ok(obs),
            None => Err(TableError::Missing(key)),
        }
    }
}
