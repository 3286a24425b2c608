//! Dashboard configuration loaded from TOML.
//!
//! The default configuration in `config/default.toml` is baked into the
//! binary with [`include_str!`]. Alternatives are parsed with
//! [`DashboardConfig::from_toml_str`].

use climate_compass_analytics::AnnotationParams;
use climate_compass_analytics::anomaly::{AnomalyDetector, DEFAULT_SEASONAL_PERIOD, DEFAULT_SIGMA};
use climate_compass_analytics::comparison::DEFAULT_DID_WINDOW;
use climate_compass_analytics::trend::DEFAULT_TREND_WINDOW;
use climate_compass_generate::DEFAULT_PERIODS;
use climate_compass_dashboard_models::Selections;
use serde::{Deserialize, Serialize};

use crate::DashboardError;

/// Embedded default configuration.
const DEFAULT_CONFIG_TOML: &str = include_str!("../config/default.toml");

/// Static settings shared by every dashboard evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DashboardConfig {
    /// Page title.
    pub title: String,
    /// Page subtitle.
    pub subtitle: String,
    /// Selectable cities, in display order.
    pub cities: Vec<String>,
    /// Number of cities after the base city selected as default peers.
    pub default_peer_count: usize,
    /// Monthly periods generated per city.
    #[serde(default = "default_periods")]
    pub periods: usize,
    /// Trailing moving-average window.
    #[serde(default = "default_trend_window")]
    pub trend_window: usize,
    /// Seasonal period for decomposition.
    #[serde(default = "default_seasonal_period")]
    pub seasonal_period: usize,
    /// Residual multiple above which a point is anomalous.
    #[serde(default = "default_anomaly_sigma")]
    pub anomaly_sigma: f64,
    /// Length of the pre and post windows for the DiD estimate.
    #[serde(default = "default_did_window")]
    pub did_window: usize,
}

const fn default_periods() -> usize {
    DEFAULT_PERIODS
}

const fn default_trend_window() -> usize {
    DEFAULT_TREND_WINDOW
}

const fn default_seasonal_period() -> usize {
    DEFAULT_SEASONAL_PERIOD
}

const fn default_anomaly_sigma() -> f64 {
    DEFAULT_SIGMA
}

const fn default_did_window() -> usize {
    DEFAULT_DID_WINDOW
}

impl DashboardConfig {
    /// Parses and validates a TOML configuration.
    ///
    /// # Errors
    ///
    /// * [`DashboardError::ConfigParse`] if the TOML is malformed
    /// * [`DashboardError::InvalidConfig`] if a value is out of range
    pub fn from_toml_str(toml_str: &str) -> Result<Self, DashboardError> {
        let config: Self = toml::de::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every setting is usable.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::InvalidConfig`] describing the first
    /// problem found.
    pub fn validate(&self) -> Result<(), DashboardError> {
        let invalid = |message: String| Err(DashboardError::InvalidConfig { message });

        if self.cities.is_empty() {
            return invalid("at least one city is required".to_string());
        }
        for (i, city) in self.cities.iter().enumerate() {
            if city.trim().is_empty() {
                return invalid(format!("city #{} has an empty name", i + 1));
            }
            if self.cities[..i].contains(city) {
                return invalid(format!("city '{city}' is listed more than once"));
            }
            if city == climate_compass_climate_models::SYNTHETIC_CONTROL {
                return invalid(format!("'{city}' is reserved for the averaged peer series"));
            }
        }
        if self.periods == 0 {
            return invalid("periods must be at least 1".to_string());
        }
        if self.trend_window == 0 {
            return invalid("trend_window must be at least 1".to_string());
        }
        if self.seasonal_period < 2 {
            return invalid("seasonal_period must be at least 2".to_string());
        }
        if self.did_window == 0 {
            return invalid("did_window must be at least 1".to_string());
        }
        if !self.anomaly_sigma.is_finite() || self.anomaly_sigma <= 0.0 {
            return invalid(format!(
                "anomaly_sigma must be a positive number, got {}",
                self.anomaly_sigma
            ));
        }
        Ok(())
    }

    /// Trend and anomaly settings derived from this configuration.
    #[must_use]
    pub const fn annotation_params(&self) -> AnnotationParams {
        AnnotationParams {
            trend_window: self.trend_window,
            detector: AnomalyDetector {
                period: self.seasonal_period,
                sigma: self.anomaly_sigma,
            },
        }
    }

    /// The configuration embedded at compile time.
    ///
    /// # Errors
    ///
    /// Fails only if `config/default.toml` itself is invalid.
    pub fn embedded() -> Result<Self, DashboardError> {
        Self::from_toml_str(DEFAULT_CONFIG_TOML)
    }

    /// Loads `path` if given, otherwise the embedded configuration.
    ///
    /// # Errors
    ///
    /// * [`DashboardError::ConfigRead`] if the file cannot be read
    /// * any error from [`Self::from_toml_str`]
    pub fn load(path: Option<&std::path::Path>) -> Result<Self, DashboardError> {
        let Some(path) = path else {
            return Self::embedded();
        };
        log::info!("Loading dashboard config from {}", path.display());
        let contents =
            std::fs::read_to_string(path).map_err(|source| DashboardError::ConfigRead {
                path: path.display().to_string(),
                source,
            })?;
        Self::from_toml_str(&contents)
    }

    /// Initial widget state for this catalogue.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::InvalidConfig`] if the catalogue is empty.
    pub fn default_selections(&self) -> Result<Selections, DashboardError> {
        Selections::defaults(&self.cities, self.default_peer_count).ok_or_else(|| {
            DashboardError::InvalidConfig {
                message: "at least one city is required".to_string(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use climate_compass_climate_models::DEFAULT_CITIES;

    #[test]
    fn embedded_default_parses() {
        let config = DashboardConfig::embedded().unwrap();
        assert_eq!(config.title, "Twin City Climate Compass");
        assert_eq!(config.cities, DEFAULT_CITIES);
        assert_eq!(config.periods, 36);
        assert_eq!(config.trend_window, 3);
        assert_eq!(config.seasonal_period, 12);
        assert!((config.anomaly_sigma - 2.0).abs() < f64::EPSILON);
        assert_eq!(config.did_window, 12);
    }

    #[test]
    fn default_selections_follow_catalogue() {
        let selections = DashboardConfig::embedded().unwrap().default_selections().unwrap();
        assert_eq!(selections.base_city, "New York City");
        assert_eq!(selections.peers, vec!["Los Angeles", "Chicago"]);
    }

    fn with_override(key: &str, value: &str) -> String {
        DEFAULT_CONFIG_TOML
            .lines()
            .map(|line| {
                if line.starts_with(&format!("{key} =")) {
                    format!("{key} = {value}")
                } else {
                    line.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn rejects_zero_periods() {
        let err = DashboardConfig::from_toml_str(&with_override("periods", "0")).unwrap_err();
        assert!(matches!(err, DashboardError::InvalidConfig { .. }));
    }

    #[test]
    fn rejects_non_positive_sigma() {
        let err =
            DashboardConfig::from_toml_str(&with_override("anomaly_sigma", "0.0")).unwrap_err();
        assert!(matches!(err, DashboardError::InvalidConfig { .. }));
    }

    #[test]
    fn rejects_duplicate_cities() {
        let toml_str = r#"
            title = "t"
            subtitle = "s"
            cities = ["Paris", "Paris"]
            default_peer_count = 1
            periods = 36
            trend_window = 3
            seasonal_period = 12
            anomaly_sigma = 2.0
            did_window = 12
        "#;
        let err = DashboardConfig::from_toml_str(toml_str).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn analysis_settings_fall_back_to_defaults() {
        let toml_str = r#"
            title = "t"
            subtitle = "s"
            cities = ["Paris", "Berlin", "Madrid"]
            default_peer_count = 1
        "#;
        let config = DashboardConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(config.periods, 36);
        assert_eq!(config.trend_window, 3);
        assert_eq!(config.seasonal_period, 12);
        assert!((config.anomaly_sigma - 2.0).abs() < f64::EPSILON);
        assert_eq!(config.did_window, 12);
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = DashboardConfig::from_toml_str("periods = [").unwrap_err();
        assert!(matches!(err, DashboardError::ConfigParse(_)));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err =
            DashboardConfig::load(Some(std::path::Path::new("/nonexistent/compass.toml")))
                .unwrap_err();
        assert!(matches!(err, DashboardError::ConfigRead { .. }));
    }

    #[test]
    fn rejects_unknown_keys() {
        let toml_str = format!("{DEFAULT_CONFIG_TOML}\nrainfall = true\n");
        assert!(DashboardConfig::from_toml_str(&toml_str).is_err());
    }
}
