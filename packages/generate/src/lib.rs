#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Deterministic synthetic climate series for dashboard cities.
//!
//! Every city gets its own `ChaCha8Rng` seeded from [`seed_for`], so the
//! same city name always produces the same series regardless of which
//! other cities are selected or in which order they are generated. There
//! is no process-wide random state.

use chrono::{Datelike as _, Months, NaiveDate};
use climate_compass_climate_models::{Observation, Readings};
use rand::{Rng, SeedableRng as _};
use rand_chacha::ChaCha8Rng;
use rand_distr::Normal;
use thiserror::Error;
use xxhash_rust::xxh32::xxh32;

/// Default number of monthly periods in the dashboard grid.
pub const DEFAULT_PERIODS: usize = 36;

/// Errors that can occur while generating synthetic series.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// The requested grid has no periods.
    #[error("Cannot generate a series over an empty date grid")]
    EmptyGrid,

    /// A grid date fell outside the range `chrono` can represent.
    #[error("Date out of range while building the monthly grid ending {end}")]
    DateOutOfRange {
        /// Requested end of the grid.
        end: NaiveDate,
    },

    /// A normal distribution was built with invalid parameters.
    #[error("Invalid distribution parameters: {0}")]
    Distribution(#[from] rand_distr::NormalError),
}

/// Maps a city name to its generator seed.
///
/// Uses xxHash32 (seed 0) over the UTF-8 bytes, so the result is stable
/// across runs, processes, and platforms, and always fits in 32 bits.
#[must_use]
pub fn seed_for(city: &str) -> u64 {
    u64::from(xxh32(city.as_bytes(), 0))
}

/// Builds `periods` month-end dates, oldest first.
///
/// The last date is the latest month end on or before `end`.
///
/// # Errors
///
/// * [`GenerateError::EmptyGrid`] if `periods` is zero
/// * [`GenerateError::DateOutOfRange`] if the grid leaves `chrono`'s range
pub fn monthly_grid(end: NaiveDate, periods: usize) -> Result<Vec<NaiveDate>, GenerateError> {
    if periods == 0 {
        return Err(GenerateError::EmptyGrid);
    }

    let out_of_range = || GenerateError::DateOutOfRange { end };

    let last = if month_end(end).ok_or_else(out_of_range)? == end {
        end
    } else {
        end.with_day(1).and_then(|d| d.pred_opt()).ok_or_else(out_of_range)?
    };
    let last_first = last.with_day(1).ok_or_else(out_of_range)?;

    (0..periods)
        .rev()
        .map(|back| {
            let back = u32::try_from(back).map_err(|_| out_of_range())?;
            last_first
                .checked_sub_months(Months::new(back))
                .and_then(month_end)
                .ok_or_else(out_of_range)
        })
        .collect()
}

/// Last day of the month containing `date`.
fn month_end(date: NaiveDate) -> Option<NaiveDate> {
    date.with_day(1)?
        .checked_add_months(Months::new(1))?
        .pred_opt()
}

/// Generates the full series for `city` over `dates`.
///
/// Seeds a fresh `ChaCha8Rng` from [`seed_for`] and delegates to
/// [`generate_with_rng`].
///
/// # Errors
///
/// Returns [`GenerateError::EmptyGrid`] if `dates` is empty.
pub fn generate_city_series(
    city: &str,
    dates: &[NaiveDate],
) -> Result<Vec<Observation>, GenerateError> {
    let seed = seed_for(city);
    log::debug!("Generating {} periods for {city} (seed {seed})", dates.len());
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    generate_with_rng(city, dates, &mut rng)
}

/// Generates the series for `city` over `dates` from an explicit RNG.
///
/// Draws each metric as a block of `dates.len()` samples, in the order
/// air pollution, well-being, temperature noise, climate deaths:
///
/// * air pollution: cumulative sum of `Normal(1, 2)` steps, offset by 50
/// * well-being: cumulative sum of `Normal(0.5, 1.5)` steps, offset by 70
/// * temperature: one sine cycle across the grid (mean 15, amplitude 10)
///   plus `Normal(0, 1)` noise
/// * climate deaths: `|Normal(15, 3)|`
///
/// # Errors
///
/// Returns [`GenerateError::EmptyGrid`] if `dates` is empty.
pub fn generate_with_rng<R: Rng>(
    city: &str,
    dates: &[NaiveDate],
    rng: &mut R,
) -> Result<Vec<Observation>, GenerateError> {
    let n = dates.len();
    if n == 0 {
        return Err(GenerateError::EmptyGrid);
    }

    let air_pollution = random_walk(rng, Normal::new(1.0, 2.0)?, 50.0, n);
    let well_being = random_walk(rng, Normal::new(0.5, 1.5)?, 70.0, n);

    let noise: Normal<f64> = Normal::new(0.0, 1.0)?;
    let temperature: Vec<f64> = linspace_cycle(n)
        .into_iter()
        .map(|phase| phase.sin().mul_add(10.0, 15.0) + rng.sample(noise))
        .collect();

    let deaths: Normal<f64> = Normal::new(15.0, 3.0)?;
    let climate_deaths: Vec<f64> = (0..n).map(|_| rng.sample(deaths).abs()).collect();

    Ok(dates
        .iter()
        .enumerate()
        .map(|(i, date)| {
            Observation::new(
                city,
                *date,
                Readings {
                    air_pollution: air_pollution[i],
                    well_being: well_being[i],
                    temperature: temperature[i],
                    climate_deaths: climate_deaths[i],
                },
            )
        })
        .collect())
}

fn random_walk<R: Rng>(rng: &mut R, step: Normal<f64>, offset: f64, n: usize) -> Vec<f64> {
    let mut total = 0.0;
    (0..n)
        .map(|_| {
            total += rng.sample(step);
            total + offset
        })
        .collect()
}

/// `n` evenly spaced phases from 0 to 2π inclusive.
#[allow(clippy::cast_precision_loss)]
fn linspace_cycle(n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![0.0];
    }
    let step = std::f64::consts::TAU / (n - 1) as f64;
    (0..n).map(|i| i as f64 * step).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use climate_compass_climate_models::Metric;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn grid() -> Vec<NaiveDate> {
        monthly_grid(date(2025, 6, 15), DEFAULT_PERIODS).unwrap()
    }

    #[test]
    fn seed_is_stable_and_city_specific() {
        assert_eq!(seed_for("London"), seed_for("London"));
        assert_ne!(seed_for("London"), seed_for("Paris"));
        assert!(seed_for("New York City") <= u64::from(u32::MAX));
    }

    #[test]
    fn grid_ends_at_last_month_end_before_date() {
        let dates = grid();
        assert_eq!(dates.len(), DEFAULT_PERIODS);
        assert_eq!(*dates.last().unwrap(), date(2025, 5, 31));
        assert_eq!(dates[0], date(2022, 6, 30));
    }

    #[test]
    fn grid_keeps_end_when_it_is_a_month_end() {
        let dates = monthly_grid(date(2024, 2, 29), 3).unwrap();
        assert_eq!(
            dates,
            vec![date(2023, 12, 31), date(2024, 1, 31), date(2024, 2, 29)]
        );
    }

    #[test]
    fn grid_rejects_zero_periods() {
        assert!(matches!(
            monthly_grid(date(2025, 1, 1), 0),
            Err(GenerateError::EmptyGrid)
        ));
    }

    #[test]
    fn same_city_yields_identical_series() {
        let dates = grid();
        let first = generate_city_series("Berlin", &dates).unwrap();
        let second = generate_city_series("Berlin", &dates).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn different_cities_diverge() {
        let dates = grid();
        let berlin = generate_city_series("Berlin", &dates).unwrap();
        let madrid = generate_city_series("Madrid", &dates).unwrap();
        assert_ne!(berlin[0].readings, madrid[0].readings);
    }

    #[test]
    fn series_covers_every_grid_date() {
        let dates = grid();
        let series = generate_city_series("Chicago", &dates).unwrap();
        assert_eq!(series.len(), dates.len());
        for (obs, d) in series.iter().zip(&dates) {
            assert_eq!(obs.city, "Chicago");
            assert_eq!(obs.date, *d);
            assert_eq!(obs.trend, None);
            assert!(!obs.anomaly);
        }
    }

    #[test]
    fn climate_deaths_are_never_negative() {
        let dates = monthly_grid(date(2030, 1, 1), 240).unwrap();
        for city in ["Paris", "London", "Los Angeles"] {
            let series = generate_city_series(city, &dates).unwrap();
            assert!(series.iter().all(|o| o.value(Metric::ClimateDeaths) >= 0.0));
        }
    }

    #[test]
    #[allow(clippy::cast_precision_loss)]
    fn climate_deaths_center_on_fifteen() {
        let dates = monthly_grid(date(2030, 1, 1), 600).unwrap();
        let series = generate_city_series("Berlin", &dates).unwrap();
        let mean = series
            .iter()
            .map(|o| o.value(Metric::ClimateDeaths))
            .sum::<f64>()
            / series.len() as f64;
        assert!((mean - 15.0).abs() < 0.6, "mean deaths {mean}");
    }

    #[test]
    fn temperature_follows_one_annual_cycle() {
        let dates = grid();
        let series = generate_city_series("Paris", &dates).unwrap();
        let temps: Vec<f64> = series.iter().map(|o| o.value(Metric::Temperature)).collect();
        // Noise is N(0, 1), so every point stays well within the sine envelope.
        assert!(temps.iter().all(|t| (-5.0..=35.0).contains(t)));
        let first_half: f64 = temps[1..DEFAULT_PERIODS / 2].iter().sum();
        let second_half: f64 = temps[DEFAULT_PERIODS / 2..DEFAULT_PERIODS - 1].iter().sum();
        assert!(first_half > second_half);
    }

    #[test]
    fn rejects_empty_dates() {
        assert!(matches!(
            generate_city_series("Paris", &[]),
            Err(GenerateError::EmptyGrid)
        ));
    }

    #[test]
    fn single_period_series_has_zero_phase() {
        let dates = [date(2024, 1, 31)];
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let series = generate_with_rng("Paris", &dates, &mut rng).unwrap();
        assert_eq!(series.len(), 1);
        assert!((series[0].value(Metric::Temperature) - 15.0).abs() < 6.0);
    }
}
