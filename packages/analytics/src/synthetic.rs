//! Synthetic control: the date-by-date average of the selected peers.

use climate_compass_climate_models::{
    Observation, ObservationTable, Readings, SYNTHETIC_CONTROL,
};

use crate::AnalyticsError;

/// Builds synthetic control rows from the peers already in `table`.
///
/// Each row is the unweighted per-metric mean of the peers' readings on
/// that date. A peer named [`SYNTHETIC_CONTROL`] is ignored so the
/// control never averages itself. Returns no rows when `peers` is empty.
///
/// # Errors
///
/// Returns [`AnalyticsError::MissingCity`] if a peer has no rows.
pub fn build_synthetic_control(
    table: &ObservationTable,
    peers: &[String],
) -> Result<Vec<Observation>, AnalyticsError> {
    let peers: Vec<&str> = peers
        .iter()
        .map(String::as_str)
        .filter(|p| *p != SYNTHETIC_CONTROL)
        .collect();

    if let Some(missing) = peers.iter().find(|p| !table.contains_city(p)) {
        return Err(AnalyticsError::MissingCity {
            city: (*missing).to_string(),
        });
    }

    Ok(table
        .dates()
        .into_iter()
        .filter_map(|date| {
            let readings: Vec<&Readings> = peers
                .iter()
                .filter_map(|p| table.get(p, date))
                .map(|obs| &obs.readings)
                .collect();
            Readings::mean(readings).map(|mean| Observation::new(SYNTHETIC_CONTROL, date, mean))
        })
        .collect())
}

/// Appends the synthetic control to `table` when `enabled` and there is
/// at least one peer. Existing rows are never modified.
///
/// Returns the number of rows appended.
///
/// # Errors
///
/// * [`AnalyticsError::MissingCity`] if a peer has no rows
/// * [`AnalyticsError::Table`] if the table already holds a synthetic control
pub fn append_synthetic_control(
    table: &mut ObservationTable,
    peers: &[String],
    enabled: bool,
) -> Result<usize, AnalyticsError> {
    if !enabled || peers.is_empty() {
        log::debug!("Skipping synthetic control (enabled={enabled}, peers={})", peers.len());
        return Ok(0);
    }

    let rows = build_synthetic_control(table, peers)?;
    let count = rows.len();
    table.extend(rows)?;
    log::debug!("Appended {count} synthetic control rows from {} peers", peers.len());
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use climate_compass_climate_models::Metric;
    use climate_compass_generate::{generate_city_series, monthly_grid};

    fn table_with(cities: &[&str]) -> ObservationTable {
        let dates = monthly_grid(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(), 36).unwrap();
        let mut table = ObservationTable::new();
        for city in cities {
            table.extend(generate_city_series(city, &dates).unwrap()).unwrap();
        }
        table
    }

    fn names(cities: &[&str]) -> Vec<String> {
        cities.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn averages_peers_at_every_date_for_every_metric() {
        let mut table = table_with(&["New York City", "London", "Paris"]);
        let appended =
            append_synthetic_control(&mut table, &names(&["London", "Paris"]), true).unwrap();
        assert_eq!(appended, 36);

        for date in table.dates() {
            let synth = table.get(SYNTHETIC_CONTROL, date).unwrap();
            let london = table.get("London", date).unwrap();
            let paris = table.get("Paris", date).unwrap();
            for metric in Metric::all() {
                let expected = f64::midpoint(london.value(*metric), paris.value(*metric));
                assert!((synth.value(*metric) - expected).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn no_peers_means_no_synthetic_rows() {
        let mut table = table_with(&["New York City"]);
        let before = table.clone();
        assert_eq!(append_synthetic_control(&mut table, &[], true).unwrap(), 0);
        assert!(!table.contains_city(SYNTHETIC_CONTROL));
        assert_eq!(table, before);
    }

    #[test]
    fn disabled_feature_means_no_synthetic_rows() {
        let mut table = table_with(&["New York City", "London"]);
        assert_eq!(
            append_synthetic_control(&mut table, &names(&["London"]), false).unwrap(),
            0
        );
        assert!(!table.contains_city(SYNTHETIC_CONTROL));
    }

    #[test]
    fn leaves_real_city_rows_untouched() {
        let mut table = table_with(&["Berlin", "Madrid"]);
        let berlin_before: Vec<Observation> = table.city_series("Berlin").cloned().collect();
        append_synthetic_control(&mut table, &names(&["Madrid"]), true).unwrap();
        let berlin_after: Vec<Observation> = table.city_series("Berlin").cloned().collect();
        assert_eq!(berlin_before, berlin_after);
    }

    #[test]
    fn never_averages_itself() {
        let mut table = table_with(&["Berlin", "Madrid"]);
        append_synthetic_control(&mut table, &names(&["Madrid"]), true).unwrap();
        let rows =
            build_synthetic_control(&table, &names(&["Madrid", SYNTHETIC_CONTROL])).unwrap();
        for row in rows {
            let madrid = table.get("Madrid", row.date).unwrap();
            assert_eq!(row.readings, madrid.readings);
        }
    }

    #[test]
    fn missing_peer_is_an_error() {
        let table = table_with(&["Berlin"]);
        let err = build_synthetic_control(&table, &names(&["Atlantis"])).unwrap_err();
        assert!(matches!(err, AnalyticsError::MissingCity { city } if city == "Atlantis"));
    }
}
