//! Vega-Lite chart specification for the dashboard's main chart.
//!
//! Three layers share one x/color encoding: the metric line per city, a
//! dashed trailing-trend line, and red circles at anomalous points. The
//! line and trend layers read the full table; the anomaly layer carries
//! its own data so browsers do not have to filter.

use climate_compass_climate_models::{Metric, Observation};
use serde_json::{Value, json};

const VEGA_LITE_SCHEMA: &str = "https://vega.github.io/schema/vega-lite/v5.json";

/// Stroke pattern of the trend layer.
const TREND_DASH: [u32; 2] = [5, 5];

/// Area of an anomaly marker in square pixels.
const ANOMALY_SIZE: u32 = 100;

const ANOMALY_COLOR: &str = "red";

/// JSON field holding `metric` in a serialized [`Observation`].
#[must_use]
pub const fn metric_field(metric: Metric) -> &'static str {
    match metric {
        Metric::AirPollution => "airPollution",
        Metric::WellBeing => "wellBeing",
        Metric::Temperature => "temperature",
        Metric::ClimateDeaths => "climateDeaths",
    }
}

/// Y axis title: the metric id with underscores as spaces, title-cased.
#[must_use]
pub fn axis_title(metric: Metric) -> String {
    metric
        .as_ref()
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Builds the layered, pan/zoomable chart for `rows` and `anomalies`.
#[must_use]
pub fn layered_chart(metric: Metric, rows: &[Observation], anomalies: &[Observation]) -> Value {
    let field = metric_field(metric);
    let x = json!({ "field": "date", "type": "temporal", "title": "Date" });
    let color = json!({ "field": "city", "type": "nominal", "title": "City" });

    json!({
        "$schema": VEGA_LITE_SCHEMA,
        "width": "container",
        "height": 400,
        "data": { "values": rows },
        "layer": [
            {
                "mark": { "type": "line" },
                "params": [{
                    "name": "grid",
                    "select": "interval",
                    "bind": "scales",
                }],
                "encoding": {
                    "x": x,
                    "y": { "field": field, "type": "quantitative", "title": axis_title(metric) },
                    "color": color,
                },
            },
            {
                "mark": { "type": "line", "strokeDash": TREND_DASH },
                "encoding": {
                    "x": x,
                    "y": { "field": "trend", "type": "quantitative", "title": "Trend" },
                    "color": color,
                },
            },
            {
                "data": { "values": anomalies },
                "mark": { "type": "circle", "size": ANOMALY_SIZE, "color": ANOMALY_COLOR },
                "encoding": {
                    "x": x,
                    "y": { "field": field, "type": "quantitative" },
                    "tooltip": [
                        { "field": "city", "type": "nominal" },
                        { "field": "date", "type": "temporal" },
                        { "field": field, "type": "quantitative", "title": metric.label() },
                    ],
                },
            },
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use climate_compass_climate_models::Readings;

    fn observation(anomaly: bool) -> Observation {
        let mut obs = Observation::new(
            "Paris",
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            Readings {
                air_pollution: 1.0,
                well_being: 2.0,
                temperature: 3.0,
                climate_deaths: 4.0,
            },
        );
        obs.trend = Some(3.0);
        obs.anomaly = anomaly;
        obs
    }

    #[test]
    fn metric_fields_match_serialized_observation() {
        let json = serde_json::to_value(observation(false)).unwrap();
        for metric in Metric::all() {
            let value = json[metric_field(*metric)].as_f64().unwrap();
            assert!((value - observation(false).value(*metric)).abs() < f64::EPSILON);
        }
        assert!(json.get("trend").is_some());
    }

    #[test]
    fn axis_titles_are_title_cased_ids() {
        assert_eq!(axis_title(Metric::AirPollution), "Air Pollution");
        assert_eq!(axis_title(Metric::WellBeing), "Well Being");
        assert_eq!(axis_title(Metric::Temperature), "Temperature");
        assert_eq!(axis_title(Metric::ClimateDeaths), "Climate Deaths");
    }

    #[test]
    fn chart_has_line_trend_and_anomaly_layers() {
        let rows = vec![observation(false), observation(true)];
        let anomalies = vec![observation(true)];
        let chart = layered_chart(Metric::Temperature, &rows, &anomalies);

        let layers = chart["layer"].as_array().unwrap();
        assert_eq!(layers.len(), 3);
        assert_eq!(chart["data"]["values"].as_array().unwrap().len(), 2);

        assert_eq!(layers[0]["encoding"]["y"]["field"], "temperature");
        assert_eq!(layers[0]["params"][0]["bind"], "scales");

        assert_eq!(layers[1]["mark"]["strokeDash"], json!([5, 5]));
        assert_eq!(layers[1]["encoding"]["y"]["field"], "trend");

        assert_eq!(layers[2]["mark"]["type"], "circle");
        assert_eq!(layers[2]["mark"]["color"], "red");
        assert_eq!(layers[2]["mark"]["size"], 100);
        assert_eq!(layers[2]["data"]["values"].as_array().unwrap().len(), 1);
        assert_eq!(layers[2]["encoding"]["tooltip"].as_array().unwrap().len(), 3);
    }
}
