//! Plain-text rendering of a [`RenderModel`] for terminals.

use std::fmt;

use climate_compass_dashboard_models::RenderModel;

/// Markdown emphasis used by the estimate sentence.
const EMPHASIS: &str = "**";

/// Removes markdown emphasis, which terminals show literally.
#[must_use]
pub fn strip_emphasis(text: &str) -> String {
    text.replace(EMPHASIS, "")
}

/// Terminal rendering of a [`RenderModel`]: selections, both tables, the
/// anomalies, the estimate sentence, and any diagnostics.
pub struct TextReport<'a>(pub &'a RenderModel);

impl TextReport<'_> {
    fn heading(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
        writeln!(f, "\n{title}")?;
        writeln!(f, "{}", "-".repeat(title.chars().count()))
    }
}

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let model = self.0;
        let s = &model.selections;

        writeln!(f, "{}", model.title)?;
        writeln!(f, "{}", model.subtitle)?;

        writeln!(f, "\nBase city:  {}", s.base_city)?;
        if s.peers.is_empty() {
            writeln!(f, "Peers:      (none)")?;
        } else {
            writeln!(f, "Peers:      {}", s.peers.join(", "))?;
        }
        writeln!(f, "Metric:     {}", model.metric_label)?;
        writeln!(
            f,
            "Synthetic:  {}",
            if model.synthetic_control_included {
                "included"
            } else {
                "not included"
            }
        )?;

        let width = model
            .latest
            .iter()
            .map(|l| l.city.chars().count())
            .max()
            .unwrap_or(0)
            .max("city".len());

        Self::heading(f, "Latest Metric Values")?;
        writeln!(f, "{:<width$}  {:>12}", "city", model.metric_label)?;
        for latest in &model.latest {
            writeln!(f, "{:<width$}  {:>12.2}", latest.city, latest.value)?;
        }

        Self::heading(f, "Difference from selected base city (Latest)")?;
        writeln!(f, "{:<width$}  {:>12}", "city", "difference")?;
        for diff in &model.differences {
            writeln!(f, "{:<width$}  {:>12.2}", diff.city, diff.difference)?;
        }

        Self::heading(f, "Anomalies")?;
        if model.anomalies.is_empty() {
            writeln!(f, "(none)")?;
        }
        for anomaly in &model.anomalies {
            writeln!(
                f,
                "{:<width$}  {}  {:>12.2}",
                anomaly.city,
                anomaly.date,
                anomaly.value(s.metric)
            )?;
        }

        Self::heading(f, "Difference-in-Differences Estimate")?;
        writeln!(f, "{}", strip_emphasis(&model.did_summary))?;

        for diagnostic in &model.diagnostics {
            writeln!(f, "\nnote: {diagnostic}")?;
        }

        Ok(())
    }
}

/// Renders the tables and the estimate sentence of `model`.
#[must_use]
pub fn render_text(model: &RenderModel) -> String {
    TextReport(model).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DashboardConfig, compute};
    use chrono::NaiveDate;
    use climate_compass_climate_models::Metric;
    use climate_compass_dashboard_models::Selections;

    fn model(peers: &[&str]) -> RenderModel {
        let config = DashboardConfig::embedded().unwrap();
        let selections = Selections {
            base_city: "New York City".to_string(),
            peers: peers.iter().map(ToString::to_string).collect(),
            metric: Metric::Temperature,
            synthetic_control: true,
        };
        compute(&config, &selections, NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()).unwrap()
    }

    #[test]
    fn report_contains_every_section() {
        let text = render_text(&model(&["London", "Paris"]));
        assert!(text.starts_with("Twin City Climate Compass\n"));
        assert!(text.contains("Latest Metric Values"));
        assert!(text.contains("Difference from selected base city (Latest)"));
        assert!(text.contains("Difference-in-Differences Estimate"));
        assert!(text.contains("Synthetic Control"));
        assert!(text.contains("in New York City for temperature is "));
        assert!(!text.contains("**"));
    }

    #[test]
    fn report_without_peers_says_unavailable() {
        let text = render_text(&model(&[]));
        assert!(text.contains("Peers:      (none)"));
        assert!(text.contains("is unavailable: no peer cities are selected."));
    }

    #[test]
    fn tables_align_on_longest_city() {
        let model = model(&["Los Angeles"]);
        let text = TextReport(&model).to_string();
        assert_eq!(text, render_text(&model));

        let width = "Synthetic Control".len();
        let header = text
            .lines()
            .find(|line| line.starts_with("city") && line.ends_with("difference"))
            .unwrap();
        assert_eq!(header.len(), width + 2 + 12);
        for latest in &model.latest {
            let row = format!("{:<width$}  {:>12.2}", latest.city, latest.value);
            assert!(text.contains(&row), "missing row {row}");
        }
    }

    #[test]
    fn strip_emphasis_removes_markers() {
        assert_eq!(strip_emphasis("**a** b **c**"), "a b c");
    }
}
