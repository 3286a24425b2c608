//! Interactive terminal exploration.
//!
//! Prompts for the same selections the web sidebar offers, evaluates the
//! dashboard, and prints the report until the user is done.

use climate_compass_climate_models::Metric;
use climate_compass_dashboard::report::TextReport;
use climate_compass_dashboard::{DashboardConfig, compute};
use climate_compass_dashboard_models::Selections;
use dialoguer::{Confirm, MultiSelect, Select};

/// Runs the prompt loop.
///
/// # Errors
///
/// Returns an error if a prompt fails or the dashboard cannot be computed.
pub fn run(config: &DashboardConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut selections = config.default_selections()?;

    loop {
        selections = prompt_selections(config, &selections)?;

        let today = chrono::Local::now().date_naive();
        let model = compute(config, &selections, today)?;
        println!();
        print!("{}", TextReport(&model));
        println!();

        if !Confirm::new()
            .with_prompt("Evaluate another selection?")
            .default(true)
            .interact()?
        {
            return Ok(());
        }
    }
}

fn prompt_selections(
    config: &DashboardConfig,
    previous: &Selections,
) -> Result<Selections, dialoguer::Error> {
    println!("Settings");

    let base_idx = Select::new()
        .with_prompt("Select Your City")
        .items(&config.cities)
        .default(
            config
                .cities
                .iter()
                .position(|c| *c == previous.base_city)
                .unwrap_or(0),
        )
        .interact()?;
    let base_city = config.cities[base_idx].clone();

    let options = Selections::peer_options(&config.cities, &base_city);
    let peers = if options.is_empty() {
        println!("No other cities are configured, so there are no peers to select.");
        Vec::new()
    } else {
        let defaults = preselected_peers(config, previous, &base_city, &options);
        MultiSelect::new()
            .with_prompt("Select Peer Cities (Controls)")
            .items(&options)
            .defaults(&defaults)
            .interact()?
            .into_iter()
            .map(|i| options[i].to_string())
            .collect()
    };

    let synthetic_control = Confirm::new()
        .with_prompt("Include Synthetic Control (average of peers)")
        .default(previous.synthetic_control)
        .interact()?;

    let labels: Vec<&str> = Metric::all().iter().map(|m| m.label()).collect();
    let metric_idx = Select::new()
        .with_prompt("Select Metric")
        .items(&labels)
        .default(
            Metric::all()
                .iter()
                .position(|m| *m == previous.metric)
                .unwrap_or(0),
        )
        .interact()?;

    Ok(Selections {
        base_city,
        peers,
        metric: Metric::all()[metric_idx],
        synthetic_control,
    })
}

/// Checked peer boxes: the previous peers while the base city is
/// unchanged, otherwise the first `default_peer_count` options.
fn preselected_peers(
    config: &DashboardConfig,
    previous: &Selections,
    base_city: &str,
    options: &[&str],
) -> Vec<bool> {
    if base_city == previous.base_city {
        options
            .iter()
            .map(|c| previous.peers.iter().any(|p| p == c))
            .collect()
    } else {
        (0..options.len())
            .map(|i| i < config.default_peer_count)
            .collect()
    }
}
