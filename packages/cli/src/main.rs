#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for the climate comparison dashboard.
//!
//! `serve` starts the web dashboard, `report` evaluates one selection and
//! prints the tables and estimate, and running without a subcommand
//! walks through the same choices the web sidebar offers.

mod explore;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use climate_compass_dashboard::report::TextReport;
use climate_compass_dashboard::{DashboardConfig, compute, resolve_selections};
use climate_compass_dashboard_models::DashboardQueryParams;
use dialoguer::Select;

#[derive(Parser)]
#[command(name = "climate_compass", about = "Twin city climate comparison dashboard")]
struct Cli {
    /// Dashboard config file (TOML). Defaults to the built-in config.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web dashboard server (listens on `BIND_ADDR`/`PORT`)
    Serve,
    /// Evaluate one selection and print the result
    Report {
        /// Base city (defaults to the first configured city)
        #[arg(long)]
        base: Option<String>,

        /// Comma-separated peer cities; pass an empty string for none
        #[arg(long)]
        peers: Option<String>,

        /// Metric id: `air_pollution`, `well_being`, `temperature`, or `climate_deaths`
        #[arg(long)]
        metric: Option<String>,

        /// Leave out the synthetic control
        #[arg(long)]
        no_synthetic: bool,

        /// Last day of the monthly grid (defaults to today)
        #[arg(long)]
        as_of: Option<NaiveDate>,

        /// Print the full render model as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Top-level choices offered when no subcommand is given.
enum Tool {
    Explore,
    Server,
}

impl Tool {
    const ALL: &[Self] = &[Self::Explore, Self::Server];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Explore => "Explore the dashboard in the terminal",
            Self::Server => "Start server",
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    let config = DashboardConfig::load(cli.config.as_deref())?;
    log::debug!("Loaded config with {} cities", config.cities.len());

    match cli.command {
        Some(Commands::Serve) => serve(config)?,
        Some(Commands::Report {
            base,
            peers,
            metric,
            no_synthetic,
            as_of,
            json,
        }) => {
            let params = DashboardQueryParams {
                base,
                peers,
                metric,
                synthetic: Some(!no_synthetic),
            };
            let selections = resolve_selections(&config, &params)?;
            let as_of = as_of.unwrap_or_else(|| chrono::Local::now().date_naive());
            let model = compute(&config, &selections, as_of)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&model)?);
            } else {
                print!("{}", TextReport(&model));
            }
        }
        None => {
            println!("{}", config.title);
            println!();

            let labels: Vec<&str> = Tool::ALL.iter().map(Tool::label).collect();

            let idx = Select::new()
                .with_prompt("What would you like to do?")
                .items(&labels)
                .default(0)
                .interact()?;

            match Tool::ALL[idx] {
                Tool::Explore => explore::run(&config)?,
                Tool::Server => {
                    actix_web::rt::System::new()
                        .block_on(climate_compass_server::interactive::run(config))?;
                }
            }
        }
    }

    Ok(())
}

fn serve(config: DashboardConfig) -> std::io::Result<()> {
    actix_web::rt::System::new().block_on(climate_compass_server::run_server(
        config,
        climate_compass_server::ServerOptions::from_env(),
    ))
}
