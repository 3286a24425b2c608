#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Standalone binary for the dashboard API server.
//!
//! Uses the embedded default configuration and listens on `BIND_ADDR` /
//! `PORT`; see the `climate_compass` CLI for loading an alternative config
//! file.

use climate_compass_dashboard::DashboardConfig;
use climate_compass_server::ServerOptions;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = DashboardConfig::embedded().map_err(std::io::Error::other)?;

    climate_compass_server::run_server(config, ServerOptions::from_env()).await
}
