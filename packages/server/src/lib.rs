#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the climate comparison dashboard.
//!
//! Serves the REST API that evaluates the dashboard for the requested
//! selections, plus the static single-page frontend that renders the
//! Vega-Lite chart and the comparison tables. The server holds no
//! per-user state; every request recomputes from the shared config.

mod handlers;
pub mod interactive;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{App, HttpServer, middleware, web};
use climate_compass_dashboard::DashboardConfig;
use std::sync::Arc;

/// Directory holding the static frontend.
pub const STATIC_DIR: &str = "app";

/// Shared application state.
pub struct AppState {
    /// Dashboard settings and city catalogue.
    pub config: Arc<DashboardConfig>,
}

/// Registers the `/api` routes.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/cities", web::get().to(handlers::cities))
            .route("/metrics", web::get().to(handlers::metrics))
            .route("/dashboard", web::get().to(handlers::dashboard)),
    );
}

/// Default listen address.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1";

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8080;

/// Where the server listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerOptions {
    pub bind_addr: String,
    pub port: u16,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerOptions {
    /// Reads `BIND_ADDR` and `PORT`, falling back to the defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(std::env::var("BIND_ADDR").ok(), std::env::var("PORT").ok())
    }

    /// Builds options from raw variable values. A port that does not parse
    /// is logged and replaced by [`DEFAULT_PORT`].
    #[must_use]
    pub fn from_vars(bind_addr: Option<String>, port: Option<String>) -> Self {
        let port = match port {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                log::warn!("Ignoring invalid PORT '{raw}', using {DEFAULT_PORT}");
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT,
        };

        Self {
            bind_addr: bind_addr
                .filter(|addr| !addr.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            port,
        }
    }
}

/// Starts the dashboard API server on `options`.
///
/// This is a regular async function; the caller is responsible for
/// providing the async runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind or
/// encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server(
    config: DashboardConfig,
    options: ServerOptions,
) -> std::io::Result<()> {
    log::info!(
        "Serving {} cities, {} monthly periods",
        config.cities.len(),
        config.periods
    );

    let state = web::Data::new(AppState {
        config: Arc::new(config),
    });

    let ServerOptions { bind_addr, port } = options;
    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure_api)
            .service(Files::new("/", STATIC_DIR).index_file("index.html"))
    })
    .bind((bind_addr, port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_default_without_variables() {
        assert_eq!(ServerOptions::from_vars(None, None), ServerOptions::default());
        assert_eq!(ServerOptions::default().port, 8080);
        assert_eq!(ServerOptions::default().bind_addr, "127.0.0.1");
    }

    #[test]
    fn options_read_address_and_port() {
        let options =
            ServerOptions::from_vars(Some("0.0.0.0".to_string()), Some(" 9000 ".to_string()));
        assert_eq!(options.bind_addr, "0.0.0.0");
        assert_eq!(options.port, 9000);
    }

    #[test]
    fn invalid_port_and_blank_address_use_defaults() {
        let options =
            ServerOptions::from_vars(Some("  ".to_string()), Some("eighty".to_string()));
        assert_eq!(options, ServerOptions::default());
        let options = ServerOptions::from_vars(None, Some("70000".to_string()));
        assert_eq!(options.port, DEFAULT_PORT);
    }
}
