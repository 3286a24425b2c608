//! HTTP handler functions for the dashboard API.

use actix_web::{HttpResponse, web};
use climate_compass_climate_models::Metric;
use climate_compass_dashboard::{DashboardError, catalogue, compute, resolve_selections};
use climate_compass_dashboard_models::{ApiHealth, DashboardQueryParams, MetricOption};

use crate::AppState;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/cities`
///
/// Returns the city catalogue, metric options, and widget defaults.
pub async fn cities(state: web::Data<AppState>) -> HttpResponse {
    match catalogue(&state.config) {
        Ok(catalogue) => HttpResponse::Ok().json(catalogue),
        Err(e) => error_response("Failed to build catalogue", &e),
    }
}

/// `GET /api/metrics`
pub async fn metrics() -> HttpResponse {
    let metrics: Vec<MetricOption> = Metric::all()
        .iter()
        .copied()
        .map(MetricOption::from)
        .collect();

    HttpResponse::Ok().json(metrics)
}

/// `GET /api/dashboard`
///
/// Evaluates the dashboard for the selections in the query string.
/// Missing parameters fall back to the catalogue defaults.
pub async fn dashboard(
    state: web::Data<AppState>,
    params: web::Query<DashboardQueryParams>,
) -> HttpResponse {
    let selections = match resolve_selections(&state.config, &params) {
        Ok(selections) => selections,
        Err(e) => return error_response("Invalid dashboard selection", &e),
    };

    let today = chrono::Local::now().date_naive();

    match compute(&state.config, &selections, today) {
        Ok(model) => HttpResponse::Ok().json(model),
        Err(e) => error_response("Failed to compute dashboard", &e),
    }
}

/// Maps selection errors to `400` and everything else to `500`.
fn error_response(context: &str, e: &DashboardError) -> HttpResponse {
    match e {
        DashboardError::InvalidSelection { .. } => {
            log::warn!("{context}: {e}");
            HttpResponse::BadRequest().json(serde_json::json!({
                "error": e.to_string()
            }))
        }
        _ => {
            log::error!("{context}: {e}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": context
            }))
        }
    }
}
