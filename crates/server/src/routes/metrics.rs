//! Prometheus scrape endpoint for the optimizer run and log sink metrics.
//!
//! Served at `GET /metrics`, outside the `/api` prefix, so scrapers can use
//! the conventional path.

use std::sync::Arc;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

use crate::metrics::render_metrics;
use crate::state::AppState;

/// GET /metrics - render `optimizer_runs_started_total`,
/// `optimizer_runs_finished_total{outcome}`, `optimizer_run_duration_seconds`
/// and `optimizer_log_lines_dropped_total` in text exposition format.
///
/// 503 until `init_metrics` has installed the recorder (library embedders
/// that skip it still get a working API).
pub async fn metrics_handler() -> Response {
    match render_metrics() {
        Some(output) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
            output,
        )
            .into_response(),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "Metrics not initialized",
        )
            .into_response(),
    }
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/metrics", get(metrics_handler))
}
