// crates/server/src/routes/health.rs
//! Health check endpoint for the API.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::state::AppState;

/// Response for the health check endpoint.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    /// Whether an optimizer run still holds the run slot.
    pub run_active: bool,
    /// When the results currently served were published; `null` before the first successful run.
    pub last_published_at: Option<DateTime<Utc>>,
    /// Log lines waiting for a stream consumer.
    pub log_backlog: usize,
    /// Lines the log sink holds before dropping the oldest.
    pub log_capacity: usize,
    /// Lines dropped so far because nobody drained the stream.
    pub log_dropped: u64,
}

/// GET /api/health - Health check endpoint.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.uptime_secs(),
        run_active: state.jobs.is_busy(),
        last_published_at: state.results.published_at(),
        log_backlog: state.logs.len(),
        log_capacity: state.logs.capacity(),
        log_dropped: state.logs.dropped(),
    })
}

/// Create the health routes router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health_check))
}
