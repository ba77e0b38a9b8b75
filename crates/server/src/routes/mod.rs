//! API route handlers for the optimizer-hub server.

pub mod health;
pub mod log_stream;
pub mod metrics;
pub mod results;
pub mod run;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// Create the combined router.
///
/// Routes:
/// - POST /api/run                - Start an optimizer run
/// - GET  /api/status             - Current run status
/// - POST /api/cancel             - Cancel the active run
/// - GET  /api/summary-metrics    - Latest summary reports
/// - GET  /api/execution-data     - Latest status log
/// - GET  /api/impacted-resources - Latest impacted resources
/// - GET  /api/trend-data         - Latest trend data
/// - GET  /api/anomalies          - Latest anomalies
/// - GET  /api/log-stream         - SSE stream of log lines
/// - GET  /api/health             - Health check
/// - GET  /metrics                - Prometheus metrics
pub fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", health::router())
        .nest("/api", run::router())
        .nest("/api", results::router())
        .nest("/api", log_stream::router())
        .merge(metrics::router())
        .with_state(state)
}
