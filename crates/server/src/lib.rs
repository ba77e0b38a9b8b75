// crates/server/src/lib.rs
//! optimizer-hub server library.
//!
//! Runs the external cost-optimizer routine in the background and exposes
//! its status, results and live log output over an Axum HTTP API.

pub mod config;
pub mod error;
pub mod jobs;
pub mod log_sink;
pub mod metrics;
pub mod observability;
pub mod result_store;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use error::*;
pub use routes::api_routes;
pub use state::AppState;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the Axum application with all routes and middleware.
///
/// This sets up:
/// - API routes (run control, results, log stream, health, metrics)
/// - CORS allowing any origin, method and header
/// - Request tracing
pub fn create_app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(api_routes(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}


// ============================================================================
// Integration Tests
// ============================================================================
