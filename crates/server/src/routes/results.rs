// crates/server/src/routes/results.rs
//! Result endpoints. Each returns one sequence of the latest published
//! bundle as a JSON array (empty before the first successful run).
//!
//! - GET /summary-metrics      - `summary_reports`
//! - GET /execution-data       - `status_log`
//! - GET /impacted-resources   - `impacted_resources`
//! - GET /trend-data           - `trend_data`
//! - GET /anomalies            - `anomalies`

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use optimizer_hub_core::ResultField;
use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

fn read_field(state: &AppState, field: ResultField, label: &'static str) -> ApiResult<Json<Vec<Value>>> {
    let records = state
        .results
        .read(field)
        .map_err(|source| ApiError::Fetch { label, source })?;
    tracing::debug!(field = %field, count = records.len(), "Returning {label}");
    Ok(Json(records))
}

async fn summary_metrics(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Value>>> {
    read_field(&state, ResultField::SummaryReports, "summary metrics")
}

// These two reads are announced at INFO so dashboards see them on the log stream.
async fn execution_data(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Value>>> {
    tracing::info!("Returning Execution Data");
    read_field(&state, ResultField::StatusLog, "execution data")
}

async fn impacted_resources(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Value>>> {
    tracing::info!("Returning Impacted Resources Data");
    read_field(&state, ResultField::ImpactedResources, "impacted resources")
}

async fn trend_data(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Value>>> {
    read_field(&state, ResultField::TrendData, "trend data")
}

async fn anomalies(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Value>>> {
    read_field(&state, ResultField::Anomalies, "anomalies data")
}

/// Build the results router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/summary-metrics", get(summary_metrics))
        .route("/execution-data", get(execution_data))
        .route("/impacted-resources", get(impacted_resources))
        .route("/trend-data", get(trend_data))
        .route("/anomalies", get(anomalies))
}
