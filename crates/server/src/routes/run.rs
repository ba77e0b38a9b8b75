// crates/server/src/routes/run.rs
//! Run control routes.
//!
//! - POST /run    - Start an optimizer run (202, or 400 / 409)
//! - GET  /status - Current run status
//! - POST /cancel - Abort the active run

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::jobs::{RunId, RunRequest};
use crate::state::AppState;

/// Response for GET /api/status.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct StatusResponse {
    /// `Idle`, `Running`, `Completed`, `Timeout` or `Error: <message>`.
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<RunId>,
}

/// Response for POST /api/cancel.
#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub status: String,
}

/// POST /api/run - Accept a run and return immediately.
async fn start_run(
    State(state): State<Arc<AppState>>,
    body: Result<Json<RunRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let accepted = state.jobs.start(request)?;
    Ok((StatusCode::ACCEPTED, Json(accepted)))
}

/// GET /api/status - Snapshot of the current status.
async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let snap = state.jobs.snapshot();
    Json(StatusResponse {
        status: snap.status.to_string(),
        run_id: snap.run_id,
    })
}

/// POST /api/cancel - Trip the active run's cancellation token.
async fn cancel_run(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    if !state.jobs.cancel() {
        return Err(ApiError::Conflict("No optimizer run in progress".to_string()));
    }
    Ok((
        StatusCode::ACCEPTED,
        Json(CancelResponse {
            status: "Cancellation requested".to_string(),
        }),
    ))
}

/// Build the run-control router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/run", post(start_run))
        .route("/status", get(get_status))
        .route("/cancel", post(cancel_run))
}
