use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::jobs::StartError;
use crate::result_store::StoreError;

/// Structured JSON error response for API errors
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

/// API error types that map to HTTP status codes
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// A result endpoint could not read the store. `label` names the
    /// dataset in the response; the cause is logged, never returned.
    #[error("Error fetching {label}: {source}")]
    Fetch {
        label: &'static str,
        #[source]
        source: StoreError,
    },
}

impl From<StartError> for ApiError {
    fn from(err: StartError) -> Self {
        match err {
            StartError::MissingMode => ApiError::BadRequest(err.to_string()),
            StartError::AlreadyRunning { .. } => ApiError::Conflict(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            ApiError::BadRequest(msg) => {
                tracing::warn!(message = %msg, "Bad request");
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::with_details("Bad request", msg.clone()),
                )
            }
            ApiError::Conflict(msg) => {
                tracing::warn!(message = %msg, "Conflict");
                (
                    StatusCode::CONFLICT,
                    ErrorResponse::with_details("Conflict", msg.clone()),
                )
            }
            ApiError::Fetch { label, source } => {
                tracing::error!("Error fetching {label}: {source}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new(format!("Error fetching {label}")),
                )
            }
        };

        (status, Json(error_response)).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    /// Helper to extract status code and body from a response
    async fn extract_response(response: Response) -> (StatusCode, ErrorResponse) {
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let error_response: ErrorResponse = serde_json::from_slice(&body).unwrap();
        (status, error_response)
    }

    #[tokio::test]
    async fn test_missing_mode_returns_400() {
        let error: ApiError = StartError::MissingMode.into();
        let (status, body) = extract_response(error.into_response()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "Bad request");
        assert_eq!(body.details.as_deref(), Some("mode is required"));
    }

    #[tokio::test]
    async fn test_already_running_returns_409() {
        let error: ApiError = StartError::AlreadyRunning { run_id: 4 }.into();
        let (status, body) = extract_response(error.into_response()).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body.error, "Conflict");
        assert!(body.details.unwrap().contains("run 4"));
    }

    #[tokio::test]
    async fn test_fetch_error_hides_cause() {
        let error = ApiError::Fetch {
            label: "summary metrics",
            source: StoreError::Poisoned,
        };
        let (status, body) = extract_response(error.into_response()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "Error fetching summary metrics");
        assert!(body.details.is_none());
    }

    #[test]
    fn test_error_response_serialization() {
        let response = ErrorResponse::new("Test error");
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"error\":\"Test error\""));
        assert!(!json.contains("details"));

        let response = ErrorResponse::with_details("Test error", "More info");
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"details\":\"More info\""));
    }

    #[test]
    fn test_api_error_display() {
        let err = ApiError::Conflict("run 1 is still in progress".into());
        assert_eq!(err.to_string(), "Conflict: run 1 is still in progress");

        let err = ApiError::Fetch {
            label: "anomalies data",
            source: StoreError::Poisoned,
        };
        assert_eq!(err.to_string(), "Error fetching anomalies data: result store lock poisoned");
    }
}
