//! Error types for the buy-watch operator

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error (fatal at startup)
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Timeout, connection failure or non-success HTTP status
    #[error("Network error: {0}")]
    Network(String),

    /// Missing fields or ill-typed values in an upstream response
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Alert could not be delivered
    #[error("Delivery failed: {0}")]
    Delivery(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response structure for API
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status_code, reason) = match &self {
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "configuration_error"),
            AppError::Network(_) => (StatusCode::BAD_GATEWAY, "upstream_unreachable"),
            AppError::MalformedResponse(_) => (StatusCode::BAD_GATEWAY, "upstream_malformed"),
            AppError::Delivery(_) => (StatusCode::BAD_GATEWAY, "delivery_failed"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let error_response = ErrorResponse {
            status: "error",
            reason: reason.to_string(),
            details: Some(self.to_string()),
        };

        tracing::error!(
            error_type = %self,
            status_code = %status_code,
            "Request error"
        );

        (status_code, Json(json!(error_response))).into_response()
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
