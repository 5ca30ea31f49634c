//! API error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use relkg_core::RelkgError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// API error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Error code
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", message)
    }

    pub fn upstream_error() -> Self {
        Self::new("UPSTREAM_ERROR", "Extraction backend failed")
    }

    pub fn internal_error() -> Self {
        Self::new("INTERNAL_ERROR", "Internal server error")
    }
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    /// Tokenizer, generator or resolver failure
    Upstream(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ApiError::bad_request(msg)),
            AppError::Upstream(msg) => {
                tracing::error!(error = %msg, "Upstream failure");
                (
                    StatusCode::BAD_GATEWAY,
                    ApiError::upstream_error().with_details(msg),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError::internal_error().with_details(msg),
                )
            }
        };

        (status, Json(error)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<RelkgError> for AppError {
    fn from(err: RelkgError) -> Self {
        match err {
            RelkgError::InvalidInput(msg) => AppError::BadRequest(msg),
            RelkgError::Tokenizer(msg) => AppError::Upstream(format!("Tokenizer error: {msg}")),
            RelkgError::Generation(msg) => AppError::Upstream(format!("Generation error: {msg}")),
            RelkgError::Resolver(msg) => AppError::Upstream(format!("Resolver error: {msg}")),
            RelkgError::Render(msg) => AppError::Internal(format!("Render error: {msg}")),
            RelkgError::Config(msg) => AppError::Internal(format!("Configuration error: {msg}")),
            RelkgError::Other(err) => AppError::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_mapping() {
        assert!(matches!(
            AppError::from(RelkgError::InvalidInput("bad mode".into())),
            AppError::BadRequest(msg) if msg == "bad mode"
        ));
        assert!(matches!(
            AppError::from(RelkgError::Generation("timeout".into())),
            AppError::Upstream(_)
        ));
        assert!(matches!(
            AppError::from(RelkgError::Config("missing".into())),
            AppError::Internal(_)
        ));
    }

    #[test]
    fn test_status_codes() {
        let response = AppError::Upstream("down".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let response = AppError::BadRequest("nope".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
