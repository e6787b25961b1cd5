//! Error types for API Router
//!
//! Every failure is turned into a JSON response at the HTTP boundary.

use axum::{
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::registry::RegistryError;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Provider {0} not supported")]
    UnknownProvider(String),

    #[error("No keys available for provider {0}")]
    NoKeysConfigured(String),

    #[error("Invalid JSON in request body: {0}")]
    MalformedBody(String),

    #[error("Invalid query string: {0}")]
    MalformedQuery(String),

    #[error("Request failed: {0}")]
    UpstreamTransport(String),

    #[error("Unexpected error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// HTTP status and machine-readable code for this error
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::UnknownProvider(_) => (StatusCode::BAD_REQUEST, "UNKNOWN_PROVIDER"),
            AppError::NoKeysConfigured(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "NO_KEYS_CONFIGURED")
            }
            AppError::MalformedBody(_) => (StatusCode::BAD_REQUEST, "INVALID_JSON"),
            AppError::MalformedQuery(_) => (StatusCode::BAD_REQUEST, "INVALID_QUERY"),
            AppError::UpstreamTransport(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "UPSTREAM_TRANSPORT_ERROR")
            }
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    /// Short label used in metrics
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::UnknownProvider(_) => "unknown_provider",
            AppError::NoKeysConfigured(_) => "no_keys",
            AppError::MalformedBody(_) => "malformed_body",
            AppError::MalformedQuery(_) => "malformed_query",
            AppError::UpstreamTransport(_) => "transport",
            AppError::Internal(_) => "internal",
        }
    }
}

impl From<RegistryError> for AppError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::UnknownProvider(name) => AppError::UnknownProvider(name),
            RegistryError::NoKeysConfigured(name) => AppError::NoKeysConfigured(name),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::MalformedQuery(rejection.body_text())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::UpstreamTransport(err.to_string())
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Error details
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
