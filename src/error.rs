//! Error types for the storefront API.
//!
//! Defines a unified error type that maps cleanly to HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Unified error type for store API operations.
#[derive(Debug, Error)]
pub enum StoreApiError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Raised when a base route is asked for the implementation it decorates.
    #[error("The route {0} is the base implementation and decorates nothing")]
    DecorationPattern(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl StoreApiError {
    /// Machine readable code sent to API clients.
    pub fn code(&self) -> &'static str {
        match self {
            StoreApiError::NotFound(_) => "NOT_FOUND",
            StoreApiError::BadRequest(_) => "BAD_REQUEST",
            StoreApiError::Database(_) => "DATABASE_ERROR",
            StoreApiError::Serialization(_) => "SERIALIZATION_ERROR",
            StoreApiError::DecorationPattern(_) => "DECORATION_PATTERN",
            StoreApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// Error response body for API clients.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for StoreApiError {
    fn into_response(self) -> Response {
        let (status, message, details) = match &self {
            StoreApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone(), None),
            StoreApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            StoreApiError::Database(e) => {
                // Log the actual error but don't expose internals
                tracing::error!(error = %e, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                    None,
                )
            }
            StoreApiError::Serialization(e) => (
                StatusCode::BAD_REQUEST,
                "Failed to process request/response".to_string(),
                Some(e.to_string()),
            ),
            StoreApiError::DecorationPattern(route) => {
                tracing::error!(route = %route, "Decoration chain misconfigured");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                    None,
                )
            }
            StoreApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: message,
            code: self.code().to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for store API operations.
pub type StoreApiResult<T> = Result<T, StoreApiError>;
