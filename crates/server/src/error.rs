//! Unified error handling for the HTTP layer.
//!
//! Every error body is `{"error": <code>, "message": <text>}` so clients
//! handle failures uniformly.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::agent::{ChatError, ModelError};
use crate::db::RepositoryError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Model API operation failed.
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Wire shape for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Stable machine-readable code.
    pub error: String,
    /// Human-readable description.
    pub message: String,
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Model(_) => StatusCode::BAD_GATEWAY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    const fn code(&self) -> &'static str {
        match self {
            Self::Database(_) | Self::Internal(_) => "internal_error",
            Self::Model(_) => "model_unavailable",
            Self::NotFound(_) => "not_found",
            Self::BadRequest(_) => "bad_request",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if matches!(self, Self::Database(_) | Self::Internal(_)) {
            tracing::error!(error = %self, "request error");
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Model(_) => "Model service unavailable".to_string(),
            _ => self.to_string(),
        };

        let body = ErrorBody {
            error: self.code().to_string(),
            message,
        };

        (self.status(), Json(body)).into_response()
    }
}

impl From<ChatError> for AppError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::Database(e) => Self::Database(e),
            ChatError::Model(e) => Self::Model(e),
            ChatError::TooManyToolIterations => {
                Self::Internal("Request processing exceeded limits".to_string())
            }
        }
    }
}
