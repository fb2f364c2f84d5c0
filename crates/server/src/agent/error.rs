//! Error types for the model API client.

use thiserror::Error;

/// Errors that can occur when talking to the model provider.
#[derive(Debug, Error)]
pub enum ModelError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider returned an error payload.
    #[error("API error ({error_type}): {message}")]
    Api {
        /// Error type from the API.
        error_type: String,
        /// Error message.
        message: String,
    },

    /// Rate limited by the provider.
    #[error("rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Authentication failed.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Failed to parse a response body or stream event.
    #[error("parse error: {0}")]
    Parse(String),

    /// Streaming transport error.
    #[error("stream error: {0}")]
    Stream(String),

    /// The stream closed with a partial event still buffered.
    #[error("stream closed mid-event ({0} bytes unconsumed)")]
    Interrupted(usize),
}

/// Error response body from the Messages API.
#[derive(Debug, serde::Deserialize)]
pub struct ApiErrorResponse {
    /// Outer type field (always "error").
    #[serde(rename = "type")]
    pub error_type: String,
    /// Nested error details.
    pub error: ApiError,
}

/// Nested error details.
#[derive(Debug, serde::Deserialize)]
pub struct ApiError {
    /// Error type.
    #[serde(rename = "type")]
    pub error_type: String,
    /// Error message.
    pub message: String,
}
