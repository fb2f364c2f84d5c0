//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - `PostgreSQL` connection string
//! - `MODEL_API_KEY` - API key for the language model provider
//!
//! ## Optional
//! - `HOST` - Bind address (default: 127.0.0.1)
//! - `PORT` - Listen port (default: 8000)
//! - `MODEL_ID` - Model identifier (default: claude-sonnet-4-20250514)
//! - `MODEL_BASE_URL` - Messages API endpoint (default: Anthropic's)
//! - `CHAT_HISTORY_LIMIT` - Q/A pairs of dialogue context per request (default: 10)

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_MODEL_ID: &str = "claude-sonnet-4-20250514";
const DEFAULT_MODEL_BASE_URL: &str = "https://api.anthropic.com/v1/messages";
const DEFAULT_HISTORY_LIMIT: i64 = 10;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Language model API configuration
    pub model: ModelConfig,
    /// Number of recent Q/A pairs loaded as dialogue context
    pub history_limit: i64,
}

/// Language model API configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct ModelConfig {
    /// Provider API key
    pub api_key: SecretString,
    /// Model identifier (e.g., claude-sonnet-4-20250514)
    pub model: String,
    /// Messages API endpoint
    pub base_url: String,
}

impl std::fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelConfig")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or a value
    /// fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = SecretString::from(required("DATABASE_URL")?);

        let host = optional("HOST")
            .unwrap_or_else(|| "127.0.0.1".to_string())
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("HOST".to_string(), e.to_string()))?;

        let port = optional("PORT")
            .unwrap_or_else(|| "8000".to_string())
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("PORT".to_string(), e.to_string()))?;

        let model = ModelConfig {
            api_key: SecretString::from(required("MODEL_API_KEY")?),
            model: optional("MODEL_ID").unwrap_or_else(|| DEFAULT_MODEL_ID.to_string()),
            base_url: optional("MODEL_BASE_URL")
                .unwrap_or_else(|| DEFAULT_MODEL_BASE_URL.to_string()),
        };

        let history_limit = match optional("CHAT_HISTORY_LIMIT") {
            Some(raw) => raw.parse::<i64>().map_err(|e| {
                ConfigError::InvalidEnvVar("CHAT_HISTORY_LIMIT".to_string(), e.to_string())
            })?,
            None => DEFAULT_HISTORY_LIMIT,
        };

        Ok(Self {
            database_url,
            host,
            port,
            model,
            history_limit,
        })
    }

    /// Socket address to bind the server to.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Read a required environment variable.
fn required(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}

/// Read an optional environment variable, treating empty values as unset.
fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_config_debug_redacts_key() {
        let config = ModelConfig {
            api_key: SecretString::from("sk-super-secret".to_string()),
            model: DEFAULT_MODEL_ID.to_string(),
            base_url: DEFAULT_MODEL_BASE_URL.to_string(),
        };

        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("sk-super-secret"));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingEnvVar("DATABASE_URL".to_string());
        assert_eq!(
            err.to_string(),
            "Missing environment variable: DATABASE_URL"
        );
    }
}
