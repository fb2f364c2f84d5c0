//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::agent::ModelClient;
use crate::config::AppConfig;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    pool: PgPool,
    model: ModelClient,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: AppConfig, pool: PgPool) -> Self {
        let model = ModelClient::new(&config.model);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                model,
            }),
        }
    }

    /// Get a reference to the application configuration.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the model API client.
    #[must_use]
    pub fn model(&self) -> &ModelClient {
        &self.inner.model
    }
}
