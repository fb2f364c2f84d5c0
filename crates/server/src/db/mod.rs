//! Database operations for the Shopmate `PostgreSQL` store.
//!
//! ## Tables
//!
//! - `product` - Catalog (name, price, stock, JSONB specifications)
//! - `"order"` - Orders (FK to product, free-text status, default 'pending')
//! - `user_wallet` - Per-user balance (unique user_id)
//! - `message` - Conversation log (question/answer pairs keyed by thread)
//!
//! All queries use the runtime sqlx API (`query_as` with bound parameters)
//! so the crate builds without a live database or offline query cache.
//!
//! # Migrations
//!
//! Migrations live in `crates/server/migrations/` and are embedded via
//! [`MIGRATOR`]; the server applies them on startup.

pub mod catalog;
pub mod history;
pub mod orders;
pub mod wallets;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use catalog::CatalogRepository;
pub use history::ChatHistoryRepository;
pub use orders::OrderRepository;
pub use wallets::WalletRepository;

/// Embedded migrations.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., order referencing a missing product).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
