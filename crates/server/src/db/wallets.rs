//! Database operations for user wallets.
//!
//! The balance guard lives in SQL: every mutation is a single conditional
//! statement, so a wallet can never be observed below zero regardless of
//! request interleaving.

use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::debug;

use shopmate_core::UserId;

use super::RepositoryError;
use crate::models::Wallet;

const WALLET_COLUMNS: &str = "id, user_id, balance, created_at, updated_at";

/// Repository for wallet database operations.
pub struct WalletRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WalletRepository<'a> {
    /// Create a new wallet repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user's wallet, or `None` if they have none.
    ///
    /// Never creates a wallet implicitly.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, user_id: &UserId) -> Result<Option<Wallet>, RepositoryError> {
        let wallet = sqlx::query_as::<_, Wallet>(&format!(
            r"
            SELECT {WALLET_COLUMNS}
            FROM user_wallet
            WHERE user_id = $1
            "
        ))
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(wallet)
    }

    /// Create a wallet for a user, or reset the balance if one exists.
    ///
    /// Upsert semantics: a second call with the same user overwrites the
    /// balance and leaves exactly one row. Conflating creation with reset is
    /// inherited behavior; callers wanting a pure "create" must check
    /// [`WalletRepository::get`] first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(
        &self,
        user_id: &UserId,
        balance: Decimal,
    ) -> Result<Wallet, RepositoryError> {
        let wallet = sqlx::query_as::<_, Wallet>(&format!(
            r"
            INSERT INTO user_wallet (user_id, balance)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE
            SET balance = EXCLUDED.balance,
                updated_at = now()
            RETURNING {WALLET_COLUMNS}
            "
        ))
        .bind(user_id)
        .bind(balance)
        .fetch_one(self.pool)
        .await?;

        Ok(wallet)
    }

    /// Atomically apply a signed balance delta.
    ///
    /// The update only applies when the resulting balance stays >= 0,
    /// evaluated by the database in one statement. Debits pass a negative
    /// delta; credits (including saga compensation) pass a positive one.
    ///
    /// Returns the updated wallet, or `None` when the guard rejects the
    /// change or the wallet does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn adjust(
        &self,
        user_id: &UserId,
        delta: Decimal,
    ) -> Result<Option<Wallet>, RepositoryError> {
        let wallet = sqlx::query_as::<_, Wallet>(&format!(
            r"
            UPDATE user_wallet
            SET balance = balance + $1,
                updated_at = now()
            WHERE user_id = $2 AND balance + $1 >= 0
            RETURNING {WALLET_COLUMNS}
            "
        ))
        .bind(delta)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        debug!(user_id = %user_id, %delta, applied = wallet.is_some(), "balance adjustment");
        Ok(wallet)
    }
}
