//! Database operations for orders.

use rust_decimal::Decimal;
use sqlx::PgPool;

use shopmate_core::{OrderId, ProductId, UserId};

use super::RepositoryError;
use crate::models::Order;

const ORDER_COLUMNS: &str =
    "id, user_id, product_id, quantity, total_amount, status, created_at, updated_at";

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new order in the default "pending" status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the referenced product does
    /// not exist (foreign key violation), `RepositoryError::Database` for
    /// anything else.
    pub async fn create(
        &self,
        user_id: &UserId,
        product_id: ProductId,
        quantity: i32,
        total_amount: Decimal,
    ) -> Result<Order, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            r#"
            INSERT INTO "order" (user_id, product_id, quantity, total_amount)
            VALUES ($1, $2, $3, $4)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(product_id)
        .bind(quantity)
        .bind(total_amount)
        .fetch_one(self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                RepositoryError::Conflict(db.message().to_string())
            }
            _ => RepositoryError::Database(e),
        })?;

        Ok(order)
    }

    /// Unconditionally overwrite an order's status.
    ///
    /// No transition validation: any string is written, and any state is
    /// reachable from any other by external request.
    ///
    /// Returns `true` if a matching order existed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update_status(
        &self,
        order_id: OrderId,
        status: &str,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query::<sqlx::Postgres>(
            r#"
            UPDATE "order"
            SET status = $1,
                updated_at = now()
            WHERE id = $2
            "#,
        )
        .bind(status)
        .bind(order_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Get an order by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, order_id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM "order"
            WHERE id = $1
            "#
        ))
        .bind(order_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(order)
    }
}
