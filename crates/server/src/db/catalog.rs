//! Database operations for the product catalog.

use sqlx::PgPool;
use tracing::debug;

use shopmate_core::ProductId;

use super::RepositoryError;
use crate::models::Product;

const PRODUCT_COLUMNS: &str =
    "id, name, description, price, stock, specifications, created_at, updated_at";

/// Repository for catalog database operations.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Look up a product by a case-insensitive name fragment.
    ///
    /// When several products match, the one with the lowest ID wins so the
    /// result is deterministic for identical inputs.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_name(&self, fragment: &str) -> Result<Option<Product>, RepositoryError> {
        let pattern = contains_pattern(fragment);

        let product = sqlx::query_as::<_, Product>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM product
            WHERE name ILIKE $1
            ORDER BY id
            LIMIT 1
            "
        ))
        .bind(&pattern)
        .fetch_optional(self.pool)
        .await?;

        Ok(product)
    }

    /// Check whether a product exists and has at least `quantity` in stock.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn check_stock(
        &self,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<bool, RepositoryError> {
        let stock: Option<(i32,)> = sqlx::query_as(
            r"
            SELECT stock
            FROM product
            WHERE id = $1
            ",
        )
        .bind(product_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(stock.is_some_and(|(s,)| s >= quantity))
    }

    /// Atomically take `quantity` units out of stock.
    ///
    /// A single conditional update (`stock >= quantity` evaluated by the
    /// database) so concurrent requests cannot oversell. A negative
    /// `quantity` puts units back and succeeds whenever the product exists.
    ///
    /// Returns `true` if the update applied.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn take_stock(
        &self,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query::<sqlx::Postgres>(
            r"
            UPDATE product
            SET stock = stock - $1,
                updated_at = now()
            WHERE id = $2 AND stock >= $1
            ",
        )
        .bind(quantity)
        .bind(product_id)
        .execute(self.pool)
        .await?;

        let applied = result.rows_affected() > 0;
        debug!(product_id = %product_id, quantity, applied, "stock update");
        Ok(applied)
    }
}

/// Build an ILIKE pattern matching the fragment anywhere in the name.
///
/// LIKE metacharacters in the fragment are escaped so a search for
/// `100%_cotton` matches that text literally instead of as wildcards.
fn contains_pattern(fragment: &str) -> String {
    let escaped = fragment
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern_wraps_and_trims() {
        assert_eq!(contains_pattern("  laptop "), "%laptop%");
    }

    #[test]
    fn test_contains_pattern_escapes_like_metacharacters() {
        assert_eq!(contains_pattern("100%_cotton"), "%100\\%\\_cotton%");
        assert_eq!(contains_pattern(r"back\slash"), "%back\\\\slash%");
    }
}
