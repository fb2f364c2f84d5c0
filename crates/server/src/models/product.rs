//! Catalog product model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shopmate_core::ProductId;

/// A product in the catalog.
///
/// `stock` is never negative: the only mutation path is the conditional
/// compare-and-decrement in the catalog repository.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Product name.
    pub name: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Unit price (2 fraction digits).
    pub price: Decimal,
    /// Units in stock.
    pub stock: i32,
    /// Structured key-value specification attributes.
    pub specifications: Option<serde_json::Value>,
    /// When the product was created.
    pub created_at: DateTime<Utc>,
    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_serialization() {
        let product = Product {
            id: ProductId::new(1),
            name: "Widget".to_string(),
            description: Some("A widget".to_string()),
            price: Decimal::new(10000, 2),
            stock: 5,
            specifications: Some(serde_json::json!({"color": "red"})),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&product).expect("serialize");
        assert_eq!(json["id"], 1);
        assert_eq!(json["name"], "Widget");
        assert_eq!(json["stock"], 5);
        // Decimal serializes as a string, fraction digits intact
        assert_eq!(json["price"], "100.00");
    }
}
