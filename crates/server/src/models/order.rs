//! Order model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shopmate_core::{OrderId, OrderStatus, ProductId, UserId};

/// A customer order.
///
/// Created exactly once by the checkout workflow after stock and wallet
/// mutations succeed. `status` is stored as free text: the store accepts
/// any value and enforces no transition table, so the raw string is kept
/// alongside a lenient [`Order::status_kind`] accessor.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    /// Unique order ID.
    pub id: OrderId,
    /// User who placed the order.
    pub user_id: UserId,
    /// Ordered product.
    pub product_id: ProductId,
    /// Ordered quantity.
    pub quantity: i32,
    /// Total amount charged (2 fraction digits).
    pub total_amount: Decimal,
    /// Current status (free text, defaults to "pending").
    pub status: String,
    /// When the order was created.
    pub created_at: DateTime<Utc>,
    /// When the order was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// The status as a known [`OrderStatus`], if it is one of the
    /// documented values.
    #[must_use]
    pub fn status_kind(&self) -> Option<OrderStatus> {
        OrderStatus::parse(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_order(status: &str) -> Order {
        Order {
            id: OrderId::new(7),
            user_id: UserId::new("u1"),
            product_id: ProductId::new(1),
            quantity: 2,
            total_amount: Decimal::new(20000, 2),
            status: status.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_status_kind_known() {
        assert_eq!(sample_order("pending").status_kind(), Some(OrderStatus::Pending));
        assert_eq!(sample_order("PAID").status_kind(), Some(OrderStatus::Paid));
    }

    #[test]
    fn test_status_kind_unknown_is_preserved() {
        let order = sample_order("backordered");
        assert_eq!(order.status_kind(), None);
        assert_eq!(order.status, "backordered");
    }

    #[test]
    fn test_order_serialization() {
        let json = serde_json::to_value(sample_order("pending")).expect("serialize");
        assert_eq!(json["id"], 7);
        assert_eq!(json["user_id"], "u1");
        assert_eq!(json["total_amount"], "200.00");
        assert_eq!(json["status"], "pending");
    }
}
