//! User wallet model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shopmate_core::UserId;

/// A user's wallet.
///
/// `balance` is never negative: the only funds-movement primitive is the
/// guarded delta update in the wallet repository.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Wallet {
    /// Row ID.
    pub id: i32,
    /// Owning user (unique per wallet).
    pub user_id: UserId,
    /// Current balance (2 fraction digits).
    pub balance: Decimal,
    /// When the wallet was created.
    pub created_at: DateTime<Utc>,
    /// When the wallet was last updated.
    pub updated_at: DateTime<Utc>,
}
