//! Order checkout workflow.
//!
//! A linear saga over three stores: verify stock, verify funds, decrement
//! stock, debit wallet, insert the order record. Each step commits
//! independently; later failures are undone with compensating updates
//! (stock restore, wallet credit) rather than a database rollback.
//!
//! Business-rule failures ([`Rejection`]) are values, not errors: they are
//! expected per-request outcomes relayed back to the customer. Storage
//! failures propagate as `Err` and abort the request.

use std::future::Future;

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, instrument, warn};

use shopmate_core::{ProductId, UserId};

use crate::db::{CatalogRepository, OrderRepository, RepositoryError, WalletRepository};
use crate::models::Order;

/// Checkout request, as resolved by the tool adapter layer.
///
/// `total_amount` is caller-supplied and is not recomputed against the
/// catalog price before debiting. Inherited behavior, kept deliberately;
/// see DESIGN.md before hardening this.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    /// User placing the order.
    pub user_id: UserId,
    /// Product being ordered.
    pub product_id: ProductId,
    /// Units ordered (positive).
    pub quantity: i32,
    /// Amount to debit (expected to equal price x quantity).
    pub total_amount: Decimal,
}

/// Outcome of a checkout attempt.
#[derive(Debug)]
pub enum CheckoutOutcome {
    /// Every step succeeded.
    Completed {
        /// The created order (status "pending").
        order: Order,
        /// Wallet balance after the debit.
        balance: Decimal,
    },
    /// A business rule stopped the workflow; all prior effects were undone.
    Rejected(Rejection),
}

/// Business-rule failures, matched exhaustively by callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum Rejection {
    /// Product missing or fewer units in stock than requested.
    InsufficientStock,
    /// The user has no wallet.
    WalletNotFound,
    /// The wallet balance does not cover the total.
    InsufficientBalance {
        /// Balance at the time of the check.
        balance: Decimal,
    },
    /// The conditional stock decrement lost a race with another request.
    StockUpdateFailed,
    /// The conditional wallet debit was rejected.
    PaymentFailed,
    /// The order insert failed after stock and funds had moved.
    OrderCreationFailed,
}

impl Rejection {
    /// Stable machine-readable code for this rejection.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InsufficientStock => "insufficient_stock",
            Self::WalletNotFound => "wallet_not_found",
            Self::InsufficientBalance { .. } => "insufficient_balance",
            Self::StockUpdateFailed => "stock_update_failed",
            Self::PaymentFailed => "payment_failed",
            Self::OrderCreationFailed => "order_creation_failed",
        }
    }

    /// Customer-facing message, relayed verbatim by the agent.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::InsufficientStock => "Product is out of stock".to_string(),
            Self::WalletNotFound => "Wallet not found".to_string(),
            Self::InsufficientBalance { balance } => {
                format!("Insufficient balance. Current balance: {balance:.2}")
            }
            Self::StockUpdateFailed => "Cannot update stock".to_string(),
            Self::PaymentFailed => "Cannot process payment".to_string(),
            Self::OrderCreationFailed => "Cannot create order".to_string(),
        }
    }
}

/// Order insert seam for the final workflow step.
///
/// The production implementation is [`OrderRepository`]; substituting a
/// store that rejects the insert drives the compensation path without a
/// constraint violation in the database.
pub trait OrderStore {
    /// Insert a new order in the default "pending" status.
    fn create(
        &self,
        user_id: &UserId,
        product_id: ProductId,
        quantity: i32,
        total_amount: Decimal,
    ) -> impl Future<Output = Result<Order, RepositoryError>> + Send;
}

impl OrderStore for OrderRepository<'_> {
    fn create(
        &self,
        user_id: &UserId,
        product_id: ProductId,
        quantity: i32,
        total_amount: Decimal,
    ) -> impl Future<Output = Result<Order, RepositoryError>> + Send {
        Self::create(self, user_id, product_id, quantity, total_amount)
    }
}

/// Coordinates the multi-step order workflow.
///
/// Holds no entity state itself; it only sequences calls across the
/// catalog, wallet, and order stores.
pub struct CheckoutService<'a> {
    pool: &'a PgPool,
}

impl<'a> CheckoutService<'a> {
    /// Create a new checkout service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Run the order workflow.
    ///
    /// Steps, in order: stock check, wallet fetch, balance check, atomic
    /// stock decrement, atomic wallet debit, order insert. The first two
    /// mutations are conditional single-statement updates, so losing a race
    /// surfaces as a [`Rejection`] instead of oversold stock or an
    /// overdrawn wallet.
    ///
    /// A failed debit restores the already-decremented stock. A failed
    /// order insert credits the wallet back and restores stock. Those
    /// compensations are best-effort: their own failure is logged and not
    /// retried.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` only for storage failures; business-rule
    /// failures come back as `Ok(CheckoutOutcome::Rejected(_))`.
    pub async fn place_order(
        &self,
        request: &PlaceOrder,
    ) -> Result<CheckoutOutcome, RepositoryError> {
        self.place_order_with(&OrderRepository::new(self.pool), request)
            .await
    }

    /// Run the order workflow against a caller-supplied order store.
    ///
    /// # Errors
    ///
    /// Same contract as [`CheckoutService::place_order`].
    #[instrument(
        skip(self, orders),
        fields(user_id = %request.user_id, product_id = %request.product_id, quantity = request.quantity)
    )]
    pub async fn place_order_with<O: OrderStore>(
        &self,
        orders: &O,
        request: &PlaceOrder,
    ) -> Result<CheckoutOutcome, RepositoryError> {
        let catalog = CatalogRepository::new(self.pool);
        let wallets = WalletRepository::new(self.pool);

        // Step 1: stock check (read-only).
        if !catalog
            .check_stock(request.product_id, request.quantity)
            .await?
        {
            return Ok(CheckoutOutcome::Rejected(Rejection::InsufficientStock));
        }

        // Step 2: wallet fetch (read-only).
        let Some(wallet) = wallets.get(&request.user_id).await? else {
            return Ok(CheckoutOutcome::Rejected(Rejection::WalletNotFound));
        };

        // Step 3: balance check (read-only; the debit re-checks atomically).
        if wallet.balance < request.total_amount {
            return Ok(CheckoutOutcome::Rejected(Rejection::InsufficientBalance {
                balance: wallet.balance,
            }));
        }

        // Step 4: atomic compare-and-decrement. Loses here mean another
        // request took the stock between the check and now.
        if !catalog
            .take_stock(request.product_id, request.quantity)
            .await?
        {
            return Ok(CheckoutOutcome::Rejected(Rejection::StockUpdateFailed));
        }

        // Step 5: atomic guarded debit. On rejection the stock decremented
        // in step 4 is restored before reporting failure.
        let Some(updated_wallet) = wallets.adjust(&request.user_id, -request.total_amount).await?
        else {
            self.restore_stock(&catalog, request).await;
            return Ok(CheckoutOutcome::Rejected(Rejection::PaymentFailed));
        };

        // Step 6: order insert. On failure, undo both earlier mutations.
        let order = match orders
            .create(
                &request.user_id,
                request.product_id,
                request.quantity,
                request.total_amount,
            )
            .await
        {
            Ok(order) => order,
            Err(RepositoryError::Conflict(reason)) => {
                warn!(%reason, "order insert rejected, compensating");
                self.refund(&wallets, request).await;
                self.restore_stock(&catalog, request).await;
                return Ok(CheckoutOutcome::Rejected(Rejection::OrderCreationFailed));
            }
            Err(e) => return Err(e),
        };

        info!(order_id = %order.id, balance = %updated_wallet.balance, "order placed");

        Ok(CheckoutOutcome::Completed {
            order,
            balance: updated_wallet.balance,
        })
    }

    /// Best-effort compensation: put the decremented units back.
    async fn restore_stock(&self, catalog: &CatalogRepository<'_>, request: &PlaceOrder) {
        match catalog.take_stock(request.product_id, -request.quantity).await {
            Ok(true) => {}
            Ok(false) => warn!(
                product_id = %request.product_id,
                "stock restore found no product row"
            ),
            Err(e) => warn!(
                product_id = %request.product_id,
                error = %e,
                "stock restore failed"
            ),
        }
    }

    /// Best-effort compensation: credit the debited amount back.
    async fn refund(&self, wallets: &WalletRepository<'_>, request: &PlaceOrder) {
        match wallets.adjust(&request.user_id, request.total_amount).await {
            Ok(Some(_)) => {}
            Ok(None) => warn!(user_id = %request.user_id, "refund found no wallet row"),
            Err(e) => warn!(user_id = %request.user_id, error = %e, "refund failed"),
        }
    }
}
