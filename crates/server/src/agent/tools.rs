//! Tool definitions and executor for the shopping agent.
//!
//! Three stateless adapters sit between the model and the stores:
//! product lookup, order creation (through the checkout workflow), and
//! order status updates. Each validates a fixed argument schema before
//! delegating; none of them contains business logic.

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use tracing::{instrument, warn};

use shopmate_core::{OrderId, OrderStatus, ProductId, UserId};

use crate::checkout::{CheckoutOutcome, CheckoutService, PlaceOrder};
use crate::db::{CatalogRepository, OrderRepository, RepositoryError};

use super::types::Tool;

/// Get the tools available to the shopping agent.
#[must_use]
pub fn shop_tools() -> Vec<Tool> {
    vec![
        Tool {
            name: "product_search".to_string(),
            description: "Search for product information by name. Returns the best matching product (id, price, stock, specifications) or null when nothing matches.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "product_name": {
                        "type": "string",
                        "description": "Name (or name fragment) of the product to search for"
                    }
                },
                "required": ["product_name"]
            }),
        },
        Tool {
            name: "create_order".to_string(),
            description: "Create a new order for a product. Checks stock and wallet balance, charges the wallet, and returns either the created order or a typed failure to relay to the customer.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "user_id": {
                        "type": "string",
                        "description": "ID of the user placing the order"
                    },
                    "product_id": {
                        "type": "integer",
                        "description": "ID of the product being ordered (from product_search)"
                    },
                    "quantity": {
                        "type": "integer",
                        "description": "Number of units to order",
                        "minimum": 1
                    },
                    "total_amount": {
                        "type": "string",
                        "description": "Total order amount as a decimal string (price x quantity)"
                    }
                },
                "required": ["user_id", "product_id", "quantity", "total_amount"]
            }),
        },
        Tool {
            name: "update_order_status".to_string(),
            description: format!(
                "Update the status of an order. Known statuses: {}.",
                OrderStatus::ALL.map(OrderStatus::as_str).join(", ")
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "order_id": {
                        "type": "integer",
                        "description": "ID of the order to update"
                    },
                    "status": {
                        "type": "string",
                        "description": "The new status value"
                    }
                },
                "required": ["order_id", "status"]
            }),
        },
    ]
}

/// Errors from tool execution.
///
/// Invalid arguments are reported back to the model in-band (it can retry
/// with corrected input); storage failures abort the whole request.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// The model called an unknown tool.
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// Arguments did not match the tool's schema.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// A store operation failed.
    #[error(transparent)]
    Storage(#[from] RepositoryError),
}

/// Arguments for `product_search`.
#[derive(Debug, Deserialize)]
pub struct ProductSearchArgs {
    /// Name fragment to match.
    pub product_name: String,
}

/// Arguments for `create_order`.
#[derive(Debug, Deserialize)]
pub struct CreateOrderArgs {
    /// User placing the order.
    pub user_id: String,
    /// Product being ordered.
    pub product_id: i32,
    /// Units ordered.
    pub quantity: i32,
    /// Total amount; accepts a JSON number or decimal string.
    #[serde(with = "rust_decimal::serde::str")]
    pub total_amount: Decimal,
}

/// Arguments for `update_order_status`.
#[derive(Debug, Deserialize)]
pub struct UpdateOrderStatusArgs {
    /// Order to update.
    pub order_id: i32,
    /// New status value (free text, unknown values are still written).
    pub status: String,
}

/// Executor for the shopping tools.
pub struct ToolExecutor<'a> {
    pool: &'a PgPool,
}

impl<'a> ToolExecutor<'a> {
    /// Create a new tool executor.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Execute a tool and return its result as a JSON string.
    ///
    /// # Errors
    ///
    /// Returns `ToolError::InvalidArguments`/`UnknownTool` for inputs the
    /// model can correct, `ToolError::Storage` for database failures.
    #[instrument(skip(self, input), fields(tool_name = %name))]
    pub async fn execute(&self, name: &str, input: &serde_json::Value) -> Result<String, ToolError> {
        match name {
            "product_search" => self.product_search(input).await,
            "create_order" => self.create_order(input).await,
            "update_order_status" => self.update_order_status(input).await,
            _ => Err(ToolError::UnknownTool(name.to_string())),
        }
    }

    /// Look up a product by name.
    async fn product_search(&self, input: &serde_json::Value) -> Result<String, ToolError> {
        let args: ProductSearchArgs = parse_args(input)?;

        let product = CatalogRepository::new(self.pool)
            .find_by_name(&args.product_name)
            .await?;

        // Null when nothing matches, mirroring the lookup contract.
        to_json(&product)
    }

    /// Run the checkout workflow.
    async fn create_order(&self, input: &serde_json::Value) -> Result<String, ToolError> {
        let args: CreateOrderArgs = parse_args(input)?;

        if args.quantity < 1 {
            return Err(ToolError::InvalidArguments(
                "quantity must be a positive integer".to_string(),
            ));
        }
        if args.total_amount < Decimal::ZERO {
            return Err(ToolError::InvalidArguments(
                "total_amount must not be negative".to_string(),
            ));
        }

        let request = PlaceOrder {
            user_id: UserId::new(args.user_id),
            product_id: ProductId::new(args.product_id),
            quantity: args.quantity,
            total_amount: args.total_amount,
        };

        let outcome = CheckoutService::new(self.pool).place_order(&request).await?;

        match outcome {
            CheckoutOutcome::Completed { order, balance } => to_json(&json!({
                "success": true,
                "order": order,
                "message": format!(
                    "Order created and payment successful. Remaining balance: {balance:.2}"
                ),
            })),
            CheckoutOutcome::Rejected(rejection) => {
                let mut payload = serde_json::to_value(&rejection)
                    .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;
                payload["message"] = json!(rejection.message());
                to_json(&payload)
            }
        }
    }

    /// Overwrite an order's status.
    async fn update_order_status(&self, input: &serde_json::Value) -> Result<String, ToolError> {
        let args: UpdateOrderStatusArgs = parse_args(input)?;

        // The store accepts any string; unknown values are only logged.
        if OrderStatus::parse(&args.status).is_none() {
            warn!(status = %args.status, "writing unrecognized order status");
        }

        let updated = OrderRepository::new(self.pool)
            .update_status(OrderId::new(args.order_id), &args.status)
            .await?;

        to_json(&json!({ "updated": updated }))
    }
}

/// Deserialize tool arguments, mapping failures to `InvalidArguments`.
fn parse_args<T: serde::de::DeserializeOwned>(input: &serde_json::Value) -> Result<T, ToolError> {
    serde_json::from_value(normalize_numbers(input.clone()))
        .map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

/// Serialize a tool result payload.
fn to_json<T: serde::Serialize>(value: &T) -> Result<String, ToolError> {
    serde_json::to_string(value).map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

/// Coerce JSON numbers in `total_amount` to strings.
///
/// Models send `total_amount` as either `"200.00"` or `200.0`; the decimal
/// field deserializes from strings, so numeric values are stringified
/// before parsing.
fn normalize_numbers(mut input: serde_json::Value) -> serde_json::Value {
    if let Some(obj) = input.as_object_mut()
        && let Some(amount) = obj.get("total_amount")
        && amount.is_number()
    {
        let as_string = amount.to_string();
        obj.insert("total_amount".to_string(), json!(as_string));
    }
    input
}
