//! Tests for the agent-facing public surface.
//!
//! These exercise the tool registry, wire shapes, and rejection contract
//! without a database or network.

use serde_json::json;

use shopmate_core::OrderStatus;
use shopmate_server::agent::shop_tools;
use shopmate_server::agent::types::{ContentBlock, Message, MessageContent};
use shopmate_server::checkout::Rejection;

// =============================================================================
// Tool Registry Tests
// =============================================================================

#[test]
fn test_registry_exposes_three_tools() {
    let tools = shop_tools();
    let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["product_search", "create_order", "update_order_status"]
    );
}

#[test]
fn test_every_tool_schema_is_an_object_with_required_fields() {
    for tool in shop_tools() {
        assert_eq!(
            tool.input_schema.get("type"),
            Some(&json!("object")),
            "tool {} schema must be an object",
            tool.name
        );
        let required = tool.input_schema.get("required").and_then(|r| r.as_array());
        assert!(
            required.is_some_and(|r| !r.is_empty()),
            "tool {} must declare required fields",
            tool.name
        );
    }
}

#[test]
fn test_create_order_schema_requires_all_arguments() {
    let tools = shop_tools();
    let create_order = tools
        .iter()
        .find(|t| t.name == "create_order")
        .expect("create_order tool");

    let required: Vec<&str> = create_order.input_schema["required"]
        .as_array()
        .expect("required array")
        .iter()
        .filter_map(|v| v.as_str())
        .collect();

    for field in ["user_id", "product_id", "quantity", "total_amount"] {
        assert!(required.contains(&field), "{field} must be required");
    }
}

// =============================================================================
// Rejection Contract Tests
// =============================================================================

#[test]
fn test_rejections_serialize_with_stable_error_codes() {
    let cases = [
        (Rejection::InsufficientStock, "insufficient_stock"),
        (Rejection::WalletNotFound, "wallet_not_found"),
        (Rejection::StockUpdateFailed, "stock_update_failed"),
        (Rejection::PaymentFailed, "payment_failed"),
        (Rejection::OrderCreationFailed, "order_creation_failed"),
    ];

    for (rejection, code) in cases {
        let value = serde_json::to_value(&rejection).expect("serialize");
        assert_eq!(value["error"], code);
        assert_eq!(rejection.code(), code);
    }
}

#[test]
fn test_insufficient_balance_carries_the_balance() {
    let rejection = Rejection::InsufficientBalance {
        balance: rust_decimal::Decimal::new(1999, 2),
    };
    let value = serde_json::to_value(&rejection).expect("serialize");
    assert_eq!(value["error"], "insufficient_balance");
    assert_eq!(value["balance"], "19.99");
    assert_eq!(
        rejection.message(),
        "Insufficient balance. Current balance: 19.99"
    );
}

// =============================================================================
// Order Status Tests
// =============================================================================

#[test]
fn test_status_parse_is_lenient() {
    assert_eq!(OrderStatus::parse("paid"), Some(OrderStatus::Paid));
    assert_eq!(OrderStatus::parse("PAID"), Some(OrderStatus::Paid));
    assert_eq!(OrderStatus::parse("  Pending "), Some(OrderStatus::Pending));
    assert_eq!(OrderStatus::parse("shipped-to-mars"), None);
}

#[test]
fn test_status_round_trips_through_as_str() {
    for status in OrderStatus::ALL {
        assert_eq!(OrderStatus::parse(status.as_str()), Some(status));
    }
}

// =============================================================================
// Message Wire Shape Tests
// =============================================================================

#[test]
fn test_plain_message_serializes_as_string_content() {
    let message = Message::user("hello");
    let value = serde_json::to_value(&message).expect("serialize");
    assert_eq!(value, json!({"role": "user", "content": "hello"}));
}

#[test]
fn test_block_message_round_trips() {
    let message = Message {
        role: "assistant".to_string(),
        content: MessageContent::Blocks(vec![
            ContentBlock::Text {
                text: "Looking that up".to_string(),
            },
            ContentBlock::ToolUse {
                id: "toolu_1".to_string(),
                name: "product_search".to_string(),
                input: json!({"product_name": "Widget"}),
            },
        ]),
    };

    let value = serde_json::to_value(&message).expect("serialize");
    let parsed: Message = serde_json::from_value(value).expect("deserialize");

    match parsed.content {
        MessageContent::Blocks(blocks) => assert_eq!(blocks.len(), 2),
        MessageContent::Text(_) => panic!("expected block content"),
    }
}
