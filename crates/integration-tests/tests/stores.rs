//! Store behavior against a real database.
//!
//! All tests skip cleanly when `TEST_DATABASE_URL` is not set.

use rust_decimal::Decimal;

use shopmate_core::{OrderStatus, ThreadId, UserId};
use shopmate_integration_tests::{product_stock, seed_product, try_pool, unique};
use shopmate_server::db::{
    CatalogRepository, ChatHistoryRepository, OrderRepository, RepositoryError, WalletRepository,
};

// =============================================================================
// Catalog Tests
// =============================================================================

#[tokio::test]
async fn test_find_by_name_matches_case_insensitive_fragment() {
    let Some(pool) = try_pool().await else { return };

    let name = unique("Gaming Laptop");
    let id = seed_product(&pool, &name, Decimal::new(99900, 2), 3).await;

    let catalog = CatalogRepository::new(&pool);
    let fragment = name.to_uppercase();
    let found = catalog
        .find_by_name(&fragment[..20])
        .await
        .expect("query")
        .expect("match");

    assert_eq!(found.id, id);
    assert_eq!(found.stock, 3);
}

#[tokio::test]
async fn test_find_by_name_prefers_lowest_id() {
    let Some(pool) = try_pool().await else { return };

    let base = unique("Duplicate Widget");
    let first = seed_product(&pool, &base, Decimal::new(1000, 2), 1).await;
    let _second = seed_product(&pool, &format!("{base} Pro"), Decimal::new(2000, 2), 1).await;

    let found = CatalogRepository::new(&pool)
        .find_by_name(&base)
        .await
        .expect("query")
        .expect("match");

    assert_eq!(found.id, first);
}

#[tokio::test]
async fn test_find_by_name_treats_like_wildcards_literally() {
    let Some(pool) = try_pool().await else { return };

    let base = unique("scarf");
    let literal = seed_product(&pool, &format!("50%_wool {base}"), Decimal::new(2000, 2), 1).await;
    let _decoy = seed_product(&pool, &format!("50Xwool {base}"), Decimal::new(2000, 2), 1).await;

    let catalog = CatalogRepository::new(&pool);

    let found = catalog
        .find_by_name(&format!("50%_wool {base}"))
        .await
        .expect("query")
        .expect("literal match");
    assert_eq!(found.id, literal);

    // If `_` acted as a single-character wildcard this would hit the decoy.
    let miss = catalog
        .find_by_name(&format!("50_wool {base}"))
        .await
        .expect("query");
    assert!(miss.is_none());
}

#[tokio::test]
async fn test_take_stock_rejects_when_short_and_restores_with_negative() {
    let Some(pool) = try_pool().await else { return };

    let id = seed_product(&pool, &unique("Scarce Item"), Decimal::new(500, 2), 2).await;
    let catalog = CatalogRepository::new(&pool);

    assert!(!catalog.take_stock(id, 3).await.expect("query"));
    assert_eq!(product_stock(&pool, id).await, 2);

    assert!(catalog.take_stock(id, 2).await.expect("query"));
    assert_eq!(product_stock(&pool, id).await, 0);

    // Negative quantity is a restore and succeeds while the row exists.
    assert!(catalog.take_stock(id, -2).await.expect("query"));
    assert_eq!(product_stock(&pool, id).await, 2);
}

// =============================================================================
// Wallet Tests
// =============================================================================

#[tokio::test]
async fn test_upsert_leaves_one_row_and_last_balance_wins() {
    let Some(pool) = try_pool().await else { return };

    let user = UserId::new(unique("u"));
    let wallets = WalletRepository::new(&pool);

    let first = wallets
        .upsert(&user, Decimal::new(10000, 2))
        .await
        .expect("upsert");
    let second = wallets
        .upsert(&user, Decimal::new(2500, 2))
        .await
        .expect("upsert");

    assert_eq!(first.id, second.id);
    assert_eq!(second.balance, Decimal::new(2500, 2));

    let fetched = wallets.get(&user).await.expect("get").expect("wallet");
    assert_eq!(fetched.balance, Decimal::new(2500, 2));
}

#[tokio::test]
async fn test_adjust_never_goes_below_zero() {
    let Some(pool) = try_pool().await else { return };

    let user = UserId::new(unique("u"));
    let wallets = WalletRepository::new(&pool);
    wallets
        .upsert(&user, Decimal::new(5000, 2))
        .await
        .expect("upsert");

    // Overdraft attempt leaves the balance untouched.
    let rejected = wallets
        .adjust(&user, Decimal::new(-5001, 2))
        .await
        .expect("query");
    assert!(rejected.is_none());

    let debited = wallets
        .adjust(&user, Decimal::new(-5000, 2))
        .await
        .expect("query")
        .expect("applied");
    assert_eq!(debited.balance, Decimal::ZERO);
}

#[tokio::test]
async fn test_adjust_missing_wallet_is_none() {
    let Some(pool) = try_pool().await else { return };

    let ghost = UserId::new(unique("ghost"));
    let result = WalletRepository::new(&pool)
        .adjust(&ghost, Decimal::new(100, 2))
        .await
        .expect("query");
    assert!(result.is_none());
}

// =============================================================================
// Order Tests
// =============================================================================

#[tokio::test]
async fn test_order_defaults_to_pending_and_status_is_free_text() {
    let Some(pool) = try_pool().await else { return };

    let product = seed_product(&pool, &unique("Orderable"), Decimal::new(1500, 2), 10).await;
    let user = UserId::new(unique("u"));
    let orders = OrderRepository::new(&pool);

    let order = orders
        .create(&user, product, 2, Decimal::new(3000, 2))
        .await
        .expect("create");
    assert_eq!(order.status, OrderStatus::Pending.as_str());

    // Any string is accepted; no transition validation.
    assert!(orders
        .update_status(order.id, "awaiting-carrier-pigeon")
        .await
        .expect("update"));

    let fetched = orders.get(order.id).await.expect("get").expect("order");
    assert_eq!(fetched.status, "awaiting-carrier-pigeon");
    assert!(fetched.status_kind().is_none());
}

#[tokio::test]
async fn test_order_for_missing_product_is_conflict() {
    let Some(pool) = try_pool().await else { return };

    let user = UserId::new(unique("u"));
    let result = OrderRepository::new(&pool)
        .create(
            &user,
            shopmate_core::ProductId::new(i32::MAX),
            1,
            Decimal::new(100, 2),
        )
        .await;

    assert!(matches!(result, Err(RepositoryError::Conflict(_))));
}

#[tokio::test]
async fn test_update_status_on_missing_order_is_false() {
    let Some(pool) = try_pool().await else { return };

    let updated = OrderRepository::new(&pool)
        .update_status(shopmate_core::OrderId::new(i32::MAX), "paid")
        .await
        .expect("query");
    assert!(!updated);
}

// =============================================================================
// Conversation Log Tests
// =============================================================================

#[tokio::test]
async fn test_history_returns_newest_first_up_to_limit() {
    let Some(pool) = try_pool().await else { return };

    let thread = ThreadId::new(unique("t"));
    let history = ChatHistoryRepository::new(&pool);

    for i in 0..4 {
        history
            .save(&thread, &format!("q{i}"), &format!("a{i}"))
            .await
            .expect("save");
    }

    let recent = history.recent(&thread, 3).await.expect("recent");
    assert_eq!(recent.len(), 3);
    assert_eq!(recent[0].question, "q3");
    assert_eq!(recent[2].question, "q1");
}

#[tokio::test]
async fn test_history_threads_are_isolated() {
    let Some(pool) = try_pool().await else { return };

    let thread_a = ThreadId::new(unique("t"));
    let thread_b = ThreadId::new(unique("t"));
    let history = ChatHistoryRepository::new(&pool);

    history.save(&thread_a, "q", "a").await.expect("save");

    let other = history.recent(&thread_b, 10).await.expect("recent");
    assert!(other.is_empty());
}
