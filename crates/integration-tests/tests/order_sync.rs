//! Integration tests for the order sync flow.
//!
//! The sync runs against a scripted order source and an in-memory store.

#![allow(clippy::unwrap_used)]

use serde_json::json;
use trackscore_admin::config::SyncConfig;
use trackscore_admin::services::{OrderSyncError, SyncError, sync_all_orders, sync_order};
use trackscore_admin::shopify::{AdminShopifyError, OrderConnection, OrderWebhookPayload};
use trackscore_core::{FinancialStatus, OrderId, PaymentMethod};
use trackscore_integration_tests::{
    MemoryStore, ScriptedSource, order_node, order_node_without_product, page,
};

const CONFIG: SyncConfig = SyncConfig {
    page_size: 250,
    max_retries: 2,
};

// =============================================================================
// Full sync
// =============================================================================

#[tokio::test]
async fn test_full_page_with_one_malformed_order() {
    let nodes = (1..=250)
        .map(|id| {
            if id == 137 {
                order_node_without_product(id)
            } else {
                order_node(id)
            }
        })
        .collect();
    let source = ScriptedSource::new(vec![Ok(page(nodes, None))]);
    let store = MemoryStore::default();

    let summary = sync_all_orders(&source, &store, CONFIG).await.unwrap();

    assert_eq!(summary.total_orders, 250);
    assert_eq!(summary.success_count, 249);
    assert_eq!(summary.error_count, 1);
    assert_eq!(store.len(), 249);
    assert!(store.get(OrderId::new(137)).is_none());
}

#[tokio::test]
async fn test_pages_follow_cursor() {
    let source = ScriptedSource::new(vec![
        Ok(page(vec![order_node(1), order_node(2)], Some("cursor-1"))),
        Ok(page(vec![order_node(3)], Some("cursor-2"))),
        Ok(page(vec![order_node(4)], None)),
    ]);
    let store = MemoryStore::default();

    let summary = sync_all_orders(&source, &store, CONFIG).await.unwrap();

    assert_eq!(summary.pages, 3);
    assert_eq!(summary.success_count, 4);
    assert_eq!(
        source.cursors(),
        [None, Some("cursor-1".to_string()), Some("cursor-2".to_string())]
    );
}

#[tokio::test]
async fn test_store_failure_is_counted_not_fatal() {
    let source = ScriptedSource::new(vec![Ok(page(
        vec![order_node(1), order_node(2), order_node(3)],
        None,
    ))]);
    let store = MemoryStore::failing_on([OrderId::new(2)]);

    let summary = sync_all_orders(&source, &store, CONFIG).await.unwrap();

    assert_eq!(summary.success_count, 2);
    assert_eq!(summary.error_count, 1);
    assert!(store.get(OrderId::new(3)).is_some());
}

#[tokio::test]
async fn test_rate_limited_page_is_retried() {
    let source = ScriptedSource::new(vec![
        Err(AdminShopifyError::RateLimited(0)),
        Err(AdminShopifyError::RateLimited(0)),
        Ok(page(vec![order_node(1)], None)),
    ]);
    let store = MemoryStore::default();

    let summary = sync_all_orders(&source, &store, CONFIG).await.unwrap();

    assert_eq!(summary.success_count, 1);
    // The retried fetches ask for the same page
    assert_eq!(source.cursors(), [None, None, None]);
}

#[tokio::test]
async fn test_rate_limit_gives_up_after_max_retries() {
    let source = ScriptedSource::new(vec![
        Err(AdminShopifyError::RateLimited(0)),
        Err(AdminShopifyError::RateLimited(0)),
        Err(AdminShopifyError::RateLimited(0)),
    ]);
    let store = MemoryStore::default();

    let err = sync_all_orders(&source, &store, CONFIG).await.unwrap_err();

    assert!(matches!(err, SyncError::RateLimitExhausted { attempts: 3 }));
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_failed_page_aborts_but_keeps_stored_orders() {
    let source = ScriptedSource::new(vec![
        Ok(page(vec![order_node(1)], Some("cursor-1"))),
        Err(AdminShopifyError::Unauthorized("revoked".into())),
    ]);
    let store = MemoryStore::default();

    let err = sync_all_orders(&source, &store, CONFIG).await.unwrap_err();

    assert!(matches!(err, SyncError::Shopify(AdminShopifyError::Unauthorized(_))));
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_next_page_without_cursor_is_an_error() {
    let broken: OrderConnection = serde_json::from_value(json!({
        "pageInfo": { "hasNextPage": true, "endCursor": null },
        "edges": [{ "node": order_node(1) }]
    }))
    .unwrap();
    let source = ScriptedSource::new(vec![Ok(broken)]);
    let store = MemoryStore::default();

    let err = sync_all_orders(&source, &store, CONFIG).await.unwrap_err();

    assert!(matches!(err, SyncError::MissingCursor));
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_resync_is_idempotent() {
    let store = MemoryStore::default();
    for _ in 0..2 {
        let source = ScriptedSource::new(vec![Ok(page(vec![order_node(1), order_node(2)], None))]);
        sync_all_orders(&source, &store, CONFIG).await.unwrap();
    }
    assert_eq!(store.len(), 2);
}

// =============================================================================
// Webhook payloads
// =============================================================================

#[tokio::test]
async fn test_webhook_payload_is_stored() {
    let payload: OrderWebhookPayload = serde_json::from_value(json!({
        "id": 820_982_911_946_154_508_i64,
        "email": "jon@example.com",
        "created_at": "2026-03-01T10:00:00-05:00",
        "financial_status": "paid",
        "payment_gateway_names": ["Cash on Delivery (COD)"],
        "customer": { "id": 115_310_627_314_723_954_i64, "first_name": "Jon", "last_name": "Snow" },
        "line_items": [{ "product_id": 632_910_392 }]
    }))
    .unwrap();
    let store = MemoryStore::default();

    let id = sync_order(&store, payload).await.unwrap();

    let stored = store.get(id).unwrap();
    assert_eq!(id, OrderId::new(820_982_911_946_154_508));
    assert_eq!(stored.name, "Jon Snow Order");
    assert_eq!(stored.payment, FinancialStatus::Paid);
    assert_eq!(stored.payment_method, PaymentMethod::CashOnDelivery);
}

#[tokio::test]
async fn test_webhook_payload_without_line_items_is_rejected() {
    let payload: OrderWebhookPayload = serde_json::from_value(json!({
        "id": 1,
        "line_items": []
    }))
    .unwrap();
    let store = MemoryStore::default();

    let err = sync_order(&store, payload).await.unwrap_err();

    assert!(matches!(err, OrderSyncError::Mapping(_)));
    assert!(store.is_empty());
}
