//! Database integration tests for cutoff modes, order flags and the
//! cancel-request queue.
//!
//! `sqlx::test` creates a fresh database per test from `DATABASE_URL` and
//! applies the admin migrations:
//!
//! ```bash
//! DATABASE_URL=postgres://postgres@localhost/postgres \
//!     cargo test -p trackscore-integration-tests --test persistence -- --ignored
//! ```

#![allow(clippy::unwrap_used)]

use chrono::Utc;
use sqlx::PgPool;
use trackscore_admin::db::{
    CancelRequestRepository, CutoffModeRepository, OrderRepository, RepositoryError,
};
use trackscore_core::OrderId;
use trackscore_core::cutoff::default_modes;
use trackscore_core::engine::Threshold;
use trackscore_integration_tests::order_input;

/// Stores orders `1..` with the given quality scores.
async fn seed_orders(pool: &PgPool, scores: &[Option<f64>]) {
    let orders = OrderRepository::new(pool);
    for (id, score) in (1..).zip(scores) {
        orders.upsert(&order_input(id)).await.unwrap();
        sqlx::query("UPDATE trackscore.orders SET quality_score = $2 WHERE order_id = $1")
            .bind(OrderId::new(id))
            .bind(*score)
            .execute(pool)
            .await
            .unwrap();
    }
}

async fn queued_ids(pool: &PgPool) -> Vec<OrderId> {
    let mut ids: Vec<OrderId> = CancelRequestRepository::new(pool)
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.order_id)
        .collect();
    ids.sort_unstable();
    ids
}

// =============================================================================
// Cutoff modes
// =============================================================================

#[sqlx::test(migrations = "../admin/migrations")]
#[ignore = "Requires a PostgreSQL database (DATABASE_URL)"]
async fn test_activation_leaves_exactly_one_active_mode(pool: PgPool) {
    let modes = CutoffModeRepository::new(&pool);
    modes.seed(&default_modes()).await.unwrap();

    let activation = modes.activate("maximum", Some("balanced")).await.unwrap();
    assert_eq!(activation.mode.mode_id, "maximum");

    let listed = modes.list().await.unwrap();
    let active: Vec<_> = listed.iter().filter(|m| m.is_active).collect();
    assert_eq!(listed.len(), 3);
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].mode.mode_id, "maximum");
    assert_eq!(modes.active().await.unwrap().unwrap().mode_id, "maximum");
}

#[sqlx::test(migrations = "../admin/migrations")]
#[ignore = "Requires a PostgreSQL database (DATABASE_URL)"]
async fn test_stale_expected_mode_is_a_conflict(pool: PgPool) {
    let modes = CutoffModeRepository::new(&pool);
    modes.seed(&default_modes()).await.unwrap();

    let err = modes.activate("aggressive", Some("maximum")).await.unwrap_err();

    assert!(matches!(err, RepositoryError::Conflict(_)));
    assert_eq!(modes.active().await.unwrap().unwrap().mode_id, "balanced");
}

#[sqlx::test(migrations = "../admin/migrations")]
#[ignore = "Requires a PostgreSQL database (DATABASE_URL)"]
async fn test_unknown_mode_is_not_found(pool: PgPool) {
    let modes = CutoffModeRepository::new(&pool);
    modes.seed(&default_modes()).await.unwrap();

    let err = modes.activate("reckless", None).await.unwrap_err();

    assert!(matches!(err, RepositoryError::NotFound));
    assert_eq!(modes.active().await.unwrap().unwrap().mode_id, "balanced");
}

#[sqlx::test(migrations = "../admin/migrations")]
#[ignore = "Requires a PostgreSQL database (DATABASE_URL)"]
async fn test_activation_reflags_orders_and_syncs_queue(pool: PgPool) {
    let modes = CutoffModeRepository::new(&pool);
    modes.seed(&default_modes()).await.unwrap();
    seed_orders(&pool, &[Some(40.0), Some(60.0), Some(80.0), Some(95.0), None]).await;

    // Everything scoring below 85 is flagged and queued
    let strict = modes.activate("aggressive", Some("balanced")).await.unwrap();
    assert_eq!(strict.flags.flagged, 3);
    assert_eq!(strict.flags.queued, 3);
    assert_eq!(
        queued_ids(&pool).await,
        [OrderId::new(1), OrderId::new(2), OrderId::new(3)]
    );

    // Loosening to 50 releases the orders that now ship
    let loose = modes.activate("maximum", Some("aggressive")).await.unwrap();
    assert_eq!(loose.flags.flagged, 1);
    assert_eq!(loose.flags.queued, 0);
    assert_eq!(loose.flags.released, 2);
    assert_eq!(queued_ids(&pool).await, [OrderId::new(1)]);

    let orders = OrderRepository::new(&pool).list(10, 0).await.unwrap();
    let unscored = orders.iter().find(|o| o.order_id == OrderId::new(5)).unwrap();
    assert!(!unscored.is_flagged);
    assert!(unscored.is_shippable);
}

// =============================================================================
// Cancel-request queue
// =============================================================================

#[sqlx::test(migrations = "../admin/migrations")]
#[ignore = "Requires a PostgreSQL database (DATABASE_URL)"]
async fn test_order_cancelled_on_shopify_leaves_queue(pool: PgPool) {
    let orders = OrderRepository::new(&pool);
    seed_orders(&pool, &[Some(20.0), Some(30.0)]).await;
    orders.apply_threshold(Threshold::new(70.0).unwrap()).await.unwrap();
    assert_eq!(queued_ids(&pool).await, [OrderId::new(1), OrderId::new(2)]);

    // orders/cancelled webhook for order 2
    let mut cancelled = order_input(2);
    cancelled.cancelled_at = Some(Utc::now());
    orders.upsert(&cancelled).await.unwrap();

    assert_eq!(queued_ids(&pool).await, [OrderId::new(1)]);
}

#[sqlx::test(migrations = "../admin/migrations")]
#[ignore = "Requires a PostgreSQL database (DATABASE_URL)"]
async fn test_closed_order_is_released_on_reapply(pool: PgPool) {
    let orders = OrderRepository::new(&pool);
    seed_orders(&pool, &[Some(20.0), Some(30.0)]).await;
    orders.apply_threshold(Threshold::new(70.0).unwrap()).await.unwrap();

    sqlx::query("UPDATE trackscore.orders SET closed = TRUE WHERE order_id = $1")
        .bind(OrderId::new(1))
        .execute(&pool)
        .await
        .unwrap();

    let summary = orders.apply_threshold(Threshold::new(70.0).unwrap()).await.unwrap();

    assert_eq!(summary.released, 1);
    assert_eq!(summary.flagged, 1);
    assert_eq!(queued_ids(&pool).await, [OrderId::new(2)]);
}
