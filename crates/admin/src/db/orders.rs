//! Order and customer persistence.

use serde::Serialize;
use sqlx::{PgConnection, PgPool};
use tracing::instrument;
use trackscore_core::OrderId;
use trackscore_core::engine::Threshold;

use super::RepositoryError;
use crate::models::{CustomerInput, Order, OrderInput};

/// Outcome of re-deriving order flags at a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FlagSummary {
    /// Orders now flagged.
    pub flagged: u64,
    /// Cancel requests created for newly flagged orders.
    pub queued: u64,
    /// Cancel requests dropped because their order is no longer flagged.
    pub released: u64,
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert or update an order, upserting its customer first.
    ///
    /// Both writes share one transaction. An order that arrives cancelled or
    /// closed also leaves the cancel-request queue.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, order), fields(order_id = %order.order_id))]
    pub async fn upsert(&self, order: &OrderInput) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if let Some(customer) = &order.customer {
            upsert_customer(&mut tx, customer).await?;
        }

        sqlx::query(
            r"
            INSERT INTO trackscore.orders (
                order_id, order_date, customer_id, product_id, name, email, phone,
                address, payment, payment_method, risk_verification, shipment_status,
                tags, tier, otp, ivr, cancelled_at, closed
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            ON CONFLICT (order_id) DO UPDATE SET
                order_date = EXCLUDED.order_date,
                customer_id = EXCLUDED.customer_id,
                product_id = EXCLUDED.product_id,
                name = EXCLUDED.name,
                email = EXCLUDED.email,
                phone = EXCLUDED.phone,
                address = EXCLUDED.address,
                payment = EXCLUDED.payment,
                payment_method = EXCLUDED.payment_method,
                risk_verification = EXCLUDED.risk_verification,
                shipment_status = EXCLUDED.shipment_status,
                tags = EXCLUDED.tags,
                cancelled_at = EXCLUDED.cancelled_at,
                closed = EXCLUDED.closed,
                updated_at = NOW()
            ",
        )
        .bind(order.order_id)
        .bind(order.order_date)
        .bind(order.customer.as_ref().map(|c| c.id))
        .bind(order.product_id)
        .bind(&order.name)
        .bind(&order.email)
        .bind(&order.phone)
        .bind(&order.address)
        .bind(order.payment)
        .bind(order.payment_method)
        .bind(order.risk_verification)
        .bind(order.shipment_status)
        .bind(&order.tags)
        .bind(&order.tier)
        .bind(&order.otp)
        .bind(&order.ivr)
        .bind(order.cancelled_at)
        .bind(order.closed)
        .execute(&mut *tx)
        .await?;

        if order.cancelled_at.is_some() || order.closed {
            release_finished_in(&mut tx, Some(order.order_id)).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// List orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(
            r"
            SELECT order_id, order_date, customer_id, product_id, name, email, phone,
                   address, payment, payment_method, risk_verification, shipment_status,
                   tags, tier, otp, ivr, quality_score, is_flagged, is_shippable,
                   cancelled_at, closed
            FROM trackscore.orders
            ORDER BY order_date DESC
            LIMIT $1 OFFSET $2
            ",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        Ok(orders)
    }

    /// Total number of stored orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM trackscore.orders")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Re-derive `is_flagged`/`is_shippable` at `threshold` and sync the
    /// cancel-request queue with the result.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn apply_threshold(&self, threshold: Threshold) -> Result<FlagSummary, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let summary = apply_threshold_in(&mut tx, threshold).await?;
        tx.commit().await?;
        Ok(summary)
    }
}

async fn upsert_customer(
    conn: &mut PgConnection,
    customer: &CustomerInput,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO trackscore.customers (id, first_name, last_name, email, phone, state, tags)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (id) DO UPDATE SET
            first_name = EXCLUDED.first_name,
            last_name = EXCLUDED.last_name,
            email = EXCLUDED.email,
            phone = EXCLUDED.phone,
            state = EXCLUDED.state,
            tags = EXCLUDED.tags,
            updated_at = NOW()
        ",
    )
    .bind(customer.id)
    .bind(&customer.first_name)
    .bind(&customer.last_name)
    .bind(&customer.email)
    .bind(&customer.phone)
    .bind(&customer.state)
    .bind(&customer.tags)
    .execute(conn)
    .await?;

    Ok(())
}

/// Drop cancel requests whose order no longer needs cancelling: it is not
/// flagged, or it was cancelled or closed on Shopify. `only` narrows the
/// sweep to one order.
async fn release_finished_in(
    conn: &mut PgConnection,
    only: Option<OrderId>,
) -> Result<u64, RepositoryError> {
    let released = sqlx::query(
        r"
        DELETE FROM trackscore.cancel_requests c
        USING trackscore.orders o
        WHERE c.order_id = o.order_id
          AND ($1::BIGINT IS NULL OR c.order_id = $1)
          AND (NOT o.is_flagged OR o.cancelled_at IS NOT NULL OR o.closed)
        ",
    )
    .bind(only)
    .execute(conn)
    .await?
    .rows_affected();

    if released > 0 {
        tracing::debug!(released, "Released finished cancel requests");
    }
    Ok(released)
}

/// Flag orders scoring below the threshold and queue them for
/// cancellation. Cancelled and closed orders are left alone.
pub(crate) async fn apply_threshold_in(
    conn: &mut PgConnection,
    threshold: Threshold,
) -> Result<FlagSummary, RepositoryError> {
    let flagged = sqlx::query(
        r"
        UPDATE trackscore.orders
        SET is_flagged = (quality_score IS NOT NULL AND quality_score < $1),
            is_shippable = NOT (quality_score IS NOT NULL AND quality_score < $1),
            updated_at = NOW()
        WHERE cancelled_at IS NULL AND NOT closed
        ",
    )
    .bind(threshold.value())
    .execute(&mut *conn)
    .await?;
    tracing::debug!(rows = flagged.rows_affected(), "Re-derived order flags");

    let queued = sqlx::query(
        r"
        INSERT INTO trackscore.cancel_requests (order_id, email)
        SELECT order_id, email FROM trackscore.orders
        WHERE is_flagged AND cancelled_at IS NULL AND NOT closed
        ON CONFLICT (order_id) DO NOTHING
        ",
    )
    .execute(&mut *conn)
    .await?
    .rows_affected();

    let released = release_finished_in(&mut *conn, None).await?;

    let flagged: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM trackscore.orders WHERE is_flagged AND cancelled_at IS NULL AND NOT closed",
    )
    .fetch_one(&mut *conn)
    .await?;

    Ok(FlagSummary {
        flagged: u64::try_from(flagged).unwrap_or_default(),
        queued,
        released,
    })
}
