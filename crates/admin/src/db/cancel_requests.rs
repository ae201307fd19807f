//! Cancel-request queue.

use sqlx::PgPool;
use trackscore_core::OrderId;

use super::RepositoryError;
use crate::models::CancelRequest;

const SELECT_COLUMNS: &str = r"
    SELECT id, order_id, email, reason, refund, restock, notify_customer,
           last_error, created_at
    FROM trackscore.cancel_requests
";

/// Repository for pending cancellation requests.
pub struct CancelRequestRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CancelRequestRepository<'a> {
    /// Create a new cancel-request repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All pending requests, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<CancelRequest>, RepositoryError> {
        let requests = sqlx::query_as::<_, CancelRequest>(&format!(
            "{SELECT_COLUMNS} ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(requests)
    }

    /// Pending requests for the given orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_order_ids(
        &self,
        order_ids: &[OrderId],
    ) -> Result<Vec<CancelRequest>, RepositoryError> {
        let ids: Vec<i64> = order_ids.iter().map(OrderId::as_i64).collect();
        let requests = sqlx::query_as::<_, CancelRequest>(&format!(
            "{SELECT_COLUMNS} WHERE order_id = ANY($1) ORDER BY created_at DESC"
        ))
        .bind(ids)
        .fetch_all(self.pool)
        .await?;

        Ok(requests)
    }

    /// Number of pending requests.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM trackscore.cancel_requests")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Remove the request for `order_id` once Shopify confirmed it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no request exists.
    pub async fn delete(&self, order_id: OrderId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM trackscore.cancel_requests WHERE order_id = $1")
            .bind(order_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Keep the request pending and remember why it failed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn record_failure(&self, order_id: OrderId, error: &str) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE trackscore.cancel_requests SET last_error = $2 WHERE order_id = $1")
            .bind(order_id)
            .bind(error)
            .execute(self.pool)
            .await?;
        Ok(())
    }
}
