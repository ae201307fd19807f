//! Cancel-orders flow.
//!
//! Cancellations in a batch are issued concurrently and awaited together.
//! Every order gets its own outcome; a failure never undoes a success.

use std::collections::HashSet;
use std::future::Future;

use axum::http::StatusCode;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use trackscore_core::OrderId;

use crate::db::{CancelRequestRepository, RepositoryError};
use crate::models::CancelRequest;
use crate::shopify::{AdminClient, AdminShopifyError, CancelOptions};

const NO_PENDING_REQUEST: &str = "No pending cancel request for this order";

// =============================================================================
// Seams
// =============================================================================

/// Cancels a single order on the commerce platform.
pub trait OrderCanceller: Send + Sync {
    fn cancel(
        &self,
        order_id: OrderId,
        options: CancelOptions,
    ) -> impl Future<Output = Result<(), AdminShopifyError>> + Send;
}

/// The pending cancel-request queue.
pub trait CancelQueue: Send + Sync {
    fn pending(
        &self,
        order_ids: &[OrderId],
    ) -> impl Future<Output = Result<Vec<CancelRequest>, RepositoryError>> + Send;

    /// Drop the request once the platform confirmed the cancellation.
    fn resolve(&self, order_id: OrderId) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Keep the request pending with the error of the failed attempt.
    fn mark_failed(
        &self,
        order_id: OrderId,
        error: &str,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

impl OrderCanceller for AdminClient {
    fn cancel(
        &self,
        order_id: OrderId,
        options: CancelOptions,
    ) -> impl Future<Output = Result<(), AdminShopifyError>> + Send {
        async move {
            self.cancel_order(order_id, options).await?;
            Ok(())
        }
    }
}

impl CancelQueue for CancelRequestRepository<'_> {
    fn pending(
        &self,
        order_ids: &[OrderId],
    ) -> impl Future<Output = Result<Vec<CancelRequest>, RepositoryError>> + Send {
        self.find_by_order_ids(order_ids)
    }

    fn resolve(&self, order_id: OrderId) -> impl Future<Output = Result<(), RepositoryError>> + Send {
        self.delete(order_id)
    }

    fn mark_failed(
        &self,
        order_id: OrderId,
        error: &str,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send {
        self.record_failure(order_id, error)
    }
}

// =============================================================================
// Response
// =============================================================================

/// One order that could not be cancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelFailure {
    pub order_id: OrderId,
    pub error: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Success,
    Partial,
    Error,
}

/// Per-order outcome of a cancel batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelBatchResponse {
    pub status: BatchStatus,
    pub success: bool,
    pub message: String,
    /// Orders Shopify confirmed as cancelled. Only these leave the selection.
    pub cancelled: Vec<OrderId>,
    pub failed: Vec<CancelFailure>,
}

impl CancelBatchResponse {
    fn from_outcomes(cancelled: Vec<OrderId>, failed: Vec<CancelFailure>) -> Self {
        let total = cancelled.len() + failed.len();
        let (status, message) = match (cancelled.len(), failed.len()) {
            (n, 0) if n > 0 => (BatchStatus::Success, format!("Cancelled {n} order(s)")),
            (0, _) => (BatchStatus::Error, "Failed to cancel orders".to_string()),
            (n, _) => (BatchStatus::Partial, format!("Cancelled {n} of {total} orders")),
        };

        Self {
            success: status == BatchStatus::Success,
            status,
            message,
            cancelled,
            failed,
        }
    }

    /// 200 when everything was cancelled, 207 for a partial batch, 400 when
    /// nothing was.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self.status {
            BatchStatus::Success => StatusCode::OK,
            BatchStatus::Partial => StatusCode::MULTI_STATUS,
            BatchStatus::Error => StatusCode::BAD_REQUEST,
        }
    }
}

/// Parse a comma-separated `orderIds` form value, dropping blanks and
/// duplicates while keeping the first-seen order.
///
/// # Errors
///
/// Returns the first id that does not parse.
pub fn parse_order_ids(raw: &str) -> Result<Vec<OrderId>, String> {
    let mut seen = HashSet::new();
    let mut ids = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let id = OrderId::parse(part).map_err(|e| format!("{part}: {e}"))?;
        if seen.insert(id) {
            ids.push(id);
        }
    }
    Ok(ids)
}

// =============================================================================
// Flows
// =============================================================================

/// Cancel `order_ids` with the default options (customer reason, refund,
/// restock, notify).
#[instrument(skip_all, fields(count = order_ids.len()))]
pub async fn cancel_orders<C: OrderCanceller>(
    canceller: &C,
    order_ids: &[OrderId],
) -> CancelBatchResponse {
    let attempts = order_ids.iter().map(|&id| async move {
        (id, canceller.cancel(id, CancelOptions::default()).await)
    });
    let results = join_all(attempts).await;

    let mut cancelled = Vec::new();
    let mut failed = Vec::new();
    for (order_id, result) in results {
        match result {
            Ok(()) => cancelled.push(order_id),
            Err(e) => {
                tracing::warn!(%order_id, error = %e, "Failed to cancel order");
                failed.push(CancelFailure {
                    order_id,
                    error: e.operator_message(),
                });
            }
        }
    }

    CancelBatchResponse::from_outcomes(cancelled, failed)
}

/// Cancel the queued requests for `order_ids`, each with its stored options.
///
/// A request is removed only after its cancellation succeeded; a failed one
/// stays pending with the error recorded. Ids without a pending request are
/// reported as failed.
///
/// # Errors
///
/// Returns `RepositoryError` if the pending requests cannot be loaded.
#[instrument(skip_all, fields(count = order_ids.len()))]
pub async fn cancel_pending_requests<C, Q>(
    canceller: &C,
    queue: &Q,
    order_ids: &[OrderId],
) -> Result<CancelBatchResponse, RepositoryError>
where
    C: OrderCanceller,
    Q: CancelQueue,
{
    let requests = queue.pending(order_ids).await?;
    let queued: HashSet<OrderId> = requests.iter().map(|r| r.order_id).collect();

    let attempts = requests.iter().map(|request| async move {
        let options = CancelOptions {
            reason: request.reason,
            refund: request.refund,
            restock: request.restock,
            notify_customer: request.notify_customer,
        };
        (
            request.order_id,
            canceller.cancel(request.order_id, options).await,
        )
    });
    let results = join_all(attempts).await;

    let mut cancelled = Vec::new();
    let mut failed: Vec<CancelFailure> = order_ids
        .iter()
        .filter(|id| !queued.contains(id))
        .map(|&order_id| CancelFailure {
            order_id,
            error: NO_PENDING_REQUEST.to_string(),
        })
        .collect();

    for (order_id, result) in results {
        match result {
            Ok(()) => {
                if let Err(e) = queue.resolve(order_id).await {
                    // Cancelled on Shopify regardless; the orders/cancelled
                    // webhook releases the stale request.
                    tracing::error!(%order_id, error = %e, "Failed to remove cancel request");
                }
                cancelled.push(order_id);
            }
            Err(e) => {
                let error = e.operator_message();
                tracing::warn!(%order_id, error = %e, "Failed to cancel queued order");
                if let Err(db) = queue.mark_failed(order_id, &error).await {
                    tracing::error!(%order_id, error = %db, "Failed to record cancel failure");
                }
                failed.push(CancelFailure { order_id, error });
            }
        }
    }

    Ok(CancelBatchResponse::from_outcomes(cancelled, failed))
}
