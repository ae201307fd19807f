//! Pending cancellation requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use trackscore_core::{CancelReason, OrderId};

/// A flagged order waiting to be cancelled on Shopify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CancelRequest {
    pub id: i64,
    pub order_id: OrderId,
    pub email: String,
    pub reason: CancelReason,
    pub refund: bool,
    pub restock: bool,
    pub notify_customer: bool,
    /// Message of the last failed attempt, if any.
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
}
