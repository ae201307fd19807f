//! Business logic services for TrackScore.
//!
//! # Services
//!
//! - `cancel_orders` - Concurrent order cancellation and the cancel-request queue
//! - `dashboard` - Dashboard assembly on top of the projection engine
//! - `order_sync` - Shopify order mirroring (full sync and webhooks)

pub mod cancel_orders;
pub mod dashboard;
pub mod order_sync;

pub use cancel_orders::{
    BatchStatus, CancelBatchResponse, CancelFailure, CancelQueue, OrderCanceller,
    cancel_orders, cancel_pending_requests, parse_order_ids,
};
pub use dashboard::{DashboardData, DashboardOverview, GoalReport, ProjectionReport};
pub use order_sync::{
    OrderMappingError, OrderSource, OrderStore, OrderSyncError, SyncError, SyncSummary,
    sync_all_orders, sync_order,
};
