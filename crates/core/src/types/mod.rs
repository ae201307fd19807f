//! Core types for TrackScore.
//!
//! This module provides type-safe wrappers for Shopify IDs, the closed
//! status sets orders are mapped onto, and the dashboard records the
//! projection engine reads.

pub mod dashboard;
pub mod id;
pub mod status;

pub use dashboard::{
    BusinessMetrics, DEFAULT_AVERAGE_ORDER_PRICE, DashboardCosts, DashboardSettings,
};
pub use id::{CustomerId, IdError, OrderId, ProductId};
pub use status::*;
