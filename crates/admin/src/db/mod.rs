//! Database operations for the TrackScore `PostgreSQL` schema.
//!
//! # Schema: `trackscore`
//!
//! ## Tables
//!
//! - `orders`, `customers` - Orders synced from Shopify
//! - `cancel_requests` - Pending cancellations of flagged orders
//! - `dashboard_settings`, `dashboard_costs`, `business_metrics` - Projection inputs
//! - `cutoff_modes`, `active_cutoff_mode` - Threshold presets and the active one
//! - `app_settings` - Shop-wide toggles
//!
//! # Migrations
//!
//! Migrations are stored in `crates/admin/migrations/` and run via:
//! ```bash
//! cargo run -p trackscore-cli -- migrate
//! ```

pub mod app_settings;
pub mod cancel_requests;
pub mod cutoff_modes;
pub mod dashboard;
pub mod orders;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use app_settings::AppSettingsRepository;
pub use cancel_requests::CancelRequestRepository;
pub use cutoff_modes::CutoffModeRepository;
pub use dashboard::DashboardRepository;
pub use orders::OrderRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// The row changed underneath a conditional update.
    #[error("conflict: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
