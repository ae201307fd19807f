//! Full order sync from Shopify.
//!
//! # Environment Variables
//!
//! - `TRACKSCORE_DATABASE_URL` - `PostgreSQL` connection string
//! - `SHOPIFY_STORE`, `SHOPIFY_ADMIN_ACCESS_TOKEN`, `SHOPIFY_API_SECRET`
//! - `SYNC_PAGE_SIZE`, `SYNC_MAX_RETRIES` (optional)

use trackscore_admin::config::{ShopifyAdminConfig, SyncConfig};
use trackscore_admin::db::OrderRepository;
use trackscore_admin::services::sync_all_orders;
use trackscore_admin::shopify::AdminClient;

use super::{CommandError, connect};

/// Pull every order and upsert it.
///
/// # Errors
///
/// Returns an error if configuration is missing, the database is
/// unreachable, or a page cannot be fetched.
pub async fn run(page_size: Option<u32>) -> Result<(), CommandError> {
    // Shopify requests go over rustls
    let _ = rustls::crypto::ring::default_provider().install_default();

    let pool = connect().await?;
    let shopify = ShopifyAdminConfig::from_env()?;
    let mut config = SyncConfig::from_env()?;
    if let Some(size) = page_size {
        if !(1..=250).contains(&size) {
            return Err(CommandError::InvalidArgument(format!(
                "--page-size must be between 1 and 250 (got {size})"
            )));
        }
        config.page_size = size;
    }

    let client = AdminClient::new(&shopify)?;
    let store = OrderRepository::new(&pool);

    tracing::info!(store = %shopify.store, page_size = config.page_size, "Starting order sync...");
    let summary = sync_all_orders(&client, &store, config).await?;

    tracing::info!("Sync complete!");
    tracing::info!("  Orders seen: {}", summary.total_orders);
    tracing::info!("  Stored: {}", summary.success_count);
    tracing::info!("  Failed: {}", summary.error_count);
    tracing::info!("  Pages: {}", summary.pages);

    Ok(())
}
