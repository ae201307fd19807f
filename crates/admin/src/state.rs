//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::TrackScoreConfig;
use crate::shopify::{AdminClient, AdminShopifyError};

/// Application state shared across all handlers.
///
/// Cheap to clone; everything lives behind one `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: TrackScoreConfig,
    pool: PgPool,
    shopify: AdminClient,
}

impl AppState {
    /// Build the state, creating the Shopify client from `config`.
    ///
    /// # Errors
    ///
    /// Returns `AdminShopifyError` if the Shopify client cannot be built.
    pub fn new(config: TrackScoreConfig, pool: PgPool) -> Result<Self, AdminShopifyError> {
        let shopify = AdminClient::new(&config.shopify)?;
        Ok(Self::with_client(config, pool, shopify))
    }

    /// Build the state around an existing Shopify client.
    #[must_use]
    pub fn with_client(config: TrackScoreConfig, pool: PgPool, shopify: AdminClient) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                shopify,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &TrackScoreConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    #[must_use]
    pub fn shopify(&self) -> &AdminClient {
        &self.inner.shopify
    }
}
