//! CLI subcommands.

pub mod migrate;
pub mod seed;
pub mod sync;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;
use trackscore_admin::config::{ConfigError, get_database_url};
use trackscore_admin::db::{self, RepositoryError};
use trackscore_admin::services::SyncError;
use trackscore_admin::shopify::AdminShopifyError;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Shopify error: {0}")]
    Shopify(#[from] AdminShopifyError),

    #[error("Sync failed: {0}")]
    Sync(#[from] SyncError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Database URL from `TRACKSCORE_DATABASE_URL` or `DATABASE_URL`.
fn database_url() -> Result<SecretString, CommandError> {
    dotenvy::dotenv().ok();
    Ok(get_database_url("TRACKSCORE_DATABASE_URL")?)
}

async fn connect() -> Result<PgPool, CommandError> {
    let url = database_url()?;
    tracing::info!("Connecting to database...");
    Ok(db::create_pool(&url).await?)
}
