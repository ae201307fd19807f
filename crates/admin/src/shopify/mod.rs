//! Shopify Admin API client (HIGH PRIVILEGE).
//!
//! # Security
//!
//! **This module holds the store's Admin API access token.** It can cancel
//! and refund orders, so the token never leaves [`AdminClient`] and is
//! redacted from every `Debug` output.
//!
//! # Architecture
//!
//! - Uses `graphql_client` request bodies for typed GraphQL operations
//! - Orders are pulled page by page and mirrored into Postgres
//! - Rate limiting surfaces as [`AdminShopifyError::RateLimited`] for the
//!   caller to back off on
//!
//! # Example
//!
//! ```rust,ignore
//! use trackscore_admin::shopify::{AdminClient, CancelOptions};
//!
//! let client = AdminClient::new(&config.shopify)?;
//!
//! // First page of orders
//! let page = client.get_orders_page(250, None).await?;
//!
//! // Cancel with refund and restock
//! client.cancel_order(order_id, CancelOptions::default()).await?;
//! ```

mod admin;
pub mod types;

pub use admin::AdminClient;
pub use types::*;

use thiserror::Error;

/// Errors that can occur when interacting with Shopify Admin API.
#[derive(Debug, Error)]
pub enum AdminShopifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// GraphQL query returned errors.
    #[error("GraphQL errors: {}", format_graphql_errors(.0))]
    GraphQL(Vec<GraphQLError>),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configured store does not form a valid endpoint.
    #[error("Invalid endpoint: {0}")]
    Endpoint(#[from] url::ParseError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by Shopify.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Authentication/authorization failed.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User error from mutation (e.g., order already cancelled).
    #[error("User error: {0}")]
    UserError(String),
}

impl AdminShopifyError {
    /// The message shown to an operator for a failed per-order action.
    ///
    /// User errors carry Shopify's own wording; everything else is
    /// summarised without transport details.
    #[must_use]
    pub fn operator_message(&self) -> String {
        match self {
            Self::UserError(message) => message.clone(),
            Self::RateLimited(secs) => format!("Shopify is rate limiting requests, retry in {secs}s"),
            Self::Unauthorized(_) => "Shopify rejected the access token".to_string(),
            Self::NotFound(what) => format!("Not found: {what}"),
            Self::GraphQL(errors) => format_graphql_errors(errors),
            Self::Http(_) | Self::Parse(_) | Self::Endpoint(_) => {
                "Could not reach Shopify".to_string()
            }
        }
    }
}

/// A GraphQL error returned by the Shopify Admin API.
#[derive(Debug, Clone)]
pub struct GraphQLError {
    /// Error message.
    pub message: String,
    /// Source locations in the query.
    pub locations: Vec<GraphQLErrorLocation>,
    /// Path to the error in the response.
    pub path: Vec<serde_json::Value>,
}

/// Location in a GraphQL query where an error occurred.
#[derive(Debug, Clone)]
pub struct GraphQLErrorLocation {
    /// Line number (1-indexed).
    pub line: i64,
    /// Column number (1-indexed).
    pub column: i64,
}

fn format_graphql_errors(errors: &[GraphQLError]) -> String {
    errors
        .iter()
        .map(|e| e.message.clone())
        .collect::<Vec<_>>()
        .join("; ")
}
