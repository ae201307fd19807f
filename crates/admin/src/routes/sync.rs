//! Manual order sync.

use axum::{Json, Router, extract::State, routing::post};
use tracing::instrument;

use crate::db::OrderRepository;
use crate::error::AppError;
use crate::services::{SyncError, SyncSummary, sync_all_orders};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/sync", post(sync))
}

/// Pull every order from Shopify. Runs within the request; large stores
/// should use the CLI instead.
#[instrument(skip(state))]
async fn sync(State(state): State<AppState>) -> Result<Json<SyncSummary>, AppError> {
    let store = OrderRepository::new(state.pool());
    let summary = sync_all_orders(state.shopify(), &store, state.config().sync)
        .await
        .map_err(|e| match e {
            SyncError::Shopify(inner) => AppError::Shopify(inner),
            other => AppError::Internal(other.to_string()),
        })?;

    Ok(Json(summary))
}
