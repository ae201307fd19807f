//! Cancel-request queue handlers.

use axum::{
    Form, Json, Router,
    extract::State,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tracing::instrument;

use crate::db::CancelRequestRepository;
use crate::error::AppError;
use crate::models::CancelRequest;
use crate::services::{cancel_pending_requests, parse_order_ids};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/cancel-orders", get(list))
        .route("/cancel-orders", post(cancel))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelRequestsForm {
    /// Comma-separated order ids of queued requests.
    pub order_ids: String,
}

#[instrument(skip(state))]
async fn list(State(state): State<AppState>) -> Result<Json<Vec<CancelRequest>>, AppError> {
    let requests = CancelRequestRepository::new(state.pool()).list().await?;
    Ok(Json(requests))
}

/// Cancel the queued requests for the posted orders with their stored
/// options.
#[instrument(skip(state))]
async fn cancel(
    State(state): State<AppState>,
    Form(form): Form<CancelRequestsForm>,
) -> Result<Response, AppError> {
    let ids = parse_order_ids(&form.order_ids).map_err(AppError::BadRequest)?;
    if ids.is_empty() {
        return Err(AppError::BadRequest("No orders selected".into()));
    }

    let queue = CancelRequestRepository::new(state.pool());
    let response = cancel_pending_requests(state.shopify(), &queue, &ids).await?;

    Ok((response.status_code(), Json(response)).into_response())
}
