//! Order route handlers.

use axum::{
    Form, Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;
use trackscore_core::OrderId;

use crate::db::{CancelRequestRepository, OrderRepository, RepositoryError};
use crate::error::AppError;
use crate::models::Order;
use crate::services::{CancelBatchResponse, OrderCanceller, cancel_orders, parse_order_ids};
use crate::shopify::CancelOptions;
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 250;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/orders", get(list))
        .route("/orders/cancel", post(cancel_selected))
        .route("/api/cancel-order", post(cancel_one))
}

// =============================================================================
// Input Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Selection posted from the orders table.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelSelectionForm {
    /// Comma-separated order ids.
    pub order_ids: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelOneForm {
    pub order_id: String,
}

#[derive(Debug, Serialize)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

// =============================================================================
// Handlers
// =============================================================================

#[instrument(skip(state))]
async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<OrderPage>, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0).max(0);

    let repo = OrderRepository::new(state.pool());
    let orders = repo.list(limit, offset).await?;
    let total = repo.count().await?;

    Ok(Json(OrderPage {
        orders,
        total,
        limit,
        offset,
    }))
}

/// Cancel every selected order. Responds 200, 207 or 400 depending on how
/// many went through; the body lists each failure.
#[instrument(skip(state))]
async fn cancel_selected(
    State(state): State<AppState>,
    Form(form): Form<CancelSelectionForm>,
) -> Result<Response, AppError> {
    let ids = parse_order_ids(&form.order_ids).map_err(AppError::BadRequest)?;
    if ids.is_empty() {
        return Err(AppError::BadRequest("No orders selected".into()));
    }

    let response = cancel_orders(state.shopify(), &ids).await;
    release_requests(&state, &response).await;

    Ok((response.status_code(), Json(response)).into_response())
}

#[instrument(skip(state))]
async fn cancel_one(
    State(state): State<AppState>,
    Form(form): Form<CancelOneForm>,
) -> Response {
    let order_id = match OrderId::parse(form.order_id.trim()) {
        Ok(id) => id,
        Err(e) => return failure(&e.to_string()),
    };

    match state.shopify().cancel(order_id, CancelOptions::default()).await {
        Ok(()) => {
            forget_request(&state, order_id).await;
            Json(json!({ "success": true, "orderId": order_id })).into_response()
        }
        Err(e) => {
            tracing::warn!(%order_id, error = %e, "Failed to cancel order");
            failure(&e.operator_message())
        }
    }
}

fn failure(error: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "success": false, "error": error })),
    )
        .into_response()
}

/// Drop queued cancel requests for orders that were cancelled directly.
async fn release_requests(state: &AppState, response: &CancelBatchResponse) {
    for &order_id in &response.cancelled {
        forget_request(state, order_id).await;
    }
}

async fn forget_request(state: &AppState, order_id: OrderId) {
    match CancelRequestRepository::new(state.pool()).delete(order_id).await {
        Ok(()) | Err(RepositoryError::NotFound) => {}
        Err(e) => tracing::error!(%order_id, error = %e, "Failed to release cancel request"),
    }
}
