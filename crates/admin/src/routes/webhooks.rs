//! Shopify webhook receiver.
//!
//! Every delivery is verified against `X-Shopify-Hmac-Sha256`, the base64
//! HMAC-SHA256 of the raw body keyed with the app secret. Order topics
//! upsert the mirrored order, so redelivery is harmless.

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use tracing::instrument;

use crate::db::OrderRepository;
use crate::error::{AppError, set_sentry_shop};
use crate::services::{OrderSyncError, sync_order};
use crate::shopify::OrderWebhookPayload;
use crate::state::AppState;

const HMAC_HEADER: &str = "X-Shopify-Hmac-Sha256";
const TOPIC_HEADER: &str = "X-Shopify-Topic";
const SHOP_HEADER: &str = "X-Shopify-Shop-Domain";

pub fn router() -> Router<AppState> {
    Router::new().route("/webhooks", post(receive))
}

/// Webhook topics TrackScore acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookTopic {
    OrdersCreate,
    OrdersUpdated,
    OrdersCancelled,
    AppUninstalled,
    Other(String),
}

impl WebhookTopic {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "orders/create" => Self::OrdersCreate,
            "orders/updated" => Self::OrdersUpdated,
            "orders/cancelled" => Self::OrdersCancelled,
            "app/uninstalled" => Self::AppUninstalled,
            other => Self::Other(other.to_string()),
        }
    }

    const fn is_order(&self) -> bool {
        matches!(
            self,
            Self::OrdersCreate | Self::OrdersUpdated | Self::OrdersCancelled
        )
    }
}

/// Check a webhook signature in constant time.
///
/// # Errors
///
/// Returns `AppError::Unauthorized` if the header is not valid base64 or
/// does not match the body.
pub fn verify_signature(secret: &SecretString, body: &[u8], signature: &str) -> Result<(), AppError> {
    let expected = STANDARD
        .decode(signature.trim())
        .map_err(|_| AppError::Unauthorized("Malformed webhook signature".into()))?;

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.expose_secret().as_bytes())
        .map_err(|e| AppError::Internal(e.to_string()))?;
    mac.update(body);

    mac.verify_slice(&expected)
        .map_err(|_| AppError::Unauthorized("Webhook signature mismatch".into()))
}

fn header<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

#[instrument(
    skip(state, headers, body),
    fields(topic = tracing::field::Empty, shop = tracing::field::Empty)
)]
async fn receive(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let signature = header(&headers, HMAC_HEADER)
        .ok_or_else(|| AppError::Unauthorized("Missing webhook signature".into()))?;
    verify_signature(&state.config().shopify.api_secret, &body, signature)?;

    let topic = WebhookTopic::parse(header(&headers, TOPIC_HEADER).unwrap_or_default());
    let span = tracing::Span::current();
    span.record("topic", tracing::field::debug(&topic));
    if let Some(shop) = header(&headers, SHOP_HEADER) {
        span.record("shop", shop);
        set_sentry_shop(shop);
    }

    if topic.is_order() {
        let payload: OrderWebhookPayload = serde_json::from_slice(&body)
            .map_err(|e| AppError::BadRequest(format!("Invalid order payload: {e}")))?;

        let store = OrderRepository::new(state.pool());
        let order_id = sync_order(&store, payload).await.map_err(|e| match e {
            OrderSyncError::Mapping(mapping) => AppError::BadRequest(mapping.to_string()),
            OrderSyncError::Store(db) => AppError::Database(db),
        })?;

        tracing::info!(%order_id, ?topic, "Order webhook processed");
        return Ok(StatusCode::OK);
    }

    match topic {
        WebhookTopic::AppUninstalled => tracing::warn!("App uninstalled from shop"),
        other => tracing::info!(topic = ?other, "Ignoring webhook topic"),
    }

    Ok(StatusCode::OK)
}
