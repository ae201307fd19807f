//! Order sync: Shopify orders into the local order tables.
//!
//! Pages are fetched strictly one after another. Each order is mapped and
//! upserted on its own; a bad order is logged and counted, never fatal.
//! Only a page that cannot be fetched or parsed aborts the sync.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;
use trackscore_core::{
    CustomerId, FinancialStatus, FulfillmentStatus, IdError, OrderId, PaymentMethod, ProductId,
    RiskLevel,
};

use crate::config::SyncConfig;
use crate::db::{OrderRepository, RepositoryError};
use crate::models::order::{DEFAULT_IVR, DEFAULT_OTP, DEFAULT_TIER};
use crate::models::{CustomerInput, OrderInput};
use crate::shopify::{
    AdminClient, AdminShopifyError, CustomerNode, OrderConnection, OrderNode,
    OrderWebhookPayload, WebhookCustomer,
};

/// Longest we wait on a single `Retry-After`.
const MAX_RETRY_SLEEP_SECS: u64 = 30;

const NO_ADDRESS: &str = "No address provided";
const UNNAMED_ORDER: &str = "Unnamed Order";

// =============================================================================
// Seams
// =============================================================================

/// Where orders come from.
pub trait OrderSource: Send + Sync {
    fn fetch_orders_page(
        &self,
        first: u32,
        after: Option<String>,
    ) -> impl Future<Output = Result<OrderConnection, AdminShopifyError>> + Send;
}

/// Where mapped orders go.
pub trait OrderStore: Send + Sync {
    fn upsert_order(
        &self,
        order: &OrderInput,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

impl OrderSource for AdminClient {
    fn fetch_orders_page(
        &self,
        first: u32,
        after: Option<String>,
    ) -> impl Future<Output = Result<OrderConnection, AdminShopifyError>> + Send {
        self.get_orders_page(first, after)
    }
}

impl OrderStore for OrderRepository<'_> {
    fn upsert_order(
        &self,
        order: &OrderInput,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send {
        self.upsert(order)
    }
}

// =============================================================================
// Mapping
// =============================================================================

/// Why a single order could not be mapped.
#[derive(Debug, Error)]
pub enum OrderMappingError {
    #[error("order has no id")]
    MissingId,

    #[error("invalid id: {0}")]
    InvalidId(#[from] IdError),

    #[error("no valid product id found in order line items")]
    MissingProduct,

    #[error("invalid timestamp {0:?}")]
    InvalidTimestamp(String),
}

fn parse_timestamp(raw: Option<&str>) -> Result<Option<DateTime<Utc>>, OrderMappingError> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|_| OrderMappingError::InvalidTimestamp(s.to_string()))
        })
        .transpose()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn join_tags<S: AsRef<str>>(tags: &[S]) -> Option<String> {
    let joined = tags
        .iter()
        .map(|t| t.as_ref().trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(",");
    (!joined.is_empty()).then_some(joined)
}

fn split_tags(tags: Option<&str>) -> Option<String> {
    tags.and_then(|t| join_tags(&t.split(',').collect::<Vec<_>>()))
}

fn order_name(customer: Option<&CustomerInput>) -> String {
    customer
        .map(CustomerInput::full_name)
        .filter(|name| !name.is_empty())
        .map_or_else(|| UNNAMED_ORDER.to_string(), |name| format!("{name} Order"))
}

fn address_or_placeholder(joined: Option<String>) -> String {
    joined
        .filter(|a| !a.is_empty())
        .unwrap_or_else(|| NO_ADDRESS.to_string())
}

impl TryFrom<CustomerNode> for CustomerInput {
    type Error = OrderMappingError;

    fn try_from(node: CustomerNode) -> Result<Self, Self::Error> {
        let id = node.id.as_deref().ok_or(OrderMappingError::MissingId)?;
        Ok(Self {
            id: CustomerId::parse(id)?,
            first_name: non_empty(node.first_name),
            last_name: non_empty(node.last_name),
            email: non_empty(node.email),
            phone: non_empty(node.phone),
            state: non_empty(node.state),
            tags: join_tags(&node.tags),
        })
    }
}

impl TryFrom<WebhookCustomer> for CustomerInput {
    type Error = OrderMappingError;

    fn try_from(customer: WebhookCustomer) -> Result<Self, Self::Error> {
        let id = customer.id.ok_or(OrderMappingError::MissingId)?;
        Ok(Self {
            id: CustomerId::new(id),
            first_name: non_empty(customer.first_name),
            last_name: non_empty(customer.last_name),
            email: non_empty(customer.email),
            phone: non_empty(customer.phone),
            state: non_empty(customer.state),
            tags: split_tags(customer.tags.as_deref()),
        })
    }
}

impl TryFrom<OrderNode> for OrderInput {
    type Error = OrderMappingError;

    fn try_from(node: OrderNode) -> Result<Self, Self::Error> {
        let order_id = OrderId::parse(node.id.as_deref().ok_or(OrderMappingError::MissingId)?)?;
        let product_id = node
            .first_product_id()
            .ok_or(OrderMappingError::MissingProduct)
            .and_then(|gid| ProductId::parse(gid).map_err(|_| OrderMappingError::MissingProduct))?;
        let order_date = parse_timestamp(node.created_at.as_deref())?.unwrap_or_else(Utc::now);
        let cancelled_at = parse_timestamp(node.cancelled_at.as_deref())?;
        let customer = node.customer.map(CustomerInput::try_from).transpose()?;

        Ok(Self {
            order_id,
            order_date,
            name: order_name(customer.as_ref()),
            customer,
            product_id,
            email: node.email.unwrap_or_default(),
            phone: node.phone.unwrap_or_default(),
            address: address_or_placeholder(node.billing_address.map(|a| a.joined())),
            payment: FinancialStatus::from_shopify(node.display_financial_status.as_deref()),
            payment_method: PaymentMethod::from_shopify(
                node.payment_gateway_names.first().map(String::as_str),
            ),
            risk_verification: RiskLevel::from_shopify(node.risk_level.as_deref()),
            shipment_status: FulfillmentStatus::from_shopify(
                node.display_fulfillment_status.as_deref(),
            ),
            tags: join_tags(&node.tags),
            tier: DEFAULT_TIER.to_string(),
            otp: DEFAULT_OTP.to_string(),
            ivr: DEFAULT_IVR.to_string(),
            cancelled_at,
            closed: node.closed,
        })
    }
}

impl TryFrom<OrderWebhookPayload> for OrderInput {
    type Error = OrderMappingError;

    fn try_from(payload: OrderWebhookPayload) -> Result<Self, Self::Error> {
        let order_id = OrderId::new(payload.id.ok_or(OrderMappingError::MissingId)?);
        let product_id = payload
            .line_items
            .first()
            .and_then(|item| item.product_id)
            .map(ProductId::new)
            .ok_or(OrderMappingError::MissingProduct)?;
        let order_date = parse_timestamp(payload.created_at.as_deref())?.unwrap_or_else(Utc::now);
        let cancelled_at = parse_timestamp(payload.cancelled_at.as_deref())?;
        let closed = parse_timestamp(payload.closed_at.as_deref())?.is_some();
        let customer = payload.customer.map(CustomerInput::try_from).transpose()?;

        Ok(Self {
            order_id,
            order_date,
            name: order_name(customer.as_ref()),
            customer,
            product_id,
            email: payload.email.unwrap_or_default(),
            phone: payload.phone.unwrap_or_default(),
            address: address_or_placeholder(payload.billing_address.map(|a| a.joined())),
            payment: FinancialStatus::from_shopify(payload.financial_status.as_deref()),
            payment_method: PaymentMethod::from_shopify(
                payload.payment_gateway_names.first().map(String::as_str),
            ),
            // REST order payloads carry no risk level
            risk_verification: RiskLevel::from_shopify(None),
            shipment_status: FulfillmentStatus::from_shopify(payload.fulfillment_status.as_deref()),
            tags: split_tags(payload.tags.as_deref()),
            tier: DEFAULT_TIER.to_string(),
            otp: DEFAULT_OTP.to_string(),
            ivr: DEFAULT_IVR.to_string(),
            cancelled_at,
            closed,
        })
    }
}

// =============================================================================
// Sync
// =============================================================================

/// Errors that abort a sync.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to fetch orders page: {0}")]
    Shopify(#[from] AdminShopifyError),

    #[error("page reported more orders but no end cursor")]
    MissingCursor,

    #[error("still rate limited after {attempts} attempts")]
    RateLimitExhausted { attempts: u32 },
}

/// Counts reported after a sync.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSummary {
    pub total_orders: u64,
    pub success_count: u64,
    pub error_count: u64,
    pub pages: u64,
}

/// Outcome of syncing one order.
#[derive(Debug, Error)]
pub enum OrderSyncError {
    #[error(transparent)]
    Mapping(#[from] OrderMappingError),

    #[error(transparent)]
    Store(#[from] RepositoryError),
}

/// Map and store a single order.
///
/// # Errors
///
/// Returns `OrderSyncError` if the order cannot be mapped or stored.
pub async fn sync_order<T, O>(store: &T, order: O) -> Result<OrderId, OrderSyncError>
where
    T: OrderStore,
    O: TryInto<OrderInput, Error = OrderMappingError>,
{
    let input: OrderInput = order.try_into()?;
    store.upsert_order(&input).await?;
    Ok(input.order_id)
}

async fn fetch_page<S: OrderSource>(
    source: &S,
    config: SyncConfig,
    cursor: Option<String>,
) -> Result<OrderConnection, SyncError> {
    let mut attempt = 0;
    loop {
        match source.fetch_orders_page(config.page_size, cursor.clone()).await {
            Err(AdminShopifyError::RateLimited(retry_after)) => {
                attempt += 1;
                if attempt > config.max_retries {
                    return Err(SyncError::RateLimitExhausted { attempts: attempt });
                }
                let wait = retry_after.min(MAX_RETRY_SLEEP_SECS);
                tracing::warn!(attempt, wait_secs = wait, "Rate limited fetching orders, backing off");
                tokio::time::sleep(Duration::from_secs(wait)).await;
            }
            other => return other.map_err(SyncError::from),
        }
    }
}

/// Pull every order from `source` and upsert it into `store`.
///
/// # Errors
///
/// Returns `SyncError` if a page cannot be fetched. Orders already stored
/// by then stay stored.
#[instrument(skip_all, fields(page_size = config.page_size))]
pub async fn sync_all_orders<S, T>(
    source: &S,
    store: &T,
    config: SyncConfig,
) -> Result<SyncSummary, SyncError>
where
    S: OrderSource,
    T: OrderStore,
{
    let mut summary = SyncSummary::default();
    let mut cursor: Option<String> = None;

    loop {
        let page = fetch_page(source, config, cursor.take()).await?;
        summary.pages += 1;

        let has_next_page = page.page_info.has_next_page;
        let end_cursor = page.page_info.end_cursor.clone();

        for node in page.into_orders() {
            summary.total_orders += 1;
            let raw_id = node.id.clone();
            match sync_order(store, node).await {
                Ok(_) => summary.success_count += 1,
                Err(e) => {
                    summary.error_count += 1;
                    tracing::warn!(order_id = ?raw_id, error = %e, "Failed to sync order");
                }
            }
        }

        if !has_next_page {
            break;
        }
        cursor = Some(end_cursor.ok_or(SyncError::MissingCursor)?);
    }

    tracing::info!(
        total = summary.total_orders,
        success = summary.success_count,
        errors = summary.error_count,
        pages = summary.pages,
        "Order sync finished"
    );

    Ok(summary)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn node(value: serde_json::Value) -> OrderNode {
        serde_json::from_value(value).unwrap()
    }

    fn full_node() -> serde_json::Value {
        json!({
            "id": "gid://shopify/Order/5001",
            "email": "asha@example.com",
            "phone": "+919800000000",
            "createdAt": "2026-03-01T10:00:00Z",
            "tags": ["vip", "repeat"],
            "displayFinancialStatus": "PAID",
            "displayFulfillmentStatus": "IN_TRANSIT",
            "riskLevel": "HIGH",
            "paymentGatewayNames": ["Cash on Delivery (COD)"],
            "billingAddress": { "address1": "12 MG Road", "city": "Pune", "zip": "411001" },
            "customer": {
                "id": "gid://shopify/Customer/77",
                "firstName": "Asha",
                "lastName": "Rao",
                "tags": ["loyal"]
            },
            "lineItems": { "edges": [{ "node": { "product": { "id": "gid://shopify/Product/9" } } }] }
        })
    }

    #[test]
    fn test_map_full_node() {
        let input = OrderInput::try_from(node(full_node())).unwrap();

        assert_eq!(input.order_id, OrderId::new(5001));
        assert_eq!(input.product_id, ProductId::new(9));
        assert_eq!(input.name, "Asha Rao Order");
        assert_eq!(input.address, "12 MG Road, Pune, 411001");
        assert_eq!(input.tags.as_deref(), Some("vip,repeat"));
        assert_eq!(input.payment, FinancialStatus::Paid);
        assert_eq!(input.payment_method, PaymentMethod::CashOnDelivery);
        assert_eq!(input.risk_verification, RiskLevel::High);
        assert_eq!(input.shipment_status, FulfillmentStatus::InTransit);
        assert_eq!(input.tier, "Standard");
        assert_eq!(input.otp, "NOT_SENT");
        assert_eq!(input.ivr, "PENDING");
        assert_eq!(input.customer.unwrap().tags.as_deref(), Some("loyal"));
    }

    #[test]
    fn test_map_defaults() {
        let input = OrderInput::try_from(node(json!({
            "id": "gid://shopify/Order/1",
            "lineItems": { "edges": [{ "node": { "product": { "id": "gid://shopify/Product/2" } } }] }
        })))
        .unwrap();

        assert_eq!(input.name, "Unnamed Order");
        assert_eq!(input.address, "No address provided");
        assert_eq!(input.email, "");
        assert_eq!(input.payment, FinancialStatus::Pending);
        assert_eq!(input.shipment_status, FulfillmentStatus::Unfulfilled);
        assert_eq!(input.payment_method, PaymentMethod::CreditCard);
        assert_eq!(input.risk_verification, RiskLevel::Pending);
        assert!(input.tags.is_none());
    }

    #[test]
    fn test_map_unknown_status_is_explicit() {
        let mut value = full_node();
        value["displayFinancialStatus"] = json!("EXPIRED");
        let input = OrderInput::try_from(node(value)).unwrap();
        assert_eq!(input.payment, FinancialStatus::Unknown);
    }

    #[test]
    fn test_map_rejects_missing_id_and_product() {
        let mut value = full_node();
        value["id"] = json!(null);
        assert!(matches!(
            OrderInput::try_from(node(value)),
            Err(OrderMappingError::MissingId)
        ));

        let mut value = full_node();
        value["lineItems"] = json!({ "edges": [{ "node": { "product": null } }] });
        assert!(matches!(
            OrderInput::try_from(node(value)),
            Err(OrderMappingError::MissingProduct)
        ));
    }

    #[test]
    fn test_map_webhook_payload() {
        let payload: OrderWebhookPayload = serde_json::from_value(json!({
            "id": 820_982_911_946_154_508_i64,
            "email": "jon@example.com",
            "created_at": "2026-03-01T10:00:00-05:00",
            "closed_at": "2026-03-02T10:00:00-05:00",
            "tags": "vip, repeat",
            "financial_status": "partially_refunded",
            "fulfillment_status": "fulfilled",
            "payment_gateway_names": ["manual"],
            "billing_address": { "address1": "1 Main St", "country": "Canada" },
            "customer": { "id": 115_310_627_314_723_954_i64, "first_name": "Jon", "last_name": "Snow" },
            "line_items": [{ "product_id": 632_910_392 }]
        }))
        .unwrap();

        let input = OrderInput::try_from(payload).unwrap();
        assert_eq!(input.order_id, OrderId::new(820_982_911_946_154_508));
        assert_eq!(input.name, "Jon Snow Order");
        assert_eq!(input.tags.as_deref(), Some("vip,repeat"));
        assert_eq!(input.payment, FinancialStatus::PartiallyRefunded);
        assert_eq!(input.shipment_status, FulfillmentStatus::Fulfilled);
        assert_eq!(input.payment_method, PaymentMethod::BankTransfer);
        assert_eq!(input.address, "1 Main St, Canada");
        assert!(input.closed);
        assert_eq!(
            input.order_date,
            DateTime::parse_from_rfc3339("2026-03-01T15:00:00Z").unwrap()
        );
    }

    #[test]
    fn test_map_rejects_bad_timestamp() {
        let mut value = full_node();
        value["createdAt"] = json!("yesterday");
        assert!(matches!(
            OrderInput::try_from(node(value)),
            Err(OrderMappingError::InvalidTimestamp(_))
        ));
    }
}
