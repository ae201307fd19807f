//! Wire types for Shopify orders.
//!
//! Two shapes describe the same order: the GraphQL Admin API node used by
//! sync, and the REST payload Shopify posts to order webhooks. Fields a
//! mapping needs to reject are kept optional here so that one bad order does
//! not fail the whole page.

use serde::{Deserialize, Serialize};
use trackscore_core::CancelReason;

// =============================================================================
// Pagination
// =============================================================================

/// Pagination information.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

/// A connection edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge<T> {
    pub node: T,
}

/// A page of orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderConnection {
    pub page_info: PageInfo,
    #[serde(default)]
    pub edges: Vec<Edge<OrderNode>>,
}

impl OrderConnection {
    /// Orders of this page in query order.
    pub fn into_orders(self) -> impl Iterator<Item = OrderNode> {
        self.edges.into_iter().map(|e| e.node)
    }
}

// =============================================================================
// GraphQL order node
// =============================================================================

/// Billing address fields. REST and GraphQL spell these the same way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailingAddress {
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub country: Option<String>,
    pub zip: Option<String>,
}

impl MailingAddress {
    /// Non-empty parts joined with `", "`.
    #[must_use]
    pub fn joined(&self) -> String {
        [
            &self.address1,
            &self.address2,
            &self.city,
            &self.province,
            &self.country,
            &self.zip,
        ]
        .into_iter()
        .filter_map(|part| part.as_deref().map(str::trim))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerNode {
    pub id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub state: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRef {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItemNode {
    pub product: Option<ProductRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineItemConnection {
    #[serde(default)]
    pub edges: Vec<Edge<LineItemNode>>,
}

/// An order as returned by the `orders` query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderNode {
    pub id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub created_at: Option<String>,
    pub cancelled_at: Option<String>,
    #[serde(default)]
    pub closed: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    pub display_financial_status: Option<String>,
    pub display_fulfillment_status: Option<String>,
    pub risk_level: Option<String>,
    #[serde(default)]
    pub payment_gateway_names: Vec<String>,
    pub billing_address: Option<MailingAddress>,
    pub customer: Option<CustomerNode>,
    #[serde(default)]
    pub line_items: LineItemConnection,
}

impl OrderNode {
    /// GID of the first line item's product.
    #[must_use]
    pub fn first_product_id(&self) -> Option<&str> {
        self.line_items
            .edges
            .first()
            .and_then(|e| e.node.product.as_ref())
            .map(|p| p.id.as_str())
    }
}

// =============================================================================
// REST webhook payload
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookCustomer {
    pub id: Option<i64>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub state: Option<String>,
    /// Already comma-separated in REST payloads.
    pub tags: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookLineItem {
    pub product_id: Option<i64>,
}

/// Body of `orders/create`, `orders/updated` and `orders/cancelled`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderWebhookPayload {
    pub id: Option<i64>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub created_at: Option<String>,
    pub cancelled_at: Option<String>,
    pub closed_at: Option<String>,
    pub tags: Option<String>,
    pub financial_status: Option<String>,
    pub fulfillment_status: Option<String>,
    #[serde(default)]
    pub payment_gateway_names: Vec<String>,
    pub billing_address: Option<MailingAddress>,
    pub customer: Option<WebhookCustomer>,
    #[serde(default)]
    pub line_items: Vec<WebhookLineItem>,
}

// =============================================================================
// Cancellation
// =============================================================================

/// How an order is cancelled on Shopify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelOptions {
    pub reason: CancelReason,
    pub refund: bool,
    pub restock: bool,
    pub notify_customer: bool,
}

impl Default for CancelOptions {
    fn default() -> Self {
        Self {
            reason: CancelReason::Customer,
            refund: true,
            restock: true,
            notify_customer: true,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_address_join_skips_blanks() {
        let address = MailingAddress {
            address1: Some("12 MG Road".to_string()),
            address2: Some("  ".to_string()),
            city: Some("Pune".to_string()),
            province: None,
            country: Some("India".to_string()),
            zip: Some("411001".to_string()),
        };
        assert_eq!(address.joined(), "12 MG Road, Pune, India, 411001");
        assert_eq!(MailingAddress::default().joined(), "");
    }

    #[test]
    fn test_order_node_tolerates_missing_fields() {
        let node: OrderNode = serde_json::from_value(serde_json::json!({
            "id": null,
            "createdAt": "2026-03-01T10:00:00Z",
            "lineItems": { "edges": [] }
        }))
        .unwrap();
        assert!(node.id.is_none());
        assert!(node.first_product_id().is_none());
        assert!(node.tags.is_empty());
    }

    #[test]
    fn test_webhook_payload_parses_rest_shape() {
        let payload: OrderWebhookPayload = serde_json::from_value(serde_json::json!({
            "id": 820_982_911_946_154_508_i64,
            "email": "jon@example.com",
            "created_at": "2026-03-01T10:00:00-05:00",
            "tags": "vip, repeat",
            "financial_status": "paid",
            "fulfillment_status": null,
            "payment_gateway_names": ["cash_on_delivery"],
            "customer": { "id": 115_310_627_314_723_954_i64, "first_name": "Jon", "tags": "" },
            "line_items": [{ "product_id": 632_910_392 }]
        }))
        .unwrap();
        assert_eq!(payload.id, Some(820_982_911_946_154_508));
        assert_eq!(payload.line_items[0].product_id, Some(632_910_392));
        assert_eq!(payload.customer.unwrap().first_name.as_deref(), Some("Jon"));
    }

    #[test]
    fn test_cancel_options_default() {
        let options = CancelOptions::default();
        assert_eq!(options.reason, CancelReason::Customer);
        assert!(options.refund && options.restock && options.notify_customer);
    }
}
