//! Status enums for orders and dashboard records.
//!
//! Shopify reports statuses as free-form strings that differ between the
//! GraphQL API (`PARTIALLY_PAID`) and webhook payloads (`partially_paid`).
//! Each enum here is the closed internal set; `from_shopify` maps the
//! platform value onto it. A missing value maps to the variant marked
//! `#[default]`, an unrecognised one maps to `Unknown` so it stays visible
//! instead of silently becoming a plausible status.

use serde::{Deserialize, Serialize};

/// Normalise a platform value for table lookup.
///
/// Lowercases, drops a trailing parenthesised note (`"Cash on Delivery (COD)"`)
/// and joins words with underscores.
fn normalize(raw: &str) -> String {
    let head = raw.split_once('(').map_or(raw, |(head, _)| head);
    head.trim()
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// Order payment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "trackscore.payment_status", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinancialStatus {
    Authorized,
    Paid,
    PartiallyPaid,
    PartiallyRefunded,
    #[default]
    Pending,
    Refunded,
    Voided,
    Unknown,
}

impl FinancialStatus {
    /// Map a Shopify financial status (GraphQL or webhook spelling).
    #[must_use]
    pub fn from_shopify(raw: Option<&str>) -> Self {
        let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
            return Self::default();
        };
        match normalize(raw).as_str() {
            "authorized" => Self::Authorized,
            "paid" => Self::Paid,
            "partially_paid" => Self::PartiallyPaid,
            "partially_refunded" => Self::PartiallyRefunded,
            "pending" => Self::Pending,
            "refunded" => Self::Refunded,
            "voided" => Self::Voided,
            _ => Self::Unknown,
        }
    }
}

/// Order shipment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "trackscore.shipment_status", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FulfillmentStatus {
    Fulfilled,
    Partial,
    #[default]
    Unfulfilled,
    Delivered,
    InTransit,
    OutForDelivery,
    Attempted,
    Failed,
    Cancelled,
    OnHold,
    Returned,
    Unknown,
}

impl FulfillmentStatus {
    /// Map a Shopify fulfillment / shipment status.
    #[must_use]
    pub fn from_shopify(raw: Option<&str>) -> Self {
        let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
            return Self::default();
        };
        match normalize(raw).as_str() {
            "fulfilled" => Self::Fulfilled,
            "partial" | "partially_fulfilled" => Self::Partial,
            "unfulfilled" => Self::Unfulfilled,
            "delivered" => Self::Delivered,
            "in_transit" => Self::InTransit,
            "out_for_delivery" => Self::OutForDelivery,
            "attempted" | "attempted_delivery" => Self::Attempted,
            "failed" | "failure" => Self::Failed,
            "cancelled" | "canceled" => Self::Cancelled,
            "on_hold" => Self::OnHold,
            "returned" => Self::Returned,
            _ => Self::Unknown,
        }
    }
}

/// Payment method derived from the first payment gateway name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "trackscore.payment_method", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    #[default]
    CreditCard,
    Debit,
    Paypal,
    ShopPay,
    ApplePay,
    GooglePay,
    BankTransfer,
    CashOnDelivery,
    Unknown,
}

impl PaymentMethod {
    /// Map a Shopify payment gateway name.
    #[must_use]
    pub fn from_shopify(raw: Option<&str>) -> Self {
        let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
            return Self::default();
        };
        match normalize(raw).as_str() {
            "credit_card" | "shopify_payments" => Self::CreditCard,
            "debit" => Self::Debit,
            "paypal" => Self::Paypal,
            "shopify_pay" | "shop_pay" => Self::ShopPay,
            "apple_pay" => Self::ApplePay,
            "google_pay" => Self::GooglePay,
            "bank_deposit" | "bank_transfer" | "manual" => Self::BankTransfer,
            "cash_on_delivery" | "cod" => Self::CashOnDelivery,
            _ => Self::Unknown,
        }
    }

    /// Whether the order is paid on delivery (and therefore carries RTO risk).
    #[must_use]
    pub const fn is_cod(self) -> bool {
        matches!(self, Self::CashOnDelivery)
    }
}

/// Risk verification level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "trackscore.risk_level", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    High,
    Medium,
    Low,
    Verified,
    #[default]
    Pending,
    Unknown,
}

impl RiskLevel {
    /// Map a Shopify risk level.
    #[must_use]
    pub fn from_shopify(raw: Option<&str>) -> Self {
        let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
            return Self::default();
        };
        match normalize(raw).as_str() {
            "high" => Self::High,
            "medium" => Self::Medium,
            "low" => Self::Low,
            "verified" => Self::Verified,
            "pending" => Self::Pending,
            _ => Self::Unknown,
        }
    }
}

/// Reason sent with an order cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "trackscore.cancel_reason", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CancelReason {
    #[default]
    Customer,
    Fraud,
    Inventory,
    Declined,
    Staff,
    Other,
}

impl CancelReason {
    /// The GraphQL `OrderCancelReason` value.
    #[must_use]
    pub const fn as_graphql(self) -> &'static str {
        match self {
            Self::Customer => "CUSTOMER",
            Self::Fraud => "FRAUD",
            Self::Inventory => "INVENTORY",
            Self::Declined => "DECLINED",
            Self::Staff => "STAFF",
            Self::Other => "OTHER",
        }
    }
}

impl std::str::FromStr for CancelReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "CUSTOMER" => Ok(Self::Customer),
            "FRAUD" => Ok(Self::Fraud),
            "INVENTORY" => Ok(Self::Inventory),
            "DECLINED" => Ok(Self::Declined),
            "STAFF" => Ok(Self::Staff),
            "OTHER" => Ok(Self::Other),
            _ => Err(format!("invalid cancel reason: {s}")),
        }
    }
}

/// Which baseline a `BusinessMetrics` row describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "trackscore.metrics_kind", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MetricsKind {
    /// Baseline the TrackScore scenario scales from.
    Base,
    /// Shipping every order.
    ShipAll,
}

impl std::fmt::Display for MetricsKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Base => write!(f, "BASE"),
            Self::ShipAll => write!(f, "SHIP_ALL"),
        }
    }
}

impl std::str::FromStr for MetricsKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "BASE" => Ok(Self::Base),
            "SHIP_ALL" => Ok(Self::ShipAll),
            _ => Err(format!("invalid metrics kind: {s}")),
        }
    }
}
