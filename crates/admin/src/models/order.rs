//! Orders and customers as stored after sync.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use trackscore_core::{
    CustomerId, FinancialStatus, FulfillmentStatus, OrderId, PaymentMethod, ProductId, RiskLevel,
};

/// Tier given to every synced order until it is scored.
pub const DEFAULT_TIER: &str = "Standard";
/// OTP status of an order no OTP was sent for.
pub const DEFAULT_OTP: &str = "NOT_SENT";
/// IVR status of an order not yet called.
pub const DEFAULT_IVR: &str = "PENDING";

/// Customer fields written on every order upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerInput {
    pub id: CustomerId,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub state: Option<String>,
    /// Comma-joined tags.
    pub tags: Option<String>,
}

impl CustomerInput {
    /// "First Last", skipping missing parts.
    #[must_use]
    pub fn full_name(&self) -> String {
        [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A fully mapped order ready to upsert.
///
/// Scoring columns (`quality_score`, flags) are owned by the scoring side and
/// are never written from here.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderInput {
    pub order_id: OrderId,
    pub order_date: DateTime<Utc>,
    pub customer: Option<CustomerInput>,
    pub product_id: ProductId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub payment: FinancialStatus,
    pub payment_method: PaymentMethod,
    pub risk_verification: RiskLevel,
    pub shipment_status: FulfillmentStatus,
    pub tags: Option<String>,
    pub tier: String,
    pub otp: String,
    pub ivr: String,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub closed: bool,
}

/// A stored order as listed on the orders page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_id: OrderId,
    pub order_date: DateTime<Utc>,
    pub customer_id: Option<CustomerId>,
    pub product_id: ProductId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub payment: FinancialStatus,
    pub payment_method: PaymentMethod,
    pub risk_verification: RiskLevel,
    pub shipment_status: FulfillmentStatus,
    pub tags: Option<String>,
    pub tier: String,
    pub otp: String,
    pub ivr: String,
    pub quality_score: Option<f64>,
    pub is_flagged: bool,
    pub is_shippable: bool,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub closed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer(first: Option<&str>, last: Option<&str>) -> CustomerInput {
        CustomerInput {
            id: CustomerId::new(7),
            first_name: first.map(str::to_string),
            last_name: last.map(str::to_string),
            email: None,
            phone: None,
            state: None,
            tags: None,
        }
    }

    #[test]
    fn test_full_name() {
        assert_eq!(customer(Some("Asha"), Some("Rao")).full_name(), "Asha Rao");
        assert_eq!(customer(Some("Asha"), None).full_name(), "Asha");
        assert_eq!(customer(None, Some(" ")).full_name(), "");
    }
}
