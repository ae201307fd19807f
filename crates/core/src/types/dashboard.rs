//! Dashboard records: settings, cost catalogue and baseline metrics.
//!
//! Each record is a single row. Money is whole rupees (`i64`); rates and
//! percentages are `f64` in the 0-100 range.

use serde::{Deserialize, Serialize};

use super::status::MetricsKind;

/// Average order price used when settings do not carry one.
pub const DEFAULT_AVERAGE_ORDER_PRICE: i64 = 2000;

/// Operator-tunable dashboard settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct DashboardSettings {
    pub initial_threshold: f64,
    pub total_orders: i64,
    pub flagged_orders: i64,
    pub orders_to_ship: i64,
    pub delivery_rate: f64,
    pub previous_delivery_rate: f64,
    pub daily_savings: i64,
    pub average_order_price: Option<i64>,
}

impl DashboardSettings {
    /// Average order price, falling back to [`DEFAULT_AVERAGE_ORDER_PRICE`].
    #[must_use]
    pub fn average_order_price_or_default(&self) -> i64 {
        self.average_order_price
            .filter(|p| *p > 0)
            .unwrap_or(DEFAULT_AVERAGE_ORDER_PRICE)
    }
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            initial_threshold: 75.0,
            total_orders: 156,
            flagged_orders: 39,
            orders_to_ship: 117,
            delivery_rate: 67.0,
            previous_delivery_rate: 56.0,
            daily_savings: 4680,
            average_order_price: None,
        }
    }
}

/// Per-order cost catalogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct DashboardCosts {
    pub forward_shipping: f64,
    pub reverse_shipping: f64,
    pub packaging: f64,
    /// Storage cost per order per day.
    pub storage: f64,
    pub average_storage_days: f64,
    pub inventory_cost_per_order: f64,
    pub marketing_cost_per_order: f64,
    pub operations_cost_per_order: f64,
}

impl Default for DashboardCosts {
    fn default() -> Self {
        Self {
            forward_shipping: 80.0,
            reverse_shipping: 120.0,
            packaging: 30.0,
            storage: 5.0,
            average_storage_days: 7.0,
            inventory_cost_per_order: 900.0,
            marketing_cost_per_order: 200.0,
            operations_cost_per_order: 50.0,
        }
    }
}

/// Baseline business metrics for one scenario kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct BusinessMetrics {
    pub kind: MetricsKind,
    pub profit: i64,
    pub percentage: f64,
    pub upfront_cost: i64,
    pub capital_efficiency: f64,
    pub rto_rate: f64,
}

impl BusinessMetrics {
    /// Seed values for a metrics kind.
    #[must_use]
    pub const fn seed(kind: MetricsKind) -> Self {
        match kind {
            MetricsKind::Base => Self {
                kind,
                profit: 9320,
                percentage: 30.0,
                upfront_cost: 21_680,
                capital_efficiency: 1.43,
                rto_rate: 8.0,
            },
            MetricsKind::ShipAll => Self {
                kind,
                profit: 7480,
                percentage: 24.0,
                upfront_cost: 24_520,
                capital_efficiency: 1.31,
                rto_rate: 35.0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_order_price_fallback() {
        let mut settings = DashboardSettings::default();
        assert_eq!(settings.average_order_price_or_default(), 2000);

        settings.average_order_price = Some(0);
        assert_eq!(settings.average_order_price_or_default(), 2000);

        settings.average_order_price = Some(1499);
        assert_eq!(settings.average_order_price_or_default(), 1499);
    }

    #[test]
    fn test_default_settings_are_consistent() {
        let settings = DashboardSettings::default();
        assert_eq!(
            settings.flagged_orders + settings.orders_to_ship,
            settings.total_orders
        );
    }

    #[test]
    fn test_seed_kinds() {
        assert_eq!(BusinessMetrics::seed(MetricsKind::Base).kind, MetricsKind::Base);
        assert_eq!(
            BusinessMetrics::seed(MetricsKind::ShipAll).kind,
            MetricsKind::ShipAll
        );
    }
}
