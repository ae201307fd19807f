//! Cashflow goal forecasting.
//!
//! Compares a target daily order volume against the normal-shipping
//! baseline using per-unit economics.

use serde::{Deserialize, Serialize};

use super::format::{format_inr, format_inr_compact};
use super::threshold::round_to_i64;

pub const MIN_ORDERS_PER_DAY: i64 = 50;
pub const MAX_ORDERS_PER_DAY: i64 = 10_000;
pub const DEFAULT_ORDERS_PER_DAY: i64 = 100;

/// Share of orders that deliver without TrackScore.
const NORMAL_DELIVERY_SHARE: f64 = 0.75;
const INVENTORY_DAYS: f64 = 2.0;

const NORMAL_BREAKEVEN_DAYS: i64 = 18;
const NORMAL_INVENTORY: i64 = 200_000;
const NORMAL_PROFIT_15_DAYS: i64 = -80_000;
const NORMAL_PROFIT_30_DAYS: i64 = 450_000;

/// Per-unit economics of a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FinancialInputs {
    pub mrp: f64,
    pub product_cost: f64,
    pub marketing_cost: f64,
    pub shipping_cost: f64,
    pub packaging_cost: f64,
    pub rto_cost: f64,
}

impl Default for FinancialInputs {
    fn default() -> Self {
        Self {
            mrp: 1500.0,
            product_cost: 900.0,
            marketing_cost: 200.0,
            shipping_cost: 80.0,
            packaging_cost: 30.0,
            rto_cost: 120.0,
        }
    }
}

impl FinancialInputs {
    /// Margin on a delivered order.
    #[must_use]
    pub fn successful_order_profit(&self) -> f64 {
        self.mrp - self.product_cost - self.marketing_cost - self.shipping_cost - self.packaging_cost
    }

    /// Money lost on an order that comes back.
    #[must_use]
    pub fn failed_order_loss(&self) -> f64 {
        self.shipping_cost + self.rto_cost + self.packaging_cost + self.marketing_cost
    }
}

/// Clamp an orders-per-day goal to the supported range.
#[must_use]
pub fn clamp_orders_per_day(orders_per_day: i64) -> i64 {
    orders_per_day.clamp(MIN_ORDERS_PER_DAY, MAX_ORDERS_PER_DAY)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalMetricKind {
    BreakevenDay,
    InventoryRequired,
    NetProfit15Days,
    NetProfit30Days,
}

impl GoalMetricKind {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::BreakevenDay => "Breakeven Day",
            Self::InventoryRequired => "Inventory Required",
            Self::NetProfit15Days => "Net Profit (15 days)",
            Self::NetProfit30Days => "Net Profit (30 days)",
        }
    }

    #[must_use]
    pub const fn info(self) -> &'static str {
        match self {
            Self::BreakevenDay => "Number of days to recover initial investment",
            Self::InventoryRequired => "Capital tied up in inventory",
            Self::NetProfit15Days => "Profit/loss after 15 days",
            Self::NetProfit30Days => "Profit/loss after 30 days",
        }
    }
}

/// A goal figure next to its normal-shipping baseline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalMetric {
    pub metric: GoalMetricKind,
    pub label: String,
    pub normal: String,
    pub goal: String,
    pub normal_value: i64,
    pub goal_value: i64,
    /// For breakeven, days saved; otherwise goal minus normal.
    pub improvement: i64,
    pub info: String,
}

impl GoalMetric {
    fn new(metric: GoalMetricKind, normal_value: i64, goal_value: i64, improvement: i64) -> Self {
        let (normal, goal) = match metric {
            GoalMetricKind::BreakevenDay => {
                (format!("{normal_value} days"), format!("{goal_value} days"))
            }
            _ => (format_inr_compact(normal_value), format_inr_compact(goal_value)),
        };
        Self {
            metric,
            label: metric.label().to_string(),
            normal,
            goal,
            normal_value,
            goal_value,
            improvement,
            info: metric.info().to_string(),
        }
    }
}

/// Goal metrics at `orders_per_day` (clamped to the supported range).
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn goal_metrics(orders_per_day: i64, inputs: &FinancialInputs) -> Vec<GoalMetric> {
    let o = clamp_orders_per_day(orders_per_day) as f64;

    let breakeven = round_to_i64(18.0 - (o - 100.0) / 25.0).max(10);
    let inventory = round_to_i64(inputs.product_cost * o * INVENTORY_DAYS);

    let net = |days: f64, inventory_share: f64| {
        let delivered = o * days * NORMAL_DELIVERY_SHARE * inputs.successful_order_profit();
        let failed = o * days * (1.0 - NORMAL_DELIVERY_SHARE) * inputs.failed_order_loss();
        round_to_i64(delivered - failed - inventory as f64 * inventory_share)
    };
    let profit_15 = net(15.0, 0.5);
    let profit_30 = net(30.0, 1.0);

    vec![
        GoalMetric::new(
            GoalMetricKind::BreakevenDay,
            NORMAL_BREAKEVEN_DAYS,
            breakeven,
            NORMAL_BREAKEVEN_DAYS - breakeven,
        ),
        GoalMetric::new(
            GoalMetricKind::InventoryRequired,
            NORMAL_INVENTORY,
            inventory,
            inventory - NORMAL_INVENTORY,
        ),
        GoalMetric::new(
            GoalMetricKind::NetProfit15Days,
            NORMAL_PROFIT_15_DAYS,
            profit_15,
            profit_15 - NORMAL_PROFIT_15_DAYS,
        ),
        GoalMetric::new(
            GoalMetricKind::NetProfit30Days,
            NORMAL_PROFIT_30_DAYS,
            profit_30,
            profit_30 - NORMAL_PROFIT_30_DAYS,
        ),
    ]
}

/// Daily savings from shipping with TrackScore at a given volume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessImpact {
    pub orders_per_day: i64,
    /// Units of inventory no longer tied up.
    pub inventory_saved: i64,
    pub forward_shipping: i64,
    pub reverse_shipping: i64,
    pub packaging_costs: i64,
    pub total_savings: i64,
}

/// Business impact at `orders_per_day` (clamped to the supported range).
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn business_impact(orders_per_day: i64, inputs: &FinancialInputs) -> BusinessImpact {
    const INVENTORY_SAVED_SHARE: f64 = 0.36;
    const SHIPPING_SAVING_SHARE: f64 = 0.15;
    const NORMAL_RTO_SHARE: f64 = 0.25;
    const RTO_REDUCTION: f64 = 0.5;

    let clamped = clamp_orders_per_day(orders_per_day);
    let o = clamped as f64;

    let forward_shipping = round_to_i64(inputs.shipping_cost * o * SHIPPING_SAVING_SHARE);
    let reverse_shipping = round_to_i64(inputs.rto_cost * o * NORMAL_RTO_SHARE * RTO_REDUCTION);
    let packaging_costs =
        round_to_i64(inputs.packaging_cost * o * NORMAL_RTO_SHARE * RTO_REDUCTION);

    BusinessImpact {
        orders_per_day: clamped,
        inventory_saved: round_to_i64(o * INVENTORY_SAVED_SHARE),
        forward_shipping,
        reverse_shipping,
        packaging_costs,
        total_savings: forward_shipping + reverse_shipping + packaging_costs,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceRow {
    pub metric: String,
    pub normal: String,
    pub trackscore: String,
}

/// Normal shipping against TrackScore at the 100 orders/day baseline.
#[must_use]
pub fn performance_comparison() -> Vec<PerformanceRow> {
    let row = |metric: &str, normal: String, trackscore: String| PerformanceRow {
        metric: metric.to_string(),
        normal,
        trackscore,
    };

    vec![
        row("Breakeven Day", "18 days".to_string(), "14 days".to_string()),
        row(
            "Inventory Required",
            format_inr(NORMAL_INVENTORY),
            format_inr(120_000),
        ),
        row(
            "Net Profit (15 days)",
            format_inr(NORMAL_PROFIT_15_DAYS),
            format_inr(-20_000),
        ),
        row(
            "Net Profit (30 days)",
            format_inr(NORMAL_PROFIT_30_DAYS),
            format_inr(630_000),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_economics() {
        let inputs = FinancialInputs::default();
        assert!((inputs.successful_order_profit() - 290.0).abs() < f64::EPSILON);
        assert!((inputs.failed_order_loss() - 430.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_goal_metrics_at_baseline() {
        let metrics = goal_metrics(100, &FinancialInputs::default());

        assert_eq!(metrics.len(), 4);
        assert_eq!(metrics[0].goal_value, 18);
        assert_eq!(metrics[0].improvement, 0);
        assert_eq!(metrics[1].goal_value, 180_000);
        assert_eq!(metrics[1].improvement, -20_000);
        assert_eq!(metrics[2].goal_value, 75_000);
        assert_eq!(metrics[2].improvement, 155_000);
        assert_eq!(metrics[3].goal_value, 150_000);
        assert_eq!(metrics[3].goal, "₹1.50 L");
    }

    #[test]
    fn test_breakeven_floor() {
        let metrics = goal_metrics(300, &FinancialInputs::default());
        assert_eq!(metrics[0].goal_value, 10);

        let metrics = goal_metrics(5000, &FinancialInputs::default());
        assert_eq!(metrics[0].goal_value, 10);
        assert_eq!(metrics[0].goal, "10 days");
    }

    #[test]
    fn test_orders_per_day_is_clamped() {
        assert_eq!(clamp_orders_per_day(0), 50);
        assert_eq!(clamp_orders_per_day(20_000), 10_000);
        assert_eq!(business_impact(1, &FinancialInputs::default()).orders_per_day, 50);
    }

    #[test]
    fn test_business_impact() {
        let impact = business_impact(100, &FinancialInputs::default());

        assert_eq!(impact.inventory_saved, 36);
        assert_eq!(impact.forward_shipping, 1200);
        assert_eq!(impact.reverse_shipping, 1500);
        assert_eq!(impact.packaging_costs, 375);
        assert_eq!(impact.total_savings, 3075);
    }

    #[test]
    fn test_performance_comparison() {
        let rows = performance_comparison();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[1].normal, "₹2,00,000");
        assert_eq!(rows[2].trackscore, "-₹20,000");
    }
}
