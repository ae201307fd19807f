//! Profit and loss breakdown per scenario.

use serde::{Deserialize, Serialize};

use super::threshold::{ScenarioMetrics, Scenarios, round_to_i64, round1};
use crate::types::DashboardCosts;

/// One cost line and its share of revenue.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostLine {
    pub amount: f64,
    /// Percent of revenue, one decimal.
    pub percent_of_revenue: f64,
}

impl CostLine {
    fn new(amount: f64, revenue: f64) -> Self {
        Self {
            amount,
            percent_of_revenue: percent_of(amount, revenue),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedCosts {
    pub inventory: CostLine,
    pub forward_shipping: CostLine,
    /// Reverse shipping is charged on returned orders only.
    pub reverse_shipping: CostLine,
    pub packaging: CostLine,
    pub storage: CostLine,
    pub marketing: CostLine,
    pub operations: CostLine,
    pub total: CostLine,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioPnl {
    pub revenue: i64,
    pub orders: i64,
    pub rto_count: i64,
    pub rto_rate: f64,
    pub costs: DetailedCosts,
    pub total_costs: i64,
    pub profit: i64,
    pub profit_margin: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PnlBreakdown {
    pub average_order_price: i64,
    pub shipping_all: ScenarioPnl,
    pub scaling_business: ScenarioPnl,
    pub trackscore: ScenarioPnl,
}

fn percent_of(part: f64, whole: f64) -> f64 {
    if whole.abs() < f64::EPSILON {
        0.0
    } else {
        round1(part / whole * 100.0)
    }
}

#[allow(clippy::cast_precision_loss)]
fn scenario_pnl(metrics: &ScenarioMetrics, costs: &DashboardCosts, price: i64) -> ScenarioPnl {
    let orders = metrics.orders as f64;
    let revenue = metrics.orders.saturating_mul(price);
    let revenue_f = revenue as f64;
    let rto_count = round_to_i64(orders * metrics.rto_rate / 100.0);

    let inventory = orders * costs.inventory_cost_per_order;
    let forward = orders * costs.forward_shipping;
    let reverse = rto_count as f64 * costs.reverse_shipping;
    let packaging = orders * costs.packaging;
    let storage = orders * costs.storage * costs.average_storage_days;
    let marketing = orders * costs.marketing_cost_per_order;
    let operations = orders * costs.operations_cost_per_order;
    let total = inventory + forward + reverse + packaging + storage + marketing + operations;

    ScenarioPnl {
        revenue,
        orders: metrics.orders,
        rto_count,
        rto_rate: metrics.rto_rate,
        costs: DetailedCosts {
            inventory: CostLine::new(inventory, revenue_f),
            forward_shipping: CostLine::new(forward, revenue_f),
            reverse_shipping: CostLine::new(reverse, revenue_f),
            packaging: CostLine::new(packaging, revenue_f),
            storage: CostLine::new(storage, revenue_f),
            marketing: CostLine::new(marketing, revenue_f),
            operations: CostLine::new(operations, revenue_f),
            total: CostLine::new(total, revenue_f),
        },
        total_costs: revenue.saturating_sub(metrics.profit),
        profit: metrics.profit,
        profit_margin: percent_of(metrics.profit as f64, revenue_f),
    }
}

/// Break each projected scenario down into revenue and cost lines.
#[must_use]
pub fn breakdown(
    scenarios: &Scenarios,
    costs: &DashboardCosts,
    average_order_price: i64,
) -> PnlBreakdown {
    PnlBreakdown {
        average_order_price,
        shipping_all: scenario_pnl(&scenarios.shipping_all, costs, average_order_price),
        scaling_business: scenario_pnl(&scenarios.scaling_business, costs, average_order_price),
        trackscore: scenario_pnl(&scenarios.trackscore, costs, average_order_price),
    }
}
