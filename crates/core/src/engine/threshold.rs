//! Threshold projection.
//!
//! Given a quality threshold and the dashboard baselines, projects how many
//! orders ship, the expected delivery rate, and the business metrics of
//! three scenarios: shipping every order, scaling the business on the
//! ship-all baseline, and shipping only what passes the threshold.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::format::format_inr;
use crate::types::{BusinessMetrics, DashboardSettings};

/// Errors produced when constructing a [`Threshold`].
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ThresholdError {
    #[error("threshold must be a finite number")]
    NotFinite,

    #[error("threshold {0} is outside 0..=100")]
    OutOfRange(f64),
}

/// A quality threshold in percent, guaranteed finite and within `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Threshold(f64);

impl Threshold {
    /// Validate a raw threshold.
    ///
    /// # Errors
    ///
    /// Returns `ThresholdError` for NaN, infinities and values outside `0..=100`.
    pub fn new(value: f64) -> Result<Self, ThresholdError> {
        if !value.is_finite() {
            return Err(ThresholdError::NotFinite);
        }
        if !(0.0..=100.0).contains(&value) {
            return Err(ThresholdError::OutOfRange(value));
        }
        Ok(Self(value))
    }

    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }

    /// Whether an order with `score` is flagged at this threshold.
    ///
    /// The threshold is the quality score an order needs to ship, so an 85%
    /// cutoff flags everything scoring below 85. Unscored orders are never
    /// flagged.
    #[must_use]
    pub fn flags(self, score: Option<f64>) -> bool {
        score.is_some_and(|s| s < self.0)
    }
}

impl TryFrom<f64> for Threshold {
    type Error = ThresholdError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Threshold> for f64 {
    fn from(threshold: Threshold) -> Self {
        threshold.0
    }
}

impl std::fmt::Display for Threshold {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Heuristic coefficients of the projection.
///
/// Every TrackScore metric scales linearly with `threshold - reference_threshold`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectionParams {
    pub reference_threshold: f64,
    pub profit_coefficient: f64,
    pub percentage_coefficient: f64,
    pub upfront_coefficient: f64,
    pub efficiency_coefficient: f64,
    pub rto_coefficient: f64,
    /// Order multiplier of the scale-business scenario.
    pub scale_factor: f64,
    /// Thresholds below this raise [`ProjectionWarning::LowVolume`].
    pub low_volume_threshold: f64,
    /// Clamp implausible outputs instead of only reporting them.
    pub clamp_outputs: bool,
}

impl Default for ProjectionParams {
    fn default() -> Self {
        Self {
            reference_threshold: 75.0,
            profit_coefficient: 0.003,
            percentage_coefficient: 0.004,
            upfront_coefficient: 0.005,
            efficiency_coefficient: 0.003,
            rto_coefficient: 0.01,
            scale_factor: 1.5,
            low_volume_threshold: 50.0,
            clamp_outputs: false,
        }
    }
}

/// Round half up, matching the dashboard's rounding (`floor(x + 0.5)`).
#[must_use]
pub fn js_round(x: f64) -> f64 {
    (x + 0.5).floor()
}

/// [`js_round`] into whole units.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn round_to_i64(x: f64) -> i64 {
    js_round(x) as i64
}

/// Round to two decimals.
#[must_use]
pub fn round2(x: f64) -> f64 {
    js_round(x * 100.0) / 100.0
}

/// Round to one decimal.
#[must_use]
pub fn round1(x: f64) -> f64 {
    js_round(x * 10.0) / 10.0
}

#[allow(clippy::cast_precision_loss)]
fn as_f64(n: i64) -> f64 {
    n as f64
}

/// Orders that pass `threshold` out of `total_orders`.
///
/// At least one order ships whenever there are any orders at all.
#[must_use]
pub fn orders_to_ship(threshold: Threshold, total_orders: i64) -> i64 {
    if total_orders <= 0 {
        return 0;
    }
    round_to_i64(threshold.value() / 100.0 * as_f64(total_orders)).clamp(1, total_orders)
}

/// Projected delivery rate at `threshold` from the previous delivery rate.
#[must_use]
pub fn delivery_rate(threshold: Threshold, previous_delivery_rate: f64) -> f64 {
    js_round(
        previous_delivery_rate
            + ((100.0 - threshold.value()) / 100.0) * (100.0 - previous_delivery_rate),
    )
}

/// Metrics of a single scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioMetrics {
    pub orders: i64,
    pub profit: i64,
    pub percentage: f64,
    pub upfront_cost: i64,
    pub capital_efficiency: f64,
    pub rto_rate: f64,
}

/// The three projected scenarios.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenarios {
    pub shipping_all: ScenarioMetrics,
    pub scaling_business: ScenarioMetrics,
    pub trackscore: ScenarioMetrics,
}

/// Direction indicator shown next to a comparison value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonCell {
    pub value: String,
    pub trend: Trend,
    pub highlight: bool,
}

impl ComparisonCell {
    fn plain(value: String, trend: Trend) -> Self {
        Self {
            value,
            trend,
            highlight: false,
        }
    }

    fn highlighted(value: String, trend: Trend) -> Self {
        Self {
            value,
            trend,
            highlight: true,
        }
    }
}

/// Rows of the scenario comparison table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonMetric {
    OrdersPerDay,
    NetProfit,
    NetProfitPercentage,
    UpfrontCost,
    CapitalEfficiency,
    RtoRate,
}

impl ComparisonMetric {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::OrdersPerDay => "Orders/Day",
            Self::NetProfit => "Net Profit",
            Self::NetProfitPercentage => "Net Profit %",
            Self::UpfrontCost => "Upfront Cost",
            Self::CapitalEfficiency => "Capital Efficiency",
            Self::RtoRate => "RTO Rate",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonRow {
    pub metric: ComparisonMetric,
    pub label: String,
    pub shipping_all: ComparisonCell,
    pub scaling_business: ComparisonCell,
    pub trackscore: ComparisonCell,
}

/// Conditions the operator should know about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProjectionWarning {
    /// The threshold ships too few orders to sustain volume.
    LowVolume { threshold: f64, minimum: f64 },
    /// The TrackScore scenario projects a loss.
    NegativeProfit { profit: i64 },
    /// The TrackScore scenario projects negative capital efficiency.
    NegativeCapitalEfficiency { capital_efficiency: f64 },
    /// The TrackScore RTO rate left `0..=100`.
    RtoRateOutOfRange { rto_rate: f64 },
}

impl std::fmt::Display for ProjectionWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LowVolume { threshold, minimum } => write!(
                f,
                "threshold {threshold}% is below {minimum}%: order volume will drop sharply"
            ),
            Self::NegativeProfit { profit } => write!(f, "projected profit is negative ({profit})"),
            Self::NegativeCapitalEfficiency { capital_efficiency } => write!(
                f,
                "projected capital efficiency is negative ({capital_efficiency})"
            ),
            Self::RtoRateOutOfRange { rto_rate } => {
                write!(f, "projected RTO rate {rto_rate}% is outside 0-100")
            }
        }
    }
}

/// Result of [`project`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Projection {
    pub threshold: Threshold,
    pub total_orders: i64,
    pub orders_to_ship: i64,
    pub flagged_orders: i64,
    pub delivery_rate: f64,
    pub previous_delivery_rate: f64,
    pub scenarios: Scenarios,
    pub comparison_rows: Vec<ComparisonRow>,
    pub warnings: Vec<ProjectionWarning>,
}

/// Project the business impact of shipping at `threshold`.
#[must_use]
pub fn project(
    threshold: Threshold,
    settings: &DashboardSettings,
    base: &BusinessMetrics,
    ship_all: &BusinessMetrics,
    params: &ProjectionParams,
) -> Projection {
    let total_orders = settings.total_orders.max(0);
    let to_ship = orders_to_ship(threshold, total_orders);
    let mut warnings = Vec::new();

    if threshold.value() < params.low_volume_threshold {
        warnings.push(ProjectionWarning::LowVolume {
            threshold: threshold.value(),
            minimum: params.low_volume_threshold,
        });
    }

    let d = threshold.value() - params.reference_threshold;
    let mut trackscore = ScenarioMetrics {
        orders: to_ship,
        profit: round_to_i64(as_f64(base.profit) * (1.0 - d * params.profit_coefficient)),
        percentage: js_round(base.percentage * (1.0 - d * params.percentage_coefficient)),
        upfront_cost: round_to_i64(
            as_f64(base.upfront_cost) * (1.0 + d * params.upfront_coefficient),
        ),
        capital_efficiency: round2(
            base.capital_efficiency * (1.0 - d * params.efficiency_coefficient),
        ),
        rto_rate: js_round(base.rto_rate * (1.0 + d * params.rto_coefficient)),
    };
    check_plausibility(&mut trackscore, params.clamp_outputs, &mut warnings);

    let shipping_all = ScenarioMetrics {
        orders: total_orders,
        profit: ship_all.profit,
        percentage: ship_all.percentage,
        upfront_cost: ship_all.upfront_cost,
        capital_efficiency: ship_all.capital_efficiency,
        rto_rate: ship_all.rto_rate,
    };

    #[allow(clippy::cast_possible_truncation)]
    let scaled_orders = (as_f64(total_orders) * params.scale_factor).ceil() as i64;
    let scaling_business = ScenarioMetrics {
        orders: scaled_orders,
        profit: trackscore.profit,
        percentage: ship_all.percentage,
        upfront_cost: round_to_i64(as_f64(ship_all.upfront_cost) * params.scale_factor),
        capital_efficiency: ship_all.capital_efficiency,
        rto_rate: ship_all.rto_rate,
    };

    let scenarios = Scenarios {
        shipping_all,
        scaling_business,
        trackscore,
    };
    let comparison_rows = comparison_rows(&scenarios);

    Projection {
        threshold,
        total_orders,
        orders_to_ship: to_ship,
        flagged_orders: total_orders - to_ship,
        delivery_rate: delivery_rate(threshold, settings.previous_delivery_rate),
        previous_delivery_rate: settings.previous_delivery_rate,
        scenarios,
        comparison_rows,
        warnings,
    }
}

fn check_plausibility(
    metrics: &mut ScenarioMetrics,
    clamp: bool,
    warnings: &mut Vec<ProjectionWarning>,
) {
    if metrics.profit < 0 {
        warnings.push(ProjectionWarning::NegativeProfit {
            profit: metrics.profit,
        });
        if clamp {
            metrics.profit = 0;
            metrics.percentage = metrics.percentage.max(0.0);
        }
    }
    if metrics.capital_efficiency < 0.0 {
        warnings.push(ProjectionWarning::NegativeCapitalEfficiency {
            capital_efficiency: metrics.capital_efficiency,
        });
        if clamp {
            metrics.capital_efficiency = 0.0;
        }
    }
    if !(0.0..=100.0).contains(&metrics.rto_rate) {
        warnings.push(ProjectionWarning::RtoRateOutOfRange {
            rto_rate: metrics.rto_rate,
        });
        if clamp {
            metrics.rto_rate = metrics.rto_rate.clamp(0.0, 100.0);
        }
    }
}

fn comparison_rows(s: &Scenarios) -> Vec<ComparisonRow> {
    use ComparisonMetric as M;
    use Trend::{Down, Neutral, Up};

    let row = |metric: M,
               fmt: &dyn Fn(&ScenarioMetrics) -> String,
               trends: [Trend; 3]| ComparisonRow {
        metric,
        label: metric.label().to_string(),
        shipping_all: ComparisonCell::plain(fmt(&s.shipping_all), trends[0]),
        scaling_business: ComparisonCell::plain(fmt(&s.scaling_business), trends[1]),
        trackscore: ComparisonCell::highlighted(fmt(&s.trackscore), trends[2]),
    };

    vec![
        row(M::OrdersPerDay, &|m: &ScenarioMetrics| m.orders.to_string(), [Neutral, Up, Down]),
        row(M::NetProfit, &|m: &ScenarioMetrics| format_inr(m.profit), [Neutral, Up, Up]),
        row(
            M::NetProfitPercentage,
            &|m: &ScenarioMetrics| format!("{}%", m.percentage),
            [Neutral, Neutral, Up],
        ),
        row(M::UpfrontCost, &|m: &ScenarioMetrics| format_inr(m.upfront_cost), [Neutral, Up, Down]),
        row(
            M::CapitalEfficiency,
            &|m: &ScenarioMetrics| format!("{}x", m.capital_efficiency),
            [Neutral, Neutral, Up],
        ),
        row(M::RtoRate, &|m: &ScenarioMetrics| format!("{}%", m.rto_rate), [Neutral, Neutral, Down]),
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::MetricsKind;

    fn fixture() -> (DashboardSettings, BusinessMetrics, BusinessMetrics) {
        (
            DashboardSettings::default(),
            BusinessMetrics::seed(MetricsKind::Base),
            BusinessMetrics::seed(MetricsKind::ShipAll),
        )
    }

    #[test]
    fn test_quality_score_flags() {
        let t = Threshold::new(85.0).unwrap();
        assert!(t.flags(Some(50.0)));
        assert!(t.flags(Some(84.9)));
        assert!(!t.flags(Some(85.0)));
        assert!(!t.flags(Some(97.0)));
        assert!(!t.flags(None));

        // A looser cutoff flags fewer orders
        assert!(!Threshold::new(50.0).unwrap().flags(Some(60.0)));
    }

    fn run(threshold: f64, settings: &DashboardSettings) -> Projection {
        let (_, base, ship_all) = fixture();
        project(
            Threshold::new(threshold).unwrap(),
            settings,
            &base,
            &ship_all,
            &ProjectionParams::default(),
        )
    }

    #[test]
    fn test_threshold_rejects_invalid() {
        assert_eq!(Threshold::new(f64::NAN), Err(ThresholdError::NotFinite));
        assert_eq!(Threshold::new(f64::INFINITY), Err(ThresholdError::NotFinite));
        assert_eq!(Threshold::new(-1.0), Err(ThresholdError::OutOfRange(-1.0)));
        assert_eq!(Threshold::new(100.5), Err(ThresholdError::OutOfRange(100.5)));
        assert!(Threshold::new(0.0).is_ok());
        assert!(Threshold::new(100.0).is_ok());
    }

    #[test]
    fn test_threshold_deserialize_validates() {
        assert!(serde_json::from_str::<Threshold>("42.5").is_ok());
        assert!(serde_json::from_str::<Threshold>("142").is_err());
    }

    #[test]
    fn test_js_round_half_up() {
        assert!((js_round(2.5) - 3.0).abs() < f64::EPSILON);
        assert!((js_round(-2.5) - -2.0).abs() < f64::EPSILON);
        assert!((round2(1.434_9) - 1.43).abs() < 1e-9);
    }

    #[test]
    fn test_reference_scenario() {
        let settings = DashboardSettings {
            total_orders: 156,
            previous_delivery_rate: 56.0,
            ..DashboardSettings::default()
        };
        let p = run(75.0, &settings);

        assert_eq!(p.orders_to_ship, 117);
        assert_eq!(p.flagged_orders, 39);
        assert!((p.delivery_rate - 67.0).abs() < f64::EPSILON);
        assert!(p.warnings.is_empty());
    }

    #[test]
    fn test_reference_threshold_keeps_base_metrics() {
        let (settings, base, _) = fixture();
        let p = run(75.0, &settings);

        assert_eq!(p.scenarios.trackscore.profit, base.profit);
        assert_eq!(p.scenarios.trackscore.upfront_cost, base.upfront_cost);
        assert!((p.scenarios.trackscore.capital_efficiency - base.capital_efficiency).abs() < 1e-9);
    }

    #[test]
    fn test_partition_holds_for_every_threshold() {
        for total in [0_i64, 1, 2, 7, 156, 1000] {
            let settings = DashboardSettings {
                total_orders: total,
                ..DashboardSettings::default()
            };
            for step in 0..=200 {
                let threshold = f64::from(step) / 2.0;
                let p = run(threshold, &settings);
                assert_eq!(p.orders_to_ship + p.flagged_orders, total, "t={threshold}");
                assert!(p.flagged_orders >= 0);
                if total >= 1 {
                    assert!(p.orders_to_ship >= 1, "t={threshold} total={total}");
                } else {
                    assert_eq!(p.orders_to_ship, 0);
                }
            }
        }
    }

    #[test]
    fn test_zero_threshold_ships_one_at_full_delivery() {
        let (settings, _, _) = fixture();
        let p = run(0.0, &settings);

        assert_eq!(p.orders_to_ship, 1);
        assert_eq!(p.flagged_orders, 155);
        assert!((p.delivery_rate - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_low_volume_warning() {
        let (settings, _, _) = fixture();
        assert!(matches!(
            run(49.0, &settings).warnings.as_slice(),
            [ProjectionWarning::LowVolume { .. }]
        ));
        assert!(run(50.0, &settings).warnings.is_empty());
    }

    #[test]
    fn test_scale_business_scenario() {
        let (settings, _, ship_all) = fixture();
        let p = run(80.0, &settings);

        assert_eq!(p.scenarios.scaling_business.orders, 234);
        assert_eq!(
            p.scenarios.scaling_business.upfront_cost,
            round_to_i64(24_520.0 * 1.5)
        );
        assert_eq!(p.scenarios.scaling_business.profit, p.scenarios.trackscore.profit);
        assert_eq!(p.scenarios.shipping_all.profit, ship_all.profit);
    }

    #[test]
    fn test_comparison_rows() {
        let (settings, _, _) = fixture();
        let p = run(75.0, &settings);

        assert_eq!(p.comparison_rows.len(), 6);
        let profit = &p.comparison_rows[1];
        assert_eq!(profit.metric, ComparisonMetric::NetProfit);
        assert_eq!(profit.trackscore.value, "₹9,320");
        assert!(profit.trackscore.highlight);
        assert!(!profit.shipping_all.highlight);
        assert_eq!(profit.shipping_all.trend, Trend::Neutral);

        let efficiency = &p.comparison_rows[4];
        assert_eq!(efficiency.trackscore.value, "1.43x");
    }

    #[test]
    fn test_implausible_outputs_warn_then_clamp() {
        let (settings, base, ship_all) = fixture();
        let mut params = ProjectionParams {
            profit_coefficient: 0.1,
            rto_coefficient: 1.0,
            ..ProjectionParams::default()
        };
        let threshold = Threshold::new(100.0).unwrap();

        let p = project(threshold, &settings, &base, &ship_all, &params);
        assert!(p.scenarios.trackscore.profit < 0);
        assert!(p.scenarios.trackscore.rto_rate > 100.0);
        assert!(p.warnings.iter().any(|w| matches!(w, ProjectionWarning::NegativeProfit { .. })));
        assert!(p.warnings.iter().any(|w| matches!(w, ProjectionWarning::RtoRateOutOfRange { .. })));

        params.clamp_outputs = true;
        let p = project(threshold, &settings, &base, &ship_all, &params);
        assert_eq!(p.scenarios.trackscore.profit, 0);
        assert!((p.scenarios.trackscore.rto_rate - 100.0).abs() < f64::EPSILON);
        assert_eq!(p.warnings.len(), 2);
    }
}
