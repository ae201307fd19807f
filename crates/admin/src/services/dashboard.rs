//! Dashboard assembly.
//!
//! Reads the stored dashboard records and runs them through the projection
//! engine. Records that were never seeded fall back to their defaults so a
//! fresh database still renders.

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::PgPool;
use tracing::instrument;
use trackscore_core::cutoff::{CutoffMode, CutoffModeView, FALLBACK_THRESHOLD};
use trackscore_core::engine::{
    self, BusinessImpact, FinancialInputs, GoalMetric, PnlBreakdown, Projection,
    ProjectionParams, Threshold,
};
use trackscore_core::engine::cashflow::{PerformanceRow, performance_comparison};
use trackscore_core::{BusinessMetrics, DashboardCosts, DashboardSettings, MetricsKind};

use crate::db::{CancelRequestRepository, CutoffModeRepository, DashboardRepository, RepositoryError};

/// The stored inputs of every projection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub settings: DashboardSettings,
    pub costs: DashboardCosts,
    pub base_metrics: BusinessMetrics,
    pub ship_all_metrics: BusinessMetrics,
}

impl Default for DashboardData {
    fn default() -> Self {
        Self {
            settings: DashboardSettings::default(),
            costs: DashboardCosts::default(),
            base_metrics: BusinessMetrics::seed(MetricsKind::Base),
            ship_all_metrics: BusinessMetrics::seed(MetricsKind::ShipAll),
        }
    }
}

impl DashboardData {
    /// Load the dashboard records, using defaults for missing rows.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    #[instrument(skip(pool))]
    pub async fn load(pool: &PgPool) -> Result<Self, RepositoryError> {
        let repo = DashboardRepository::new(pool);

        let settings = repo.settings().await?;
        let costs = repo.costs().await?;
        let base_metrics = repo.metrics(MetricsKind::Base).await?;
        let ship_all_metrics = repo.metrics(MetricsKind::ShipAll).await?;

        if settings.is_none()
            || costs.is_none()
            || base_metrics.is_none()
            || ship_all_metrics.is_none()
        {
            tracing::warn!("Dashboard data is not fully seeded, using defaults");
        }

        Ok(Self {
            settings: settings.unwrap_or_default(),
            costs: costs.unwrap_or_default(),
            base_metrics: base_metrics
                .unwrap_or_else(|| BusinessMetrics::seed(MetricsKind::Base)),
            ship_all_metrics: ship_all_metrics
                .unwrap_or_else(|| BusinessMetrics::seed(MetricsKind::ShipAll)),
        })
    }

    /// Project the dashboard at `threshold`.
    #[must_use]
    pub fn project(&self, threshold: Threshold, params: &ProjectionParams) -> Projection {
        engine::project(
            threshold,
            &self.settings,
            &self.base_metrics,
            &self.ship_all_metrics,
            params,
        )
    }

    /// Projection at `threshold` together with its P&L breakdown.
    #[must_use]
    pub fn report(&self, threshold: Threshold, params: &ProjectionParams) -> ProjectionReport {
        let projection = self.project(threshold, params);
        let pnl = engine::breakdown(
            &projection.scenarios,
            &self.costs,
            self.settings.average_order_price_or_default(),
        );
        ProjectionReport { projection, pnl }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionReport {
    pub projection: Projection,
    pub pnl: PnlBreakdown,
}

/// Everything the dashboard page shows on load.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardOverview {
    #[serde(flatten)]
    pub data: DashboardData,
    pub modes: Vec<CutoffModeView>,
    pub active_mode: Option<CutoffMode>,
    pub projection: Projection,
    pub monthly_savings: i64,
    /// Flagged orders waiting in the cancel-request queue.
    pub pending_cancellations: i64,
}

/// Goal metrics and daily business impact at an orders-per-day goal.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalReport {
    pub orders_per_day: i64,
    pub metrics: Vec<GoalMetric>,
    pub impact: BusinessImpact,
}

/// The threshold the dashboard runs at.
///
/// The active mode wins; without one the settings' initial threshold is
/// used, and an invalid initial threshold falls back to the default.
///
/// # Errors
///
/// Returns `RepositoryError::DataCorruption` if the active mode stores an
/// out-of-range threshold.
pub fn active_threshold(
    active: Option<&CutoffMode>,
    settings: &DashboardSettings,
) -> Result<Threshold, RepositoryError> {
    if let Some(mode) = active {
        return mode
            .threshold()
            .map_err(|e| RepositoryError::DataCorruption(format!("mode {}: {e}", mode.mode_id)));
    }

    Threshold::new(settings.initial_threshold)
        .or_else(|_| Threshold::new(FALLBACK_THRESHOLD))
        .map_err(|e| RepositoryError::DataCorruption(e.to_string()))
}

/// Build the dashboard overview for `today`.
///
/// # Errors
///
/// Returns `RepositoryError` if loading any dashboard record fails.
#[instrument(skip(pool, params))]
pub async fn overview(
    pool: &PgPool,
    params: &ProjectionParams,
    today: NaiveDate,
) -> Result<DashboardOverview, RepositoryError> {
    let data = DashboardData::load(pool).await?;

    let modes_repo = CutoffModeRepository::new(pool);
    let modes = modes_repo.list().await?;
    let active_mode = modes.iter().find(|m| m.is_active).map(|m| m.mode.clone());

    let threshold = active_threshold(active_mode.as_ref(), &data.settings)?;
    let projection = data.project(threshold, params);
    let monthly_savings = engine::monthly_savings(data.settings.daily_savings, today);
    let pending_cancellations = CancelRequestRepository::new(pool).count().await?;

    Ok(DashboardOverview {
        data,
        modes,
        active_mode,
        projection,
        monthly_savings,
        pending_cancellations,
    })
}

/// Goal metrics for `orders_per_day`, clamped to the supported range.
#[must_use]
pub fn goal_report(orders_per_day: i64, inputs: &FinancialInputs) -> GoalReport {
    let impact = engine::business_impact(orders_per_day, inputs);
    GoalReport {
        orders_per_day: impact.orders_per_day,
        metrics: engine::goal_metrics(impact.orders_per_day, inputs),
        impact,
    }
}

/// Normal shipping against TrackScore.
#[must_use]
pub fn performance() -> Vec<PerformanceRow> {
    performance_comparison()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use trackscore_core::cutoff::default_modes;

    #[test]
    fn test_active_mode_threshold_wins() {
        let settings = DashboardSettings::default();
        let strict = default_modes()
            .into_iter()
            .max_by(|a, b| a.threshold.total_cmp(&b.threshold))
            .unwrap();

        let threshold = active_threshold(Some(&strict), &settings).unwrap();
        assert!((threshold.value() - strict.threshold).abs() < f64::EPSILON);
    }

    #[test]
    fn test_threshold_falls_back_without_active_mode() {
        let mut settings = DashboardSettings {
            initial_threshold: 60.0,
            ..DashboardSettings::default()
        };
        assert!((active_threshold(None, &settings).unwrap().value() - 60.0).abs() < f64::EPSILON);

        settings.initial_threshold = 140.0;
        let threshold = active_threshold(None, &settings).unwrap();
        assert!((threshold.value() - FALLBACK_THRESHOLD).abs() < f64::EPSILON);
    }

    #[test]
    fn test_corrupt_active_mode_is_reported() {
        let mode = CutoffMode {
            mode_id: "broken".to_string(),
            name: "Broken".to_string(),
            description: String::new(),
            threshold: f64::NAN,
        };
        let err = active_threshold(Some(&mode), &DashboardSettings::default()).unwrap_err();
        assert!(matches!(err, RepositoryError::DataCorruption(_)));
    }

    #[test]
    fn test_report_at_seed_threshold() {
        let data = DashboardData::default();
        let report = data.report(Threshold::new(75.0).unwrap(), &ProjectionParams::default());

        assert_eq!(report.projection.orders_to_ship, 117);
        assert_eq!(report.projection.flagged_orders, 39);
        assert_eq!(report.pnl.average_order_price, 2000);
    }

    #[test]
    fn test_goal_report_clamps_volume() {
        let report = goal_report(10, &FinancialInputs::default());
        assert_eq!(report.orders_per_day, 50);
        assert_eq!(report.impact.orders_per_day, 50);
        assert!(!report.metrics.is_empty());
    }
}
