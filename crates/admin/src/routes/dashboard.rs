//! Dashboard route handlers.

use axum::{
    Form, Json, Router,
    extract::{Path, Query, State},
    routing::{get, post, put},
};
use chrono::Utc;
use serde::Deserialize;
use tracing::instrument;
use trackscore_core::engine::cashflow::{DEFAULT_ORDERS_PER_DAY, PerformanceRow};
use trackscore_core::engine::{FinancialInputs, Threshold};
use trackscore_core::{BusinessMetrics, DashboardCosts, DashboardSettings, MetricsKind};

use crate::db::cutoff_modes::Activation;
use crate::db::{CutoffModeRepository, DashboardRepository, RepositoryError};
use crate::error::AppError;
use crate::services::dashboard::{self, DashboardData, DashboardOverview, GoalReport, ProjectionReport};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/dashboard", get(overview))
        .route("/api/dashboard/projection", get(projection))
        .route("/api/dashboard/goal", get(goal))
        .route("/api/dashboard/performance", get(performance))
        .route("/api/dashboard/settings", put(update_settings))
        .route("/api/dashboard/costs", put(update_costs))
        .route("/api/dashboard/metrics/{kind}", put(update_metrics))
        .route("/dashboard/mode", post(activate_mode))
}

// =============================================================================
// Input Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ProjectionQuery {
    /// Defaults to the active mode's threshold.
    pub threshold: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct GoalQuery {
    pub orders_per_day: Option<i64>,
}

/// Form posted by the cutoff mode selector.
#[derive(Debug, Deserialize)]
pub struct ModeForm {
    pub mode: String,
    /// The mode the client saw as active; a mismatch is a conflict.
    pub expected: Option<String>,
}

/// Baseline metrics for the kind named in the path.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsUpdate {
    pub profit: i64,
    pub percentage: f64,
    pub upfront_cost: i64,
    pub capital_efficiency: f64,
    pub rto_rate: f64,
}

// =============================================================================
// Handlers
// =============================================================================

#[instrument(skip(state))]
async fn overview(State(state): State<AppState>) -> Result<Json<DashboardOverview>, AppError> {
    let overview = dashboard::overview(
        state.pool(),
        &state.config().projection,
        Utc::now().date_naive(),
    )
    .await?;
    Ok(Json(overview))
}

#[instrument(skip(state))]
async fn projection(
    State(state): State<AppState>,
    Query(query): Query<ProjectionQuery>,
) -> Result<Json<ProjectionReport>, AppError> {
    let data = DashboardData::load(state.pool()).await?;

    let threshold = match query.threshold {
        Some(value) => Threshold::new(value)?,
        None => {
            let active = CutoffModeRepository::new(state.pool()).active().await?;
            dashboard::active_threshold(active.as_ref(), &data.settings)?
        }
    };

    Ok(Json(data.report(threshold, &state.config().projection)))
}

#[instrument]
async fn goal(Query(query): Query<GoalQuery>) -> Json<GoalReport> {
    let orders_per_day = query.orders_per_day.unwrap_or(DEFAULT_ORDERS_PER_DAY);
    Json(dashboard::goal_report(orders_per_day, &FinancialInputs::default()))
}

async fn performance() -> Json<Vec<PerformanceRow>> {
    Json(dashboard::performance())
}

#[instrument(skip(state))]
async fn activate_mode(
    State(state): State<AppState>,
    Form(form): Form<ModeForm>,
) -> Result<Json<Activation>, AppError> {
    let mode = form.mode.trim();
    if mode.is_empty() {
        return Err(AppError::BadRequest("mode is required".into()));
    }
    let expected = form
        .expected
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let activation = CutoffModeRepository::new(state.pool())
        .activate(mode, expected)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound(format!("cutoff mode {mode}")),
            RepositoryError::Conflict(message) => AppError::Conflict(message),
            other => AppError::Database(other),
        })?;

    Ok(Json(activation))
}

#[instrument(skip(state))]
async fn update_settings(
    State(state): State<AppState>,
    Json(settings): Json<DashboardSettings>,
) -> Result<Json<DashboardSettings>, AppError> {
    Threshold::new(settings.initial_threshold)?;
    if settings.total_orders < 0 || settings.flagged_orders < 0 || settings.orders_to_ship < 0 {
        return Err(AppError::BadRequest("order counts must not be negative".into()));
    }
    if settings.average_order_price.is_some_and(|p| p <= 0) {
        return Err(AppError::BadRequest("average order price must be positive".into()));
    }

    DashboardRepository::new(state.pool())
        .update_settings(&settings)
        .await?;
    Ok(Json(settings))
}

#[instrument(skip(state))]
async fn update_costs(
    State(state): State<AppState>,
    Json(costs): Json<DashboardCosts>,
) -> Result<Json<DashboardCosts>, AppError> {
    let values = [
        costs.forward_shipping,
        costs.reverse_shipping,
        costs.packaging,
        costs.storage,
        costs.average_storage_days,
        costs.inventory_cost_per_order,
        costs.marketing_cost_per_order,
        costs.operations_cost_per_order,
    ];
    if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
        return Err(AppError::BadRequest("costs must be non-negative numbers".into()));
    }

    DashboardRepository::new(state.pool())
        .update_costs(&costs)
        .await?;
    Ok(Json(costs))
}

#[instrument(skip(state))]
async fn update_metrics(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Json(update): Json<MetricsUpdate>,
) -> Result<Json<BusinessMetrics>, AppError> {
    let kind: MetricsKind = kind.parse().map_err(AppError::BadRequest)?;
    if !(0.0..=100.0).contains(&update.rto_rate) {
        return Err(AppError::BadRequest("rtoRate must be between 0 and 100".into()));
    }

    let metrics = BusinessMetrics {
        kind,
        profit: update.profit,
        percentage: update.percentage,
        upfront_cost: update.upfront_cost,
        capital_efficiency: update.capital_efficiency,
        rto_rate: update.rto_rate,
    };

    DashboardRepository::new(state.pool())
        .update_metrics(&metrics)
        .await?;
    Ok(Json(metrics))
}
