//! Dashboard settings, cost catalogue and baseline metrics.

use sqlx::PgPool;
use tracing::instrument;
use trackscore_core::{BusinessMetrics, DashboardCosts, DashboardSettings, MetricsKind};

use super::RepositoryError;

/// Rows created by [`DashboardRepository::seed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeedSummary {
    pub settings: bool,
    pub costs: bool,
    pub metrics: u64,
}

/// Repository for the single-row dashboard tables.
pub struct DashboardRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DashboardRepository<'a> {
    /// Create a new dashboard repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn settings(&self) -> Result<Option<DashboardSettings>, RepositoryError> {
        let settings = sqlx::query_as::<_, DashboardSettings>(
            r"
            SELECT initial_threshold, total_orders, flagged_orders, orders_to_ship,
                   delivery_rate, previous_delivery_rate, daily_savings, average_order_price
            FROM trackscore.dashboard_settings
            WHERE id = 1
            ",
        )
        .fetch_optional(self.pool)
        .await?;

        Ok(settings)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn costs(&self) -> Result<Option<DashboardCosts>, RepositoryError> {
        let costs = sqlx::query_as::<_, DashboardCosts>(
            r"
            SELECT forward_shipping, reverse_shipping, packaging, storage,
                   average_storage_days, inventory_cost_per_order,
                   marketing_cost_per_order, operations_cost_per_order
            FROM trackscore.dashboard_costs
            WHERE id = 1
            ",
        )
        .fetch_optional(self.pool)
        .await?;

        Ok(costs)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn metrics(&self, kind: MetricsKind) -> Result<Option<BusinessMetrics>, RepositoryError> {
        let metrics = sqlx::query_as::<_, BusinessMetrics>(
            r"
            SELECT kind, profit, percentage, upfront_cost, capital_efficiency, rto_rate
            FROM trackscore.business_metrics
            WHERE kind = $1
            ",
        )
        .bind(kind)
        .fetch_optional(self.pool)
        .await?;

        Ok(metrics)
    }

    /// Replace the dashboard settings.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, settings))]
    pub async fn update_settings(&self, settings: &DashboardSettings) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO trackscore.dashboard_settings (
                id, initial_threshold, total_orders, flagged_orders, orders_to_ship,
                delivery_rate, previous_delivery_rate, daily_savings, average_order_price
            )
            VALUES (1, $1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE SET
                initial_threshold = EXCLUDED.initial_threshold,
                total_orders = EXCLUDED.total_orders,
                flagged_orders = EXCLUDED.flagged_orders,
                orders_to_ship = EXCLUDED.orders_to_ship,
                delivery_rate = EXCLUDED.delivery_rate,
                previous_delivery_rate = EXCLUDED.previous_delivery_rate,
                daily_savings = EXCLUDED.daily_savings,
                average_order_price = EXCLUDED.average_order_price,
                updated_at = NOW()
            ",
        )
        .bind(settings.initial_threshold)
        .bind(settings.total_orders)
        .bind(settings.flagged_orders)
        .bind(settings.orders_to_ship)
        .bind(settings.delivery_rate)
        .bind(settings.previous_delivery_rate)
        .bind(settings.daily_savings)
        .bind(settings.average_order_price)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Replace the cost catalogue.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, costs))]
    pub async fn update_costs(&self, costs: &DashboardCosts) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO trackscore.dashboard_costs (
                id, forward_shipping, reverse_shipping, packaging, storage,
                average_storage_days, inventory_cost_per_order,
                marketing_cost_per_order, operations_cost_per_order
            )
            VALUES (1, $1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE SET
                forward_shipping = EXCLUDED.forward_shipping,
                reverse_shipping = EXCLUDED.reverse_shipping,
                packaging = EXCLUDED.packaging,
                storage = EXCLUDED.storage,
                average_storage_days = EXCLUDED.average_storage_days,
                inventory_cost_per_order = EXCLUDED.inventory_cost_per_order,
                marketing_cost_per_order = EXCLUDED.marketing_cost_per_order,
                operations_cost_per_order = EXCLUDED.operations_cost_per_order,
                updated_at = NOW()
            ",
        )
        .bind(costs.forward_shipping)
        .bind(costs.reverse_shipping)
        .bind(costs.packaging)
        .bind(costs.storage)
        .bind(costs.average_storage_days)
        .bind(costs.inventory_cost_per_order)
        .bind(costs.marketing_cost_per_order)
        .bind(costs.operations_cost_per_order)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Replace the metrics of `metrics.kind`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, metrics), fields(kind = %metrics.kind))]
    pub async fn update_metrics(&self, metrics: &BusinessMetrics) -> Result<(), RepositoryError> {
        upsert_metrics(self.pool, metrics, true).await?;
        Ok(())
    }

    /// Insert the seed rows that are missing. Existing rows are kept.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn seed(
        &self,
        settings: &DashboardSettings,
        costs: &DashboardCosts,
        metrics: &[BusinessMetrics],
    ) -> Result<SeedSummary, RepositoryError> {
        let mut summary = SeedSummary::default();

        if self.settings().await?.is_none() {
            self.update_settings(settings).await?;
            summary.settings = true;
        }
        if self.costs().await?.is_none() {
            self.update_costs(costs).await?;
            summary.costs = true;
        }
        for m in metrics {
            summary.metrics += upsert_metrics(self.pool, m, false).await?;
        }

        Ok(summary)
    }
}

async fn upsert_metrics(
    pool: &PgPool,
    metrics: &BusinessMetrics,
    overwrite: bool,
) -> Result<u64, RepositoryError> {
    let sql = if overwrite {
        r"
        INSERT INTO trackscore.business_metrics
            (kind, profit, percentage, upfront_cost, capital_efficiency, rto_rate)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (kind) DO UPDATE SET
            profit = EXCLUDED.profit,
            percentage = EXCLUDED.percentage,
            upfront_cost = EXCLUDED.upfront_cost,
            capital_efficiency = EXCLUDED.capital_efficiency,
            rto_rate = EXCLUDED.rto_rate,
            updated_at = NOW()
        "
    } else {
        r"
        INSERT INTO trackscore.business_metrics
            (kind, profit, percentage, upfront_cost, capital_efficiency, rto_rate)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (kind) DO NOTHING
        "
    };

    let result = sqlx::query(sql)
        .bind(metrics.kind)
        .bind(metrics.profit)
        .bind(metrics.percentage)
        .bind(metrics.upfront_cost)
        .bind(metrics.capital_efficiency)
        .bind(metrics.rto_rate)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
