//! Seed the dashboard with its default data.
//!
//! Inserts the dashboard settings, the cost catalogue, both baseline metric
//! rows and the three cutoff modes. Rows that already exist are left alone,
//! so the command can be re-run safely.

use trackscore_admin::db::{CutoffModeRepository, DashboardRepository};
use trackscore_core::cutoff::default_modes;
use trackscore_core::{BusinessMetrics, DashboardCosts, DashboardSettings, MetricsKind};

use super::{CommandError, connect};

/// Seed default dashboard data and cutoff modes.
///
/// # Errors
///
/// Returns an error if the database is unreachable or an insert fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    let metrics = [
        BusinessMetrics::seed(MetricsKind::Base),
        BusinessMetrics::seed(MetricsKind::ShipAll),
    ];
    let summary = DashboardRepository::new(&pool)
        .seed(
            &DashboardSettings::default(),
            &DashboardCosts::default(),
            &metrics,
        )
        .await?;

    let modes = CutoffModeRepository::new(&pool)
        .seed(&default_modes())
        .await?;

    tracing::info!("Seeding complete!");
    tracing::info!("  Settings inserted: {}", summary.settings);
    tracing::info!("  Costs inserted: {}", summary.costs);
    tracing::info!("  Metric rows inserted: {}", summary.metrics);
    tracing::info!("  Cutoff modes inserted: {modes}");

    Ok(())
}
