//! Pure projection engine.
//!
//! Everything here is a function of its inputs: no clock, no I/O. Callers
//! pass "today" explicitly where a calendar is involved.

pub mod cashflow;
pub mod format;
pub mod pnl;
pub mod threshold;

use chrono::{Datelike, NaiveDate};

pub use cashflow::{BusinessImpact, FinancialInputs, GoalMetric, business_impact, goal_metrics};
pub use format::{format_inr, format_inr_compact};
pub use pnl::{PnlBreakdown, breakdown};
pub use threshold::{
    Projection, ProjectionParams, ProjectionWarning, Threshold, ThresholdError, project,
};

/// Savings accumulated so far this month at `daily_savings` per day.
#[must_use]
pub fn monthly_savings(daily_savings: i64, today: NaiveDate) -> i64 {
    daily_savings.saturating_mul(i64::from(today.day()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_monthly_savings_uses_day_of_month() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 17).unwrap();
        assert_eq!(monthly_savings(4680, date), 79_560);

        let first = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert_eq!(monthly_savings(4680, first), 4680);
    }
}
