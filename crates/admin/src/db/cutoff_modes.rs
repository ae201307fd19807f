//! Cutoff mode persistence.
//!
//! The active mode lives in the single-row `active_cutoff_mode` table, so a
//! mode list read from here always has exactly one active entry once seeded.

use serde::Serialize;
use sqlx::PgPool;
use tracing::instrument;
use trackscore_core::cutoff::{CutoffMode, CutoffModeView, DEFAULT_ACTIVE_MODE};

use super::RepositoryError;
use super::orders::{FlagSummary, apply_threshold_in};

#[derive(sqlx::FromRow)]
struct CutoffModeRow {
    mode_id: String,
    name: String,
    description: String,
    threshold: f64,
    is_active: bool,
}

impl From<CutoffModeRow> for CutoffModeView {
    fn from(row: CutoffModeRow) -> Self {
        Self {
            mode: CutoffMode {
                mode_id: row.mode_id,
                name: row.name,
                description: row.description,
                threshold: row.threshold,
            },
            is_active: row.is_active,
        }
    }
}

/// Result of a successful activation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Activation {
    pub mode: CutoffMode,
    pub flags: FlagSummary,
}

/// Repository for cutoff mode operations.
pub struct CutoffModeRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CutoffModeRepository<'a> {
    /// Create a new cutoff mode repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All modes, highest threshold first, with `is_active` derived from the
    /// active-mode row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<CutoffModeView>, RepositoryError> {
        let rows = sqlx::query_as::<_, CutoffModeRow>(
            r"
            SELECT m.mode_id, m.name, m.description, m.threshold,
                   (a.active_mode_id IS NOT NULL) AS is_active
            FROM trackscore.cutoff_modes m
            LEFT JOIN trackscore.active_cutoff_mode a ON a.active_mode_id = m.mode_id
            ORDER BY m.threshold DESC, m.mode_id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// The active mode, if modes have been seeded.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn active(&self) -> Result<Option<CutoffMode>, RepositoryError> {
        let mode = sqlx::query_as::<_, CutoffMode>(
            r"
            SELECT m.mode_id, m.name, m.description, m.threshold
            FROM trackscore.active_cutoff_mode a
            JOIN trackscore.cutoff_modes m ON m.mode_id = a.active_mode_id
            WHERE a.id = 1
            ",
        )
        .fetch_optional(self.pool)
        .await?;

        Ok(mode)
    }

    /// Make `mode_id` the active mode and re-flag orders at its threshold.
    ///
    /// With `expected` set, the switch only happens if `expected` is still
    /// the active mode (compare-and-swap on the active-mode row).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown mode,
    /// `RepositoryError::Conflict` if `expected` is stale, and
    /// `RepositoryError::DataCorruption` if the stored threshold is invalid.
    #[instrument(skip(self))]
    pub async fn activate(
        &self,
        mode_id: &str,
        expected: Option<&str>,
    ) -> Result<Activation, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let mode = sqlx::query_as::<_, CutoffMode>(
            r"
            SELECT mode_id, name, description, threshold
            FROM trackscore.cutoff_modes
            WHERE mode_id = $1
            ",
        )
        .bind(mode_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        let threshold = mode
            .threshold()
            .map_err(|e| RepositoryError::DataCorruption(format!("mode {mode_id}: {e}")))?;

        let swapped = match expected {
            Some(expected) => sqlx::query(
                r"
                UPDATE trackscore.active_cutoff_mode
                SET active_mode_id = $1, updated_at = NOW()
                WHERE id = 1 AND active_mode_id = $2
                ",
            )
            .bind(mode_id)
            .bind(expected)
            .execute(&mut *tx)
            .await?
            .rows_affected(),
            None => sqlx::query(
                r"
                INSERT INTO trackscore.active_cutoff_mode (id, active_mode_id)
                VALUES (1, $1)
                ON CONFLICT (id) DO UPDATE SET
                    active_mode_id = EXCLUDED.active_mode_id,
                    updated_at = NOW()
                ",
            )
            .bind(mode_id)
            .execute(&mut *tx)
            .await?
            .rows_affected(),
        };

        if swapped == 0 {
            return Err(RepositoryError::Conflict(format!(
                "active cutoff mode is no longer {}",
                expected.unwrap_or_default()
            )));
        }

        let flags = apply_threshold_in(&mut tx, threshold).await?;
        tx.commit().await?;

        tracing::info!(
            mode_id,
            threshold = threshold.value(),
            flagged = flags.flagged,
            "Activated cutoff mode"
        );

        Ok(Activation { mode, flags })
    }

    /// Insert `modes` if missing and activate the default mode when no mode
    /// is active yet. Existing rows are left untouched.
    ///
    /// Returns the number of modes inserted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn seed(&self, modes: &[CutoffMode]) -> Result<u64, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;

        for mode in modes {
            inserted += sqlx::query(
                r"
                INSERT INTO trackscore.cutoff_modes (mode_id, name, description, threshold)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (mode_id) DO NOTHING
                ",
            )
            .bind(&mode.mode_id)
            .bind(&mode.name)
            .bind(&mode.description)
            .bind(mode.threshold)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }

        sqlx::query(
            r"
            INSERT INTO trackscore.active_cutoff_mode (id, active_mode_id)
            VALUES (1, $1)
            ON CONFLICT (id) DO NOTHING
            ",
        )
        .bind(DEFAULT_ACTIVE_MODE)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(inserted)
    }
}
