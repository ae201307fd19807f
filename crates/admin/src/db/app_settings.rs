//! Application settings, created with defaults on first read.

use sqlx::PgPool;

use super::RepositoryError;
use crate::models::AppSettings;

/// Repository for the single `app_settings` row.
pub struct AppSettingsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AppSettingsRepository<'a> {
    /// Create a new settings repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Current settings, inserting the defaults if the row is missing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_or_create(&self) -> Result<AppSettings, RepositoryError> {
        let defaults = AppSettings::default();
        sqlx::query(
            r"
            INSERT INTO trackscore.app_settings
                (id, otp_enabled, current_past_delivery_percentage, allowed_file_formats)
            VALUES (1, $1, $2, $3)
            ON CONFLICT (id) DO NOTHING
            ",
        )
        .bind(defaults.otp_enabled)
        .bind(defaults.current_past_delivery_percentage)
        .bind(&defaults.allowed_file_formats)
        .execute(self.pool)
        .await?;

        let settings = sqlx::query_as::<_, AppSettings>(
            r"
            SELECT otp_enabled, current_past_delivery_percentage, allowed_file_formats
            FROM trackscore.app_settings
            WHERE id = 1
            ",
        )
        .fetch_one(self.pool)
        .await?;

        Ok(settings)
    }

    /// Turn OTP verification on or off.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_otp_enabled(&self, enabled: bool) -> Result<AppSettings, RepositoryError> {
        let defaults = AppSettings::default();
        let settings = sqlx::query_as::<_, AppSettings>(
            r"
            INSERT INTO trackscore.app_settings
                (id, otp_enabled, current_past_delivery_percentage, allowed_file_formats)
            VALUES (1, $1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET otp_enabled = EXCLUDED.otp_enabled, updated_at = NOW()
            RETURNING otp_enabled, current_past_delivery_percentage, allowed_file_formats
            ",
        )
        .bind(enabled)
        .bind(defaults.current_past_delivery_percentage)
        .bind(&defaults.allowed_file_formats)
        .fetch_one(self.pool)
        .await?;

        Ok(settings)
    }
}
