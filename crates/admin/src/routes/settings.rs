//! App settings handlers.

use axum::{
    Form, Json, Router,
    extract::State,
    routing::{get, post},
};
use serde::Deserialize;
use tracing::instrument;

use crate::db::AppSettingsRepository;
use crate::error::AppError;
use crate::models::AppSettings;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/settings", get(show))
        .route("/settings/otp", post(toggle_otp))
}

#[derive(Debug, Deserialize)]
pub struct OtpForm {
    /// Checkbox value; absent when unchecked.
    #[serde(default)]
    pub enabled: Option<String>,
}

impl OtpForm {
    fn is_enabled(&self) -> bool {
        self.enabled
            .as_deref()
            .map(str::trim)
            .is_some_and(|v| matches!(v.to_ascii_lowercase().as_str(), "true" | "on" | "1"))
    }
}

#[instrument(skip(state))]
async fn show(State(state): State<AppState>) -> Result<Json<AppSettings>, AppError> {
    let settings = AppSettingsRepository::new(state.pool()).get_or_create().await?;
    Ok(Json(settings))
}

#[instrument(skip(state))]
async fn toggle_otp(
    State(state): State<AppState>,
    Form(form): Form<OtpForm>,
) -> Result<Json<AppSettings>, AppError> {
    let enabled = form.is_enabled();
    let settings = AppSettingsRepository::new(state.pool())
        .set_otp_enabled(enabled)
        .await?;
    tracing::info!(enabled, "Updated OTP setting");
    Ok(Json(settings))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(value: Option<&str>) -> OtpForm {
        OtpForm {
            enabled: value.map(str::to_string),
        }
    }

    #[test]
    fn test_checkbox_values() {
        assert!(form(Some("on")).is_enabled());
        assert!(form(Some("TRUE")).is_enabled());
        assert!(form(Some("1")).is_enabled());
        assert!(!form(Some("false")).is_enabled());
        assert!(!form(None).is_enabled());
    }
}
