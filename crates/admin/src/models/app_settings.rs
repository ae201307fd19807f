//! Shop-wide application settings.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    pub otp_enabled: bool,
    pub current_past_delivery_percentage: f64,
    /// Comma-separated extensions accepted by bulk upload.
    pub allowed_file_formats: String,
}

impl AppSettings {
    /// Extensions accepted by bulk upload, e.g. `[".csv", ".xlsx"]`.
    #[must_use]
    pub fn file_formats(&self) -> Vec<&str> {
        self.allowed_file_formats
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            otp_enabled: false,
            current_past_delivery_percentage: 80.0,
            allowed_file_formats: ".csv,.xlsx".to_string(),
        }
    }
}
