//! HTTP route handlers for TrackScore.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness check
//! GET  /health/ready                    - Readiness check (database)
//!
//! # Dashboard
//! GET  /api/dashboard                   - Overview at the active threshold
//! GET  /api/dashboard/projection        - Projection and P&L (?threshold=)
//! GET  /api/dashboard/goal              - Cashflow goal metrics (?orders_per_day=)
//! GET  /api/dashboard/performance       - Normal vs TrackScore comparison
//! POST /dashboard/mode                  - Activate a cutoff mode
//! PUT  /api/dashboard/settings          - Replace dashboard settings
//! PUT  /api/dashboard/costs             - Replace the cost catalogue
//! PUT  /api/dashboard/metrics/{kind}    - Replace baseline metrics
//!
//! # Orders
//! GET  /api/orders                      - Stored orders (?limit=&offset=)
//! POST /orders/cancel                   - Cancel selected orders
//! POST /api/cancel-order                - Cancel one order
//!
//! # Cancel requests
//! GET  /api/cancel-orders               - Pending cancel requests
//! POST /cancel-orders                   - Cancel queued requests
//!
//! # Settings
//! GET  /api/settings                    - App settings
//! POST /settings/otp                    - Toggle OTP verification
//!
//! # Sync
//! POST /sync                            - Full order sync from Shopify
//! POST /webhooks                        - Shopify webhooks (HMAC verified)
//! ```

use axum::Router;

use crate::state::AppState;

pub mod cancel_requests;
pub mod dashboard;
pub mod health;
pub mod orders;
pub mod settings;
pub mod sync;
pub mod webhooks;

/// Build the complete router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(dashboard::router())
        .merge(orders::router())
        .merge(cancel_requests::router())
        .merge(settings::router())
        .merge(sync::router())
        .merge(webhooks::router())
}
