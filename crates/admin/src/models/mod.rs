//! Domain models persisted by the dashboard backend.

pub mod app_settings;
pub mod cancel_request;
pub mod order;

pub use app_settings::AppSettings;
pub use cancel_request::CancelRequest;
pub use order::{CustomerInput, Order, OrderInput};
