//! TrackScore Core - Shared types and the projection engine.
//!
//! This crate provides the pieces used by every TrackScore component:
//! - `admin` - Dashboard backend, order sync and cancellation service
//! - `cli` - Command-line tools for migrations, seeding and sync
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access, no HTTP clients. This keeps it lightweight and allows it
//! to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for Shopify IDs, order statuses and dashboard records
//! - [`engine`] - Threshold projection, P&L breakdown and cashflow goals
//! - [`cutoff`] - Cutoff mode presets with a single active mode

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cutoff;
pub mod engine;
pub mod types;

pub use types::*;
