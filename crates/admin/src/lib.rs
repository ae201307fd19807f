//! TrackScore admin library.
//!
//! This crate provides the dashboard backend as a library, allowing it to be
//! tested and reused by the CLI.
//!
//! # Security
//!
//! This crate contains HIGH PRIVILEGE access:
//! - Shopify Admin API (order cancellation with refunds)
//! - Webhook signature verification with the app secret

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod shopify;
pub mod state;
