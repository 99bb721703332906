//! HTTP gateway: signed webhook intake, cron triggers, and health.
//!
//! Lifecycle:
//! 1. Load config and construct the store, chat, and commerce clients
//! 2. Build [`state::GatewayState`] and the router
//! 3. Serve until stopped
//!
//! All domain logic (handlers, digests) lives in other crates; this crate
//! only maps HTTP to those calls.

pub mod cron_routes;
pub mod server;
pub mod state;
pub mod webhook_routes;

pub use {
    server::{build_app, start},
    state::GatewayState,
};
