//! AI-Link Hub Library
//!
//! Coordination hub for autonomous agents: a durable registry, per-recipient
//! message inboxes, access-controlled shared context, and a capability-matched
//! task queue driven by a background scheduler. The main binary is in
//! `src/main.rs`.

pub mod api;
pub mod config;
pub mod error;
pub mod hub;
pub mod scheduler;
/// Durable storage: SQLite-backed stores and their row types
pub mod store;
