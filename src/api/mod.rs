//! API module
//!
//! HTTP transports over the hub's operation contract: named tool dispatch
//! (the primary surface) and the lightweight satellite dialect for remote
//! agents. Both are thin mappings over the same `Hub` methods.

pub mod auth;
pub mod satellite;
pub mod tools;

use crate::hub::Hub;
use std::sync::Arc;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct ApiState {
    /// The hub itself
    pub hub: Arc<Hub>,
    /// Static shared secret HTTP callers must present, when configured
    pub auth_token: Option<String>,
}

impl ApiState {
    /// Build the handler state
    pub fn new(hub: Arc<Hub>, auth_token: Option<String>) -> Self {
        Self { hub, auth_token }
    }
}
