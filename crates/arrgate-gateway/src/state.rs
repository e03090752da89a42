//! Shared application state for the gateway server

use crate::backend::Transport;
use arrgate_kernel::gateway::AddressResolver;
use std::sync::Arc;
use std::time::Duration;

/// State shared across all request handlers.
///
/// Everything here is read-only after startup; calls share no mutable state.
#[derive(Clone)]
pub struct AppState {
    /// Resolver fixed to the process's network mode.
    pub resolver: Arc<AddressResolver>,
    /// Outbound call executor.
    pub transport: Arc<dyn Transport>,
    /// Fixed per-call timeout.
    pub timeout: Duration,
}

impl AppState {
    pub fn new(resolver: AddressResolver, transport: Arc<dyn Transport>, timeout: Duration) -> Self {
        Self {
            resolver: Arc::new(resolver),
            transport,
            timeout,
        }
    }
}
