//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::client::GatewayClient;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Paced, cached client every proxied request goes through.
    pub client: Arc<GatewayClient>,
}

impl AppState {
    /// Wraps a client for sharing across handlers.
    #[must_use]
    pub fn new(client: GatewayClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }
}
