use std::sync::Arc;

use onramp::config::ServerConfig;
use onramp::engine::TokenMinter;
use onramp::stripe::StripeClient;

/// Shared application state for the onramp server.
pub struct AppState {
    pub config: ServerConfig,
    pub stripe: StripeClient,
    pub minter: Arc<dyn TokenMinter>,
}
