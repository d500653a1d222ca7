//! Application state for the HTTP server.

use std::sync::Arc;

use crate::config::ServiceConfig;
use crate::usage::UsageLedger;

/// Shared application state passed to all handlers. Nothing in here is touched by
/// the cleaning pipeline itself.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    pub usage: Arc<UsageLedger>,
}

impl AppState {
    pub fn new(config: ServiceConfig) -> Self {
        let usage = UsageLedger::new(config.free_limit_per_day, config.payment_url.clone());
        Self {
            config: Arc::new(config),
            usage: Arc::new(usage),
        }
    }
}
