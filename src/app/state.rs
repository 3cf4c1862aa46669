//! Application state shared across routes

use std::sync::Arc;

use tokio::sync::watch;

use crate::config::Config;
use crate::game::Duel;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub duel: Arc<Duel>,
    /// Raised once when the process starts shutting down
    pub shutdown: watch::Receiver<bool>,
}

impl AppState {
    pub fn new(config: Config, shutdown: watch::Receiver<bool>) -> Self {
        let config = Arc::new(config);

        // One duel per process
        let duel = Arc::new(Duel::new(config.rules, config.tick_period));

        Self {
            config,
            duel,
            shutdown,
        }
    }
}
