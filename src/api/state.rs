//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use crate::config;
use crate::portfolio::HoldingsBook;
use crate::services::Services;
use crate::storage::KeyValueStore;
use crate::sync::WatchlistSynchronizer;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// List synchronizer
    pub sync: Arc<WatchlistSynchronizer>,
    /// Portfolio amounts
    pub holdings: Arc<HoldingsBook>,
    /// Backing store, probed by the readiness check
    pub kv: Arc<dyn KeyValueStore>,
    /// API configuration
    pub config: Arc<ApiConfig>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    pub fn new(services: Services, config: ApiConfig) -> Self {
        Self {
            sync: services.sync,
            holdings: services.holdings,
            kv: services.kv,
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        config::ApiConfig::default().into()
    }
}

impl From<config::ApiConfig> for ApiConfig {
    fn from(config: config::ApiConfig) -> Self {
        Self {
            host: config.host,
            port: config.port,
        }
    }
}

impl ApiConfig {
    /// Create config with custom host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
