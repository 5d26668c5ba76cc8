use crate::config::Config;
use crate::http_retry::RetryConfig;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<Config>,
    /// Shared HTTP client for connection pooling
    pub http_client: Client,
}

impl AppState {
    /// Create a new AppState with the given configuration
    pub fn new(config: Config) -> Self {
        let http_client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            config: Arc::new(config),
            http_client,
        }
    }

    /// Retry policy for outbound fetches, derived from config.
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.config.fetch_max_attempts,
            backoff: self.config.fetch_backoff(),
            timeout: None,
        }
    }
}
