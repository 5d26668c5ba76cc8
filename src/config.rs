use std::env;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub is_dev: bool,
    /// Outbound fetch attempts per resource (default: 5)
    pub fetch_max_attempts: u32,
    /// Sleep between retry attempts in milliseconds (default: 250)
    pub fetch_backoff_ms: u64,
    /// Total outbound request timeout in seconds (default: 30)
    pub request_timeout_secs: u64,
    /// Allow fetching private/loopback origins (default: follows DEV_MODE).
    /// Tests and local setups need this; production should keep it off.
    pub allow_private_origins: bool,
}

impl Config {
    /// Load configuration from environment variables
    /// In DEV mode, provides sensible defaults. In PROD mode, PORT is required.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        // Check if running in dev mode
        let is_dev = env::var("DEV_MODE")
            .unwrap_or_else(|_| "false".to_string())
            .parse()
            .unwrap_or(false);

        // Port: required in prod, defaults to 3000 in dev
        let port = if is_dev {
            env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?
        } else {
            env::var("PORT")
                .map_err(|_| "PORT is required in production")?
                .parse()?
        };

        let fetch_max_attempts = env::var("FETCH_MAX_ATTEMPTS")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .unwrap_or(5);

        let fetch_backoff_ms = env::var("FETCH_BACKOFF_MS")
            .unwrap_or_else(|_| "250".to_string())
            .parse()
            .unwrap_or(250);

        let request_timeout_secs = env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .unwrap_or(30);

        let allow_private_origins = env::var("ALLOW_PRIVATE_ORIGINS")
            .map(|v| v.parse().unwrap_or(false))
            .unwrap_or(is_dev);

        Ok(Config {
            port,
            is_dev,
            fetch_max_attempts,
            fetch_backoff_ms,
            request_timeout_secs,
            allow_private_origins,
        })
    }

    pub fn fetch_backoff(&self) -> Duration {
        Duration::from_millis(self.fetch_backoff_ms)
    }
}
