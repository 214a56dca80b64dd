//! Configuration module

use std::env;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// JWT secret key for viewer tokens
    pub jwt_secret: String,

    /// Monitoring backend base URL
    pub monitor_url: String,

    /// Optional bearer token for the monitoring backend
    pub monitor_token: Option<String>,

    /// Monitoring backend request timeout in seconds
    pub monitor_timeout_secs: u64,

    /// Alert/vulnerability page size per fetch cycle
    pub search_page_size: usize,

    /// Summarization API base URL
    pub assistant_url: String,

    /// Summarization API key
    pub assistant_api_key: String,

    /// Summarization API protocol version header value
    pub assistant_api_version: String,

    /// Run-status poll interval in milliseconds
    pub assistant_poll_interval_ms: u64,

    /// Run-status poll attempt budget
    pub assistant_poll_max_attempts: u32,

    /// Environment (development, production)
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),

            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| "argus-super-secret-key-change-in-production".to_string()),

            monitor_url: env::var("MONITOR_URL")
                .unwrap_or_else(|_| "http://localhost:9200".to_string()),

            monitor_token: env::var("MONITOR_TOKEN").ok(),

            monitor_timeout_secs: env::var("MONITOR_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),

            search_page_size: env::var("SEARCH_PAGE_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(500),

            assistant_url: env::var("ASSISTANT_URL")
                .unwrap_or_else(|_| "http://localhost:9300".to_string()),

            assistant_api_key: env::var("ASSISTANT_API_KEY").unwrap_or_default(),

            assistant_api_version: env::var("ASSISTANT_API_VERSION")
                .unwrap_or_else(|_| "v2".to_string()),

            assistant_poll_interval_ms: env::var("ASSISTANT_POLL_INTERVAL_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1500),

            assistant_poll_max_attempts: env::var("ASSISTANT_POLL_MAX_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(40),

            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
