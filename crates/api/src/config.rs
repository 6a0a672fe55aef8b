//! Application configuration loaded from environment variables.

use std::time::Duration;

use axum::http::HeaderValue;
use common::DEFAULT_BACKEND_PORT;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `8000`)
/// - `DATABASE_URL`: sqlx connection URL (default: `"sqlite://tickets_p2p.db?mode=rwc"`)
/// - `DATABASE_TIMEOUT_MS`: upper bound on a health probe (default: `2000`)
/// - `CORS_ORIGIN`: origin allowed to call the API (default: `"http://localhost:3000"`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub database_timeout: Duration,
    pub cors_origin: String,
    pub log_level: String,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            database_url: std::env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            database_timeout: std::env::var("DATABASE_TIMEOUT_MS")
                .ok()
                .and_then(|ms| ms.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.database_timeout),
            cors_origin: std::env::var("CORS_ORIGIN").unwrap_or(defaults.cors_origin),
            log_level: std::env::var("RUST_LOG").unwrap_or(defaults.log_level),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Parses the configured CORS origin into a header value.
    pub fn cors_origin_header(&self) -> Result<HeaderValue, axum::http::header::InvalidHeaderValue> {
        HeaderValue::from_str(&self.cors_origin)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_BACKEND_PORT,
            database_url: "sqlite://tickets_p2p.db?mode=rwc".to_string(),
            database_timeout: Duration::from_millis(2000),
            cors_origin: "http://localhost:3000".to_string(),
            log_level: "info".to_string(),
        }
    }
}
