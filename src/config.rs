//! Configuration Module
//!
//! Handles loading and managing service configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::coordinator::CoordinatorConfig;

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Deployment environment ("development" or "production")
    pub app_env: String,
    /// HTTP server port
    pub server_port: u16,
    /// Nominal TTL in seconds for cached results
    pub cache_ttl: u64,
    /// Jitter bound in seconds added to every store write
    pub ttl_jitter: u64,
    /// Upper bound in milliseconds for the delay before a background refresh
    pub refresh_delay_max_ms: u64,
    /// Time budget in seconds for a single computation
    pub fetch_timeout: u64,
    /// Time budget in seconds for a single store write
    pub write_timeout: u64,
    /// Per-request time budget in seconds for HTTP handlers
    pub request_timeout: u64,
    /// Maximum number of entries the in-memory store can hold
    pub max_entries: usize,
    /// Background expiry sweep interval in seconds
    pub cleanup_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `APP_ENV` - Deployment environment (default: development)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CACHE_TTL_SECS` - Nominal cache TTL (default: 600)
    /// - `CACHE_TTL_JITTER_SECS` - TTL jitter bound (default: 15)
    /// - `REFRESH_DELAY_MAX_MS` - Refresh delay bound (default: 1000)
    /// - `FETCH_TIMEOUT_SECS` - Computation timeout (default: 15)
    /// - `WRITE_TIMEOUT_SECS` - Store write timeout (default: 5)
    /// - `REQUEST_TIMEOUT_SECS` - HTTP request timeout (default: 10)
    /// - `MAX_ENTRIES` - Maximum in-memory store entries (default: 10000)
    /// - `CLEANUP_INTERVAL` - Expiry sweep frequency in seconds (default: 1)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            app_env: env::var("APP_ENV")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.app_env),
            server_port: env_or("SERVER_PORT", defaults.server_port),
            cache_ttl: env_or("CACHE_TTL_SECS", defaults.cache_ttl),
            ttl_jitter: env_or("CACHE_TTL_JITTER_SECS", defaults.ttl_jitter),
            refresh_delay_max_ms: env_or("REFRESH_DELAY_MAX_MS", defaults.refresh_delay_max_ms),
            fetch_timeout: env_or("FETCH_TIMEOUT_SECS", defaults.fetch_timeout),
            write_timeout: env_or("WRITE_TIMEOUT_SECS", defaults.write_timeout),
            request_timeout: env_or("REQUEST_TIMEOUT_SECS", defaults.request_timeout),
            max_entries: env_or("MAX_ENTRIES", defaults.max_entries),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
        }
    }

    /// Returns true when running with production settings.
    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }

    /// Nominal TTL as a Duration.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }

    /// Per-request timeout as a Duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Builds the coordinator settings from this configuration.
    pub fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig::new()
            .with_jitter(Duration::from_secs(self.ttl_jitter))
            .with_refresh_delay(Duration::from_millis(self.refresh_delay_max_ms))
            .with_fetch_timeout(Duration::from_secs(self.fetch_timeout))
            .with_write_timeout(Duration::from_secs(self.write_timeout))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_env: "development".to_string(),
            server_port: 3000,
            cache_ttl: 600,
            ttl_jitter: 15,
            refresh_delay_max_ms: 1000,
            fetch_timeout: 15,
            write_timeout: 5,
            request_timeout: 10,
            max_entries: 10_000,
            cleanup_interval: 1,
        }
    }
}

/// Parses an environment variable, falling back to `default` when unset or malformed.
fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
