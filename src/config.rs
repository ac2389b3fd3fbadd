//! Configuration module for FlightWatch.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::analysis::FallbackPolicy;

use std::env;
use std::time::Duration;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP port for the web server (default: 3000)
    pub http_port: u16,
    /// Path to the SQLite database file (default: "flightwatch.db")
    pub db_path: String,
    /// Seconds between background flight-search probes; 0 disables the monitor
    pub monitor_interval_secs: u64,
    /// Base URL of the third-party flight-search service
    pub flight_api_base_url: String,
    /// Timeout applied to each flight-search request
    pub probe_timeout: Duration,
    /// Hide internal error details in API responses
    pub production: bool,
    /// When to substitute demonstration data for sparse real data
    pub demo_fallback: FallbackPolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: 3000,
            db_path: "flightwatch.db".to_string(),
            monitor_interval_secs: 10,
            flight_api_base_url: "https://naverflights.myrealtrip.com".to_string(),
            probe_timeout: Duration::from_secs(30),
            production: false,
            demo_fallback: FallbackPolicy::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `FLIGHTWATCH_HTTP_PORT`: HTTP port (default: 3000)
    /// - `FLIGHTWATCH_DB_PATH`: Database file path (default: "flightwatch.db")
    /// - `FLIGHTWATCH_MONITOR_INTERVAL_SECS`: probe interval (default: 10)
    /// - `FLIGHTWATCH_FLIGHT_API_BASE_URL`: flight-search service base URL
    /// - `FLIGHTWATCH_PROBE_TIMEOUT_SECS`: per-request timeout (default: 30)
    /// - `FLIGHTWATCH_ENV`: `production` hides error details
    /// - `FLIGHTWATCH_DEMO_FALLBACK`: `auto`, `never` or `always` (default: auto)
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(port) = lookup("FLIGHTWATCH_HTTP_PORT").and_then(|s| s.parse().ok()) {
            cfg.http_port = port;
        }

        if let Some(db_path) = lookup("FLIGHTWATCH_DB_PATH") {
            cfg.db_path = db_path;
        }

        if let Some(secs) = lookup("FLIGHTWATCH_MONITOR_INTERVAL_SECS").and_then(|s| s.parse().ok()) {
            cfg.monitor_interval_secs = secs;
        }

        if let Some(url) = lookup("FLIGHTWATCH_FLIGHT_API_BASE_URL") {
            cfg.flight_api_base_url = url.trim_end_matches('/').to_string();
        }

        if let Some(secs) = lookup("FLIGHTWATCH_PROBE_TIMEOUT_SECS").and_then(|s| s.parse::<u64>().ok()) {
            if secs > 0 {
                cfg.probe_timeout = Duration::from_secs(secs);
            }
        }

        if let Some(env_name) = lookup("FLIGHTWATCH_ENV") {
            cfg.production = env_name.eq_ignore_ascii_case("production");
        }

        if let Some(raw) = lookup("FLIGHTWATCH_DEMO_FALLBACK") {
            match raw.parse() {
                Ok(policy) => cfg.demo_fallback = policy,
                Err(e) => tracing::warn!("Ignoring FLIGHTWATCH_DEMO_FALLBACK: {}", e),
            }
        }

        cfg
    }
}
