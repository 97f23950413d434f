//! Gateway configuration.

use std::env;

use crate::error::GatewayError;

/// Tunables for the ingress process. Defaults match the deployment
/// contract; every value can be overridden from the environment.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub database_url: String,
    /// Requests allowed per window per user.
    pub rate_capacity: u32,
    /// Sliding-window length in seconds.
    pub rate_window_secs: u64,
    /// Daily quota for free-tier users.
    pub daily_free_quota: i64,
    /// Upload size cap in megabytes.
    pub max_upload_mb: usize,
    /// Duplicate-upload lookback in hours.
    pub duplicate_window_hours: i64,
    /// Queue depth above which new uploads are refused.
    pub queue_depth_limit: Option<i64>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite:verilens.db?mode=rwc".to_string(),
            rate_capacity: 5,
            rate_window_secs: 60,
            daily_free_quota: 3,
            max_upload_mb: 20,
            duplicate_window_hours: 24,
            queue_depth_limit: Some(500),
        }
    }
}

impl GatewayConfig {
    /// Create configuration from environment variables.
    ///
    /// Optional (with defaults):
    /// - `DATABASE_URL` (sqlite:verilens.db?mode=rwc)
    /// - `RATE_LIMIT_CAPACITY` (5)
    /// - `RATE_LIMIT_WINDOW_SECS` (60)
    /// - `DAILY_FREE_QUOTA` (3)
    /// - `MAX_UPLOAD_MB` (20)
    /// - `DUPLICATE_WINDOW_HOURS` (24)
    /// - `QUEUE_DEPTH_LIMIT` (500; 0 disables backpressure)
    pub fn from_env() -> Result<Self, GatewayError> {
        let mut config = Self::default();
        if let Ok(url) = env::var("DATABASE_URL") {
            config.database_url = url;
        }
        if let Some(v) = parse_env("RATE_LIMIT_CAPACITY")? {
            config.rate_capacity = v;
        }
        if let Some(v) = parse_env("RATE_LIMIT_WINDOW_SECS")? {
            config.rate_window_secs = v;
        }
        if let Some(v) = parse_env("DAILY_FREE_QUOTA")? {
            config.daily_free_quota = v;
        }
        if let Some(v) = parse_env("MAX_UPLOAD_MB")? {
            config.max_upload_mb = v;
        }
        if let Some(v) = parse_env("DUPLICATE_WINDOW_HOURS")? {
            config.duplicate_window_hours = v;
        }
        if let Some(v) = parse_env::<i64>("QUEUE_DEPTH_LIMIT")? {
            config.queue_depth_limit = if v <= 0 { None } else { Some(v) };
        }
        Ok(config)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>, GatewayError> {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| GatewayError::Configuration(format!("{key} is not a valid number"))),
        Err(_) => Ok(None),
    }
}
