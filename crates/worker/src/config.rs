//! Worker configuration.

use std::env;

use crate::error::WorkerError;

/// Tunables for a worker process.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub database_url: String,
    /// Concurrent worker tasks in this process.
    pub worker_count: usize,
    /// Hard deadline for one job.
    pub job_timeout_secs: u64,
    /// Poll interval when the queue is empty.
    pub idle_poll_secs: u64,
    /// Daily free quota; bounds compensating refunds.
    pub daily_free_quota: i64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite:verilens.db?mode=rwc".to_string(),
            worker_count: 3,
            job_timeout_secs: 300,
            idle_poll_secs: 2,
            daily_free_quota: 3,
        }
    }
}

impl WorkerConfig {
    /// Create configuration from environment variables.
    ///
    /// Optional (with defaults):
    /// - `DATABASE_URL` (sqlite:verilens.db?mode=rwc)
    /// - `WORKER_COUNT` (3)
    /// - `JOB_TIMEOUT_SECS` (300)
    /// - `WORKER_IDLE_POLL_SECS` (2)
    /// - `DAILY_FREE_QUOTA` (3)
    pub fn from_env() -> Result<Self, WorkerError> {
        let mut config = Self::default();
        if let Ok(url) = env::var("DATABASE_URL") {
            config.database_url = url;
        }
        if let Some(v) = parse_env("WORKER_COUNT")? {
            config.worker_count = v;
        }
        if let Some(v) = parse_env("JOB_TIMEOUT_SECS")? {
            config.job_timeout_secs = v;
        }
        if let Some(v) = parse_env("WORKER_IDLE_POLL_SECS")? {
            config.idle_poll_secs = v;
        }
        if let Some(v) = parse_env("DAILY_FREE_QUOTA")? {
            config.daily_free_quota = v;
        }
        Ok(config)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>, WorkerError> {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| WorkerError::Configuration(format!("{key} is not a valid number"))),
        Err(_) => Ok(None),
    }
}
