//! Configuration for the forensics service client.

use std::env;
use std::time::Duration;

use crate::error::DetectorError;

/// Default hard deadline for one verification call.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for the forensics API.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Base URL of the service (e.g. "http://localhost:8000").
    pub api_url: String,
    /// Hard timeout for a verification call. Exceeding it fails the
    /// analysis; the caller refunds quota and reports a transient error.
    pub timeout: Duration,
}

impl DetectorConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Create configuration from environment variables.
    ///
    /// Required:
    /// - `DETECTOR_API_URL` - service base URL
    ///
    /// Optional:
    /// - `DETECTOR_API_TIMEOUT_SECS` - call deadline (default: 30)
    pub fn from_env() -> Result<Self, DetectorError> {
        let api_url = env::var("DETECTOR_API_URL")
            .map_err(|_| DetectorError::Configuration("DETECTOR_API_URL not set".to_string()))?;
        let timeout_secs = env::var("DETECTOR_API_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Ok(Self {
            api_url,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// URL of the verification endpoint.
    pub fn verify_url(&self) -> String {
        format!("{}/api/v1/verify", self.api_url)
    }

    /// URL of the PDF report endpoint.
    pub fn pdf_url(&self) -> String {
        format!("{}/api/v1/reports/pdf", self.api_url)
    }
}
