//! Error types for forensics service calls.

use thiserror::Error;

/// Errors that can occur while calling the forensics service.
#[derive(Debug, Error)]
pub enum DetectorError {
    /// The call exceeded the hard deadline. The caller must refund quota
    /// and must not persist an analysis record.
    #[error("analysis timed out")]
    Timeout,

    /// Transport-level failure other than a timeout.
    #[error("http error: {0}")]
    Http(reqwest::Error),

    /// Non-2xx response from the service.
    #[error("analysis service returned {status}")]
    Status { status: u16, body: String },

    /// The service responded with a body we could not decode.
    #[error("malformed response: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Missing or invalid configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for DetectorError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(e)
        }
    }
}
