//! Error types for blob storage.

use thiserror::Error;

/// Errors that can occur during blob operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Transport-level failure; candidates for retry.
    #[error("store http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response other than 404.
    #[error("store returned {status} for {key}")]
    Status { status: u16, key: String },

    /// The key does not exist.
    #[error("blob not found: {0}")]
    NotFound(String),

    /// Missing or invalid configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl StoreError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::Status { status, .. } => *status >= 500,
            Self::NotFound(_) | Self::Configuration(_) => false,
        }
    }
}
