//! Error types for chat platform operations.

use thiserror::Error;

/// Errors that can occur while talking to the chat platform.
#[derive(Debug, Error)]
pub enum ChatApiError {
    /// Transport-level failure (connect, timeout, TLS).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The platform returned `ok: false`.
    #[error("api error {code}: {description}")]
    Api { code: i64, description: String },

    /// The platform returned a body we could not decode.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// A file handle could not be resolved to a download path.
    #[error("file path missing for file id {0}")]
    FilePathMissing(String),

    /// Missing or invalid configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}
