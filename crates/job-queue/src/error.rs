//! Queue error types.

use thiserror::Error;

/// Errors that can occur during queue operations.
#[derive(Debug, Error)]
pub enum QueueError {
    /// Underlying store failure.
    #[error("queue store error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// A job payload that must not be dispatched (e.g. unknown scenario).
    /// Not retriable; such jobs go straight to the dead-letter zone.
    #[error("malformed job {job_id}: {reason}")]
    BadJob { job_id: String, reason: String },

    /// Payload (de)serialization failure.
    #[error("payload codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// The queue is over the configured depth limit; the caller should
    /// refuse new work and refund any quota already charged.
    #[error("queue overloaded: depth {depth} >= limit {limit}")]
    Overloaded { depth: i64, limit: i64 },
}
