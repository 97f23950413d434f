//! Worker error types.

use thiserror::Error;

/// Errors surfacing from the worker pipeline.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("database error: {0}")]
    Database(#[from] database::DatabaseError),

    #[error("queue error: {0}")]
    Queue(#[from] job_queue::QueueError),

    #[error("blob store error: {0}")]
    Store(#[from] object_store::StoreError),

    #[error("detector error: {0}")]
    Detector(#[from] detector_client::DetectorError),

    #[error("chat platform error: {0}")]
    Chat(#[from] chat_api::ChatApiError),

    #[error("configuration error: {0}")]
    Configuration(String),
}
