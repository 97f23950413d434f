//! Gateway error types.

use thiserror::Error;

/// Errors surfacing from the ingress pipeline.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("chat platform error: {0}")]
    Chat(#[from] chat_api::ChatApiError),

    #[error("database error: {0}")]
    Database(#[from] database::DatabaseError),

    #[error("queue error: {0}")]
    Queue(#[from] job_queue::QueueError),

    #[error("blob store error: {0}")]
    Store(#[from] object_store::StoreError),

    #[error("detector client error: {0}")]
    Detector(#[from] detector_client::DetectorError),

    #[error("configuration error: {0}")]
    Configuration(String),
}
