//! Blob storage for uploaded media.
//!
//! Uploads live in the bucket only for the duration of one analysis:
//! the gateway puts the bytes under `temp/{user_id}/{uuid}.{ext}`, the
//! worker gets them back, and deletes them best-effort after the final
//! notification. The bucket itself carries a lifecycle rule removing
//! `temp/` keys after 24 hours, so a failed delete only delays cleanup.
//!
//! [`ObjectStore`] is the seam: production uses [`HttpStore`], tests use
//! [`MemoryStore`].

mod error;
mod http;
mod memory;
mod retry;

pub use error::StoreError;
pub use http::{HttpStore, StoreConfig};
pub use memory::MemoryStore;
pub use retry::RetryPolicy;

use async_trait::async_trait;

/// A key/value store over binary blobs.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under `key`, returning a store-relative URL.
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<String, StoreError>;

    /// Fetch the blob under `key`.
    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError>;

    /// Remove the blob under `key`. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}
