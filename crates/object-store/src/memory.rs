//! In-memory store double for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::ObjectStore;

/// An in-memory [`ObjectStore`] for unit tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    /// When set, every call fails with a synthetic 503.
    fail: Mutex<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent calls fail (for exercising the transient-error path).
    pub fn set_failing(&self, failing: bool) {
        *self.fail.lock().unwrap() = failing;
    }

    pub fn contains(&self, key: &str) -> bool {
        self.blobs.lock().unwrap().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.blobs.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_failing(&self, key: &str) -> Result<(), StoreError> {
        if *self.fail.lock().unwrap() {
            return Err(StoreError::Status {
                status: 503,
                key: key.to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<String, StoreError> {
        self.check_failing(key)?;
        self.blobs.lock().unwrap().insert(key.to_string(), bytes);
        Ok(format!("memory://{key}"))
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        self.check_failing(key)?;
        self.blobs
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.check_failing(key)?;
        self.blobs.lock().unwrap().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip() {
        let store = MemoryStore::new();
        store.put("temp/1/a.jpg", vec![1, 2, 3]).await.unwrap();
        assert_eq!(store.get("temp/1/a.jpg").await.unwrap(), vec![1, 2, 3]);
        store.delete("temp/1/a.jpg").await.unwrap();
        assert!(matches!(
            store.get("temp/1/a.jpg").await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let store = MemoryStore::new();
        store.set_failing(true);
        let err = store.put("k", vec![]).await.unwrap_err();
        assert!(err.is_transient());
    }
}
