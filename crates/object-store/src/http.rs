//! HTTP bucket client.

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::retry::RetryPolicy;
use crate::ObjectStore;

/// Configuration for the blob bucket endpoint.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Base URL of the store (e.g. "http://localhost:9000").
    pub base_url: String,
    /// Bucket name; all keys are scoped below it.
    pub bucket: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl StoreConfig {
    pub fn new(base_url: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            bucket: bucket.into(),
            request_timeout: Duration::from_secs(20),
        }
    }

    /// Create configuration from environment variables.
    ///
    /// Required:
    /// - `BLOB_STORE_URL` - endpoint base URL
    ///
    /// Optional:
    /// - `BLOB_BUCKET` - bucket name (default: "uploads")
    pub fn from_env() -> Result<Self, StoreError> {
        let base_url = env::var("BLOB_STORE_URL")
            .map_err(|_| StoreError::Configuration("BLOB_STORE_URL not set".to_string()))?;
        let bucket = env::var("BLOB_BUCKET").unwrap_or_else(|_| "uploads".to_string());
        Ok(Self::new(base_url, bucket))
    }

    /// Object URL for a key.
    pub fn object_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.base_url, self.bucket, key)
    }
}

/// Blob store backed by a plain HTTP object endpoint.
#[derive(Debug, Clone)]
pub struct HttpStore {
    http: Client,
    config: StoreConfig,
    retry: RetryPolicy,
}

impl HttpStore {
    pub fn new(config: StoreConfig) -> Result<Self, StoreError> {
        let http = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            http,
            config,
            retry: RetryPolicy::default(),
        })
    }

    pub fn from_env() -> Result<Self, StoreError> {
        Self::new(StoreConfig::from_env()?)
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn with_retries<T, F, Fut>(&self, what: &str, mut call: F) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, StoreError>>,
    {
        let mut attempts = 0;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && self.retry.should_retry(attempts + 1) => {
                    let delay = self.retry.delay_for_attempt(attempts);
                    attempts += 1;
                    warn!("{what} failed ({e}), retry {attempts} in {delay:?}");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl ObjectStore for HttpStore {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<String, StoreError> {
        let url = self.config.object_url(key);
        self.with_retries("blob put", || {
            let url = url.clone();
            let bytes = bytes.clone();
            async move {
                let response = self.http.put(&url).body(bytes).send().await?;
                let status = response.status();
                if status.is_success() {
                    Ok(())
                } else {
                    Err(StoreError::Status {
                        status: status.as_u16(),
                        key: key.to_string(),
                    })
                }
            }
        })
        .await?;
        debug!("stored blob {key}");
        Ok(url)
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let url = self.config.object_url(key);
        let bytes = self
            .with_retries("blob get", || {
                let url = url.clone();
                async move {
                    let response = self.http.get(&url).send().await?;
                    let status = response.status();
                    if status == StatusCode::NOT_FOUND {
                        return Err(StoreError::NotFound(key.to_string()));
                    }
                    if !status.is_success() {
                        return Err(StoreError::Status {
                            status: status.as_u16(),
                            key: key.to_string(),
                        });
                    }
                    Ok(response.bytes().await?.to_vec())
                }
            })
            .await?;
        debug!("fetched blob {key}: {} bytes", bytes.len());
        Ok(bytes)
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let url = self.config.object_url(key);
        let response = self.http.delete(&url).send().await?;
        let status = response.status();
        // Already-gone keys are fine; the bucket TTL may have beaten us.
        if status.is_success() || status == StatusCode::NOT_FOUND {
            debug!("deleted blob {key}");
            Ok(())
        } else {
            Err(StoreError::Status {
                status: status.as_u16(),
                key: key.to_string(),
            })
        }
    }
}
