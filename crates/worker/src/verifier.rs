//! The detection-service seam.

use async_trait::async_trait;

use detector_client::{DetailLevel, DetectorClient, DetectorError, VerifyResponse};

/// The one call the pipeline makes against the remote forensics service.
#[async_trait]
pub trait Verifier: Send + Sync {
    async fn verify(
        &self,
        image_bytes: Vec<u8>,
        detail_level: DetailLevel,
        preserve_exif: bool,
    ) -> Result<VerifyResponse, DetectorError>;
}

#[async_trait]
impl Verifier for DetectorClient {
    async fn verify(
        &self,
        image_bytes: Vec<u8>,
        detail_level: DetailLevel,
        preserve_exif: bool,
    ) -> Result<VerifyResponse, DetectorError> {
        DetectorClient::verify(self, image_bytes, detail_level, preserve_exif).await
    }
}
