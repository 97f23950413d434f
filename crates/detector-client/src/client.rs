//! Forensics service HTTP client.

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use tracing::{debug, info};

use crate::api_types::{DetailLevel, VerifyResponse};
use crate::config::DetectorConfig;
use crate::error::DetectorError;

/// Client for the forensics verification API.
#[derive(Debug, Clone)]
pub struct DetectorClient {
    http: Client,
    config: DetectorConfig,
}

impl DetectorClient {
    /// Build a client with the configured hard deadline baked into the
    /// underlying HTTP client.
    pub fn new(config: DetectorConfig) -> Result<Self, DetectorError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(DetectorError::Http)?;
        Ok(Self { http, config })
    }

    /// Build a client from environment variables.
    pub fn from_env() -> Result<Self, DetectorError> {
        Self::new(DetectorConfig::from_env()?)
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Verify an image: multipart upload of the raw bytes plus the analysis
    /// depth and metadata-preservation hints.
    ///
    /// Returns [`DetectorError::Timeout`] when the call exceeds the
    /// configured deadline; callers translate that into a quota refund and
    /// a transient user error.
    pub async fn verify(
        &self,
        image_bytes: Vec<u8>,
        detail_level: DetailLevel,
        preserve_exif: bool,
    ) -> Result<VerifyResponse, DetectorError> {
        debug!(
            "calling verification endpoint: {} bytes, detail={}",
            image_bytes.len(),
            detail_level.as_str()
        );

        let form = Form::new()
            .part(
                "image",
                Part::bytes(image_bytes)
                    .file_name("upload.jpg")
                    .mime_str("image/jpeg")
                    .map_err(DetectorError::Http)?,
            )
            .text("detail_level", detail_level.as_str())
            .text("preserve_exif", if preserve_exif { "true" } else { "false" });

        let response = self
            .http
            .post(self.config.verify_url())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DetectorError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let decoded: VerifyResponse = serde_json::from_str(&body)?;
        info!(
            "verification complete: service verdict={:?}, time={:?}ms",
            decoded.verdict, decoded.processing_time_ms
        );
        Ok(decoded)
    }

    /// Render a forensic PDF for a previously persisted analysis.
    ///
    /// The renderer is an external collaborator; we pass the stored result
    /// blob and get raw PDF bytes back.
    pub async fn render_pdf(
        &self,
        analysis_id: &str,
        result_blob: &serde_json::Value,
    ) -> Result<Vec<u8>, DetectorError> {
        debug!("requesting pdf report for {analysis_id}");

        let response = self
            .http
            .post(self.config.pdf_url())
            .json(&serde_json::json!({
                "analysis_id": analysis_id,
                "result": result_blob,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DetectorError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        info!("pdf report rendered: {} bytes", bytes.len());
        Ok(bytes.to_vec())
    }
}
