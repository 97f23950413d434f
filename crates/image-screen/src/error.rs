//! Screening error types.

use thiserror::Error;

/// Unrecoverable screening failures. Rejections with user-facing meaning
/// (too large, unsupported, AI watermark, screenshot) are not errors - they
/// are [`crate::ScreenReport`] variants.
#[derive(Debug, Error)]
pub enum ScreenError {
    /// The decoder failed on bytes that sniffed as a supported format.
    #[error("image decode failed: {0}")]
    Decode(#[from] image::ImageError),
}
