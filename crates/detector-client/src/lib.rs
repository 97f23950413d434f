//! Client for the remote image-forensics service.
//!
//! The service does all heavy detection (frequency analysis, face-swap
//! scoring, OCR watermark search, metadata validation) and returns a bundle
//! of per-detector signals; this crate uploads image bytes and decodes that
//! bundle into [`detector_core::DetectorSignals`]. The verdict itself is
//! computed locally by `detector_core::fuse` - the service's own verdict
//! field is carried for the persisted result blob but never trusted for the
//! user-facing decision.

mod api_types;
mod client;
mod config;
mod error;

pub use api_types::{DetailLevel, VerifyResponse};
pub use client::DetectorClient;
pub use config::DetectorConfig;
pub use error::DetectorError;
