//! Pre-flight screening for uploaded images.
//!
//! Cheap local checks run before any quota is spent on remote analysis:
//!
//! - size and format gates (JPEG, PNG, WebP, MPO, HEIC)
//! - decodability
//! - an EXIF probe for obvious AI-generator signatures, which short-circuits
//!   the whole pipeline to an `ai_generated` verdict
//! - a screenshot heuristic (capture-tool signatures, bare screen
//!   resolutions with no camera metadata)
//! - the perceptual hash feeding the duplicate-upload index
//!
//! The perceptual hash is DCT-style (double-gradient, 64 bit): stable under
//! re-encoding and micro-perturbation, which is exactly why the duplicate
//! index keys on it instead of a byte hash.

mod error;
mod phash;
mod screen;

pub use error::ScreenError;
pub use phash::{perceptual_hash, perceptual_hash_of};
pub use screen::{ExifProbe, ImageKind, ImageProfile, ScreenReport, Screener};
