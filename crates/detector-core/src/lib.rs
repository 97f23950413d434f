//! Core types for the photo-verification pipeline.
//!
//! This crate provides the shared vocabulary used across the gateway, the
//! workers, and the notifier:
//!
//! - [`Scenario`] - the user-declared intent carried through every request
//! - [`Verdict`] / [`VerdictCall`] - the outcome of an analysis
//! - [`DetectorSignals`] - the per-detector score bundle returned by the
//!   remote forensics service
//! - [`fuse`] - the pure function combining detector signals into a verdict
//!
//! Everything here is I/O-free so the decision logic can be exercised in
//! unit tests without a network.

mod error;
mod fusion;
mod scenario;
mod signals;
mod verdict;

pub use error::ScenarioError;
pub use fusion::fuse;
pub use scenario::Scenario;
pub use signals::{DetectorSignals, ExtractedMetadata, GpsPoint, RedFlag, VisualWatermark};
pub use verdict::{Verdict, VerdictCall};
