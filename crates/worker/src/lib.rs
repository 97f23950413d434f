//! Analysis worker: leases jobs from the queue and runs them through the
//! staged pipeline.
//!
//! Each job executes start-to-end on one task with one set of shared
//! clients - no per-stage runtimes, no nested executors. Stage boundaries
//! emit idempotent progress edits; failures follow the per-kind policy
//! (refund + transient message for store/detector failures, persistence
//! retry with delivery regardless, swallowed notification errors).

pub mod config;
pub mod error;
pub mod pipeline;
pub mod runner;
pub mod verifier;

pub use config::WorkerConfig;
pub use error::WorkerError;
pub use pipeline::{JobOutcome, Pipeline};
pub use runner::Runner;
pub use verifier::Verifier;
