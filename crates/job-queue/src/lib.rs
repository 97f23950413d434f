//! Durable multi-priority job queue over the shared database.
//!
//! Work items are rows in the `jobs` table (schema owned by the `database`
//! crate). Delivery is at-least-once: a dequeue takes a lease with a
//! visibility timeout, and leases that expire are retried or dead-lettered.
//! Priorities are strict - a `high` job is always dequeued before any
//! `default` job, which is dequeued before any `low` job.
//!
//! Per-job properties mirror the deployment contract: 5 minute execution
//! timeout, up to 3 attempts with `{10, 30, 60}` second backoff, finished
//! rows kept 1 hour and dead rows 24 hours before the sweep removes them.

mod error;
mod job;
mod queue;

pub use error::QueueError;
pub use job::{AnalysisJob, JobPriority, LeasedJob};
pub use queue::{JobQueue, QueueConfig};
