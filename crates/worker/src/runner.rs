//! The worker loop: lease, execute with a deadline, settle with the queue.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{info, warn};

use job_queue::JobQueue;

use crate::error::WorkerError;
use crate::pipeline::{JobOutcome, Pipeline};

/// How often expired leases are reaped and finished rows swept.
const HOUSEKEEPING_EVERY: u32 = 30;

/// One worker task: pulls jobs until shutdown.
pub struct Runner {
    queue: JobQueue,
    pipeline: Arc<Pipeline>,
    job_timeout: Duration,
    idle_poll: Duration,
}

impl Runner {
    pub fn new(
        queue: JobQueue,
        pipeline: Arc<Pipeline>,
        job_timeout: Duration,
        idle_poll: Duration,
    ) -> Self {
        Self {
            queue,
            pipeline,
            job_timeout,
            idle_poll,
        }
    }

    /// Run forever. Every job executes on this task from lease to
    /// settlement; queue errors back off instead of crashing the worker.
    pub async fn run(self) -> Result<(), WorkerError> {
        info!("worker runner starting");
        let mut iterations: u32 = 0;
        loop {
            iterations = iterations.wrapping_add(1);
            if iterations % HOUSEKEEPING_EVERY == 0 {
                if let Err(e) = self.queue.reap_expired().await {
                    warn!("lease reap failed: {e}");
                }
                if let Err(e) = self.queue.sweep().await {
                    warn!("queue sweep failed: {e}");
                }
            }

            let leased = match self.queue.dequeue().await {
                Ok(Some(leased)) => leased,
                Ok(None) => {
                    tokio::time::sleep(self.idle_poll).await;
                    continue;
                }
                Err(e) => {
                    warn!("dequeue failed: {e}");
                    tokio::time::sleep(self.idle_poll).await;
                    continue;
                }
            };

            match timeout(self.job_timeout, self.pipeline.run(&leased)).await {
                Ok(Ok(JobOutcome::Completed { analysis_id })) => {
                    info!(job_id = %leased.job_id, %analysis_id, "job settled: completed");
                    self.queue.complete(&leased.job_id).await?;
                }
                Ok(Ok(JobOutcome::Buried { reason })) => {
                    // The pipeline already refunded and messaged the user.
                    self.queue.bury(&leased.job_id, &reason).await?;
                }
                Ok(Err(e)) => {
                    warn!(job_id = %leased.job_id, "job failed: {e}");
                    self.queue.retry_or_bury(&leased.job_id, &e.to_string()).await?;
                }
                Err(_) => {
                    warn!(job_id = %leased.job_id, "job exceeded execution timeout");
                    self.queue
                        .bury(&leased.job_id, "execution timeout")
                        .await?;
                }
            }
        }
    }
}
