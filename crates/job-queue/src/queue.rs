//! Queue operations: enqueue, lease-based dequeue, retry, sweep.

use std::time::Duration;

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::QueueError;
use crate::job::{AnalysisJob, JobPriority, LeasedJob, WireJob};

/// Queue tuning. Defaults match the deployment contract.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Visibility timeout for a leased job.
    pub job_timeout: Duration,
    /// Total attempts before a job is dead-lettered.
    pub max_attempts: i64,
    /// Backoff before retry `n` (1-based), seconds.
    pub retry_backoff_secs: [u64; 3],
    /// How long finished jobs are kept before the sweep removes them.
    pub result_ttl: Duration,
    /// How long dead jobs are kept for diagnostics.
    pub failure_ttl: Duration,
    /// Enqueue refuses new jobs above this queued depth (backpressure).
    pub depth_limit: Option<i64>,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            job_timeout: Duration::from_secs(300),
            max_attempts: 3,
            retry_backoff_secs: [10, 30, 60],
            result_ttl: Duration::from_secs(3600),
            failure_ttl: Duration::from_secs(86_400),
            depth_limit: None,
        }
    }
}

/// Handle to the shared job store.
#[derive(Debug, Clone)]
pub struct JobQueue {
    pool: SqlitePool,
    config: QueueConfig,
}

impl JobQueue {
    pub fn new(pool: SqlitePool, config: QueueConfig) -> Self {
        Self { pool, config }
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Number of jobs currently waiting.
    pub async fn depth(&self) -> Result<i64, QueueError> {
        let depth =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM jobs WHERE status = 'queued'")
                .fetch_one(&self.pool)
                .await?;
        Ok(depth)
    }

    /// Enqueue an analysis job, returning its id.
    ///
    /// Fails fast with [`QueueError::Overloaded`] when the configured depth
    /// limit is exceeded; the caller refuses the upload and refunds quota.
    pub async fn enqueue(
        &self,
        job: &AnalysisJob,
        priority: JobPriority,
    ) -> Result<String, QueueError> {
        if let Some(limit) = self.config.depth_limit {
            let depth = self.depth().await?;
            if depth >= limit {
                return Err(QueueError::Overloaded { depth, limit });
            }
        }

        let job_id = Uuid::new_v4().to_string();
        let payload = serde_json::to_string(&job.to_wire())?;
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO jobs (job_id, priority, status, payload, attempts, run_at_ms, created_at)
            VALUES (?, ?, 'queued', ?, 0, ?, ?)
            "#,
        )
        .bind(&job_id)
        .bind(priority as i64)
        .bind(payload)
        .bind(now.timestamp_millis())
        .bind(now)
        .execute(&self.pool)
        .await?;

        info!(
            "enqueued job {} (priority={:?}, scenario={})",
            job_id, priority, job.scenario
        );
        Ok(job_id)
    }

    /// Lease the next runnable job, strict priority order.
    ///
    /// The claim is a single guarded UPDATE so concurrent workers never
    /// lease the same row. Malformed payloads are dead-lettered on the spot
    /// and the scan continues.
    pub async fn dequeue(&self) -> Result<Option<LeasedJob>, QueueError> {
        loop {
            let now_ms = Utc::now().timestamp_millis();
            let leased_until = now_ms + self.config.job_timeout.as_millis() as i64;

            let row: Option<(String, i64, String, i64)> = sqlx::query_as(
                r#"
                UPDATE jobs
                SET status = 'leased', leased_until_ms = ?
                , attempts = attempts + 1
                WHERE job_id = (
                    SELECT job_id FROM jobs
                    WHERE status = 'queued' AND run_at_ms <= ?
                    ORDER BY priority ASC, run_at_ms ASC, created_at ASC
                    LIMIT 1
                )
                RETURNING job_id, priority, payload, attempts
                "#,
            )
            .bind(leased_until)
            .bind(now_ms)
            .fetch_optional(&self.pool)
            .await?;

            let Some((job_id, priority, payload, attempts)) = row else {
                return Ok(None);
            };

            let wire: WireJob = match serde_json::from_str(&payload) {
                Ok(wire) => wire,
                Err(e) => {
                    warn!("dead-lettering undecodable job {}: {}", job_id, e);
                    self.bury(&job_id, &format!("payload decode: {e}")).await?;
                    continue;
                }
            };
            match AnalysisJob::from_wire(&job_id, wire) {
                Ok(job) => {
                    return Ok(Some(LeasedJob {
                        job_id,
                        job,
                        priority: JobPriority::from_i64(priority),
                        attempts,
                    }));
                }
                Err(e) => {
                    // Missing/unknown scenario: fatal, never retried.
                    warn!("dead-lettering malformed job {}: {}", job_id, e);
                    self.bury(&job_id, &e.to_string()).await?;
                    continue;
                }
            }
        }
    }

    /// Mark a leased job as successfully finished.
    pub async fn complete(&self, job_id: &str) -> Result<(), QueueError> {
        sqlx::query(
            "UPDATE jobs SET status = 'done', leased_until_ms = NULL, finished_at = ? WHERE job_id = ?",
        )
        .bind(Utc::now())
        .bind(job_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Record a transient failure: requeue with backoff, or dead-letter once
    /// the attempt budget is spent.
    pub async fn retry_or_bury(&self, job_id: &str, error: &str) -> Result<(), QueueError> {
        let attempts: Option<i64> =
            sqlx::query_scalar("SELECT attempts FROM jobs WHERE job_id = ?")
                .bind(job_id)
                .fetch_optional(&self.pool)
                .await?;
        let Some(attempts) = attempts else {
            return Ok(());
        };

        if attempts >= self.config.max_attempts {
            return self.bury(job_id, error).await;
        }

        let backoff_idx = (attempts as usize - 1).min(self.config.retry_backoff_secs.len() - 1);
        let delay_ms = self.config.retry_backoff_secs[backoff_idx] as i64 * 1000;
        let run_at = Utc::now().timestamp_millis() + delay_ms;

        sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'queued', leased_until_ms = NULL, run_at_ms = ?, last_error = ?
            WHERE job_id = ?
            "#,
        )
        .bind(run_at)
        .bind(error)
        .bind(job_id)
        .execute(&self.pool)
        .await?;
        info!("requeued job {} after failure (attempt {})", job_id, attempts);
        Ok(())
    }

    /// Move a job straight to the dead-letter zone (fatal or already handled
    /// user-visibly; no further retries).
    pub async fn bury(&self, job_id: &str, error: &str) -> Result<(), QueueError> {
        sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'dead', leased_until_ms = NULL, last_error = ?, finished_at = ?
            WHERE job_id = ?
            "#,
        )
        .bind(error)
        .bind(Utc::now())
        .bind(job_id)
        .execute(&self.pool)
        .await?;
        warn!("job {} moved to dead-letter: {}", job_id, error);
        Ok(())
    }

    /// Return expired leases to the queue (or the dead-letter zone when the
    /// attempt budget is spent). Run periodically on every worker.
    pub async fn reap_expired(&self) -> Result<u64, QueueError> {
        let now_ms = Utc::now().timestamp_millis();
        let expired: Vec<String> = sqlx::query_scalar(
            "SELECT job_id FROM jobs WHERE status = 'leased' AND leased_until_ms < ?",
        )
        .bind(now_ms)
        .fetch_all(&self.pool)
        .await?;

        let count = expired.len() as u64;
        for job_id in expired {
            self.retry_or_bury(&job_id, "execution timeout").await?;
        }
        Ok(count)
    }

    /// Drop finished rows past the result TTL and dead rows past the
    /// failure TTL.
    pub async fn sweep(&self) -> Result<u64, QueueError> {
        let now = Utc::now();
        let done_cutoff = now - chrono::Duration::from_std(self.config.result_ttl).unwrap_or_default();
        let dead_cutoff = now - chrono::Duration::from_std(self.config.failure_ttl).unwrap_or_default();

        let result = sqlx::query(
            r#"
            DELETE FROM jobs
            WHERE (status = 'done' AND finished_at < ?)
               OR (status = 'dead' AND finished_at < ?)
            "#,
        )
        .bind(done_cutoff)
        .bind(dead_cutoff)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Dead-letter inspection (diagnostics).
    pub async fn dead_letter_ids(&self) -> Result<Vec<String>, QueueError> {
        let ids = sqlx::query_scalar("SELECT job_id FROM jobs WHERE status = 'dead'")
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use database::Database;
    use detector_core::Scenario;

    async fn queue() -> JobQueue {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        JobQueue::new(db.pool().clone(), QueueConfig::default())
    }

    fn job(scenario: Scenario) -> AnalysisJob {
        AnalysisJob {
            user_id: 1,
            chat_id: 2,
            source_message_id: 3,
            progress_msg_id: 4,
            blob_key: "temp/1/a.jpg".into(),
            tier: "free".into(),
            scenario,
            preserve_exif: false,
        }
    }

    #[tokio::test]
    async fn test_high_priority_dequeues_first() {
        let q = queue().await;
        q.enqueue(&job(Scenario::General), JobPriority::Default)
            .await
            .unwrap();
        let high_id = q
            .enqueue(&job(Scenario::AdultBlackmail), JobPriority::High)
            .await
            .unwrap();

        let leased = q.dequeue().await.unwrap().unwrap();
        assert_eq!(leased.job_id, high_id);
        assert_eq!(leased.priority, JobPriority::High);
        assert_eq!(leased.attempts, 1);
    }

    #[tokio::test]
    async fn test_lease_hides_job_from_other_workers() {
        let q = queue().await;
        q.enqueue(&job(Scenario::General), JobPriority::Default)
            .await
            .unwrap();

        assert!(q.dequeue().await.unwrap().is_some());
        assert!(q.dequeue().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_complete_marks_done() {
        let q = queue().await;
        let id = q
            .enqueue(&job(Scenario::General), JobPriority::Default)
            .await
            .unwrap();
        let leased = q.dequeue().await.unwrap().unwrap();
        q.complete(&leased.job_id).await.unwrap();

        let status: String = sqlx::query_scalar("SELECT status FROM jobs WHERE job_id = ?")
            .bind(&id)
            .fetch_one(&q.pool)
            .await
            .unwrap();
        assert_eq!(status, "done");
    }

    #[tokio::test]
    async fn test_retry_backoff_then_dead_letter() {
        let q = queue().await;
        q.enqueue(&job(Scenario::General), JobPriority::Default)
            .await
            .unwrap();

        // Attempt 1 fails: requeued 10 s out, not immediately runnable.
        let leased = q.dequeue().await.unwrap().unwrap();
        q.retry_or_bury(&leased.job_id, "store unavailable")
            .await
            .unwrap();
        assert!(q.dequeue().await.unwrap().is_none());

        // Bring the retry time back into the past and burn the remaining
        // attempts.
        for _ in 0..2 {
            sqlx::query("UPDATE jobs SET run_at_ms = run_at_ms - 120000")
                .execute(&q.pool)
                .await
                .unwrap();
            let leased = q.dequeue().await.unwrap().unwrap();
            q.retry_or_bury(&leased.job_id, "store unavailable")
                .await
                .unwrap();
        }

        assert_eq!(q.dead_letter_ids().await.unwrap().len(), 1);
        sqlx::query("UPDATE jobs SET run_at_ms = run_at_ms - 120000")
            .execute(&q.pool)
            .await
            .unwrap();
        assert!(q.dequeue().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_scenario_coerced_not_buried() {
        let q = queue().await;
        // Simulate a legacy row written without a scenario tag.
        sqlx::query(
            r#"
            INSERT INTO jobs (job_id, priority, status, payload, attempts, run_at_ms, created_at)
            VALUES ('legacy-1', 1, 'queued',
                    '{"user_id":1,"chat_id":2,"source_message_id":3,"progress_msg_id":4,"blob_key":"k","tier":"free"}',
                    0, 0, ?)
            "#,
        )
        .bind(Utc::now())
        .execute(&q.pool)
        .await
        .unwrap();

        let leased = q.dequeue().await.unwrap().unwrap();
        assert_eq!(leased.job.scenario, Scenario::General);
    }

    #[tokio::test]
    async fn test_unknown_scenario_dead_lettered() {
        let q = queue().await;
        sqlx::query(
            r#"
            INSERT INTO jobs (job_id, priority, status, payload, attempts, run_at_ms, created_at)
            VALUES ('bad-1', 1, 'queued',
                    '{"user_id":1,"chat_id":2,"source_message_id":3,"progress_msg_id":4,"blob_key":"k","tier":"free","scenario":"casino"}',
                    0, 0, ?)
            "#,
        )
        .bind(Utc::now())
        .execute(&q.pool)
        .await
        .unwrap();

        // The bad job is buried and the scan reports an empty queue.
        assert!(q.dequeue().await.unwrap().is_none());
        assert_eq!(q.dead_letter_ids().await.unwrap(), vec!["bad-1".to_string()]);
    }

    #[tokio::test]
    async fn test_reap_expired_requeues() {
        let q = queue().await;
        q.enqueue(&job(Scenario::General), JobPriority::Default)
            .await
            .unwrap();
        let leased = q.dequeue().await.unwrap().unwrap();

        // Age the lease past its visibility timeout.
        sqlx::query("UPDATE jobs SET leased_until_ms = 0 WHERE job_id = ?")
            .bind(&leased.job_id)
            .execute(&q.pool)
            .await
            .unwrap();

        assert_eq!(q.reap_expired().await.unwrap(), 1);
        let status: String = sqlx::query_scalar("SELECT status FROM jobs WHERE job_id = ?")
            .bind(&leased.job_id)
            .fetch_one(&q.pool)
            .await
            .unwrap();
        assert_eq!(status, "queued");
    }

    #[tokio::test]
    async fn test_backpressure_limit() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        let q = JobQueue::new(
            db.pool().clone(),
            QueueConfig {
                depth_limit: Some(1),
                ..QueueConfig::default()
            },
        );

        q.enqueue(&job(Scenario::General), JobPriority::Default)
            .await
            .unwrap();
        let err = q
            .enqueue(&job(Scenario::General), JobPriority::Default)
            .await
            .unwrap_err();
        assert!(matches!(err, QueueError::Overloaded { .. }));
    }
}
