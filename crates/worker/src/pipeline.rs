//! The staged analysis pipeline.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use tracing::{error, info, warn};

use database::{analysis, user};
use detector_client::{DetailLevel, DetectorError};
use detector_core::fuse;
use job_queue::LeasedJob;
use notifier::keyboards;
use notifier::{copy, render_result, Geocoder, MessageSurface, ProgressNotifier, ResultView, Stage};
use object_store::ObjectStore;

use crate::error::WorkerError;
use crate::verifier::Verifier;

/// Attempts at persisting a finished analysis before giving up and relying
/// on log reconciliation.
const PERSIST_ATTEMPTS: u32 = 3;

/// How one job ended, as reported back to the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Analysis delivered; job is done.
    Completed { analysis_id: String },
    /// The failure was handled user-visibly (refund + message); the job
    /// moves to the failure zone for diagnostics, never retried.
    Buried { reason: String },
}

/// The worker pipeline: every collaborator behind a seam so the whole flow
/// runs in tests without a network.
pub struct Pipeline {
    pool: SqlitePool,
    store: Arc<dyn ObjectStore>,
    verifier: Arc<dyn Verifier>,
    surface: Arc<dyn MessageSurface>,
    geocoder: Arc<dyn Geocoder>,
    progress: ProgressNotifier,
    daily_free_quota: i64,
}

impl Pipeline {
    pub fn new(
        pool: SqlitePool,
        store: Arc<dyn ObjectStore>,
        verifier: Arc<dyn Verifier>,
        surface: Arc<dyn MessageSurface>,
        geocoder: Arc<dyn Geocoder>,
        daily_free_quota: i64,
    ) -> Self {
        let progress = ProgressNotifier::new(surface.clone());
        Self {
            pool,
            store,
            verifier,
            surface,
            geocoder,
            progress,
            daily_free_quota,
        }
    }

    /// Run one leased job to completion.
    ///
    /// Returns `Err` only for unexpected infrastructure failures the runner
    /// should retry through the queue; every anticipated failure is mapped
    /// to a user-visible message plus [`JobOutcome::Buried`].
    pub async fn run(&self, leased: &LeasedJob) -> Result<JobOutcome, WorkerError> {
        let job = &leased.job;
        let started = Instant::now();
        info!(
            job_id = %leased.job_id,
            scenario = %job.scenario,
            attempt = leased.attempts,
            "job started"
        );

        self.progress
            .update(job.chat_id, job.progress_msg_id, Stage::Preparing)
            .await;

        // Retrieve the blob. The store client retries transients
        // internally; what reaches us here is final.
        self.progress
            .update(job.chat_id, job.progress_msg_id, Stage::Downloading)
            .await;
        let image_bytes = match self.store.get(&job.blob_key).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(job_id = %leased.job_id, "blob retrieval failed: {e}");
                self.fail_transient(leased).await?;
                return Ok(JobOutcome::Buried {
                    reason: format!("blob retrieval: {e}"),
                });
            }
        };

        // The detection call. Metadata-preserving uploads get the detailed
        // profile.
        self.progress
            .update(job.chat_id, job.progress_msg_id, Stage::ExifExtraction)
            .await;
        self.progress
            .update(job.chat_id, job.progress_msg_id, Stage::AiDetection)
            .await;
        let detail_level = if job.preserve_exif {
            DetailLevel::Detailed
        } else {
            DetailLevel::Basic
        };
        let response = match self
            .verifier
            .verify(image_bytes.clone(), detail_level, job.preserve_exif)
            .await
        {
            Ok(response) => response,
            Err(e @ DetectorError::Timeout) => {
                warn!(job_id = %leased.job_id, "analysis timed out");
                self.fail_transient(leased).await?;
                return Ok(JobOutcome::Buried {
                    reason: e.to_string(),
                });
            }
            Err(e) => {
                warn!(job_id = %leased.job_id, "analysis call failed: {e}");
                self.fail_transient(leased).await?;
                return Ok(JobOutcome::Buried {
                    reason: e.to_string(),
                });
            }
        };

        // Local post-processing, bracketed by UX stages.
        self.progress
            .update(job.chat_id, job.progress_msg_id, Stage::FrequencyAnalysis)
            .await;
        let image_sha256 = sha256_hex(&image_bytes);
        let analysis_id = analysis::analysis_id_for(Utc::now(), &image_sha256);
        let signals = response.signals();

        self.progress
            .update(job.chat_id, job.progress_msg_id, Stage::FinalScoring)
            .await;
        let call = fuse(&signals);
        let processing_time_ms = response
            .processing_time_ms
            .unwrap_or(started.elapsed().as_millis() as u64) as i64;

        // Persist the record and read the tier in the same unit of work.
        let perceptual_hash = image_screen::perceptual_hash_of(&image_bytes).ok();
        let result_blob =
            serde_json::to_value(&response).unwrap_or(serde_json::Value::Null);
        let persisted = self
            .persist_with_retry(
                &analysis_id,
                leased,
                &call,
                &result_blob,
                &image_sha256,
                perceptual_hash.as_deref(),
                processing_time_ms,
            )
            .await;
        let tier = user::get_user(&self.pool, job.user_id)
            .await
            .map(|u| u.tier)
            .unwrap_or_else(|_| "free".to_string());

        if !persisted {
            // Deliver anyway; the record is reconstructible from this log.
            error!(
                job_id = %leased.job_id,
                analysis_id = %analysis_id,
                verdict = %call.verdict,
                confidence = call.confidence,
                sha256 = %image_sha256,
                "persistence failed after retries; delivering result for manual reconciliation"
            );
        }

        // Final message replaces the progress message. Notification errors
        // are logged, never retried through the queue.
        let view = ResultView {
            call: &call,
            scenario: job.scenario,
            signals: &signals,
            analysis_id: &analysis_id,
            image_sha256: &image_sha256,
            processing_time_ms: processing_time_ms as u64,
        };
        let body = render_result(&view, self.geocoder.as_ref()).await;
        let keyboard = keyboards::result_keyboard(job.scenario, &analysis_id);
        if let Err(e) = self
            .surface
            .edit(job.chat_id, job.progress_msg_id, &body, Some(keyboard))
            .await
        {
            warn!(job_id = %leased.job_id, "final notification failed: {e}");
        }

        // Best-effort cleanup; the bucket's 24 h lifecycle rule is the
        // backstop.
        if let Err(e) = self.store.delete(&job.blob_key).await {
            warn!(job_id = %leased.job_id, "blob delete failed: {e}");
        }

        info!(
            job_id = %leased.job_id,
            analysis_id = %analysis_id,
            verdict = %call.verdict,
            tier = %tier,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "job completed"
        );
        Ok(JobOutcome::Completed { analysis_id })
    }

    /// Transient failure: compensate the quota and tell the user, editing
    /// the progress message they are already watching.
    async fn fail_transient(&self, leased: &LeasedJob) -> Result<(), WorkerError> {
        let job = &leased.job;
        user::refund_quota(&self.pool, job.user_id, self.daily_free_quota).await?;
        if let Err(e) = self
            .surface
            .edit(
                job.chat_id,
                job.progress_msg_id,
                &copy::transient_failure(),
                None,
            )
            .await
        {
            warn!(job_id = %leased.job_id, "failure notification failed: {e}");
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn persist_with_retry(
        &self,
        analysis_id: &str,
        leased: &LeasedJob,
        call: &detector_core::VerdictCall,
        result_blob: &serde_json::Value,
        image_sha256: &str,
        perceptual_hash: Option<&str>,
        processing_time_ms: i64,
    ) -> bool {
        let job = &leased.job;
        for attempt in 1..=PERSIST_ATTEMPTS {
            let result = analysis::create_analysis(
                &self.pool,
                analysis::NewAnalysis {
                    analysis_id,
                    user_id: job.user_id,
                    scenario: job.scenario,
                    call,
                    result_blob,
                    image_sha256,
                    perceptual_hash,
                    blob_key: Some(&job.blob_key),
                    processing_time_ms,
                },
            )
            .await;
            match result {
                Ok(()) => return true,
                // Same bytes analysed again today: the stored record wins.
                Err(database::DatabaseError::AlreadyExists { .. }) => return true,
                Err(e) if attempt < PERSIST_ATTEMPTS => {
                    warn!(job_id = %leased.job_id, "persist attempt {attempt} failed: {e}");
                    tokio::time::sleep(std::time::Duration::from_millis(200 * attempt as u64))
                        .await;
                }
                Err(e) => {
                    warn!(job_id = %leased.job_id, "persist failed permanently: {e}");
                    return false;
                }
            }
        }
        false
    }
}

/// Hex-encoded sha256 of raw bytes.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        hex.push_str(&format!("{byte:02x}"));
    }
    hex
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use database::user::{ensure_user, get_user};
    use database::Database;
    use detector_client::VerifyResponse;
    use detector_core::Scenario;
    use job_queue::{AnalysisJob, JobPriority, JobQueue, LeasedJob, QueueConfig};
    use notifier::{NoopGeocoder, RecordingSurface};
    use object_store::MemoryStore;

    struct FixedVerifier(serde_json::Value);

    #[async_trait]
    impl Verifier for FixedVerifier {
        async fn verify(
            &self,
            _image_bytes: Vec<u8>,
            _detail_level: DetailLevel,
            _preserve_exif: bool,
        ) -> Result<VerifyResponse, DetectorError> {
            Ok(serde_json::from_value(self.0.clone()).unwrap())
        }
    }

    struct TimeoutVerifier;

    #[async_trait]
    impl Verifier for TimeoutVerifier {
        async fn verify(
            &self,
            _image_bytes: Vec<u8>,
            _detail_level: DetailLevel,
            _preserve_exif: bool,
        ) -> Result<VerifyResponse, DetectorError> {
            Err(DetectorError::Timeout)
        }
    }

    struct TestRig {
        db: Database,
        queue: JobQueue,
        store: Arc<MemoryStore>,
        surface: Arc<RecordingSurface>,
    }

    async fn rig() -> TestRig {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        let queue = JobQueue::new(db.pool().clone(), QueueConfig::default());
        TestRig {
            db,
            queue,
            store: Arc::new(MemoryStore::new()),
            surface: Arc::new(RecordingSurface::new()),
        }
    }

    fn pipeline(rig: &TestRig, verifier: Arc<dyn Verifier>) -> Pipeline {
        Pipeline::new(
            rig.db.pool().clone(),
            rig.store.clone(),
            verifier,
            rig.surface.clone(),
            Arc::new(NoopGeocoder),
            3,
        )
    }

    fn png_bytes() -> Vec<u8> {
        use image::{DynamicImage, Rgb, RgbImage};
        let mut img = RgbImage::new(48, 48);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            *pixel = Rgb([(x * 5) as u8, (y * 3) as u8, 99]);
        }
        let mut out = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::Png)
            .unwrap();
        out
    }

    async fn lease_job(rig: &TestRig, scenario: Scenario, blob_key: &str) -> LeasedJob {
        let job = AnalysisJob {
            user_id: 42,
            chat_id: 7,
            source_message_id: 100,
            progress_msg_id: 101,
            blob_key: blob_key.to_string(),
            tier: "free".to_string(),
            scenario,
            preserve_exif: false,
        };
        rig.queue.enqueue(&job, JobPriority::Default).await.unwrap();
        rig.queue.dequeue().await.unwrap().unwrap()
    }

    fn healthy_response() -> serde_json::Value {
        serde_json::json!({
            "verdict": "real",
            "confidence": 0.9,
            "processing_time_ms": 2500,
            "details": {
                "ai_detection_score": 0.1,
                "fft_score": 0.2,
                "metadata_fraud_score": 10,
                "camera_make": "Canon",
                "camera_model": "EOS R5"
            }
        })
    }

    #[tokio::test]
    async fn test_happy_path_persists_and_notifies() {
        let rig = rig().await;
        ensure_user(rig.db.pool(), 42, None, None, 3).await.unwrap();
        rig.store.put("temp/42/a.png", png_bytes()).await.unwrap();

        let leased = lease_job(&rig, Scenario::AdultBlackmail, "temp/42/a.png").await;
        let pipeline = pipeline(&rig, Arc::new(FixedVerifier(healthy_response())));

        let outcome = pipeline.run(&leased).await.unwrap();
        let JobOutcome::Completed { analysis_id } = outcome else {
            panic!("expected completion, got {outcome:?}");
        };

        // Scenario propagated into the persisted record.
        let record = analysis::get_analysis(rig.db.pool(), &analysis_id).await.unwrap();
        assert_eq!(record.scenario().unwrap(), Scenario::AdultBlackmail);
        assert_eq!(record.verdict, "real");
        assert!(record.perceptual_hash.is_some());

        // The final edit replaced the progress message and carries the id.
        let log = rig.surface.log();
        let last_edit = log.edited.last().unwrap();
        assert_eq!((last_edit.0, last_edit.1), (7, 101));
        assert!(last_edit.2.contains(&analysis_id));

        // Blob deleted after delivery.
        assert!(!rig.store.contains("temp/42/a.png"));
    }

    #[tokio::test]
    async fn test_progress_stages_in_order() {
        let rig = rig().await;
        ensure_user(rig.db.pool(), 42, None, None, 3).await.unwrap();
        rig.store.put("temp/42/a.png", png_bytes()).await.unwrap();

        let leased = lease_job(&rig, Scenario::General, "temp/42/a.png").await;
        let pipeline = pipeline(&rig, Arc::new(FixedVerifier(healthy_response())));
        pipeline.run(&leased).await.unwrap();

        let log = rig.surface.log();
        let stage_texts: Vec<&str> = log
            .edited
            .iter()
            .map(|(_, _, text)| text.as_str())
            .collect();
        let order = [
            Stage::Preparing,
            Stage::Downloading,
            Stage::ExifExtraction,
            Stage::AiDetection,
            Stage::FrequencyAnalysis,
            Stage::FinalScoring,
        ];
        for (i, stage) in order.iter().enumerate() {
            assert_eq!(stage_texts[i], stage.render(), "stage {i} out of order");
        }
    }

    #[tokio::test]
    async fn test_analysis_timeout_refunds_and_buries() {
        let rig = rig().await;
        ensure_user(rig.db.pool(), 42, None, None, 3).await.unwrap();
        user::charge_quota(rig.db.pool(), 42, 3).await.unwrap();
        rig.store.put("temp/42/a.png", png_bytes()).await.unwrap();

        let leased = lease_job(&rig, Scenario::General, "temp/42/a.png").await;
        let pipeline = pipeline(&rig, Arc::new(TimeoutVerifier));

        let outcome = pipeline.run(&leased).await.unwrap();
        assert!(matches!(outcome, JobOutcome::Buried { .. }));

        // Quota restored after the episode.
        let user = get_user(rig.db.pool(), 42).await.unwrap();
        assert_eq!(user.daily_quota_remaining, 3);

        // No analysis record was written.
        assert!(analysis::latest_for_user(rig.db.pool(), 42)
            .await
            .unwrap()
            .is_none());

        // The user saw a transient-failure message.
        let log = rig.surface.log();
        assert!(log.edited.last().unwrap().2.contains("Analysis failed"));
    }

    #[tokio::test]
    async fn test_missing_blob_refunds_and_buries() {
        let rig = rig().await;
        ensure_user(rig.db.pool(), 42, None, None, 3).await.unwrap();
        user::charge_quota(rig.db.pool(), 42, 3).await.unwrap();

        let leased = lease_job(&rig, Scenario::General, "temp/42/gone.png").await;
        let pipeline = pipeline(&rig, Arc::new(FixedVerifier(healthy_response())));

        let outcome = pipeline.run(&leased).await.unwrap();
        assert!(matches!(outcome, JobOutcome::Buried { .. }));
        let user = get_user(rig.db.pool(), 42).await.unwrap();
        assert_eq!(user.daily_quota_remaining, 3);
    }

    #[tokio::test]
    async fn test_notification_failure_still_completes() {
        let rig = rig().await;
        ensure_user(rig.db.pool(), 42, None, None, 3).await.unwrap();
        rig.store.put("temp/42/a.png", png_bytes()).await.unwrap();
        rig.surface.set_edits_failing(true);

        let leased = lease_job(&rig, Scenario::General, "temp/42/a.png").await;
        let pipeline = pipeline(&rig, Arc::new(FixedVerifier(healthy_response())));

        // Edits fail throughout, the job still completes and persists.
        let outcome = pipeline.run(&leased).await.unwrap();
        let JobOutcome::Completed { analysis_id } = outcome else {
            panic!("expected completion");
        };
        assert!(analysis::get_analysis(rig.db.pool(), &analysis_id).await.is_ok());
    }

    #[tokio::test]
    async fn test_watermarked_response_renders_ai_verdict() {
        let rig = rig().await;
        ensure_user(rig.db.pool(), 42, None, None, 3).await.unwrap();
        rig.store.put("temp/42/a.png", png_bytes()).await.unwrap();

        let response = serde_json::json!({
            "verdict": "ai_generated",
            "processing_time_ms": 1200,
            "details": {
                "visual_watermark": {
                    "generator": "Google Gemini/Imagen",
                    "text": "made with google ai",
                    "location": "bottom_right",
                    "confidence": 0.90
                }
            }
        });
        let leased = lease_job(&rig, Scenario::General, "temp/42/a.png").await;
        let pipeline = pipeline(&rig, Arc::new(FixedVerifier(response)));
        pipeline.run(&leased).await.unwrap();

        let record = analysis::latest_for_user(rig.db.pool(), 42)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.verdict, "ai_generated");
        assert!(record.confidence >= 0.95);
        assert!(record.reason.contains("Google"));
    }
}
