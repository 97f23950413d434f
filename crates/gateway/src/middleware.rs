//! The fixed middleware chain: log -> rate-limit -> duplicate-upload.
//!
//! Order matters: the rate limiter relies on the log context being present,
//! and the duplicate check assumes the event already passed basic validity.
//! Each middleware may short-circuit with a user-visible reply; everything
//! else fails open so a degraded dependency never blocks the bot.

use async_trait::async_trait;
use chat_api::ChatApiError;
use chrono::Utc;
use image_screen::{ScreenReport, Screener};
use sqlx::SqlitePool;
use tracing::{info, warn};

use database::analysis;
use database::rate_limit::{self, RateDecision};

use crate::context::{ChatEvent, EventContext, ScreenedUpload};

/// Outcome of one middleware step.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Continue,
    /// Stop the chain; optionally reply to the user.
    Reject { reply: Option<String> },
}

/// One link in the chain.
#[async_trait]
pub trait Middleware: Send + Sync {
    fn name(&self) -> &'static str;
    async fn handle(&self, event: &ChatEvent, ctx: &mut EventContext) -> Decision;
}

/// Run the chain in order; the first rejection wins.
pub async fn run_chain(
    chain: &[Box<dyn Middleware>],
    event: &ChatEvent,
    ctx: &mut EventContext,
) -> Decision {
    for middleware in chain {
        if let Decision::Reject { reply } = middleware.handle(event, ctx).await {
            info!(
                user = %ctx.anonymized_user_id,
                middleware = middleware.name(),
                "event rejected"
            );
            return Decision::Reject { reply };
        }
    }
    Decision::Continue
}

/// Structured event log. Only the anonymized user id, the event kind, and
/// timing ever reach the log - no raw ids, no text, no image bytes.
pub struct LoggingMiddleware;

#[async_trait]
impl Middleware for LoggingMiddleware {
    fn name(&self) -> &'static str {
        "logging"
    }

    async fn handle(&self, event: &ChatEvent, ctx: &mut EventContext) -> Decision {
        info!(
            user = %ctx.anonymized_user_id,
            kind = event.kind(),
            "event received"
        );
        Decision::Continue
    }
}

/// Sliding-window rate limiter over the shared store.
pub struct RateLimitMiddleware {
    pool: SqlitePool,
    capacity: u32,
    window_secs: u64,
}

impl RateLimitMiddleware {
    pub fn new(pool: SqlitePool, capacity: u32, window_secs: u64) -> Self {
        Self {
            pool,
            capacity,
            window_secs,
        }
    }
}

#[async_trait]
impl Middleware for RateLimitMiddleware {
    fn name(&self) -> &'static str {
        "rate_limit"
    }

    async fn handle(&self, event: &ChatEvent, ctx: &mut EventContext) -> Decision {
        let Some(user_id) = event.user_id() else {
            return Decision::Continue;
        };
        let now_ms = Utc::now().timestamp_millis();
        match rate_limit::check_and_record(&self.pool, user_id, self.capacity, self.window_secs, now_ms)
            .await
        {
            Ok(RateDecision::Allowed) => Decision::Continue,
            Ok(RateDecision::Limited { retry_after_secs }) => Decision::Reject {
                reply: Some(notifier::copy::rate_limited(retry_after_secs)),
            },
            Err(e) => {
                // Deliberately fail open: a broken limiter store must not
                // take the bot down with it.
                warn!(user = %ctx.anonymized_user_id, "rate-limit store error: {e}");
                Decision::Continue
            }
        }
    }
}

/// Fetches attachment bytes; the seam that lets tests skip the platform.
#[async_trait]
pub trait AttachmentFetcher: Send + Sync {
    async fn fetch(&self, file_id: &str) -> Result<Vec<u8>, ChatApiError>;
}

#[async_trait]
impl AttachmentFetcher for chat_api::ChatClient {
    async fn fetch(&self, file_id: &str) -> Result<Vec<u8>, ChatApiError> {
        self.download_file(file_id).await
    }
}

/// Duplicate-upload guard.
///
/// Downloads the image, screens it once (the result is cached on the
/// context for the handler), and looks the perceptual hash up in the
/// recent-analyses index. A hit short-circuits with a reuse notice before
/// any quota is spent. Keying on pixels rather than bytes is what defeats
/// micro-perturbation re-uploads.
pub struct DuplicateUploadMiddleware<F: AttachmentFetcher> {
    fetcher: F,
    screener: Screener,
    pool: SqlitePool,
    window_hours: i64,
}

impl<F: AttachmentFetcher> DuplicateUploadMiddleware<F> {
    pub fn new(fetcher: F, screener: Screener, pool: SqlitePool, window_hours: i64) -> Self {
        Self {
            fetcher,
            screener,
            pool,
            window_hours,
        }
    }

    fn image_file(event: &ChatEvent) -> Option<(String, bool, String)> {
        let ChatEvent::Message(message) = event else {
            return None;
        };
        if let Some(document) = message
            .document
            .as_ref()
            .filter(|d| d.mime_type.as_deref().is_some_and(|m| m.starts_with("image/")))
        {
            return Some((document.file_id.clone(), true, document.extension()));
        }
        message
            .largest_photo()
            .map(|photo| (photo.file_id.clone(), false, "jpg".to_string()))
    }
}

#[async_trait]
impl<F: AttachmentFetcher> Middleware for DuplicateUploadMiddleware<F> {
    fn name(&self) -> &'static str {
        "duplicate_upload"
    }

    async fn handle(&self, event: &ChatEvent, ctx: &mut EventContext) -> Decision {
        let Some((file_id, via_document, extension)) = Self::image_file(event) else {
            return Decision::Continue;
        };
        let Some(user_id) = event.user_id() else {
            return Decision::Continue;
        };

        let bytes = match self.fetcher.fetch(&file_id).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(user = %ctx.anonymized_user_id, "attachment fetch failed: {e}");
                return Decision::Continue;
            }
        };

        let report = self.screener.screen(&bytes);
        let perceptual_hash = match &report {
            ScreenReport::Valid(profile) => Some(profile.perceptual_hash.clone()),
            _ => None,
        };
        ctx.upload = Some(ScreenedUpload {
            bytes,
            report,
            via_document,
            extension,
        });

        let Some(hash) = perceptual_hash else {
            // Screening rejections are the handler's job (quota ordering).
            return Decision::Continue;
        };

        match analysis::find_recent_by_phash(&self.pool, user_id, &hash, self.window_hours).await {
            Ok(Some(prior)) => Decision::Reject {
                reply: Some(notifier::copy::duplicate_notice(&prior.analysis_id)),
            },
            Ok(None) => Decision::Continue,
            Err(e) => {
                warn!(user = %ctx.anonymized_user_id, "duplicate index error: {e}");
                Decision::Continue
            }
        }
    }
}
