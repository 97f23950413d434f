//! The ingress application: wiring, event loop, and the upload transition.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chat_api::types::{
    AnswerCallbackParams, CallbackQuery, EditMessageParams, Message, SendDocumentParams,
    SendMessageParams,
};
use chat_api::{subscribe, ChatClient};
use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::{error, info, warn};
use uuid::Uuid;

use database::{analysis, usage, user, Database};
use detector_client::DetectorClient;
use detector_core::{fuse, DetectorSignals, Scenario};
use image_screen::{ScreenReport, Screener};
use job_queue::{AnalysisJob, JobPriority, JobQueue, QueueError};
use notifier::keyboards;
use notifier::{copy, render_result, NoopGeocoder, ResultView};
use object_store::ObjectStore;

use crate::config::GatewayConfig;
use crate::context::{ChatEvent, EventContext, ScreenedUpload};
use crate::error::GatewayError;
use crate::handlers::{parse_callback, parse_command, CallbackRoute, Command};
use crate::middleware::{
    run_chain, Decision, DuplicateUploadMiddleware, LoggingMiddleware, Middleware,
    RateLimitMiddleware,
};
use crate::state::{ConversationState, StateStore};

/// How often the periodic sweeps (rate events, expired states) run.
const SWEEP_INTERVAL: Duration = Duration::from_secs(600);

/// The ingress process.
pub struct Gateway {
    chat: ChatClient,
    db: Database,
    queue: JobQueue,
    store: Arc<dyn ObjectStore>,
    screener: Screener,
    detector: DetectorClient,
    states: StateStore,
    chain: Vec<Box<dyn Middleware>>,
    config: GatewayConfig,
    last_sweep: Instant,
}

impl Gateway {
    pub fn new(
        chat: ChatClient,
        db: Database,
        queue: JobQueue,
        store: Arc<dyn ObjectStore>,
        detector: DetectorClient,
        config: GatewayConfig,
    ) -> Self {
        let screener = Screener::new(config.max_upload_mb);
        let chain: Vec<Box<dyn Middleware>> = vec![
            Box::new(LoggingMiddleware),
            Box::new(RateLimitMiddleware::new(
                db.pool().clone(),
                config.rate_capacity,
                config.rate_window_secs,
            )),
            Box::new(DuplicateUploadMiddleware::new(
                chat.clone(),
                screener.clone(),
                db.pool().clone(),
                config.duplicate_window_hours,
            )),
        ];
        Self {
            chat,
            db,
            queue,
            store,
            screener,
            detector,
            states: StateStore::new(),
            chain,
            config,
            last_sweep: Instant::now(),
        }
    }

    /// Main loop: pull updates forever, dispatching serially in arrival
    /// order. Handler errors are logged and never kill the loop.
    pub async fn run(mut self) -> Result<(), GatewayError> {
        info!("gateway starting");
        let mut stream = subscribe(&self.chat);
        loop {
            let update = stream.next().await;
            let Some(event) = ChatEvent::from_update(update) else {
                continue;
            };
            let mut ctx = EventContext::new(event.user_id());

            if let Decision::Reject { reply } = run_chain(&self.chain, &event, &mut ctx).await {
                if let (Some(chat_id), Some(text)) = (event.chat_id(), reply) {
                    if let Err(e) = self.chat.send_text(chat_id, &text).await {
                        warn!("rejection reply failed: {e}");
                    }
                }
                continue;
            }

            let kind = event.kind();
            if let Err(e) = self.dispatch(event, &mut ctx).await {
                error!(user = %ctx.anonymized_user_id, kind, "handler error: {e}");
            }
            info!(
                user = %ctx.anonymized_user_id,
                kind,
                latency_ms = ctx.received_at.elapsed().as_millis() as u64,
                "event handled"
            );

            self.maybe_sweep().await;
        }
    }

    /// Periodic housekeeping, piggybacked on the event loop.
    async fn maybe_sweep(&mut self) {
        if self.last_sweep.elapsed() < SWEEP_INTERVAL {
            return;
        }
        self.last_sweep = Instant::now();
        self.states.prune();
        let now_ms = Utc::now().timestamp_millis();
        if let Err(e) =
            database::rate_limit::sweep(self.db.pool(), self.config.rate_window_secs, now_ms).await
        {
            warn!("rate-event sweep failed: {e}");
        }
        if let Err(e) = self.queue.sweep().await {
            warn!("queue sweep failed: {e}");
        }
    }

    async fn dispatch(&self, event: ChatEvent, ctx: &mut EventContext) -> Result<(), GatewayError> {
        match event {
            ChatEvent::Message(message) => self.handle_message(message, ctx).await,
            ChatEvent::Callback(callback) => self.handle_callback(callback).await,
        }
    }

    async fn handle_message(
        &self,
        message: Message,
        ctx: &mut EventContext,
    ) -> Result<(), GatewayError> {
        let Some(from) = message.from.clone() else {
            return Ok(());
        };
        let chat_id = message.chat.id;

        if let Some(command) = message.text.as_deref().and_then(parse_command) {
            return self.handle_command(command, chat_id, &from).await;
        }
        if message.has_image() {
            return self.handle_upload(&message, ctx).await;
        }

        // Plain text: prompt according to where the conversation stands.
        match self.states.get(chat_id, from.id) {
            Some(ConversationState::AdultWaitingForEvidence) => {
                self.chat.send_text(chat_id, &copy::adult_waiting_prompt()).await?;
            }
            Some(ConversationState::TeenagerStopShown)
            | Some(ConversationState::TeenagerWaitingForPhoto) => {
                self.chat.send_text(chat_id, &copy::teen_waiting_prompt()).await?;
            }
            _ => {
                self.chat
                    .send_with_keyboard(
                        chat_id,
                        &copy::welcome(),
                        keyboards::scenario_selection_keyboard(),
                    )
                    .await?;
                self.states
                    .set(chat_id, from.id, ConversationState::SelectingScenario);
            }
        }
        Ok(())
    }

    async fn handle_command(
        &self,
        command: Command,
        chat_id: i64,
        from: &chat_api::types::ChatUser,
    ) -> Result<(), GatewayError> {
        let user_id = from.id;
        match command {
            Command::Start => {
                user::ensure_user(
                    self.db.pool(),
                    user_id,
                    from.username.as_deref(),
                    from.first_name.as_deref(),
                    self.config.daily_free_quota,
                )
                .await?;
                // /start resets the conversation but never cancels an
                // in-flight job; its result lands on the captured
                // progress message.
                self.states.clear(chat_id, user_id);
                self.chat
                    .send_with_keyboard(
                        chat_id,
                        &copy::welcome(),
                        keyboards::scenario_selection_keyboard(),
                    )
                    .await?;
                self.states
                    .set(chat_id, user_id, ConversationState::SelectingScenario);
            }
            Command::Help => {
                self.chat.send_text(chat_id, &copy::help()).await?;
            }
            Command::Status => {
                let record = user::ensure_user(
                    self.db.pool(),
                    user_id,
                    from.username.as_deref(),
                    from.first_name.as_deref(),
                    self.config.daily_free_quota,
                )
                .await?;
                let body = copy::status(
                    &record.tier,
                    record.daily_quota_remaining,
                    self.config.daily_free_quota,
                    record.total_checks,
                );
                self.chat.send_text(chat_id, &body).await?;
            }
        }
        Ok(())
    }

    /// The critical transition: quota, screening, blob, progress message,
    /// enqueue. Any failure after the quota charge refunds it.
    async fn handle_upload(
        &self,
        message: &Message,
        ctx: &mut EventContext,
    ) -> Result<(), GatewayError> {
        let Some(from) = message.from.as_ref() else {
            return Ok(());
        };
        let user_id = from.id;
        let chat_id = message.chat.id;
        let state = self.states.get(chat_id, user_id);
        let scenario = ConversationState::upload_scenario(state.as_ref());

        user::ensure_user(
            self.db.pool(),
            user_id,
            from.username.as_deref(),
            from.first_name.as_deref(),
            self.config.daily_free_quota,
        )
        .await?;

        // Step 1: charge the quota before anything expensive.
        let tier = match user::charge_quota(self.db.pool(), user_id, self.config.daily_free_quota)
            .await
        {
            Ok(tier) => tier,
            Err(database::DatabaseError::QuotaExhausted(_)) => {
                self.chat
                    .send_text(chat_id, &copy::quota_exhausted(self.config.daily_free_quota))
                    .await?;
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        usage::record_usage(self.db.pool(), user_id, Utc::now().date_naive()).await?;

        match self
            .run_upload_pipeline(message, ctx, user_id, chat_id, scenario, tier)
            .await
        {
            Ok(()) => Ok(()),
            Err(e) => {
                // Compensating refund: the user keeps their check on any
                // pipeline failure after the charge.
                warn!(user = %ctx.anonymized_user_id, "upload pipeline failed: {e}");
                user::refund_quota(self.db.pool(), user_id, self.config.daily_free_quota).await?;
                self.chat.send_text(chat_id, &copy::transient_failure()).await?;
                Ok(())
            }
        }
    }

    async fn run_upload_pipeline(
        &self,
        message: &Message,
        ctx: &mut EventContext,
        user_id: i64,
        chat_id: i64,
        scenario: Scenario,
        tier: database::Tier,
    ) -> Result<(), GatewayError> {
        // Step 2: screening (usually cached by the duplicate middleware).
        let upload = match ctx.upload.take() {
            Some(upload) => upload,
            None => self.fetch_and_screen(message).await?,
        };

        let profile = match &upload.report {
            ScreenReport::Valid(profile) => profile.clone(),
            ScreenReport::TooLarge { size_bytes, max_bytes } => {
                let reason = format!(
                    "File too large: {:.1} MB (max {} MB)",
                    *size_bytes as f64 / (1024.0 * 1024.0),
                    max_bytes / (1024 * 1024)
                );
                return self.reject_upload(user_id, chat_id, &reason).await;
            }
            ScreenReport::UnsupportedFormat => {
                return self
                    .reject_upload(user_id, chat_id, "Unsupported image format.")
                    .await;
            }
            ScreenReport::Undecodable { reason } => {
                let reason = reason.clone();
                return self.reject_upload(user_id, chat_id, &reason).await;
            }
            ScreenReport::Screenshot { reason } => {
                user::refund_quota(self.db.pool(), user_id, self.config.daily_free_quota).await?;
                self.chat
                    .send_text(chat_id, &copy::screenshot_rejected(scenario, reason))
                    .await?;
                return Ok(());
            }
            ScreenReport::AiWatermark { reason } => {
                // The verdict is already decided; skip remote analysis.
                let reason = reason.clone();
                return self
                    .short_circuit_ai(&upload, &reason, user_id, chat_id, scenario)
                    .await;
            }
        };

        // Step 3: duplicate re-check with the computed hash. The middleware
        // normally catches this earlier; a race between two rapid uploads
        // can still land here.
        if let Some(prior) = analysis::find_recent_by_phash(
            self.db.pool(),
            user_id,
            &profile.perceptual_hash,
            self.config.duplicate_window_hours,
        )
        .await?
        {
            user::refund_quota(self.db.pool(), user_id, self.config.daily_free_quota).await?;
            self.chat
                .send_text(chat_id, &copy::duplicate_notice(&prior.analysis_id))
                .await?;
            return Ok(());
        }

        // Step 4: blob upload.
        let blob_key = format!("temp/{user_id}/{}.{}", Uuid::new_v4(), upload.extension);
        self.store.put(&blob_key, upload.bytes.clone()).await?;

        // Step 5: the progress message whose id every later edit targets.
        let progress = self
            .chat
            .send_message(SendMessageParams::html(
                chat_id,
                copy::analysis_started(scenario, upload.via_document),
            ))
            .await?;

        // Step 6: enqueue, respecting backpressure.
        let job = AnalysisJob {
            user_id,
            chat_id,
            source_message_id: message.message_id,
            progress_msg_id: progress.message_id,
            blob_key: blob_key.clone(),
            tier: tier.as_str().to_string(),
            scenario,
            preserve_exif: upload.via_document,
        };
        let job_id = match self.queue.enqueue(&job, JobPriority::for_tier(tier)).await {
            Ok(job_id) => job_id,
            Err(QueueError::Overloaded { depth, limit }) => {
                warn!("refusing upload: queue depth {depth} >= {limit}");
                user::refund_quota(self.db.pool(), user_id, self.config.daily_free_quota).await?;
                if let Err(e) = self.store.delete(&blob_key).await {
                    warn!("orphan blob cleanup failed: {e}");
                }
                self.chat
                    .edit_message(EditMessageParams::html(
                        chat_id,
                        progress.message_id,
                        copy::overloaded(),
                    ))
                    .await?;
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        // Step 7: the conversation now waits for the worker.
        self.states.set(
            chat_id,
            user_id,
            ConversationState::AnalysisInFlight {
                job_id,
                progress_msg_id: progress.message_id,
                scenario,
            },
        );
        Ok(())
    }

    /// Validation refusal: refund and explain.
    async fn reject_upload(
        &self,
        user_id: i64,
        chat_id: i64,
        reason: &str,
    ) -> Result<(), GatewayError> {
        user::refund_quota(self.db.pool(), user_id, self.config.daily_free_quota).await?;
        self.chat
            .send_text(chat_id, &copy::unsupported_media(reason))
            .await?;
        Ok(())
    }

    /// AI-watermark short-circuit: a local verdict at confidence 0.98,
    /// persisted like any other analysis so duplicates of it still hit the
    /// index, then rendered with the scenario keyboard.
    async fn short_circuit_ai(
        &self,
        upload: &ScreenedUpload,
        reason: &str,
        user_id: i64,
        chat_id: i64,
        scenario: Scenario,
    ) -> Result<(), GatewayError> {
        let signals = DetectorSignals {
            ai_software_in_exif: true,
            ..Default::default()
        };
        let call = fuse(&signals);

        let image_sha256 = sha256_hex(&upload.bytes);
        let now = Utc::now();
        let analysis_id = analysis::analysis_id_for(now, &image_sha256);
        let perceptual_hash = image_screen::perceptual_hash_of(&upload.bytes).ok();
        let result_blob = serde_json::json!({
            "source": "pre_analysis_screen",
            "reason": reason,
        });

        match analysis::create_analysis(
            self.db.pool(),
            analysis::NewAnalysis {
                analysis_id: &analysis_id,
                user_id,
                scenario,
                call: &call,
                result_blob: &result_blob,
                image_sha256: &image_sha256,
                perceptual_hash: perceptual_hash.as_deref(),
                blob_key: None,
                processing_time_ms: 0,
            },
        )
        .await
        {
            Ok(()) | Err(database::DatabaseError::AlreadyExists { .. }) => {}
            Err(e) => return Err(e.into()),
        }

        self.chat
            .send_text(chat_id, &copy::ai_watermark_shortcircuit(scenario, reason))
            .await?;

        let view = ResultView {
            call: &call,
            scenario,
            signals: &signals,
            analysis_id: &analysis_id,
            image_sha256: &image_sha256,
            processing_time_ms: 0,
        };
        let body = render_result(&view, &NoopGeocoder).await;
        self.chat
            .send_with_keyboard(chat_id, &body, keyboards::result_keyboard(scenario, &analysis_id))
            .await?;

        self.states.set(
            chat_id,
            user_id,
            ConversationState::ReviewingResult {
                analysis_id,
                scenario,
            },
        );
        Ok(())
    }

    async fn fetch_and_screen(&self, message: &Message) -> Result<ScreenedUpload, GatewayError> {
        let (file_id, via_document, extension) = if let Some(document) = message
            .document
            .as_ref()
            .filter(|d| d.mime_type.as_deref().is_some_and(|m| m.starts_with("image/")))
        {
            (document.file_id.clone(), true, document.extension())
        } else if let Some(photo) = message.largest_photo() {
            (photo.file_id.clone(), false, "jpg".to_string())
        } else {
            return Err(GatewayError::Configuration(
                "upload handler called without an image".to_string(),
            ));
        };

        let bytes = self.chat.download_file(&file_id).await?;
        let report = self.screener.screen(&bytes);
        Ok(ScreenedUpload {
            bytes,
            report,
            via_document,
            extension,
        })
    }

    async fn handle_callback(&self, callback: CallbackQuery) -> Result<(), GatewayError> {
        let user_id = callback.from.id;
        let Some(route) = callback.data.as_deref().and_then(parse_callback) else {
            self.chat
                .answer_callback(AnswerCallbackParams::ack(&callback.id))
                .await?;
            return Ok(());
        };
        let Some(message) = callback.message.as_ref() else {
            self.chat
                .answer_callback(AnswerCallbackParams::ack(&callback.id))
                .await?;
            return Ok(());
        };
        let chat_id = message.chat.id;
        let message_id = message.message_id;

        // A result-keyboard press implies the user saw the result; catch the
        // state machine up if it still shows the analysis in flight.
        if matches!(
            route,
            CallbackRoute::Pdf(_)
                | CallbackRoute::Share(_)
                | CallbackRoute::AdultCounterMeasures
                | CallbackRoute::TeenTellParents
                | CallbackRoute::TeenStopSpread
                | CallbackRoute::TeenEducation
        ) {
            if let Some(ConversationState::AnalysisInFlight { scenario, .. }) =
                self.states.get(chat_id, user_id)
            {
                if let Some(latest) = analysis::latest_for_user(self.db.pool(), user_id).await? {
                    self.states.set(
                        chat_id,
                        user_id,
                        ConversationState::ReviewingResult {
                            analysis_id: latest.analysis_id,
                            scenario,
                        },
                    );
                }
            }
        }

        match route {
            CallbackRoute::ScenarioAdult => {
                self.states
                    .set(chat_id, user_id, ConversationState::AdultWaitingForEvidence);
                self.chat
                    .edit_message(EditMessageParams::html(chat_id, message_id, copy::adult_intro()))
                    .await?;
                self.chat
                    .answer_callback(AnswerCallbackParams::ack(&callback.id))
                    .await?;
            }
            CallbackRoute::ScenarioTeen => {
                self.states
                    .set(chat_id, user_id, ConversationState::TeenagerStopShown);
                self.chat
                    .edit_message(
                        EditMessageParams::html(chat_id, message_id, copy::teen_stop())
                            .with_keyboard(keyboards::teen_ready_keyboard()),
                    )
                    .await?;
                self.chat
                    .answer_callback(AnswerCallbackParams::toast(
                        &callback.id,
                        "You're safe. Let's take this step by step.",
                    ))
                    .await?;
            }
            CallbackRoute::ScenarioGeneral => {
                self.states
                    .set(chat_id, user_id, ConversationState::SelectingScenario);
                self.chat
                    .edit_message(EditMessageParams::html(
                        chat_id,
                        message_id,
                        copy::general_intro(),
                    ))
                    .await?;
                self.chat
                    .answer_callback(AnswerCallbackParams::ack(&callback.id))
                    .await?;
            }
            CallbackRoute::BackToMenu => {
                self.states.clear(chat_id, user_id);
                self.chat
                    .edit_message(
                        EditMessageParams::html(chat_id, message_id, copy::welcome())
                            .with_keyboard(keyboards::scenario_selection_keyboard()),
                    )
                    .await?;
                self.states
                    .set(chat_id, user_id, ConversationState::SelectingScenario);
                self.chat
                    .answer_callback(AnswerCallbackParams::ack(&callback.id))
                    .await?;
            }
            CallbackRoute::TeenReady => {
                self.states
                    .set(chat_id, user_id, ConversationState::TeenagerWaitingForPhoto);
                self.chat
                    .edit_message(EditMessageParams::html(chat_id, message_id, copy::teen_ready()))
                    .await?;
                self.chat
                    .answer_callback(AnswerCallbackParams::ack(&callback.id))
                    .await?;
            }
            CallbackRoute::AdultCounterMeasures => {
                let Some(latest) = analysis::latest_for_user(self.db.pool(), user_id).await? else {
                    self.chat
                        .answer_callback(AnswerCallbackParams::alert(
                            &callback.id,
                            "No analysis on record yet - send a photo first.",
                        ))
                        .await?;
                    return Ok(());
                };
                self.chat
                    .edit_message(
                        EditMessageParams::html(
                            chat_id,
                            message_id,
                            copy::counter_measures(&latest.analysis_id, &latest.image_sha256),
                        )
                        .with_keyboard(keyboards::counter_measures_keyboard(&latest.analysis_id)),
                    )
                    .await?;
                self.chat
                    .answer_callback(AnswerCallbackParams::ack(&callback.id))
                    .await?;
            }
            CallbackRoute::CounterTemplates => {
                let Some(latest) = analysis::latest_for_user(self.db.pool(), user_id).await? else {
                    self.chat
                        .answer_callback(AnswerCallbackParams::alert(
                            &callback.id,
                            "No analysis on record yet - send a photo first.",
                        ))
                        .await?;
                    return Ok(());
                };
                self.chat
                    .edit_message(
                        EditMessageParams::html(
                            chat_id,
                            message_id,
                            copy::safe_response_templates(
                                &latest.analysis_id,
                                &latest.image_sha256,
                            ),
                        )
                        .with_keyboard(keyboards::menu_only_keyboard()),
                    )
                    .await?;
                self.chat
                    .answer_callback(AnswerCallbackParams::toast(&callback.id, "Templates ready"))
                    .await?;
            }
            CallbackRoute::TeenTellParents => {
                let analysis_id = analysis::latest_for_user(self.db.pool(), user_id)
                    .await?
                    .map(|a| a.analysis_id)
                    .unwrap_or_else(|| "unknown".to_string());
                self.chat
                    .edit_message(
                        EditMessageParams::html(chat_id, message_id, copy::tell_parents(&analysis_id))
                            .with_keyboard(keyboards::tell_parents_keyboard(&analysis_id)),
                    )
                    .await?;
                self.chat
                    .answer_callback(AnswerCallbackParams::ack(&callback.id))
                    .await?;
            }
            CallbackRoute::TeenConversationScript => {
                self.chat
                    .edit_message(
                        EditMessageParams::html(chat_id, message_id, copy::conversation_script())
                            .with_keyboard(keyboards::menu_only_keyboard()),
                    )
                    .await?;
                self.chat
                    .answer_callback(AnswerCallbackParams::ack(&callback.id))
                    .await?;
            }
            CallbackRoute::TeenStopSpread => {
                self.chat
                    .edit_message(
                        EditMessageParams::html(chat_id, message_id, copy::stop_spread())
                            .with_keyboard(keyboards::stop_spread_keyboard()),
                    )
                    .await?;
                self.chat
                    .answer_callback(AnswerCallbackParams::ack(&callback.id))
                    .await?;
            }
            CallbackRoute::TeenEducation => {
                self.chat
                    .edit_message(
                        EditMessageParams::html(chat_id, message_id, copy::sextortion_education())
                            .with_keyboard(keyboards::menu_only_keyboard()),
                    )
                    .await?;
                self.chat
                    .answer_callback(AnswerCallbackParams::ack(&callback.id))
                    .await?;
            }
            CallbackRoute::EduAiContent => {
                self.chat
                    .edit_message(
                        EditMessageParams::html(chat_id, message_id, copy::ai_content_education())
                            .with_keyboard(keyboards::menu_only_keyboard()),
                    )
                    .await?;
                self.chat
                    .answer_callback(AnswerCallbackParams::ack(&callback.id))
                    .await?;
            }
            CallbackRoute::EduSpotFakes => {
                self.chat
                    .edit_message(
                        EditMessageParams::html(chat_id, message_id, copy::spot_fakes_education())
                            .with_keyboard(keyboards::menu_only_keyboard()),
                    )
                    .await?;
                self.chat
                    .answer_callback(AnswerCallbackParams::ack(&callback.id))
                    .await?;
            }
            CallbackRoute::Pdf(analysis_id) => {
                self.handle_pdf_request(&callback, chat_id, user_id, &analysis_id)
                    .await?;
            }
            CallbackRoute::Share(analysis_id) => {
                match analysis::get_analysis(self.db.pool(), &analysis_id).await {
                    Ok(record) if record.user_id == user_id => {
                        let text = copy::share_text(
                            &record.analysis_id,
                            &record.verdict,
                            record.confidence,
                        );
                        self.chat.send_text(chat_id, &text).await?;
                        self.chat
                            .answer_callback(AnswerCallbackParams::ack(&callback.id))
                            .await?;
                    }
                    _ => {
                        self.chat
                            .answer_callback(AnswerCallbackParams::alert(
                                &callback.id,
                                "Analysis not found.",
                            ))
                            .await?;
                    }
                }
            }
        }
        Ok(())
    }

    /// PDF callback: load the record, check ownership, call the external
    /// renderer, deliver the document.
    async fn handle_pdf_request(
        &self,
        callback: &CallbackQuery,
        chat_id: i64,
        user_id: i64,
        analysis_id: &str,
    ) -> Result<(), GatewayError> {
        let record = match analysis::get_analysis(self.db.pool(), analysis_id).await {
            Ok(record) => record,
            Err(database::DatabaseError::NotFound { .. }) => {
                self.chat
                    .answer_callback(AnswerCallbackParams::alert(&callback.id, "Analysis not found."))
                    .await?;
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        if record.user_id != user_id {
            warn!("denied pdf request for foreign analysis");
            self.chat
                .answer_callback(AnswerCallbackParams::alert(&callback.id, "Analysis not found."))
                .await?;
            return Ok(());
        }

        self.chat
            .answer_callback(AnswerCallbackParams::toast(
                &callback.id,
                "Generating PDF report...",
            ))
            .await?;

        let result_blob: serde_json::Value =
            serde_json::from_str(&record.result_blob).unwrap_or(serde_json::Value::Null);
        match self.detector.render_pdf(analysis_id, &result_blob).await {
            Ok(pdf_bytes) => {
                let file_name = format!("forensic_report_{analysis_id}.pdf");
                let caption =
                    copy::pdf_caption(&record.analysis_id, &record.verdict, record.confidence);
                self.chat
                    .send_document(
                        SendDocumentParams::new(chat_id, file_name, pdf_bytes)
                            .with_caption(caption),
                    )
                    .await?;
            }
            Err(e) => {
                warn!("pdf rendering failed: {e}");
                self.chat
                    .send_text(
                        chat_id,
                        "\u{274C} The report service is unavailable right now - please try again later.",
                    )
                    .await?;
            }
        }
        Ok(())
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
