//! In-place progress updates during analysis.
//!
//! One chat message is edited through the stage sequence and finally
//! replaced by the result. Edits are decoration, not correctness: every
//! failure is swallowed with a warning, and re-emitting the same
//! `(message, stage)` pair renders byte-identical text, so duplicate
//! deliveries are invisible to the user.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::surface::MessageSurface;

/// Upper bound on artificial smoothness delay across a whole analysis.
pub const SMOOTHNESS_DELAY_TOTAL: Duration = Duration::from_millis(450);

/// Analysis stages in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Preparing,
    Downloading,
    ExifExtraction,
    AiDetection,
    FrequencyAnalysis,
    FinalScoring,
}

impl Stage {
    /// Stable stage tag (used in logs).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Preparing => "preparing",
            Self::Downloading => "downloading",
            Self::ExifExtraction => "exif_extraction",
            Self::AiDetection => "ai_detection",
            Self::FrequencyAnalysis => "frequency_analysis",
            Self::FinalScoring => "final_scoring",
        }
    }

    fn headline(&self) -> &'static str {
        match self {
            Self::Preparing => "\u{23F3} Preparing analysis",
            Self::Downloading => "\u{1F4E5} Retrieving image from secure storage",
            Self::ExifExtraction => "\u{1F50D} Extracting metadata",
            Self::AiDetection => "\u{1F916} AI detectors running",
            Self::FrequencyAnalysis => "\u{1F52C} Frequency-domain analysis",
            Self::FinalScoring => "\u{1F4CA} Generating the final report",
        }
    }

    fn detail(&self) -> &'static str {
        match self {
            Self::Preparing => "Queued for a worker...",
            Self::Downloading => "ETA: about 20 seconds",
            Self::ExifExtraction => {
                "Checking:\n\
                 \u{2022} Camera fingerprint\n\
                 \u{2022} GPS coordinates\n\
                 \u{2022} Edit history\n\
                 \u{2022} Timestamps"
            }
            Self::AiDetection => {
                "Deep analysis:\n\
                 \u{2022} GAN / diffusion signatures\n\
                 \u{2022} Face-swap artifacts\n\
                 \u{2022} Watermark detection"
            }
            Self::FrequencyAnalysis => {
                "Forensic tests:\n\
                 \u{2022} Spectral patterns\n\
                 \u{2022} Compression artifacts\n\
                 \u{2022} Smoothing detection"
            }
            Self::FinalScoring => "Almost done...",
        }
    }

    /// The message body for this stage. Deterministic, so repeated edits of
    /// the same `(progress_msg_id, stage)` pair are idempotent.
    pub fn render(&self) -> String {
        format!(
            "{}\n\n{}\n\n\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\n<i>Analysis in progress...</i>",
            self.headline(),
            self.detail()
        )
    }

    /// Artificial pause after this stage, purely for perceived smoothness.
    /// The per-stage values sum below [`SMOOTHNESS_DELAY_TOTAL`].
    pub fn smoothness_delay(&self) -> Duration {
        match self {
            Self::ExifExtraction => Duration::from_millis(200),
            Self::FrequencyAnalysis => Duration::from_millis(150),
            Self::FinalScoring => Duration::from_millis(100),
            _ => Duration::ZERO,
        }
    }
}

/// Edits the progress message through the stage sequence.
#[derive(Clone)]
pub struct ProgressNotifier {
    surface: Arc<dyn MessageSurface>,
}

impl ProgressNotifier {
    pub fn new(surface: Arc<dyn MessageSurface>) -> Self {
        Self { surface }
    }

    /// Edit the progress message to show `stage`.
    ///
    /// Never fails: edit errors (platform rate limits, message deleted,
    /// unchanged text) must not affect the analysis.
    pub async fn update(&self, chat_id: i64, progress_msg_id: i64, stage: Stage) {
        if let Err(e) = self
            .surface
            .edit(chat_id, progress_msg_id, &stage.render(), None)
            .await
        {
            warn!(
                "progress edit failed (chat={}, msg={}, stage={}): {}",
                chat_id,
                progress_msg_id,
                stage.as_str(),
                e
            );
        }
        tokio::time::sleep(stage.smoothness_delay()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::RecordingSurface;

    const ALL_STAGES: [Stage; 6] = [
        Stage::Preparing,
        Stage::Downloading,
        Stage::ExifExtraction,
        Stage::AiDetection,
        Stage::FrequencyAnalysis,
        Stage::FinalScoring,
    ];

    #[test]
    fn test_render_is_deterministic() {
        for stage in ALL_STAGES {
            assert_eq!(stage.render(), stage.render());
        }
    }

    #[test]
    fn test_stage_tags_are_distinct() {
        let mut tags: Vec<_> = ALL_STAGES.iter().map(|s| s.as_str()).collect();
        tags.sort();
        tags.dedup();
        assert_eq!(tags.len(), ALL_STAGES.len());
    }

    #[test]
    fn test_smoothness_budget() {
        let total: Duration = ALL_STAGES.iter().map(|s| s.smoothness_delay()).sum();
        assert!(total <= Duration::from_millis(500));
        assert_eq!(total, SMOOTHNESS_DELAY_TOTAL);
    }

    #[tokio::test]
    async fn test_duplicate_stage_edits_are_idempotent() {
        let surface = Arc::new(RecordingSurface::new());
        let notifier = ProgressNotifier::new(surface.clone());

        notifier.update(7, 99, Stage::Downloading).await;
        notifier.update(7, 99, Stage::Downloading).await;

        let log = surface.log();
        assert_eq!(log.edited.len(), 2);
        assert_eq!(log.edited[0], log.edited[1]);
    }

    #[tokio::test]
    async fn test_edit_failure_is_swallowed() {
        let surface = Arc::new(RecordingSurface::new());
        surface.set_edits_failing(true);
        let notifier = ProgressNotifier::new(surface.clone());

        // Must not panic or surface an error.
        notifier.update(7, 99, Stage::AiDetection).await;
        assert!(surface.log().edited.is_empty());
    }
}
