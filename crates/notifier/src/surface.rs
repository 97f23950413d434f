//! The message surface seam: the slice of the chat platform the notifier
//! and workers write to (send one message, edit one message).

use async_trait::async_trait;
use chat_api::types::{EditMessageParams, InlineKeyboardMarkup, SendMessageParams};
use chat_api::{ChatApiError, ChatClient};

/// Where rendered messages go.
#[async_trait]
pub trait MessageSurface: Send + Sync {
    /// Send a new HTML message, returning its id.
    async fn send(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<i64, ChatApiError>;

    /// Edit an existing message in place.
    async fn edit(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<(), ChatApiError>;
}

#[async_trait]
impl MessageSurface for ChatClient {
    async fn send(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<i64, ChatApiError> {
        let mut params = SendMessageParams::html(chat_id, text);
        if let Some(keyboard) = keyboard {
            params = params.with_keyboard(keyboard);
        }
        Ok(self.send_message(params).await?.message_id)
    }

    async fn edit(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<(), ChatApiError> {
        let mut params = EditMessageParams::html(chat_id, message_id, text);
        if let Some(keyboard) = keyboard {
            params = params.with_keyboard(keyboard);
        }
        self.edit_message(params).await?;
        Ok(())
    }
}

/// An in-memory surface that records every send and edit; the worker and
/// renderer tests assert against it.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    log: std::sync::Mutex<SurfaceLog>,
    fail_edits: std::sync::atomic::AtomicBool,
}

/// What a [`RecordingSurface`] saw.
#[derive(Debug, Default, Clone)]
pub struct SurfaceLog {
    /// (chat_id, text) of sent messages, in order.
    pub sent: Vec<(i64, String)>,
    /// (chat_id, message_id, text) of edits, in order.
    pub edited: Vec<(i64, i64, String)>,
    next_message_id: i64,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent edits fail (exercises the swallow-and-continue path).
    pub fn set_edits_failing(&self, failing: bool) {
        self.fail_edits
            .store(failing, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn log(&self) -> SurfaceLog {
        self.log.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageSurface for RecordingSurface {
    async fn send(
        &self,
        chat_id: i64,
        text: &str,
        _keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<i64, ChatApiError> {
        let mut log = self.log.lock().unwrap();
        log.next_message_id += 1;
        let id = log.next_message_id;
        log.sent.push((chat_id, text.to_string()));
        Ok(id)
    }

    async fn edit(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        _keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<(), ChatApiError> {
        if self.fail_edits.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(ChatApiError::Api {
                code: 429,
                description: "Too Many Requests".to_string(),
            });
        }
        self.log
            .lock()
            .unwrap()
            .edited
            .push((chat_id, message_id, text.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recording_surface_logs_in_order() {
        let surface = RecordingSurface::new();
        let id = surface.send(7, "hello", None).await.unwrap();
        surface.edit(7, id, "edited", None).await.unwrap();

        let log = surface.log();
        assert_eq!(log.sent, vec![(7, "hello".to_string())]);
        assert_eq!(log.edited, vec![(7, id, "edited".to_string())]);
    }

    #[tokio::test]
    async fn test_failing_edits() {
        let surface = RecordingSurface::new();
        surface.set_edits_failing(true);
        assert!(surface.edit(7, 1, "x", None).await.is_err());
        assert!(surface.log().edited.is_empty());
    }
}
