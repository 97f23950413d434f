//! Per-event context carried through the middleware chain.

use std::time::Instant;

use chat_api::types::{CallbackQuery, Message, Update};
use image_screen::ScreenReport;
use sha2::{Digest, Sha256};

/// The two event shapes the gateway dispatches.
#[derive(Debug, Clone)]
pub enum ChatEvent {
    Message(Message),
    Callback(CallbackQuery),
}

impl ChatEvent {
    /// Split an update into a dispatchable event, if it carries one.
    pub fn from_update(update: Update) -> Option<Self> {
        if let Some(message) = update.message {
            return Some(Self::Message(message));
        }
        if let Some(callback) = update.callback_query {
            return Some(Self::Callback(callback));
        }
        None
    }

    pub fn user_id(&self) -> Option<i64> {
        match self {
            Self::Message(m) => m.from.as_ref().map(|u| u.id),
            Self::Callback(c) => Some(c.from.id),
        }
    }

    pub fn chat_id(&self) -> Option<i64> {
        match self {
            Self::Message(m) => Some(m.chat.id),
            Self::Callback(c) => c.message.as_ref().map(|m| m.chat.id),
        }
    }

    /// True for messages carrying a photo or image document.
    pub fn is_image_upload(&self) -> bool {
        matches!(self, Self::Message(m) if m.has_image())
    }

    /// Event kind tag for the structured log line (no content, no PII).
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Message(m) if m.has_image() => "image_upload",
            Self::Message(m) if m.text.as_deref().is_some_and(|t| t.starts_with('/')) => "command",
            Self::Message(_) => "message",
            Self::Callback(_) => "callback_action",
        }
    }
}

/// A downloaded and screened upload, cached by the duplicate middleware so
/// the handler does not fetch or decode twice.
#[derive(Debug, Clone)]
pub struct ScreenedUpload {
    pub bytes: Vec<u8>,
    pub report: ScreenReport,
    /// True when the upload arrived as a document (lossless channel).
    pub via_document: bool,
    /// Blob-key extension, derived from the detected format or file name.
    pub extension: String,
}

/// Mutable bag threaded through the middleware chain into the handler.
#[derive(Debug)]
pub struct EventContext {
    pub received_at: Instant,
    /// First 8 hex chars of sha256(user_id); the only user identifier that
    /// may appear in logs.
    pub anonymized_user_id: String,
    pub upload: Option<ScreenedUpload>,
}

impl EventContext {
    pub fn new(user_id: Option<i64>) -> Self {
        Self {
            received_at: Instant::now(),
            anonymized_user_id: user_id.map(anonymize_user_id).unwrap_or_default(),
            upload: None,
        }
    }
}

/// Hash a platform user id into its log-safe form.
pub fn anonymize_user_id(user_id: i64) -> String {
    let digest = Sha256::digest(user_id.to_string().as_bytes());
    let mut hex = String::with_capacity(8);
    for byte in digest.iter().take(4) {
        hex.push_str(&format!("{byte:02x}"));
    }
    hex
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymized_id_is_stable_8_hex() {
        let a = anonymize_user_id(123_456_789);
        let b = anonymize_user_id(123_456_789);
        assert_eq!(a, b);
        assert_eq!(a.len(), 8);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, anonymize_user_id(987_654_321));
    }

    #[test]
    fn test_event_kind_tags() {
        let message: Message = serde_json::from_str(
            r#"{"message_id":1,"chat":{"id":5},"from":{"id":9},"text":"/start"}"#,
        )
        .unwrap();
        assert_eq!(ChatEvent::Message(message).kind(), "command");
    }

    #[test]
    fn test_anonymized_id_differs_from_raw() {
        // The raw id must never appear in the log-safe form.
        let raw = 1234567890i64;
        assert!(!anonymize_user_id(raw).contains("1234567890"));
    }
}
