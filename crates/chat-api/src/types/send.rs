//! Outbound request parameter structs.

use serde::Serialize;

use super::keyboard::InlineKeyboardMarkup;

/// Parameters for `sendMessage`.
#[derive(Debug, Clone, Serialize)]
pub struct SendMessageParams {
    pub chat_id: i64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_web_page_preview: Option<bool>,
}

impl SendMessageParams {
    /// An HTML-formatted message, the default for everything we send.
    pub fn html(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            parse_mode: Some("HTML"),
            reply_to_message_id: None,
            reply_markup: None,
            disable_web_page_preview: Some(true),
        }
    }

    pub fn reply_to(mut self, message_id: i64) -> Self {
        self.reply_to_message_id = Some(message_id);
        self
    }

    pub fn with_keyboard(mut self, keyboard: InlineKeyboardMarkup) -> Self {
        self.reply_markup = Some(keyboard);
        self
    }
}

/// Parameters for `editMessageText`.
#[derive(Debug, Clone, Serialize)]
pub struct EditMessageParams {
    pub chat_id: i64,
    pub message_id: i64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

impl EditMessageParams {
    pub fn html(chat_id: i64, message_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            message_id,
            text: text.into(),
            parse_mode: Some("HTML"),
            reply_markup: None,
        }
    }

    pub fn with_keyboard(mut self, keyboard: InlineKeyboardMarkup) -> Self {
        self.reply_markup = Some(keyboard);
        self
    }
}

/// Parameters for `answerCallbackQuery`.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerCallbackParams {
    pub callback_query_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_alert: Option<bool>,
}

impl AnswerCallbackParams {
    /// Silently acknowledge a callback.
    pub fn ack(callback_query_id: impl Into<String>) -> Self {
        Self {
            callback_query_id: callback_query_id.into(),
            text: None,
            show_alert: None,
        }
    }

    /// Show a short toast to the user.
    pub fn toast(callback_query_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            callback_query_id: callback_query_id.into(),
            text: Some(text.into()),
            show_alert: Some(false),
        }
    }

    /// Show a modal alert to the user.
    pub fn alert(callback_query_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            callback_query_id: callback_query_id.into(),
            text: Some(text.into()),
            show_alert: Some(true),
        }
    }
}

/// Parameters for `sendDocument` (multipart; bytes travel separately).
#[derive(Debug, Clone)]
pub struct SendDocumentParams {
    pub chat_id: i64,
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub caption: Option<String>,
}

impl SendDocumentParams {
    pub fn new(chat_id: i64, file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            chat_id,
            file_name: file_name.into(),
            bytes,
            caption: None,
        }
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }
}
