//! Inbound envelope types: updates, messages, callback queries.

use serde::Deserialize;

/// One long-poll update from the platform.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

/// A chat message, possibly carrying a photo or document attachment.
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<ChatUser>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    /// Photo attachment as an array of sizes; the largest is authoritative.
    #[serde(default)]
    pub photo: Option<Vec<PhotoSize>>,
    /// Document attachment: arrives with the original bytes untouched.
    #[serde(default)]
    pub document: Option<Document>,
    #[serde(default)]
    pub date: i64,
}

impl Message {
    /// The largest photo size, if the message carries a photo.
    pub fn largest_photo(&self) -> Option<&PhotoSize> {
        self.photo
            .as_deref()
            .and_then(|sizes| sizes.iter().max_by_key(|p| p.width * p.height))
    }

    /// True when the message carries a photo or an image document.
    pub fn has_image(&self) -> bool {
        if self.photo.as_deref().is_some_and(|p| !p.is_empty()) {
            return true;
        }
        self.document
            .as_ref()
            .and_then(|d| d.mime_type.as_deref())
            .is_some_and(|mime| mime.starts_with("image/"))
    }
}

/// A chat the bot participates in.
#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// The platform user behind a message or callback.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatUser {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
}

/// One size variant of a photo attachment.
#[derive(Debug, Clone, Deserialize)]
pub struct PhotoSize {
    pub file_id: String,
    pub file_unique_id: String,
    pub width: i64,
    pub height: i64,
    #[serde(default)]
    pub file_size: Option<i64>,
}

/// A document attachment (lossless channel, metadata preserved).
#[derive(Debug, Clone, Deserialize)]
pub struct Document {
    pub file_id: String,
    pub file_unique_id: String,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub file_size: Option<i64>,
}

impl Document {
    /// File extension from the original name, lowercased, "bin" if absent.
    pub fn extension(&self) -> String {
        self.file_name
            .as_deref()
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_else(|| "bin".to_string())
    }
}

/// An inline-button press.
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: ChatUser,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub data: Option<String>,
}

/// Resolved file handle returned by `getFile`.
#[derive(Debug, Clone, Deserialize)]
pub struct FileHandle {
    pub file_id: String,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub file_size: Option<i64>,
}

/// The platform's echo of a message we sent or edited.
#[derive(Debug, Clone, Deserialize)]
pub struct SentMessage {
    pub message_id: i64,
    pub chat: Chat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_largest_photo() {
        let message: Message = serde_json::from_str(
            r#"{
                "message_id": 1,
                "chat": {"id": 7},
                "photo": [
                    {"file_id": "s", "file_unique_id": "us", "width": 90, "height": 60},
                    {"file_id": "l", "file_unique_id": "ul", "width": 1280, "height": 960}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(message.largest_photo().unwrap().file_id, "l");
        assert!(message.has_image());
    }

    #[test]
    fn test_image_document_detected() {
        let message: Message = serde_json::from_str(
            r#"{
                "message_id": 2,
                "chat": {"id": 7},
                "document": {
                    "file_id": "d", "file_unique_id": "ud",
                    "file_name": "IMG_0001.HEIC", "mime_type": "image/heic"
                }
            }"#,
        )
        .unwrap();
        assert!(message.has_image());
        assert_eq!(message.document.unwrap().extension(), "heic");
    }

    #[test]
    fn test_plain_text_is_not_image() {
        let message: Message = serde_json::from_str(
            r#"{"message_id": 3, "chat": {"id": 7}, "text": "/start"}"#,
        )
        .unwrap();
        assert!(!message.has_image());
    }
}
