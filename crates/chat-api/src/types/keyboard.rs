//! Inline keyboard construction.

use serde::{Deserialize, Serialize};

/// An inline keyboard attached below a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

impl InlineKeyboardMarkup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a full-width row with a single button.
    pub fn row(mut self, button: InlineKeyboardButton) -> Self {
        self.inline_keyboard.push(vec![button]);
        self
    }

    /// All button labels in reading order; handy for tests.
    pub fn labels(&self) -> Vec<&str> {
        self.inline_keyboard
            .iter()
            .flatten()
            .map(|b| b.text.as_str())
            .collect()
    }
}

/// One inline button: either a callback action or an external link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl InlineKeyboardButton {
    /// A button that fires a callback action when pressed.
    pub fn callback(text: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: Some(data.into()),
            url: None,
        }
    }

    /// A button that opens an external link.
    pub fn link(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: None,
            url: Some(url.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyboard_labels() {
        let keyboard = InlineKeyboardMarkup::new()
            .row(InlineKeyboardButton::callback("One", "cb:one"))
            .row(InlineKeyboardButton::link("Two", "https://example.org"));
        assert_eq!(keyboard.labels(), vec!["One", "Two"]);
    }

    #[test]
    fn test_link_button_serializes_without_callback() {
        let json =
            serde_json::to_string(&InlineKeyboardButton::link("Go", "https://example.org"))
                .unwrap();
        assert!(!json.contains("callback_data"));
        assert!(json.contains("https://example.org"));
    }
}
