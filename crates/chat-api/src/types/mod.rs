//! Wire types for the chat platform.

mod keyboard;
mod send;
mod update;

pub use keyboard::{InlineKeyboardButton, InlineKeyboardMarkup};
pub use send::{AnswerCallbackParams, EditMessageParams, SendDocumentParams, SendMessageParams};
pub use update::{
    CallbackQuery, Chat, ChatUser, Document, FileHandle, Message, PhotoSize, SentMessage, Update,
};
