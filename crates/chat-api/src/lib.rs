//! Client for the Bot-API-compatible chat platform.
//!
//! The pipeline only consumes a narrow slice of the platform: receiving
//! messages (with optional photo or document attachments) and callback
//! actions, downloading attachments, sending messages with inline button
//! keyboards, and editing an existing message in place. This crate wraps
//! exactly that slice:
//!
//! - [`ChatClient`] - typed calls over one shared `reqwest` client
//! - [`UpdateStream`] - long-poll event stream with reconnect backoff
//! - [`types`] - the envelope and parameter structs
//!
//! # Example
//!
//! ```no_run
//! use chat_api::{ChatClient, ChatConfig};
//!
//! # async fn example() -> Result<(), chat_api::ChatApiError> {
//! let client = ChatClient::new(ChatConfig::new("https://api.example.org", "123:token"))?;
//! client.send_text(42, "hello").await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;
pub mod types;
mod updates;

pub use client::ChatClient;
pub use config::ChatConfig;
pub use error::ChatApiError;
pub use updates::{subscribe, PollConfig, UpdateStream};
