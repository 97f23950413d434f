//! Configuration for the chat platform client.

use std::env;
use std::time::Duration;

use crate::error::ChatApiError;

/// Configuration for connecting to the chat platform's Bot API.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Base URL of the API server (e.g. "https://api.telegram.org").
    pub base_url: String,
    /// Bot token used in the URL path.
    pub token: String,
    /// Per-request timeout for ordinary calls.
    pub request_timeout: Duration,
}

impl ChatConfig {
    /// Create a new configuration with the given base URL and token.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Create configuration from environment variables.
    ///
    /// Required:
    /// - `CHAT_BOT_TOKEN` - bot token
    ///
    /// Optional:
    /// - `CHAT_API_URL` - API base URL (default: https://api.telegram.org)
    pub fn from_env() -> Result<Self, ChatApiError> {
        let token = env::var("CHAT_BOT_TOKEN")
            .map_err(|_| ChatApiError::Configuration("CHAT_BOT_TOKEN not set".to_string()))?;
        let base_url =
            env::var("CHAT_API_URL").unwrap_or_else(|_| "https://api.telegram.org".to_string());
        Ok(Self::new(base_url, token))
    }

    /// Set a custom request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// URL for a Bot API method call.
    pub fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    /// URL for downloading a file by its server-side path.
    pub fn file_url(&self, file_path: &str) -> String {
        format!("{}/file/bot{}/{}", self.base_url, self.token, file_path)
    }
}
