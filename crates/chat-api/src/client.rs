//! Chat platform HTTP client.

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ChatConfig;
use crate::error::ChatApiError;
use crate::types::{
    AnswerCallbackParams, EditMessageParams, FileHandle, InlineKeyboardMarkup, SendDocumentParams,
    SendMessageParams, SentMessage, Update,
};

/// Bot API response envelope.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    error_code: Option<i64>,
}

/// Parameters for `getUpdates`.
#[derive(Debug, Serialize)]
struct GetUpdatesParams {
    offset: i64,
    timeout: u64,
    limit: u32,
}

/// Client for the chat platform's Bot API.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: Client,
    /// Separate client without a total-request timeout, used for long polls.
    poll_http: Client,
    config: ChatConfig,
}

impl ChatClient {
    /// Build a client from the given configuration.
    pub fn new(config: ChatConfig) -> Result<Self, ChatApiError> {
        let http = Client::builder().timeout(config.request_timeout).build()?;
        let poll_http = Client::builder()
            .connect_timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            http,
            poll_http,
            config,
        })
    }

    /// Build a client from environment variables.
    pub fn from_env() -> Result<Self, ChatApiError> {
        Self::new(ChatConfig::from_env()?)
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    async fn call<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        params: &P,
    ) -> Result<R, ChatApiError> {
        self.call_with(&self.http, method, params).await
    }

    async fn call_with<P: Serialize, R: DeserializeOwned>(
        &self,
        http: &Client,
        method: &str,
        params: &P,
    ) -> Result<R, ChatApiError> {
        debug!("chat api call: {}", method);
        let response = http
            .post(self.config.method_url(method))
            .json(params)
            .send()
            .await?;
        let envelope: ApiResponse<R> = response.json().await?;
        if envelope.ok {
            envelope
                .result
                .ok_or_else(|| ChatApiError::Malformed(format!("{method}: ok without result")))
        } else {
            Err(ChatApiError::Api {
                code: envelope.error_code.unwrap_or(0),
                description: envelope
                    .description
                    .unwrap_or_else(|| "unknown error".to_string()),
            })
        }
    }

    /// Long-poll for updates after `offset`. Blocks up to `timeout` seconds
    /// server-side.
    pub async fn get_updates(&self, offset: i64, timeout: u64) -> Result<Vec<Update>, ChatApiError> {
        self.call_with(
            &self.poll_http,
            "getUpdates",
            &GetUpdatesParams {
                offset,
                timeout,
                limit: 100,
            },
        )
        .await
    }

    /// Send a message with full parameter control.
    pub async fn send_message(&self, params: SendMessageParams) -> Result<SentMessage, ChatApiError> {
        self.call("sendMessage", &params).await
    }

    /// Send a plain HTML text message.
    pub async fn send_text(&self, chat_id: i64, text: &str) -> Result<SentMessage, ChatApiError> {
        self.send_message(SendMessageParams::html(chat_id, text)).await
    }

    /// Send an HTML message with an inline keyboard.
    pub async fn send_with_keyboard(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: InlineKeyboardMarkup,
    ) -> Result<SentMessage, ChatApiError> {
        self.send_message(SendMessageParams::html(chat_id, text).with_keyboard(keyboard))
            .await
    }

    /// Edit an existing message in place.
    pub async fn edit_message(&self, params: EditMessageParams) -> Result<SentMessage, ChatApiError> {
        self.call("editMessageText", &params).await
    }

    /// Acknowledge a callback query (with optional toast/alert).
    pub async fn answer_callback(&self, params: AnswerCallbackParams) -> Result<bool, ChatApiError> {
        self.call("answerCallbackQuery", &params).await
    }

    /// Send a document from in-memory bytes (used for PDF reports).
    pub async fn send_document(&self, params: SendDocumentParams) -> Result<SentMessage, ChatApiError> {
        let part = reqwest::multipart::Part::bytes(params.bytes)
            .file_name(params.file_name)
            .mime_str("application/octet-stream")?;
        let mut form = reqwest::multipart::Form::new()
            .text("chat_id", params.chat_id.to_string())
            .part("document", part);
        if let Some(caption) = params.caption {
            form = form.text("caption", caption).text("parse_mode", "HTML");
        }

        let response = self
            .http
            .post(self.config.method_url("sendDocument"))
            .multipart(form)
            .send()
            .await?;
        let envelope: ApiResponse<SentMessage> = response.json().await?;
        if envelope.ok {
            envelope
                .result
                .ok_or_else(|| ChatApiError::Malformed("sendDocument: ok without result".into()))
        } else {
            Err(ChatApiError::Api {
                code: envelope.error_code.unwrap_or(0),
                description: envelope
                    .description
                    .unwrap_or_else(|| "unknown error".to_string()),
            })
        }
    }

    /// Download an attachment by file id: resolve the handle, then fetch the
    /// bytes from the file endpoint.
    pub async fn download_file(&self, file_id: &str) -> Result<Vec<u8>, ChatApiError> {
        #[derive(Serialize)]
        struct GetFileParams<'a> {
            file_id: &'a str,
        }

        let handle: FileHandle = self.call("getFile", &GetFileParams { file_id }).await?;
        let file_path = handle
            .file_path
            .ok_or_else(|| ChatApiError::FilePathMissing(file_id.to_string()))?;

        let bytes = self
            .http
            .get(self.config.file_url(&file_path))
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        debug!("downloaded attachment: {} bytes", bytes.len());
        Ok(bytes.to_vec())
    }
}
