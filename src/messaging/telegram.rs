//! Telegram Bot API transport

use super::traits::{Attachment, Messenger, TextFormat};
use crate::config::TelegramConfig;
use crate::error::{Error, MessagingError};
use crate::types::{ChatId, IncomingMessage, MessageRef, UserId};
use async_trait::async_trait;
use reqwest::Body;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;
use tokio_util::io::ReaderStream;
use tracing::debug;

/// Slack added on top of the long-poll timeout before the HTTP call gives up
const POLL_GRACE: Duration = Duration::from_secs(10);

/// Timeout for text calls (send/edit/delete)
const TEXT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Response envelope wrapping every Bot API result
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    error_code: Option<i64>,
}

impl<T> ApiResponse<T> {
    fn into_result(self) -> Result<T, MessagingError> {
        if !self.ok {
            return Err(MessagingError::Api {
                code: self.error_code.unwrap_or_default(),
                description: self
                    .description
                    .unwrap_or_else(|| "no description".to_string()),
            });
        }
        self.result
            .ok_or_else(|| MessagingError::InvalidResponse("ok response without result".into()))
    }
}

/// Bot API `User`
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    /// Unique user id
    pub id: i64,
    /// Whether the account is a bot
    #[serde(default)]
    pub is_bot: bool,
    /// Username without the leading `@`
    #[serde(default)]
    pub username: Option<String>,
}

/// Bot API `Chat`
#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    /// Unique chat id
    pub id: i64,
}

/// Bot API `Message` (only the fields the bot reads)
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    /// Message id within the chat
    pub message_id: i64,
    /// Sender; absent for channel posts
    #[serde(default)]
    pub from: Option<User>,
    /// Chat the message belongs to
    pub chat: Chat,
    /// Text content, if any
    #[serde(default)]
    pub text: Option<String>,
}

impl Message {
    /// Handle for editing or deleting this message
    pub fn message_ref(&self) -> MessageRef {
        MessageRef {
            chat: ChatId(self.chat.id),
            message_id: self.message_id,
        }
    }

    /// Convert into an [`IncomingMessage`] if it is a text message from a person
    pub fn to_incoming(&self) -> Option<IncomingMessage> {
        let from = self.from.as_ref().filter(|u| !u.is_bot)?;
        let text = self.text.as_deref()?.trim();
        if text.is_empty() {
            return None;
        }
        Some(IncomingMessage {
            user: UserId(from.id),
            chat: ChatId(self.chat.id),
            text: text.to_string(),
        })
    }
}

/// Bot API `Update`
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    /// Monotonic update id; the next poll uses `update_id + 1` as offset
    pub update_id: i64,
    /// New incoming message
    #[serde(default)]
    pub message: Option<Message>,
}

/// Client for the Telegram Bot API
///
/// Text calls are JSON, uploads are multipart. The bot token is part of every
/// request URL and is never logged; transport errors are stripped of their URL.
#[derive(Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    endpoint: String,
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("endpoint", &"<redacted>")
            .finish()
    }
}

fn network(e: reqwest::Error) -> MessagingError {
    MessagingError::Network(e.without_url())
}

impl TelegramClient {
    /// Create a client for `api_url` authenticated with `token`
    pub fn new(api_url: &str, token: &str) -> crate::Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::Network(e.without_url()))?;

        Ok(Self {
            http,
            endpoint: format!("{}/bot{}", api_url.trim_end_matches('/'), token),
        })
    }

    /// Create a client from configuration
    pub fn from_config(config: &TelegramConfig) -> crate::Result<Self> {
        Self::new(&config.api_url, &config.bot_token)
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.endpoint, method)
    }

    async fn decode<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, MessagingError> {
        let status = response.status();
        let body = response.bytes().await.map_err(network)?;
        let envelope: ApiResponse<T> = serde_json::from_slice(&body).map_err(|e| {
            MessagingError::InvalidResponse(format!("HTTP {}: {}", status.as_u16(), e))
        })?;
        envelope.into_result()
    }

    /// Invoke a JSON method
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        payload: &Value,
        timeout: Duration,
    ) -> Result<T, MessagingError> {
        debug!(method, "calling Bot API");
        let response = self
            .http
            .post(self.method_url(method))
            .json(payload)
            .timeout(timeout)
            .send()
            .await
            .map_err(network)?;
        Self::decode(response).await
    }

    /// Upload `attachment` through a multipart method (`sendVideo`, `sendDocument`)
    async fn upload(
        &self,
        method: &str,
        field: &'static str,
        chat: ChatId,
        attachment: &Attachment,
        extra: &[(&'static str, &'static str)],
    ) -> Result<MessageRef, MessagingError> {
        let attachment_error = |source: std::io::Error| MessagingError::Attachment {
            path: attachment.path.clone(),
            source,
        };
        let file = tokio::fs::File::open(&attachment.path)
            .await
            .map_err(attachment_error)?;
        let size_bytes = file.metadata().await.map_err(attachment_error)?.len();
        debug!(method, chat_id = chat.0, size_bytes, "uploading attachment");

        let body = Body::wrap_stream(ReaderStream::new(file));
        let part = Part::stream_with_length(body, size_bytes)
            .file_name(attachment.file_name.clone())
            .mime_str("video/mp4")
            .map_err(network)?;

        let mut form = Form::new()
            .text("chat_id", chat.to_string())
            .text("caption", attachment.caption.clone())
            .part(field, part);
        for (key, value) in extra {
            form = form.text(*key, *value);
        }

        let response = self
            .http
            .post(self.method_url(method))
            .multipart(form)
            .send()
            .await
            .map_err(network)?;
        let message: Message = Self::decode(response).await?;
        Ok(message.message_ref())
    }

    /// Identify the bot (`getMe`); used to validate the token at startup
    pub async fn get_me(&self) -> Result<User, MessagingError> {
        self.call("getMe", &json!({}), TEXT_CALL_TIMEOUT).await
    }

    /// Long-poll for new updates
    ///
    /// `offset` acknowledges every update below it. The HTTP call is allowed
    /// `timeout` plus a grace period before it is abandoned.
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout: Duration,
    ) -> Result<Vec<Update>, MessagingError> {
        let mut payload = json!({
            "timeout": timeout.as_secs(),
            "allowed_updates": ["message"],
        });
        if let Some(offset) = offset {
            payload["offset"] = json!(offset);
        }
        self.call("getUpdates", &payload, timeout.saturating_add(POLL_GRACE))
            .await
    }
}

fn text_payload(mut payload: Value, text: &str, format: TextFormat) -> Value {
    payload["text"] = json!(text);
    if format == TextFormat::Markdown {
        payload["parse_mode"] = json!("Markdown");
    }
    payload
}

#[async_trait]
impl Messenger for TelegramClient {
    async fn send_text(
        &self,
        chat: ChatId,
        text: &str,
        format: TextFormat,
    ) -> Result<MessageRef, MessagingError> {
        let payload = text_payload(json!({ "chat_id": chat.0 }), text, format);
        let message: Message = self
            .call("sendMessage", &payload, TEXT_CALL_TIMEOUT)
            .await?;
        Ok(message.message_ref())
    }

    async fn edit_text(
        &self,
        message: &MessageRef,
        text: &str,
        format: TextFormat,
    ) -> Result<(), MessagingError> {
        let payload = text_payload(
            json!({ "chat_id": message.chat.0, "message_id": message.message_id }),
            text,
            format,
        );
        // Result is the edited Message (or `true` for inline messages)
        let _: Value = self
            .call("editMessageText", &payload, TEXT_CALL_TIMEOUT)
            .await?;
        Ok(())
    }

    async fn delete_message(&self, message: &MessageRef) -> Result<(), MessagingError> {
        let payload = json!({ "chat_id": message.chat.0, "message_id": message.message_id });
        let _: bool = self
            .call("deleteMessage", &payload, TEXT_CALL_TIMEOUT)
            .await?;
        Ok(())
    }

    async fn send_video(
        &self,
        chat: ChatId,
        attachment: &Attachment,
    ) -> Result<MessageRef, MessagingError> {
        self.upload(
            "sendVideo",
            "video",
            chat,
            attachment,
            &[("supports_streaming", "true")],
        )
        .await
    }

    async fn send_document(
        &self,
        chat: ChatId,
        attachment: &Attachment,
    ) -> Result<MessageRef, MessagingError> {
        self.upload("sendDocument", "document", chat, attachment, &[])
            .await
    }
}
