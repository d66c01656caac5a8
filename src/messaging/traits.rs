//! Trait for chat transports

use crate::error::MessagingError;
use crate::types::{ChatId, MessageRef};
use async_trait::async_trait;
use std::path::PathBuf;

/// How message text is interpreted by the chat platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextFormat {
    /// Sent verbatim
    #[default]
    Plain,
    /// Legacy Markdown (`*bold*`, `_italic_`, backslash escapes)
    Markdown,
}

/// A local file to upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// File on disk
    pub path: PathBuf,
    /// Name presented to the recipient
    pub file_name: String,
    /// Caption shown under the attachment
    pub caption: String,
}

/// Outbound side of a chat platform
///
/// Text calls and attachment calls are separate methods so callers can tell a
/// rejected upload apart from a failed status update.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Send a text message and return a handle for later edits
    async fn send_text(
        &self,
        chat: ChatId,
        text: &str,
        format: TextFormat,
    ) -> Result<MessageRef, MessagingError>;

    /// Replace the text of a previously sent message
    async fn edit_text(
        &self,
        message: &MessageRef,
        text: &str,
        format: TextFormat,
    ) -> Result<(), MessagingError>;

    /// Delete a previously sent message
    async fn delete_message(&self, message: &MessageRef) -> Result<(), MessagingError>;

    /// Upload a file as a playable video
    async fn send_video(
        &self,
        chat: ChatId,
        attachment: &Attachment,
    ) -> Result<MessageRef, MessagingError>;

    /// Upload a file as a generic document
    async fn send_document(
        &self,
        chat: ChatId,
        attachment: &Attachment,
    ) -> Result<MessageRef, MessagingError>;
}
