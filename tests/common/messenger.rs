//! In-memory messenger that records what users would have seen

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use vidgrab::{Attachment, ChatId, MessageRef, Messenger, MessagingError, TextFormat};

/// What reached a chat
#[derive(Debug, Clone, PartialEq)]
pub enum Delivered {
    /// New text message
    Text(ChatId, String),
    /// Edit of message `id`
    Edit(i64, String),
    /// Deletion of message `id`
    Deleted(i64),
    /// Video upload, with the bytes read at upload time
    Video(ChatId, Attachment, u64),
    /// Document upload, with the bytes read at upload time
    Document(ChatId, Attachment, u64),
}

/// Records every call; uploads read the file so size and presence are checked
#[derive(Default)]
pub struct InMemoryMessenger {
    log: Mutex<Vec<Delivered>>,
    next_id: AtomicI64,
    /// Refuse video uploads (as the Bot API does for some containers)
    pub refuse_video: AtomicBool,
}

impl InMemoryMessenger {
    /// Snapshot of everything delivered so far
    pub fn log(&self) -> Vec<Delivered> {
        self.log.lock().unwrap().clone()
    }

    /// Latest text shown to the user (sent or edited)
    pub fn last_text(&self) -> Option<String> {
        self.log().into_iter().rev().find_map(|d| match d {
            Delivered::Text(_, text) | Delivered::Edit(_, text) => Some(text),
            _ => None,
        })
    }

    /// Uploads that went through
    pub fn uploads(&self) -> Vec<Delivered> {
        self.log()
            .into_iter()
            .filter(|d| matches!(d, Delivered::Video(..) | Delivered::Document(..)))
            .collect()
    }

    fn push(&self, entry: Delivered) {
        self.log.lock().unwrap().push(entry);
    }

    fn message(&self, chat: ChatId) -> MessageRef {
        MessageRef {
            chat,
            message_id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
        }
    }

    async fn read(attachment: &Attachment) -> Result<u64, MessagingError> {
        tokio::fs::read(&attachment.path)
            .await
            .map(|data| data.len() as u64)
            .map_err(|source| MessagingError::Attachment {
                path: attachment.path.clone(),
                source,
            })
    }
}

#[async_trait]
impl Messenger for InMemoryMessenger {
    async fn send_text(
        &self,
        chat: ChatId,
        text: &str,
        _format: TextFormat,
    ) -> Result<MessageRef, MessagingError> {
        self.push(Delivered::Text(chat, text.to_string()));
        Ok(self.message(chat))
    }

    async fn edit_text(
        &self,
        message: &MessageRef,
        text: &str,
        _format: TextFormat,
    ) -> Result<(), MessagingError> {
        self.push(Delivered::Edit(message.message_id, text.to_string()));
        Ok(())
    }

    async fn delete_message(&self, message: &MessageRef) -> Result<(), MessagingError> {
        self.push(Delivered::Deleted(message.message_id));
        Ok(())
    }

    async fn send_video(
        &self,
        chat: ChatId,
        attachment: &Attachment,
    ) -> Result<MessageRef, MessagingError> {
        if self.refuse_video.load(Ordering::SeqCst) {
            return Err(MessagingError::Api {
                code: 400,
                description: "Bad Request: wrong file identifier".to_string(),
            });
        }
        let size = Self::read(attachment).await?;
        self.push(Delivered::Video(chat, attachment.clone(), size));
        Ok(self.message(chat))
    }

    async fn send_document(
        &self,
        chat: ChatId,
        attachment: &Attachment,
    ) -> Result<MessageRef, MessagingError> {
        let size = Self::read(attachment).await?;
        self.push(Delivered::Document(chat, attachment.clone(), size));
        Ok(self.message(chat))
    }
}
