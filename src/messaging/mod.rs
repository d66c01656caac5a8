//! Chat transport
//!
//! The orchestrator talks to users only through the [`Messenger`] trait.
//! [`TelegramClient`] implements it over the Telegram Bot API and also exposes
//! the inbound side (`getUpdates` long polling) used by the bot front end.
//!
//! ```no_run
//! use vidgrab::messaging::{Messenger, TelegramClient, TextFormat};
//! use vidgrab::types::ChatId;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = TelegramClient::new("https://api.telegram.org", "123:ABC")?;
//! let status = client
//!     .send_text(ChatId(42), "🔍 Fetching video info...", TextFormat::Plain)
//!     .await?;
//! client.delete_message(&status).await?;
//! # Ok(())
//! # }
//! ```

mod telegram;
mod traits;

pub use telegram::{Chat, Message, TelegramClient, Update, User};
pub use traits::{Attachment, Messenger, TextFormat};
