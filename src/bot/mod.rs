//! Telegram front end
//!
//! [`Bot`] long-polls `getUpdates`, answers `/start` and `/help` itself and
//! hands every other text message to the [`RequestOrchestrator`] on its own
//! task. Cancelling the shutdown token stops polling; in-flight requests are
//! cancelled through the same token and awaited so their cleanup runs.

mod commands;

pub use commands::{Command, help_text, start_text};

use crate::config::Config;
use crate::error::Result;
use crate::media::MediaFetcher;
use crate::messaging::{Messenger, TelegramClient, TextFormat};
use crate::orchestrator::RequestOrchestrator;
use crate::types::IncomingMessage;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Pause before polling again after a failed `getUpdates`
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Long-polling bot
pub struct Bot {
    client: Arc<TelegramClient>,
    orchestrator: RequestOrchestrator,
    poll_timeout: Duration,
    shutdown: CancellationToken,
}

impl Bot {
    /// Wire a bot from its collaborators
    pub fn new(
        config: Arc<Config>,
        client: Arc<TelegramClient>,
        fetcher: Arc<dyn MediaFetcher>,
    ) -> Self {
        let shutdown = CancellationToken::new();
        let poll_timeout = config.telegram.poll_timeout;
        let orchestrator = RequestOrchestrator::new(config, fetcher, client.clone())
            .with_shutdown(shutdown.clone());
        Self {
            client,
            orchestrator,
            poll_timeout,
            shutdown,
        }
    }

    /// Token that stops the bot when cancelled
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// The orchestrator handling text messages
    pub fn orchestrator(&self) -> &RequestOrchestrator {
        &self.orchestrator
    }

    /// Poll for updates until the shutdown token is cancelled
    ///
    /// Poll errors are logged and retried after a short pause; they never end
    /// the loop.
    pub async fn run(&self) -> Result<()> {
        info!(poll_timeout_secs = self.poll_timeout.as_secs(), "bot polling started");
        let mut offset: Option<i64> = None;
        let mut tasks = JoinSet::new();

        loop {
            let polled = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                polled = self.client.get_updates(offset, self.poll_timeout) => polled,
            };

            match polled {
                Ok(updates) => {
                    for update in updates {
                        offset = Some(update.update_id + 1);
                        let Some(message) = update.message.as_ref().and_then(|m| m.to_incoming())
                        else {
                            debug!(update_id = update.update_id, "ignoring non-text update");
                            continue;
                        };
                        let orchestrator = self.orchestrator.clone();
                        let messenger: Arc<dyn Messenger> = self.client.clone();
                        tasks.spawn(async move {
                            dispatch(&orchestrator, messenger.as_ref(), message).await;
                        });
                    }
                }
                Err(e) => {
                    warn!(error = %e, "failed to poll updates, retrying");
                    tokio::select! {
                        _ = self.shutdown.cancelled() => break,
                        _ = tokio::time::sleep(POLL_RETRY_DELAY) => {}
                    }
                }
            }

            while let Some(joined) = tasks.try_join_next() {
                log_task_outcome(joined);
            }
        }

        info!(in_flight = tasks.len(), "bot stopping, waiting for in-flight requests");
        while let Some(joined) = tasks.join_next().await {
            log_task_outcome(joined);
        }
        info!("bot stopped");
        Ok(())
    }
}

fn log_task_outcome(joined: std::result::Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        error!(error = %e, "message handler task failed");
    }
}

/// Route one incoming message to a command reply or the orchestrator
pub async fn dispatch(
    orchestrator: &RequestOrchestrator,
    messenger: &dyn Messenger,
    message: IncomingMessage,
) {
    let reply = match Command::parse(&message.text) {
        Some(Command::Start) => start_text().to_string(),
        Some(Command::Help) => help_text(orchestrator.config().download.max_file_size_mb),
        None => {
            // Outcome is already reported to the user and logged
            let _ = orchestrator.handle_message(message).await;
            return;
        }
    };

    debug!(user_id = %message.user, "answering command");
    if let Err(e) = messenger
        .send_text(message.chat, &reply, TextFormat::Markdown)
        .await
    {
        warn!(chat_id = %message.chat, error = %e, "failed to answer command");
    }
}
