//! Request orchestration
//!
//! [`RequestOrchestrator`] drives one incoming message end-to-end:
//!
//! 1. pre-checks: allow-list, URL extraction, per-user admission
//! 2. metadata probe, then a status edit with title, duration and source
//! 3. constrained download and size verification
//! 4. delivery as a video, falling back to a document
//! 5. cleanup: artifact deleted, status message removed, admission released
//!
//! Every failure becomes exactly one [`RequestError`] and one user-visible
//! message. Status updates are best-effort and never abort a request.
//!
//! - [`pipeline`] - the per-request state machine
//! - [`status`] - user-facing status texts
//! - [`artifact`] - RAII ownership of the downloaded file

mod artifact;
mod pipeline;
mod status;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

pub use artifact::ArtifactGuard;
pub use status::{fetching_text, info_text, uploading_text};

use crate::admission::AdmissionTracker;
use crate::config::Config;
use crate::error::RequestError;
use crate::media::MediaFetcher;
use crate::messaging::{Messenger, TextFormat};
use crate::types::{ChatId, Event, FetchSummary, IncomingMessage};
use crate::url_extract::extract_url;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Capacity of the lifecycle event channel
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Coordinates admission, fetching and delivery for incoming messages
///
/// Cheap to clone; clones share the admission set, the event channel and the
/// shutdown token, so one orchestrator can be handed to a task per message.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use vidgrab::config::Config;
/// use vidgrab::media::YtDlpFetcher;
/// use vidgrab::messaging::TelegramClient;
/// use vidgrab::orchestrator::RequestOrchestrator;
/// use vidgrab::types::{ChatId, IncomingMessage, UserId};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Arc::new(Config::from_env()?);
/// let fetcher = Arc::new(YtDlpFetcher::from_path().expect("yt-dlp not found"));
/// let messenger = Arc::new(TelegramClient::from_config(&config.telegram)?);
/// let orchestrator = RequestOrchestrator::new(config, fetcher, messenger);
///
/// let outcome = orchestrator
///     .handle_message(IncomingMessage {
///         user: UserId(42),
///         chat: ChatId(42),
///         text: "https://example.com/watch?v=abc123".into(),
///     })
///     .await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RequestOrchestrator {
    config: Arc<Config>,
    admission: AdmissionTracker,
    fetcher: Arc<dyn MediaFetcher>,
    messenger: Arc<dyn Messenger>,
    event_tx: broadcast::Sender<Event>,
    shutdown: CancellationToken,
}

impl RequestOrchestrator {
    /// Create an orchestrator with a fresh admission set and shutdown token
    pub fn new(
        config: Arc<Config>,
        fetcher: Arc<dyn MediaFetcher>,
        messenger: Arc<dyn Messenger>,
    ) -> Self {
        let (event_tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            config,
            admission: AdmissionTracker::new(),
            fetcher,
            messenger,
            event_tx,
            shutdown: CancellationToken::new(),
        }
    }

    /// Use an externally owned admission set
    pub fn with_admission(mut self, admission: AdmissionTracker) -> Self {
        self.admission = admission;
        self
    }

    /// Tie every request to `shutdown`; cancelling it aborts in-flight requests
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Subscribe to lifecycle events
    ///
    /// Events are dropped when nobody is subscribed.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Configuration in effect
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Per-user admission set
    pub fn admission(&self) -> &AdmissionTracker {
        &self.admission
    }

    /// Token whose cancellation aborts every in-flight request
    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }

    pub(crate) fn emit_event(&self, event: Event) {
        // send() returns Err if there are no receivers, which is fine - we just drop the event
        self.event_tx.send(event).ok();
    }

    /// Process one text message from a user
    ///
    /// # Errors
    ///
    /// Returns the [`RequestError`] that terminated the request. The user has
    /// already been told about it; callers only need it for logging or tests.
    pub async fn handle_message(
        &self,
        message: IncomingMessage,
    ) -> Result<FetchSummary, RequestError> {
        let IncomingMessage { user, chat, text } = message;

        if !self.config.is_allowed(user) {
            return self.reject(chat, RequestError::AccessDenied { user }).await;
        }

        let Some(url) = extract_url(&text) else {
            return self.reject(chat, RequestError::NoUrlFound).await;
        };

        let Some(admission) = self.admission.try_claim(user) else {
            return self.reject(chat, RequestError::AlreadyActive { user }).await;
        };

        info!(user_id = %user, chat_id = %chat, url = %url, "request admitted");
        pipeline::ActiveRequest::new(self, admission, chat, url)
            .run()
            .await
    }

    /// Answer a message that never got admitted
    async fn reject(
        &self,
        chat: ChatId,
        error: RequestError,
    ) -> Result<FetchSummary, RequestError> {
        info!(
            chat_id = %chat,
            error_code = error.error_code(),
            error = %error,
            "request rejected"
        );
        let text = error.user_message(self.config.download.error_display_limit);
        if let Err(e) = self.messenger.send_text(chat, &text, TextFormat::Plain).await {
            warn!(chat_id = %chat, error = %e, "failed to send rejection");
        }
        Err(error)
    }
}
