//! # vidgrab
//!
//! Chat-driven video download bot: a user sends a link, the bot fetches the
//! media with `yt-dlp`, enforces a size ceiling and sends the file back through
//! the Telegram Bot API.
//!
//! ## Guarantees
//!
//! - **One request per user** - a second link while one is in flight is refused
//! - **One budget per request** - probe, download and upload share one deadline
//! - **Nothing left behind** - artifacts are deleted on every exit path
//! - **Every failure is reported** - exactly one user-visible message per outcome
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use vidgrab::{Bot, Config, TelegramClient, YtDlpFetcher, run_with_shutdown};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Arc::new(Config::from_env()?);
//!     config.prepare_download_dir().await?;
//!
//!     let fetcher = Arc::new(YtDlpFetcher::from_path().expect("yt-dlp not found"));
//!     let client = Arc::new(TelegramClient::from_config(&config.telegram)?);
//!     let bot = Bot::new(config, client, fetcher);
//!
//!     // Subscribe to lifecycle events
//!     let mut events = bot.orchestrator().subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     run_with_shutdown(bot).await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Per-user single-flight admission control
pub mod admission;
/// Telegram front end (polling, commands)
pub mod bot;
/// Configuration types
pub mod config;
/// Per-request cancellation and deadline
pub mod context;
/// Error types
pub mod error;
/// Media fetching through yt-dlp
pub mod media;
/// Chat transport
pub mod messaging;
/// Request lifecycle orchestration
pub mod orchestrator;
/// Core types and events
pub mod types;
/// URL extraction from free-form text
pub mod url_extract;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use admission::{AdmissionGuard, AdmissionTracker};
pub use bot::Bot;
pub use config::Config;
pub use context::RequestContext;
pub use error::{Error, FetchError, MessagingError, RequestError, Result};
pub use media::{MediaFetcher, YtDlpFetcher};
pub use messaging::{Attachment, Messenger, TelegramClient, TextFormat};
pub use orchestrator::RequestOrchestrator;
pub use types::{
    AttachmentKind, ChatId, Event, FetchRequest, FetchResult, FetchSummary, IncomingMessage,
    MessageRef, RequestStage, UserId, VideoInfo,
};
pub use url_extract::extract_url;

/// Run the bot until a termination signal arrives.
///
/// The signal cancels the bot's shutdown token: polling stops and in-flight
/// requests are cancelled and awaited, so their cleanup runs before this
/// returns.
///
/// - **Unix:** SIGTERM or SIGINT. If neither handler can be registered the
///   bot falls back to `tokio::signal::ctrl_c()`.
/// - **Windows/other:** Ctrl+C via `tokio::signal::ctrl_c()`.
pub async fn run_with_shutdown(bot: Bot) -> Result<()> {
    let shutdown = bot.shutdown_token();
    let signals = tokio::spawn(async move {
        let signal = wait_for_signal().await;
        tracing::info!(signal, "stop requested, shutting down bot");
        shutdown.cancel();
    });

    let result = bot.run().await;
    signals.abort();
    result
}

/// Wait for the first termination signal and return its name
#[cfg(unix)]
async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration can fail in sandboxes; whichever handler exists is enough
    let terminate = signal(SignalKind::terminate())
        .inspect_err(|e| tracing::warn!(error = %e, "bot cannot listen for SIGTERM"))
        .ok();
    let interrupt = signal(SignalKind::interrupt())
        .inspect_err(|e| tracing::warn!(error = %e, "bot cannot listen for SIGINT"))
        .ok();

    match (terminate, interrupt) {
        (Some(mut terminate), Some(mut interrupt)) => tokio::select! {
            _ = terminate.recv() => "SIGTERM",
            _ = interrupt.recv() => "SIGINT",
        },
        (Some(mut terminate), None) => {
            terminate.recv().await;
            "SIGTERM"
        }
        (None, Some(mut interrupt)) => {
            interrupt.recv().await;
            "SIGINT"
        }
        (None, None) => ctrl_c().await,
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> &'static str {
    ctrl_c().await
}

async fn ctrl_c() -> &'static str {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "bot cannot listen for Ctrl+C, stopping now");
    }
    "ctrl-c"
}
