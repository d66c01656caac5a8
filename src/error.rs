//! Error types for vidgrab
//!
//! This module provides the error handling for the crate:
//! - [`FetchError`] for the yt-dlp client (probe, fetch, artifact resolution)
//! - [`MessagingError`] for the chat transport
//! - [`RequestError`], the per-request taxonomy the orchestrator reports to users
//! - [`Error`], the crate-level error used by configuration and startup

use crate::types::UserId;
use crate::utils::{BYTES_PER_MB, format_file_size, truncate_diagnostic};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for vidgrab operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for vidgrab
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "TELEGRAM_BOT_TOKEN")
        key: Option<String>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Media fetch error
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Messaging transport error
    #[error("messaging error: {0}")]
    Messaging(#[from] MessagingError),

    /// A request terminated with a failure
    #[error("request failed: {0}")]
    Request(#[from] RequestError),

    /// External tool execution failed (yt-dlp missing, unusable, etc.)
    #[error("external tool error: {0}")]
    ExternalTool(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// The request's time budget ran out or the process is shutting down
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Interrupted {
    /// The wall-clock budget expired
    #[error("timed out after {}s", .0.as_secs())]
    DeadlineExceeded(Duration),

    /// The request was cancelled (shutdown)
    #[error("cancelled")]
    Cancelled,
}

/// Errors produced by the media fetch client
#[derive(Debug, Error)]
pub enum FetchError {
    /// The tool binary could not be started
    #[error("failed to execute yt-dlp: {0}")]
    Spawn(String),

    /// Metadata probe exited non-zero
    #[error("yt-dlp error: {diagnostic}")]
    Probe {
        /// The tool's diagnostic text
        diagnostic: String,
    },

    /// Probe output was not a valid metadata record
    #[error("failed to parse video info: {0}")]
    MalformedMetadata(String),

    /// Constrained fetch exited non-zero
    #[error("download failed: {diagnostic}")]
    Download {
        /// The tool's diagnostic text
        diagnostic: String,
    },

    /// The tool reported success but no artifact could be located
    #[error("could not find downloaded file: no file with prefix {prefix} in {}", dir.display())]
    ArtifactNotFound {
        /// Expected filename prefix
        prefix: String,
        /// Directory that was scanned
        dir: PathBuf,
    },

    /// The artifact is larger than the configured ceiling
    #[error(
        "file too large ({}MB > {limit_mb}MB limit). Try a shorter video",
        size_bytes / BYTES_PER_MB
    )]
    SizeExceeded {
        /// Actual size in bytes
        size_bytes: u64,
        /// Limit in megabytes
        limit_mb: u64,
    },

    /// Filesystem operation on the artifact failed
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// Path involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The request context expired or was cancelled while the tool ran
    #[error("yt-dlp interrupted: {0}")]
    Interrupted(#[from] Interrupted),
}

/// Errors produced by the messaging transport
#[derive(Debug, Error)]
pub enum MessagingError {
    /// The chat API rejected the call
    #[error("API error {code}: {description}")]
    Api {
        /// Error code reported by the API
        code: i64,
        /// Description reported by the API
        description: String,
    },

    /// HTTP transport failure
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The attachment could not be read from disk
    #[error("failed to read attachment {}: {source}", path.display())]
    Attachment {
        /// Attachment path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The API answered with something that is not a valid response envelope
    #[error("invalid API response: {0}")]
    InvalidResponse(String),
}

/// Per-request failure taxonomy
///
/// Every variant terminates exactly one request and maps to exactly one
/// user-visible message via [`RequestError::user_message`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// Sender is not on the allow-list
    #[error("user {user} is not allowed")]
    AccessDenied {
        /// Rejected user
        user: UserId,
    },

    /// No URL could be extracted from the message
    #[error("no URL found in message")]
    NoUrlFound,

    /// The user already has a request in flight
    #[error("user {user} already has an active request")]
    AlreadyActive {
        /// Rejected user
        user: UserId,
    },

    /// Metadata probe failed or returned malformed output
    #[error("{0}")]
    InfoFetchFailed(String),

    /// The fetch tool failed
    #[error("{0}")]
    DownloadFailed(String),

    /// The fetch tool succeeded but the artifact could not be located
    #[error("{0}")]
    ArtifactNotFound(String),

    /// The artifact exceeded the size ceiling
    #[error(
        "file too large ({}MB > {limit_mb}MB limit). Try a shorter video",
        size_bytes / BYTES_PER_MB
    )]
    SizeExceeded {
        /// Actual size in bytes
        size_bytes: u64,
        /// Limit in megabytes
        limit_mb: u64,
    },

    /// Both the video and the document upload were rejected
    #[error("delivery failed: {reason}")]
    DeliveryFailed {
        /// Artifact size in bytes
        size_bytes: u64,
        /// Error from the last attempt
        reason: String,
    },

    /// The artifact could not be opened or inspected
    #[error("local I/O failed: {0}")]
    LocalIo(String),

    /// The request's wall-clock budget expired
    #[error("request timed out after {}s", .0.as_secs())]
    TimedOut(Duration),

    /// The request was cancelled by shutdown
    #[error("request cancelled")]
    Cancelled,
}

impl RequestError {
    /// Machine-readable error code, used as a structured log field
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AccessDenied { .. } => "access_denied",
            Self::NoUrlFound => "no_url_found",
            Self::AlreadyActive { .. } => "already_active",
            Self::InfoFetchFailed(_) => "info_fetch_failed",
            Self::DownloadFailed(_) => "download_failed",
            Self::ArtifactNotFound(_) => "artifact_not_found",
            Self::SizeExceeded { .. } => "size_exceeded",
            Self::DeliveryFailed { .. } => "delivery_failed",
            Self::LocalIo(_) => "local_io_failed",
            Self::TimedOut(_) => "timed_out",
            Self::Cancelled => "cancelled",
        }
    }

    /// Text shown to the user; tool diagnostics are capped at `limit` characters
    pub fn user_message(&self, limit: usize) -> String {
        match self {
            Self::AccessDenied { .. } => "⛔ Sorry, you don't have access to this bot.".to_string(),
            Self::NoUrlFound => "❌ No valid link found.\n\n\
                 Send a video link to download it. Example:\n\
                 https://www.youtube.com/watch?v=xxx"
                .to_string(),
            Self::AlreadyActive { .. } => {
                "⏳ You still have a download in progress. Please wait until it finishes."
                    .to_string()
            }
            Self::InfoFetchFailed(diagnostic) => format!(
                "❌ Failed to fetch video info:\n{}",
                truncate_diagnostic(diagnostic, limit)
            ),
            Self::DownloadFailed(_) | Self::ArtifactNotFound(_) | Self::SizeExceeded { .. } => {
                format!(
                    "❌ Failed to download video:\n{}",
                    truncate_diagnostic(&self.to_string(), limit)
                )
            }
            Self::DeliveryFailed { size_bytes, .. } => format!(
                "❌ Failed to send the video. The file may be too large ({}).",
                format_file_size(*size_bytes)
            ),
            Self::LocalIo(_) => "❌ Failed to open the video file.".to_string(),
            Self::TimedOut(budget) => format!(
                "⌛ The download took longer than {} minutes and was stopped.",
                budget.as_secs().div_ceil(60)
            ),
            Self::Cancelled => "🛑 The bot is shutting down, the download was stopped.".to_string(),
        }
    }

    /// Map an interruption of the request context onto the taxonomy
    pub fn from_interrupt(interrupt: Interrupted) -> Self {
        match interrupt {
            Interrupted::DeadlineExceeded(budget) => Self::TimedOut(budget),
            Interrupted::Cancelled => Self::Cancelled,
        }
    }

    /// Classify a failed probe
    pub fn from_probe(error: FetchError) -> Self {
        match error {
            FetchError::Interrupted(i) => Self::from_interrupt(i),
            other => Self::InfoFetchFailed(other.to_string()),
        }
    }

    /// Classify a failed constrained fetch
    pub fn from_fetch(error: FetchError) -> Self {
        match error {
            FetchError::Interrupted(i) => Self::from_interrupt(i),
            FetchError::SizeExceeded {
                size_bytes,
                limit_mb,
            } => Self::SizeExceeded {
                size_bytes,
                limit_mb,
            },
            e @ FetchError::ArtifactNotFound { .. } => Self::ArtifactNotFound(e.to_string()),
            e @ FetchError::Io { .. } => Self::LocalIo(e.to_string()),
            e => Self::DownloadFailed(e.to_string()),
        }
    }
}
