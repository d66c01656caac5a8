//! Core types for vidgrab

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Identity of the user who sent a message
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl UserId {
    /// Create a new UserId
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the inner i64 value
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Chat a reply is delivered to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

impl From<i64> for ChatId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A message previously sent by the bot, addressable for edits and deletion
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    /// Chat the message lives in
    pub chat: ChatId,
    /// Message id within the chat
    pub message_id: i64,
}

/// A text message received from a user
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IncomingMessage {
    /// Sender of the message
    pub user: UserId,
    /// Chat the message arrived in (replies go here)
    pub chat: ChatId,
    /// Raw message text
    pub text: String,
}

/// Metadata describing a remote media item, as reported by `yt-dlp --dump-json`
///
/// Every field is optional on the wire; absent values fall back to their defaults
/// so sites with sparse metadata still produce a usable record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    /// Media title
    #[serde(default)]
    pub title: String,
    /// Duration in seconds (0 when unknown)
    #[serde(default, deserialize_with = "null_as_default")]
    pub duration: f64,
    /// Canonical page URL
    #[serde(default, rename = "webpage_url")]
    pub url: String,
    /// Thumbnail URL
    #[serde(default)]
    pub thumbnail: Option<String>,
    /// Name of the site extractor (e.g. "youtube")
    #[serde(default, deserialize_with = "null_as_default")]
    pub extractor: String,
    /// Approximate size in bytes
    #[serde(default, rename = "filesize_approx")]
    pub approx_size_bytes: Option<u64>,
    /// Human-readable format description
    #[serde(default)]
    pub format: Option<String>,
}

impl VideoInfo {
    /// Whether the tool reported a usable duration
    pub fn has_duration(&self) -> bool {
        self.duration > 0.0
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Parameters for a constrained fetch
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchRequest {
    /// Media page URL
    pub url: String,
    /// Directory the artifact is written into
    pub destination_dir: PathBuf,
    /// Size ceiling in megabytes (1 MB = 1,048,576 bytes)
    pub max_size_mb: u64,
    /// Unique per-request filename prefix
    pub token: String,
}

impl FetchRequest {
    /// Filename prefix every file produced for this request starts with
    pub fn prefix(&self) -> String {
        format!("{}_", self.token)
    }

    /// Size ceiling in bytes
    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_mb.saturating_mul(crate::utils::BYTES_PER_MB)
    }
}

/// Outcome of a completed, size-verified download
#[must_use]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchResult {
    /// Absolute path of the artifact
    pub path: PathBuf,
    /// Size of the artifact in bytes
    pub size_bytes: u64,
    /// File name component of `path`
    pub file_name: String,
}

/// How the artifact ended up being delivered
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    /// Sent as a playable video
    Video,
    /// Sent as a generic file after the video upload was rejected
    Document,
}

/// Summary of a request that reached the Completed stage
#[derive(Clone, Debug, PartialEq)]
pub struct FetchSummary {
    /// Metadata returned by the probe
    pub info: VideoInfo,
    /// Delivered file name
    pub file_name: String,
    /// Delivered size in bytes
    pub size_bytes: u64,
    /// Attachment form that was accepted
    pub delivered_as: AttachmentKind,
}

/// Lifecycle stage of one request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStage {
    /// Admission granted; release is guaranteed from here on
    Admitted,
    /// Metadata probe succeeded
    InfoFetched,
    /// Artifact downloaded and size-verified
    Downloaded,
    /// Artifact handed to the messaging adapter
    Delivered,
    /// Artifact deleted and status message removed
    Completed,
    /// Terminal failure state
    Failed,
}

impl RequestStage {
    /// Whether no further transitions can happen
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for RequestStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Admitted => "admitted",
            Self::InfoFetched => "info_fetched",
            Self::Downloaded => "downloaded",
            Self::Delivered => "delivered",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Lifecycle events broadcast by the orchestrator
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// A user's request was admitted
    Admitted {
        /// Requesting user
        user: UserId,
        /// Extracted URL
        url: String,
    },
    /// Metadata probe succeeded
    InfoFetched {
        /// Requesting user
        user: UserId,
        /// Media title
        title: String,
    },
    /// Artifact downloaded and verified
    Downloaded {
        /// Requesting user
        user: UserId,
        /// Artifact path
        path: PathBuf,
        /// Artifact size
        size_bytes: u64,
    },
    /// Artifact accepted by the messaging adapter
    Delivered {
        /// Requesting user
        user: UserId,
        /// Attachment form used
        kind: AttachmentKind,
    },
    /// Request finished and cleaned up
    Completed {
        /// Requesting user
        user: UserId,
    },
    /// Request failed; cleanup has run
    Failed {
        /// Requesting user
        user: UserId,
        /// Last stage reached before the failure
        stage: RequestStage,
        /// Error description
        error: String,
    },
}
