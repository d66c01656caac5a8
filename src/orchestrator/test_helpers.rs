//! Shared fakes for exercising the orchestrator without yt-dlp or the Bot API.

use crate::config::Config;
use crate::context::RequestContext;
use crate::error::{FetchError, MessagingError};
use crate::media::{MediaFetcher, remove_prefixed};
use crate::messaging::{Attachment, Messenger, TextFormat};
use crate::orchestrator::RequestOrchestrator;
use crate::types::{ChatId, FetchRequest, FetchResult, MessageRef, VideoInfo};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Notify;

/// One call observed by [`RecordingMessenger`]
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Send {
        chat: ChatId,
        text: String,
        format: TextFormat,
    },
    Edit {
        message_id: i64,
        text: String,
        format: TextFormat,
    },
    Delete {
        message_id: i64,
    },
    Video {
        chat: ChatId,
        attachment: Attachment,
        /// Whether the file existed when the upload was attempted
        file_present: bool,
    },
    Document {
        chat: ChatId,
        attachment: Attachment,
        file_present: bool,
    },
}

/// Messenger that records every call and can be told to reject some of them
#[derive(Default)]
pub(crate) struct RecordingMessenger {
    calls: Mutex<Vec<Call>>,
    next_id: AtomicI64,
    pub(crate) reject_sends: AtomicBool,
    pub(crate) reject_edits: AtomicBool,
    pub(crate) reject_videos: AtomicBool,
    pub(crate) reject_documents: AtomicBool,
}

fn rejected(what: &str) -> MessagingError {
    MessagingError::Api {
        code: 400,
        description: format!("Bad Request: {} rejected", what),
    }
}

impl RecordingMessenger {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Text of every sent or edited message, in order
    pub(crate) fn texts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Send { text, .. } | Call::Edit { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn last_text(&self) -> String {
        self.texts().pop().unwrap_or_default()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn next_ref(&self, chat: ChatId) -> MessageRef {
        MessageRef {
            chat,
            message_id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
        }
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_text(
        &self,
        chat: ChatId,
        text: &str,
        format: TextFormat,
    ) -> Result<MessageRef, MessagingError> {
        self.record(Call::Send {
            chat,
            text: text.to_string(),
            format,
        });
        if self.reject_sends.load(Ordering::SeqCst) {
            return Err(rejected("message"));
        }
        Ok(self.next_ref(chat))
    }

    async fn edit_text(
        &self,
        message: &MessageRef,
        text: &str,
        format: TextFormat,
    ) -> Result<(), MessagingError> {
        self.record(Call::Edit {
            message_id: message.message_id,
            text: text.to_string(),
            format,
        });
        if self.reject_edits.load(Ordering::SeqCst) {
            return Err(rejected("edit"));
        }
        Ok(())
    }

    async fn delete_message(&self, message: &MessageRef) -> Result<(), MessagingError> {
        self.record(Call::Delete {
            message_id: message.message_id,
        });
        Ok(())
    }

    async fn send_video(
        &self,
        chat: ChatId,
        attachment: &Attachment,
    ) -> Result<MessageRef, MessagingError> {
        self.record(Call::Video {
            chat,
            attachment: attachment.clone(),
            file_present: attachment.path.exists(),
        });
        if self.reject_videos.load(Ordering::SeqCst) {
            return Err(rejected("video"));
        }
        Ok(self.next_ref(chat))
    }

    async fn send_document(
        &self,
        chat: ChatId,
        attachment: &Attachment,
    ) -> Result<MessageRef, MessagingError> {
        self.record(Call::Document {
            chat,
            attachment: attachment.clone(),
            file_present: attachment.path.exists(),
        });
        if self.reject_documents.load(Ordering::SeqCst) {
            return Err(rejected("document"));
        }
        Ok(self.next_ref(chat))
    }
}

/// How [`ScriptedFetcher::probe_info`] behaves
#[derive(Debug, Clone)]
pub(crate) enum ProbeScript {
    Info(VideoInfo),
    Fail(String),
}

/// How [`ScriptedFetcher::fetch_constrained`] behaves
#[derive(Debug, Clone)]
pub(crate) enum FetchScript {
    /// Write `<token>_Clip.mp4` with this many bytes, honoring the size ceiling
    Write(usize),
    /// Tool exits non-zero with this diagnostic
    Fail(String),
    /// Tool exits zero but leaves nothing behind
    Unresolved,
    /// Write a partial file, then run until the request context ends
    Hang,
}

/// Fetcher that follows a script and writes real files to the destination
pub(crate) struct ScriptedFetcher {
    probe: ProbeScript,
    fetch: FetchScript,
    /// Fetch waits for this before writing, when set
    gate: Option<Arc<Notify>>,
    /// Notified once a fetch has started
    pub(crate) fetch_started: Arc<Notify>,
    created: Mutex<Vec<PathBuf>>,
}

impl ScriptedFetcher {
    pub(crate) fn new(probe: ProbeScript, fetch: FetchScript) -> Self {
        Self {
            probe,
            fetch,
            gate: None,
            fetch_started: Arc::new(Notify::new()),
            created: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn succeeding(bytes: usize) -> Self {
        Self::new(ProbeScript::Info(sample_info()), FetchScript::Write(bytes))
    }

    pub(crate) fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Every artifact path this fetcher wrote
    pub(crate) fn created(&self) -> Vec<PathBuf> {
        self.created.lock().unwrap().clone()
    }

    fn write(&self, request: &FetchRequest, bytes: usize) -> PathBuf {
        let path = request
            .destination_dir
            .join(format!("{}Clip.mp4", request.prefix()));
        std::fs::write(&path, vec![0u8; bytes]).unwrap();
        self.created.lock().unwrap().push(path.clone());
        path
    }
}

#[async_trait]
impl MediaFetcher for ScriptedFetcher {
    async fn probe_info(&self, _url: &str, ctx: &RequestContext) -> Result<VideoInfo, FetchError> {
        ctx.run(async {}).await?;
        match &self.probe {
            ProbeScript::Info(info) => Ok(info.clone()),
            ProbeScript::Fail(diagnostic) => Err(FetchError::Probe {
                diagnostic: diagnostic.clone(),
            }),
        }
    }

    async fn fetch_constrained(
        &self,
        request: &FetchRequest,
        ctx: &RequestContext,
    ) -> Result<FetchResult, FetchError> {
        self.fetch_started.notify_one();
        if let Some(gate) = &self.gate {
            ctx.run(gate.notified()).await?;
        }

        match &self.fetch {
            FetchScript::Write(bytes) => {
                let path = self.write(request, *bytes);
                let size_bytes = *bytes as u64;
                if size_bytes > request.max_size_bytes() {
                    std::fs::remove_file(&path).unwrap();
                    return Err(FetchError::SizeExceeded {
                        size_bytes,
                        limit_mb: request.max_size_mb,
                    });
                }
                let file_name = path.file_name().unwrap().to_string_lossy().into_owned();
                Ok(FetchResult {
                    path,
                    size_bytes,
                    file_name,
                })
            }
            FetchScript::Fail(diagnostic) => Err(FetchError::Download {
                diagnostic: diagnostic.clone(),
            }),
            FetchScript::Unresolved => Err(FetchError::ArtifactNotFound {
                prefix: request.prefix(),
                dir: request.destination_dir.clone(),
            }),
            FetchScript::Hang => {
                self.write(request, 16);
                let interrupted = ctx
                    .run(std::future::pending::<()>())
                    .await
                    .unwrap_err();
                remove_prefixed(&request.destination_dir, &request.prefix()).await;
                Err(interrupted.into())
            }
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

pub(crate) fn sample_info() -> VideoInfo {
    VideoInfo {
        title: "Clip: the_best [HD]".to_string(),
        duration: 75.0,
        url: "https://example.com/watch?v=abc123".to_string(),
        extractor: "youtube".to_string(),
        ..Default::default()
    }
}

/// Config pointing at a fresh download directory
pub(crate) fn test_config(max_file_size_mb: u64, request_timeout: Duration) -> (Config, TempDir) {
    let dir = TempDir::new().unwrap();
    let mut config = Config::default();
    config.telegram.bot_token = "test-token".to_string();
    config.download.download_dir = dir.path().to_path_buf();
    config.download.max_file_size_mb = max_file_size_mb;
    config.download.request_timeout = request_timeout;
    (config, dir)
}

/// Orchestrator wired to the given fakes
pub(crate) fn orchestrator(
    config: Config,
    fetcher: Arc<ScriptedFetcher>,
    messenger: Arc<RecordingMessenger>,
) -> RequestOrchestrator {
    RequestOrchestrator::new(Arc::new(config), fetcher, messenger)
}

/// Files left in the download directory
pub(crate) fn leftover_files(dir: &TempDir) -> Vec<PathBuf> {
    std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect()
}
