//! Per-request state machine

use super::RequestOrchestrator;
use super::artifact::ArtifactGuard;
use super::status::{caption, fetching_text, info_text, uploading_text};
use crate::admission::AdmissionGuard;
use crate::context::RequestContext;
use crate::error::{MessagingError, RequestError};
use crate::messaging::{Attachment, TextFormat};
use crate::types::{
    AttachmentKind, ChatId, Event, FetchRequest, FetchResult, FetchSummary, MessageRef,
    RequestStage, UserId, VideoInfo,
};
use crate::utils::sanitize_filename;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Time allowed for the failure report, which runs after the request budget
const FAILURE_REPORT_TIMEOUT: Duration = Duration::from_secs(30);

/// One admitted request, from the first status message to cleanup
pub(super) struct ActiveRequest<'a> {
    orchestrator: &'a RequestOrchestrator,
    user: UserId,
    chat: ChatId,
    url: String,
    ctx: RequestContext,
    stage: RequestStage,
    status: Option<MessageRef>,
    // Released on drop, whichever way the request ends
    _admission: AdmissionGuard,
}

impl<'a> ActiveRequest<'a> {
    pub(super) fn new(
        orchestrator: &'a RequestOrchestrator,
        admission: AdmissionGuard,
        chat: ChatId,
        url: String,
    ) -> Self {
        let ctx = RequestContext::new(
            &orchestrator.shutdown,
            orchestrator.config.download.request_timeout,
        );
        Self {
            orchestrator,
            user: admission.user(),
            chat,
            url,
            ctx,
            stage: RequestStage::Admitted,
            status: None,
            _admission: admission,
        }
    }

    pub(super) async fn run(mut self) -> Result<FetchSummary, RequestError> {
        self.orchestrator.emit_event(Event::Admitted {
            user: self.user,
            url: self.url.clone(),
        });
        self.status = self.send_status(fetching_text()).await;

        match self.execute().await {
            Ok(summary) => {
                self.advance(RequestStage::Completed);
                if let Some(status) = self.status.take()
                    && let Err(e) = self
                        .orchestrator
                        .messenger
                        .delete_message(&status)
                        .await
                {
                    warn!(user_id = %self.user, error = %e, "failed to delete status message");
                }
                info!(
                    user_id = %self.user,
                    title = %summary.info.title,
                    size_bytes = summary.size_bytes,
                    delivered_as = ?summary.delivered_as,
                    "request completed"
                );
                self.orchestrator
                    .emit_event(Event::Completed { user: self.user });
                Ok(summary)
            }
            Err(error) => {
                warn!(
                    user_id = %self.user,
                    stage = %self.stage,
                    error_code = error.error_code(),
                    error = %error,
                    "request failed"
                );
                self.report_failure(&error).await;
                self.orchestrator.emit_event(Event::Failed {
                    user: self.user,
                    stage: self.stage,
                    error: error.to_string(),
                });
                Err(error)
            }
        }
    }

    /// Probe, download, deliver. The artifact guard lives only inside this
    /// call, so the file is gone before any failure is reported.
    async fn execute(&mut self) -> Result<FetchSummary, RequestError> {
        let orchestrator = self.orchestrator;
        let fetcher = &orchestrator.fetcher;
        let settings = &orchestrator.config.download;

        let info = fetcher
            .probe_info(&self.url, &self.ctx)
            .await
            .map_err(RequestError::from_probe)?;
        self.advance(RequestStage::InfoFetched);
        orchestrator.emit_event(Event::InfoFetched {
            user: self.user,
            title: info.title.clone(),
        });
        self.update_status(&info_text(&info), TextFormat::Markdown)
            .await;

        let request = FetchRequest {
            url: self.url.clone(),
            destination_dir: settings.download_dir.clone(),
            max_size_mb: settings.max_file_size_mb,
            token: Uuid::new_v4().simple().to_string(),
        };
        debug!(user_id = %self.user, token = %request.token, "starting download");
        let result = fetcher
            .fetch_constrained(&request, &self.ctx)
            .await
            .map_err(RequestError::from_fetch)?;
        let artifact = ArtifactGuard::new(
            result.path.clone(),
            request.destination_dir.clone(),
            request.prefix(),
        );
        self.advance(RequestStage::Downloaded);
        orchestrator.emit_event(Event::Downloaded {
            user: self.user,
            path: result.path.clone(),
            size_bytes: result.size_bytes,
        });
        self.update_status(uploading_text(), TextFormat::Plain)
            .await;

        let delivered_as = self.deliver(&info, &result).await?;
        self.advance(RequestStage::Delivered);
        orchestrator.emit_event(Event::Delivered {
            user: self.user,
            kind: delivered_as,
        });

        artifact.remove().await;
        Ok(FetchSummary {
            info,
            file_name: result.file_name,
            size_bytes: result.size_bytes,
            delivered_as,
        })
    }

    /// Upload as a video; on rejection retry once as a document
    async fn deliver(
        &self,
        info: &VideoInfo,
        result: &FetchResult,
    ) -> Result<AttachmentKind, RequestError> {
        let messenger = &self.orchestrator.messenger;
        let attachment = Attachment {
            path: result.path.clone(),
            file_name: format!("{}.mp4", sanitize_filename(&info.title)),
            caption: caption(info, result.size_bytes),
        };

        let video = self
            .ctx
            .run(messenger.send_video(self.chat, &attachment))
            .await
            .map_err(RequestError::from_interrupt)?;
        match video {
            Ok(_) => return Ok(AttachmentKind::Video),
            Err(MessagingError::Attachment { path, source }) => {
                return Err(RequestError::LocalIo(format!(
                    "{}: {}",
                    path.display(),
                    source
                )));
            }
            Err(e) => {
                warn!(
                    user_id = %self.user,
                    error = %e,
                    "video upload rejected, retrying as document"
                );
            }
        }

        let document = self
            .ctx
            .run(messenger.send_document(self.chat, &attachment))
            .await
            .map_err(RequestError::from_interrupt)?;
        match document {
            Ok(_) => Ok(AttachmentKind::Document),
            Err(MessagingError::Attachment { path, source }) => Err(RequestError::LocalIo(
                format!("{}: {}", path.display(), source),
            )),
            Err(e) => Err(RequestError::DeliveryFailed {
                size_bytes: result.size_bytes,
                reason: e.to_string(),
            }),
        }
    }

    fn advance(&mut self, stage: RequestStage) {
        debug!(user_id = %self.user, from = %self.stage, to = %stage, "stage transition");
        self.stage = stage;
    }

    /// Send the initial status message; `None` when it could not be sent
    async fn send_status(&self, text: &str) -> Option<MessageRef> {
        let sent = self
            .ctx
            .run(
                self.orchestrator
                    .messenger
                    .send_text(self.chat, text, TextFormat::Plain),
            )
            .await;
        match sent {
            Ok(Ok(message)) => Some(message),
            Ok(Err(e)) => {
                warn!(user_id = %self.user, error = %e, "failed to send status message");
                None
            }
            Err(interrupted) => {
                warn!(user_id = %self.user, error = %interrupted, "status message interrupted");
                None
            }
        }
    }

    /// Best-effort edit of the status message
    async fn update_status(&self, text: &str, format: TextFormat) {
        let Some(status) = self.status else {
            return;
        };
        let edited = self
            .ctx
            .run(self.orchestrator.messenger.edit_text(&status, text, format))
            .await;
        match edited {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(user_id = %self.user, error = %e, "failed to update status"),
            Err(interrupted) => {
                warn!(user_id = %self.user, error = %interrupted, "status update interrupted")
            }
        }
    }

    /// Tell the user why the request ended
    ///
    /// Runs outside the request budget (which may be what just expired) under
    /// its own timeout. Edits the status message when there is one, otherwise
    /// or if the edit fails, sends a new message.
    async fn report_failure(&mut self, error: &RequestError) {
        let messenger = &self.orchestrator.messenger;
        let text = error.user_message(self.orchestrator.config.download.error_display_limit);
        let status = self.status.take();
        let (user, chat) = (self.user, self.chat);

        let report = async {
            if let Some(status) = status {
                match messenger.edit_text(&status, &text, TextFormat::Plain).await {
                    Ok(()) => return,
                    Err(e) => {
                        warn!(user_id = %user, error = %e, "failed to edit status with failure")
                    }
                }
            }
            if let Err(e) = messenger.send_text(chat, &text, TextFormat::Plain).await {
                warn!(user_id = %user, error = %e, "failed to report failure");
            }
        };

        if tokio::time::timeout(FAILURE_REPORT_TIMEOUT, report)
            .await
            .is_err()
        {
            warn!(user_id = %user, "failure report timed out");
        }
    }
}
