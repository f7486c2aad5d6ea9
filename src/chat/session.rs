//! One conversation with the backend, one turn at a time

use crate::api::{ChatRequest, RagClient};
use crate::messages::{LogMutator, Message, MessageLog, RetrievalSettings};
use crate::stream::{ConsumeReport, StreamConsumer, StreamMode};
use crate::{RagChatError, Result};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Flags the UI renders from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStatus {
    /// A reply is being streamed
    pub loading: bool,
    /// A voice recording is being uploaded and answered
    pub submitting: bool,
    /// The error banner; only the latest error is kept
    pub error: Option<String>,
}

/// Session status shared between the worker and the UI
#[derive(Debug, Clone, Default)]
pub struct SharedStatus(Arc<Mutex<SessionStatus>>);

impl SharedStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> SessionStatus {
        self.0.lock().clone()
    }

    /// Dismiss the error banner
    pub fn clear_error(&self) {
        self.0.lock().error = None;
    }

    pub fn set_error(&self, message: impl Into<String>) {
        self.0.lock().error = Some(message.into());
    }

    pub(crate) fn begin(&self, submitting: bool) {
        let mut status = self.0.lock();
        status.loading = true;
        status.submitting = submitting;
        status.error = None;
    }

    pub(crate) fn finish(&self) {
        let mut status = self.0.lock();
        status.loading = false;
        status.submitting = false;
    }
}

/// Held for the duration of a turn; releases the session on drop
struct TurnGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for TurnGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// Sends turns to the backend and folds the replies into the log.
///
/// Only one turn runs at a time; a second one started while a stream is
/// being consumed fails with `SessionBusy`.
#[derive(Debug, Clone)]
pub struct ChatSession {
    client: RagClient,
    log: MessageLog,
    status: SharedStatus,
    busy: Arc<AtomicBool>,
}

impl ChatSession {
    pub fn new(client: RagClient, log: MessageLog) -> Self {
        Self {
            client,
            log,
            status: SharedStatus::new(),
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    pub fn status(&self) -> &SharedStatus {
        &self.status
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    fn begin_turn(&self) -> Result<TurnGuard> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| {
                warn!("Rejected a turn while another reply is streaming");
                RagChatError::SessionBusy
            })?;

        Ok(TurnGuard {
            busy: Arc::clone(&self.busy),
        })
    }

    /// Send a text turn and stream the reply into the log.
    ///
    /// Blank input is ignored and returns `Ok(None)`.
    pub async fn send_message(
        &self,
        content: &str,
        settings: &RetrievalSettings,
    ) -> Result<Option<ConsumeReport>> {
        if content.trim().is_empty() {
            return Ok(None);
        }

        let _guard = self.begin_turn()?;
        self.status.begin(false);
        self.log.append(Message::user(content));

        let result: Result<ConsumeReport> = async {
            let response = self.client.post_chat(&ChatRequest::new(content, settings)).await?;
            StreamConsumer::new(StreamMode::Text)
                .with_metadata(settings.clone())
                .consume_response(response, &self.log)
                .await
        }
        .await;

        self.settle(result, false).map(Some)
    }

    /// Upload a recorded WAV clip and stream transcription and reply into the log
    pub async fn send_audio(&self, wav: Vec<u8>) -> Result<ConsumeReport> {
        let _guard = self.begin_turn()?;
        self.status.begin(true);

        let result: Result<ConsumeReport> = async {
            let response = self.client.post_audio(wav).await?;
            StreamConsumer::new(StreamMode::Audio)
                .consume_response(response, &self.log)
                .await
        }
        .await;

        self.settle(result, true)
    }

    /// Clear the server-side conversation, then the local log
    pub async fn delete_chat(&self) -> Result<()> {
        let _guard = self.begin_turn()?;

        match self.client.delete_chat().await {
            Ok(()) => {
                self.log.clear();
                self.status.clear_error();
                Ok(())
            }
            Err(e) => {
                let message = match &e {
                    RagChatError::Network(_) => e.user_message(),
                    _ => "Failed to delete chat history".to_string(),
                };
                self.status.set_error(message);
                Err(e)
            }
        }
    }

    /// Clear the turn flags and publish any error
    fn settle(&self, result: Result<ConsumeReport>, audio: bool) -> Result<ConsumeReport> {
        self.status.finish();

        match result {
            Ok(report) => {
                if let Some(last) = report.backend_errors.last() {
                    self.status.set_error(format!("Assistant error: {}", last));
                }
                info!(
                    "Turn complete: {} fragments applied, {} skipped",
                    report.frames_applied, report.frames_skipped
                );
                Ok(report)
            }
            Err(e) => {
                error!("Turn failed: {}", e);
                let message = match (&e, audio) {
                    (RagChatError::Network(_), true) => {
                        RagChatError::AudioProcessing(e.to_string()).user_message()
                    }
                    _ => e.user_message(),
                };
                self.status.set_error(message);
                Err(e)
            }
        }
    }
}
