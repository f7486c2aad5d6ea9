//! Application state management
//!
//! Everything the window draws lives here. Chat turns run on the worker
//! thread; this side only sends commands, drains events and drives the
//! microphone, which has to stay on the UI thread.

use crate::audio::{BoxedSource, RecordingSession, StartOutcome};
use crate::chat::{ChatCommand, ChatEvent, SessionStatus, SharedStatus, TurnKind};
use crate::config::{ChatConfig, Preferences};
use crate::messages::{LogMutator, Message, MessageLog, RetrievalSettings};
use crate::RagChatError;
use crossbeam_channel::{Receiver, Sender, TrySendError};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// How long the "chat cleared" notice stays up
const NOTICE_DURATION: Duration = Duration::from_secs(2);

/// Which main view is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Suggested questions, shown until the first message
    Suggestions,
    Chat,
}

pub struct AppState {
    /// Conversation, filled by the worker
    pub log: MessageLog,

    /// Loading flags and error banner, shared with the worker
    pub status: SharedStatus,

    /// Current text input
    pub input_text: String,

    /// Retrieval options sent with each text message
    pub settings: RetrievalSettings,

    pub view: View,

    pub suggested_questions: Vec<String>,

    pub dark_mode: bool,

    /// Where window preferences are saved; `None` keeps them in memory
    prefs_path: Option<PathBuf>,

    /// Short-lived confirmation text
    notice: Option<(String, Instant)>,

    /// A command was sent and its `TurnFinished` has not arrived yet
    turn_pending: bool,

    /// Microphone state machine; `None` when voice input is off
    recorder: Option<RecordingSession<BoxedSource>>,

    /// Channel to send chat commands
    command_tx: Option<Sender<ChatCommand>>,

    /// Channel to receive chat events
    event_rx: Option<Receiver<ChatEvent>>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(&ChatConfig::default(), MessageLog::new(), SharedStatus::new())
    }
}

impl AppState {
    pub fn new(config: &ChatConfig, log: MessageLog, status: SharedStatus) -> Self {
        Self {
            log,
            status,
            input_text: String::new(),
            settings: config.retrieval.clone(),
            view: View::Suggestions,
            suggested_questions: config.suggested_questions.clone(),
            dark_mode: config.dark_mode,
            prefs_path: None,
            notice: None,
            turn_pending: false,
            recorder: None,
            command_tx: None,
            event_rx: None,
        }
    }

    /// Attach the worker's channels
    pub fn connect(mut self, command_tx: Sender<ChatCommand>, event_rx: Receiver<ChatEvent>) -> Self {
        self.command_tx = Some(command_tx);
        self.event_rx = Some(event_rx);
        self
    }

    /// Enable voice input with the given microphone source
    pub fn with_audio_source(mut self, source: BoxedSource) -> Self {
        self.recorder = Some(RecordingSession::new(source));
        self
    }

    /// Save theme changes to this preferences file
    pub fn with_preferences_path(mut self, path: PathBuf) -> Self {
        self.prefs_path = Some(path);
        self
    }

    pub fn status_snapshot(&self) -> SessionStatus {
        self.status.snapshot()
    }

    /// Whether a reply is streaming or about to
    pub fn is_busy(&self) -> bool {
        self.turn_pending || self.status.snapshot().loading
    }

    /// Whether a new turn or a delete may start now
    pub fn can_submit(&self) -> bool {
        !self.is_busy() && !self.is_recording() && !self.is_submitting()
    }

    pub fn audio_enabled(&self) -> bool {
        self.recorder.is_some()
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.as_ref().is_some_and(|r| r.is_recording())
    }

    pub fn is_submitting(&self) -> bool {
        self.recorder.as_ref().is_some_and(|r| r.is_submitting())
    }

    pub fn recording_level(&self) -> f32 {
        self.recorder.as_ref().map_or(0.0, |r| r.level())
    }

    pub fn permission_prompt_visible(&self) -> bool {
        self.recorder.as_ref().is_some_and(|r| r.prompt_visible())
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_ref().map(|(text, _)| text.as_str())
    }

    /// Index of the empty assistant placeholder that should show a typing indicator
    pub fn typing_index(&self) -> Option<usize> {
        if !self.status.snapshot().loading {
            return None;
        }
        let last = self.log.len().checked_sub(1)?;
        let index = self.log.find_last(&|m: &Message| m.is_assistant())?;
        let message = self.log.get(index)?;
        (index == last && message.content.is_empty()).then_some(index)
    }

    /// Called whenever the text input changes
    pub fn on_input_changed(&mut self) {
        self.status.clear_error();
    }

    /// Send the typed message
    pub fn send_message(&mut self) {
        let text = self.input_text.trim().to_string();
        if text.is_empty() || !self.can_submit() {
            return;
        }

        self.input_text.clear();
        self.submit_text(text);
    }

    /// Send one of the suggested questions
    pub fn send_suggested(&mut self, question: &str) {
        if !self.can_submit() {
            return;
        }
        self.submit_text(question.to_string());
    }

    fn submit_text(&mut self, content: String) {
        self.view = View::Chat;
        let command = ChatCommand::SendText {
            content,
            settings: self.settings.clone(),
        };
        if self.dispatch(command) {
            self.turn_pending = true;
        }
    }

    /// Return to the suggested questions without clearing the conversation
    pub fn show_suggestions(&mut self) {
        self.view = View::Suggestions;
    }

    /// Switch the theme and remember the choice
    pub fn set_dark_mode(&mut self, dark: bool) {
        self.dark_mode = dark;
        let Some(path) = &self.prefs_path else {
            return;
        };

        let prefs = Preferences {
            dark_mode: Some(dark),
        };
        if let Err(e) = prefs.save_to(path) {
            warn!("Could not save preferences: {}", e);
        }
    }

    /// Clear the conversation on the backend and locally
    pub fn delete_chat(&mut self) {
        if !self.can_submit() {
            return;
        }
        self.dispatch(ChatCommand::DeleteChat);
    }

    /// Ask the worker to stop after the current command
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.command_tx.take() {
            let _ = tx.send(ChatCommand::Shutdown);
        }
        self.cancel_recording();
    }

    /// Start a voice recording, showing the permission prompt if access fails
    pub fn start_recording(&mut self) {
        if self.is_busy() {
            return;
        }
        let Some(recorder) = self.recorder.as_mut() else {
            return;
        };

        match recorder.start() {
            Ok(StartOutcome::Recording) => self.status.clear_error(),
            Ok(StartOutcome::PermissionPrompt) => {
                debug!("Showing microphone permission prompt");
            }
            Ok(StartOutcome::AlreadyActive) => {}
            Err(e) => {
                error!("Could not start recording: {}", e);
                self.status.set_error(e.user_message());
            }
        }
    }

    /// Stop the recording and upload it
    pub fn stop_recording(&mut self) {
        if self.is_busy() {
            if self.is_recording() {
                warn!("Discarding recording, a reply is still pending");
                self.cancel_recording();
            }
            return;
        }
        let Some(recorder) = self.recorder.as_mut() else {
            return;
        };
        let Some(clip) = recorder.stop() else {
            return;
        };

        let wav = match clip.to_wav() {
            Ok(wav) => wav,
            Err(e) => {
                error!("Failed to encode recording: {}", e);
                recorder.finish_submission();
                self.status.set_error(e.user_message());
                return;
            }
        };

        self.view = View::Chat;
        if self.dispatch(ChatCommand::SendAudio { wav }) {
            self.turn_pending = true;
        } else if let Some(recorder) = self.recorder.as_mut() {
            recorder.finish_submission();
        }
    }

    pub fn cancel_recording(&mut self) {
        if let Some(recorder) = self.recorder.as_mut() {
            recorder.cancel();
        }
    }

    /// The permission prompt's "Allow" button
    pub fn allow_microphone(&mut self) {
        let Some(recorder) = self.recorder.as_mut() else {
            return;
        };

        match recorder.allow() {
            Ok(_) => self.status.clear_error(),
            Err(e) => {
                warn!("Microphone still unavailable: {}", e);
                recorder.deny();
            }
        }
    }

    /// The permission prompt's "Deny" button
    pub fn deny_microphone(&mut self) {
        if let Some(recorder) = self.recorder.as_mut() {
            recorder.deny();
        }
    }

    /// Process incoming events from the worker and the microphone
    pub fn poll_events(&mut self) {
        if let Some(recorder) = self.recorder.as_mut() {
            recorder.poll();
        }

        if self
            .notice
            .as_ref()
            .is_some_and(|(_, shown)| shown.elapsed() >= NOTICE_DURATION)
        {
            self.notice = None;
        }

        let events: Vec<ChatEvent> = match &self.event_rx {
            Some(rx) => rx.try_iter().collect(),
            None => Vec::new(),
        };

        for event in events {
            self.handle_event(event);
        }
    }

    fn handle_event(&mut self, event: ChatEvent) {
        match event {
            ChatEvent::TurnFinished { kind, outcome } => {
                self.turn_pending = false;
                if kind == TurnKind::Audio {
                    if let Some(recorder) = self.recorder.as_mut() {
                        recorder.finish_submission();
                    }
                }
                match outcome {
                    Ok(report) => debug!("{:?} turn finished: {:?}", kind, report),
                    Err(e) => debug!("{:?} turn failed: {}", kind, e),
                }
            }
            ChatEvent::ChatCleared => {
                info!("Chat history cleared");
                self.view = View::Suggestions;
                self.notice = Some(("Chat history cleared".to_string(), Instant::now()));
            }
            ChatEvent::DeleteFailed(e) => {
                debug!("Delete failed: {}", e);
            }
            ChatEvent::Shutdown => {
                warn!("Chat worker shut down");
                self.command_tx = None;
                self.turn_pending = false;
            }
        }
    }

    /// Send a command to the worker; reports failure on the banner
    fn dispatch(&mut self, command: ChatCommand) -> bool {
        let Some(tx) = &self.command_tx else {
            warn!("No chat worker connected");
            self.status
                .set_error("Not connected to the chat service. Please restart the application.");
            return false;
        };

        match tx.try_send(command) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                self.status.set_error(RagChatError::SessionBusy.user_message());
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                error!("Chat worker channel closed");
                self.command_tx = None;
                self.status.set_error(
                    RagChatError::Channel("worker disconnected".to_string()).user_message(),
                );
                false
            }
        }
    }
}
