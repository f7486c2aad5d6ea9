//! Background worker running chat turns off the UI thread
//!
//! Commands arrive over a crossbeam channel and are executed one after the
//! other on a tokio runtime owned by the worker thread, so replies are never
//! consumed concurrently.

use super::session::ChatSession;
use crate::messages::RetrievalSettings;
use crate::stream::ConsumeReport;
use crate::{RagChatError, Result};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::thread::JoinHandle;
use tokio::runtime::Runtime;
use tracing::{debug, error, info};

/// Commands that can be sent to the chat worker
#[derive(Debug, Clone)]
pub enum ChatCommand {
    /// Send a typed message
    SendText {
        content: String,
        settings: RetrievalSettings,
    },

    /// Upload a recorded clip (WAV bytes)
    SendAudio { wav: Vec<u8> },

    /// Clear the conversation on both sides
    DeleteChat,

    /// Shutdown the worker
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnKind {
    Text,
    Audio,
}

/// Events emitted by the chat worker
#[derive(Debug, Clone)]
pub enum ChatEvent {
    /// A turn ended; the error string is already on the status banner
    TurnFinished {
        kind: TurnKind,
        outcome: std::result::Result<ConsumeReport, String>,
    },

    /// The conversation was cleared
    ChatCleared,

    /// Clearing the conversation failed
    DeleteFailed(String),

    /// Worker has shut down
    Shutdown,
}

pub struct ChatWorker {
    session: ChatSession,
    command_tx: Sender<ChatCommand>,
    command_rx: Receiver<ChatCommand>,
    event_tx: Sender<ChatEvent>,
    event_rx: Receiver<ChatEvent>,
}

impl ChatWorker {
    pub fn new(session: ChatSession) -> Self {
        let (command_tx, command_rx) = bounded(32);
        let (event_tx, event_rx) = bounded(32);

        Self {
            session,
            command_tx,
            command_rx,
            event_tx,
            event_rx,
        }
    }

    /// Get a sender for commands
    pub fn command_sender(&self) -> Sender<ChatCommand> {
        self.command_tx.clone()
    }

    /// Get a receiver for events
    pub fn event_receiver(&self) -> Receiver<ChatEvent> {
        self.event_rx.clone()
    }

    /// Spawn the worker thread
    pub fn start_worker(self) -> Result<JoinHandle<()>> {
        let ChatWorker {
            session,
            command_rx,
            event_tx,
            ..
        } = self;

        std::thread::Builder::new()
            .name("ragchat-worker".to_string())
            .spawn(move || {
                info!("Chat worker starting");

                let runtime = match Runtime::new() {
                    Ok(rt) => rt,
                    Err(e) => {
                        error!("Failed to create tokio runtime: {}", e);
                        session
                            .status()
                            .set_error(RagChatError::from(e).user_message());
                        let _ = event_tx.send(ChatEvent::Shutdown);
                        return;
                    }
                };

                while let Ok(command) = command_rx.recv() {
                    let event = match command {
                        ChatCommand::SendText { content, settings } => {
                            debug!("Processing text turn");
                            let outcome = runtime
                                .block_on(session.send_message(&content, &settings))
                                .map(Option::unwrap_or_default)
                                .map_err(|e| e.to_string());
                            ChatEvent::TurnFinished {
                                kind: TurnKind::Text,
                                outcome,
                            }
                        }
                        ChatCommand::SendAudio { wav } => {
                            debug!("Processing audio turn ({} bytes)", wav.len());
                            let outcome = runtime
                                .block_on(session.send_audio(wav))
                                .map_err(|e| e.to_string());
                            ChatEvent::TurnFinished {
                                kind: TurnKind::Audio,
                                outcome,
                            }
                        }
                        ChatCommand::DeleteChat => {
                            match runtime.block_on(session.delete_chat()) {
                                Ok(()) => ChatEvent::ChatCleared,
                                Err(e) => ChatEvent::DeleteFailed(e.to_string()),
                            }
                        }
                        ChatCommand::Shutdown => break,
                    };

                    if event_tx.send(event).is_err() {
                        debug!("Event receiver dropped");
                        break;
                    }
                }

                let _ = event_tx.send(ChatEvent::Shutdown);
                info!("Chat worker stopped");
            })
            .map_err(RagChatError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::RagClient;
    use crate::messages::MessageLog;
    use std::time::Duration;

    fn worker() -> ChatWorker {
        let client = RagClient::new("http://127.0.0.1:9").unwrap();
        ChatWorker::new(ChatSession::new(client, MessageLog::new()))
    }

    #[test]
    fn test_shutdown_command_stops_worker() {
        let worker = worker();
        let commands = worker.command_sender();
        let events = worker.event_receiver();
        let handle = worker.start_worker().unwrap();

        commands.send(ChatCommand::Shutdown).unwrap();

        let event = events.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(matches!(event, ChatEvent::Shutdown));
        handle.join().unwrap();
    }

    #[test]
    fn test_blank_text_turn_finishes_without_request() {
        let worker = worker();
        let commands = worker.command_sender();
        let events = worker.event_receiver();
        let _handle = worker.start_worker().unwrap();

        commands
            .send(ChatCommand::SendText {
                content: "  ".to_string(),
                settings: RetrievalSettings::default(),
            })
            .unwrap();

        match events.recv_timeout(Duration::from_secs(5)).unwrap() {
            ChatEvent::TurnFinished { kind, outcome } => {
                assert_eq!(kind, TurnKind::Text);
                assert_eq!(outcome.unwrap(), ConsumeReport::default());
            }
            other => panic!("unexpected event: {:?}", other),
        }

        commands.send(ChatCommand::Shutdown).unwrap();
    }
}
