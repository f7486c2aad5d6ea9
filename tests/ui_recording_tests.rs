//! UI recording state tests
//!
//! These tests drive the voice input state machine through `AppState` and
//! `RecordingSession` with a scripted microphone.

use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use ragchat::audio::{
    decode_wav, AudioSource, BoxedSource, CaptureHandle, PermissionState, RecordingPhase,
    RecordingSession, StartOutcome,
};
use ragchat::chat::{ChatCommand, ChatEvent, TurnKind};
use ragchat::stream::ConsumeReport;
use ragchat::ui::AppState;
use ragchat::{RagChatError, Result};
use std::sync::Arc;

/// Shared view of what the fake microphone has been asked to do
#[derive(Clone, Default)]
struct Probe {
    feed: Arc<Mutex<Option<Sender<Vec<f32>>>>>,
    requests: Arc<Mutex<usize>>,
}

impl Probe {
    fn send(&self, samples: &[f32]) {
        if let Some(tx) = self.feed.lock().as_ref() {
            tx.send(samples.to_vec()).unwrap();
        }
    }

    fn requests(&self) -> usize {
        *self.requests.lock()
    }
}

struct ScriptedHandle {
    probe: Probe,
    capturing: bool,
}

impl CaptureHandle for ScriptedHandle {
    fn sample_rate(&self) -> u32 {
        16000
    }

    fn channels(&self) -> u16 {
        1
    }

    fn start(&mut self, samples_tx: Sender<Vec<f32>>) -> Result<()> {
        *self.probe.feed.lock() = Some(samples_tx);
        self.capturing = true;
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        *self.probe.feed.lock() = None;
        self.capturing = false;
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing
    }
}

/// Grants or refuses access according to a script, refusing once it runs out
struct ScriptedSource {
    grants: Vec<bool>,
    probe: Probe,
}

impl ScriptedSource {
    fn new(grants: &[bool]) -> (Self, Probe) {
        let probe = Probe::default();
        (
            Self {
                grants: grants.to_vec(),
                probe: probe.clone(),
            },
            probe,
        )
    }
}

impl AudioSource for ScriptedSource {
    type Handle = ScriptedHandle;

    fn request(&mut self) -> Result<ScriptedHandle> {
        let mut requests = self.probe.requests.lock();
        let granted = self.grants.get(*requests).copied().unwrap_or(false);
        *requests += 1;

        if granted {
            Ok(ScriptedHandle {
                probe: self.probe.clone(),
                capturing: false,
            })
        } else {
            Err(RagChatError::PermissionDenied("NotAllowedError".to_string()))
        }
    }
}

fn app_with_microphone(
    grants: &[bool],
) -> (AppState, Probe, Receiver<ChatCommand>, Sender<ChatEvent>) {
    let (source, probe) = ScriptedSource::new(grants);
    let (command_tx, commands) = bounded(8);
    let (events, event_rx) = bounded(8);
    let state = AppState::default()
        .connect(command_tx, event_rx)
        .with_audio_source(BoxedSource::new(source));
    (state, probe, commands, events)
}

#[test]
fn test_initial_state_is_idle() {
    let (source, probe) = ScriptedSource::new(&[true]);
    let session = RecordingSession::new(source);

    assert_eq!(session.phase(), RecordingPhase::Idle);
    assert_eq!(session.permission(), PermissionState::Unknown);
    assert!(!session.has_capture());
    assert_eq!(probe.requests(), 0);
}

#[test]
fn test_rejected_permission_returns_to_idle_with_prompt() {
    let (source, probe) = ScriptedSource::new(&[false]);
    let mut session = RecordingSession::new(source);

    let outcome = session.start().unwrap();

    assert_eq!(outcome, StartOutcome::PermissionPrompt);
    assert_eq!(session.phase(), RecordingPhase::Idle);
    assert!(session.prompt_visible());
    assert!(!session.has_capture());
    assert_eq!(session.permission(), PermissionState::Denied);
    assert!(probe.feed.lock().is_none());
}

#[test]
fn test_second_start_is_a_no_op() {
    let (source, probe) = ScriptedSource::new(&[true, true]);
    let mut session = RecordingSession::new(source);

    assert_eq!(session.start().unwrap(), StartOutcome::Recording);
    probe.send(&[0.25; 4]);
    assert_eq!(session.start().unwrap(), StartOutcome::AlreadyActive);

    assert_eq!(session.phase(), RecordingPhase::Recording);
    assert_eq!(probe.requests(), 1);

    let clip = session.stop().unwrap();
    assert_eq!(clip.samples.len(), 4);
}

#[test]
fn test_granted_handle_is_reused() {
    let (source, probe) = ScriptedSource::new(&[true]);
    let mut session = RecordingSession::new(source);

    session.start().unwrap();
    session.stop().unwrap();
    session.finish_submission();

    assert_eq!(session.start().unwrap(), StartOutcome::Recording);
    assert_eq!(probe.requests(), 1);
}

#[test]
fn test_allow_after_denial_requests_again() {
    let (source, probe) = ScriptedSource::new(&[false, true]);
    let mut session = RecordingSession::new(source);

    session.start().unwrap();
    assert!(session.prompt_visible());

    assert_eq!(session.allow().unwrap(), StartOutcome::Recording);
    assert!(!session.prompt_visible());
    assert_eq!(session.permission(), PermissionState::Granted);
    assert_eq!(probe.requests(), 2);
}

#[test]
fn test_allow_that_fails_again_stays_idle() {
    let (source, _probe) = ScriptedSource::new(&[false, false]);
    let mut session = RecordingSession::new(source);

    session.start().unwrap();
    let result = session.allow();

    assert!(matches!(result, Err(RagChatError::PermissionDenied(_))));
    assert_eq!(session.phase(), RecordingPhase::Idle);
    assert!(!session.has_capture());
    assert!(!session.prompt_visible());
}

#[test]
fn test_stop_uploads_wav_and_waits_for_reply() {
    let (mut state, probe, commands, events) = app_with_microphone(&[true]);

    state.start_recording();
    assert!(state.is_recording());

    probe.send(&[0.5, -0.5, 0.25]);
    state.poll_events();
    probe.send(&[0.0]);
    state.stop_recording();

    assert!(!state.is_recording());
    assert!(state.is_submitting());
    assert!(state.is_busy());

    let wav = match commands.try_recv() {
        Ok(ChatCommand::SendAudio { wav }) => wav,
        other => panic!("expected an audio upload, got {:?}", other),
    };
    let clip = decode_wav(&wav).unwrap();
    assert_eq!(clip.sample_rate, 16000);
    assert_eq!(clip.samples.len(), 4);

    events
        .send(ChatEvent::TurnFinished {
            kind: TurnKind::Audio,
            outcome: Ok(ConsumeReport::default()),
        })
        .unwrap();
    state.poll_events();

    assert!(!state.is_submitting());
    assert!(!state.is_busy());
}

#[test]
fn test_failed_upload_also_returns_to_idle() {
    let (mut state, _probe, _commands, events) = app_with_microphone(&[true]);

    state.start_recording();
    state.stop_recording();
    events
        .send(ChatEvent::TurnFinished {
            kind: TurnKind::Audio,
            outcome: Err("Network error".to_string()),
        })
        .unwrap();
    state.poll_events();

    assert!(!state.is_submitting());
    state.start_recording();
    assert!(state.is_recording());
}

#[test]
fn test_denied_microphone_shows_prompt_then_deny_hides_it() {
    let (mut state, probe, commands, _events) = app_with_microphone(&[false]);

    state.start_recording();
    assert!(state.permission_prompt_visible());
    assert!(!state.is_recording());

    state.deny_microphone();
    assert!(!state.permission_prompt_visible());
    assert_eq!(probe.requests(), 1);
    assert!(commands.try_recv().is_err());
}

#[test]
fn test_allow_from_prompt_starts_recording() {
    let (mut state, _probe, _commands, _events) = app_with_microphone(&[false, true]);

    state.start_recording();
    state.allow_microphone();

    assert!(!state.permission_prompt_visible());
    assert!(state.is_recording());
    assert_eq!(state.status_snapshot().error, None);
}

#[test]
fn test_allow_failing_again_closes_prompt_without_banner() {
    let (mut state, _probe, _commands, _events) = app_with_microphone(&[false, false]);

    state.start_recording();
    state.allow_microphone();

    assert!(!state.permission_prompt_visible());
    assert!(!state.is_recording());
    assert_eq!(state.status_snapshot().error, None);
}

#[test]
fn test_only_one_turn_while_recording() {
    let (mut state, probe, commands, events) = app_with_microphone(&[true]);
    let question = state.suggested_questions[0].clone();

    state.start_recording();
    probe.send(&[0.5; 8]);
    state.poll_events();

    state.send_suggested(&question);
    state.input_text = "Ciao".to_string();
    state.send_message();
    state.delete_chat();
    assert!(commands.try_recv().is_err());
    assert!(!state.can_submit());

    state.stop_recording();
    let sent: Vec<ChatCommand> = commands.try_iter().collect();
    assert_eq!(sent.len(), 1);
    assert!(matches!(sent[0], ChatCommand::SendAudio { .. }));

    state.send_suggested(&question);
    assert!(commands.try_recv().is_err());

    events
        .send(ChatEvent::TurnFinished {
            kind: TurnKind::Audio,
            outcome: Ok(ConsumeReport::default()),
        })
        .unwrap();
    state.poll_events();
    assert!(state.can_submit());

    state.send_suggested(&question);
    assert!(matches!(commands.try_recv(), Ok(ChatCommand::SendText { .. })));
}

#[test]
fn test_recording_does_not_start_while_reply_pending() {
    let (mut state, probe, commands, _events) = app_with_microphone(&[true]);
    let question = state.suggested_questions[0].clone();

    state.send_suggested(&question);
    assert!(state.is_busy());

    state.start_recording();
    assert!(!state.is_recording());
    assert_eq!(probe.requests(), 0);

    state.stop_recording();
    assert_eq!(commands.try_iter().count(), 1);
}

#[test]
fn test_cancel_discards_recording() {
    let (mut state, probe, commands, _events) = app_with_microphone(&[true]);

    state.start_recording();
    probe.send(&[0.1; 32]);
    state.poll_events();
    state.cancel_recording();

    assert!(!state.is_recording());
    assert!(!state.is_submitting());
    assert!(commands.try_recv().is_err());
}
