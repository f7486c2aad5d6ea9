//! Press-to-record voice input state machine
//!
//! `Idle → AwaitingPermission → Recording → Submitting → Idle`. The capture
//! handle is requested once and reused for every later recording; a denied
//! or failed request leaves nothing behind, so the next `start` asks again.

use super::buffer::{AudioClip, ChunkBuffer};
use super::capture::{AudioSource, CaptureHandle};
use crate::{RagChatError, Result};
use crossbeam_channel::{unbounded, Receiver};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingPhase {
    Idle,
    AwaitingPermission,
    Recording,
    /// Recording stopped, upload in flight
    Submitting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Unknown,
    Granted,
    Denied,
}

/// Result of asking to start a recording
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// Capture is running
    Recording,
    /// A recording or upload is already in progress; nothing changed
    AlreadyActive,
    /// Access was refused; the fallback permission prompt should be shown
    PermissionPrompt,
}

pub struct RecordingSession<S: AudioSource> {
    source: S,
    permission: PermissionState,
    capture: Option<S::Handle>,
    chunks: ChunkBuffer,
    samples_rx: Option<Receiver<Vec<f32>>>,
    phase: RecordingPhase,
    prompt_visible: bool,
    level: f32,
}

impl<S: AudioSource> RecordingSession<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            permission: PermissionState::Unknown,
            capture: None,
            chunks: ChunkBuffer::new(),
            samples_rx: None,
            phase: RecordingPhase::Idle,
            prompt_visible: false,
            level: 0.0,
        }
    }

    pub fn phase(&self) -> RecordingPhase {
        self.phase
    }

    pub fn permission(&self) -> PermissionState {
        self.permission
    }

    pub fn is_recording(&self) -> bool {
        self.phase == RecordingPhase::Recording
    }

    pub fn is_submitting(&self) -> bool {
        self.phase == RecordingPhase::Submitting
    }

    /// Whether a capture handle is held for reuse
    pub fn has_capture(&self) -> bool {
        self.capture.is_some()
    }

    /// Whether the fallback permission prompt should be shown
    pub fn prompt_visible(&self) -> bool {
        self.prompt_visible
    }

    /// RMS level of the most recent buffer, for the recording indicator
    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn buffered_samples(&self) -> usize {
        self.chunks.sample_count()
    }

    /// Start a recording, requesting microphone access first if needed
    pub fn start(&mut self) -> Result<StartOutcome> {
        if self.phase != RecordingPhase::Idle {
            warn!("Ignoring start while {:?}", self.phase);
            return Ok(StartOutcome::AlreadyActive);
        }

        if self.permission == PermissionState::Granted && self.capture.is_some() {
            debug!("Reusing granted microphone");
            return self.begin_recording();
        }

        self.phase = RecordingPhase::AwaitingPermission;
        match self.source.request() {
            Ok(handle) => self.grant(handle),
            Err(e) => {
                error!("Microphone access denied or failed: {}", e);
                self.revoke();
                self.prompt_visible = true;
                Ok(StartOutcome::PermissionPrompt)
            }
        }
    }

    /// The permission prompt's "Allow" action: ask for the device again
    pub fn allow(&mut self) -> Result<StartOutcome> {
        self.prompt_visible = false;
        if self.phase != RecordingPhase::Idle {
            return Ok(StartOutcome::AlreadyActive);
        }

        self.phase = RecordingPhase::AwaitingPermission;
        match self.source.request() {
            Ok(handle) => self.grant(handle),
            Err(e) => {
                error!("Microphone access denied by user or system settings: {}", e);
                self.revoke();
                Err(RagChatError::PermissionDenied(e.to_string()))
            }
        }
    }

    /// The permission prompt's "Deny" action
    pub fn deny(&mut self) {
        self.prompt_visible = false;
        self.permission = PermissionState::Denied;
        warn!("Microphone permission denied");
    }

    /// Move buffered samples from the capture into the chunk buffer
    pub fn poll(&mut self) {
        let Some(rx) = &self.samples_rx else {
            return;
        };

        let mut latest = None;
        for chunk in rx.try_iter() {
            latest = Some(rms(&chunk));
            self.chunks.push(chunk);
        }
        if let Some(level) = latest {
            self.level = level;
        }
    }

    /// Stop the recording and hand back the captured clip.
    ///
    /// Returns `None` when nothing is being recorded.
    pub fn stop(&mut self) -> Option<AudioClip> {
        if self.phase != RecordingPhase::Recording {
            debug!("Ignoring stop while {:?}", self.phase);
            return None;
        }

        let capture = self.capture.as_mut()?;
        if let Err(e) = capture.pause() {
            warn!("Failed to pause capture: {}", e);
        }
        let (sample_rate, channels) = (capture.sample_rate(), capture.channels());

        self.poll();
        self.samples_rx = None;
        self.level = 0.0;

        let clip = AudioClip::new(self.chunks.take(), sample_rate, channels);
        self.phase = RecordingPhase::Submitting;
        info!(
            "Recording stopped: {:.1}s of audio ready for upload",
            clip.duration_seconds()
        );
        Some(clip)
    }

    /// Discard the current recording without uploading it
    pub fn cancel(&mut self) {
        if self.phase != RecordingPhase::Recording {
            return;
        }
        if let Some(capture) = self.capture.as_mut() {
            let _ = capture.pause();
        }
        self.samples_rx = None;
        self.chunks.clear();
        self.level = 0.0;
        self.phase = RecordingPhase::Idle;
        info!("Recording cancelled");
    }

    /// The upload finished, successfully or not
    pub fn finish_submission(&mut self) {
        if self.phase == RecordingPhase::Submitting {
            self.phase = RecordingPhase::Idle;
        }
    }

    fn grant(&mut self, handle: S::Handle) -> Result<StartOutcome> {
        info!("Microphone access granted");
        self.permission = PermissionState::Granted;
        self.capture = Some(handle);
        self.begin_recording()
    }

    fn revoke(&mut self) {
        self.capture = None;
        self.samples_rx = None;
        self.permission = PermissionState::Denied;
        self.phase = RecordingPhase::Idle;
    }

    fn begin_recording(&mut self) -> Result<StartOutcome> {
        let Some(capture) = self.capture.as_mut() else {
            self.phase = RecordingPhase::Idle;
            return Err(RagChatError::AudioDevice("No capture handle".to_string()));
        };

        self.chunks.clear();
        let (tx, rx) = unbounded();

        if let Err(e) = capture.start(tx) {
            error!("Failed to start capture: {}", e);
            // Do not keep a handle that cannot record
            self.capture = None;
            self.samples_rx = None;
            self.permission = PermissionState::Unknown;
            self.phase = RecordingPhase::Idle;
            return Err(e);
        }

        self.samples_rx = Some(rx);
        self.phase = RecordingPhase::Recording;
        info!("Recording started");
        Ok(StartOutcome::Recording)
    }
}

fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
}
