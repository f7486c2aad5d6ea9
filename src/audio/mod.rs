pub mod buffer;
pub mod capture;
#[cfg(feature = "audio-io")]
pub mod input;
pub mod recorder;
pub mod wav;

pub use buffer::{AudioClip, ChunkBuffer};
pub use capture::{AudioSource, BoxedSource, CaptureHandle};
#[cfg(feature = "audio-io")]
pub use input::{CpalCapture, CpalSource};
pub use recorder::{PermissionState, RecordingPhase, RecordingSession, StartOutcome};
pub use wav::{decode_wav, encode_wav};
