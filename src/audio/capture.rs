//! Seam between the recording state machine and the capture device

use crate::Result;
use crossbeam_channel::Sender;

/// A device that can be asked for microphone access
pub trait AudioSource {
    type Handle: CaptureHandle;

    /// Request access to the capture device.
    ///
    /// Fails with `PermissionDenied` when access is refused or no device exists.
    fn request(&mut self) -> Result<Self::Handle>;
}

/// A granted, reusable microphone handle
pub trait CaptureHandle {
    /// Sample rate of the delivered buffers
    fn sample_rate(&self) -> u32;

    /// Channel count of the delivered buffers
    fn channels(&self) -> u16;

    /// Begin delivering sample buffers to `samples_tx`
    fn start(&mut self, samples_tx: Sender<Vec<f32>>) -> Result<()>;

    /// Stop delivering buffers. The handle stays usable for the next `start`.
    fn pause(&mut self) -> Result<()>;

    fn is_capturing(&self) -> bool;
}

type RequestFn = Box<dyn FnMut() -> Result<Box<dyn CaptureHandle>>>;

/// Type-erased source, so the UI can hold a recorder without naming the device type
pub struct BoxedSource {
    request: RequestFn,
}

impl BoxedSource {
    pub fn new<S>(mut source: S) -> Self
    where
        S: AudioSource + 'static,
        S::Handle: 'static,
    {
        Self {
            request: Box::new(move || {
                source
                    .request()
                    .map(|handle| Box::new(handle) as Box<dyn CaptureHandle>)
            }),
        }
    }
}

impl AudioSource for BoxedSource {
    type Handle = Box<dyn CaptureHandle>;

    fn request(&mut self) -> Result<Self::Handle> {
        (self.request)()
    }
}

impl CaptureHandle for Box<dyn CaptureHandle> {
    fn sample_rate(&self) -> u32 {
        (**self).sample_rate()
    }

    fn channels(&self) -> u16 {
        (**self).channels()
    }

    fn start(&mut self, samples_tx: Sender<Vec<f32>>) -> Result<()> {
        (**self).start(samples_tx)
    }

    fn pause(&mut self) -> Result<()> {
        (**self).pause()
    }

    fn is_capturing(&self) -> bool {
        (**self).is_capturing()
    }
}
