use super::wav::encode_wav;
use crate::Result;

/// Ordered raw sample buffers collected during one recording
#[derive(Debug, Clone, Default)]
pub struct ChunkBuffer {
    chunks: Vec<Vec<f32>>,
}

impl ChunkBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a buffer. Empty buffers are dropped.
    pub fn push(&mut self, chunk: Vec<f32>) {
        if !chunk.is_empty() {
            self.chunks.push(chunk);
        }
    }

    /// Number of buffers held
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn sample_count(&self) -> usize {
        self.chunks.iter().map(Vec::len).sum()
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
    }

    /// Concatenate all buffers in arrival order and empty the buffer
    pub fn take(&mut self) -> Vec<f32> {
        let mut samples = Vec::with_capacity(self.sample_count());
        for chunk in self.chunks.drain(..) {
            samples.extend_from_slice(&chunk);
        }
        samples
    }
}

/// A finished recording, ready to be uploaded
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioClip {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    pub fn duration_seconds(&self) -> f32 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / (self.sample_rate as f32 * self.channels as f32)
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Encode as a 16-bit PCM WAV file in memory
    pub fn to_wav(&self) -> Result<Vec<u8>> {
        encode_wav(&self.samples, self.sample_rate, self.channels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_concatenates_in_order() {
        let mut buffer = ChunkBuffer::new();
        buffer.push(vec![0.1, 0.2]);
        buffer.push(vec![]);
        buffer.push(vec![0.3]);

        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.sample_count(), 3);
        assert_eq!(buffer.take(), vec![0.1, 0.2, 0.3]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_clip_duration() {
        let clip = AudioClip::new(vec![0.0; 16000], 16000, 1);
        assert!((clip.duration_seconds() - 1.0).abs() < f32::EPSILON);

        let silent = AudioClip::new(Vec::new(), 0, 1);
        assert_eq!(silent.duration_seconds(), 0.0);
        assert!(silent.is_empty());
    }
}
