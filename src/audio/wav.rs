use super::buffer::AudioClip;
use crate::{RagChatError, Result};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::io::Cursor;
use tracing::debug;

/// Encode samples as an in-memory 16-bit PCM WAV file
///
/// # Arguments
/// * `samples` - Audio samples (f32, range -1.0 to 1.0)
/// * `sample_rate` - Sample rate in Hz
/// * `channels` - Number of interleaved channels
pub fn encode_wav(samples: &[f32], sample_rate: u32, channels: u16) -> Result<Vec<u8>> {
    if sample_rate == 0 || channels == 0 {
        return Err(RagChatError::AudioProcessing(format!(
            "Invalid WAV format: {} Hz, {} channels",
            sample_rate, channels
        )));
    }

    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    let mut writer = WavWriter::new(&mut cursor, spec)
        .map_err(|e| RagChatError::AudioProcessing(format!("Failed to create WAV writer: {}", e)))?;

    for &sample in samples {
        let sample_i16 = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer
            .write_sample(sample_i16)
            .map_err(|e| RagChatError::AudioProcessing(format!("Failed to write sample: {}", e)))?;
    }

    writer
        .finalize()
        .map_err(|e| RagChatError::AudioProcessing(format!("Failed to finalize WAV data: {}", e)))?;

    let bytes = cursor.into_inner();
    debug!("Encoded {} samples into {} WAV bytes", samples.len(), bytes.len());
    Ok(bytes)
}

/// Decode an in-memory WAV file
pub fn decode_wav(bytes: &[u8]) -> Result<AudioClip> {
    let mut reader = WavReader::new(Cursor::new(bytes))
        .map_err(|e| RagChatError::AudioProcessing(format!("Failed to open WAV data: {}", e)))?;

    let spec = reader.spec();

    let samples: Result<Vec<f32>> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, _) => reader
            .samples::<f32>()
            .map(|s| s.map_err(|e| RagChatError::AudioProcessing(format!("Failed to read sample: {}", e))))
            .collect(),
        (SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|s| {
                s.map(|sample| sample as f32 / i16::MAX as f32)
                    .map_err(|e| RagChatError::AudioProcessing(format!("Failed to read sample: {}", e)))
            })
            .collect(),
        (SampleFormat::Int, bits) => {
            return Err(RagChatError::AudioProcessing(format!(
                "Unsupported bit depth: {}",
                bits
            )));
        }
    };

    Ok(AudioClip::new(samples?, spec.sample_rate, spec.channels))
}
