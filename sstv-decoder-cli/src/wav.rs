//! Synchronous WAV loading for the decoder's input contract: mono, 16-bit
//! signed PCM, 44.1 kHz.

use std::path::Path;

use thiserror::Error;

const EXPECTED_CHANNELS: u16 = 1;
const EXPECTED_BITS_PER_SAMPLE: u16 = 16;
const EXPECTED_SAMPLE_RATE: u32 = 44_100;

#[derive(Debug, Error)]
pub enum WavError {
    #[error("failed to read WAV file: {0}")]
    Hound(#[from] hound::Error),

    #[error("unexpected channel count: got {channels}, expected {expected}")]
    UnexpectedChannelCount { channels: u16, expected: u16 },

    #[error("unexpected bits per sample: got {bits}, expected {expected}")]
    UnexpectedBitsPerSample { bits: u16, expected: u16 },

    #[error("unexpected sample rate: got {rate}, expected {expected}")]
    UnexpectedSampleRate { rate: u32, expected: u32 },

    #[error("unexpected sample format: got {format:?}, expected Int")]
    UnexpectedSampleFormat { format: hound::SampleFormat },
}

/// Reads every sample out of a mono 16-bit 44.1 kHz PCM WAV file.
pub fn read_mono_i16(path: impl AsRef<Path>) -> Result<Vec<i16>, WavError> {
    let reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    check_spec(&spec)?;
    reader
        .into_samples::<i16>()
        .collect::<Result<Vec<i16>, hound::Error>>()
        .map_err(WavError::from)
}

fn check_spec(spec: &hound::WavSpec) -> Result<(), WavError> {
    if spec.channels != EXPECTED_CHANNELS {
        return Err(WavError::UnexpectedChannelCount {
            channels: spec.channels,
            expected: EXPECTED_CHANNELS,
        });
    }
    if spec.bits_per_sample != EXPECTED_BITS_PER_SAMPLE {
        return Err(WavError::UnexpectedBitsPerSample {
            bits: spec.bits_per_sample,
            expected: EXPECTED_BITS_PER_SAMPLE,
        });
    }
    if spec.sample_rate != EXPECTED_SAMPLE_RATE {
        return Err(WavError::UnexpectedSampleRate {
            rate: spec.sample_rate,
            expected: EXPECTED_SAMPLE_RATE,
        });
    }
    if spec.sample_format != hound::SampleFormat::Int {
        return Err(WavError::UnexpectedSampleFormat {
            format: spec.sample_format,
        });
    }
    Ok(())
}
