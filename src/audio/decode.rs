//! WAV decoding to mono f32.

use hound::{SampleFormat, WavReader};
use std::io::Read;
use std::path::Path;

use crate::error::AudioError;

/// Fully decoded mono clip
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub sample_rate_hz: u32,
}

impl DecodedAudio {
    pub fn duration_s(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate_hz as f32
    }
}

/// Decode a WAV file, averaging all channels down to mono
pub fn load_wav_mono<P: AsRef<Path>>(path: P) -> Result<DecodedAudio, AudioError> {
    let reader = WavReader::open(path)?;
    decode_mono(reader)
}

fn decode_mono<R: Read>(reader: WavReader<R>) -> Result<DecodedAudio, AudioError> {
    let spec = reader.spec();
    let channels = spec.channels as usize;
    if channels == 0 {
        return Err(AudioError::UnsupportedWav("zero channels".to_string()));
    }

    let interleaved: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, 32) => reader.into_samples::<f32>().collect::<Result<_, _>>()?,
        (SampleFormat::Int, bits @ 1..=32) => {
            let scale = 1.0 / (1u64 << (bits - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|sample| sample.map(|s| s as f32 * scale))
                .collect::<Result<_, _>>()?
        }
        (format, bits) => {
            return Err(AudioError::UnsupportedWav(format!(
                "{:?} at {} bits",
                format, bits
            )))
        }
    };

    let samples: Vec<f32> = interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect();

    if samples.is_empty() {
        return Err(AudioError::EmptyWav);
    }

    log::info!(
        "Decoded {} frames ({} ch @ {}Hz) to mono",
        samples.len(),
        channels,
        spec.sample_rate
    );

    Ok(DecodedAudio {
        samples,
        sample_rate_hz: spec.sample_rate,
    })
}
