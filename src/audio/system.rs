//! cpal streams feeding the sample queue.
//!
//! Playback sources (decoded file, test tone) are written to the default
//! output device and every played sample is pushed into the queue from the
//! device callback. Capture reads the default input device instead. The
//! callbacks never lock, allocate or log; a full queue drops the sample.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample, StreamConfig};
use std::path::PathBuf;

use super::decode::load_wav_mono;
use super::synthesis::{LoopingClip, SampleSource, ToneGenerator};
use crate::error::AudioError;
use crate::transport::QueueProducer;

/// Amplitude of the built-in test tone
const TONE_AMPLITUDE: f32 = 0.25;

/// Where samples come from
#[derive(Debug, Clone, PartialEq)]
pub enum AudioSource {
    /// WAV file, looped
    File(PathBuf),
    /// Default capture device
    Input,
    /// Sine tone at the given frequency (Hz)
    Tone(f32),
}

/// Running audio stream that feeds a [`QueueProducer`]
pub struct AudioSystem {
    /// Audio stream (kept alive)
    _stream: cpal::Stream,
    sample_rate_hz: u32,
    description: String,
}

impl AudioSystem {
    /// Open the device for `source` and start streaming into `producer`
    pub fn start(source: &AudioSource, producer: QueueProducer) -> Result<Self, AudioError> {
        match source {
            AudioSource::File(path) => {
                let audio = load_wav_mono(path)?;
                let description = format!(
                    "{} ({:.1}s @ {}Hz)",
                    path.display(),
                    audio.duration_s(),
                    audio.sample_rate_hz
                );
                let clip = LoopingClip::new(audio.samples);
                Self::start_playback(clip, Some(audio.sample_rate_hz), producer, description)
            }
            AudioSource::Tone(frequency_hz) => {
                let frequency_hz = *frequency_hz;
                let description = format!("{:.1}Hz test tone", frequency_hz);
                Self::start_playback_with(None, producer, description, move |rate| {
                    ToneGenerator::new(frequency_hz, rate, TONE_AMPLITUDE)
                })
            }
            AudioSource::Input => Self::start_capture(producer),
        }
    }

    pub fn sample_rate_hz(&self) -> u32 {
        self.sample_rate_hz
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    fn start_playback<S: SampleSource>(
        source: S,
        sample_rate_hz: Option<u32>,
        producer: QueueProducer,
        description: String,
    ) -> Result<Self, AudioError> {
        Self::start_playback_with(sample_rate_hz, producer, description, move |_| source)
    }

    /// Build an output stream; `make_source` receives the final device rate
    fn start_playback_with<S, F>(
        sample_rate_hz: Option<u32>,
        producer: QueueProducer,
        description: String,
        make_source: F,
    ) -> Result<Self, AudioError>
    where
        S: SampleSource,
        F: FnOnce(u32) -> S,
    {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(AudioError::NoDevice("output"))?;
        let default_config = device.default_output_config()?;
        let sample_format = default_config.sample_format();

        let mut config: StreamConfig = default_config.into();
        if let Some(rate) = sample_rate_hz {
            // Play at the file's native rate, no resampling
            config.sample_rate = cpal::SampleRate(rate);
        }
        let rate = config.sample_rate.0;

        log::info!(
            "Audio out: {} @ {}Hz, {} ch, {:?}",
            device.name().unwrap_or_else(|_| "Unknown".to_string()),
            rate,
            config.channels,
            sample_format
        );

        let source = make_source(rate);
        let stream = match sample_format {
            SampleFormat::F32 => build_output::<f32, S>(&device, &config, source, producer)?,
            SampleFormat::I16 => build_output::<i16, S>(&device, &config, source, producer)?,
            SampleFormat::U16 => build_output::<u16, S>(&device, &config, source, producer)?,
            other => return Err(AudioError::SampleFormat(other)),
        };
        stream.play()?;

        Ok(Self {
            _stream: stream,
            sample_rate_hz: rate,
            description,
        })
    }

    fn start_capture(producer: QueueProducer) -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(AudioError::NoDevice("input"))?;
        let default_config = device.default_input_config()?;
        let sample_format = default_config.sample_format();
        let config: StreamConfig = default_config.into();
        let rate = config.sample_rate.0;

        let name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        log::info!(
            "Audio in: {} @ {}Hz, {} ch, {:?}",
            name,
            rate,
            config.channels,
            sample_format
        );

        let stream = match sample_format {
            SampleFormat::F32 => build_input::<f32>(&device, &config, producer)?,
            SampleFormat::I16 => build_input::<i16>(&device, &config, producer)?,
            SampleFormat::U16 => build_input::<u16>(&device, &config, producer)?,
            other => return Err(AudioError::SampleFormat(other)),
        };
        stream.play()?;

        Ok(Self {
            _stream: stream,
            sample_rate_hz: rate,
            description: format!("capture from {}", name),
        })
    }
}

fn build_output<T, S>(
    device: &cpal::Device,
    config: &StreamConfig,
    mut source: S,
    mut producer: QueueProducer,
) -> Result<cpal::Stream, AudioError>
where
    T: SizedSample + FromSample<f32>,
    S: SampleSource,
{
    let channels = config.channels as usize;
    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            for frame in data.chunks_mut(channels) {
                let sample = source.next_sample();
                let value = T::from_sample(sample);
                for out in frame.iter_mut() {
                    *out = value;
                }
                // Full queue: drop, never wait
                let _ = producer.push(sample);
            }
            producer.flush();
        },
        |err| log::error!("Audio output stream error: {}", err),
        None,
    )?;
    Ok(stream)
}

fn build_input<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    mut producer: QueueProducer,
) -> Result<cpal::Stream, AudioError>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let channels = config.channels as usize;
    let stream = device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            for frame in data.chunks(channels) {
                let sum: f32 = frame.iter().map(|&s| f32::from_sample(s)).sum();
                let _ = producer.push(sum / channels as f32);
            }
            producer.flush();
        },
        |err| log::warn!("Audio input stream error: {}", err),
        None,
    )?;
    Ok(stream)
}
