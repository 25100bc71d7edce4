//! Error types for configuration, audio sources and pipeline startup.
//!
//! The transport and analysis core never returns these: full/empty queues and
//! missing fresh spectra are reported as plain booleans.

use thiserror::Error;

/// Invalid analysis configuration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("FFT size must be a power of two >= 2, got {0}")]
    FftSize(usize),

    #[error("hop size must be in 1..={fft_size}, got {hop_size}")]
    HopSize { hop_size: usize, fft_size: usize },

    #[error("queue capacity must be a power of two >= hop size {hop_size}, got {capacity}")]
    QueueCapacity { capacity: usize, hop_size: usize },

    #[error("batch size must be in 1..={capacity}, got {batch_size}")]
    BatchSize { batch_size: usize, capacity: usize },

    #[error("dB floor must be negative, got {0}")]
    FloorDb(f32),

    #[error("epsilon must be positive, got {0}")]
    Epsilon(f64),

    #[error("display needs at least one bar")]
    BarCount,

    #[error("run duration must be a finite, non-negative number of seconds, got {0}")]
    Duration(f32),
}

/// Failures from the audio collaborators feeding the queue
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("unsupported WAV layout: {0}")]
    UnsupportedWav(String),

    #[error("WAV file contains no samples")]
    EmptyWav,

    #[error("no {0} audio device found")]
    NoDevice(&'static str),

    #[error("failed to query device config: {0}")]
    DeviceConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build audio stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("unsupported sample format: {0:?}")]
    SampleFormat(cpal::SampleFormat),
}

/// Failures while starting the analysis pipeline
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to spawn analysis thread: {0}")]
    Spawn(#[from] std::io::Error),
}
