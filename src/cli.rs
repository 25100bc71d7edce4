//! Command-line argument parsing.

use clap::{ArgGroup, Parser};
use std::path::PathBuf;
use std::time::Duration;

use crate::audio::AudioSource;
use crate::error::ConfigError;
use crate::params::{AnalysisConfig, DisplayConfig, StarvationPolicy};

/// Test tone played when no source is given (Hz)
const DEFAULT_TONE_HZ: f32 = 440.0;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "neonwave")]
#[command(about = "Real-time audio spectrum analyzer", long_about = None)]
#[command(group(ArgGroup::new("source").args(["file", "input", "tone"])))]
pub struct Args {
    /// WAV file to play and analyze (looped)
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Analyze the default capture device instead of playing anything
    #[arg(long)]
    pub input: bool,

    /// Play and analyze a sine tone (default 440 Hz)
    #[arg(long, value_name = "HZ")]
    pub tone: Option<f32>,

    /// FFT frame length (power of two)
    #[arg(long, value_name = "N", default_value_t = 4096)]
    pub fft_size: usize,

    /// Samples consumed per analysis cycle
    #[arg(long, value_name = "SAMPLES", default_value_t = 512)]
    pub hop_size: usize,

    /// Queue operations between cursor publications
    #[arg(long, value_name = "OPS", default_value_t = 128)]
    pub batch_size: usize,

    /// Skip analysis cycles when starved instead of recomputing
    #[arg(long)]
    pub skip_starved: bool,

    /// Display refresh rate
    #[arg(long, default_value_t = 60)]
    pub fps: u32,

    /// Number of spectrum bars
    #[arg(long, value_name = "COUNT", default_value_t = 128)]
    pub bars: usize,

    /// Stop after this many seconds
    #[arg(long, value_name = "SECONDS")]
    pub duration: Option<f32>,

    /// Don't draw the bar display
    #[arg(long)]
    pub quiet: bool,
}

impl Args {
    /// Selected audio source
    pub fn source(&self) -> AudioSource {
        if let Some(path) = &self.file {
            AudioSource::File(path.clone())
        } else if self.input {
            AudioSource::Input
        } else {
            AudioSource::Tone(self.tone.unwrap_or(DEFAULT_TONE_HZ))
        }
    }

    /// Analysis configuration from defaults plus command-line overrides
    pub fn analysis_config(&self) -> AnalysisConfig {
        let starvation = if self.skip_starved {
            StarvationPolicy::Skip
        } else {
            StarvationPolicy::Recompute
        };
        AnalysisConfig {
            fft_size: self.fft_size,
            hop_size: self.hop_size,
            batch_size: self.batch_size,
            starvation,
            ..Default::default()
        }
    }

    /// Run limit from `--duration`, if one was given
    pub fn run_limit(&self) -> Result<Option<Duration>, ConfigError> {
        self.duration
            .map(|seconds| {
                Duration::try_from_secs_f32(seconds).map_err(|_| ConfigError::Duration(seconds))
            })
            .transpose()
    }

    pub fn display_config(&self) -> DisplayConfig {
        DisplayConfig {
            bucket_count: self.bars,
            fps: self.fps,
            ..Default::default()
        }
    }
}
