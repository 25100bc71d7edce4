//! Spectrum analysis configuration.

use crate::error::ConfigError;

/// What the analyzer does when fewer than a hop of samples is queued
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StarvationPolicy {
    /// Re-run the transform on the unchanged window and publish again
    #[default]
    Recompute,
    /// Skip the cycle without transforming or publishing
    Skip,
}

/// FFT analysis and transport configuration
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// FFT frame length N (must be power of 2)
    pub fft_size: usize,

    /// Samples consumed per analysis cycle H (1..=N)
    /// 512 at N = 4096 gives 87.5% window overlap
    pub hop_size: usize,

    /// Sample queue capacity (must be power of 2)
    /// 32768 = ~0.7 s of audio @ 44.1kHz
    pub queue_capacity: usize,

    /// Cursor publication batch size B (operations per atomic store)
    pub batch_size: usize,

    /// Level mapped to 0.0 in the normalized spectrum (dB)
    pub floor_db: f32,

    /// Added to squared magnitudes before log10
    pub epsilon: f64,

    /// Behaviour when the queue holds less than one hop
    pub starvation: StarvationPolicy,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            fft_size: 4096,
            hop_size: 512,
            queue_capacity: 1 << 15,
            batch_size: 128,
            floor_db: -60.0,
            epsilon: 1e-12,
            starvation: StarvationPolicy::Recompute,
        }
    }
}

impl AnalysisConfig {
    /// Number of positive-frequency bins published per spectrum (N/2)
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Center frequency (Hz) of a bin
    pub fn bin_to_hz(&self, bin: usize, sample_rate_hz: u32) -> f32 {
        bin as f32 * sample_rate_hz as f32 / self.fft_size as f32
    }

    /// Convert frequency (Hz) to the nearest FFT bin index
    pub fn hz_to_bin(&self, hz: f32, sample_rate_hz: u32) -> usize {
        (hz * self.fft_size as f32 / sample_rate_hz as f32).round() as usize
    }

    /// Validate configuration (FFT size must be power of 2, etc.)
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fft_size < 2 || !self.fft_size.is_power_of_two() {
            return Err(ConfigError::FftSize(self.fft_size));
        }
        if self.hop_size == 0 || self.hop_size > self.fft_size {
            return Err(ConfigError::HopSize {
                hop_size: self.hop_size,
                fft_size: self.fft_size,
            });
        }
        if !self.queue_capacity.is_power_of_two() || self.queue_capacity < self.hop_size {
            return Err(ConfigError::QueueCapacity {
                capacity: self.queue_capacity,
                hop_size: self.hop_size,
            });
        }
        if self.batch_size == 0 || self.batch_size > self.queue_capacity {
            return Err(ConfigError::BatchSize {
                batch_size: self.batch_size,
                capacity: self.queue_capacity,
            });
        }
        if !(self.floor_db < 0.0) {
            return Err(ConfigError::FloorDb(self.floor_db));
        }
        if !(self.epsilon > 0.0) {
            return Err(ConfigError::Epsilon(self.epsilon));
        }
        Ok(())
    }
}
