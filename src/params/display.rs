//! Terminal display configuration.

use crate::error::ConfigError;

/// Bar display configuration for the terminal renderer
#[derive(Debug, Clone)]
pub struct DisplayConfig {
    /// Number of bars the spectrum is bucketed into
    pub bucket_count: usize,

    /// Redraw rate (frames per second)
    pub fps: u32,

    /// Follow rate of the smoothed bars (1/s)
    pub smoothness: f32,

    /// Follow rate of the smeared bars trailing the smoothed ones (1/s)
    pub smearedness: f32,

    /// Exponent of the bin-to-bar curve; > 1 gives low frequencies more bars
    pub curve_exponent: f32,

    /// First bin included in any bar (skips DC)
    pub min_bin: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            bucket_count: 128,
            fps: 60,
            smoothness: 10.0,
            smearedness: 3.0,
            curve_exponent: 2.5,
            min_bin: 2,
        }
    }
}

impl DisplayConfig {
    /// Seconds between redraws
    pub fn frame_interval_s(&self) -> f32 {
        1.0 / self.fps.max(1) as f32
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bucket_count == 0 {
            return Err(ConfigError::BarCount);
        }
        Ok(())
    }
}
