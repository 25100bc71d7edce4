//! Synthetic and decoded sample sources for the audio callback.

use std::f64::consts::TAU;

/// Anything the output callback can pull mono samples from
pub trait SampleSource: Send + 'static {
    fn next_sample(&mut self) -> f32;
}

/// Pure sine tone
#[derive(Debug, Clone)]
pub struct ToneGenerator {
    phase: f64,
    phase_step: f64,
    amplitude: f32,
}

impl ToneGenerator {
    pub fn new(frequency_hz: f32, sample_rate_hz: u32, amplitude: f32) -> Self {
        Self {
            phase: 0.0,
            phase_step: TAU * frequency_hz as f64 / sample_rate_hz as f64,
            amplitude,
        }
    }

    /// Tone centered exactly on `bin` of an `fft_size`-point transform,
    /// whatever the sample rate
    pub fn for_bin(bin: usize, fft_size: usize, amplitude: f32) -> Self {
        Self {
            phase: 0.0,
            phase_step: TAU * bin as f64 / fft_size as f64,
            amplitude,
        }
    }

    pub fn next_sample(&mut self) -> f32 {
        let value = self.phase.sin() as f32 * self.amplitude;
        self.phase = (self.phase + self.phase_step) % TAU;
        value
    }
}

impl SampleSource for ToneGenerator {
    fn next_sample(&mut self) -> f32 {
        ToneGenerator::next_sample(self)
    }
}

/// Decoded mono clip played on repeat
#[derive(Debug, Clone)]
pub struct LoopingClip {
    samples: Vec<f32>,
    position: usize,
}

impl LoopingClip {
    /// `samples` must not be empty
    pub fn new(samples: Vec<f32>) -> Self {
        debug_assert!(!samples.is_empty());
        Self {
            samples,
            position: 0,
        }
    }
}

impl SampleSource for LoopingClip {
    fn next_sample(&mut self) -> f32 {
        let sample = self.samples[self.position];
        self.position += 1;
        if self.position == self.samples.len() {
            self.position = 0;
        }
        sample
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_tone_period() {
        // 1 kHz at 8 kHz: eight samples per cycle
        let mut tone = ToneGenerator::new(1000.0, 8000, 1.0);
        let cycle: Vec<f32> = (0..8).map(|_| tone.next_sample()).collect();

        assert_abs_diff_eq!(cycle[0], 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(cycle[2], 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(cycle[6], -1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(tone.next_sample(), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_tone_for_bin_matches_frequency() {
        let mut by_bin = ToneGenerator::for_bin(93, 4096, 0.5);
        let mut by_hz = ToneGenerator::new(93.0 * 44100.0 / 4096.0, 44100, 0.5);
        for _ in 0..1000 {
            assert_abs_diff_eq!(by_bin.next_sample(), by_hz.next_sample(), epsilon = 1e-4);
        }
    }

    #[test]
    fn test_clip_loops() {
        let mut clip = LoopingClip::new(vec![1.0, 2.0, 3.0]);
        let played: Vec<f32> = (0..7).map(|_| clip.next_sample()).collect();
        assert_eq!(played, vec![1.0, 2.0, 3.0, 1.0, 2.0, 3.0, 1.0]);
    }
}
