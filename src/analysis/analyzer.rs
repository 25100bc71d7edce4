//! Sliding-window spectrum analyzer.

use rustfft::num_complex::Complex64;

use super::fft::fft_in_place;
use super::scale::DecibelScale;
use super::window::raised_cosine_table;
use crate::params::{AnalysisConfig, StarvationPolicy};
use crate::transport::{QueueConsumer, WriteSlot};

/// Spectrum frame published to the renderer: N/2 values in [0, 1],
/// ascending frequency
pub type Spectrum = Vec<f32>;

/// What one analysis cycle did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// A full hop of new samples was consumed and a spectrum published
    Fresh,
    /// Not enough samples; the unchanged window was re-analyzed and published
    Stale,
    /// Not enough samples; nothing was computed or published
    Skipped,
}

/// Cycle counters, reported when the analysis loop stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalyzerStats {
    pub cycles: u64,
    pub fresh: u64,
    pub stale: u64,
    pub skipped: u64,
}

impl AnalyzerStats {
    fn record(&mut self, outcome: StepOutcome) {
        self.cycles += 1;
        match outcome {
            StepOutcome::Fresh => self.fresh += 1,
            StepOutcome::Stale => self.stale += 1,
            StepOutcome::Skipped => self.skipped += 1,
        }
    }
}

/// Turns the queued sample stream into published spectra, one hop per step
pub struct SpectrumAnalyzer {
    queue: QueueConsumer,
    output: WriteSlot<Spectrum>,

    /// Last N samples, oldest first (imaginary parts always zero)
    history: Vec<Complex64>,
    /// Windowed copy of `history`, transformed in place
    scratch: Vec<Complex64>,
    window: Vec<f64>,

    hop_size: usize,
    scale: DecibelScale,
    starvation: StarvationPolicy,
    stats: AnalyzerStats,
}

impl SpectrumAnalyzer {
    /// Build an analyzer reading from `queue` and publishing into `output`.
    ///
    /// `output` must hold `config.bin_count()` values.
    pub fn new(config: &AnalysisConfig, queue: QueueConsumer, output: WriteSlot<Spectrum>) -> Self {
        debug_assert!(config.fft_size.is_power_of_two());
        debug_assert!(config.hop_size >= 1 && config.hop_size <= config.fft_size);
        debug_assert_eq!(output.len(), config.bin_count());

        log::debug!(
            "Spectrum analyzer: N={} hop={} floor={}dB policy={:?}",
            config.fft_size,
            config.hop_size,
            config.floor_db,
            config.starvation
        );

        let zero = Complex64::new(0.0, 0.0);
        Self {
            queue,
            output,
            history: vec![zero; config.fft_size],
            scratch: vec![zero; config.fft_size],
            window: raised_cosine_table(config.fft_size),
            hop_size: config.hop_size,
            scale: DecibelScale::new(config.floor_db, config.epsilon),
            starvation: config.starvation,
            stats: AnalyzerStats::default(),
        }
    }

    /// Run one analysis cycle
    pub fn step(&mut self) -> StepOutcome {
        let outcome = if self.acquire_samples() {
            StepOutcome::Fresh
        } else {
            match self.starvation {
                StarvationPolicy::Recompute => StepOutcome::Stale,
                StarvationPolicy::Skip => StepOutcome::Skipped,
            }
        };

        if outcome != StepOutcome::Skipped {
            self.apply_window();
            fft_in_place(&mut self.scratch);
            self.scale_spectrum();
            self.output.publish();
        } else {
            log::trace!("Analyzer starved, {} samples queued", self.queue.available());
        }

        self.stats.record(outcome);
        outcome
    }

    pub fn stats(&self) -> AnalyzerStats {
        self.stats
    }

    /// Slide the window by one hop if a full hop is queued
    fn acquire_samples(&mut self) -> bool {
        let hop = self.hop_size;
        if self.queue.available() < hop {
            return false;
        }

        self.history.copy_within(hop.., 0);
        let tail_start = self.history.len() - hop;
        for slot in &mut self.history[tail_start..] {
            // `available` never overcounts for the consumer, so this pop
            // always succeeds
            let sample = self.queue.pop().unwrap_or(0.0);
            *slot = Complex64::new(sample as f64, 0.0);
        }
        true
    }

    fn apply_window(&mut self) {
        for ((out, sample), coeff) in self
            .scratch
            .iter_mut()
            .zip(self.history.iter())
            .zip(self.window.iter())
        {
            *out = *sample * *coeff;
        }
    }

    fn scale_spectrum(&mut self) {
        for (bucket, bin) in self.output.iter_mut().zip(self.scratch.iter()) {
            *bucket = self.scale.normalize(bin.norm_sqr());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::ToneGenerator;
    use crate::transport::{sample_queue, HandoffBuffer, QueueProducer, ReadSlot};

    fn small_config() -> AnalysisConfig {
        AnalysisConfig {
            fft_size: 256,
            hop_size: 64,
            queue_capacity: 1024,
            batch_size: 16,
            ..Default::default()
        }
    }

    fn build(config: &AnalysisConfig) -> (QueueProducer, SpectrumAnalyzer, ReadSlot<Spectrum>) {
        let (producer, consumer) = sample_queue(config.queue_capacity, config.batch_size);
        let handoff = HandoffBuffer::new(vec![0.0; config.bin_count()]);
        let writer = handoff.producer_buffer().unwrap();
        let reader = handoff.consumer_buffer().unwrap();
        (producer, SpectrumAnalyzer::new(config, consumer, writer), reader)
    }

    fn peak_bin(spectrum: &[f32]) -> usize {
        spectrum
            .iter()
            .enumerate()
            .fold((0, f32::MIN), |best, (i, &v)| if v > best.1 { (i, v) } else { best })
            .0
    }

    #[test]
    fn test_starved_recompute_republishes() {
        let config = small_config();
        let (_producer, mut analyzer, mut reader) = build(&config);

        assert_eq!(analyzer.step(), StepOutcome::Stale);
        assert!(reader.acquire_latest());
        // Silence sits on the floor
        assert!(reader.iter().all(|&v| v == 0.0));
        assert_eq!(reader.len(), 128);
    }

    #[test]
    fn test_starved_skip_publishes_nothing() {
        let config = AnalysisConfig {
            starvation: StarvationPolicy::Skip,
            ..small_config()
        };
        let (_producer, mut analyzer, mut reader) = build(&config);

        assert_eq!(analyzer.step(), StepOutcome::Skipped);
        assert!(!reader.acquire_latest());
        assert_eq!(analyzer.stats().skipped, 1);
    }

    #[test]
    fn test_partial_hop_is_not_consumed() {
        let config = small_config();
        let (mut producer, mut analyzer, _reader) = build(&config);

        for _ in 0..48 {
            assert!(producer.push(0.5));
        }
        producer.flush();

        assert_eq!(analyzer.step(), StepOutcome::Stale);
        assert_eq!(analyzer.queue.available(), 48);
    }

    #[test]
    fn test_window_slides_by_hop() {
        let config = small_config();
        let (mut producer, mut analyzer, _reader) = build(&config);

        for i in 0..128 {
            assert!(producer.push(i as f32));
        }
        assert_eq!(analyzer.step(), StepOutcome::Fresh);
        assert_eq!(analyzer.step(), StepOutcome::Fresh);

        let n = config.fft_size;
        // Newest 128 samples at the tail, in order
        for i in 0..128 {
            assert_eq!(analyzer.history[n - 128 + i].re, i as f64);
            assert_eq!(analyzer.history[n - 128 + i].im, 0.0);
        }
        assert!(analyzer.history[..n - 128].iter().all(|c| c.re == 0.0));
    }

    #[test]
    fn test_tone_peaks_at_its_bin() {
        let config = small_config();
        let (mut producer, mut analyzer, mut reader) = build(&config);

        let bin = 20;
        let mut tone = ToneGenerator::for_bin(bin, config.fft_size, 0.02);
        for _ in 0..config.fft_size {
            assert!(producer.push(tone.next_sample()));
        }

        for _ in 0..config.fft_size / config.hop_size {
            assert_eq!(analyzer.step(), StepOutcome::Fresh);
        }
        assert!(reader.acquire_latest());
        assert_eq!(peak_bin(&reader), bin);
        assert_eq!(analyzer.stats().fresh, 4);
    }
}
