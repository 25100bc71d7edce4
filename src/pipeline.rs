//! Wiring of queue, analyzer, handoff and analysis thread.
//!
//! ```text
//! audio callback ──push──▶ SampleQueue ──pop──▶ SpectrumAnalyzer
//!                                                    │ publish
//!                     renderer ◀──acquire_latest── HandoffBuffer
//! ```

use std::thread;

use crate::analysis::{AnalysisLoop, AnalyzerStats, CancellationToken, Spectrum, SpectrumAnalyzer};
use crate::error::{ConfigError, PipelineError};
use crate::params::AnalysisConfig;
use crate::transport::{sample_queue, HandoffBuffer, QueueProducer, ReadSlot};

/// Build the three endpoints of the pipeline without starting a thread.
///
/// The caller drives [`SpectrumAnalyzer::step`] itself, which keeps the
/// whole data path deterministic.
pub fn build_stages(
    config: &AnalysisConfig,
) -> Result<(QueueProducer, SpectrumAnalyzer, ReadSlot<Spectrum>), ConfigError> {
    config.validate()?;

    let (producer, consumer) = sample_queue(config.queue_capacity, config.batch_size);
    let (writer, reader) = HandoffBuffer::split(vec![0.0; config.bin_count()]);

    let analyzer = SpectrumAnalyzer::new(config, consumer, writer);
    Ok((producer, analyzer, reader))
}

/// Running pipeline: analysis thread plus the endpoints the caller keeps
pub struct SpectrumPipeline {
    producer: Option<QueueProducer>,
    reader: ReadSlot<Spectrum>,
    analysis: AnalysisLoop,
}

impl SpectrumPipeline {
    /// Validate `config`, build all stages and start the analysis thread
    pub fn start(config: &AnalysisConfig) -> Result<Self, PipelineError> {
        let (producer, analyzer, reader) = build_stages(config)?;
        let analysis = AnalysisLoop::spawn(analyzer, CancellationToken::new())?;

        log::info!(
            "Pipeline started: N={} hop={} queue={} batch={}",
            config.fft_size,
            config.hop_size,
            config.queue_capacity,
            config.batch_size
        );

        Ok(Self {
            producer: Some(producer),
            reader,
            analysis,
        })
    }

    /// Hand the producer endpoint to the audio source. `None` once taken.
    pub fn take_producer(&mut self) -> Option<QueueProducer> {
        self.producer.take()
    }

    /// Renderer endpoint; call `acquire_latest` on it once per frame
    pub fn reader_mut(&mut self) -> &mut ReadSlot<Spectrum> {
        &mut self.reader
    }

    pub fn token(&self) -> &CancellationToken {
        self.analysis.token()
    }

    /// Stop the analysis thread and return its statistics
    pub fn shutdown(self) -> thread::Result<AnalyzerStats> {
        self.analysis.shutdown()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::StepOutcome;
    use crate::audio::ToneGenerator;
    use std::time::{Duration, Instant};

    fn peak_bin(spectrum: &[f32]) -> usize {
        spectrum
            .iter()
            .enumerate()
            .fold((0, f32::MIN), |best, (i, &v)| if v > best.1 { (i, v) } else { best })
            .0
    }

    #[test]
    fn test_build_rejects_invalid_config() {
        let config = AnalysisConfig {
            hop_size: 0,
            ..Default::default()
        };
        assert!(matches!(
            build_stages(&config),
            Err(ConfigError::HopSize { .. })
        ));
    }

    #[test]
    fn test_sine_end_to_end() {
        let config = AnalysisConfig::default();
        let (mut producer, mut analyzer, mut reader) = build_stages(&config).unwrap();

        let bin = 93;
        let mut tone = ToneGenerator::for_bin(bin, config.fft_size, 0.02);
        for _ in 0..config.fft_size {
            assert!(producer.push(tone.next_sample()));
        }
        producer.flush();

        // 8 hops fill the window exactly
        let hops = config.fft_size / config.hop_size;
        for _ in 0..hops {
            assert_eq!(analyzer.step(), StepOutcome::Fresh);
        }
        assert!(reader.acquire_latest());
        assert_eq!(reader.len(), config.bin_count());
        assert_eq!(peak_bin(&reader), bin);
        assert!(reader.iter().all(|&v| (0.0..=1.0).contains(&v)));

        // Starved cycles republish the same window
        assert_eq!(analyzer.step(), StepOutcome::Stale);
        assert!(reader.acquire_latest());
        assert_eq!(peak_bin(&reader), bin);

        // The tone continues; every fresh spectrum still peaks at the bin
        for _ in 0..4 {
            for _ in 0..config.hop_size {
                assert!(producer.push(tone.next_sample()));
            }
            producer.flush();
            assert_eq!(analyzer.step(), StepOutcome::Fresh);
            assert!(reader.acquire_latest());
            assert_eq!(peak_bin(&reader), bin);
        }
    }

    #[test]
    fn test_threaded_pipeline_finds_tone() {
        let config = AnalysisConfig {
            fft_size: 1024,
            hop_size: 256,
            ..Default::default()
        };
        let mut pipeline = SpectrumPipeline::start(&config).unwrap();
        let mut producer = pipeline.take_producer().unwrap();
        assert!(pipeline.take_producer().is_none());

        let bin = 40;
        let mut tone = ToneGenerator::for_bin(bin, config.fft_size, 0.02);
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut found = false;

        while Instant::now() < deadline && !found {
            for _ in 0..config.hop_size {
                // Drop on full, like the audio callback
                let _ = producer.push(tone.next_sample());
            }
            producer.flush();

            let reader = pipeline.reader_mut();
            if reader.acquire_latest() && peak_bin(reader) == bin {
                found = true;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        assert!(found);

        let token = pipeline.token().clone();
        let stats = pipeline.shutdown().unwrap();
        assert!(token.is_cancelled());
        assert!(stats.fresh > 0);
    }
}
