//! Spectrum analysis stage.
//!
//! Consumes the sample queue in fixed hops, keeps a sliding window of the last
//! N samples, applies a raised-cosine window and an in-place FFT, maps bin
//! magnitudes to [0, 1] on a dB scale and publishes the result through the
//! handoff buffer.

mod analyzer;
mod driver;
mod fft;
mod scale;
mod window;

pub use analyzer::{AnalyzerStats, Spectrum, SpectrumAnalyzer, StepOutcome};
pub use driver::{AnalysisLoop, CancellationToken};
pub use fft::fft_in_place;
pub use scale::DecibelScale;
pub use window::{raised_cosine, raised_cosine_table};
