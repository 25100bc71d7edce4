//! Audio sources feeding the sample queue.
//!
//! Device I/O and decoding sit outside the analysis core: they only see a
//! [`QueueProducer`](crate::transport::QueueProducer) and push one mono f32
//! per sample frame.

mod decode;
mod synthesis;
mod system;

pub use decode::{load_wav_mono, DecodedAudio};
pub use synthesis::{LoopingClip, SampleSource, ToneGenerator};
pub use system::{AudioSource, AudioSystem};
