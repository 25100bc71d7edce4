//! Cross-thread transport: the audio-to-analysis sample queue and the
//! analysis-to-renderer spectrum handoff.

mod handoff;
mod queue;

pub use handoff::{HandoffBuffer, ReadSlot, WriteSlot};
pub use queue::{sample_queue, BatchCursor, QueueConsumer, QueueProducer};
