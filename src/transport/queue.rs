//! Wait-free single-producer single-consumer sample queue.
//!
//! The audio callback pushes through a [`QueueProducer`], the analysis thread
//! pops through a [`QueueConsumer`]. Each side keeps its own position locally
//! and only stores it to the shared atomic every `batch` operations, so at
//! audio rates most pushes and pops touch no shared cache line at all.

use crossbeam_utils::CachePadded;
use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Local cursor of one queue side plus its publication batch counter.
///
/// Positions grow monotonically (wrapping on overflow) and are masked only
/// when indexing storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchCursor {
    position: usize,
    pending: usize,
    batch: usize,
}

impl BatchCursor {
    pub fn new(batch: usize) -> Self {
        Self {
            position: 0,
            pending: 0,
            batch,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Step past one item
    pub fn advance(&mut self) {
        self.position = self.position.wrapping_add(1);
        self.pending += 1;
    }

    /// True once `batch` advances have accumulated since the last publish
    pub fn should_publish(&self) -> bool {
        self.pending >= self.batch
    }

    /// Reset the batch counter, returning the position to store
    pub fn mark_published(&mut self) -> usize {
        self.pending = 0;
        self.position
    }
}

struct Shared {
    /// Published read position (stored by consumer)
    read: CachePadded<AtomicUsize>,
    /// Published write position (stored by producer)
    write: CachePadded<AtomicUsize>,
    slots: Box<[UnsafeCell<f32>]>,
    mask: usize,
}

// Slots in [read, write) belong to the consumer, all others to the producer.
// Ownership changes hands only through the release/acquire cursor pair.
unsafe impl Send for Shared {}
unsafe impl Sync for Shared {}

impl Shared {
    fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn published_len(&self) -> usize {
        let write = self.write.load(Ordering::Acquire);
        let read = self.read.load(Ordering::Acquire);
        write.wrapping_sub(read)
    }
}

/// Create a queue holding up to `capacity` samples.
///
/// `capacity` must be a power of two and `batch` in `1..=capacity`; these are
/// checked by [`AnalysisConfig::validate`](crate::params::AnalysisConfig::validate),
/// not here.
pub fn sample_queue(capacity: usize, batch: usize) -> (QueueProducer, QueueConsumer) {
    debug_assert!(capacity.is_power_of_two(), "capacity must be a power of two");
    debug_assert!(batch >= 1 && batch <= capacity, "batch must be in 1..=capacity");

    let slots: Box<[UnsafeCell<f32>]> = (0..capacity).map(|_| UnsafeCell::new(0.0)).collect();
    let shared = Arc::new(Shared {
        read: CachePadded::new(AtomicUsize::new(0)),
        write: CachePadded::new(AtomicUsize::new(0)),
        slots,
        mask: capacity - 1,
    });

    let producer = QueueProducer {
        shared: Arc::clone(&shared),
        cursor: BatchCursor::new(batch),
        cached_read: 0,
    };
    let consumer = QueueConsumer {
        shared,
        cursor: BatchCursor::new(batch),
        cached_write: 0,
    };
    (producer, consumer)
}

/// Writing half of the sample queue. Owned by the audio callback.
pub struct QueueProducer {
    shared: Arc<Shared>,
    cursor: BatchCursor,
    /// Last consumer position seen by this side
    cached_read: usize,
}

impl QueueProducer {
    /// Append a sample. Returns `false` without writing if the queue is full.
    ///
    /// Never blocks, allocates or locks.
    pub fn push(&mut self, sample: f32) -> bool {
        let write = self.cursor.position();

        if write.wrapping_sub(self.cached_read) >= self.shared.capacity() {
            self.cached_read = self.shared.read.load(Ordering::Acquire);
            if write.wrapping_sub(self.cached_read) >= self.shared.capacity() {
                return false;
            }
        }

        // SAFETY: the slot lies outside [read, write) so the consumer cannot
        // be reading it until the next release store of `write`.
        unsafe {
            *self.shared.slots[write & self.shared.mask].get() = sample;
        }
        self.cursor.advance();

        if self.cursor.should_publish() {
            self.publish();
        }
        true
    }

    /// Make every pushed sample visible to the consumer now
    pub fn flush(&mut self) {
        if self.cursor.pending > 0 {
            self.publish();
        }
    }

    /// Approximate number of queued samples, from published cursors only
    pub fn available(&self) -> usize {
        self.shared.published_len()
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity()
    }

    fn publish(&mut self) {
        let position = self.cursor.mark_published();
        self.shared.write.store(position, Ordering::Release);
    }
}

/// Reading half of the sample queue. Owned by the analysis thread.
pub struct QueueConsumer {
    shared: Arc<Shared>,
    cursor: BatchCursor,
    /// Last producer position seen by this side
    cached_write: usize,
}

impl QueueConsumer {
    /// Take the oldest sample, or `None` if nothing is visible yet
    pub fn pop(&mut self) -> Option<f32> {
        let read = self.cursor.position();

        if read == self.cached_write {
            self.cached_write = self.shared.write.load(Ordering::Acquire);
            if read == self.cached_write {
                return None;
            }
        }

        // SAFETY: read < cached_write, so the producer published this slot
        // and will not touch it until the read cursor passes it.
        let sample = unsafe { *self.shared.slots[read & self.shared.mask].get() };
        self.cursor.advance();

        if self.cursor.should_publish() {
            self.publish();
        }
        Some(sample)
    }

    /// Release every popped slot to the producer now
    pub fn flush(&mut self) {
        if self.cursor.pending > 0 {
            self.publish();
        }
    }

    /// Samples this consumer can pop right now.
    ///
    /// Counts from the local read position, so it never includes samples
    /// already popped but not yet published. May undercount by up to one
    /// producer batch.
    pub fn available(&self) -> usize {
        self.shared
            .write
            .load(Ordering::Acquire)
            .wrapping_sub(self.cursor.position())
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity()
    }

    fn publish(&mut self) {
        let position = self.cursor.mark_published();
        self.shared.read.store(position, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_batch_cursor_publishes_every_batch() {
        let mut cursor = BatchCursor::new(3);

        cursor.advance();
        cursor.advance();
        assert!(!cursor.should_publish());

        cursor.advance();
        assert!(cursor.should_publish());
        assert_eq!(cursor.mark_published(), 3);
        assert!(!cursor.should_publish());
        assert_eq!(cursor.position(), 3);
    }

    #[test]
    fn test_batch_cursor_wraps() {
        let mut cursor = BatchCursor {
            position: usize::MAX,
            pending: 0,
            batch: 1,
        };
        cursor.advance();
        assert_eq!(cursor.position(), 0);
        assert!(cursor.should_publish());
    }

    #[test]
    fn test_pop_empty_returns_none() {
        let (_producer, mut consumer) = sample_queue(8, 1);
        assert_eq!(consumer.pop(), None);
        assert_eq!(consumer.available(), 0);
    }

    #[test]
    fn test_capacity_bound() {
        let (mut producer, mut consumer) = sample_queue(8, 4);

        let results: Vec<bool> = (0..9).map(|i| producer.push(i as f32)).collect();
        assert_eq!(results.iter().filter(|ok| !**ok).count(), 1);
        assert!(!results[8]);

        for i in 0..8 {
            assert_eq!(consumer.pop(), Some(i as f32));
        }
        assert_eq!(consumer.pop(), None);
    }

    #[test]
    fn test_batching_delays_visibility() {
        let (mut producer, mut consumer) = sample_queue(16, 4);

        for i in 0..3 {
            assert!(producer.push(i as f32));
        }
        // Three pushes are below the batch, nothing published yet
        assert_eq!(consumer.available(), 0);
        assert_eq!(consumer.pop(), None);

        assert!(producer.push(3.0));
        assert_eq!(consumer.available(), 4);

        assert!(producer.push(4.0));
        producer.flush();
        assert_eq!(consumer.available(), 5);
    }

    #[test]
    fn test_consumer_flush_frees_space() {
        let (mut producer, mut consumer) = sample_queue(4, 4);

        for i in 0..4 {
            assert!(producer.push(i as f32));
        }
        assert_eq!(consumer.pop(), Some(0.0));
        // Read position not yet published, producer still sees a full queue
        assert!(!producer.push(4.0));

        consumer.flush();
        assert!(producer.push(4.0));
    }

    #[test]
    fn test_wraps_around_storage() {
        let (mut producer, mut consumer) = sample_queue(4, 1);

        for round in 0..10 {
            for i in 0..3 {
                assert!(producer.push((round * 3 + i) as f32));
            }
            for i in 0..3 {
                assert_eq!(consumer.pop(), Some((round * 3 + i) as f32));
            }
        }
    }

    #[test]
    fn test_cross_thread_fifo_order() {
        const COUNT: usize = 200_000;
        let (mut producer, mut consumer) = sample_queue(1024, 32);

        let writer = thread::spawn(move || {
            let mut pushed = Vec::with_capacity(COUNT);
            let mut next = 0u32;
            while pushed.len() < COUNT {
                // Drop on full, like the audio callback does
                let sample = (next % (1 << 24)) as f32;
                if producer.push(sample) {
                    pushed.push(sample);
                }
                next = next.wrapping_add(1);
            }
            producer.flush();
            pushed
        });

        let mut popped = Vec::with_capacity(COUNT);
        while popped.len() < COUNT {
            match consumer.pop() {
                Some(sample) => popped.push(sample),
                None => thread::yield_now(),
            }
        }

        let pushed = writer.join().unwrap();
        assert_eq!(popped, pushed);
        assert_eq!(consumer.pop(), None);
    }
}
