//! Triple-slot "latest value wins" handoff between the analysis thread and
//! the renderer.
//!
//! Three slots live in a fixed arena. The producer owns one (write slot), the
//! consumer owns one (read slot) and the third is staged between them. Only
//! slot *indices* are exchanged, under a mutex, so publishing and acquiring
//! cost the same no matter how large a spectrum is.
//!
//! The producer blocks briefly on the mutex in [`WriteSlot::publish`]; the
//! consumer only ever try-locks in [`ReadSlot::acquire_latest`] and keeps
//! its previous frame when the lock is busy or nothing new was staged.

use std::cell::UnsafeCell;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, TryLockError};

const SLOT_COUNT: usize = 3;

const WRITE_SLOT: usize = 0;
const STAGING_SLOT: usize = 1;
const READ_SLOT: usize = 2;

/// Shared three-slot arena
pub struct HandoffBuffer<T> {
    slots: [UnsafeCell<T>; SLOT_COUNT],
    /// Index of the slot currently staged between producer and consumer
    staging: Mutex<usize>,
    /// Set by `publish`, cleared by a successful `acquire_latest`
    fresh: AtomicBool,
    producer_taken: AtomicBool,
    consumer_taken: AtomicBool,
}

// Each slot index is held by exactly one of {write handle, staging, read
// handle} at any time, and indices only move under the `staging` mutex.
unsafe impl<T: Send> Send for HandoffBuffer<T> {}
unsafe impl<T: Send + Sync> Sync for HandoffBuffer<T> {}

impl<T: Clone> HandoffBuffer<T> {
    /// Allocate all three slots up front as copies of `initial`
    pub fn new(initial: T) -> Arc<Self> {
        Arc::new(Self {
            slots: [
                UnsafeCell::new(initial.clone()),
                UnsafeCell::new(initial.clone()),
                UnsafeCell::new(initial),
            ],
            staging: Mutex::new(STAGING_SLOT),
            fresh: AtomicBool::new(false),
            producer_taken: AtomicBool::new(false),
            consumer_taken: AtomicBool::new(false),
        })
    }

    /// Allocate a buffer and take both handles at once
    pub fn split(initial: T) -> (WriteSlot<T>, ReadSlot<T>) {
        let shared = Self::new(initial);
        shared.producer_taken.store(true, Ordering::Relaxed);
        shared.consumer_taken.store(true, Ordering::Relaxed);
        let writer = WriteSlot {
            shared: Arc::clone(&shared),
            index: WRITE_SLOT,
        };
        let reader = ReadSlot {
            shared,
            index: READ_SLOT,
        };
        (writer, reader)
    }
}

impl<T> HandoffBuffer<T> {
    /// Take the producer's write slot. Returns `None` after the first call.
    pub fn producer_buffer(self: &Arc<Self>) -> Option<WriteSlot<T>> {
        if self.producer_taken.swap(true, Ordering::AcqRel) {
            return None;
        }
        Some(WriteSlot {
            shared: Arc::clone(self),
            index: WRITE_SLOT,
        })
    }

    /// Take the consumer's read slot. Returns `None` after the first call.
    pub fn consumer_buffer(self: &Arc<Self>) -> Option<ReadSlot<T>> {
        if self.consumer_taken.swap(true, Ordering::AcqRel) {
            return None;
        }
        Some(ReadSlot {
            shared: Arc::clone(self),
            index: READ_SLOT,
        })
    }

    /// Stage the producer's completed slot and hand it a recycled one.
    ///
    /// Blocks only for the index swap.
    fn publish(&self, slot: &mut WriteSlot<T>) {
        assert!(
            std::ptr::eq(self, Arc::as_ptr(&slot.shared)),
            "write slot belongs to another handoff buffer"
        );

        let mut staging = self.staging.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::swap(&mut *staging, &mut slot.index);
        self.fresh.store(true, Ordering::Release);
    }

    /// Swap in the most recently published slot if one is waiting.
    ///
    /// Returns `false` immediately, leaving `slot` untouched, when the lock is
    /// held by the producer or nothing was published since the last acquire.
    fn acquire_latest(&self, slot: &mut ReadSlot<T>) -> bool {
        assert!(
            std::ptr::eq(self, Arc::as_ptr(&slot.shared)),
            "read slot belongs to another handoff buffer"
        );

        let mut staging = match self.staging.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => return false,
        };
        if !self.fresh.load(Ordering::Acquire) {
            return false;
        }

        std::mem::swap(&mut *staging, &mut slot.index);
        self.fresh.store(false, Ordering::Release);
        true
    }

    /// Lock-free check for a pending publish; may be stale by the time it
    /// returns
    pub fn has_fresh(&self) -> bool {
        self.fresh.load(Ordering::Relaxed)
    }
}

/// Producer-owned slot; derefs to the value being filled
pub struct WriteSlot<T> {
    shared: Arc<HandoffBuffer<T>>,
    index: usize,
}

impl<T> WriteSlot<T> {
    /// Publish this slot through the buffer it came from
    pub fn publish(&mut self) {
        let shared = Arc::clone(&self.shared);
        shared.publish(self);
    }
}

impl<T> Deref for WriteSlot<T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: `index` is exclusively held by this handle until the next
        // swap, which needs `&mut self`.
        unsafe { &*self.shared.slots[self.index].get() }
    }
}

impl<T> DerefMut for WriteSlot<T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: as in `deref`
        unsafe { &mut *self.shared.slots[self.index].get() }
    }
}

/// Consumer-owned slot; derefs to the latest acquired value
pub struct ReadSlot<T> {
    shared: Arc<HandoffBuffer<T>>,
    index: usize,
}

impl<T> ReadSlot<T> {
    /// Acquire through the buffer this slot came from
    pub fn acquire_latest(&mut self) -> bool {
        let shared = Arc::clone(&self.shared);
        shared.acquire_latest(self)
    }
}

impl<T> Deref for ReadSlot<T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: `index` is exclusively held by this handle until the next
        // swap, which needs `&mut self`.
        unsafe { &*self.shared.slots[self.index].get() }
    }
}
