//! Bounded lock-free MPMC ring of `u32` payloads.
//!
//! This is Dmitry Vyukov's ["Bounded MPMC queue"][0] algorithm: a fixed
//! array of slots, each carrying a sequence number that simultaneously
//! encodes whether the slot is empty or full and which logical
//! producer/consumer currently owns it. Unlike `ringmpsc-rs`'s `Ring<T>`
//! (single-producer single-consumer, generic payload, reservation-based
//! batching), this ring supports arbitrarily many concurrent producers
//! *and* consumers and is specialized to `u32` payloads.
//!
//! [0]: http://www.1024cores.net/home/lock-free-algorithms/queues/bounded-mpmc-queue
//!
//! # Memory ordering
//!
//! - The `Acquire` load on a slot's `seq` synchronizes with the `Release`
//!   store that published it (by the previous producer/consumer to touch
//!   that slot).
//! - The `head`/`tail` CAS is `Relaxed`: mutual exclusion over a slot is
//!   established entirely by the `(pos, seq)` protocol, not by the CAS's
//!   ordering.
//! - The payload write/read is a plain (non-atomic) access: exactly one
//!   thread observes the slot in the claimed state at a time.

use crate::error::RingError;
use crate::invariants::{debug_assert_bounded_count, debug_assert_monotonic};
use crossbeam_utils::CachePadded;
use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU32, Ordering};

struct Slot {
    seq: AtomicU32,
    data: UnsafeCell<u32>,
}

/// A bounded, lock-free, multi-producer multi-consumer queue of `u32`.
///
/// Capacity is fixed at construction and must be a power of two strictly
/// greater than 2. `enqueue`/`dequeue` never block: they return `false`/
/// `None` immediately on full/empty.
pub struct Ring {
    head: CachePadded<AtomicU32>,
    tail: CachePadded<AtomicU32>,
    mask: u32,
    slots: Box<[Slot]>,
}

// SAFETY: access to `slots[i].data` is gated by the CAS on `head`/`tail`
// plus the acquire/release protocol on `slots[i].seq`, exactly as for any
// other Vyukov-style MPMC ring. No two threads ever observe the same slot
// in the same generation at the same time.
unsafe impl Send for Ring {}
unsafe impl Sync for Ring {}

impl Ring {
    /// Creates a ring with the given capacity.
    ///
    /// # Errors
    ///
    /// Returns [`RingError::InvalidCapacity`] unless `capacity` is a power
    /// of two strictly greater than 2.
    pub fn new(capacity: usize) -> Result<Self, RingError> {
        if capacity <= 2 || !capacity.is_power_of_two() {
            return Err(RingError::InvalidCapacity { capacity });
        }

        let slots = (0..capacity)
            .map(|i| Slot {
                seq: AtomicU32::new(i as u32),
                data: UnsafeCell::new(0),
            })
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Ok(Self {
            head: CachePadded::new(AtomicU32::new(0)),
            tail: CachePadded::new(AtomicU32::new(0)),
            mask: (capacity - 1) as u32,
            slots,
        })
    }

    /// Returns the ring's fixed capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.mask as usize + 1
    }

    /// Returns an approximate count of live elements.
    ///
    /// Racy under concurrent access (like any MPMC snapshot); useful for
    /// diagnostics and tests, not for correctness decisions.
    #[inline]
    pub fn len(&self) -> usize {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Relaxed);
        head.wrapping_sub(tail) as usize
    }

    /// Returns true if the ring currently holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if the ring currently holds `capacity()` elements.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity()
    }

    /// Attempts to insert `data`. Returns `false` if the ring is full.
    /// Never blocks.
    pub fn enqueue(&self, data: u32) -> bool {
        let mut pos = self.head.load(Ordering::Relaxed);

        loop {
            let slot = &self.slots[(pos & self.mask) as usize];
            let seq = slot.seq.load(Ordering::Acquire);
            let diff = i64::from(seq) - i64::from(pos);

            if diff == 0 {
                match self.head.compare_exchange_weak(
                    pos,
                    pos.wrapping_add(1),
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        debug_assert_monotonic!("head", pos, pos.wrapping_add(1));
                        break;
                    }
                    Err(observed) => pos = observed,
                }
            } else if diff < 0 {
                return false; // full
            } else {
                pos = self.head.load(Ordering::Relaxed);
            }
        }

        let slot = &self.slots[(pos & self.mask) as usize];
        // SAFETY: the successful CAS above proves exclusive ownership of
        // this slot for this generation; no other thread writes `data`
        // until the following release store publishes it.
        unsafe {
            *slot.data.get() = data;
        }
        // `self.head` was already advanced by the CAS above, so `len()`
        // already counts the slot just claimed here.
        debug_assert_bounded_count!(self.len(), self.capacity());
        slot.seq.store(pos.wrapping_add(1), Ordering::Release);
        true
    }

    /// Attempts to remove and return the oldest element. Returns `None`
    /// if the ring is empty. Never blocks.
    pub fn dequeue(&self) -> Option<u32> {
        let mut pos = self.tail.load(Ordering::Relaxed);

        loop {
            let slot = &self.slots[(pos & self.mask) as usize];
            let seq = slot.seq.load(Ordering::Acquire);
            let diff = i64::from(seq) - i64::from(pos.wrapping_add(1));

            if diff == 0 {
                match self.tail.compare_exchange_weak(
                    pos,
                    pos.wrapping_add(1),
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        debug_assert_monotonic!("tail", pos, pos.wrapping_add(1));
                        break;
                    }
                    Err(observed) => pos = observed,
                }
            } else if diff < 0 {
                return None; // empty
            } else {
                pos = self.tail.load(Ordering::Relaxed);
            }
        }

        let slot = &self.slots[(pos & self.mask) as usize];
        // SAFETY: the successful CAS above proves exclusive ownership of
        // this slot; the acquire load of `seq` synchronized with the
        // producer's release store that published `data`.
        let data = unsafe { *slot.data.get() };
        slot.seq
            .store(pos.wrapping_add(self.mask).wrapping_add(1), Ordering::Release);
        Some(data)
    }
}
