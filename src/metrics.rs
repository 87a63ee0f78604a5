use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for [`crate::IdPool`] activity.
///
/// Mirrors `ringmpsc_rs::Metrics`'s role: an optional, low-overhead
/// observability surface, not part of the allocator's correctness contract.
#[derive(Debug, Default)]
pub struct Metrics {
    fast_path_hits: AtomicU64,
    refills: AtomicU64,
    steals: AtomicU64,
    exhausted: AtomicU64,
    frees: AtomicU64,
}

impl Metrics {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn record_fast_path_hit(&self) {
        self.fast_path_hits.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_refill(&self) {
        self.refills.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_steal(&self) {
        self.steals.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_exhausted(&self) {
        self.exhausted.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_free(&self) {
        self.frees.fetch_add(1, Ordering::Relaxed);
    }

    /// Takes an atomic-free snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            fast_path_hits: self.fast_path_hits.load(Ordering::Relaxed),
            refills: self.refills.load(Ordering::Relaxed),
            steals: self.steals.load(Ordering::Relaxed),
            exhausted: self.exhausted.load(Ordering::Relaxed),
            frees: self.frees.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of [`Metrics`]'s counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Successful `new_id` calls satisfied by the per-user cache alone.
    pub fast_path_hits: u64,
    /// Times the shared free list/cursor refilled a cache.
    pub refills: u64,
    /// Successful cross-user steals.
    pub steals: u64,
    /// `new_id` calls that returned `None` (pool exhausted or transiently
    /// unreachable).
    pub exhausted: u64,
    /// Successful `free_id` calls.
    pub frees: u64,
}
