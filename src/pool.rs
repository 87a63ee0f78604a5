//! Sharded ID allocator built on top of [`Ring`].
//!
//! A four-tier allocator: a per-user cache ring (fast path), a shared free
//! list and monotonic cursor guarded by one mutex (refill), a retry of the
//! fast path, and single-step cross-user stealing as a last resort.

use crate::config::PoolConfig;
use crate::error::PoolError;
use crate::invariants::{debug_assert_cursor_bounded, debug_assert_in_range};
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::ring::Ring;
use std::sync::Mutex;

/// State mutated only while holding [`IdPool`]'s mutex: the shared free
/// list and the monotonic high-water-mark cursor.
struct Shared {
    free_ids: Vec<u32>,
    next_id: u32,
}

/// A sharded pool of unique `u32` IDs drawn from `[base, base + n_ids)`.
///
/// Each user index gets a private fast-path cache (a [`Ring`]); any thread
/// may legally call [`IdPool::new_id`] or [`IdPool::free_id`] with any
/// `uid` — the cache array is owned by the pool, not by the calling
/// threads, and `uid` is reduced modulo the configured number of users.
pub struct IdPool {
    base: u32,
    n_ids: u32,
    caches: Vec<Ring>,
    shared: Mutex<Shared>,
    metrics: Metrics,
    enable_metrics: bool,
}

impl IdPool {
    /// Creates a pool of `nb_user` per-user caches handing out IDs from
    /// `[base, base + n_ids)`, using the spec-mandated cache capacity
    /// (`C = 32`).
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::NbUserZero`] if `nb_user == 0`, or
    /// [`PoolError::RangeOverflow`] if `base + n_ids` would overflow `u32`.
    pub fn create(nb_user: usize, base: u32, n_ids: u32) -> Result<Self, PoolError> {
        Self::with_config(PoolConfig::new(nb_user, base, n_ids))
    }

    /// Creates a pool from an explicit [`PoolConfig`].
    ///
    /// # Errors
    ///
    /// Same as [`IdPool::create`].
    pub fn with_config(config: PoolConfig) -> Result<Self, PoolError> {
        if config.nb_user == 0 {
            return Err(PoolError::NbUserZero);
        }
        if config.base.checked_add(config.n_ids).is_none() {
            return Err(PoolError::RangeOverflow {
                base: config.base,
                n_ids: config.n_ids,
            });
        }

        let cache_capacity = config.cache_capacity();
        let caches = (0..config.nb_user)
            .map(|_| {
                Ring::new(cache_capacity)
                    .expect("cache capacity derived from PoolConfig is always a valid power of two > 2")
            })
            .collect();

        Ok(Self {
            base: config.base,
            n_ids: config.n_ids,
            caches,
            shared: Mutex::new(Shared {
                free_ids: Vec::new(),
                next_id: config.base,
            }),
            metrics: Metrics::new(),
            enable_metrics: config.enable_metrics,
        })
    }

    /// Number of per-user cache shards.
    #[inline]
    pub fn nb_user(&self) -> usize {
        self.caches.len()
    }

    /// Start of the half-open ID range this pool allocates from.
    #[inline]
    pub fn base(&self) -> u32 {
        self.base
    }

    /// Width of the ID range this pool allocates from.
    #[inline]
    pub fn n_ids(&self) -> u32 {
        self.n_ids
    }

    #[inline]
    fn shard(&self, uid: usize) -> usize {
        uid % self.caches.len()
    }

    #[inline]
    fn in_range(&self, id: u32) -> bool {
        id >= self.base && id < self.base.wrapping_add(self.n_ids)
    }

    /// Returns an unused ID, or `None` if the pool is exhausted (or, under
    /// the mutex-free stealing design, transiently unreachable: a peer's
    /// live id can be mid-flight between its cache and the shared free
    /// list at the moment of the steal scan).
    ///
    /// `uid` may be any non-negative index; it is reduced modulo the
    /// number of configured users.
    pub fn new_id(&self, uid: usize) -> Option<u32> {
        let idx = self.shard(uid);

        // 1. Fast path.
        if let Some(id) = self.caches[idx].dequeue() {
            debug_assert_in_range!(id, self.base, self.n_ids);
            if self.enable_metrics {
                self.metrics.record_fast_path_hit();
            }
            return Some(id);
        }

        // 2. Shared refill (slow path).
        {
            let mut shared = self.shared.lock().expect("pool mutex poisoned");
            let cache = &self.caches[idx];

            while !cache.is_full() {
                let Some(id) = shared.free_ids.pop() else {
                    break;
                };
                // The ring is local-capacity bounded; this cannot fail
                // since we just checked `is_full()` under the same lock
                // that serializes all refills for this cache.
                let enqueued = cache.enqueue(id);
                debug_assert!(enqueued, "refill enqueue into non-full cache cannot fail");
            }

            while !cache.is_full() && shared.next_id < self.base.wrapping_add(self.n_ids) {
                let id = shared.next_id;
                let enqueued = cache.enqueue(id);
                debug_assert!(enqueued, "refill enqueue into non-full cache cannot fail");
                shared.next_id = shared.next_id.wrapping_add(1);
                debug_assert_cursor_bounded!(shared.next_id, self.base, self.n_ids);
            }

            if self.enable_metrics {
                self.metrics.record_refill();
            }
        }

        // 3. Retry fast path.
        if let Some(id) = self.caches[idx].dequeue() {
            debug_assert_in_range!(id, self.base, self.n_ids);
            return Some(id);
        }

        // 4. Steal path: one non-blocking dequeue per peer.
        for i in 0..self.caches.len() {
            if i == idx {
                continue;
            }
            if let Some(id) = self.caches[i].dequeue() {
                debug_assert_in_range!(id, self.base, self.n_ids);
                if self.enable_metrics {
                    self.metrics.record_steal();
                }
                return Some(id);
            }
        }

        if self.enable_metrics {
            self.metrics.record_exhausted();
        }
        None
    }

    /// Returns `id` to the pool. A no-op if `id` lies outside
    /// `[base, base + n_ids)`.
    ///
    /// Freeing an ID that was never issued, or double-freeing an issued
    /// ID, breaks uniqueness of future allocations and is a caller bug;
    /// the pool does not detect it.
    pub fn free_id(&self, uid: usize, id: u32) {
        if !self.in_range(id) {
            return;
        }

        let idx = self.shard(uid);
        let cache = &self.caches[idx];

        if cache.enqueue(id) {
            if self.enable_metrics {
                self.metrics.record_free();
            }
            return;
        }

        // Flush path: drain the full local cache plus the newly freed ID
        // into the shared free list under one critical section.
        let mut drained = Vec::with_capacity(cache.capacity() + 1);
        while let Some(drained_id) = cache.dequeue() {
            drained.push(drained_id);
        }
        drained.push(id);

        let mut shared = self.shared.lock().expect("pool mutex poisoned");
        shared.free_ids.extend(drained);

        if self.enable_metrics {
            self.metrics.record_free();
        }
    }

    /// Returns a snapshot of allocation/free/steal counters. Always
    /// zeroed if the pool was created with metrics disabled.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Single-thread exhaustion: every id in the range gets issued exactly
    /// once, then the pool reports `None`.
    #[test]
    fn single_thread_exhaustion() {
        let pool = IdPool::create(1, 100, 3).unwrap();

        let mut seen = Vec::new();
        for _ in 0..3 {
            let id = pool.new_id(0).expect("pool not yet exhausted");
            assert!((100..103).contains(&id));
            seen.push(id);
        }
        seen.sort_unstable();
        assert_eq!(seen, vec![100, 101, 102]);

        assert_eq!(pool.new_id(0), None);
    }

    /// An id freed after exhaustion becomes allocatable again.
    #[test]
    fn free_then_realloc() {
        let pool = IdPool::create(1, 100, 3).unwrap();
        for _ in 0..3 {
            pool.new_id(0).unwrap();
        }
        assert_eq!(pool.new_id(0), None);

        pool.free_id(0, 101);
        assert_eq!(pool.new_id(0), Some(101));
    }

    /// Frees outside `[base, base + n_ids)` are no-ops.
    #[test]
    fn out_of_range_free_is_noop() {
        let pool = IdPool::create(1, 100, 3).unwrap();
        for _ in 0..3 {
            pool.new_id(0).unwrap();
        }

        pool.free_id(0, 99);
        pool.free_id(0, 103);
        assert_eq!(pool.new_id(0), None);
    }

    /// A user whose cache and the shared store are both empty steals from
    /// a peer's cache rather than reporting exhaustion early.
    #[test]
    fn cross_user_stealing() {
        let pool = IdPool::create(2, 0, 1).unwrap();

        assert_eq!(pool.new_id(0), Some(0));
        assert_eq!(pool.new_id(1), None);

        pool.free_id(0, 0);
        assert_eq!(pool.new_id(1), Some(0));
    }

    #[test]
    fn create_rejects_zero_users() {
        assert!(matches!(IdPool::create(0, 0, 10), Err(PoolError::NbUserZero)));
    }

    #[test]
    fn create_rejects_range_overflow() {
        assert!(matches!(
            IdPool::create(1, u32::MAX - 1, 10),
            Err(PoolError::RangeOverflow { .. })
        ));
    }

    #[test]
    fn conservation_after_quiescence() {
        let pool = IdPool::create(4, 0, 200).unwrap();
        let mut issued = Vec::new();
        for uid in 0..4 {
            for _ in 0..20 {
                issued.push(pool.new_id(uid).unwrap());
            }
        }
        for (i, id) in issued.iter().enumerate() {
            pool.free_id(i % 4, *id);
        }

        // All 200 must still be allocatable exactly once more.
        let mut reallocated = Vec::new();
        for uid in 0..4 {
            while let Some(id) = pool.new_id(uid) {
                reallocated.push(id);
            }
        }
        reallocated.sort_unstable();
        reallocated.dedup();
        assert_eq!(reallocated.len(), 200);
    }

    #[test]
    fn uid_is_reduced_modulo_nb_user() {
        let pool = IdPool::create(2, 0, 64).unwrap();
        let a = pool.new_id(0).unwrap();
        let b = pool.new_id(2).unwrap(); // same shard as uid 0
        assert_ne!(a, b);
    }

    /// A cache shrunk well below the id range forces several refill
    /// cycles during allocation and a flush to the shared free list when
    /// frees overflow the cache — both slow paths get exercised.
    #[test]
    fn shrunk_cache_forces_refill_and_flush() {
        let config = PoolConfig::new(1, 0, 20).with_cache_bits(2); // capacity 4
        let pool = IdPool::with_config(config).unwrap();
        assert_eq!(pool.caches[0].capacity(), 4);

        let mut issued = Vec::new();
        while let Some(id) = pool.new_id(0) {
            issued.push(id);
        }
        issued.sort_unstable();
        issued.dedup();
        assert_eq!(issued.len(), 20);

        // Freeing 5 ids back-to-back overflows the 4-slot cache and forces
        // a flush of the cache plus the 5th id into the shared free list.
        for id in &issued[..5] {
            pool.free_id(0, *id);
        }

        let mut reallocated = Vec::new();
        for _ in 0..5 {
            reallocated.push(pool.new_id(0).expect("all 5 freed ids should be allocatable"));
        }
        reallocated.sort_unstable();
        assert_eq!(reallocated, issued[..5]);
        assert_eq!(pool.new_id(0), None);
    }
}
