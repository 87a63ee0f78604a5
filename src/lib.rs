//! idpool — a scalable 32-bit identifier pool.
//!
//! Two collaborating pieces:
//!
//! - [`Ring`]: a bounded, lock-free multi-producer multi-consumer queue of
//!   `u32` payloads (Dmitry Vyukov's bounded MPMC queue algorithm).
//! - [`IdPool`]: a sharded allocator built on top of [`Ring`] that hands out
//!   and reclaims unique IDs from a half-open range `[base, base + n_ids)`.
//!   Each user thread gets a small local cache ring; a shared, mutex-guarded
//!   free list and monotonic cursor back the caches, and exhausted users may
//!   steal a single ID from a peer's cache.
//!
//! # Example
//!
//! ```
//! use idpool::IdPool;
//!
//! let pool = IdPool::create(4, 100, 1_000).unwrap();
//!
//! let id = pool.new_id(0).expect("pool not exhausted");
//! assert!((100..1_100).contains(&id));
//!
//! pool.free_id(0, id);
//! ```

mod config;
mod error;
mod invariants;
mod metrics;
mod pool;
mod ring;

pub use config::PoolConfig;
pub use error::{PoolError, RingError};
pub use metrics::{Metrics, MetricsSnapshot};
pub use pool::IdPool;
pub use ring::Ring;
