use thiserror::Error;

/// Errors returned by [`crate::Ring::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RingError {
    /// Capacity must be a power of two strictly greater than 2.
    #[error("ring capacity {capacity} must be a power of two greater than 2")]
    InvalidCapacity {
        /// The rejected capacity.
        capacity: usize,
    },
}

/// Errors returned by [`crate::IdPool::create`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PoolError {
    /// `nb_user` must be at least 1.
    #[error("nb_user must be at least 1")]
    NbUserZero,
    /// `base + n_ids` must not overflow `u32`.
    #[error("range [{base}, {base} + {n_ids}) overflows u32")]
    RangeOverflow {
        /// The requested base of the range.
        base: u32,
        /// The requested width of the range.
        n_ids: u32,
    },
}
