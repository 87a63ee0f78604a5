/// Configuration for [`crate::IdPool::create`].
///
/// `nb_user`, `base` and `n_ids` are validated by `create` itself (they can
/// fail, unlike the rest of this struct); `cache_bits` and `enable_metrics`
/// are pure tuning knobs and always valid.
#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    /// Number of users (and therefore per-user cache rings) to shard across.
    pub nb_user: usize,
    /// Start of the half-open ID range `[base, base + n_ids)`.
    pub base: u32,
    /// Width of the ID range.
    pub n_ids: u32,
    /// Per-user cache ring size as a power of 2. Defaults to `C = 32`;
    /// exposed here as a knob for shrinking a single cache to exercise the
    /// refill/flush paths without shrinking the whole allocator.
    pub cache_bits: u8,
    /// Whether to maintain the allocation/free/steal/refill counters
    /// returned by [`crate::IdPool::metrics`]. Slight overhead when enabled.
    pub enable_metrics: bool,
}

/// Default per-user cache ring capacity.
pub const CACHE_CAPACITY: usize = 32;

impl PoolConfig {
    /// Creates a configuration using the default cache capacity (`C = 32`)
    /// and metrics disabled.
    pub const fn new(nb_user: usize, base: u32, n_ids: u32) -> Self {
        Self {
            nb_user,
            base,
            n_ids,
            cache_bits: CACHE_CAPACITY.trailing_zeros() as u8,
            enable_metrics: false,
        }
    }

    /// Returns the configured per-user cache capacity.
    #[inline]
    pub const fn cache_capacity(&self) -> usize {
        1 << self.cache_bits
    }

    /// Enables metrics collection.
    #[must_use]
    pub const fn with_metrics(mut self, enable: bool) -> Self {
        self.enable_metrics = enable;
        self
    }

    /// Overrides the per-user cache capacity to `1 << bits`.
    #[must_use]
    pub const fn with_cache_bits(mut self, bits: u8) -> Self {
        self.cache_bits = bits;
        self
    }
}
