//! Configuration for the cache engine.
//!
//! This module provides a builder pattern for the engine knobs:
//! capacity, per-item limits, and the purge cycle length.

/// Configuration for creating a new cache engine.
///
/// Use the builder pattern to construct configuration:
///
/// ```
/// use replicated_cache::CacheConfig;
///
/// let config = CacheConfig::new()
///     .cache_size(64 * 1024 * 1024)
///     .max_item_size(1024 * 1024)
///     .max_key_size(256)
///     .purge_interval(30)
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Total bytes of accounted item memory the cache will hold before
    /// evicting least-recently-used entries.
    pub(crate) cache_size: usize,

    /// Maximum payload size for an individual item, in bytes.
    pub(crate) max_item_size: usize,

    /// Maximum key size, in bytes.
    pub(crate) max_key_size: usize,

    /// Length of one purge cycle in seconds. Items are grouped into
    /// expiry buckets rounded up to the next multiple of this interval.
    pub(crate) purge_interval: i64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_size: 64 * 1024 * 1024,
            max_item_size: 1024 * 1024,
            max_key_size: 256,
            purge_interval: 30,
        }
    }
}

impl CacheConfig {
    /// Create a new configuration builder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the total accounted memory the cache may hold.
    ///
    /// For every write to be admissible in isolation, provision at least
    /// `max_item_size + max_key_size` plus the per-item overhead.
    pub fn cache_size(mut self, bytes: usize) -> Self {
        self.cache_size = bytes;
        self
    }

    /// Set the maximum payload size for a single item.
    pub fn max_item_size(mut self, bytes: usize) -> Self {
        self.max_item_size = bytes;
        self
    }

    /// Set the maximum key size.
    pub fn max_key_size(mut self, bytes: usize) -> Self {
        self.max_key_size = bytes;
        self
    }

    /// Set the purge cycle length in seconds.
    pub fn purge_interval(mut self, seconds: i64) -> Self {
        self.purge_interval = seconds;
        self
    }

    /// Build the final configuration.
    ///
    /// Validation happens when the engine is constructed, so a config by
    /// itself can hold any values.
    pub fn build(self) -> Self {
        self
    }

    /// Get the configured capacity in bytes.
    pub fn get_cache_size(&self) -> usize {
        self.cache_size
    }

    /// Get the maximum payload size.
    pub fn get_max_item_size(&self) -> usize {
        self.max_item_size
    }

    /// Get the maximum key size.
    pub fn get_max_key_size(&self) -> usize {
        self.max_key_size
    }

    /// Get the purge cycle length in seconds.
    pub fn get_purge_interval(&self) -> i64 {
        self.purge_interval
    }
}
