//! Operation counters for the engine.
//!
//! Atomic counters recorded under the engine lock but readable from any
//! thread without taking it.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for engine operations.
///
/// All counters are atomic; use [`CacheStats::snapshot`] for a
/// point-in-time copy with plain values.
#[derive(Debug, Default)]
pub struct CacheStats {
    /// Committed reads that found a live item.
    hits: AtomicU64,

    /// Committed reads of an absent or expired key.
    misses: AtomicU64,

    /// Committed writes that were applied.
    writes: AtomicU64,

    /// Writes rejected at admission (oversize key/payload, bad expiry).
    rejected_writes: AtomicU64,

    /// Entries evicted under capacity pressure.
    evictions: AtomicU64,

    /// Entries removed by a purge sweep.
    expirations: AtomicU64,

    /// Snapshots taken to completion.
    snapshots: AtomicU64,
}

impl CacheStats {
    /// Create a new stats instance with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.rejected_writes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_expiration(&self) {
        self.expirations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_snapshot(&self) {
        self.snapshots.fetch_add(1, Ordering::Relaxed);
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    pub fn rejected_writes(&self) -> u64 {
        self.rejected_writes.load(Ordering::Relaxed)
    }

    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    pub fn expirations(&self) -> u64 {
        self.expirations.load(Ordering::Relaxed)
    }

    pub fn snapshots(&self) -> u64 {
        self.snapshots.load(Ordering::Relaxed)
    }

    /// Hit rate as a percentage of committed reads, 0.0 when idle.
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits();
        let total = hits + self.misses();
        if total == 0 {
            0.0
        } else {
            (hits as f64 / total as f64) * 100.0
        }
    }

    /// Create a snapshot of the current statistics.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            hits: self.hits(),
            misses: self.misses(),
            writes: self.writes(),
            rejected_writes: self.rejected_writes(),
            evictions: self.evictions(),
            expirations: self.expirations(),
            snapshots: self.snapshots(),
            hit_rate: self.hit_rate(),
        }
    }
}

/// A point-in-time snapshot of engine statistics with plain values.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
    pub rejected_writes: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub snapshots: u64,
    pub hit_rate: f64,
}
