//! The engine façade.
//!
//! `CacheState` owns one base [`Storage`] and one [`SnapshotOverlay`]
//! and routes every call to whichever is active. A single mutex guards
//! all public operations — reads, commits, purge, and the snapshot
//! lifecycle — so each three-index mutation and each routing decision
//! is atomic with respect to every other caller. Commits are applied in
//! lock-acquisition order, which for the single sequencer thread equals
//! consensus-log order.

use bytes::Bytes;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::config::CacheConfig;
use crate::error::{CacheError, CacheResult};
use crate::item::{CacheItem, ITEM_OVERHEAD};
use crate::snapshot::{SnapshotEvent, SnapshotOverlay};
use crate::stats::{CacheStats, StatsSnapshot};
use crate::storage::{CommitCode, SnapshotChunk, Storage};
use crate::utils::now_unix;

#[derive(Debug)]
struct EngineInner {
    /// Storage used during normal operation; frozen while a snapshot
    /// is in progress.
    storage: Storage,

    /// Storage used while a snapshot is in progress; inert otherwise.
    overlay: SnapshotOverlay,

    /// True between `begin_snapshot` and `end_snapshot`.
    snapshot_in_progress: bool,

    /// Result of the most recently attempted commit read or write.
    commit_code: CommitCode,
}

/// The replicated cache engine.
///
/// Created once at startup with a fixed configuration and shared across
/// worker threads and the sequencer thread applying committed log
/// entries. Business failures of commits surface as [`CommitCode`]s,
/// never as errors; only construction and snapshot lifecycle misuse
/// return `Err`.
#[derive(Debug)]
pub struct CacheState {
    inner: Mutex<EngineInner>,
    stats: Arc<CacheStats>,
}

impl CacheState {
    /// Create the engine, validating the configuration.
    pub fn new(config: CacheConfig) -> CacheResult<Self> {
        if config.get_purge_interval() <= 0 {
            return Err(CacheError::InvalidConfig(
                "purge_interval must be positive".to_string(),
            ));
        }
        if config.get_cache_size() == 0 {
            return Err(CacheError::InvalidConfig(
                "cache_size must be non-zero".to_string(),
            ));
        }
        let largest =
            ITEM_OVERHEAD + config.get_max_key_size() + config.get_max_item_size();
        if largest > config.get_cache_size() {
            warn!(
                cache_size = config.get_cache_size(),
                largest_item = largest,
                "capacity below the largest admissible item; oversized writes will proceed best-effort"
            );
        }

        let storage = Storage::new(config.clone());
        let stats = storage.stats();
        Ok(Self {
            inner: Mutex::new(EngineInner {
                storage,
                overlay: SnapshotOverlay::new(config),
                snapshot_in_progress: false,
                commit_code: CommitCode::DoneOk,
            }),
            stats,
        })
    }

    /// Read the payload at `key`, returning a cheap shared handle.
    ///
    /// Does not alter the LRU order; expiry is checked against the wall
    /// clock. This is the safe default read path.
    pub fn read(&self, key: &str) -> Option<Bytes> {
        let now = now_unix();
        let inner = self.lock();
        if inner.snapshot_in_progress {
            inner.overlay.read(&inner.storage, key, now)
        } else {
            inner.storage.read(key, now)
        }
    }

    /// Read the payload at `key` and run `then` on it without copying.
    ///
    /// The callback executes while holding the engine lock: it must not
    /// call back into this engine and must not block indefinitely, or
    /// every other caller deadlocks behind it. Prefer [`Self::read`]
    /// unless the copy has been measured to matter.
    pub fn read_with<R>(&self, key: &str, then: impl FnOnce(Option<&[u8]>) -> R) -> R {
        let now = now_unix();
        let inner = self.lock();
        let item = if inner.snapshot_in_progress {
            inner.overlay.get(&inner.storage, key, now)
        } else {
            inner.storage.get(key, now)
        };
        then(item.map(|item| item.data().as_ref()))
    }

    /// Apply a committed read: mark the key as most recently used.
    pub fn commit_read(&self, key: &str, at: i64) -> CommitCode {
        let mut guard = self.lock();
        let inner = &mut *guard;
        let code = if inner.snapshot_in_progress {
            inner.overlay.commit_read(&inner.storage, key, at)
        } else {
            inner.storage.commit_read(key, at)
        };
        inner.commit_code = code;
        code
    }

    /// Apply a committed write.
    pub fn commit_write(&self, key: &str, item: CacheItem, at: i64) -> CommitCode {
        let mut guard = self.lock();
        let inner = &mut *guard;
        let code = if inner.snapshot_in_progress {
            inner.overlay.commit_write(&inner.storage, key, item, at)
        } else {
            inner.storage.commit_write(key, item, at)
        };
        inner.commit_code = code;
        code
    }

    /// Apply a committed purge of expired items. Deferred while a
    /// snapshot is in progress. Returns the number of items removed
    /// (zero when deferred).
    ///
    /// Purge mutates the same indices the read path walks, so it takes
    /// the engine lock like every other operation.
    pub fn commit_purge_expired(&self, at: i64) -> usize {
        let mut guard = self.lock();
        let inner = &mut *guard;
        if inner.snapshot_in_progress {
            inner.overlay.commit_purge(at);
            0
        } else {
            inner.storage.commit_purge(at)
        }
    }

    /// Freeze the base storage and start routing commits to the overlay.
    ///
    /// A second freeze while one is active is rejected; a single
    /// freezer is assumed.
    pub fn begin_snapshot(&self) -> CacheResult<()> {
        let mut inner = self.lock();
        if inner.snapshot_in_progress {
            return Err(CacheError::SnapshotInProgress);
        }
        inner.snapshot_in_progress = true;
        debug!(items = inner.storage.len(), "snapshot started");
        Ok(())
    }

    /// Serialize up to `max_bytes` of the frozen base, starting at item
    /// ordinal `cursor`. See [`Storage::read_snapshot_chunk`] for the
    /// wire layout and cursor semantics.
    pub fn read_snapshot_chunk(&self, max_bytes: usize, cursor: usize) -> SnapshotChunk {
        let inner = self.lock();
        inner.storage.read_snapshot_chunk(max_bytes, cursor)
    }

    /// End the freeze: replay the overlay's event log onto the base in
    /// recorded order, then clear the overlay and resume normal routing.
    ///
    /// Replaying purges after the reads and writes that preceded them
    /// reproduces the exact effect sequence of a freeze-free history.
    pub fn end_snapshot(&self) -> CacheResult<()> {
        let mut guard = self.lock();
        let inner = &mut *guard;
        if !inner.snapshot_in_progress {
            return Err(CacheError::SnapshotNotActive);
        }

        let events = inner.overlay.take_events();
        let replayed = events.len();
        for event in events {
            match event {
                SnapshotEvent::Read { key, at } => {
                    inner.storage.commit_read(&key, at);
                }
                SnapshotEvent::Write { key, item, at } => {
                    inner.storage.commit_write(&key, item, at);
                }
                SnapshotEvent::Purge { at } => {
                    inner.storage.commit_purge(at);
                }
            }
        }

        inner.overlay.clear();
        inner.snapshot_in_progress = false;
        self.stats.record_snapshot();
        debug!(replayed, "snapshot ended");
        Ok(())
    }

    /// Merge a snapshot chunk received from a leader into the base
    /// storage, for follower catch-up.
    pub fn install_snapshot_chunk(&self, chunk: &[u8]) -> CacheResult<usize> {
        let mut inner = self.lock();
        inner.storage.install_snapshot_chunk(chunk)
    }

    /// Result of the most recently attempted commit read or write, for
    /// call sites that only kept the boolean outcome.
    pub fn get_commit_code(&self) -> CommitCode {
        self.lock().commit_code
    }

    /// Whether a snapshot is currently in progress.
    pub fn snapshot_in_progress(&self) -> bool {
        self.lock().snapshot_in_progress
    }

    /// Accounted bytes currently held by the base storage.
    pub fn used_memory(&self) -> usize {
        self.lock().storage.used_memory()
    }

    /// Number of items in the base storage.
    pub fn len(&self) -> usize {
        self.lock().storage.len()
    }

    /// Whether the base storage is empty.
    pub fn is_empty(&self) -> bool {
        self.lock().storage.is_empty()
    }

    /// Reset the engine to empty. Used before installing a snapshot.
    pub fn clear(&self) {
        let mut guard = self.lock();
        let inner = &mut *guard;
        inner.storage.clear();
        inner.overlay.clear();
        inner.snapshot_in_progress = false;
    }

    /// A point-in-time snapshot of the operation counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Shared handle to the operation counters.
    pub fn stats_ref(&self) -> Arc<CacheStats> {
        Arc::clone(&self.stats)
    }

    // recover the guard if a previous holder panicked
    fn lock(&self) -> MutexGuard<'_, EngineInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
