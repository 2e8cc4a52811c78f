//! Snapshot overlay and event log.
//!
//! While a snapshot is streamed out, the base storage must not move: a
//! half-updated index would leak mid-freeze writes into the dump. The
//! overlay owns a secondary index that absorbs every commit issued
//! during the freeze, falling through to the frozen base for reads, and
//! records each operation as an ordered event. Replaying the log onto
//! the base afterwards yields exactly the state a freeze-free history
//! would have produced, deferred purges and evictions included.

use bytes::Bytes;

use crate::config::CacheConfig;
use crate::item::CacheItem;
use crate::storage::{CommitCode, Storage};

/// One operation recorded during a freeze, replayed at `end_snapshot`.
#[derive(Debug, Clone)]
pub enum SnapshotEvent {
    /// A committed read; replay refreshes the LRU position.
    Read { key: String, at: i64 },
    /// A committed write carrying the resulting item.
    Write {
        key: String,
        item: CacheItem,
        at: i64,
    },
    /// A deferred purge; replay sweeps the base at the recorded time.
    Purge { at: i64 },
}

/// Secondary index active while a snapshot is in progress.
///
/// The frozen base is passed by reference per call rather than held as
/// a back-pointer, so the façade can keep both structures side by side.
/// Eviction is disabled for the duration of the freeze.
#[derive(Debug)]
pub struct SnapshotOverlay {
    /// Items touched since the freeze began.
    local: Storage,

    /// Commits to apply to the base once the snapshot completes,
    /// in commit order.
    events: Vec<SnapshotEvent>,
}

impl SnapshotOverlay {
    /// Create an inert overlay sharing the engine configuration.
    pub fn new(config: CacheConfig) -> Self {
        Self {
            local: Storage::new(config),
            events: Vec::new(),
        }
    }

    /// Look an item up locally first, then in the frozen base.
    /// Never mutates the base.
    pub fn get<'a>(&'a self, base: &'a Storage, key: &str, at: i64) -> Option<&'a CacheItem> {
        self.local.get(key, at).or_else(|| base.get(key, at))
    }

    /// Non-mutating read through the overlay.
    pub fn read(&self, base: &Storage, key: &str, at: i64) -> Option<Bytes> {
        self.get(base, key, at).map(|item| item.data().clone())
    }

    /// Record a read of a live item. The base's LRU order is frozen;
    /// the refresh happens at replay.
    pub fn commit_read(&mut self, base: &Storage, key: &str, at: i64) -> CommitCode {
        if self.get(base, key, at).is_none() {
            return CommitCode::NotFound;
        }
        self.events.push(SnapshotEvent::Read {
            key: key.to_string(),
            at,
        });
        CommitCode::DoneOk
    }

    /// Apply a write to the local index only and record it.
    ///
    /// A key living only in the base is shadowed by a fresh local entry;
    /// the base copy stays untouched for the snapshot reader. Admission
    /// checks run as usual, but rejected writes leave no event.
    pub fn commit_write(
        &mut self,
        _base: &Storage,
        key: &str,
        item: CacheItem,
        at: i64,
    ) -> CommitCode {
        if let Err(code) = self.local.admit(key, &item, at) {
            return code;
        }

        if self.local.contains_key(key) {
            self.local.update_item(key, item.clone());
        } else {
            self.local.insert_item(key, item.clone());
        }
        self.events.push(SnapshotEvent::Write {
            key: key.to_string(),
            item,
            at,
        });
        CommitCode::DoneOk
    }

    /// Defer a purge: no index is touched until replay.
    pub fn commit_purge(&mut self, at: i64) {
        self.events.push(SnapshotEvent::Purge { at });
    }

    /// The ordered event log.
    pub fn events(&self) -> &[SnapshotEvent] {
        &self.events
    }

    /// Drain the event log for replay, leaving the overlay empty.
    pub fn take_events(&mut self) -> Vec<SnapshotEvent> {
        std::mem::take(&mut self.events)
    }

    /// Reset the local index and event log, making the overlay inert.
    pub fn clear(&mut self) {
        self.local.clear();
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;

    fn config() -> CacheConfig {
        CacheConfig::new()
            .cache_size(350)
            .max_item_size(90)
            .max_key_size(20)
            .purge_interval(30)
            .build()
    }

    fn base_with(keys: &[(&str, &'static [u8], i64)]) -> Storage {
        let mut base = Storage::new(config());
        for (key, value, expires_at) in keys {
            base.commit_write(key, CacheItem::new(*value, *expires_at), 1000);
        }
        base
    }

    #[test]
    fn test_read_falls_through_to_base() {
        let base = base_with(&[("key1", b"frozen", 9999)]);
        let overlay = SnapshotOverlay::new(config());

        assert_eq!(
            overlay.read(&base, "key1", 1000),
            Some(Bytes::from_static(b"frozen"))
        );
        assert_eq!(overlay.read(&base, "missing", 1000), None);
    }

    #[test]
    fn test_local_write_shadows_base() {
        let base = base_with(&[("key1", b"frozen", 9999)]);
        let mut overlay = SnapshotOverlay::new(config());

        let code = overlay.commit_write(&base, "key1", CacheItem::new(&b"fresh"[..], 9999), 1001);
        assert!(code.is_ok());

        assert_eq!(
            overlay.read(&base, "key1", 1001),
            Some(Bytes::from_static(b"fresh"))
        );
        // the base copy is untouched
        assert_eq!(base.read("key1", 1001), Some(Bytes::from_static(b"frozen")));
    }

    #[test]
    fn test_rejected_write_leaves_no_event() {
        let base = base_with(&[]);
        let mut overlay = SnapshotOverlay::new(config());

        let code = overlay.commit_write(&base, "key1", CacheItem::new(&b"x"[..], 900), 1000);
        assert_eq!(code, CommitCode::WrongExpiry);
        assert!(overlay.events().is_empty());
    }

    #[test]
    fn test_commit_read_records_only_hits() {
        let base = base_with(&[("key1", b"frozen", 9999)]);
        let mut overlay = SnapshotOverlay::new(config());

        assert!(overlay.commit_read(&base, "key1", 1001).is_ok());
        assert_eq!(
            overlay.commit_read(&base, "missing", 1002),
            CommitCode::NotFound
        );
        assert_eq!(overlay.events().len(), 1);
        assert!(matches!(
            overlay.events()[0],
            SnapshotEvent::Read { ref key, at: 1001 } if key == "key1"
        ));
    }

    #[test]
    fn test_purge_is_deferred() {
        let base = base_with(&[("key1", b"frozen", 1100)]);
        let mut overlay = SnapshotOverlay::new(config());

        overlay.commit_purge(99999);

        // still readable during the freeze
        assert!(overlay.read(&base, "key1", 1000).is_some());
        assert!(matches!(overlay.events()[0], SnapshotEvent::Purge { at: 99999 }));
    }

    #[test]
    fn test_events_keep_commit_order() {
        let base = base_with(&[("key1", b"frozen", 9999)]);
        let mut overlay = SnapshotOverlay::new(config());

        overlay.commit_write(&base, "key2", CacheItem::new(&b"a"[..], 9999), 1001);
        overlay.commit_read(&base, "key1", 1002);
        overlay.commit_purge(1003);

        let events = overlay.take_events();
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], SnapshotEvent::Write { .. }));
        assert!(matches!(events[1], SnapshotEvent::Read { .. }));
        assert!(matches!(events[2], SnapshotEvent::Purge { .. }));
        assert!(overlay.events().is_empty());
    }
}
