//! Authoritative cache index.
//!
//! Three structures are kept mutually consistent under every mutation:
//! an `IndexMap` that is both the key lookup authority and the LRU order
//! (front = least recently used, back = most recently used, maintained
//! with `move_index`), an ordered map of purge boundaries to the keys
//! expiring within each purge cycle, and the running `used_memory`
//! accounting that drives eviction.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use indexmap::IndexMap;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use crate::config::CacheConfig;
use crate::error::{CacheError, CacheResult};
use crate::item::{accounted_size, CacheItem};
use crate::stats::CacheStats;

/// Result of a commit-style operation.
///
/// Commits never fail with an error for ordinary business outcomes;
/// callers inspect the code instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitCode {
    /// Operation completed.
    DoneOk,
    /// Key absent or expired at the commit time.
    NotFound,
    /// Key longer than `max_key_size`.
    KeyTooBig,
    /// Payload longer than `max_item_size`.
    DataTooBig,
    /// Item expiry not strictly after the commit time.
    WrongExpiry,
}

impl CommitCode {
    /// Whether the commit applied.
    pub fn is_ok(self) -> bool {
        matches!(self, CommitCode::DoneOk)
    }

    /// Short name used in protocol responses and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            CommitCode::DoneOk => "ok",
            CommitCode::NotFound => "not_found",
            CommitCode::KeyTooBig => "key_too_big",
            CommitCode::DataTooBig => "data_too_big",
            CommitCode::WrongExpiry => "wrong_expiry",
        }
    }
}

impl std::fmt::Display for CommitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One chunk of a streamed snapshot.
///
/// `data` holds whole items back to back in the wire layout
/// `key_len(8) | key | data_len(8) | data | expires_at(8)` (all
/// little-endian), ordered most- to least-recently used. `next_index`
/// is the ordinal of the next unread item, or `None` once the last item
/// has been emitted.
#[derive(Debug, Clone)]
pub struct SnapshotChunk {
    pub data: Bytes,
    pub next_index: Option<usize>,
}

impl SnapshotChunk {
    /// True once every item has been emitted.
    pub fn is_done(&self) -> bool {
        self.next_index.is_none()
    }
}

/// The storage engine behind [`crate::CacheState`].
///
/// Not synchronized by itself; the façade serializes access. Exposed so
/// that overlay replay and tests can drive it directly.
#[derive(Debug)]
pub struct Storage {
    /// Cache settings.
    config: CacheConfig,

    /// Lookup authority and LRU order in one structure.
    /// Front is the eviction end.
    entries: IndexMap<String, CacheItem>,

    /// Purge boundary -> keys expiring at or before that boundary.
    /// Every live item belongs to exactly one bucket.
    expiry_buckets: BTreeMap<i64, HashSet<String>>,

    /// Sum of accounted sizes of all indexed items.
    used_memory: usize,

    /// Operation counters, shared with the façade.
    stats: Arc<CacheStats>,
}

impl Storage {
    /// Create an empty storage with the given configuration.
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            entries: IndexMap::new(),
            expiry_buckets: BTreeMap::new(),
            used_memory: 0,
            stats: Arc::new(CacheStats::new()),
        }
    }

    /// Look a live item up without touching the LRU order.
    pub fn get(&self, key: &str, at: i64) -> Option<&CacheItem> {
        match self.entries.get(key) {
            Some(item) if !item.is_expired(at) => Some(item),
            _ => None,
        }
    }

    /// Non-mutating read: a cheap handle to the payload if the key is
    /// live at `at`. Does not alter the LRU order.
    pub fn read(&self, key: &str, at: i64) -> Option<Bytes> {
        self.get(key, at).map(|item| item.data.clone())
    }

    /// Mark the item as most recently used, pushing everything else one
    /// step closer to eviction.
    pub fn commit_read(&mut self, key: &str, at: i64) -> CommitCode {
        if self.get(key, at).is_none() {
            self.stats.record_miss();
            return CommitCode::NotFound;
        }
        self.mark_recently_used(key);
        self.stats.record_hit();
        CommitCode::DoneOk
    }

    /// Write an item, evicting least-recently-used entries as needed.
    ///
    /// An existing key is updated in place: payload handle and expiry
    /// replaced, entry moved to the most-recently-used position, and
    /// relocated between expiry buckets if its boundary changed.
    pub fn commit_write(&mut self, key: &str, item: CacheItem, at: i64) -> CommitCode {
        if let Err(code) = self.admit(key, &item, at) {
            self.stats.record_rejected();
            return code;
        }

        let required = self.required_memory(key, &item, at);
        self.evict_lru(key, required);

        if self.entries.contains_key(key) {
            self.update_item(key, item);
        } else {
            self.insert_item(key, item);
        }
        self.stats.record_write();
        CommitCode::DoneOk
    }

    /// Remove every item whose purge bucket has fully elapsed relative
    /// to the previous purge cycle. Returns the number of items purged.
    ///
    /// Buckets are processed in ascending boundary order; emptied
    /// buckets are dropped. Grouping by boundary keeps the sweep
    /// proportional to the buckets due rather than the full item count.
    pub fn commit_purge(&mut self, at: i64) -> usize {
        let threshold = self.purge_boundary(at) - self.config.purge_interval;
        let due: Vec<i64> = self
            .expiry_buckets
            .range(..=threshold)
            .map(|(boundary, _)| *boundary)
            .collect();

        let mut purged = 0;
        for boundary in due {
            if let Some(keys) = self.expiry_buckets.remove(&boundary) {
                for key in keys {
                    if let Some((key, item)) = self.entries.shift_remove_entry(&key) {
                        self.used_memory -= accounted_size(&key, item.data.len());
                        self.stats.record_expiration();
                        purged += 1;
                    }
                }
            }
        }
        purged
    }

    /// Evict from the least-recently-used end, skipping `excluding_key`,
    /// until at least `required` bytes fit within the capacity.
    ///
    /// If the index is exhausted first the requirement went unmet; the
    /// caller proceeds best-effort and the cache simply holds less than
    /// it was asked to.
    pub fn evict_lru(&mut self, excluding_key: &str, required: isize) {
        let mut available = self.config.cache_size as isize - self.used_memory as isize;
        if available >= required {
            return;
        }

        let mut index = 0;
        while index < self.entries.len() {
            let key = match self.entries.get_index(index) {
                Some((key, _)) => key.clone(),
                None => break,
            };
            if key == excluding_key {
                index += 1;
                continue;
            }
            if let Some(freed) = self.remove_entry(&key) {
                available += freed as isize;
                self.stats.record_eviction();
            }
            if available >= required {
                return;
            }
        }
    }

    /// Serialize items in MRU-to-LRU order starting at ordinal `cursor`,
    /// appending whole items while the running total stays within
    /// `max_bytes`. An item never spans two chunks; if the next item
    /// alone exceeds the budget the chunk comes back empty with the
    /// cursor unchanged, so callers must budget at least the largest
    /// admissible item's serialized size.
    pub fn read_snapshot_chunk(&self, max_bytes: usize, cursor: usize) -> SnapshotChunk {
        let total = self.entries.len();
        let mut buf = BytesMut::new();
        let mut written = 0;
        let mut index = cursor.min(total);

        while index < total {
            // ordinal 0 is the most recently used item, at the back
            let (key, item) = match self.entries.get_index(total - 1 - index) {
                Some(entry) => entry,
                None => break,
            };
            let size = item.serialized_size(key);
            if written + size > max_bytes {
                return SnapshotChunk {
                    data: buf.freeze(),
                    next_index: Some(index),
                };
            }

            buf.put_u64_le(key.len() as u64);
            buf.put_slice(key.as_bytes());
            buf.put_u64_le(item.data.len() as u64);
            buf.put_slice(&item.data);
            buf.put_i64_le(item.expires_at);

            written += size;
            index += 1;
        }

        SnapshotChunk {
            data: buf.freeze(),
            next_index: None,
        }
    }

    /// Merge a received snapshot chunk, preserving the MRU-to-LRU order
    /// it was serialized in. Returns the number of items installed.
    ///
    /// This is the follower-side inverse of [`Self::read_snapshot_chunk`]
    /// used to rebuild state during catch-up.
    pub fn install_snapshot_chunk(&mut self, chunk: &[u8]) -> CacheResult<usize> {
        let mut buf = chunk;
        let mut installed = 0;

        while buf.has_remaining() {
            let key = String::from_utf8(take_field(&mut buf, "key")?.to_vec())
                .map_err(|_| CacheError::CorruptChunk("key is not valid UTF-8".into()))?;
            let data = take_field(&mut buf, "payload")?;
            if buf.remaining() < 8 {
                return Err(CacheError::CorruptChunk("truncated expiry".into()));
            }
            let expires_at = buf.get_i64_le();

            self.remove_entry(&key);
            self.insert_item(&key, CacheItem { data, expires_at });
            // chunks arrive MRU first, so each installed item slots in
            // at the eviction end, behind everything installed before it
            if let Some(index) = self.entries.get_index_of(&key) {
                self.entries.move_index(index, 0);
            }
            installed += 1;
        }
        Ok(installed)
    }

    /// Reset all indices. Use with caution.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.expiry_buckets.clear();
        self.used_memory = 0;
    }

    /// Number of indexed items.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index holds no items.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of accounted sizes of all indexed items.
    pub fn used_memory(&self) -> usize {
        self.used_memory
    }

    /// Shared handle to the operation counters.
    pub fn stats(&self) -> Arc<CacheStats> {
        Arc::clone(&self.stats)
    }

    // Internal helpers, shared with the snapshot overlay.

    /// Raw key presence, ignoring expiry. Distinguishes "update the
    /// indexed entry" from "insert fresh" when the entry is expired but
    /// not yet purged.
    pub(crate) fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Admission checks for a write: key bound, payload bound, and a
    /// strictly-future expiry relative to the commit time.
    pub(crate) fn admit(&self, key: &str, item: &CacheItem, at: i64) -> Result<(), CommitCode> {
        if key.len() > self.config.max_key_size {
            return Err(CommitCode::KeyTooBig);
        }
        if item.data.len() > self.config.max_item_size {
            return Err(CommitCode::DataTooBig);
        }
        if item.is_expired(at) {
            return Err(CommitCode::WrongExpiry);
        }
        Ok(())
    }

    /// Net memory delta of writing `item` under `key`: the new accounted
    /// size minus the accounted size of a live entry being replaced.
    fn required_memory(&self, key: &str, item: &CacheItem, at: i64) -> isize {
        let new_size = accounted_size(key, item.data.len()) as isize;
        let old_size = self
            .get(key, at)
            .map(|old| accounted_size(key, old.data.len()) as isize)
            .unwrap_or(0);
        new_size - old_size
    }

    pub(crate) fn insert_item(&mut self, key: &str, item: CacheItem) {
        let boundary = self.purge_boundary(item.expires_at);
        self.expiry_buckets
            .entry(boundary)
            .or_default()
            .insert(key.to_string());
        self.used_memory += accounted_size(key, item.data.len());
        // IndexMap appends new keys at the back, the MRU position
        self.entries.insert(key.to_string(), item);
    }

    pub(crate) fn update_item(&mut self, key: &str, item: CacheItem) {
        let (old_expiry, old_len) = match self.entries.get(key) {
            Some(old) => (old.expires_at, old.data.len()),
            None => return self.insert_item(key, item),
        };

        self.used_memory = self.used_memory + accounted_size(key, item.data.len())
            - accounted_size(key, old_len);

        let old_boundary = self.purge_boundary(old_expiry);
        let new_boundary = self.purge_boundary(item.expires_at);
        if old_boundary != new_boundary {
            self.move_bucket(key, old_boundary, new_boundary);
        }

        if let Some(slot) = self.entries.get_mut(key) {
            *slot = item;
        }
        self.mark_recently_used(key);
    }

    /// Remove an entry from all three indices. Returns the freed bytes.
    pub(crate) fn remove_entry(&mut self, key: &str) -> Option<usize> {
        let (key, item) = self.entries.shift_remove_entry(key)?;
        let boundary = self.purge_boundary(item.expires_at);
        if let Some(bucket) = self.expiry_buckets.get_mut(&boundary) {
            bucket.remove(&key);
            if bucket.is_empty() {
                self.expiry_buckets.remove(&boundary);
            }
        }
        let freed = accounted_size(&key, item.data.len());
        self.used_memory -= freed;
        Some(freed)
    }

    fn mark_recently_used(&mut self, key: &str) {
        if let Some(index) = self.entries.get_index_of(key) {
            let back = self.entries.len() - 1;
            self.entries.move_index(index, back);
        }
    }

    fn move_bucket(&mut self, key: &str, from: i64, to: i64) {
        if let Some(bucket) = self.expiry_buckets.get_mut(&from) {
            bucket.remove(key);
            if bucket.is_empty() {
                self.expiry_buckets.remove(&from);
            }
        }
        self.expiry_buckets
            .entry(to)
            .or_default()
            .insert(key.to_string());
    }

    /// Next purge boundary strictly after `t`: an item expiring exactly
    /// on a multiple of the interval lands one full interval later.
    pub(crate) fn purge_boundary(&self, t: i64) -> i64 {
        let interval = self.config.purge_interval;
        // saturates for expiries near i64::MAX
        t.saturating_add(interval - t.rem_euclid(interval))
    }

}

fn take_field(buf: &mut &[u8], what: &str) -> CacheResult<Bytes> {
    if buf.remaining() < 8 {
        return Err(CacheError::CorruptChunk(format!("truncated {what} length")));
    }
    let len = buf.get_u64_le() as usize;
    if buf.remaining() < len {
        return Err(CacheError::CorruptChunk(format!("truncated {what}")));
    }
    Ok(buf.copy_to_bytes(len))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ITEM_OVERHEAD;

    fn test_config() -> CacheConfig {
        CacheConfig::new()
            .cache_size(150)
            .max_item_size(90)
            .max_key_size(20)
            .purge_interval(30)
            .build()
    }

    fn item(len: usize, expires_at: i64) -> CacheItem {
        CacheItem::new(vec![0u8; len], expires_at)
    }

    #[test]
    fn test_get_missing_key() {
        let storage = Storage::new(test_config());
        assert!(storage.get("anotherkey", 1000).is_none());
    }

    #[test]
    fn test_get_live_key() {
        let mut storage = Storage::new(test_config());
        assert!(storage.commit_write("key1", item(20, 1100), 1000).is_ok());

        let found = storage.get("key1", 1000).expect("key1 present");
        assert_eq!(found.data().len(), 20);
        assert_eq!(found.expires_at(), 1100);
    }

    #[test]
    fn test_get_expired_key() {
        let mut storage = Storage::new(test_config());
        storage.commit_write("key1", item(20, 1100), 1000);
        assert!(storage.get("key1", 1100).is_none());
        assert!(storage.get("key1", 1101).is_none());
    }

    #[test]
    fn test_clear_drops_everything() {
        let mut storage = Storage::new(test_config());
        storage.commit_write("key1", item(20, 1100), 1000);
        storage.clear();
        assert!(storage.get("key1", 1000).is_none());
        assert_eq!(storage.used_memory(), 0);
        assert!(storage.is_empty());
    }

    #[test]
    fn test_write_rejects_oversize_key() {
        let mut storage = Storage::new(test_config());
        let long_key = "x".repeat(21);
        let code = storage.commit_write(&long_key, item(10, 1100), 1000);
        assert_eq!(code, CommitCode::KeyTooBig);
        assert_eq!(storage.used_memory(), 0);
    }

    #[test]
    fn test_write_rejects_oversize_payload() {
        let mut storage = Storage::new(test_config());
        let code = storage.commit_write("key1", item(91, 1100), 1000);
        assert_eq!(code, CommitCode::DataTooBig);
        assert_eq!(storage.used_memory(), 0);
    }

    #[test]
    fn test_write_rejects_non_future_expiry() {
        let mut storage = Storage::new(test_config());
        let code = storage.commit_write("key1", item(10, 1000), 1000);
        assert_eq!(code, CommitCode::WrongExpiry);
        let code = storage.commit_write("key1", item(10, 999), 1000);
        assert_eq!(code, CommitCode::WrongExpiry);
        assert!(storage.is_empty());
    }

    #[test]
    fn test_memory_accounting() {
        let mut storage = Storage::new(test_config());
        storage.commit_write("key1", item(20, 1100), 1000);
        assert_eq!(storage.used_memory(), ITEM_OVERHEAD + 4 + 20);
        storage.commit_write("key1", item(10, 1100), 1000);
        assert_eq!(storage.used_memory(), ITEM_OVERHEAD + 4 + 10);
        storage.remove_entry("key1");
        assert_eq!(storage.used_memory(), 0);
    }

    #[test]
    fn test_evict_everything() {
        let mut storage = Storage::new(test_config());
        storage.commit_write("key1", item(20, 1100), 1000);
        storage.commit_write("key2", item(20, 1100), 1000);

        storage.evict_lru("nokey", 99999);
        assert!(storage.get("key1", 1000).is_none());
        assert!(storage.get("key2", 1000).is_none());
        assert_eq!(storage.used_memory(), 0);
    }

    #[test]
    fn test_evict_only_required_memory() {
        let mut storage = Storage::new(test_config());
        storage.commit_write("key1", item(20, 1100), 1000);
        storage.commit_write("key2", item(20, 1100), 1000);

        storage.evict_lru("nokey", 50);
        assert!(storage.get("key1", 1000).is_none());
        assert!(storage.get("key2", 1000).is_some());
    }

    #[test]
    fn test_eviction_picks_by_recency_not_insertion() {
        // 150-byte cache fits two 72-byte items; a third write must
        // evict the least recently touched one
        let mut storage = Storage::new(test_config());
        storage.commit_write("key1", item(20, 1100), 1000);
        storage.commit_write("key2", item(20, 1100), 1001);

        assert!(storage.commit_read("key1", 1002).is_ok());

        storage.commit_write("key3", item(20, 1100), 1003);
        assert!(storage.get("key1", 1003).is_some());
        assert!(storage.get("key2", 1003).is_none());
        assert!(storage.get("key3", 1003).is_some());
    }

    #[test]
    fn test_eviction_never_picks_the_written_key() {
        let config = CacheConfig::new()
            .cache_size(200)
            .max_item_size(90)
            .max_key_size(20)
            .purge_interval(30)
            .build();
        let mut storage = Storage::new(config);
        storage.commit_write("key1", item(20, 1100), 1000);
        storage.commit_write("key2", item(20, 1100), 1001);

        // growing key1 (the LRU entry) must evict key2, not key1 itself
        let code = storage.commit_write("key1", item(80, 1100), 1002);
        assert!(code.is_ok());
        assert!(storage.get("key1", 1002).is_some());
        assert!(storage.get("key2", 1002).is_none());
        assert_eq!(storage.used_memory(), ITEM_OVERHEAD + 4 + 80);
    }

    #[test]
    fn test_update_replaces_payload_and_moves_to_mru() {
        let config = CacheConfig::new()
            .cache_size(300)
            .max_item_size(90)
            .max_key_size(20)
            .purge_interval(30)
            .build();
        let mut storage = Storage::new(config);
        storage.commit_write("key1", item(40, 1100), 1000);
        storage.commit_write("key2", item(40, 1100), 1001);
        storage.commit_write("key3", item(40, 1100), 1002);

        storage.commit_write("key1", CacheItem::new(&b"success"[..], 1100), 1003);
        storage.evict_lru("nokey", 100);

        // key2 was least recently used once key1 was rewritten
        assert_eq!(
            storage.get("key1", 1003).map(|i| i.data().as_ref()),
            Some(&b"success"[..])
        );
        assert!(storage.get("key2", 1003).is_none());
        assert!(storage.get("key3", 1003).is_some());
    }

    #[test]
    fn test_update_to_smaller_item_frees_memory() {
        let config = CacheConfig::new()
            .cache_size(300)
            .max_item_size(90)
            .max_key_size(20)
            .purge_interval(30)
            .build();
        let mut storage = Storage::new(config);
        storage.commit_write("key1", item(40, 1100), 1000);
        storage.commit_write("key2", item(40, 1100), 1001);
        storage.commit_write("key3", item(40, 1100), 1002);

        storage.commit_write("key1", item(1, 1100), 1003);
        storage.evict_lru("nokey", 50);

        // enough room after the shrink, nothing evicted
        assert!(storage.get("key1", 1003).is_some());
        assert!(storage.get("key2", 1003).is_some());
        assert!(storage.get("key3", 1003).is_some());
    }

    #[test]
    fn test_update_relocates_expiry_bucket() {
        let mut storage = Storage::new(test_config());
        storage.commit_write("key1", item(20, 1100), 1000);
        // push the expiry far enough out to land in a later bucket
        storage.commit_write("key1", item(20, 2000), 1000);

        storage.commit_purge(1200);
        assert!(storage.get("key1", 1000).is_some());

        storage.commit_purge(2100);
        assert!(storage.get("key1", 1000).is_none());
    }

    #[test]
    fn test_purge_entire_cache_when_all_expired() {
        let mut storage = Storage::new(test_config());
        storage.commit_write("key1", item(20, 2100), 1000);
        storage.commit_write("key2", item(20, 1100), 1000);

        let purged = storage.commit_purge(99999);
        assert_eq!(purged, 2);
        assert!(storage.is_empty());
        assert_eq!(storage.used_memory(), 0);
    }

    #[test]
    fn test_purge_only_elapsed_buckets() {
        let mut storage = Storage::new(test_config());
        storage.commit_write("key1", item(20, 2100), 1000);
        storage.commit_write("key2", item(20, 1100), 1000);

        let purged = storage.commit_purge(1150);
        assert_eq!(purged, 1);
        assert!(storage.get("key1", 1000).is_some());
        assert!(storage.get("key2", 1000).is_none());
    }

    #[test]
    fn test_purge_boundary_advances_past_exact_multiples() {
        let storage = Storage::new(test_config());
        // interval 30: an expiry exactly on a multiple belongs to the
        // next cycle, not its own
        assert_eq!(storage.purge_boundary(60), 90);
        assert_eq!(storage.purge_boundary(61), 90);
        assert_eq!(storage.purge_boundary(89), 90);
    }

    #[test]
    fn test_purge_spares_item_expiring_on_the_boundary() {
        let mut storage = Storage::new(test_config());
        storage.commit_write("key1", item(20, 60), 10);

        // bucket boundary is 90; at t=60 that cycle has not elapsed
        assert_eq!(storage.commit_purge(60), 0);
        assert_eq!(storage.commit_purge(90), 1);
    }

    #[test]
    fn test_snapshot_chunk_orders_mru_first() {
        let config = CacheConfig::new()
            .cache_size(2000)
            .max_item_size(90)
            .max_key_size(20)
            .purge_interval(30)
            .build();
        let mut storage = Storage::new(config);
        for (i, value) in [b"value1", b"value2", b"value3", b"value4"].iter().enumerate() {
            let key = format!("key{}", i + 1);
            storage.commit_write(&key, CacheItem::new(&value[..], 99999), 1000 + i as i64);
        }

        let chunk = storage.read_snapshot_chunk(9999, 0);
        assert!(chunk.is_done());

        let mut replica = Storage::new(
            CacheConfig::new()
                .cache_size(2000)
                .max_item_size(90)
                .max_key_size(20)
                .purge_interval(30)
                .build(),
        );
        replica.install_snapshot_chunk(&chunk.data).expect("decodes");
        let order: Vec<&String> = replica.entries.keys().collect();
        assert_eq!(order, ["key1", "key2", "key3", "key4"]);
    }

    #[test]
    fn test_snapshot_chunk_respects_byte_budget() {
        let config = CacheConfig::new()
            .cache_size(2000)
            .max_item_size(90)
            .max_key_size(20)
            .purge_interval(30)
            .build();
        let mut storage = Storage::new(config);
        for i in 1..=4 {
            let key = format!("key{i}");
            storage.commit_write(&key, item(6, 99999), 1000 + i);
        }

        // each item serializes to 34 bytes, so 80 holds exactly two
        let first = storage.read_snapshot_chunk(80, 0);
        assert_eq!(first.next_index, Some(2));
        assert_eq!(first.data.len(), 68);

        let second = storage.read_snapshot_chunk(80, 2);
        assert!(second.is_done());
        assert_eq!(second.data.len(), 68);
    }

    #[test]
    fn test_snapshot_chunk_budget_below_one_item() {
        let mut storage = Storage::new(test_config());
        storage.commit_write("key1", item(6, 99999), 1000);

        let chunk = storage.read_snapshot_chunk(10, 0);
        assert!(chunk.data.is_empty());
        assert_eq!(chunk.next_index, Some(0));
    }

    #[test]
    fn test_install_snapshot_chunk_rebuilds_state() {
        let mut storage = Storage::new(test_config());
        storage.commit_write("key1", CacheItem::new(&b"alpha"[..], 2000), 1000);
        storage.commit_write("key2", CacheItem::new(&b"beta"[..], 3000), 1001);

        let chunk = storage.read_snapshot_chunk(9999, 0);
        let mut replica = Storage::new(test_config());
        let installed = replica.install_snapshot_chunk(&chunk.data).expect("decodes");

        assert_eq!(installed, 2);
        assert_eq!(replica.used_memory(), storage.used_memory());
        assert_eq!(
            replica.read("key1", 1000),
            Some(Bytes::from_static(b"alpha"))
        );
        assert_eq!(
            replica.read("key2", 1000),
            Some(Bytes::from_static(b"beta"))
        );
        // purge behaves identically on the replica
        replica.commit_purge(2100);
        assert!(replica.get("key1", 1000).is_none());
        assert!(replica.get("key2", 1000).is_some());
    }

    #[test]
    fn test_install_rejects_truncated_chunk() {
        let mut storage = Storage::new(test_config());
        storage.commit_write("key1", item(6, 2000), 1000);
        let chunk = storage.read_snapshot_chunk(9999, 0);

        let mut replica = Storage::new(test_config());
        let result = replica.install_snapshot_chunk(&chunk.data[..chunk.data.len() - 4]);
        assert!(matches!(result, Err(CacheError::CorruptChunk(_))));
    }
}
