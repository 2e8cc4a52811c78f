//! Cache item: shared payload plus absolute expiry.

use bytes::Bytes;

/// Fixed bookkeeping charge per indexed item, on top of key and payload
/// bytes. Approximates the index structures that hold the entry.
pub const ITEM_OVERHEAD: usize = 48;

/// Memory charged against the configured capacity for one item.
pub fn accounted_size(key: &str, data_len: usize) -> usize {
    ITEM_OVERHEAD + key.len() + data_len
}

/// A single cache item.
///
/// The payload is an immutable, reference-counted byte buffer: a reader
/// holding a handle stays valid across a concurrent replace of the same
/// key, because an update swaps the handle rather than mutating bytes.
/// The canonical key string is owned by the storage index, not the item.
#[derive(Debug, Clone)]
pub struct CacheItem {
    /// Immutable-after-write payload.
    pub(crate) data: Bytes,

    /// Absolute POSIX expiry time in seconds. Set once at write time;
    /// replaced wholesale on update, never mutated in place.
    pub(crate) expires_at: i64,
}

impl CacheItem {
    /// Create an item expiring at the given absolute POSIX time.
    pub fn new(data: impl Into<Bytes>, expires_at: i64) -> Self {
        Self {
            data: data.into(),
            expires_at,
        }
    }

    /// An item whose expiry is not strictly in the future is expired.
    pub fn is_expired(&self, at: i64) -> bool {
        self.expires_at <= at
    }

    /// Get a handle to the payload.
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Absolute expiry time (POSIX seconds).
    pub fn expires_at(&self) -> i64 {
        self.expires_at
    }

    /// Number of bytes this item occupies in a snapshot chunk:
    /// `key_len(8) | key | data_len(8) | data | expires_at(8)`.
    pub fn serialized_size(&self, key: &str) -> usize {
        8 + key.len() + 8 + self.data.len() + 8
    }
}
