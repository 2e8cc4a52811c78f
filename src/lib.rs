//! # Replicated Cache
//!
//! The state-machine half of a replicated in-memory key/value cache:
//! bounded memory with LRU eviction, TTL expiry via coarse purge
//! buckets, and consistent snapshots that stream out while commits keep
//! flowing.
//!
//! ## Model
//!
//! Mutations arrive as *committed* operations carrying a logical
//! timestamp assigned by whatever ordered log feeds the engine (a
//! consensus log on a replica set, or the server's own clock when run
//! standalone). Applying the same commit sequence to every replica
//! yields the same cache contents, so business failures of commits are
//! reported as [`CommitCode`] values rather than errors and every
//! replica reaches the same verdict deterministically.
//!
//! ## Quick Start
//!
//! ```rust
//! use replicated_cache::{CacheConfig, CacheItem, CacheState};
//!
//! let config = CacheConfig::new()
//!     .cache_size(1024 * 1024)
//!     .purge_interval(30)
//!     .build();
//! let cache = CacheState::new(config).unwrap();
//!
//! // Apply a committed write with timestamp 100, expiring at 500.
//! let code = cache.commit_write("user:123", CacheItem::new(&b"Alice"[..], 500), 100);
//! assert!(code.is_ok());
//!
//! if let Some(value) = cache.read("user:123") {
//!     println!("Found: {:?}", value);
//! }
//! ```
//!
//! ## Snapshots
//!
//! ```rust
//! use replicated_cache::{CacheConfig, CacheItem, CacheState};
//!
//! let cache = CacheState::new(CacheConfig::new().cache_size(1024).build()).unwrap();
//! cache.commit_write("key", CacheItem::new(&b"value"[..], i64::MAX), 1);
//!
//! cache.begin_snapshot().unwrap();
//! let mut cursor = 0;
//! loop {
//!     let chunk = cache.read_snapshot_chunk(4096, cursor);
//!     // ship chunk.data to a follower here
//!     match chunk.next_index {
//!         Some(next) => cursor = next,
//!         None => break,
//!     }
//! }
//! cache.end_snapshot().unwrap();
//! ```
//!
//! Commits issued between `begin_snapshot` and `end_snapshot` land in an
//! overlay and are replayed onto the base afterwards, so the streamed
//! dump is a consistent point-in-time image and no traffic is lost.

pub mod config;
pub mod error;
pub mod item;
pub mod snapshot;
pub mod state;
pub mod stats;
pub mod storage;

pub use config::CacheConfig;
pub use error::{CacheError, CacheResult};
pub use item::{accounted_size, CacheItem, ITEM_OVERHEAD};
pub use snapshot::{SnapshotEvent, SnapshotOverlay};
pub use state::CacheState;
pub use stats::{CacheStats, StatsSnapshot};
pub use storage::{CommitCode, SnapshotChunk, Storage};

// Protocol plumbing for the server/client binaries.
pub mod command;
pub use command::Command;

pub mod utils;
pub use utils::{buffer_to_array, now_unix};

pub mod cli;
pub use cli::{Cli, ClientCommand};
