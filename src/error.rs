//! Error types for the cache engine.
//!
//! Ordinary business outcomes of commits (not-found, oversize, bad
//! expiry) are [`crate::CommitCode`] values, not errors. `CacheError`
//! covers construction failures, snapshot lifecycle misuse, chunk
//! decoding, and the I/O paths of the binaries.

use thiserror::Error;

/// The main error type for engine and protocol operations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The configuration cannot produce a working engine.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// `begin_snapshot` was called while a snapshot was already active.
    /// A single freezer is assumed; overlapping freezes are rejected
    /// rather than queued.
    #[error("a snapshot is already in progress")]
    SnapshotInProgress,

    /// A snapshot operation was attempted with no active snapshot.
    #[error("no snapshot in progress")]
    SnapshotNotActive,

    /// A received snapshot chunk could not be decoded.
    #[error("corrupt snapshot chunk: {0}")]
    CorruptChunk(String),

    /// The command received was invalid or malformed.
    #[error("invalid command: '{0}'")]
    InvalidCommand(String),

    /// Failed to parse a protocol message.
    #[error("parse error: {0}")]
    Parse(String),

    /// An I/O error occurred (network, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;
