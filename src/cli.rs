//! Command-line interface definitions.
//!
//! This module defines the CLI structure for the cache client using clap.

use clap::{Parser, Subcommand};

/// Replicated cache client.
///
/// A CLI tool for interacting with the cache server.
#[derive(Parser, Debug)]
#[command(name = "cache-client")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Server host to connect to.
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Server port to connect to.
    #[arg(long, default_value_t = 8080)]
    pub port: u16,

    /// The command to execute.
    #[clap(subcommand)]
    pub command: ClientCommand,
}

/// Available client commands.
#[derive(Subcommand, Debug)]
pub enum ClientCommand {
    /// Get a value by key.
    ///
    /// Retrieves the value stored at the given key.
    /// Returns nothing if the key doesn't exist or has expired.
    Get {
        /// The key to look up.
        key: String,
    },

    /// Set a key-value pair.
    ///
    /// Stores the value at the given key for `ttl` seconds. If the key
    /// already exists, its value is updated.
    Set {
        /// The key to store the value under.
        key: String,
        /// The value to store.
        value: String,
        /// Seconds until the value expires.
        #[arg(default_value_t = 300)]
        ttl: i64,
    },

    /// Purge expired items.
    ///
    /// Asks the server to sweep expired items immediately instead of
    /// waiting for the next scheduled purge.
    Purge,

    /// Ping the server.
    ///
    /// Checks if the server is running and responsive.
    Ping,

    /// Get server statistics.
    ///
    /// Shows cache hits, misses, memory usage, and hit rate.
    Stats,
}
