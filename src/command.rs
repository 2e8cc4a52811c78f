//! Command types for the cache protocol.
//!
//! This module defines the commands that can be sent to the cache server.

use crate::error::{CacheError, CacheResult};

/// Types of commands supported by the cache server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Get a value by key.
    Get,
    /// Set a key-value pair with a TTL in seconds.
    Set,
    /// Purge expired items now.
    Purge,
    /// Ping the server (health check).
    Ping,
    /// Get server statistics.
    Stats,
    /// Invalid or unknown command.
    Invalid,
}

impl Command {
    /// Parse a command from a string.
    ///
    /// # Arguments
    /// * `s` - The command string (case-insensitive).
    ///
    /// # Returns
    /// The parsed command, or `Command::Invalid` for unknown commands.
    pub fn get(s: &str) -> Command {
        match s.to_lowercase().as_str() {
            "set" => Command::Set,
            "get" => Command::Get,
            "purge" => Command::Purge,
            "ping" => Command::Ping,
            "stats" | "info" => Command::Stats,
            _ => Command::Invalid,
        }
    }

    /// Parse a command from a string, returning an error for invalid commands.
    ///
    /// # Arguments
    /// * `s` - The command string (case-insensitive).
    ///
    /// # Returns
    /// The parsed command, or an error for unknown commands.
    pub fn parse(s: &str) -> CacheResult<Command> {
        let cmd = Self::get(s);
        if cmd == Command::Invalid {
            Err(CacheError::InvalidCommand(s.to_string()))
        } else {
            Ok(cmd)
        }
    }

    /// Get the string representation of this command.
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Get => "get",
            Command::Set => "set",
            Command::Purge => "purge",
            Command::Ping => "ping",
            Command::Stats => "stats",
            Command::Invalid => "invalid",
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
