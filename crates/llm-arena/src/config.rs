//! Configuration file loading for the arena.
//!
//! Tuning knobs for the tick loop plus the participant roster, loaded
//! from a TOML file. Every field has a default so a missing file yields
//! a usable configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::matchmaker::PairingPolicy;

/// Errors that can occur when loading or parsing configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse the configuration file as valid TOML.
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// A participant to seed into the store on startup.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ParticipantConfig {
    /// Display name.
    pub name: String,
    /// Provider tag, e.g. `openai`.
    pub provider: String,
}

/// Main arena configuration.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ArenaConfig {
    /// Oracle attempts per ply before the side forfeits. Defaults to 3.
    #[serde(default = "default_max_move_attempts")]
    pub max_move_attempts: u32,
    /// Execution timeout for a single oracle call, in milliseconds.
    /// Defaults to 30000.
    #[serde(default = "default_oracle_timeout_ms")]
    pub oracle_timeout_ms: u64,
    /// Base backoff between failed oracle attempts, in milliseconds;
    /// the sleep grows proportionally with the attempt index.
    /// Defaults to 1000.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    /// How many recent move texts to hand the oracle. Defaults to 10.
    #[serde(default = "default_context_moves")]
    pub context_moves: usize,
    /// Matchmaking policy. Defaults to `full-pairing`.
    #[serde(default)]
    pub pairing: PairingPolicy,
    /// Map of participant ids to their seed entries.
    #[serde(default)]
    pub participants: HashMap<String, ParticipantConfig>,
}

fn default_max_move_attempts() -> u32 {
    3
}

fn default_oracle_timeout_ms() -> u64 {
    30_000
}

fn default_retry_backoff_ms() -> u64 {
    1_000
}

fn default_context_moves() -> usize {
    10
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            max_move_attempts: default_max_move_attempts(),
            oracle_timeout_ms: default_oracle_timeout_ms(),
            retry_backoff_ms: default_retry_backoff_ms(),
            context_moves: default_context_moves(),
            pairing: PairingPolicy::default(),
            participants: HashMap::new(),
        }
    }
}

impl ArenaConfig {
    /// Loads the arena configuration from the given path.
    ///
    /// Returns the default configuration if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Oracle call timeout as a [`Duration`].
    #[must_use]
    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_millis(self.oracle_timeout_ms)
    }

    /// Backoff before the given retry attempt (1-based), proportional
    /// to the attempt index.
    #[must_use]
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.retry_backoff_ms * u64::from(attempt))
    }
}
