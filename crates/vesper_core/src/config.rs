//! # Core Configuration
//!
//! Scene-core tuning knobs, loaded once at startup. Values ship as
//! compiled-in defaults; a TOML file can override any subset:
//!
//! ```toml
//! min_free_ids = 1024
//! initial_pool_size = 128
//! message_capacity = 256
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration for a [`World`](crate::ecs::World) instance.
///
/// These are budgets, not limits to probe at runtime: a world that
/// outgrows them during development should ship with bigger numbers.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Free entity slots outstanding before indices are recycled.
    ///
    /// Once this many destroyed slots exist, `create_entity` reuses the
    /// oldest freed index (bumping its generation) instead of growing
    /// the tables - bounding both table growth and how long a stale
    /// handle can linger before its index is reissued.
    pub min_free_ids: usize,

    /// Initial dense size of a newly created resizable component pool.
    ///
    /// Must not exceed [`min_free_ids`](CoreConfig::min_free_ids).
    pub initial_pool_size: usize,

    /// Messages each bus buffer holds before posts are dropped.
    pub message_capacity: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            min_free_ids: 1024,
            initial_pool_size: 128,
            message_capacity: 256,
        }
    }
}

/// Failure to load a [`CoreConfig`] from disk.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// The config file is not valid TOML.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

impl CoreConfig {
    /// Parses a configuration from TOML text.
    ///
    /// Missing keys fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the text is not valid TOML.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Loads a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Parse`] if its contents are not valid TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml(&std::fs::read_to_string(path)?)
    }
}
