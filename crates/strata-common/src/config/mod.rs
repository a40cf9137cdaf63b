//! Engine configuration.
//!
//! Configuration can be built in code, or loaded from TOML:
//!
//! ```toml
//! [index]
//! fanout = 128
//! capacity = 64
//!
//! [cursor]
//! optimistic_refresh_retries = 5
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CAPACITY, DEFAULT_FANOUT, DEFAULT_OPTIMISTIC_REFRESH_RETRIES, MAX_NODE_ENTRIES,
    MAX_OPTIMISTIC_REFRESH_RETRIES, MIN_CAPACITY, MIN_FANOUT,
};
use crate::error::{StrataError, StrataResult};

/// Top-level engine configuration.
///
/// # Example
///
/// ```rust
/// use strata_common::config::EngineConfig;
///
/// let config = EngineConfig::default();
/// assert_eq!(config.index.fanout, 64);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    /// Index structure tuning.
    #[serde(default)]
    pub index: IndexConfig,

    /// Cursor protocol tuning.
    #[serde(default)]
    pub cursor: CursorConfig,
}

impl EngineConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the index configuration.
    #[must_use]
    pub fn with_index(mut self, index: IndexConfig) -> Self {
        self.index = index;
        self
    }

    /// Sets the cursor configuration.
    #[must_use]
    pub fn with_cursor(mut self, cursor: CursorConfig) -> Self {
        self.cursor = cursor;
        self
    }

    /// Creates a configuration with tiny nodes, so tests exercise splits.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            index: IndexConfig::for_testing(),
            cursor: CursorConfig::default(),
        }
    }

    /// Validates every section.
    pub fn validate(&self) -> StrataResult<()> {
        self.index.validate()?;
        self.cursor.validate()
    }

    /// Parses and validates a TOML document.
    pub fn from_toml_str(content: &str) -> StrataResult<Self> {
        let config: Self = toml::from_str(content).map_err(|e| StrataError::InvalidConfig {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> StrataResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Saves configuration to a TOML file.
    pub fn save(&self, path: &Path) -> StrataResult<()> {
        let content = self.to_toml()?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Serializes configuration to TOML.
    pub fn to_toml(&self) -> StrataResult<String> {
        toml::to_string_pretty(self).map_err(|e| StrataError::InvalidConfig {
            message: e.to_string(),
        })
    }
}

/// Tuning for the native index B+tree.
///
/// Neither value changes what an index contains, only how it is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Maximum number of children of an internal node.
    #[serde(default = "default_fanout")]
    pub fanout: usize,

    /// Maximum number of entries in a leaf node.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

fn default_fanout() -> usize {
    DEFAULT_FANOUT
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            fanout: DEFAULT_FANOUT,
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl IndexConfig {
    /// Creates an index configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the fanout.
    #[must_use]
    pub fn with_fanout(mut self, fanout: usize) -> Self {
        self.fanout = fanout;
        self
    }

    /// Sets the leaf capacity.
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Smallest legal nodes.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            fanout: MIN_FANOUT,
            capacity: MIN_CAPACITY,
        }
    }

    /// Maximum number of separator keys in an internal node.
    #[must_use]
    pub fn max_internal_keys(&self) -> usize {
        self.fanout - 1
    }

    /// Validates the configuration.
    pub fn validate(&self) -> StrataResult<()> {
        if !(MIN_FANOUT..=MAX_NODE_ENTRIES).contains(&self.fanout) {
            return Err(StrataError::InvalidConfig {
                message: format!(
                    "index.fanout must be between {MIN_FANOUT} and {MAX_NODE_ENTRIES}, got {}",
                    self.fanout
                ),
            });
        }
        if !(MIN_CAPACITY..=MAX_NODE_ENTRIES).contains(&self.capacity) {
            return Err(StrataError::InvalidConfig {
                message: format!(
                    "index.capacity must be between {MIN_CAPACITY} and {MAX_NODE_ENTRIES}, got {}",
                    self.capacity
                ),
            });
        }
        Ok(())
    }
}

/// Tuning for the cursor protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorConfig {
    /// Positional searches attempted by `optimistic_refresh` before failing.
    #[serde(default = "default_optimistic_refresh_retries")]
    pub optimistic_refresh_retries: u32,

    /// Whether closing a cursor releases table versions nobody pins any more.
    #[serde(default = "default_collect_retired_versions")]
    pub collect_retired_versions: bool,
}

fn default_optimistic_refresh_retries() -> u32 {
    DEFAULT_OPTIMISTIC_REFRESH_RETRIES
}

fn default_collect_retired_versions() -> bool {
    true
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            optimistic_refresh_retries: DEFAULT_OPTIMISTIC_REFRESH_RETRIES,
            collect_retired_versions: true,
        }
    }
}

impl CursorConfig {
    /// Sets the optimistic refresh retry bound.
    #[must_use]
    pub fn with_optimistic_refresh_retries(mut self, retries: u32) -> Self {
        self.optimistic_refresh_retries = retries;
        self
    }

    /// Enables or disables collection of retired versions on close.
    #[must_use]
    pub fn with_collect_retired_versions(mut self, enable: bool) -> Self {
        self.collect_retired_versions = enable;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> StrataResult<()> {
        if self.optimistic_refresh_retries == 0
            || self.optimistic_refresh_retries > MAX_OPTIMISTIC_REFRESH_RETRIES
        {
            return Err(StrataError::InvalidConfig {
                message: format!(
                    "cursor.optimistic_refresh_retries must be between 1 and {MAX_OPTIMISTIC_REFRESH_RETRIES}, got {}",
                    self.optimistic_refresh_retries
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.index.fanout, DEFAULT_FANOUT);
        assert_eq!(config.index.capacity, DEFAULT_CAPACITY);
        assert_eq!(config.cursor.optimistic_refresh_retries, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = EngineConfig::new()
            .with_index(IndexConfig::new().with_fanout(8).with_capacity(4))
            .with_cursor(CursorConfig::default().with_optimistic_refresh_retries(7));

        assert_eq!(config.index.fanout, 8);
        assert_eq!(config.index.capacity, 4);
        assert_eq!(config.index.max_internal_keys(), 7);
        assert_eq!(config.cursor.optimistic_refresh_retries, 7);
    }

    #[test]
    fn test_validation() {
        let bad_fanout = IndexConfig::new().with_fanout(2);
        assert_eq!(
            bad_fanout.validate().unwrap_err().code(),
            ErrorCode::InvalidConfig
        );

        let bad_capacity = IndexConfig::new().with_capacity(1);
        assert!(bad_capacity.validate().is_err());

        let bad_retries = CursorConfig::default().with_optimistic_refresh_retries(0);
        assert!(bad_retries.validate().is_err());

        assert!(EngineConfig::for_testing().validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let config = EngineConfig::from_toml_str("[index]\nfanout = 16\n").unwrap();
        assert_eq!(config.index.fanout, 16);
        assert_eq!(config.index.capacity, DEFAULT_CAPACITY);
        assert_eq!(config.cursor, CursorConfig::default());
    }

    #[test]
    fn test_invalid_toml() {
        let err = EngineConfig::from_toml_str("[index]\nfanout = \"wide\"\n").unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidConfig);

        let err = EngineConfig::from_toml_str("[index]\nfanout = 1\n").unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidConfig);
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("strata.toml");

        let config = EngineConfig::new()
            .with_index(IndexConfig::new().with_fanout(32))
            .with_cursor(CursorConfig::default().with_collect_retired_versions(false));
        config.save(&path).unwrap();

        let loaded = EngineConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let err = EngineConfig::from_file(&temp_dir.path().join("absent.toml")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Io);
    }
}
