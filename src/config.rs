//! Configuration for the tiered cache.
//!
//! # Example
//!
//! ```
//! use tiered_cache::TieredCacheConfig;
//!
//! // Minimal config (uses defaults)
//! let config = TieredCacheConfig::default();
//! assert_eq!(config.max_mem_bytes, 256 * 1024 * 1024); // 256 MB
//!
//! // Full config
//! let config = TieredCacheConfig {
//!     max_mem_bytes: 64 * 1024 * 1024,
//!     lru_capacity: 1_000,
//!     store_path: "/var/lib/myapp/cache.db".into(),
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::storage::traits::StorageError;

/// Configuration for [`crate::TieredCache`].
///
/// All fields have defaults, so a config file only needs the values it
/// changes.
#[derive(Debug, Clone, Deserialize)]
pub struct TieredCacheConfig {
    /// Memory usage (bytes) above which each `set` demotes one entry
    #[serde(default = "default_max_mem_bytes")]
    pub max_mem_bytes: u64,

    /// Maximum number of keys tracked by the recency index
    #[serde(default = "default_lru_capacity")]
    pub lru_capacity: usize,

    /// SQLite file holding demoted entries
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    /// Connection pool size for the cold tier
    #[serde(default = "default_sqlite_max_connections")]
    pub sqlite_max_connections: u32,

    /// How long a cold-tier statement waits on a locked database
    #[serde(default = "default_sqlite_busy_timeout_ms")]
    pub sqlite_busy_timeout_ms: u64,
}

fn default_max_mem_bytes() -> u64 { 256 * 1024 * 1024 } // 256 MB
fn default_lru_capacity() -> usize { 10_000 }
fn default_store_path() -> PathBuf { PathBuf::from("./tiered_cache.db") }
fn default_sqlite_max_connections() -> u32 { 4 }
fn default_sqlite_busy_timeout_ms() -> u64 { 5_000 }

impl Default for TieredCacheConfig {
    fn default() -> Self {
        Self {
            max_mem_bytes: default_max_mem_bytes(),
            lru_capacity: default_lru_capacity(),
            store_path: default_store_path(),
            sqlite_max_connections: default_sqlite_max_connections(),
            sqlite_busy_timeout_ms: default_sqlite_busy_timeout_ms(),
        }
    }
}

impl TieredCacheConfig {
    /// Reject settings the cache cannot run with.
    pub fn validate(&self) -> Result<(), StorageError> {
        if self.lru_capacity == 0 {
            return Err(StorageError::InvalidConfig(
                "lru_capacity must be at least 1".into(),
            ));
        }
        if self.sqlite_max_connections == 0 {
            return Err(StorageError::InvalidConfig(
                "sqlite_max_connections must be at least 1".into(),
            ));
        }
        if self.store_path.as_os_str().is_empty() {
            return Err(StorageError::InvalidConfig("store_path is empty".into()));
        }
        Ok(())
    }

    #[must_use]
    pub fn sqlite_busy_timeout(&self) -> Duration {
        Duration::from_millis(self.sqlite_busy_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TieredCacheConfig::default();
        assert_eq!(config.lru_capacity, 10_000);
        assert_eq!(config.sqlite_max_connections, 4);
        assert_eq!(config.sqlite_busy_timeout(), Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_partial_uses_defaults() {
        let config: TieredCacheConfig = serde_json::from_str(
            r#"{"max_mem_bytes": 1024, "store_path": "/tmp/x.db"}"#,
        )
        .unwrap();

        assert_eq!(config.max_mem_bytes, 1024);
        assert_eq!(config.store_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(config.lru_capacity, 10_000);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = TieredCacheConfig {
            lru_capacity: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(StorageError::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_connections_rejected() {
        let config = TieredCacheConfig {
            sqlite_max_connections: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(StorageError::InvalidConfig(_))));
    }

    #[test]
    fn test_empty_path_rejected() {
        let config = TieredCacheConfig {
            store_path: PathBuf::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
