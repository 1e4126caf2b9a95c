use async_trait::async_trait;
use thiserror::Error;

use crate::codec::CodecError;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage backend error: {0}")]
    Backend(String),
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<sqlx::Error> for StorageError {
    fn from(e: sqlx::Error) -> Self {
        StorageError::Backend(e.to_string())
    }
}

/// Durable byte-oriented store behind the hot tier.
///
/// Keys and values are opaque at this boundary; the coordinator does all
/// encoding. Implementations must tolerate concurrent calls from multiple
/// tasks.
#[async_trait]
pub trait ColdStore: Send + Sync {
    /// Fetch the value for `key`. Absent keys are `Ok(None)`, not an error.
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError>;

    /// Insert or overwrite `key`.
    async fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError>;

    /// Remove `key`. Deleting an absent key succeeds.
    async fn delete(&self, key: &[u8]) -> Result<(), StorageError>;

    /// Number of persisted entries.
    async fn count(&self) -> Result<u64, StorageError>;

    /// Release the underlying resource. Called once, from `TieredCache::close`.
    async fn close(&self) -> Result<(), StorageError>;
}
