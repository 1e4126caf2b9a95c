use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use super::traits::{ColdStore, StorageError};

/// Volatile `ColdStore` for tests and for callers that want demotion
/// bookkeeping without a database file.
pub struct InMemoryColdStore {
    data: DashMap<Vec<u8>, Vec<u8>>,
    closed: AtomicBool,
}

impl InMemoryColdStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: DashMap::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Get current item count
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether `close` has been called
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> Result<(), StorageError> {
        if self.is_closed() {
            return Err(StorageError::Backend("store is closed".into()));
        }
        Ok(())
    }
}

impl Default for InMemoryColdStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ColdStore for InMemoryColdStore {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        self.ensure_open()?;
        Ok(self.data.get(key).map(|r| r.value().clone()))
    }

    async fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        self.ensure_open()?;
        self.data.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    async fn delete(&self, key: &[u8]) -> Result<(), StorageError> {
        self.ensure_open()?;
        self.data.remove(key);
        Ok(())
    }

    async fn count(&self) -> Result<u64, StorageError> {
        Ok(self.data.len() as u64)
    }

    async fn close(&self) -> Result<(), StorageError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Err(StorageError::Backend("store already closed".into()));
        }
        Ok(())
    }
}
