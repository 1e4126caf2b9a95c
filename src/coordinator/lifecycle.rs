// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Cache lifecycle: open, settle, close.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use super::{demotion, CacheKey, CacheValue, Shared, TieredCache};
use crate::config::TieredCacheConfig;
use crate::memory::{MemorySampler, ProcessMemory};
use crate::storage::sqlite::SqliteStore;
use crate::storage::traits::{ColdStore, StorageError};

impl<K: CacheKey, V: CacheValue> TieredCache<K, V> {
    /// Open a cache backed by a SQLite file at `store_path`.
    ///
    /// `max_mem` is the process memory (bytes) above which writes start
    /// demoting the least recently used entry. `lru_capacity` bounds the
    /// recency index and must be at least 1.
    pub async fn new(
        max_mem: u64,
        lru_capacity: usize,
        store_path: impl Into<PathBuf>,
    ) -> Result<Self, StorageError> {
        Self::open(TieredCacheConfig {
            max_mem_bytes: max_mem,
            lru_capacity,
            store_path: store_path.into(),
            ..Default::default()
        })
        .await
    }

    /// Open a cache from a full configuration.
    ///
    /// Uses the SQLite cold tier and samples the resident set size of this
    /// process.
    #[tracing::instrument(skip_all, fields(path = %config.store_path.display()))]
    pub async fn open(config: TieredCacheConfig) -> Result<Self, StorageError> {
        config.validate()?;

        let store = SqliteStore::open(
            &config.store_path,
            config.sqlite_max_connections,
            config.sqlite_busy_timeout(),
        )
        .await?;

        Self::with_backends(config, Arc::new(store), Arc::new(ProcessMemory::new()))
    }

    /// Build a cache over caller-supplied cold store and memory sampler.
    ///
    /// Spawns the demotion worker, so this must run inside a tokio runtime.
    pub fn with_backends(
        config: TieredCacheConfig,
        cold: Arc<dyn ColdStore>,
        sampler: Arc<dyn MemorySampler>,
    ) -> Result<Self, StorageError> {
        config.validate()?;

        info!(
            max_mem_bytes = config.max_mem_bytes,
            lru_capacity = config.lru_capacity,
            "Tiered cache ready"
        );

        let shared = Arc::new(Shared::new(config, cold, sampler));
        let (shutdown, shutdown_rx) = watch::channel(false);
        let worker = demotion::spawn_worker(shared.clone(), shutdown_rx);

        Ok(Self {
            shared,
            shutdown,
            worker,
        })
    }

    /// Wait until every demotion check scheduled so far has run.
    pub async fn settle(&self) {
        self.shared.settle().await;
    }

    /// Drain pending demotion checks, stop the worker and close the cold
    /// tier. Entries still in memory are dropped, not persisted.
    #[tracing::instrument(skip_all)]
    pub async fn close(self) -> Result<(), StorageError> {
        let Self {
            shared,
            shutdown,
            worker,
        } = self;

        shared.settle().await;
        let _ = shutdown.send(true);
        if let Err(e) = worker.await {
            warn!(error = %e, "Demotion worker ended abnormally");
        }

        let hot_entries = shared.hot.len();
        shared.cold.close().await?;
        info!(hot_entries, "Tiered cache closed");
        Ok(())
    }
}
