// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Tiered cache coordinator.
//!
//! The [`TieredCache`] ties together:
//! - the hot tier (DashMap, source of truth for in-memory keys)
//! - the recency index (bounded LRU over hot keys, picks demotion victims)
//! - the cold tier (SQLite, source of truth for demoted keys)
//! - the memory sampler and the background demotion worker
//!
//! # Data flow
//!
//! ```text
//! set ──► hot tier + recency index (same shard lock) ──► pending checks += 1
//!                                                              │
//!                                     demotion worker ◄────────┘
//!                                     memory > max? pop LRU ─► encode ─► cold put ─► drop hot copy
//!
//! get ──► recency index ──► hot tier (re-index) ──► cold tier (decode, promote)
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use tiered_cache::TieredCache;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), tiered_cache::StorageError> {
//! let cache: TieredCache<String, u64> =
//!     TieredCache::new(512 * 1024 * 1024, 10_000, "./cache.db").await?;
//!
//! cache.set("answer".to_string(), 42);
//! assert_eq!(cache.get(&"answer".to_string()).await, Some(42));
//!
//! cache.delete(&"answer".to_string()).await;
//! cache.close().await?;
//! # Ok(())
//! # }
//! ```

mod types;
mod api;
mod lifecycle;
mod demotion;

pub use types::{CacheKey, CacheValue, Residency, CacheStats};

use std::collections::hash_map::RandomState;
use std::hash::BuildHasher;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;

use crate::codec;
use crate::config::TieredCacheConfig;
use crate::eviction::lru::RecencyIndex;
use crate::memory::MemorySampler;
use crate::storage::hot::{HotTier, Stamped};
use crate::storage::traits::ColdStore;

/// Memory-bounded two-tier key-value cache.
///
/// # Thread Safety
///
/// `TieredCache` is `Send + Sync`; share it behind an `Arc`. `set` never
/// blocks on I/O. `get` blocks on disk only for a cold hit, `delete` always
/// issues a cold delete.
///
/// # Consistency
///
/// - Read-your-writes: a `get` after `set` on the same key sees the value.
/// - A `delete` is never undone by a demotion or promotion in flight.
/// - A demotion never drops a hot copy that was rewritten after the
///   demotion picked it.
pub struct TieredCache<K, V> {
    pub(super) shared: Arc<Shared<K, V>>,

    /// Stops the demotion worker (also stops when dropped)
    pub(super) shutdown: watch::Sender<bool>,

    /// Demotion worker task
    pub(super) worker: JoinHandle<()>,
}

/// State shared between the handle and the demotion worker.
pub(super) struct Shared<K, V> {
    pub(super) config: TieredCacheConfig,

    /// In-memory source of truth
    pub(super) hot: HotTier<K, V>,

    /// Recency index over hot keys. Holds the same stamped value as `hot`.
    pub(super) index: RecencyIndex<K, Stamped<V>>,

    /// Durable tier for demoted keys
    pub(super) cold: Arc<dyn ColdStore>,

    pub(super) sampler: Arc<dyn MemorySampler>,

    /// Orders cold-tier mutations against deletes of the same key, striped
    /// by key hash. Demotion and delete hold a stripe exclusively; cold reads
    /// share it.
    cold_gates: Box<[RwLock<()>]>,
    gate_hasher: RandomState,

    /// Demotion checks scheduled and not yet finished
    pub(super) pending: watch::Sender<u64>,

    pub(super) counters: Counters,
}

/// Number of cold gate stripes
const COLD_GATE_STRIPES: usize = 64;

#[derive(Default)]
pub(super) struct Counters {
    pub(super) demotions: AtomicU64,
    pub(super) failed_demotions: AtomicU64,
    pub(super) superseded_demotions: AtomicU64,
    pub(super) promotions: AtomicU64,
    pub(super) index_overflows: AtomicU64,
}

impl<K: CacheKey, V: CacheValue> Shared<K, V> {
    pub(super) fn new(
        config: TieredCacheConfig,
        cold: Arc<dyn ColdStore>,
        sampler: Arc<dyn MemorySampler>,
    ) -> Self {
        let (pending, _) = watch::channel(0);
        Self {
            index: RecencyIndex::new(config.lru_capacity),
            hot: HotTier::new(),
            config,
            cold,
            sampler,
            cold_gates: (0..COLD_GATE_STRIPES).map(|_| RwLock::new(())).collect(),
            gate_hasher: RandomState::new(),
            pending,
            counters: Counters::default(),
        }
    }

    /// Cold gate stripe guarding `key`.
    pub(super) fn cold_gate(&self, key: &K) -> &RwLock<()> {
        let stripe = self.gate_hasher.hash_one(key) as usize % self.cold_gates.len();
        &self.cold_gates[stripe]
    }

    /// Record `key` as most recently used. Runs under the hot shard lock.
    pub(super) fn track(&self, key: &K, stored: &Stamped<V>) {
        if self.index.put(key.clone(), stored.clone()).is_some() {
            self.counters.index_overflows.fetch_add(1, Ordering::Relaxed);
            crate::metrics::record_index_overflow();
        }
    }

    /// Wait until no demotion check is pending.
    pub(super) async fn settle(&self) {
        let mut pending = self.pending.subscribe();
        let _ = pending.wait_for(|n| *n == 0).await;
    }

    /// Look up the cold tier. Every failure degrades to a miss.
    pub(super) async fn restore_from_cold(&self, key: &K) -> Option<V> {
        let key_bytes = match codec::encode(key) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, "Cold read skipped: key encode failed");
                crate::metrics::record_error("cold", "get", "codec");
                return None;
            }
        };

        let value_bytes = match self.cold.get(&key_bytes).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(error = %e, "Cold read failed");
                crate::metrics::record_error("cold", "get", "backend");
                return None;
            }
        };
        crate::metrics::record_bytes_read(value_bytes.len());

        match codec::decode(&value_bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(error = %e, bytes = value_bytes.len(), "Cold read skipped: value decode failed");
                crate::metrics::record_error("cold", "get", "codec");
                None
            }
        }
    }
}

impl<K: CacheKey, V: CacheValue> TieredCache<K, V> {
    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &TieredCacheConfig {
        &self.shared.config
    }

    /// Sampled memory usage relative to `max_mem_bytes` (1.0 = at threshold).
    #[must_use]
    pub fn memory_pressure(&self) -> f64 {
        let used = self.shared.sampler.used_bytes();
        let max = self.shared.config.max_mem_bytes;
        if max == 0 {
            if used == 0 { 0.0 } else { f64::INFINITY }
        } else {
            used as f64 / max as f64
        }
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let shared = &self.shared;
        let stats = CacheStats {
            hot_entries: shared.hot.len(),
            indexed_entries: shared.index.len(),
            index_capacity: shared.index.capacity(),
            pending_demotions: *shared.pending.borrow(),
            demotions: shared.counters.demotions.load(Ordering::Relaxed),
            failed_demotions: shared.counters.failed_demotions.load(Ordering::Relaxed),
            superseded_demotions: shared.counters.superseded_demotions.load(Ordering::Relaxed),
            promotions: shared.counters.promotions.load(Ordering::Relaxed),
            index_overflows: shared.counters.index_overflows.load(Ordering::Relaxed),
        };
        crate::metrics::set_hot_entries(stats.hot_entries);
        crate::metrics::set_index_entries(stats.indexed_entries);
        stats
    }

    /// Report which tier holds `key`. May read the cold tier.
    pub async fn residency(&self, key: &K) -> Residency {
        if self.shared.hot.contains(key) {
            return if self.shared.index.contains(key) {
                Residency::Indexed
            } else {
                Residency::HotOnly
            };
        }

        let _gate = self.shared.cold_gate(key).read().await;
        let Ok(key_bytes) = codec::encode(key) else {
            return Residency::Absent;
        };
        match self.shared.cold.get(&key_bytes).await {
            Ok(Some(_)) => Residency::Cold,
            _ => Residency::Absent,
        }
    }
}
