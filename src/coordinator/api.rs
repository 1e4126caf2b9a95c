// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Core cache operations: set, get, delete.
//!
//! None of these return errors. Cold-tier failures are logged, counted and
//! degrade to a miss (get) or a skipped cold delete (delete).

use std::sync::atomic::Ordering;
use std::time::Instant;

use tracing::{debug, warn};

use super::{CacheKey, CacheValue, TieredCache};
use crate::codec;

impl<K: CacheKey, V: CacheValue> TieredCache<K, V> {
    /// Store `value` under `key`.
    ///
    /// The hot tier and the recency index both hold the new value before
    /// this returns. A demotion check is then queued for the background
    /// worker.
    pub fn set(&self, key: K, value: V) {
        let start = Instant::now();
        let shared = &self.shared;
        shared.hot.insert_with(key, value, |k, stored| shared.track(k, stored));
        self.schedule_demotion_check();

        crate::metrics::record_operation("hot", "set", "success");
        crate::metrics::record_latency("hot", "set", start.elapsed());
    }

    /// Get the value for `key`.
    ///
    /// Checks, in order: recency index → hot tier → cold tier.
    /// A hot-tier hit is re-indexed as most recently used; a cold hit is
    /// promoted back into memory (the cold copy stays on disk).
    #[tracing::instrument(skip_all, fields(tier))]
    pub async fn get(&self, key: &K) -> Option<V> {
        let start = Instant::now();
        let shared = &self.shared;

        // 1. Recency index
        if let Some(stored) = shared.index.get(key) {
            tracing::Span::current().record("tier", "index");
            crate::metrics::record_operation("index", "get", "hit");
            crate::metrics::record_latency("index", "get", start.elapsed());
            return Some(stored.value);
        }

        // 2. Hot tier (entry fell out of the index by capacity)
        if let Some(value) = shared.hot.get_with(key, |k, stored| shared.track(k, stored)) {
            tracing::Span::current().record("tier", "hot");
            debug!("Hot hit outside index, re-indexed");
            crate::metrics::record_operation("hot", "get", "hit");
            crate::metrics::record_latency("hot", "get", start.elapsed());
            return Some(value);
        }

        // 3. Cold tier
        let promoted = {
            let _gate = shared.cold_gate(key).read().await;
            let Some(value) = shared.restore_from_cold(key).await else {
                tracing::Span::current().record("tier", "miss");
                crate::metrics::record_operation("all", "get", "miss");
                crate::metrics::record_latency("all", "get", start.elapsed());
                return None;
            };

            let mut inserted = false;
            let resident = shared.hot.insert_absent_with(key.clone(), value, |k, stored| {
                inserted = true;
                shared.track(k, stored);
            });
            if inserted {
                shared.counters.promotions.fetch_add(1, Ordering::Relaxed);
                crate::metrics::record_promotion();
                debug!("Cold hit, promoted to hot tier");
            } else {
                debug!("Cold hit raced a fresh set; keeping hot value");
            }
            resident
        };
        self.schedule_demotion_check();

        tracing::Span::current().record("tier", "cold");
        crate::metrics::record_operation("cold", "get", "hit");
        crate::metrics::record_latency("cold", "get", start.elapsed());
        Some(promoted)
    }

    /// Remove `key` from every tier. Removing an absent key is a no-op.
    #[tracing::instrument(skip_all)]
    pub async fn delete(&self, key: &K) {
        let start = Instant::now();
        let shared = &self.shared;

        let _gate = shared.cold_gate(key).write().await;
        shared.hot.remove_with(key, || {
            shared.index.remove(key);
        });

        match codec::encode(key) {
            Ok(key_bytes) => {
                if let Err(e) = shared.cold.delete(&key_bytes).await {
                    warn!(error = %e, "Cold delete failed");
                    crate::metrics::record_error("cold", "delete", "backend");
                }
            }
            Err(e) => {
                warn!(error = %e, "Cold delete skipped: key encode failed");
                crate::metrics::record_error("cold", "delete", "codec");
            }
        }

        crate::metrics::record_operation("all", "delete", "success");
        crate::metrics::record_latency("all", "delete", start.elapsed());
    }

    fn schedule_demotion_check(&self) {
        self.shared.pending.send_modify(|n| *n += 1);
    }
}
