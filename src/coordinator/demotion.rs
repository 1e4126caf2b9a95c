// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Memory-pressure demotion.
//!
//! Every write (and every promotion) schedules one check. A single worker
//! task runs the checks in order: sample memory, and if usage is over
//! `max_mem_bytes`, move the least recently used entry to the cold tier.
//!
//! # Ordering
//!
//! After popping a victim, the worker takes the key's cold gate stripe
//! exclusively and holds it through encode, cold put and hot remove. A
//! concurrent `delete` of that key either lands before (the stamp check
//! finds nothing to demote) or after (and removes the cold copy). Deletes
//! of keys on other stripes are not held up.
//!
//! The hot copy is dropped only if its stamp still matches the popped one.
//! A `set` that raced the demotion keeps its newer value in memory. The
//! index entry is dropped under the same shard lock, so a hot hit that
//! re-indexed the key mid-demotion leaves nothing behind.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::types::DemotionOutcome;
use super::{CacheKey, CacheValue, Shared};
use crate::codec;

/// Start the demotion worker. It exits when `shutdown` flips to `true` or
/// its sender is dropped. A check that panics counts as a failed demotion
/// and the worker moves on.
pub(super) fn spawn_worker<K: CacheKey, V: CacheValue>(
    shared: Arc<Shared<K, V>>,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut pending = shared.pending.subscribe();
        debug!("Demotion worker started");

        loop {
            let stop = tokio::select! {
                biased;
                changed = shutdown.changed() => changed.is_err() || *shutdown.borrow(),
                ready = pending.wait_for(|n| *n > 0) => ready.is_err(),
            };
            if stop {
                break;
            }

            // Run the check in its own task so a panic cannot strand `pending`
            let check = tokio::spawn({
                let shared = shared.clone();
                async move { shared.check_memory_and_persist().await }
            });
            if let Err(e) = check.await {
                warn!(error = %e, "Demotion check aborted");
                crate::metrics::record_error("cold", "demote", "panic");
                shared.counters.failed_demotions.fetch_add(1, Ordering::Relaxed);
            }
            shared.pending.send_modify(|n| *n = n.saturating_sub(1));
            crate::metrics::set_pending_demotions(*shared.pending.borrow());
        }

        debug!("Demotion worker stopped");
    })
}

impl<K: CacheKey, V: CacheValue> Shared<K, V> {
    /// Run one demotion check.
    pub(super) async fn check_memory_and_persist(&self) -> DemotionOutcome {
        let used = self.sampler.used_bytes();
        crate::metrics::set_memory_used_bytes(used);

        if used <= self.config.max_mem_bytes {
            return DemotionOutcome::BelowThreshold;
        }

        let start = Instant::now();
        let outcome = self.demote_least_recent().await;
        crate::metrics::record_demotion(outcome.as_str());
        crate::metrics::record_demotion_duration(start.elapsed());

        debug!(
            used_bytes = used,
            max_bytes = self.config.max_mem_bytes,
            outcome = outcome.as_str(),
            "Demotion check"
        );
        outcome
    }

    async fn demote_least_recent(&self) -> DemotionOutcome {
        let Some((key, stored)) = self.index.remove_oldest() else {
            return DemotionOutcome::IndexEmpty;
        };

        let _gate = self.cold_gate(&key).write().await;

        // A delete or rewrite may have landed before the gate was taken
        if self.hot.stamp(&key) != Some(stored.stamp) {
            self.counters.superseded_demotions.fetch_add(1, Ordering::Relaxed);
            return DemotionOutcome::Superseded;
        }

        let encoded = codec::encode(&key).and_then(|k| Ok((k, codec::encode(&stored.value)?)));
        let (key_bytes, value_bytes) = match encoded {
            Ok(pair) => pair,
            Err(e) => {
                warn!(error = %e, "Demotion skipped: encode failed, entry stays in memory");
                crate::metrics::record_error("cold", "demote", "codec");
                self.counters.failed_demotions.fetch_add(1, Ordering::Relaxed);
                return DemotionOutcome::Failed;
            }
        };

        if let Err(e) = self.cold.put(&key_bytes, &value_bytes).await {
            warn!(error = %e, "Demotion failed, entry stays in memory");
            crate::metrics::record_error("cold", "demote", "backend");
            self.counters.failed_demotions.fetch_add(1, Ordering::Relaxed);
            return DemotionOutcome::Failed;
        }
        crate::metrics::record_bytes_written(key_bytes.len() + value_bytes.len());

        // A hot hit during the put re-indexes the same write; drop that entry too
        let removed = self.hot.remove_if_stamp_with(&key, stored.stamp, || {
            self.index.remove_if(&key, |indexed| indexed.stamp == stored.stamp);
        });
        if removed {
            self.counters.demotions.fetch_add(1, Ordering::Relaxed);
            DemotionOutcome::Demoted
        } else {
            self.counters.superseded_demotions.fetch_add(1, Ordering::Relaxed);
            DemotionOutcome::Superseded
        }
    }
}
