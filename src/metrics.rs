// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Metrics instrumentation for the tiered cache.
//!
//! Uses the `metrics` crate for backend-agnostic metrics collection.
//! The embedding application chooses the exporter (Prometheus, OTEL, etc.)
//!
//! # Metric Naming Convention
//! - `tiered_cache_` prefix for all metrics
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//! - `_bytes` suffix for sizes
//!
//! # Labels
//! - `tier`: index, hot, cold, all
//! - `operation`: get, set, delete, demote, promote
//! - `status`: hit, miss, error, success

use metrics::{counter, gauge, histogram};
use std::time::Duration;

/// Record a cache operation outcome
pub fn record_operation(tier: &str, operation: &str, status: &str) {
    counter!(
        "tiered_cache_operations_total",
        "tier" => tier.to_string(),
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record operation latency
pub fn record_latency(tier: &str, operation: &str, duration: Duration) {
    histogram!(
        "tiered_cache_operation_seconds",
        "tier" => tier.to_string(),
        "operation" => operation.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Record an error with category for alerting
pub fn record_error(tier: &str, operation: &str, error_type: &str) {
    counter!(
        "tiered_cache_errors_total",
        "tier" => tier.to_string(),
        "operation" => operation.to_string(),
        "error_type" => error_type.to_string()
    )
    .increment(1);
}

// ═══════════════════════════════════════════════════════════════════════════
// TIERING - Demotion and promotion
// ═══════════════════════════════════════════════════════════════════════════

/// Record a demotion attempt outcome (demoted, superseded, failed, idle)
pub fn record_demotion(outcome: &str) {
    counter!(
        "tiered_cache_demotions_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record a cold-tier hit promoted back into memory
pub fn record_promotion() {
    counter!("tiered_cache_promotions_total").increment(1);
}

/// Record an entry pushed out of the recency index by capacity
pub fn record_index_overflow() {
    counter!("tiered_cache_index_overflow_total").increment(1);
}

/// Record demotion check duration
pub fn record_demotion_duration(duration: Duration) {
    histogram!("tiered_cache_demotion_seconds").record(duration.as_secs_f64());
}

// ═══════════════════════════════════════════════════════════════════════════
// THROUGHPUT - Bytes crossing the cold boundary
// ═══════════════════════════════════════════════════════════════════════════

/// Record bytes written to the cold tier
pub fn record_bytes_written(bytes: usize) {
    counter!("tiered_cache_cold_bytes_written_total").increment(bytes as u64);
}

/// Record bytes read from the cold tier
pub fn record_bytes_read(bytes: usize) {
    counter!("tiered_cache_cold_bytes_read_total").increment(bytes as u64);
}

// ═══════════════════════════════════════════════════════════════════════════
// GAUGES - Current sizes
// ═══════════════════════════════════════════════════════════════════════════

/// Set hot tier entry count
pub fn set_hot_entries(count: usize) {
    gauge!("tiered_cache_hot_entries").set(count as f64);
}

/// Set recency index entry count
pub fn set_index_entries(count: usize) {
    gauge!("tiered_cache_index_entries").set(count as f64);
}

/// Set demotion checks waiting for the worker
pub fn set_pending_demotions(count: u64) {
    gauge!("tiered_cache_pending_demotions").set(count as f64);
}

/// Set last sampled memory usage
pub fn set_memory_used_bytes(bytes: u64) {
    gauge!("tiered_cache_memory_used_bytes").set(bytes as f64);
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_util::debugging::{DebugValue, DebuggingRecorder};

    #[test]
    fn test_metrics_without_recorder_are_noops() {
        record_operation("hot", "get", "hit");
        record_latency("cold", "get", Duration::from_millis(2));
        record_error("cold", "put", "backend");
        record_demotion("demoted");
        record_promotion();
        record_index_overflow();
        record_demotion_duration(Duration::from_micros(40));
        record_bytes_written(128);
        record_bytes_read(64);
        set_hot_entries(3);
        set_index_entries(2);
        set_pending_demotions(1);
        set_memory_used_bytes(1 << 20);
    }

    #[test]
    fn test_counters_are_captured() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();

        metrics::with_local_recorder(&recorder, || {
            record_demotion("demoted");
            record_demotion("demoted");
            record_promotion();
        });

        let snapshot = snapshotter.snapshot().into_vec();
        let demoted = snapshot
            .iter()
            .find(|(key, _, _, _)| key.key().name() == "tiered_cache_demotions_total")
            .map(|(_, _, _, value)| value.clone());
        assert_eq!(demoted, Some(DebugValue::Counter(2)).as_ref());

        let promoted = snapshot
            .iter()
            .find(|(key, _, _, _)| key.key().name() == "tiered_cache_promotions_total")
            .map(|(_, _, _, value)| value.clone());
        assert_eq!(promoted, Some(DebugValue::Counter(1)).as_ref());
    }
}
