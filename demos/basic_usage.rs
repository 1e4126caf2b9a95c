// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Basic tiered-cache usage example.
//!
//! Demonstrates:
//! 1. Opening a cache over a SQLite cold tier
//! 2. Writing 5 JSON-ish entries
//! 3. Simulating memory pressure to demote entries to disk
//! 4. Reading entries back (index → hot → cold fallback)
//! 5. Displaying metrics (OTEL-compatible)
//! 6. Clean shutdown
//!
//! # Run
//!
//! ```bash
//! cargo run --example basic_usage
//! ```

use std::sync::Arc;
use std::time::Instant;

use metrics_util::debugging::{DebugValue, DebuggingRecorder, Snapshotter};
use serde::{Deserialize, Serialize};
use tiered_cache::{ManualMemory, SqliteStore, TieredCache, TieredCacheConfig};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Profile {
    name: String,
    role: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Install metrics recorder (captures all metrics for OTEL export)
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder.install().expect("failed to install metrics recorder");

    tracing_subscriber::fmt()
        .with_target(false)
        .compact()
        .init();

    println!("\n╔═══════════════════════════════════════════════════════════════╗");
    println!("║           tiered-cache: Basic Usage Example                   ║");
    println!("╚═══════════════════════════════════════════════════════════════╝\n");

    // ─────────────────────────────────────────────────────────────────────────
    // 1. Configure and open the cache
    // ─────────────────────────────────────────────────────────────────────────
    let db_path = std::env::temp_dir().join("tiered_cache_demo.db");
    println!("📦 Opening cache (cold tier: {})...", db_path.display());

    let config = TieredCacheConfig {
        // Threshold compared against the sampler below
        max_mem_bytes: 64 * 1024 * 1024,
        lru_capacity: 1_000,
        store_path: db_path.clone(),
        ..Default::default()
    };

    // A manual sampler lets the demo decide when memory is "full"
    let sampler = Arc::new(ManualMemory::new(0));
    let store = SqliteStore::open(
        &config.store_path,
        config.sqlite_max_connections,
        config.sqlite_busy_timeout(),
    )
    .await?;
    let cache: TieredCache<String, Profile> =
        TieredCache::with_backends(config, Arc::new(store), sampler.clone())?;
    println!("   ✅ Cache ready!");

    // ─────────────────────────────────────────────────────────────────────────
    // 2. Write 5 entries
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n📝 Writing 5 entries...");
    let entries = [
        ("user.alice", "Alice", "admin"),
        ("user.bob", "Bob", "user"),
        ("user.carol", "Carol", "user"),
        ("user.dave", "Dave", "auditor"),
        ("user.erin", "Erin", "user"),
    ];
    for (id, name, role) in &entries {
        let start = Instant::now();
        cache.set(
            id.to_string(),
            Profile {
                name: name.to_string(),
                role: role.to_string(),
            },
        );
        println!("   └─ set {} ({:?})", id, start.elapsed());
    }
    cache.settle().await;

    // ─────────────────────────────────────────────────────────────────────────
    // 3. Simulate memory pressure: each write now demotes one LRU entry
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n🔥 Simulating memory pressure...");
    sampler.set(128 * 1024 * 1024);
    println!("   └─ Pressure: {:.1}%", cache.memory_pressure() * 100.0);

    cache.set(
        "user.frank".into(),
        Profile {
            name: "Frank".into(),
            role: "user".into(),
        },
    );
    cache.set(
        "user.grace".into(),
        Profile {
            name: "Grace".into(),
            role: "admin".into(),
        },
    );
    cache.settle().await;
    sampler.set(0);

    println!("\n📍 Residency:");
    for (id, _, _) in &entries {
        println!("   └─ {}: {}", id, cache.residency(&id.to_string()).await);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // 4. Read everything back
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n📖 Reading entries back (with timing)...");
    for (id, _, _) in &entries {
        let start = Instant::now();
        match cache.get(&id.to_string()).await {
            Some(profile) => println!("   └─ {} → {:?} ({:?})", id, profile, start.elapsed()),
            None => println!("   └─ {} → NOT FOUND ({:?})", id, start.elapsed()),
        }
    }

    let stats = cache.stats();
    println!("\n📊 Cache Stats:");
    println!("   ┌─ Hot entries: {}", stats.hot_entries);
    println!("   ├─ Indexed: {}/{}", stats.indexed_entries, stats.index_capacity);
    println!("   ├─ Demotions: {} (failed {})", stats.demotions, stats.failed_demotions);
    println!("   └─ Promotions: {}", stats.promotions);

    // ─────────────────────────────────────────────────────────────────────────
    // 5. Dump raw metrics
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n📈 Raw Metrics (OTEL export format):");
    dump_metrics(&snapshotter);

    // ─────────────────────────────────────────────────────────────────────────
    // 6. Clean shutdown
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n🛑 Closing...");
    cache.close().await?;

    for suffix in ["", "-shm", "-wal"] {
        let mut path = db_path.clone().into_os_string();
        path.push(suffix);
        let _ = std::fs::remove_file(path);
    }
    println!("   ✅ Closed and cleaned up {}", db_path.display());

    println!("\n╔═══════════════════════════════════════════════════════════════╗");
    println!("║                    Example complete!                          ║");
    println!("╚═══════════════════════════════════════════════════════════════╝\n");

    Ok(())
}

/// Dump all captured metrics in OTEL-compatible format
fn dump_metrics(snapshotter: &Snapshotter) {
    let mut counters = Vec::new();
    let mut gauges = Vec::new();
    let mut histograms = Vec::new();

    for (composite_key, _, _, value) in snapshotter.snapshot().into_vec() {
        let (_, key) = composite_key.into_parts();
        let labels: Vec<_> = key
            .labels()
            .map(|l| format!("{}={}", l.key(), l.value()))
            .collect();
        let label_str = if labels.is_empty() {
            String::new()
        } else {
            format!("{{{}}}", labels.join(","))
        };
        let name = format!("{}{}", key.name(), label_str);

        match value {
            DebugValue::Counter(v) => counters.push((name, v)),
            DebugValue::Gauge(v) => gauges.push((name, v.into_inner())),
            DebugValue::Histogram(samples) => {
                let count = samples.len();
                let sum: f64 = samples.iter().map(|v| v.into_inner()).sum();
                histograms.push((name, count, sum));
            }
        }
    }

    counters.sort_by(|a, b| a.0.cmp(&b.0));
    gauges.sort_by(|a, b| a.0.cmp(&b.0));
    histograms.sort_by(|a, b| a.0.cmp(&b.0));

    println!("   ┌─ Counters (cumulative)");
    for (name, value) in &counters {
        println!("   │  └─ {} = {}", name, value);
    }
    println!("   ├─ Gauges (current value)");
    for (name, value) in &gauges {
        println!("   │  └─ {} = {:.2}", name, value);
    }
    println!("   └─ Histograms (distributions)");
    for (name, count, sum) in &histograms {
        let avg = if *count > 0 { sum / *count as f64 } else { 0.0 };
        println!("      └─ {} count={} sum={:.6} avg={:.6}", name, count, sum, avg);
    }
}
