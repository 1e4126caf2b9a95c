//! # Tiered Cache
//!
//! A memory-bounded key-value cache that spills its least recently used
//! entries to a local SQLite file when the process grows past a threshold.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     TieredCache facade                      │
//! │  • set (sync, never blocks on I/O) / get / delete           │
//! │  • Schedules one demotion check per write                   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Hot tier + recency index                   │
//! │  • DashMap holds every non-demoted value                    │
//! │  • Bounded LRU over hot keys picks demotion victims         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!           (memory over max_mem_bytes: demote one LRU entry)
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Cold tier (SQLite)                      │
//! │  • MessagePack-encoded keys and values                      │
//! │  • Cold hits are promoted back into memory                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tiered_cache::{TieredCache, TieredCacheConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = TieredCacheConfig {
//!         max_mem_bytes: 512 * 1024 * 1024,
//!         lru_capacity: 50_000,
//!         store_path: "./sessions.db".into(),
//!         ..Default::default()
//!     };
//!
//!     let cache: TieredCache<String, Vec<u8>> =
//!         TieredCache::open(config).await.expect("Failed to open cache");
//!
//!     cache.set("session:42".into(), b"payload".to_vec());
//!
//!     // Index → hot tier → cold tier fallback
//!     if let Some(bytes) = cache.get(&"session:42".into()).await {
//!         println!("Found {} bytes", bytes.len());
//!     }
//!
//!     cache.close().await.expect("Failed to close cache");
//! }
//! ```
//!
//! ## Modules
//!
//! - [`coordinator`]: The [`TieredCache`] facade and demotion worker
//! - [`storage`]: Hot tier and cold-tier backends (SQLite, memory)
//! - [`eviction`]: Bounded recency index
//! - [`codec`]: MessagePack encoding at the cold-tier boundary
//! - [`memory`]: Process memory sampling

pub mod config;
pub mod codec;
pub mod storage;
pub mod eviction;
pub mod memory;
pub mod coordinator;
pub mod metrics;

pub use config::TieredCacheConfig;
pub use codec::CodecError;
pub use coordinator::{TieredCache, Residency, CacheStats, CacheKey, CacheValue};
pub use eviction::lru::RecencyIndex;
pub use memory::{MemorySampler, ProcessMemory, ManualMemory};
pub use storage::hot::{HotTier, Stamped};
pub use storage::memory::InMemoryColdStore;
pub use storage::sqlite::SqliteStore;
pub use storage::traits::{ColdStore, StorageError};
