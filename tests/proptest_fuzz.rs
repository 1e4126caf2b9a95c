//! Property-based tests (fuzzing) for tiered cache resilience.
//!
//! Uses proptest to generate random/malformed inputs and operation
//! sequences, and verifies the cache never panics and never disagrees with
//! a plain `HashMap` model.
//!
//! Run with: `cargo test --test proptest_fuzz`

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use proptest::prelude::*;
use serde::{Deserialize, Serialize};

use tiered_cache::{
    codec, InMemoryColdStore, ManualMemory, RecencyIndex, TieredCache, TieredCacheConfig,
};

// =============================================================================
// Strategies for generating test data
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Record {
    id: u64,
    name: String,
    tags: Vec<String>,
    payload: Vec<u8>,
    parent: Option<Box<Record>>,
}

fn record_strategy() -> impl Strategy<Value = Record> {
    let leaf = (
        any::<u64>(),
        ".{0,20}",
        prop::collection::vec("[a-z]{1,8}", 0..5),
        prop::collection::vec(any::<u8>(), 0..256),
    )
        .prop_map(|(id, name, tags, payload)| Record {
            id,
            name,
            tags,
            payload,
            parent: None,
        });

    leaf.prop_recursive(3, 8, 1, |inner| {
        (inner.clone(), inner).prop_map(|(mut child, parent)| {
            child.parent = Some(Box::new(parent));
            child
        })
    })
}

#[derive(Debug, Clone)]
enum Op {
    Set(u8, u32),
    Get(u8),
    Delete(u8),
    Pressure(bool),
}

/// Small key space so sets, gets and deletes collide often
fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0u8..12, any::<u32>()).prop_map(|(k, v)| Op::Set(k, v)),
        4 => (0u8..12).prop_map(Op::Get),
        2 => (0u8..12).prop_map(Op::Delete),
        1 => any::<bool>().prop_map(Op::Pressure),
    ]
}

// =============================================================================
// Codec Fuzz Tests
// =============================================================================

proptest! {
    /// Decoding should never panic on arbitrary bytes
    #[test]
    fn fuzz_decode_random_bytes(bytes in prop::collection::vec(any::<u8>(), 0..4096)) {
        let _ = codec::decode::<Record>(&bytes);
        let _ = codec::decode::<String>(&bytes);
        let _ = codec::decode::<HashMap<String, u64>>(&bytes);
    }

    /// Corrupted encodings should fail cleanly or decode to something
    #[test]
    fn fuzz_corrupted_record(
        record in record_strategy(),
        corruption in prop::collection::vec(any::<u8>(), 1..32),
        position in 0usize..10_000,
    ) {
        let mut bytes = codec::encode(&record).unwrap();
        let pos = position % bytes.len();
        for (i, b) in corruption.iter().enumerate() {
            let idx = (pos + i) % bytes.len();
            bytes[idx] ^= b;
        }
        let _ = codec::decode::<Record>(&bytes);
    }

    /// Truncated encodings always fail to decode
    #[test]
    fn fuzz_truncated_record(record in record_strategy(), cut in 0usize..10_000) {
        let bytes = codec::encode(&record).unwrap();
        let cut = cut % bytes.len();
        prop_assert!(codec::decode::<Record>(&bytes[..cut]).is_err());
    }

    /// Encoding preserves nested records exactly
    #[test]
    fn prop_record_survives_codec(record in record_strategy()) {
        let bytes = codec::encode(&record).unwrap();
        prop_assert_eq!(codec::decode::<Record>(&bytes).unwrap(), record);
    }

    /// Equal keys always encode to equal bytes
    #[test]
    fn prop_key_encoding_is_deterministic(key in ".*", n in any::<u64>()) {
        prop_assert_eq!(codec::encode(&key).unwrap(), codec::encode(&key.clone()).unwrap());
        prop_assert_eq!(codec::encode(&(key.clone(), n)).unwrap(), codec::encode(&(key, n)).unwrap());
    }
}

// =============================================================================
// Recency Index Invariant Tests
// =============================================================================

proptest! {
    /// The index agrees with a VecDeque LRU model and never exceeds capacity
    #[test]
    fn prop_index_matches_model(
        capacity in 1usize..8,
        ops in prop::collection::vec((0u8..3, 0u8..10), 0..200),
    ) {
        let index = RecencyIndex::new(capacity);
        let mut model: VecDeque<u8> = VecDeque::new();

        for (kind, key) in ops {
            match kind {
                0 => {
                    let evicted = index.put(key, u32::from(key));
                    if let Some(pos) = model.iter().position(|k| *k == key) {
                        model.remove(pos);
                    }
                    model.push_back(key);
                    let expected = if model.len() > capacity { model.pop_front() } else { None };
                    prop_assert_eq!(evicted.map(|(k, _)| k), expected);
                }
                1 => {
                    let hit = index.get(&key);
                    if let Some(pos) = model.iter().position(|k| *k == key) {
                        model.remove(pos);
                        model.push_back(key);
                        prop_assert_eq!(hit, Some(u32::from(key)));
                    } else {
                        prop_assert_eq!(hit, None);
                    }
                }
                _ => {
                    let oldest = index.remove_oldest().map(|(k, _)| k);
                    prop_assert_eq!(oldest, model.pop_front());
                }
            }

            prop_assert!(index.len() <= capacity);
            prop_assert_eq!(index.keys_oldest_first(), model.iter().copied().collect::<Vec<_>>());
        }
    }
}

// =============================================================================
// Facade Model Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Every get agrees with a HashMap, whatever gets demoted along the way
    #[test]
    fn prop_cache_matches_hashmap(
        capacity in 1usize..6,
        ops in prop::collection::vec(op_strategy(), 1..80),
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        rt.block_on(async {
            let cold = Arc::new(InMemoryColdStore::new());
            let sampler = Arc::new(ManualMemory::new(0));
            let config = TieredCacheConfig {
                max_mem_bytes: 1_000,
                lru_capacity: capacity,
                ..Default::default()
            };
            let cache: TieredCache<u8, u32> =
                TieredCache::with_backends(config, cold, sampler.clone()).unwrap();
            let mut model: HashMap<u8, u32> = HashMap::new();

            for op in ops {
                match op {
                    Op::Set(k, v) => {
                        cache.set(k, v);
                        model.insert(k, v);
                    }
                    Op::Get(k) => {
                        prop_assert_eq!(cache.get(&k).await, model.get(&k).copied());
                    }
                    Op::Delete(k) => {
                        cache.delete(&k).await;
                        model.remove(&k);
                    }
                    Op::Pressure(over) => {
                        sampler.set(if over { 2_000 } else { 0 });
                        cache.settle().await;
                    }
                }
            }

            cache.settle().await;
            for k in 0u8..12 {
                prop_assert_eq!(cache.get(&k).await, model.get(&k).copied());
            }
            let stats = cache.stats();
            prop_assert!(stats.indexed_entries <= capacity);
            cache.close().await.unwrap();
            Ok(())
        })?;
    }
}
