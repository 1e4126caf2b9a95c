// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Hot tier: the in-memory source of truth for every non-demoted key.
//!
//! Backed by a sharded `DashMap`. Each write carries a unique stamp so a
//! demotion can tell whether the copy it is about to drop is still the one
//! it persisted.
//!
//! The `*_with` methods run a callback while the key's shard lock is held.
//! The coordinator uses them to keep the recency index in step with this
//! map. Callbacks must not touch this map again (the shard lock is not
//! reentrant).

use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// A value plus the stamp of the write that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Stamped<V> {
    pub value: V,
    pub stamp: u64,
}

pub struct HotTier<K, V> {
    entries: DashMap<K, Stamped<V>>,
    next_stamp: AtomicU64,
}

impl<K, V> HotTier<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            next_stamp: AtomicU64::new(1),
        }
    }

    /// Insert or replace `key`, then run `f` on the stored entry under the
    /// shard lock. Returns the stamp of the new write.
    pub fn insert_with<F>(&self, key: K, value: V, f: F) -> u64
    where
        F: FnOnce(&K, &Stamped<V>),
    {
        let stamped = Stamped {
            value,
            stamp: self.next_stamp.fetch_add(1, Ordering::Relaxed),
        };
        let stamp = stamped.stamp;

        match self.entries.entry(key) {
            Entry::Occupied(mut occupied) => {
                occupied.insert(stamped);
                f(occupied.key(), occupied.get());
            }
            Entry::Vacant(vacant) => {
                let stored = vacant.insert(stamped);
                f(stored.key(), stored.value());
            }
        }
        stamp
    }

    /// Insert only if `key` is absent. Returns the value that ends up
    /// resident, which is the existing one when the key was already present.
    /// `f` runs under the shard lock only when the insert happened.
    pub fn insert_absent_with<F>(&self, key: K, value: V, f: F) -> V
    where
        F: FnOnce(&K, &Stamped<V>),
    {
        match self.entries.entry(key) {
            Entry::Occupied(occupied) => occupied.get().value.clone(),
            Entry::Vacant(vacant) => {
                let stamped = Stamped {
                    value,
                    stamp: self.next_stamp.fetch_add(1, Ordering::Relaxed),
                };
                let stored = vacant.insert(stamped);
                f(stored.key(), stored.value());
                stored.value().value.clone()
            }
        }
    }

    /// Look up `key`; on a hit, run `f` under the shard read lock.
    pub fn get_with<F>(&self, key: &K, f: F) -> Option<V>
    where
        F: FnOnce(&K, &Stamped<V>),
    {
        let entry = self.entries.get(key)?;
        f(entry.key(), entry.value());
        Some(entry.value().value.clone())
    }

    #[must_use]
    pub fn get(&self, key: &K) -> Option<V> {
        self.entries.get(key).map(|entry| entry.value().value.clone())
    }

    /// Remove `key`, running `f` under the shard lock whether or not the key
    /// was present.
    pub fn remove_with<F>(&self, key: &K, f: F) -> Option<V>
    where
        F: FnOnce(),
    {
        match self.entries.entry(key.clone()) {
            Entry::Occupied(occupied) => {
                f();
                Some(occupied.remove().value)
            }
            Entry::Vacant(_) => {
                f();
                None
            }
        }
    }

    /// Remove `key` only if its current stamp is `stamp`.
    pub fn remove_if_stamp(&self, key: &K, stamp: u64) -> bool {
        self.remove_if_stamp_with(key, stamp, || {})
    }

    /// Like [`remove_if_stamp`](Self::remove_if_stamp), running `f` under
    /// the shard lock when the entry is removed.
    pub fn remove_if_stamp_with<F>(&self, key: &K, stamp: u64, f: F) -> bool
    where
        F: FnOnce(),
    {
        match self.entries.entry(key.clone()) {
            Entry::Occupied(occupied) if occupied.get().stamp == stamp => {
                f();
                occupied.remove();
                true
            }
            _ => false,
        }
    }

    /// Stamp of the current write for `key`.
    #[must_use]
    pub fn stamp(&self, key: &K) -> Option<u64> {
        self.entries.get(key).map(|entry| entry.value().stamp)
    }

    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> Default for HotTier<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
