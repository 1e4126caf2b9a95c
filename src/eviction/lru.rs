// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Bounded recency index (strict LRU).
//!
//! The index only picks demotion candidates. It is never the source of
//! truth for a value: every key it holds also lives in the hot tier.
//!
//! Layout: a `HashMap<K, SlotIdx>` pointing into a slab-backed doubly linked
//! list. The list head is the least recently used entry, the tail the most
//! recently used. Links are slab indices, so no node reference ever leaves
//! the index and there is no `unsafe`.
//!
//! Every operation takes the single internal mutex, including `get`, which
//! reorders the list.

use std::collections::HashMap;
use std::hash::Hash;

use parking_lot::Mutex;

/// Thread-safe bounded LRU index.
///
/// # Example
///
/// ```
/// use tiered_cache::RecencyIndex;
///
/// let index = RecencyIndex::new(2);
/// assert!(index.put("a", 1).is_none());
/// assert!(index.put("b", 2).is_none());
/// index.get(&"a");                       // "a" is now most recent
/// assert_eq!(index.put("c", 3), Some(("b", 2)));
/// assert_eq!(index.remove_oldest(), Some(("a", 1)));
/// ```
pub struct RecencyIndex<K, V> {
    capacity: usize,
    inner: Mutex<LruState<K, V>>,
}

impl<K, V> RecencyIndex<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create an index holding at most `capacity` entries.
    ///
    /// A capacity of zero is legal and holds nothing: every `put` hands the
    /// entry straight back as evicted.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(LruState::new()),
        }
    }

    /// Insert or update `key`, marking it most recently used.
    ///
    /// Returns the least recently used entry when the insert pushed the
    /// index over capacity. The caller decides what to do with it.
    pub fn put(&self, key: K, value: V) -> Option<(K, V)> {
        let mut state = self.inner.lock();

        if let Some(&idx) = state.slots.get(&key) {
            state.order.node_mut(idx).value.1 = value;
            state.order.move_to_back(idx);
            return None;
        }

        let idx = state.order.push_back((key.clone(), value));
        state.slots.insert(key, idx);

        if state.order.len() > self.capacity {
            state.pop_oldest()
        } else {
            None
        }
    }

    /// Look up `key`, marking it most recently used on a hit.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut state = self.inner.lock();
        let idx = *state.slots.get(key)?;
        state.order.move_to_back(idx);
        Some(state.order.node_ref(idx).value.1.clone())
    }

    /// Remove `key` if present.
    pub fn remove(&self, key: &K) -> Option<V> {
        let mut state = self.inner.lock();
        let idx = state.slots.remove(key)?;
        Some(state.order.remove(idx).1)
    }

    /// Remove `key` only if `pred` accepts its current value.
    pub fn remove_if<F>(&self, key: &K, pred: F) -> Option<V>
    where
        F: FnOnce(&V) -> bool,
    {
        let mut state = self.inner.lock();
        let idx = *state.slots.get(key)?;
        if !pred(&state.order.node_ref(idx).value.1) {
            return None;
        }
        state.slots.remove(key);
        Some(state.order.remove(idx).1)
    }

    /// Remove and return the least recently used entry.
    pub fn remove_oldest(&self) -> Option<(K, V)> {
        self.inner.lock().pop_oldest()
    }

    /// Check membership without touching recency.
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.inner.lock().slots.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Keys from least to most recently used.
    #[must_use]
    pub fn keys_oldest_first(&self) -> Vec<K> {
        let state = self.inner.lock();
        state.order.iter().map(|(k, _)| k.clone()).collect()
    }
}

struct LruState<K, V> {
    slots: HashMap<K, SlotIdx>,
    order: SlabList<(K, V)>,
}

impl<K: Eq + Hash, V> LruState<K, V> {
    fn new() -> Self {
        Self {
            slots: HashMap::new(),
            order: SlabList::new(),
        }
    }

    fn pop_oldest(&mut self) -> Option<(K, V)> {
        let (key, value) = self.order.pop_front()?;
        self.slots.remove(&key);
        Some((key, value))
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Slab-backed doubly linked list
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SlotIdx(usize);

struct Node<T> {
    value: T,
    prev: Option<SlotIdx>,
    next: Option<SlotIdx>,
}

struct SlabList<T> {
    slots: Vec<Option<Node<T>>>,
    free: Vec<usize>,
    head: Option<SlotIdx>,
    tail: Option<SlotIdx>,
    len: usize,
}

impl<T> SlabList<T> {
    fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    fn len(&self) -> usize {
        self.len
    }

    fn push_back(&mut self, value: T) -> SlotIdx {
        let node = Node {
            value,
            prev: self.tail,
            next: None,
        };
        let idx = match self.free.pop() {
            Some(free) => {
                self.slots[free] = Some(node);
                SlotIdx(free)
            }
            None => {
                self.slots.push(Some(node));
                SlotIdx(self.slots.len() - 1)
            }
        };

        match self.tail {
            Some(old_tail) => self.node_mut(old_tail).next = Some(idx),
            None => self.head = Some(idx),
        }
        self.tail = Some(idx);
        self.len += 1;
        idx
    }

    fn pop_front(&mut self) -> Option<T> {
        let head = self.head?;
        Some(self.remove(head))
    }

    fn remove(&mut self, idx: SlotIdx) -> T {
        self.unlink(idx);
        let node = self.slots[idx.0].take().expect("slab slot already vacant");
        self.free.push(idx.0);
        self.len -= 1;
        node.value
    }

    fn move_to_back(&mut self, idx: SlotIdx) {
        if self.tail == Some(idx) {
            return;
        }
        self.unlink(idx);

        let old_tail = self.tail;
        {
            let node = self.node_mut(idx);
            node.prev = old_tail;
            node.next = None;
        }
        match old_tail {
            Some(t) => self.node_mut(t).next = Some(idx),
            None => self.head = Some(idx),
        }
        self.tail = Some(idx);
    }

    /// Detach a node from its neighbours, fixing head and tail.
    fn unlink(&mut self, idx: SlotIdx) {
        let (prev, next) = {
            let node = self.node_ref(idx);
            (node.prev, node.next)
        };
        match prev {
            Some(p) => self.node_mut(p).next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.node_mut(n).prev = prev,
            None => self.tail = prev,
        }
    }

    fn iter(&self) -> SlabIter<'_, T> {
        SlabIter {
            list: self,
            current: self.head,
        }
    }

    fn node_ref(&self, idx: SlotIdx) -> &Node<T> {
        self.slots[idx.0].as_ref().expect("dangling slab index")
    }

    fn node_mut(&mut self, idx: SlotIdx) -> &mut Node<T> {
        self.slots[idx.0].as_mut().expect("dangling slab index")
    }
}

struct SlabIter<'a, T> {
    list: &'a SlabList<T>,
    current: Option<SlotIdx>,
}

impl<'a, T> Iterator for SlabIter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.list.node_ref(self.current?);
        self.current = node.next;
        Some(&node.value)
    }
}
