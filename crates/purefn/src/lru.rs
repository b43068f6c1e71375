//! Bounded least-recently-used store with hit/miss statistics.
//!
//! ## Design
//!
//! - **Entries**: `HashMap<K, CacheEntry<V>>` where each entry carries a
//!   recency ordinal, plus a `BTreeMap<u64, K>` recency index ordered
//!   oldest-first. Ordinals strictly increase on every access (read or
//!   write), so LRU order has no ties and insertion order is the natural
//!   tie-break of a monotone counter.
//!
//! - **Locking**: one `parking_lot::Mutex` around both maps. A single
//!   logical update (promote-and-possibly-evict) is atomic. The lock is
//!   never held across user code: [`LruStore::get_or_compute`] releases it
//!   before invoking `compute`, which may take unbounded time or re-enter
//!   this store.
//!
//! - **Capacity**: `None` disables eviction and the store grows without
//!   bound. That is a documented, intentional opt-out of LRU behavior for
//!   callers that rely solely on the process-wide flush registry.

use std::collections::{BTreeMap, HashMap, hash_map::Entry};
use std::hash::Hash;

use parking_lot::Mutex;
use serde::Serialize;

/// Default entry bound for wrapped-function caches.
pub const DEFAULT_CAPACITY: usize = 128;

/// Immutable statistics snapshot. Taking one has no side effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Lookups answered from the store.
    pub hits: u64,
    /// Lookups that fell through to a compute.
    pub misses: u64,
    /// Entry bound; `None` means unbounded.
    pub capacity: Option<usize>,
    /// Current entry count.
    pub size: usize,
}

#[derive(Debug)]
struct CacheEntry<V> {
    value: V,
    recency: u64,
}

#[derive(Debug)]
struct StoreInner<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    /// recency ordinal -> key, ordered oldest-first.
    by_recency: BTreeMap<u64, K>,
    next_recency: u64,
    hits: u64,
    misses: u64,
}

/// Generic bounded key-value store with strict LRU eviction.
#[derive(Debug)]
pub struct LruStore<K, V> {
    capacity: Option<usize>,
    inner: Mutex<StoreInner<K, V>>,
}

impl<K, V> LruStore<K, V> {
    /// Create an empty store. `None` capacity disables eviction.
    #[must_use]
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            capacity,
            inner: Mutex::new(StoreInner {
                entries: HashMap::new(),
                by_recency: BTreeMap::new(),
                next_recency: 0,
                hits: 0,
                misses: 0,
            }),
        }
    }

    /// Entry bound, if any.
    #[must_use]
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Current entry count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// True if the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all entries and reset hit/miss counters. Capacity is retained,
    /// and recency ordinals stay monotone across clears.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.by_recency.clear();
        inner.hits = 0;
        inner.misses = 0;
    }

    /// Side-effect-free statistics snapshot.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            capacity: self.capacity,
            size: inner.entries.len(),
        }
    }
}

impl<K, V> LruStore<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    /// Counting, promoting read. A hit bumps the entry to most-recently-used
    /// and increments `hits`; an absent key increments `misses`.
    pub fn lookup(&self, key: &K) -> Option<V> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        match inner.entries.get_mut(key) {
            Some(entry) => {
                let moved = inner.by_recency.remove(&entry.recency);
                debug_assert!(moved.is_some(), "recency index out of sync");
                entry.recency = inner.next_recency;
                inner.next_recency += 1;
                if let Some(k) = moved {
                    inner.by_recency.insert(entry.recency, k);
                }
                inner.hits += 1;
                Some(entry.value.clone())
            }
            None => {
                inner.misses += 1;
                None
            }
        }
    }

    /// Non-promoting, non-counting read. Used for introspection and tests;
    /// does not disturb recency order or statistics.
    #[must_use]
    pub fn peek(&self, key: &K) -> Option<V> {
        self.inner
            .lock()
            .entries
            .get(key)
            .map(|entry| entry.value.clone())
    }

    /// Insert as most-recently-used, evicting exactly the least-recently-used
    /// entry when the capacity bound is exceeded. An existing key is
    /// overwritten and promoted.
    pub fn insert(&self, key: K, value: V) {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let recency = inner.next_recency;
        inner.next_recency += 1;
        match inner.entries.entry(key.clone()) {
            Entry::Occupied(mut occupied) => {
                let old = occupied.get().recency;
                inner.by_recency.remove(&old);
                occupied.insert(CacheEntry { value, recency });
                inner.by_recency.insert(recency, key);
            }
            Entry::Vacant(vacant) => {
                vacant.insert(CacheEntry { value, recency });
                inner.by_recency.insert(recency, key);
                if let Some(cap) = self.capacity
                    && inner.entries.len() > cap
                    && let Some((_, victim)) = inner.by_recency.pop_first()
                {
                    inner.entries.remove(&victim);
                }
            }
        }
    }

    /// Return the cached value for `key`, or invoke `compute`, store its
    /// result, and return it. `compute` runs with no lock held and is called
    /// at most once per invocation; an `Err` caches nothing.
    pub fn get_or_compute<E>(
        &self,
        key: K,
        compute: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        if let Some(value) = self.lookup(&key) {
            return Ok(value);
        }
        let value = compute()?;
        self.insert(key, value.clone());
        Ok(value)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn ok<V>(v: V) -> impl FnOnce() -> Result<V, ()> {
        move || Ok(v)
    }

    #[test]
    fn miss_then_hit() {
        let store: LruStore<u64, u64> = LruStore::new(Some(4));
        assert_eq!(store.get_or_compute(1, ok(10)), Ok(10));
        assert_eq!(store.get_or_compute(1, ok(99)), Ok(10), "hit must not recompute");
        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.size, 1);
        assert_eq!(stats.capacity, Some(4));
    }

    #[test]
    fn capacity_plus_one_evicts_least_recently_used() {
        for cap in [1usize, 2, 3, 8] {
            let store: LruStore<usize, usize> = LruStore::new(Some(cap));
            for k in 0..=cap {
                let _ = store.get_or_compute(k, || Ok::<_, ()>(k * 10));
            }
            assert_eq!(store.len(), cap);
            assert_eq!(store.peek(&0), None, "cap {cap}: oldest key must be evicted");
            for k in 1..=cap {
                assert_eq!(store.peek(&k), Some(k * 10), "cap {cap}: key {k} must survive");
            }
        }
    }

    #[test]
    fn hit_promotes_and_prevents_eviction() {
        let store: LruStore<u32, u32> = LruStore::new(Some(2));
        store.insert(1, 1);
        store.insert(2, 2);
        // Touch the oldest key, then overflow: key 2 is now the LRU victim.
        assert_eq!(store.lookup(&1), Some(1));
        store.insert(3, 3);
        assert_eq!(store.peek(&1), Some(1));
        assert_eq!(store.peek(&2), None);
        assert_eq!(store.peek(&3), Some(3));
    }

    #[test]
    fn overwrite_promotes_existing_key() {
        let store: LruStore<u32, u32> = LruStore::new(Some(2));
        store.insert(1, 1);
        store.insert(2, 2);
        store.insert(1, 100);
        store.insert(3, 3);
        assert_eq!(store.peek(&1), Some(100), "overwritten key was promoted");
        assert_eq!(store.peek(&2), None, "key 2 became the LRU victim");
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn peek_does_not_promote_or_count() {
        let store: LruStore<u32, u32> = LruStore::new(Some(2));
        store.insert(1, 1);
        store.insert(2, 2);
        assert_eq!(store.peek(&1), Some(1));
        let stats = store.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        // Peek did not promote key 1, so it is still the eviction victim.
        store.insert(3, 3);
        assert_eq!(store.peek(&1), None);
    }

    #[test]
    fn clear_resets_counters_but_not_capacity() {
        let store: LruStore<u32, u32> = LruStore::new(Some(3));
        let _ = store.get_or_compute(1, ok(1));
        let _ = store.get_or_compute(1, ok(1));
        store.clear();
        let stats = store.stats();
        assert_eq!(stats.size, 0);
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.capacity, Some(3));
    }

    #[test]
    fn unbounded_store_never_evicts() {
        let store: LruStore<u32, u32> = LruStore::new(None);
        for k in 0..1000 {
            store.insert(k, k);
        }
        assert_eq!(store.len(), 1000);
        assert_eq!(store.peek(&0), Some(0));
    }

    #[test]
    fn zero_capacity_stores_nothing() {
        let store: LruStore<u32, u32> = LruStore::new(Some(0));
        assert_eq!(store.get_or_compute(1, ok(1)), Ok(1));
        assert_eq!(store.len(), 0);
        assert_eq!(store.stats().misses, 1);
    }

    #[test]
    fn failed_compute_caches_nothing() {
        let store: LruStore<u32, u32> = LruStore::new(Some(4));
        let result: Result<u32, &str> = store.get_or_compute(1, || Err("boom"));
        assert_eq!(result, Err("boom"));
        assert_eq!(store.len(), 0);
        // The failed lookup still counts as a miss.
        assert_eq!(store.stats().misses, 1);
    }

    #[test]
    fn compute_may_reenter_the_store() {
        // get_or_compute must not hold the lock across compute.
        let store: Arc<LruStore<u32, u32>> = Arc::new(LruStore::new(Some(8)));
        let inner = Arc::clone(&store);
        let result = store.get_or_compute(1, move || inner.get_or_compute(2, || Ok::<_, ()>(20)));
        assert_eq!(result, Ok(20));
        assert_eq!(store.peek(&2), Some(20));
        assert_eq!(store.peek(&1), Some(20));
    }

    #[test]
    fn concurrent_access_respects_capacity() {
        let store: Arc<LruStore<u64, u64>> = Arc::new(LruStore::new(Some(16)));
        let mut handles = Vec::new();
        for t in 0..4u64 {
            let store = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                for i in 0..200 {
                    let k = t * 1000 + (i % 32);
                    let _ = store.get_or_compute(k, || Ok::<_, ()>(k));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(store.len() <= 16);
        let stats = store.stats();
        assert_eq!(stats.hits + stats.misses, 800);
    }

    #[test]
    fn stats_snapshot_serializes() {
        let store: LruStore<u32, u32> = LruStore::new(Some(2));
        let _ = store.get_or_compute(1, ok(1));
        let json = serde_json::to_value(store.stats()).unwrap();
        assert_eq!(json["misses"], 1);
        assert_eq!(json["capacity"], 2);
        assert_eq!(json["size"], 1);
    }
}
