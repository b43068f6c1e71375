//! Property-based tests for the LRU store.
//!
//! Drives `LruStore` with arbitrary operation sequences and checks it
//! against a reference model that tracks recency order in a `VecDeque`:
//! - Capacity bound: `size <= capacity` at all times
//! - Strict LRU eviction: overflow always removes the least-recently-used
//! - Promotion: a hit moves its key to most-recently-used
//! - Peek is non-promoting and uncounted
//! - Stats consistency: `hits + misses` equals counting lookups issued
//! - Clear resets size and counters but never capacity
//! - Unbounded mode never evicts

use std::collections::{HashMap, VecDeque};

use proptest::prelude::*;

use purefn::LruStore;

// ────────────────────────────────────────────────────────────────────
// Strategies
// ────────────────────────────────────────────────────────────────────

fn arb_capacity() -> impl Strategy<Value = usize> {
    1usize..=12
}

fn arb_key() -> impl Strategy<Value = u16> {
    0u16..24
}

/// A store operation for state-machine testing.
#[derive(Debug, Clone)]
enum Op {
    GetOrCompute(u16),
    Peek(u16),
    Clear,
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        8 => arb_key().prop_map(Op::GetOrCompute),
        3 => arb_key().prop_map(Op::Peek),
        1 => Just(Op::Clear),
    ]
}

fn arb_ops(max: usize) -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(arb_op(), 1..max)
}

/// The value a key memoizes to; any injective function works.
fn value_of(key: u16) -> u32 {
    u32::from(key) * 31 + 7
}

// ────────────────────────────────────────────────────────────────────
// Reference model (front = MRU, back = LRU)
// ────────────────────────────────────────────────────────────────────

struct RefModel {
    capacity: Option<usize>,
    order: VecDeque<u16>,
    map: HashMap<u16, u32>,
    hits: u64,
    misses: u64,
}

impl RefModel {
    fn new(capacity: Option<usize>) -> Self {
        Self {
            capacity,
            order: VecDeque::new(),
            map: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }

    fn promote(&mut self, key: u16) {
        if let Some(pos) = self.order.iter().position(|&k| k == key) {
            self.order.remove(pos);
        }
        self.order.push_front(key);
    }

    fn get_or_compute(&mut self, key: u16) -> u32 {
        if let Some(&v) = self.map.get(&key) {
            self.hits += 1;
            self.promote(key);
            return v;
        }
        self.misses += 1;
        let v = value_of(key);
        self.map.insert(key, v);
        self.order.push_front(key);
        if let Some(cap) = self.capacity
            && self.map.len() > cap
            && let Some(lru) = self.order.pop_back()
        {
            self.map.remove(&lru);
        }
        v
    }

    fn clear(&mut self) {
        self.order.clear();
        self.map.clear();
        self.hits = 0;
        self.misses = 0;
    }
}

fn run_ops(capacity: Option<usize>, ops: &[Op]) {
    let store: LruStore<u16, u32> = LruStore::new(capacity);
    let mut model = RefModel::new(capacity);

    for op in ops {
        match *op {
            Op::GetOrCompute(key) => {
                let got = store
                    .get_or_compute(key, || Ok::<_, ()>(value_of(key)))
                    .unwrap();
                let expected = model.get_or_compute(key);
                assert_eq!(got, expected);
            }
            Op::Peek(key) => {
                assert_eq!(store.peek(&key), model.map.get(&key).copied());
            }
            Op::Clear => {
                store.clear();
                model.clear();
            }
        }

        // Invariants after every step.
        let stats = store.stats();
        assert_eq!(stats.size, model.map.len());
        assert_eq!(stats.hits, model.hits);
        assert_eq!(stats.misses, model.misses);
        assert_eq!(stats.capacity, capacity);
        if let Some(cap) = capacity {
            assert!(stats.size <= cap, "size {} exceeds capacity {cap}", stats.size);
        }
        for &key in &model.order {
            assert_eq!(store.peek(&key), Some(value_of(key)), "model key {key} missing");
        }
    }
}

proptest! {
    #[test]
    fn bounded_store_matches_reference_model(
        capacity in arb_capacity(),
        ops in arb_ops(200),
    ) {
        run_ops(Some(capacity), &ops);
    }

    #[test]
    fn unbounded_store_matches_reference_model(ops in arb_ops(200)) {
        run_ops(None, &ops);
    }

    #[test]
    fn eviction_only_ever_removes_the_lru(
        capacity in arb_capacity(),
        keys in prop::collection::vec(arb_key(), 1..100),
    ) {
        let store: LruStore<u16, u32> = LruStore::new(Some(capacity));
        let mut model = RefModel::new(Some(capacity));
        for &key in &keys {
            let _ = store.get_or_compute(key, || Ok::<_, ()>(value_of(key)));
            let _ = model.get_or_compute(key);
            // Exactly the model's surviving keys are present.
            for candidate in 0u16..24 {
                let expected = model.map.contains_key(&candidate);
                prop_assert_eq!(
                    store.peek(&candidate).is_some(),
                    expected,
                    "key {} presence diverged",
                    candidate
                );
            }
        }
    }
}
