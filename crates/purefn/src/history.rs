//! Bounded per-wrapper call history.
//!
//! A fixed-capacity ring of `(key, output)` pairs holding the most recent
//! [`HISTORY_CAPACITY`] recorded calls in arrival order, overwriting the
//! oldest on overflow. Sampling returns entries in a shuffled order that is
//! deliberately uncorrelated with recency, so state that depends on call
//! ordering (rather than call count alone) is still caught by replay.
//!
//! The ring mutates only under its own lock; sampling clones a snapshot and
//! shuffles outside the lock, so replay execution never runs under it.

use parking_lot::Mutex;
use rand::seq::{SliceRandom, index};

/// Ring capacity: replay verification looks at most this far back.
pub const HISTORY_CAPACITY: usize = 3;

#[derive(Debug)]
struct Ring<K, R> {
    entries: Vec<(K, R)>,
    /// Overwrite position once the ring is full; always the oldest entry.
    cursor: usize,
}

impl<K, R> Ring<K, R> {
    /// Index of the most recently recorded entry, if any.
    fn newest(&self) -> Option<usize> {
        if self.entries.is_empty() {
            None
        } else if self.entries.len() < HISTORY_CAPACITY {
            Some(self.entries.len() - 1)
        } else {
            Some((self.cursor + HISTORY_CAPACITY - 1) % HISTORY_CAPACITY)
        }
    }
}

/// Bounded ring buffer of recent `(key, output)` pairs.
#[derive(Debug)]
pub struct CallHistory<K, R> {
    inner: Mutex<Ring<K, R>>,
}

impl<K, R> Default for CallHistory<K, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, R> CallHistory<K, R> {
    /// Create an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Ring {
                entries: Vec::with_capacity(HISTORY_CAPACITY),
                cursor: 0,
            }),
        }
    }

    /// Number of entries currently held (at most [`HISTORY_CAPACITY`]).
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// True if nothing has been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a call, overwriting the oldest entry once the ring is full.
    pub fn record(&self, key: K, output: R) {
        let mut ring = self.inner.lock();
        if ring.entries.len() < HISTORY_CAPACITY {
            ring.entries.push((key, output));
        } else {
            let slot = ring.cursor;
            ring.entries[slot] = (key, output);
            ring.cursor = (slot + 1) % HISTORY_CAPACITY;
        }
    }
}

impl<K, R> CallHistory<K, R>
where
    K: Clone,
    R: Clone,
{
    /// Up to `n` entries chosen without replacement, in shuffled order.
    #[must_use]
    pub fn sample(&self, n: usize) -> Vec<(K, R)> {
        let snapshot = self.inner.lock().entries.clone();
        pick(snapshot, n)
    }

    /// Like [`CallHistory::sample`], but never yields the most recently
    /// recorded entry. The checker records a call before replaying, and a
    /// call must not replay itself.
    #[must_use]
    pub fn sample_prior(&self, n: usize) -> Vec<(K, R)> {
        let snapshot = {
            let ring = self.inner.lock();
            let newest = ring.newest();
            ring.entries
                .iter()
                .enumerate()
                .filter(|(i, _)| Some(*i) != newest)
                .map(|(_, pair)| pair.clone())
                .collect::<Vec<_>>()
        };
        pick(snapshot, n)
    }
}

fn pick<T>(pool: Vec<T>, n: usize) -> Vec<T> {
    let mut rng = rand::rng();
    let take = n.min(pool.len());
    let chosen = index::sample(&mut rng, pool.len(), take);
    let mut keep: Vec<Option<T>> = pool.into_iter().map(Some).collect();
    let mut out: Vec<T> = chosen
        .iter()
        .filter_map(|i| keep[i].take())
        .collect();
    out.shuffle(&mut rng);
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
