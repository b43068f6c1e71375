//! Process-wide flush registry.
//!
//! Long-lived processes accumulate memoized results for dead call patterns
//! indefinitely when a store is unbounded. The original host piggy-backed
//! eviction on the runtime's garbage-collection cycle; Rust has no
//! collector, so the registry exposes the prescribed fallback: an explicit
//! [`flush_all`] entry point for the host's own memory-pressure signal.
//!
//! ## Design
//!
//! - The registry holds **weak** references. A store that becomes otherwise
//!   unreachable is dropped normally; its slot is pruned on the next
//!   [`flush_all`].
//! - The registry lock excludes only registry mutation, never store access:
//!   live targets are snapshotted under the lock and flushed outside it, so
//!   [`flush_all`] is reentrancy-safe and never blocks store users.
//! - A panicking store is contained per-store; one misbehaving store cannot
//!   prevent the others from flushing.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::lru::LruStore;

/// A cache that can be flushed by the process-wide registry.
pub trait Flush: Send + Sync {
    /// Drop all cached entries.
    fn flush(&self);
}

impl<K, V> Flush for LruStore<K, V>
where
    K: Send + 'static,
    V: Send + 'static,
{
    fn flush(&self) {
        self.clear();
    }
}

static REGISTRY: Mutex<Vec<Weak<dyn Flush>>> = Mutex::new(Vec::new());

/// Register a store for memory-pressure flushing. The registry keeps only a
/// weak reference and never extends the store's lifetime.
pub fn register<T: Flush + 'static>(store: &Arc<T>) {
    let weak = Arc::downgrade(store) as Weak<dyn Flush>;
    REGISTRY.lock().push(weak);
}

/// Flush every live registered store. Idempotent; callable from any thread,
/// including from within a store's own compute path. Dead registrations are
/// pruned as a side effect.
pub fn flush_all() {
    let targets: Vec<Arc<dyn Flush>> = {
        let mut registry = REGISTRY.lock();
        registry.retain(|weak| weak.strong_count() > 0);
        registry.iter().filter_map(Weak::upgrade).collect()
    };
    for target in targets {
        // Contain a panicking store so the remaining stores still flush.
        let _ = catch_unwind(AssertUnwindSafe(|| target.flush()));
    }
}

/// Number of live registrations (dead slots are pruned first).
#[must_use]
pub fn registered_count() -> usize {
    let mut registry = REGISTRY.lock();
    registry.retain(|weak| weak.strong_count() > 0);
    registry.len()
}

/// Serializes unit tests that mutate the process-global registry. Tests in
/// other modules that register stores or call [`flush_all`] take this lock
/// too, so registration counts stay coherent under the parallel test runner.
#[cfg(test)]
pub(crate) static FLUSH_TEST_LOCK: Mutex<()> = Mutex::new(());

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
