//! Memoizing wrapper and composition seam.
//!
//! [`Memoized`] puts a bounded LRU store in front of a callable. The
//! composition order is a hard contract, not a convention: the purity
//! checker receives the raw function directly, and the cache wraps the
//! checker. Cache hits therefore bypass verification entirely —
//! verification only ever observes cache misses. The reverse nesting
//! (checker over cache) would replay cached values against cached values
//! and verify nothing.
//!
//! Plain functions participate through the [`RawFn`] adapter, so the same
//! wrapper serves `cache(raw)`, `cache(check(raw))`, and
//! `cache(sample(raw))` stacks.

use std::fmt;
use std::sync::Arc;

use crate::checker::PureCheck;
use crate::error::NotPureError;
use crate::key::{CallArgs, SignatureKey};
use crate::lru::{CacheStats, DEFAULT_CAPACITY, LruStore};
use crate::registry;
use crate::sampling::PureSampling;

/// Configuration for a memoizing wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Entry bound; `None` disables eviction entirely.
    pub capacity: Option<usize>,
    /// Partition keys by argument type.
    pub typed: bool,
    /// Register the store with the process-wide flush registry so it is
    /// cleared by [`registry::flush_all`]. When false the store is never
    /// flushed by memory-pressure signals.
    pub flush_on_pressure: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: Some(DEFAULT_CAPACITY),
            typed: false,
            flush_on_pressure: true,
        }
    }
}

/// A callable that a [`Memoized`] wrapper can delegate misses to.
pub trait CheckedFn<A, R> {
    /// Name the function was wrapped under.
    fn name(&self) -> &'static str;
    /// Execute for `args`, verifying purity if this layer does so.
    fn invoke(&self, args: A) -> Result<R, NotPureError>;
}

impl<A, R, F> CheckedFn<A, R> for PureCheck<A, R, F>
where
    A: CallArgs,
    R: Clone + PartialEq + fmt::Debug,
    F: Fn(&A) -> R,
{
    fn name(&self) -> &'static str {
        self.name()
    }

    fn invoke(&self, args: A) -> Result<R, NotPureError> {
        self.call(args)
    }
}

impl<A, R, F> CheckedFn<A, R> for PureSampling<A, R, F>
where
    A: CallArgs,
    R: Clone + PartialEq + fmt::Debug,
    F: Fn(&A) -> R,
{
    fn name(&self) -> &'static str {
        self.name()
    }

    fn invoke(&self, args: A) -> Result<R, NotPureError> {
        self.call(args)
    }
}

/// Adapter for memoizing a plain function with no purity checking.
#[derive(Debug, Clone)]
pub struct RawFn<F> {
    name: &'static str,
    func: F,
}

/// Wrap a plain function for use with [`Memoized`].
pub fn raw_fn<F>(name: &'static str, func: F) -> RawFn<F> {
    RawFn { name, func }
}

impl<A, R, F> CheckedFn<A, R> for RawFn<F>
where
    F: Fn(&A) -> R,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn invoke(&self, args: A) -> Result<R, NotPureError> {
        Ok((self.func)(&args))
    }
}

/// A callable fronted by a bounded, pressure-flushed LRU store.
pub struct Memoized<A: CallArgs, R, W> {
    inner: W,
    store: Arc<LruStore<SignatureKey<A>, R>>,
    typed: bool,
}

impl<A: CallArgs, R, W: fmt::Debug> fmt::Debug for Memoized<A, R, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memoized")
            .field("inner", &self.inner)
            .field("typed", &self.typed)
            .field("stats", &self.store.stats())
            .finish()
    }
}

impl<A, R, W> Memoized<A, R, W>
where
    A: CallArgs,
    R: Clone + Send + 'static,
    W: CheckedFn<A, R>,
{
    /// Front `inner` with a fresh store per `config`.
    pub fn new(inner: W, config: &CacheConfig) -> Self {
        let store = Arc::new(LruStore::new(config.capacity));
        if config.flush_on_pressure {
            registry::register(&store);
        }
        Self {
            inner,
            store,
            typed: config.typed,
        }
    }

    /// Name the function was wrapped under.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.inner.name()
    }

    /// Call through the cache; misses delegate to the wrapped layer.
    pub fn call(&self, args: A) -> Result<R, NotPureError> {
        let key = SignatureKey::new(args.clone(), self.typed);
        self.store.get_or_compute(key, || self.inner.invoke(args))
    }

    /// Side-effect-free cache statistics snapshot.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.store.stats()
    }

    /// Drop all cached entries and reset hit/miss counters.
    pub fn clear(&self) {
        self.store.clear();
    }

    /// The wrapped layer (checker, scheduler, or raw adapter).
    pub fn inner(&self) -> &W {
        &self.inner
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
