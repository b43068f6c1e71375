//! Runtime purity verification and pressure-flushed memoization.
//!
//! Whether a function is pure cannot be decided statically for arbitrary
//! code, so this crate checks it at run time: a wrapped function is
//! occasionally re-executed against a bounded history of its own recent
//! calls, and a diverging output surfaces as [`NotPureError`]. A bounded
//! LRU cache rides on the same call-key machinery and is flushed
//! process-wide by an explicit memory-pressure signal.
//!
//! ## Layers
//!
//! - [`PureCheck`] — executes, records into a 3-entry history, and (when
//!   checking is requested) replays prior calls and compares outputs.
//!   A per-thread recursion guard keeps recursive functions from spawning
//!   replays inside replays.
//! - [`PureSampling`] — schedules checks exponentially (`base ^ checks`),
//!   bounding verification to `O(log(calls))` checks in production.
//! - [`Memoized`] — bounded LRU memoization over any of the layers below
//!   it. The cache always wraps the checker, never the reverse, so cache
//!   hits bypass verification.
//! - [`mode`] — per-thread forced checking for tests: everything invoked
//!   in the guarded dynamic extent is fully verified.
//! - [`registry`] — process-wide weak registry of live caches;
//!   [`registry::flush_all`] is the hook for a host's memory-pressure
//!   signal.
//!
//! ## Example
//!
//! ```
//! use purefn::{CacheConfig, Memoized, raw_fn};
//!
//! let square = Memoized::new(raw_fn("square", |x: &u64| x * x), &CacheConfig::default());
//! assert_eq!(square.call(7).unwrap(), 49);
//! assert_eq!(square.call(7).unwrap(), 49);
//! let stats = square.stats();
//! assert_eq!((stats.hits, stats.misses), (1, 1));
//! ```
//!
//! Arguments must be `Clone + Eq + Hash + Debug + Send + 'static` (the
//! [`CallArgs`] contract). Deep immutability is not enforced; arguments
//! that mutate behind the key's back show up as purity failures, not as
//! cache corruption.

pub mod checker;
pub mod error;
pub mod history;
pub mod key;
pub mod lru;
pub mod memo;
pub mod mode;
pub mod registry;
pub mod sampling;

pub use checker::PureCheck;
pub use error::NotPureError;
pub use history::{CallHistory, HISTORY_CAPACITY};
pub use key::{CallArgs, SignatureKey};
pub use lru::{CacheStats, DEFAULT_CAPACITY, LruStore};
pub use memo::{CacheConfig, CheckedFn, Memoized, RawFn, raw_fn};
pub use mode::{CheckingGuard, checked, checking};
pub use sampling::{DEFAULT_BASE, PureSampling};
