//! Replay-based purity verification.
//!
//! [`PureCheck`] wraps a function and, on checked calls, replays a random
//! subset of its recent history and compares outputs structurally. A
//! mismatch means the function depends on hidden state and surfaces as
//! [`NotPureError`]; the caller always receives the result of the single
//! primary execution, never a replay result.
//!
//! ## State machine
//!
//! Per (wrapper, thread) the checker is either NORMAL or VERIFYING:
//!
//! - VERIFYING engaged: the call executes the raw function once, records
//!   nothing, replays nothing. This is the recursion guard — a recursive
//!   function re-entering its own wrapper during a replay must not spawn
//!   further replays, or verification cost explodes exponentially.
//! - NORMAL: execute the raw function, record `(key, output)` into the
//!   history, and, iff checking is requested for this call, engage
//!   VERIFYING and replay up to [`HISTORY_CAPACITY`] prior calls.
//!
//! The guard is engaged through an RAII handle, so it disengages on
//! mismatch returns and on unwinds from the wrapped function alike.

use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::NotPureError;
use crate::history::{CallHistory, HISTORY_CAPACITY};
use crate::key::{CallArgs, SignatureKey};
use crate::mode;

/// Process-wide wrapper identity, used to key per-thread state.
static NEXT_WRAPPER_ID: AtomicU64 = AtomicU64::new(0);

pub(crate) fn next_wrapper_id() -> u64 {
    NEXT_WRAPPER_ID.fetch_add(1, Ordering::Relaxed)
}

thread_local! {
    /// Wrapper ids currently inside a verification replay on this thread.
    static VERIFYING: RefCell<HashSet<u64>> = RefCell::new(HashSet::new());
}

/// RAII recursion guard for one wrapper on the current thread.
struct ReplayGuard {
    id: u64,
}

impl ReplayGuard {
    fn engaged(id: u64) -> bool {
        VERIFYING.with(|set| set.borrow().contains(&id))
    }

    fn engage(id: u64) -> Self {
        VERIFYING.with(|set| set.borrow_mut().insert(id));
        Self { id }
    }
}

impl Drop for ReplayGuard {
    fn drop(&mut self) {
        VERIFYING.with(|set| {
            set.borrow_mut().remove(&self.id);
        });
    }
}

/// A function wrapped for runtime purity verification.
///
/// Standalone, a `PureCheck` verifies only while forced checking
/// ([`mode::checking`]) is active on the calling thread; otherwise it
/// executes and records with no replay cost. Compose with
/// [`PureSampling`](crate::sampling::PureSampling) for production-grade
/// sampled verification, and with [`Memoized`](crate::memo::Memoized) for
/// caching (the cache must wrap the checker, never the reverse).
pub struct PureCheck<A, R, F> {
    id: u64,
    function: &'static str,
    func: F,
    typed: bool,
    history: CallHistory<SignatureKey<A>, R>,
}

impl<A, R, F> fmt::Debug for PureCheck<A, R, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PureCheck")
            .field("function", &self.function)
            .field("typed", &self.typed)
            .finish_non_exhaustive()
    }
}

impl<A, R, F> PureCheck<A, R, F>
where
    A: CallArgs,
    R: Clone + PartialEq + fmt::Debug,
    F: Fn(&A) -> R,
{
    /// Wrap `func` under `function` as its reported name.
    pub fn new(function: &'static str, func: F) -> Self {
        Self::with_typed(function, func, false)
    }

    /// Like [`PureCheck::new`], with type-partitioned history keys.
    pub fn with_typed(function: &'static str, func: F, typed: bool) -> Self {
        Self {
            id: next_wrapper_id(),
            function,
            func,
            typed,
            history: CallHistory::new(),
        }
    }

    /// Name the function was wrapped under.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.function
    }

    /// The unwrapped original function.
    pub fn inner(&self) -> &F {
        &self.func
    }

    /// Call the wrapped function, verifying iff forced checking is active
    /// on this thread.
    pub fn call(&self, args: A) -> Result<R, NotPureError> {
        self.call_checked(args, mode::active())
    }

    /// Execute the raw function with no recording and no replay. Used by the
    /// sampling scheduler for calls outside the check schedule.
    pub(crate) fn call_raw(&self, args: &A) -> R {
        (self.func)(args)
    }

    /// One transition of the checker state machine.
    pub(crate) fn call_checked(&self, args: A, check: bool) -> Result<R, NotPureError> {
        if ReplayGuard::engaged(self.id) {
            // Nested call during a replay: raw execution only.
            return Ok((self.func)(&args));
        }

        let primary = (self.func)(&args);
        let key = SignatureKey::new(args, self.typed);
        self.history.record(key, primary.clone());

        if !check {
            return Ok(primary);
        }

        let guard = ReplayGuard::engage(self.id);
        for (key, expected) in self.history.sample_prior(HISTORY_CAPACITY) {
            let actual = (self.func)(key.args());
            if actual != expected {
                return Err(NotPureError::new(
                    self.function,
                    key.args(),
                    &expected,
                    &actual,
                ));
            }
        }
        drop(guard);
        Ok(primary)
    }

    /// Entries currently held in this wrapper's history.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
