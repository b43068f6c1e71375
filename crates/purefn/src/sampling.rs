//! Exponential-backoff check scheduling.
//!
//! Verification without memoization costs a multiple of the wrapped
//! function's branching factor, so checking every production call is not
//! viable. [`PureSampling`] spaces checks geometrically: the call index of
//! the next check is `base ^ checks_performed`, which bounds total
//! verification to `O(log(calls))` checks while still probabilistically
//! catching drift. `base == 1` degenerates to checking every call.
//!
//! Counters are per-thread (one thread's schedule never suppresses checks
//! on another), and forced checking ([`crate::mode`]) always verifies
//! without consuming the schedule.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;

use crate::checker::{PureCheck, next_wrapper_id};
use crate::error::NotPureError;
use crate::key::CallArgs;
use crate::mode;

/// Default exponential base for the check schedule.
pub const DEFAULT_BASE: u64 = 2;

#[derive(Debug, Default, Clone, Copy)]
struct SamplingCounter {
    calls_seen: u64,
    checks_performed: u64,
}

thread_local! {
    /// Per-thread counters, keyed by wrapper id.
    static COUNTERS: RefCell<HashMap<u64, SamplingCounter>> = RefCell::new(HashMap::new());
}

/// A purity checker driven by an exponential sampling schedule.
pub struct PureSampling<A, R, F> {
    id: u64,
    checker: PureCheck<A, R, F>,
    base: u64,
}

impl<A, R, F> fmt::Debug for PureSampling<A, R, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PureSampling")
            .field("base", &self.base)
            .field("checker", &self.checker)
            .finish()
    }
}

impl<A, R, F> PureSampling<A, R, F>
where
    A: CallArgs,
    R: Clone + PartialEq + fmt::Debug,
    F: Fn(&A) -> R,
{
    /// Wrap `func` with a sampled purity check. A `base` below 1 is treated
    /// as 1 (check every call).
    pub fn new(function: &'static str, func: F, base: u64) -> Self {
        Self::with_typed(function, func, base, false)
    }

    /// Like [`PureSampling::new`], with type-partitioned history keys.
    pub fn with_typed(function: &'static str, func: F, base: u64, typed: bool) -> Self {
        Self {
            id: next_wrapper_id(),
            checker: PureCheck::with_typed(function, func, typed),
            base: base.max(1),
        }
    }

    /// Name the function was wrapped under.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.checker.name()
    }

    /// Sanitized exponential base.
    #[must_use]
    pub fn base(&self) -> u64 {
        self.base
    }

    /// The underlying checker.
    pub fn checker(&self) -> &PureCheck<A, R, F> {
        &self.checker
    }

    /// The unwrapped original function.
    pub fn inner(&self) -> &F {
        self.checker.inner()
    }

    /// Call the wrapped function, verifying when the schedule fires or when
    /// forced checking is active. Off-schedule calls skip straight to the
    /// raw function: no recording, no replay, no history cost.
    pub fn call(&self, args: A) -> Result<R, NotPureError> {
        if mode::active() {
            // Forced checks do not consume the sampling schedule.
            return self.checker.call_checked(args, true);
        }
        if self.schedule_fires() {
            self.checker.call_checked(args, true)
        } else {
            Ok(self.checker.call_raw(&args))
        }
    }

    /// Advance this thread's counter; true when this call is to be checked.
    fn schedule_fires(&self) -> bool {
        COUNTERS.with(|counters| {
            let mut counters = counters.borrow_mut();
            let counter = counters.entry(self.id).or_default();
            counter.calls_seen = counter.calls_seen.saturating_add(1);
            let exponent = u32::try_from(counter.checks_performed).unwrap_or(u32::MAX);
            let threshold = self.base.saturating_pow(exponent);
            if counter.calls_seen >= threshold {
                counter.checks_performed = counter.checks_performed.saturating_add(1);
                true
            } else {
                false
            }
        })
    }

    /// Checks performed on the calling thread so far.
    #[must_use]
    pub fn checks_performed(&self) -> u64 {
        COUNTERS.with(|counters| {
            counters
                .borrow()
                .get(&self.id)
                .map_or(0, |counter| counter.checks_performed)
        })
    }

    /// Calls observed by the schedule on the calling thread so far. Forced
    /// (check-mode) calls bypass the schedule and are not counted.
    #[must_use]
    pub fn calls_seen(&self) -> u64 {
        COUNTERS.with(|counters| {
            counters
                .borrow()
                .get(&self.id)
                .map_or(0, |counter| counter.calls_seen)
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
