//! Forced-checking mode.
//!
//! While active on a thread, every checked wrapper invoked anywhere in that
//! thread's dynamic call tree performs its full replay verification,
//! regardless of any sampling schedule. Intended for tests: it trades
//! performance for maximal coverage, including functions transitively
//! invoked by the one under test.
//!
//! The state is a per-thread reentrant counter, not a shared boolean: one
//! thread entering or leaving a scope can never enable or disable checking
//! for another thread mid-scope, and nested activation on the same thread
//! composes safely.

use std::cell::Cell;
use std::marker::PhantomData;

thread_local! {
    static DEPTH: Cell<u64> = const { Cell::new(0) };
}

/// True iff forced checking is active on the calling thread.
#[must_use]
pub fn active() -> bool {
    DEPTH.with(|depth| depth.get() > 0)
}

/// Scoped activation of forced checking. Dropping the guard exits the scope;
/// the counter never underflows.
///
/// The guard is `!Send`: it must be dropped on the thread that created it,
/// because the scope it controls is that thread's.
#[must_use = "forced checking is only active while the guard is alive"]
#[derive(Debug)]
pub struct CheckingGuard {
    _not_send: PhantomData<*const ()>,
}

/// Enable forced checking for the calling thread until the returned guard
/// is dropped. Nesting is safe.
pub fn checking() -> CheckingGuard {
    DEPTH.with(|depth| depth.set(depth.get().saturating_add(1)));
    CheckingGuard {
        _not_send: PhantomData,
    }
}

impl Drop for CheckingGuard {
    fn drop(&mut self) {
        DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// Run `f` with forced checking active — the wrapping form of [`checking`].
pub fn checked<T>(f: impl FnOnce() -> T) -> T {
    let _guard = checking();
    f()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn inactive_by_default() {
        assert!(!active());
    }

    #[test]
    fn guard_scopes_activation() {
        {
            let _guard = checking();
            assert!(active());
        }
        assert!(!active());
    }

    #[test]
    fn nesting_is_reentrant() {
        let _outer = checking();
        {
            let _inner = checking();
            assert!(active());
        }
        assert!(active(), "dropping the inner guard must not end the outer scope");
    }

    #[test]
    fn checked_wraps_a_call() {
        assert!(!active());
        let observed = checked(active);
        assert!(observed);
        assert!(!active());
    }

    #[test]
    fn activation_is_thread_local() {
        let _guard = checking();
        assert!(active());
        let other = thread::spawn(active).join().unwrap();
        assert!(!other, "another thread must not observe this thread's scope");
    }

    #[test]
    fn out_of_order_drops_do_not_underflow() {
        let a = checking();
        let b = checking();
        drop(a);
        assert!(active());
        drop(b);
        assert!(!active());
    }
}
