//! Call-signature keys.
//!
//! A [`SignatureKey`] derives a hashable, equality-comparable key from the
//! full argument tuple of a call. Two keys are equal iff the arguments
//! compare equal under `Eq` and, when the wrapper is `typed`, the argument
//! type matches as well.
//!
//! Hashability is a compile-time contract here: anything used as call
//! arguments must satisfy [`CallArgs`], so an unhashable argument is a type
//! error rather than a runtime failure.

use std::any::TypeId;
use std::fmt;
use std::hash::Hash;

/// Contract on the argument tuple of a wrapped function.
///
/// `Clone` because arguments are retained in history/cache keys and re-fed
/// to the raw function on replay; `Eq + Hash` for key identity; `Debug` for
/// error reporting; `Send + 'static` so stores holding keys can be shared
/// with the process-wide flush registry.
///
/// Deep immutability is deliberately NOT enforced. Arguments with interior
/// mutability that change between record and replay surface as purity
/// failures, which is the observable contract violation they are.
pub trait CallArgs: Clone + Eq + Hash + fmt::Debug + Send + 'static {}

impl<T: Clone + Eq + Hash + fmt::Debug + Send + 'static> CallArgs for T {}

/// Order-stable, hashable key for one call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SignatureKey<A> {
    args: A,
    /// Present only for typed wrappers. Within a single monomorphic wrapper
    /// the tag is constant; it partitions keys when one key type is shared
    /// across erased argument types.
    type_tag: Option<TypeId>,
}

impl<A: CallArgs> SignatureKey<A> {
    /// Derive a key from a call's arguments.
    #[must_use]
    pub fn new(args: A, typed: bool) -> Self {
        Self {
            args,
            type_tag: typed.then(TypeId::of::<A>),
        }
    }

    /// The original arguments, for replay.
    #[must_use]
    pub fn args(&self) -> &A {
        &self.args
    }

    /// True if this key carries a type partition tag.
    #[must_use]
    pub fn is_typed(&self) -> bool {
        self.type_tag.is_some()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
