//! Error type for purity verification failures.
//!
//! A replay mismatch is a correctness defect in the wrapped function, not a
//! transient condition: it is surfaced synchronously to the caller of the
//! checked call and never retried or swallowed. Hashability of arguments is
//! a trait bound (`CallArgs`), so there is no runtime "unhashable argument"
//! error kind.

use std::fmt;

use thiserror::Error;

/// A wrapped function produced a different output when replayed against a
/// previously recorded call.
///
/// Carries the function name, the offending arguments, and both outputs,
/// rendered with their `Debug` representations at the point of detection so
/// the error stays `'static` and cheap to move.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{function}() has side-effects: replaying arguments {args} produced {actual}, but {expected} was recorded")]
pub struct NotPureError {
    /// Name the function was wrapped under.
    pub function: &'static str,
    /// Debug rendering of the replayed arguments.
    pub args: String,
    /// Debug rendering of the historically recorded output.
    pub expected: String,
    /// Debug rendering of the diverging replay output.
    pub actual: String,
}

impl NotPureError {
    /// Build an error from the mismatching call, capturing Debug renderings.
    pub(crate) fn new(
        function: &'static str,
        args: &impl fmt::Debug,
        expected: &impl fmt::Debug,
        actual: &impl fmt::Debug,
    ) -> Self {
        Self {
            function,
            args: format!("{args:?}"),
            expected: format!("{expected:?}"),
            actual: format!("{actual:?}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
