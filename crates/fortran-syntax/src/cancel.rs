// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Cooperative cancellation.
//!
//! Long-running stages call [`CancelCheck::is_cancelled`] at statement and
//! declaration boundaries. A `true` answer makes the stage return
//! [`Cancelled`] instead of a result.

use thiserror::Error;

/// The operation was abandoned at the caller's request. No partial
/// result accompanies it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation cancelled")]
pub struct Cancelled;

/// A caller-supplied cancellation check.
pub trait CancelCheck {
    fn is_cancelled(&self) -> bool;
}

impl<F: Fn() -> bool> CancelCheck for F {
    fn is_cancelled(&self) -> bool {
        self()
    }
}

/// Never cancels.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverCancel;

impl CancelCheck for NeverCancel {
    fn is_cancelled(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn closures_are_checks() {
        let calls = Cell::new(0);
        let check = || {
            calls.set(calls.get() + 1);
            calls.get() >= 2
        };
        assert!(!check.is_cancelled());
        assert!(check.is_cancelled());
        assert!(!NeverCancel.is_cancelled());
    }
}
