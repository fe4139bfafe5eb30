// SPDX-License-Identifier: GPL-3.0-only

//! Seams between the operation coordinator and the host.
//!
//! `swap-sys` provides the real implementations backed by procfs and the
//! privileged helper; tests substitute in-memory doubles.

use swap_types::{OperationResult, SwapEntry, SwapSnapshot, Swappiness};

/// Read-only view of the kernel's swap state.
///
/// Implementations never fail: unreadable sources degrade to an empty list
/// or `None`.
pub trait StateReader {
    fn swap_entries(&self) -> Vec<SwapEntry>;

    fn swappiness(&self) -> Option<Swappiness>;

    fn snapshot(&self) -> SwapSnapshot {
        SwapSnapshot::new(self.swap_entries(), self.swappiness())
    }
}

/// Runs the privileged helper with the given arguments.
///
/// `require_root` set to `false` skips escalation even when the caller is
/// unprivileged. Every outcome, including a missing executable, is reported
/// as an [`OperationResult`].
pub trait PrivilegedExecutor {
    fn execute(&self, args: &[String], require_root: bool) -> OperationResult;
}

impl<T: StateReader + ?Sized> StateReader for &T {
    fn swap_entries(&self) -> Vec<SwapEntry> {
        (**self).swap_entries()
    }

    fn swappiness(&self) -> Option<Swappiness> {
        (**self).swappiness()
    }
}

impl<T: PrivilegedExecutor + ?Sized> PrivilegedExecutor for &T {
    fn execute(&self, args: &[String], require_root: bool) -> OperationResult {
        (**self).execute(args, require_root)
    }
}
