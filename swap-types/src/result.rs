// SPDX-License-Identifier: GPL-3.0-only

use serde::{Deserialize, Serialize};

/// The executable (helper or escalation wrapper) could not be found.
pub const EXIT_NOT_FOUND: i32 = 127;
/// The executable exists but could not be started, or was refused by the
/// helper trust check.
pub const EXIT_CANNOT_EXECUTE: i32 = 126;
/// The child was killed after exceeding the configured timeout.
pub const EXIT_TIMED_OUT: i32 = 124;

/// Captured outcome of one helper invocation.
///
/// Only `exit_code` decides success. The text streams are diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    /// `false` when no process ran and the dispatcher chose `exit_code`
    /// itself. Lets a missing executable be told apart from a wrapper that
    /// exited 127 on its own (pkexec does when authorization is refused).
    #[serde(default)]
    pub spawned: bool,
}

impl OperationResult {
    pub fn new(stdout: impl Into<String>, stderr: impl Into<String>, exit_code: i32) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            exit_code,
            spawned: true,
        }
    }

    /// Result for a process that never ran.
    pub fn not_started(exit_code: i32, reason: impl Into<String>) -> Self {
        Self {
            spawned: false,
            ..Self::new(String::new(), reason, exit_code)
        }
    }

    /// The executable was missing, as opposed to a child that exited 127.
    pub fn executor_missing(&self) -> bool {
        !self.spawned && self.exit_code == EXIT_NOT_FOUND
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Human-readable failure detail: stderr, then stdout, then the status.
    pub fn detail(&self) -> String {
        if !self.stderr.is_empty() {
            self.stderr.clone()
        } else if !self.stdout.is_empty() {
            self.stdout.clone()
        } else {
            format!("exited with status {}", self.exit_code)
        }
    }
}
