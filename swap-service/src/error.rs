// SPDX-License-Identifier: GPL-3.0-only

use swap_types::{EXIT_NOT_FOUND, OperationKind, OperationResult};
use thiserror::Error;

use crate::validator::ValidationError;

/// Why a swap operation did not complete.
///
/// Escalation refusals (cancelled prompt, policy denial) arrive as ordinary
/// non-zero exits and land in [`OperationError::Failed`], including pkexec's
/// own exit status 127. Only a result the dispatcher produced without
/// starting anything counts as [`OperationError::ExecutorNotFound`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{operation} failed:\n{detail}")]
    ExecutorNotFound {
        operation: OperationKind,
        detail: String,
    },

    #[error("{operation} failed:\n{detail}")]
    Failed {
        operation: OperationKind,
        exit_code: i32,
        detail: String,
    },
}

impl OperationError {
    pub(crate) fn from_result(operation: OperationKind, result: &OperationResult) -> Self {
        if result.executor_missing() {
            OperationError::ExecutorNotFound {
                operation,
                detail: result.detail(),
            }
        } else {
            OperationError::Failed {
                operation,
                exit_code: result.exit_code,
                detail: result.detail(),
            }
        }
    }

    /// Exit code reported by the helper; `None` when it never ran.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            OperationError::Validation(_) => None,
            OperationError::ExecutorNotFound { .. } => Some(EXIT_NOT_FOUND),
            OperationError::Failed { exit_code, .. } => Some(*exit_code),
        }
    }
}
