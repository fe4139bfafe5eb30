// SPDX-License-Identifier: GPL-3.0-only

//! Precondition checks run before any privileged call.
//!
//! Rejecting a request here means the user is never prompted for a password
//! for an operation that cannot succeed, and destructive requests such as
//! deleting a partition never reach the helper.

use std::ops::Deref;

use swap_types::{OperationKind, OperationRequest, SwapKind, SwapSnapshot, Swappiness};
use thiserror::Error;

pub const MIN_CREATE_MIB: i64 = 1;
/// 1 TiB
pub const MAX_CREATE_MIB: i64 = 1_048_576;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{operation}: a path is required")]
    EmptyPath { operation: OperationKind },

    #[error("{operation}: path must be absolute, got {path:?}")]
    RelativePath {
        operation: OperationKind,
        path: String,
    },

    #[error("swap file size {size_mib} MiB is outside 1..=1048576 MiB")]
    SizeOutOfRange { size_mib: i64 },

    #[error("swappiness {value} is outside 0..=200")]
    SwappinessOutOfRange { value: i64 },

    #[error("{path} is not an active swap area")]
    UnknownEntry { path: String },

    #[error("Remove only supports swap files; {path} is a {kind}")]
    NotASwapFile { path: String, kind: SwapKind },
}

/// A request that passed [`validate`]. Only this module can build one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest(OperationRequest);

impl ValidatedRequest {
    pub fn into_inner(self) -> OperationRequest {
        self.0
    }
}

impl Deref for ValidatedRequest {
    type Target = OperationRequest;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Check `request` against the rules for its kind.
///
/// `snapshot` is the last observed kernel state; it is consulted only for
/// `DeleteFile`, whose target must be an active swap file.
pub fn validate(
    request: &OperationRequest,
    snapshot: &SwapSnapshot,
) -> Result<ValidatedRequest, ValidationError> {
    if let Some(path) = request.path() {
        check_path(request.kind(), path)?;
    }

    match request {
        OperationRequest::Enable { .. } | OperationRequest::Disable { .. } => {}
        OperationRequest::CreateFile { size_mib, .. } => {
            if !(MIN_CREATE_MIB..=MAX_CREATE_MIB).contains(size_mib) {
                return Err(ValidationError::SizeOutOfRange {
                    size_mib: *size_mib,
                });
            }
        }
        OperationRequest::DeleteFile { path, .. } => {
            let entry = snapshot
                .find(path)
                .ok_or_else(|| ValidationError::UnknownEntry { path: path.clone() })?;
            if !entry.kind.is_file() {
                return Err(ValidationError::NotASwapFile {
                    path: path.clone(),
                    kind: entry.kind.clone(),
                });
            }
        }
        OperationRequest::SetSwappiness { value } => {
            Swappiness::new(*value)
                .map_err(|_| ValidationError::SwappinessOutOfRange { value: *value })?;
        }
    }

    Ok(ValidatedRequest(request.clone()))
}

fn check_path(operation: OperationKind, path: &str) -> Result<(), ValidationError> {
    if path.is_empty() {
        return Err(ValidationError::EmptyPath { operation });
    }
    // Also keeps a path from being parsed as a helper option.
    if !path.starts_with('/') {
        return Err(ValidationError::RelativePath {
            operation,
            path: path.to_string(),
        });
    }
    Ok(())
}
