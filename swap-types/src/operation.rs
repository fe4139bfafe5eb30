// SPDX-License-Identifier: GPL-3.0-only

use std::fmt;

use serde::{Deserialize, Serialize};

/// A mutating request against the swap configuration.
///
/// Numeric fields are signed so that out-of-range input coming from a front
/// end can be represented and rejected by validation rather than by parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum OperationRequest {
    Enable {
        path: String,
    },
    Disable {
        path: String,
    },
    CreateFile {
        path: String,
        size_mib: i64,
        persist: bool,
    },
    DeleteFile {
        path: String,
        remove_from_fstab: bool,
    },
    SetSwappiness {
        value: i64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Enable,
    Disable,
    CreateFile,
    DeleteFile,
    SetSwappiness,
}

impl OperationKind {
    /// Subcommand understood by the privileged helper.
    pub fn subcommand(self) -> &'static str {
        match self {
            OperationKind::Enable => "enable",
            OperationKind::Disable => "disable",
            OperationKind::CreateFile => "create-file",
            OperationKind::DeleteFile => "delete-file",
            OperationKind::SetSwappiness => "set-swappiness",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            OperationKind::Enable => "Enable",
            OperationKind::Disable => "Disable",
            OperationKind::CreateFile => "Create",
            OperationKind::DeleteFile => "Remove",
            OperationKind::SetSwappiness => "Set swappiness",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl OperationRequest {
    pub fn kind(&self) -> OperationKind {
        match self {
            OperationRequest::Enable { .. } => OperationKind::Enable,
            OperationRequest::Disable { .. } => OperationKind::Disable,
            OperationRequest::CreateFile { .. } => OperationKind::CreateFile,
            OperationRequest::DeleteFile { .. } => OperationKind::DeleteFile,
            OperationRequest::SetSwappiness { .. } => OperationKind::SetSwappiness,
        }
    }

    /// Target path, for the kinds that have one.
    pub fn path(&self) -> Option<&str> {
        match self {
            OperationRequest::Enable { path }
            | OperationRequest::Disable { path }
            | OperationRequest::CreateFile { path, .. }
            | OperationRequest::DeleteFile { path, .. } => Some(path),
            OperationRequest::SetSwappiness { .. } => None,
        }
    }

    /// Argument vector handed to the privileged helper.
    pub fn helper_args(&self) -> Vec<String> {
        let mut args = vec![self.kind().subcommand().to_string()];
        match self {
            OperationRequest::Enable { path } | OperationRequest::Disable { path } => {
                args.push(path.clone());
            }
            OperationRequest::CreateFile {
                path,
                size_mib,
                persist,
            } => {
                args.push(path.clone());
                args.push(size_mib.to_string());
                if *persist {
                    args.push("--persist".to_string());
                }
            }
            OperationRequest::DeleteFile {
                path,
                remove_from_fstab,
            } => {
                args.push(path.clone());
                if *remove_from_fstab {
                    args.push("--remove-fstab".to_string());
                }
            }
            OperationRequest::SetSwappiness { value } => {
                args.push(value.to_string());
            }
        }
        args
    }
}
