// SPDX-License-Identifier: GPL-3.0-only

use thiserror::Error;

/// Error types for system-level operations
#[derive(Error, Debug)]
pub enum SysError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid value in {source_name}: {value:?}")]
    InvalidValue { source_name: String, value: String },

    #[error("Refusing to escalate to helper {path}: {reason}")]
    HelperUntrusted { path: String, reason: String },
}

/// Result type alias for system operations
pub type Result<T> = std::result::Result<T, SysError>;
