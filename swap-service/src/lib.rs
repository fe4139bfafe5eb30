// SPDX-License-Identifier: GPL-3.0-only

//! Swap operation coordination
//!
//! Front ends talk to [`SwapCoordinator`]: every mutating request is
//! validated against the last snapshot, dispatched to the privileged helper,
//! and followed by a full re-read of the kernel state when it succeeds.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod validator;

pub use config::{ConfigError, ServiceConfig};
pub use coordinator::{SwapCoordinator, SystemCoordinator};
pub use error::OperationError;
pub use validator::{MAX_CREATE_MIB, MIN_CREATE_MIB, ValidatedRequest, ValidationError, validate};
