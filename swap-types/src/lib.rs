// SPDX-License-Identifier: GPL-3.0-only

//! Canonical data model for swap management
//!
//! These types are shared by every layer of the stack:
//!
//! - **swap-sys**: produces [`SwapEntry`] values from the kernel tables and
//!   [`OperationResult`] values from the privileged helper
//! - **swap-service**: validates [`OperationRequest`] values and holds the
//!   current [`SwapSnapshot`]
//! - **swap-app**: renders snapshots and failures

pub mod operation;
pub mod result;
pub mod swap;

pub use operation::*;
pub use result::*;
pub use swap::*;
