// SPDX-License-Identifier: GPL-3.0-only

//! Host-facing side of the swap manager
//!
//! This crate talks to the operating system directly:
//! - reading `/proc/swaps` and `/proc/sys/vm/swappiness`
//! - locating the privileged swap helper
//! - running the helper, escalating through `pkexec` when needed
//!
//! Nothing here performs swap mutations itself; that is the helper's job.

pub mod dispatcher;
pub mod error;
pub mod helper;
pub mod procfs;

pub use dispatcher::{DispatcherOptions, HelperDispatcher};
pub use error::{Result, SysError};
pub use helper::{HelperTrust, bundled_helper_path, resolve_helper, verify_helper};
pub use procfs::{ProcStateReader, parse_proc_swaps, parse_swappiness};
