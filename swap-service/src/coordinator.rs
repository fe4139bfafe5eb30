// SPDX-License-Identifier: GPL-3.0-only

//! Validate → dispatch → refresh.
//!
//! The coordinator owns the only snapshot front ends render. It is replaced
//! by a full re-read after each successful operation and left alone after a
//! failed one. Mutating methods take `&mut self`, so an instance never has
//! two operations in flight.

use swap_contracts::{PrivilegedExecutor, StateReader};
use swap_sys::{HelperDispatcher, ProcStateReader, resolve_helper};
use swap_types::{OperationRequest, SwapSnapshot};
use tracing::{info, warn};

use crate::config::ServiceConfig;
use crate::error::OperationError;
use crate::validator::{ValidatedRequest, validate};

pub struct SwapCoordinator<R, E> {
    reader: R,
    executor: E,
    snapshot: SwapSnapshot,
    require_root: bool,
}

/// Coordinator bound to procfs and the real helper.
pub type SystemCoordinator = SwapCoordinator<ProcStateReader, HelperDispatcher>;

impl SystemCoordinator {
    pub fn from_config(config: &ServiceConfig) -> Self {
        let reader = ProcStateReader::new(&config.proc_swaps, &config.swappiness);
        let helper = resolve_helper(&config.installed_helper, &config.bundled_helper());
        let dispatcher = HelperDispatcher::new(helper, config.dispatcher_options());
        SwapCoordinator::new(reader, dispatcher).with_escalation(config.escalate)
    }
}

impl<R: StateReader, E: PrivilegedExecutor> SwapCoordinator<R, E> {
    /// Reads the current state immediately so that a snapshot always exists.
    pub fn new(reader: R, executor: E) -> Self {
        let snapshot = reader.snapshot();
        Self {
            reader,
            executor,
            snapshot,
            require_root: true,
        }
    }

    /// `false` runs the helper without escalation even when unprivileged.
    pub fn with_escalation(mut self, require_root: bool) -> Self {
        self.require_root = require_root;
        self
    }

    pub fn snapshot(&self) -> &SwapSnapshot {
        &self.snapshot
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn refresh(&mut self) -> &SwapSnapshot {
        self.snapshot = self.reader.snapshot();
        &self.snapshot
    }

    pub fn enable(&mut self, path: impl Into<String>) -> Result<(), OperationError> {
        self.submit(OperationRequest::Enable { path: path.into() })
    }

    pub fn disable(&mut self, path: impl Into<String>) -> Result<(), OperationError> {
        self.submit(OperationRequest::Disable { path: path.into() })
    }

    pub fn create_file(
        &mut self,
        path: impl Into<String>,
        size_mib: i64,
        persist: bool,
    ) -> Result<(), OperationError> {
        self.submit(OperationRequest::CreateFile {
            path: path.into(),
            size_mib,
            persist,
        })
    }

    pub fn delete_file(
        &mut self,
        path: impl Into<String>,
        remove_from_fstab: bool,
    ) -> Result<(), OperationError> {
        self.submit(OperationRequest::DeleteFile {
            path: path.into(),
            remove_from_fstab,
        })
    }

    pub fn set_swappiness(&mut self, value: i64) -> Result<(), OperationError> {
        self.submit(OperationRequest::SetSwappiness { value })
    }

    /// Run one request through validation, the helper, and the refresh.
    pub fn submit(&mut self, request: OperationRequest) -> Result<(), OperationError> {
        let validated = validate(&request, &self.snapshot).inspect_err(|e| {
            warn!("Rejected {} request: {}", request.kind().subcommand(), e);
        })?;
        self.dispatch(validated)
    }

    fn dispatch(&mut self, request: ValidatedRequest) -> Result<(), OperationError> {
        let operation = request.kind();
        let args = request.helper_args();
        info!("Dispatching swap helper: {}", args.join(" "));

        let result = self.executor.execute(&args, self.require_root);
        if !result.success() {
            warn!(
                "{} failed with exit code {}: {}",
                operation.subcommand(),
                result.exit_code,
                result.detail()
            );
            return Err(OperationError::from_result(operation, &result));
        }

        let snapshot = self.refresh();
        info!(
            "{} succeeded; {}",
            operation.subcommand(),
            snapshot.summary()
        );
        Ok(())
    }
}
