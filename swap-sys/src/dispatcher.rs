// SPDX-License-Identifier: GPL-3.0-only

//! Privileged helper invocation
//!
//! Runs the swap helper directly when the process is already root (or the
//! caller opted out of escalation) and through the escalation wrapper
//! (`pkexec` by default) otherwise. Spawn failures never propagate: they
//! are folded into an [`OperationResult`] with a reserved exit code.

use std::ffi::{OsStr, OsString};
use std::io::{self, Read};
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use swap_contracts::PrivilegedExecutor;
use swap_types::{EXIT_CANNOT_EXECUTE, EXIT_NOT_FOUND, EXIT_TIMED_OUT, OperationResult};
use tracing::{debug, info, warn};
use which::which;

use crate::error::SysError;
use crate::helper::{HelperTrust, verify_helper};

pub const DEFAULT_ESCALATION: &str = "pkexec";

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherOptions {
    /// Wrapper argv placed in front of the helper when escalating
    pub escalation: Vec<String>,
    pub trust: HelperTrust,
    /// Kill the helper after this long; `None` waits indefinitely
    pub timeout: Option<Duration>,
}

impl Default for DispatcherOptions {
    fn default() -> Self {
        Self {
            escalation: vec![DEFAULT_ESCALATION.to_string()],
            trust: HelperTrust::default(),
            timeout: None,
        }
    }
}

/// [`PrivilegedExecutor`] that shells out to the swap helper.
pub struct HelperDispatcher {
    helper: PathBuf,
    escalation: Vec<OsString>,
    trust: HelperTrust,
    timeout: Option<Duration>,
    effective_uid: u32,
}

impl HelperDispatcher {
    pub fn new(helper: PathBuf, options: DispatcherOptions) -> Self {
        let mut escalation: Vec<OsString> =
            options.escalation.into_iter().map(OsString::from).collect();

        // Resolve the wrapper once; an unresolvable one is left as-is and
        // reported as not found when first used.
        if let Some(program) = escalation.first_mut() {
            match which(&*program) {
                Ok(resolved) => *program = resolved.into_os_string(),
                Err(e) => warn!("Escalation wrapper {:?} not found: {}", program, e),
            }
        }

        let effective_uid = unsafe { libc::geteuid() } as u32;
        info!(
            "Swap helper {:?} (euid {}, escalation {:?})",
            helper, effective_uid, escalation
        );

        Self {
            helper,
            escalation,
            trust: options.trust,
            timeout: options.timeout,
            effective_uid,
        }
    }

    /// Override the effective UID captured at construction.
    pub fn with_effective_uid(mut self, uid: u32) -> Self {
        self.effective_uid = uid;
        self
    }

    pub fn helper_path(&self) -> &Path {
        &self.helper
    }

    pub fn is_privileged(&self) -> bool {
        self.effective_uid == 0
    }

    pub fn needs_escalation(&self, require_root: bool) -> bool {
        require_root && !self.is_privileged()
    }

    /// Full argv for one invocation, wrapper first when escalating.
    pub fn command_line(&self, args: &[String], escalate: bool) -> Vec<OsString> {
        let mut argv = Vec::with_capacity(self.escalation.len() + args.len() + 1);
        if escalate {
            argv.extend(self.escalation.iter().cloned());
        }
        argv.push(self.helper.clone().into_os_string());
        argv.extend(args.iter().map(OsString::from));
        argv
    }

    fn run(&self, argv: &[OsString]) -> OperationResult {
        let Some((program, rest)) = argv.split_first() else {
            return OperationResult::not_started(EXIT_CANNOT_EXECUTE, "empty command line");
        };
        let rendered = render(argv);
        debug!("Running {}", rendered);

        let mut command = Command::new(program);
        command
            .args(rest)
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let outcome = match self.timeout {
            None => command
                .spawn()
                .and_then(|child| child.wait_with_output())
                .map(|output| {
                    Some((
                        output.status,
                        String::from_utf8_lossy(&output.stdout).into_owned(),
                        String::from_utf8_lossy(&output.stderr).into_owned(),
                    ))
                }),
            Some(timeout) => run_with_timeout(&mut command, timeout),
        };

        match outcome {
            Ok(Some((status, stdout, stderr))) => OperationResult::new(
                stdout.trim(),
                stderr.trim(),
                exit_code(status),
            ),
            Ok(None) => {
                warn!("{} timed out", rendered);
                OperationResult::new(
                    String::new(),
                    format!(
                        "{} timed out after {}s; swap state may still change, refresh before retrying",
                        program.to_string_lossy(),
                        self.timeout.unwrap_or_default().as_secs_f32()
                    ),
                    EXIT_TIMED_OUT,
                )
            }
            Err(e) => {
                let code = if e.kind() == io::ErrorKind::NotFound {
                    EXIT_NOT_FOUND
                } else {
                    EXIT_CANNOT_EXECUTE
                };
                warn!("Failed to execute {}: {}", rendered, e);
                OperationResult::not_started(
                    code,
                    format!("Failed to execute {}: {}", program.to_string_lossy(), e),
                )
            }
        }
    }
}

impl PrivilegedExecutor for HelperDispatcher {
    fn execute(&self, args: &[String], require_root: bool) -> OperationResult {
        let escalate = self.needs_escalation(require_root);

        if escalate {
            if self.escalation.is_empty() {
                return OperationResult::not_started(
                    EXIT_CANNOT_EXECUTE,
                    "root privileges required but no escalation wrapper is configured",
                );
            }

            match verify_helper(&self.helper, self.trust) {
                Ok(()) => {}
                Err(SysError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                    return OperationResult::not_started(
                        EXIT_NOT_FOUND,
                        format!("Helper {} not found: {}", self.helper.display(), e),
                    );
                }
                Err(e) => {
                    warn!("{}", e);
                    return OperationResult::not_started(EXIT_CANNOT_EXECUTE, e.to_string());
                }
            }
        }

        self.run(&self.command_line(args, escalate))
    }
}

impl std::fmt::Debug for HelperDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HelperDispatcher")
            .field("helper", &self.helper)
            .field("escalation", &self.escalation)
            .field("trust", &self.trust)
            .field("timeout", &self.timeout)
            .field("effective_uid", &self.effective_uid)
            .finish()
    }
}

type Captured = (ExitStatus, String, String);

enum Chunk {
    Stdout(Vec<u8>),
    Stderr(Vec<u8>),
    Closed,
}

/// Returns `Ok(None)` when the helper is still running at the deadline.
///
/// Output is collected until both pipes close or the deadline passes. A
/// helper that exits while a background process keeps its pipes open is
/// returned with the output read so far.
fn run_with_timeout(command: &mut Command, timeout: Duration) -> io::Result<Option<Captured>> {
    // A deadline past the end of the clock is no deadline.
    let deadline = Instant::now().checked_add(timeout);
    let mut child = command.spawn()?;

    let (sender, chunks) = mpsc::channel();
    pump(child.stdout.take(), sender.clone(), Chunk::Stdout);
    pump(child.stderr.take(), sender, Chunk::Stderr);

    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let mut open_pipes = 2;
    let mut status = None;

    loop {
        if status.is_none() {
            status = child.try_wait()?;
        }
        if let Some(status) = status
            && open_pipes == 0
        {
            return Ok(Some(captured(status, &stdout, &stderr)));
        }

        let wait = match deadline {
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    break;
                }
                remaining.min(POLL_INTERVAL)
            }
            None => POLL_INTERVAL,
        };

        if open_pipes == 0 {
            thread::sleep(wait);
            continue;
        }
        match chunks.recv_timeout(wait) {
            Ok(Chunk::Stdout(bytes)) => stdout.extend(bytes),
            Ok(Chunk::Stderr(bytes)) => stderr.extend(bytes),
            Ok(Chunk::Closed) => open_pipes -= 1,
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => open_pipes = 0,
        }
    }

    if status.is_none() {
        status = child.try_wait()?;
    }
    let Some(status) = status else {
        stop(child);
        return Ok(None);
    };

    for chunk in chunks.try_iter() {
        match chunk {
            Chunk::Stdout(bytes) => stdout.extend(bytes),
            Chunk::Stderr(bytes) => stderr.extend(bytes),
            Chunk::Closed => {}
        }
    }
    warn!("Helper exited but its output pipes are still held open; keeping output read so far");
    Ok(Some(captured(status, &stdout, &stderr)))
}

/// Forward everything read from `source` to `sender`, then `Chunk::Closed`.
fn pump<R, F>(source: Option<R>, sender: Sender<Chunk>, wrap: F)
where
    R: Read + Send + 'static,
    F: Fn(Vec<u8>) -> Chunk + Send + 'static,
{
    thread::spawn(move || {
        if let Some(mut source) = source {
            let mut buffer = [0u8; 4096];
            loop {
                match source.read(&mut buffer) {
                    Ok(0) => break,
                    Ok(count) => {
                        if sender.send(wrap(buffer[..count].to_vec())).is_err() {
                            return;
                        }
                    }
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                    Err(_) => break,
                }
            }
        }
        let _ = sender.send(Chunk::Closed);
    });
}

fn captured(status: ExitStatus, stdout: &[u8], stderr: &[u8]) -> Captured {
    (
        status,
        String::from_utf8_lossy(stdout).into_owned(),
        String::from_utf8_lossy(stderr).into_owned(),
    )
}

/// Kill a timed out helper and reap it.
///
/// A setuid wrapper cannot be signalled by an unprivileged parent. It keeps
/// running, may still apply its change, and is reaped in the background.
fn stop(mut child: Child) {
    match child.kill() {
        Ok(()) => {
            let _ = child.wait();
        }
        Err(e) => {
            warn!(
                "Failed to kill timed out helper (pid {}): {}; it may still change swap state, refresh before retrying",
                child.id(),
                e
            );
            let _ = reap_in_background(child);
        }
    }
}

fn reap_in_background(mut child: Child) -> thread::JoinHandle<Option<ExitStatus>> {
    thread::spawn(move || {
        let status = child.wait().ok();
        if let Some(status) = status {
            info!(
                "Abandoned helper (pid {}) exited with code {}",
                child.id(),
                exit_code(status)
            );
        }
        status
    })
}

fn exit_code(status: ExitStatus) -> i32 {
    status
        .code()
        .or_else(|| status.signal().map(|signal| 128 + signal))
        .unwrap_or(1)
}

fn render(argv: &[OsString]) -> String {
    argv.iter()
        .map(|arg| arg.as_os_str())
        .map(OsStr::to_string_lossy)
        .collect::<Vec<_>>()
        .join(" ")
}
