// SPDX-License-Identifier: GPL-3.0-only

//! Locating and vetting the privileged swap helper.

use std::fs;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, SysError};

/// Install location used by distribution packages.
pub const INSTALLED_HELPER: &str = "/usr/local/lib/swap-manager/swapctl.sh";
pub const HELPER_FILE_NAME: &str = "swapctl.sh";

/// How much the dispatcher checks the helper before escalating to it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HelperTrust {
    /// Must be a regular file owned by root and not writable by group or others.
    #[default]
    RootOwned,
    /// Path existence only.
    Unchecked,
}

/// Helper shipped alongside the running executable.
pub fn bundled_helper_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(HELPER_FILE_NAME)))
        .unwrap_or_else(|| PathBuf::from(HELPER_FILE_NAME))
}

/// Pick the installed helper if it exists, otherwise the bundled one.
pub fn resolve_helper(installed: &Path, bundled: &Path) -> PathBuf {
    if installed.exists() {
        info!("Using installed swap helper at {:?}", installed);
        installed.to_path_buf()
    } else {
        debug!(
            "Installed helper {:?} not present, falling back to {:?}",
            installed, bundled
        );
        bundled.to_path_buf()
    }
}

/// Check that escalating privilege to `path` does not hand root to a file
/// an unprivileged user could have modified or replaced.
///
/// Under [`HelperTrust::RootOwned`] the symlink-resolved file must be a
/// root-owned regular file, and both the directory named in `path` and the
/// directory holding the resolved file must be root-owned and not writable
/// by group or others. Directories further up are not inspected, nor is
/// anything re-checked between this call and the exec.
pub fn verify_helper(path: &Path, trust: HelperTrust) -> Result<()> {
    if trust == HelperTrust::Unchecked {
        fs::metadata(path)?;
        return Ok(());
    }

    let untrusted = |reason: String| SysError::HelperUntrusted {
        path: path.display().to_string(),
        reason,
    };

    let resolved = fs::canonicalize(path)?;
    let metadata = fs::metadata(&resolved)?;
    if !metadata.is_file() {
        return Err(untrusted("not a regular file".to_string()));
    }
    if let Some(reason) = unsafe_owner_or_mode(&metadata) {
        return Err(untrusted(reason));
    }

    let parents = [path.parent(), resolved.parent()];
    for dir in parents.into_iter().flatten() {
        let dir = if dir.as_os_str().is_empty() {
            Path::new(".")
        } else {
            dir
        };
        if let Some(reason) = unsafe_owner_or_mode(&fs::metadata(dir)?) {
            return Err(untrusted(format!("directory {}: {reason}", dir.display())));
        }
    }

    if resolved != path {
        debug!("Helper {:?} resolves to {:?}", path, resolved);
    }
    Ok(())
}

fn unsafe_owner_or_mode(metadata: &fs::Metadata) -> Option<String> {
    if metadata.uid() != 0 {
        return Some(format!("owned by uid {}, expected root", metadata.uid()));
    }
    if metadata.mode() & 0o022 != 0 {
        return Some(format!(
            "writable by group or others (mode {:o})",
            metadata.mode() & 0o7777
        ));
    }
    None
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    static COUNTER: AtomicUsize = AtomicUsize::new(0);

    struct TempDir {
        path: PathBuf,
    }

    impl TempDir {
        fn new() -> Self {
            let unique = COUNTER.fetch_add(1, Ordering::Relaxed);
            let path = std::env::temp_dir().join(format!(
                "swap-sys-helper-{}-{unique}",
                std::process::id()
            ));
            fs::create_dir_all(&path).expect("create temp dir");
            Self { path }
        }
    }

    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.path);
        }
    }

    #[test]
    fn prefers_installed_helper_when_present() {
        let temp = TempDir::new();
        let installed = temp.path.join("installed.sh");
        let bundled = temp.path.join("bundled.sh");

        assert_eq!(resolve_helper(&installed, &bundled), bundled);

        fs::write(&installed, "#!/bin/sh\n").expect("write installed helper");
        assert_eq!(resolve_helper(&installed, &bundled), installed);
    }

    #[test]
    fn bundled_helper_sits_next_to_executable() {
        assert!(bundled_helper_path().ends_with(HELPER_FILE_NAME));
    }

    #[test]
    fn world_writable_helper_is_refused() {
        let temp = TempDir::new();
        let helper = temp.path.join(HELPER_FILE_NAME);
        fs::write(&helper, "#!/bin/sh\n").expect("write helper");
        fs::set_permissions(&helper, fs::Permissions::from_mode(0o777)).expect("chmod helper");

        let err = verify_helper(&helper, HelperTrust::RootOwned).expect_err("must be refused");
        assert!(matches!(err, SysError::HelperUntrusted { .. }));
        assert!(verify_helper(&helper, HelperTrust::Unchecked).is_ok());
    }

    #[test]
    fn directory_is_not_a_helper() {
        let temp = TempDir::new();
        let err = verify_helper(&temp.path, HelperTrust::RootOwned).expect_err("must be refused");
        assert!(matches!(err, SysError::HelperUntrusted { .. }));
    }

    #[test]
    fn missing_helper_reports_io_error() {
        let temp = TempDir::new();
        let err = verify_helper(&temp.path.join("absent.sh"), HelperTrust::RootOwned)
            .expect_err("missing helper");
        assert!(matches!(err, SysError::Io(ref io) if io.kind() == std::io::ErrorKind::NotFound));
    }

    #[test]
    fn writable_directory_is_refused() {
        let temp = TempDir::new();
        let helper = temp.path.join(HELPER_FILE_NAME);
        fs::write(&helper, "#!/bin/sh\n").expect("write helper");
        fs::set_permissions(&helper, fs::Permissions::from_mode(0o755)).expect("chmod helper");
        fs::set_permissions(&temp.path, fs::Permissions::from_mode(0o777)).expect("chmod dir");

        let err = verify_helper(&helper, HelperTrust::RootOwned).expect_err("must be refused");
        let SysError::HelperUntrusted { reason, .. } = err else {
            panic!("expected untrusted helper, got {err:?}");
        };
        // As root the file itself passes and only the directory is at fault.
        if unsafe { libc::geteuid() } == 0 {
            assert!(reason.starts_with("directory"), "{reason}");
        }
    }

    #[test]
    fn symlink_in_writable_directory_is_refused() {
        let Ok(sh) = which::which("sh") else {
            return;
        };
        let Ok(sh) = sh.canonicalize() else {
            return;
        };
        let temp = TempDir::new();
        let link = temp.path.join(HELPER_FILE_NAME);
        std::os::unix::fs::symlink(&sh, &link).expect("symlink helper");
        fs::set_permissions(&temp.path, fs::Permissions::from_mode(0o777)).expect("chmod dir");

        let err = verify_helper(&link, HelperTrust::RootOwned).expect_err("must be refused");
        assert!(matches!(err, SysError::HelperUntrusted { .. }));
    }

    #[test]
    fn unchecked_still_requires_existence() {
        let temp = TempDir::new();
        let err = verify_helper(&temp.path.join("absent.sh"), HelperTrust::Unchecked)
            .expect_err("missing helper");
        assert!(matches!(err, SysError::Io(ref io) if io.kind() == std::io::ErrorKind::NotFound));
    }

    #[test]
    fn system_binary_passes_root_owned_check() {
        let Ok(sh) = which::which("sh") else {
            return;
        };
        let Ok(canonical) = sh.canonicalize() else {
            return;
        };
        let Ok(metadata) = fs::metadata(&canonical) else {
            return;
        };
        if metadata.uid() != 0 {
            return;
        }
        assert!(verify_helper(&canonical, HelperTrust::RootOwned).is_ok());
    }
}
