// SPDX-License-Identifier: GPL-3.0-only

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use swap_sys::dispatcher::DEFAULT_ESCALATION;
use swap_sys::helper::INSTALLED_HELPER;
use swap_sys::procfs::{PROC_SWAPPINESS, PROC_SWAPS};
use swap_sys::{DispatcherOptions, HelperTrust, bundled_helper_path};
use thiserror::Error;
use tracing::debug;

pub const CONFIG_ENV: &str = "SWAP_MANAGER_CONFIG";
pub const SYSTEM_CONFIG: &str = "/etc/swap-manager/config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Settings for the coordinator and its host bindings.
///
/// Every field may be omitted from the TOML file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub installed_helper: PathBuf,
    /// `None` means `swapctl.sh` next to the running executable
    pub bundled_helper: Option<PathBuf>,
    pub escalation: Vec<String>,
    pub helper_trust: HelperTrust,
    pub timeout_secs: Option<u64>,
    /// `false` runs the helper without the escalation wrapper
    pub escalate: bool,
    pub proc_swaps: PathBuf,
    pub swappiness: PathBuf,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            installed_helper: PathBuf::from(INSTALLED_HELPER),
            bundled_helper: None,
            escalation: vec![DEFAULT_ESCALATION.to_string()],
            helper_trust: HelperTrust::default(),
            timeout_secs: None,
            escalate: true,
            proc_swaps: PathBuf::from(PROC_SWAPS),
            swappiness: PathBuf::from(PROC_SWAPPINESS),
        }
    }
}

impl ServiceConfig {
    pub fn from_toml_str(path: &Path, raw: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(path, &raw)
    }

    /// Explicit path, then `$SWAP_MANAGER_CONFIG`, then the system file if
    /// present, then defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        Self::discover_from(
            explicit,
            std::env::var_os(CONFIG_ENV),
            Path::new(SYSTEM_CONFIG),
        )
    }

    /// [`ServiceConfig::discover`] with the environment value and system
    /// path supplied by the caller.
    pub fn discover_from(
        explicit: Option<&Path>,
        env_path: Option<OsString>,
        system: &Path,
    ) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            debug!("Loading config from --config {:?}", path);
            return Self::load(path);
        }

        if let Some(path) = env_path.filter(|path| !path.is_empty()) {
            debug!("Loading config from ${} = {:?}", CONFIG_ENV, path);
            return Self::load(Path::new(&path));
        }

        if system.exists() {
            return Self::load(system);
        }

        debug!("No swap manager config found, using defaults");
        Ok(Self::default())
    }

    pub fn bundled_helper(&self) -> PathBuf {
        self.bundled_helper
            .clone()
            .unwrap_or_else(bundled_helper_path)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn dispatcher_options(&self) -> DispatcherOptions {
        DispatcherOptions {
            escalation: self.escalation.clone(),
            trust: self.helper_trust,
            timeout: self.timeout(),
        }
    }
}
