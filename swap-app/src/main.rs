// SPDX-License-Identifier: GPL-3.0-only

//! `swap-manager` - command-line front end for the swap coordinator.
//!
//! Runs unprivileged; mutating subcommands escalate through the configured
//! wrapper (pkexec by default) only for the helper invocation itself.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use swap_service::{OperationError, ServiceConfig, SystemCoordinator};
use swap_types::OperationRequest;
use tracing_subscriber::{EnvFilter, fmt};

mod render;

#[derive(Parser)]
#[command(name = "swap-manager")]
#[command(about = "Inspect and change swap areas and vm.swappiness", long_about = None)]
struct Cli {
    /// Configuration file (defaults to $SWAP_MANAGER_CONFIG or /etc/swap-manager/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Run the helper without pkexec even when not root
    #[arg(long, global = true)]
    no_escalate: bool,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show active swap areas and the current swappiness
    List {
        /// Print the snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// Activate a swap file or partition
    Enable { path: String },
    /// Deactivate a swap file or partition
    Disable { path: String },
    /// Create, format and activate a new swap file
    CreateFile {
        #[arg(default_value = "/swapfile")]
        path: String,
        /// Size in MiB (1..=1048576)
        #[arg(long, default_value_t = 2048, allow_negative_numbers = true)]
        size_mib: i64,
        /// Add an entry to /etc/fstab
        #[arg(long)]
        persist: bool,
    },
    /// Deactivate and delete a swap file
    DeleteFile {
        path: String,
        /// Also remove its /etc/fstab entry
        #[arg(long)]
        remove_fstab: bool,
    },
    /// Set vm.swappiness (0..=200)
    SetSwappiness {
        #[arg(allow_negative_numbers = true)]
        value: i64,
    },
}

impl Commands {
    fn into_request(self) -> Option<OperationRequest> {
        match self {
            Commands::List { .. } => None,
            Commands::Enable { path } => Some(OperationRequest::Enable { path }),
            Commands::Disable { path } => Some(OperationRequest::Disable { path }),
            Commands::CreateFile {
                path,
                size_mib,
                persist,
            } => Some(OperationRequest::CreateFile {
                path,
                size_mib,
                persist,
            }),
            Commands::DeleteFile { path, remove_fstab } => Some(OperationRequest::DeleteFile {
                path,
                remove_from_fstab: remove_fstab,
            }),
            Commands::SetSwappiness { value } => Some(OperationRequest::SetSwappiness { value }),
        }
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays parseable.
    let default_filter = if cli.verbose {
        "swap_manager=debug,swap_service=debug,swap_sys=debug,warn"
    } else {
        "swap_manager=info,swap_service=info,warn"
    };
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config =
        ServiceConfig::discover(cli.config.as_deref()).context("loading configuration")?;
    if cli.no_escalate {
        config.escalate = false;
    }

    let mut coordinator = SystemCoordinator::from_config(&config);
    tracing::debug!("Initial state: {}", coordinator.snapshot().summary());

    let command = cli.command.unwrap_or(Commands::List { json: false });
    if let Commands::List { json } = command {
        if json {
            println!("{}", serde_json::to_string_pretty(coordinator.snapshot())?);
        } else {
            print!("{}", render::table(coordinator.snapshot()));
        }
        return Ok(ExitCode::SUCCESS);
    }

    let Some(request) = command.into_request() else {
        return Ok(ExitCode::SUCCESS);
    };

    match coordinator.submit(request) {
        Ok(()) => {
            print!("{}", render::table(coordinator.snapshot()));
            Ok(ExitCode::SUCCESS)
        }
        Err(OperationError::Validation(e)) => {
            eprintln!("{e}");
            Ok(ExitCode::from(2))
        }
        Err(e) => {
            eprintln!("{e}");
            Ok(ExitCode::FAILURE)
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn create_file_defaults_match_original_form() {
        let cli = Cli::try_parse_from(["swap-manager", "create-file"]).expect("parse");
        let request = cli.command.and_then(Commands::into_request);
        assert_eq!(
            request,
            Some(OperationRequest::CreateFile {
                path: "/swapfile".to_string(),
                size_mib: 2048,
                persist: false,
            })
        );
    }

    #[test]
    fn negative_values_reach_validation() {
        let cli = Cli::try_parse_from(["swap-manager", "set-swappiness", "-1"]).expect("parse");
        let request = cli.command.and_then(Commands::into_request);
        assert_eq!(request, Some(OperationRequest::SetSwappiness { value: -1 }));
    }

    #[test]
    fn delete_flags_map_to_request() {
        let cli = Cli::try_parse_from([
            "swap-manager",
            "--no-escalate",
            "delete-file",
            "/swapfile",
            "--remove-fstab",
        ])
        .expect("parse");
        assert!(cli.no_escalate);
        let request = cli.command.and_then(Commands::into_request);
        assert_eq!(
            request,
            Some(OperationRequest::DeleteFile {
                path: "/swapfile".to_string(),
                remove_from_fstab: true,
            })
        );
    }
}
