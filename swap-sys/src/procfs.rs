// SPDX-License-Identifier: GPL-3.0-only

//! Readers for the kernel's swap state.
//!
//! Both readers degrade instead of failing: a missing or unreadable file
//! yields an empty table or an unknown swappiness, logged at `warn`.
//! Callers must treat an unknown swappiness as "no current value", never
//! as zero.

use std::fs;
use std::path::{Path, PathBuf};

use swap_contracts::StateReader;
use swap_types::{SwapEntry, SwapKind, Swappiness};
use tracing::{debug, warn};

use crate::error::{Result, SysError};

pub const PROC_SWAPS: &str = "/proc/swaps";
pub const PROC_SWAPPINESS: &str = "/proc/sys/vm/swappiness";

/// Parse the contents of `/proc/swaps`.
///
/// The first line is the column header. Rows with fewer than five fields or
/// with non-numeric size/used/priority columns are skipped.
pub fn parse_proc_swaps(input: &str) -> Vec<SwapEntry> {
    input.lines().skip(1).filter_map(parse_swap_row).collect()
}

fn parse_swap_row(line: &str) -> Option<SwapEntry> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 5 {
        return None;
    }

    let (Ok(size_kib), Ok(used_kib), Ok(priority)) = (
        fields[2].parse::<u64>(),
        fields[3].parse::<u64>(),
        fields[4].parse::<i32>(),
    ) else {
        debug!("Skipping unparseable swap row: {:?}", line);
        return None;
    };

    Some(SwapEntry {
        path: unescape_proc_field(fields[0]),
        kind: SwapKind::from_proc_type(fields[1]),
        size_kib,
        used_kib,
        priority,
        active: true,
    })
}

/// The kernel octal-escapes whitespace and backslashes in swap paths
/// (`/swap\040file`).
fn unescape_proc_field(value: &str) -> String {
    let mut output = Vec::with_capacity(value.len());
    let bytes = value.as_bytes();
    let mut index = 0;

    while index < bytes.len() {
        if bytes[index] == b'\\'
            && index + 3 < bytes.len()
            && bytes[index + 1..=index + 3].iter().all(u8::is_ascii_digit)
            && let Ok(num) = u8::from_str_radix(&value[index + 1..index + 4], 8)
        {
            output.push(num);
            index += 4;
            continue;
        }

        output.push(bytes[index]);
        index += 1;
    }

    String::from_utf8_lossy(&output).into_owned()
}

/// Parse the contents of `/proc/sys/vm/swappiness`.
pub fn parse_swappiness(input: &str) -> Result<Swappiness> {
    let invalid = || SysError::InvalidValue {
        source_name: "vm.swappiness".to_string(),
        value: input.trim().to_string(),
    };

    let value = input.trim().parse::<i64>().map_err(|_| invalid())?;
    Swappiness::new(value).map_err(|_| invalid())
}

/// [`StateReader`] backed by procfs files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcStateReader {
    swaps_path: PathBuf,
    swappiness_path: PathBuf,
}

impl Default for ProcStateReader {
    fn default() -> Self {
        Self::new(PROC_SWAPS, PROC_SWAPPINESS)
    }
}

impl ProcStateReader {
    pub fn new(swaps_path: impl Into<PathBuf>, swappiness_path: impl Into<PathBuf>) -> Self {
        Self {
            swaps_path: swaps_path.into(),
            swappiness_path: swappiness_path.into(),
        }
    }

    pub fn swaps_path(&self) -> &Path {
        &self.swaps_path
    }

    pub fn swappiness_path(&self) -> &Path {
        &self.swappiness_path
    }

    pub fn read_swap_entries(&self) -> Vec<SwapEntry> {
        match fs::read_to_string(&self.swaps_path) {
            Ok(contents) => {
                let entries = parse_proc_swaps(&contents);
                debug!("Read {} swap entries from {:?}", entries.len(), self.swaps_path);
                entries
            }
            Err(e) => {
                warn!("Failed to read swap table {:?}: {}", self.swaps_path, e);
                Vec::new()
            }
        }
    }

    pub fn read_swappiness(&self) -> Option<Swappiness> {
        let parsed = fs::read_to_string(&self.swappiness_path)
            .map_err(SysError::from)
            .and_then(|contents| parse_swappiness(&contents));

        match parsed {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Swappiness unknown ({:?}): {}", self.swappiness_path, e);
                None
            }
        }
    }
}

impl StateReader for ProcStateReader {
    fn swap_entries(&self) -> Vec<SwapEntry> {
        self.read_swap_entries()
    }

    fn swappiness(&self) -> Option<Swappiness> {
        self.read_swappiness()
    }
}
