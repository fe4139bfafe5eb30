// SPDX-License-Identifier: GPL-3.0-only

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const KIB_PER_MIB: u64 = 1024;

/// Kind of backing store for an active swap area, as reported in the `Type`
/// column of `/proc/swaps`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SwapKind {
    File,
    Partition,
    /// Any label the kernel reports that we do not model explicitly.
    Other(String),
}

impl SwapKind {
    pub fn from_proc_type(value: &str) -> Self {
        match value {
            "file" => SwapKind::File,
            "partition" => SwapKind::Partition,
            other => SwapKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SwapKind::File => "file",
            SwapKind::Partition => "partition",
            SwapKind::Other(label) => label,
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, SwapKind::File)
    }
}

impl fmt::Display for SwapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for SwapKind {
    fn from(value: String) -> Self {
        SwapKind::from_proc_type(&value)
    }
}

impl From<SwapKind> for String {
    fn from(value: SwapKind) -> Self {
        value.as_str().to_string()
    }
}

/// One active swap area.
///
/// Sizes are kept exactly as the kernel reports them (KiB). The MiB
/// accessors truncate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapEntry {
    /// Absolute path of the swap file or device node
    pub path: String,
    pub kind: SwapKind,
    pub size_kib: u64,
    pub used_kib: u64,
    /// Kernel ordering hint; higher values are used first
    pub priority: i32,
    /// Always `true` for entries read from the kernel table
    pub active: bool,
}

impl SwapEntry {
    pub fn size_mib(&self) -> u64 {
        self.size_kib / KIB_PER_MIB
    }

    pub fn used_mib(&self) -> u64 {
        self.used_kib / KIB_PER_MIB
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_kib.saturating_mul(1024)
    }

    pub fn used_bytes(&self) -> u64 {
        self.used_kib.saturating_mul(1024)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("swappiness {0} is outside 0..=200")]
pub struct SwappinessOutOfRange(pub i64);

/// Value of `vm.swappiness`.
///
/// Kernels before 5.8 accepted 0..=100; newer ones accept up to 200.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Swappiness(u8);

impl Swappiness {
    pub const MIN: i64 = 0;
    pub const MAX: i64 = 200;

    pub fn new(value: i64) -> Result<Self, SwappinessOutOfRange> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(SwappinessOutOfRange(value))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Swappiness {
    type Error = SwappinessOutOfRange;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Swappiness::new(value)
    }
}

impl From<Swappiness> for i64 {
    fn from(value: Swappiness) -> Self {
        i64::from(value.0)
    }
}

impl fmt::Display for Swappiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Point-in-time view of the kernel's swap state.
///
/// Snapshots are replaced wholesale on refresh and never edited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapSnapshot {
    pub entries: Vec<SwapEntry>,
    /// `None` when the tunable could not be read; not the same as zero
    pub swappiness: Option<Swappiness>,
}

impl SwapSnapshot {
    pub fn new(entries: Vec<SwapEntry>, swappiness: Option<Swappiness>) -> Self {
        Self {
            entries,
            swappiness,
        }
    }

    pub fn find(&self, path: &str) -> Option<&SwapEntry> {
        self.entries.iter().find(|entry| entry.path == path)
    }

    pub fn summary(&self) -> String {
        format!("Active swaps: {}", self.entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn swapfile() -> SwapEntry {
        SwapEntry {
            path: "/swapfile".to_string(),
            kind: SwapKind::File,
            size_kib: 2_097_152,
            used_kib: 512_000,
            priority: -2,
            active: true,
        }
    }

    #[test]
    fn mib_accessors_truncate() {
        let entry = swapfile();
        assert_eq!(entry.size_mib(), 2048);
        assert_eq!(entry.used_mib(), 500);
        assert_eq!(entry.size_bytes(), 2_147_483_648);
    }

    #[test]
    fn kind_keeps_unknown_labels() {
        assert_eq!(SwapKind::from_proc_type("file"), SwapKind::File);
        assert_eq!(SwapKind::from_proc_type("partition"), SwapKind::Partition);
        let other = SwapKind::from_proc_type("zswap");
        assert_eq!(other.as_str(), "zswap");
        assert!(!other.is_file());
    }

    #[test]
    fn kind_serializes_as_kernel_label() {
        let json = serde_json::to_string(&swapfile()).expect("serialize entry");
        assert!(json.contains("\"kind\":\"file\""));
        let parsed: SwapEntry = serde_json::from_str(&json).expect("deserialize entry");
        assert_eq!(parsed, swapfile());
    }

    #[test]
    fn swappiness_bounds() {
        assert!(Swappiness::new(-1).is_err());
        assert_eq!(Swappiness::new(0).map(Swappiness::get), Ok(0));
        assert_eq!(Swappiness::new(200).map(Swappiness::get), Ok(200));
        assert_eq!(Swappiness::new(201), Err(SwappinessOutOfRange(201)));
    }

    #[test]
    fn snapshot_lookup_and_summary() {
        let snapshot = SwapSnapshot::new(vec![swapfile()], Swappiness::new(60).ok());
        assert!(snapshot.find("/swapfile").is_some());
        assert!(snapshot.find("/dev/sda2").is_none());
        assert_eq!(snapshot.summary(), "Active swaps: 1");
    }
}
