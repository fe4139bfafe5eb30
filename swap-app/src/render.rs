// SPDX-License-Identifier: GPL-3.0-only

use num_format::{Locale, ToFormattedString};
use swap_types::SwapSnapshot;

const HEADERS: [&str; 6] = ["Path", "Type", "Size (MiB)", "Used (MiB)", "Priority", "Active"];

/// Plain-text table of the snapshot, followed by swappiness and a summary.
pub fn table(snapshot: &SwapSnapshot) -> String {
    let rows: Vec<[String; 6]> = snapshot
        .entries
        .iter()
        .map(|entry| {
            [
                entry.path.clone(),
                entry.kind.to_string(),
                entry.size_mib().to_formatted_string(&Locale::en),
                entry.used_mib().to_formatted_string(&Locale::en),
                entry.priority.to_string(),
                if entry.active { "yes" } else { "no" }.to_string(),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let mut out = String::new();
    push_row(&mut out, &HEADERS.map(str::to_string), &widths);
    for row in &rows {
        push_row(&mut out, row, &widths);
    }

    match snapshot.swappiness {
        Some(value) => out.push_str(&format!("\nvm.swappiness: {value}\n")),
        None => out.push_str("\nvm.swappiness: unknown\n"),
    }
    out.push_str(&snapshot.summary());
    out.push('\n');
    out
}

fn push_row(out: &mut String, cells: &[String; 6], widths: &[usize; 6]) {
    let line = cells
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(index, (cell, &width))| {
            // Text columns left-aligned, numbers right-aligned.
            if index < 2 {
                format!("{cell:<width$}")
            } else {
                format!("{cell:>width$}")
            }
        })
        .collect::<Vec<_>>()
        .join("  ");
    out.push_str(line.trim_end());
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use swap_types::{SwapEntry, SwapKind, Swappiness};

    use super::*;

    #[test]
    fn renders_entries_and_swappiness() {
        let snapshot = SwapSnapshot::new(
            vec![SwapEntry {
                path: "/swapfile".to_string(),
                kind: SwapKind::File,
                size_kib: 2_097_152,
                used_kib: 512_000,
                priority: -2,
                active: true,
            }],
            Swappiness::new(60).ok(),
        );

        let rendered = table(&snapshot);
        let lines: Vec<&str> = rendered.lines().collect();
        assert!(lines[0].starts_with("Path"));
        assert!(lines[1].starts_with("/swapfile"));
        assert!(lines[1].contains("2,048"));
        assert!(lines[1].contains("500"));
        assert!(lines[1].ends_with("yes"));
        assert!(rendered.contains("vm.swappiness: 60"));
        assert!(rendered.ends_with("Active swaps: 1\n"));
    }

    #[test]
    fn unknown_swappiness_is_not_zero() {
        let rendered = table(&SwapSnapshot::default());
        assert!(rendered.contains("vm.swappiness: unknown"));
        assert!(rendered.contains("Active swaps: 0"));
    }
}
