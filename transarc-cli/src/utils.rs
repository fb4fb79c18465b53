//! Utility functions for the CLI.

use glob::Pattern;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use transarc_archive::Asset;
use transarc_core::ArchiveEntry;

/// Create a progress bar with standard styling.
pub fn create_progress_bar(len: u64, enable: bool) -> ProgressBar {
    if !enable {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len);
    if let Ok(style) =
        ProgressStyle::default_bar().template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("█▓▒░ "));
    }
    pb
}

/// Check if an entry path matches the filter patterns.
/// - If include patterns are specified, the path must match at least one
/// - If exclude patterns are specified, the path must not match any
///
/// Invalid patterns are ignored.
pub fn matches_filters(name: &str, include: &[String], exclude: &[String]) -> bool {
    let name = name.replace('\\', "/");
    let hit = |patterns: &[String]| {
        patterns
            .iter()
            .filter_map(|p| Pattern::new(p).ok())
            .any(|p| p.matches(&name))
    };

    if hit(exclude) {
        return false;
    }
    include.is_empty() || hit(include)
}

/// Filter assets based on include/exclude patterns.
pub fn filter_assets<'a>(
    assets: &'a [Asset<File>],
    include: &[String],
    exclude: &[String],
) -> Vec<&'a Asset<File>> {
    assets
        .iter()
        .filter(|a| matches_filters(a.path(), include, exclude))
        .collect()
}

/// Percentage saved, or `-` for empty entries.
pub fn format_ratio(entry: &ArchiveEntry) -> String {
    if entry.actual_length > 0 {
        format!("{:.1}%", entry.space_savings())
    } else {
        "-".to_string()
    }
}

/// Print entries in a formatted table.
pub fn print_entries(entries: &[&ArchiveEntry], long: bool) {
    if !long {
        for entry in entries {
            println!("{}", entry.path);
        }
        return;
    }

    println!(
        "{:>10} {:>10} {:>6} {:>14}  Name",
        "Size", "Stored", "Ratio", "Type",
    );
    println!("{}", "-".repeat(64));

    let mut total_size = 0u64;
    let mut total_stored = 0u64;
    for entry in entries {
        println!(
            "{:>10} {:>10} {:>6} {:>14}  {}",
            entry.actual_length,
            entry.length,
            format_ratio(entry),
            entry.asset_type.to_string(),
            entry.path
        );
        total_size += entry.actual_length;
        total_stored += entry.length;
    }

    println!("{}", "-".repeat(64));
    let total_ratio = if total_size > 0 {
        (1.0 - total_stored as f64 / total_size as f64) * 100.0
    } else {
        0.0
    };
    println!(
        "{:>10} {:>10} {:>5.1}%                 {} files",
        total_size,
        total_stored,
        total_ratio,
        entries.len()
    );
}
