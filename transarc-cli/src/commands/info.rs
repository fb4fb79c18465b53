//! Info command implementation.

use std::collections::BTreeMap;
use std::path::Path;
use transarc_archive::{AssetArchive, VERSION};

pub fn cmd_info(archive_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let archive = AssetArchive::open(archive_path)?;
    let metadata = std::fs::metadata(archive_path)?;

    println!("Archive Information");
    println!("===================");
    println!("File: {}", archive_path.display());
    println!("Size: {} bytes", metadata.len());
    println!("Version: {}", VERSION);
    println!("Compression: {}", archive.compression());
    println!("Header: {} bytes", archive.header_length());

    let entries = &archive.header().entries;
    let total_size: u64 = entries.iter().map(|e| e.actual_length).sum();
    let total_stored: u64 = entries.iter().map(|e| e.length).sum();

    println!();
    println!("Contents:");
    println!("  Entries: {}", entries.len());
    println!("  Total size: {} bytes", total_size);
    println!("  Stored size: {} bytes", total_stored);
    if total_size > 0 {
        println!(
            "  Compression ratio: {:.1}%",
            (1.0 - total_stored as f64 / total_size as f64) * 100.0
        );
    }

    let mut by_type: BTreeMap<String, (usize, u64)> = BTreeMap::new();
    for entry in entries {
        let slot = by_type.entry(entry.asset_type.to_string()).or_default();
        slot.0 += 1;
        slot.1 += entry.actual_length;
    }
    if !by_type.is_empty() {
        println!();
        println!("By type:");
        for (name, (count, size)) in &by_type {
            println!("  {:<16} {:>6} files {:>12} bytes", name, count, size);
        }
    }

    let inflated = entries.iter().filter(|e| e.is_inflated()).count();
    if inflated > 0 {
        println!();
        println!("Warning: {} entries store more bytes than they decode to", inflated);
    }
    Ok(())
}
