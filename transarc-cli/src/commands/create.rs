//! Create and multi-create command implementations.

use std::path::{Path, PathBuf};
use transarc_archive::{PackOptions, create_from, generate_from};
use transarc_core::{Compression, CompressionLevel};

/// `<source>.assets` next to the source directory.
pub fn default_output(source: &Path) -> PathBuf {
    let mut name = source
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "archive".into());
    name.push(".assets");
    source.with_file_name(name)
}

pub fn cmd_create(
    source: &Path,
    output: Option<&Path>,
    compression: Compression,
    level: CompressionLevel,
    exclude: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    if !source.is_dir() {
        return Err(format!("{} is not a directory", source.display()).into());
    }
    let output = output.map_or_else(|| default_output(source), Path::to_path_buf);

    let options = exclude
        .iter()
        .fold(PackOptions::new(compression, level), |opts, ext| {
            opts.exclude(ext.trim_start_matches('.'))
        });
    let header = create_from(source, &output, &options)?;

    let total: u64 = header.entries.iter().map(|e| e.actual_length).sum();
    let stored: u64 = header.entries.iter().map(|e| e.length).sum();
    println!(
        "Created {} ({} entries, {}: {} -> {} bytes)",
        output.display(),
        header.entries.len(),
        header.compression,
        total,
        stored
    );
    Ok(())
}

pub fn cmd_multi_create(
    root: &Path,
    compression: Compression,
    level: CompressionLevel,
    delete: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let written = generate_from(root, &PackOptions::new(compression, level), delete)?;
    if written.is_empty() {
        println!("No subdirectories in {}", root.display());
        return Ok(());
    }
    for path in &written {
        println!("Created {}", path.display());
    }
    if delete {
        println!("Removed {} source directories", written.len());
    }
    Ok(())
}
