//! Repack command implementation.

use std::path::Path;
use transarc_archive::AssetArchive;
use transarc_core::{Compression, CompressionLevel};

pub fn cmd_repack(
    input: &Path,
    output: &Path,
    compression: Compression,
    level: CompressionLevel,
) -> Result<(), Box<dyn std::error::Error>> {
    let archive = AssetArchive::open(input)?;
    let header = archive.save(output, compression, level)?;

    let before = std::fs::metadata(input)?.len();
    let after = std::fs::metadata(output)?.len();
    println!(
        "Repacked {} ({}) -> {} ({}): {} entries, {} -> {} bytes",
        input.display(),
        archive.compression(),
        output.display(),
        header.compression,
        header.entries.len(),
        before,
        after
    );
    Ok(())
}
