//! Test command implementation.

use log::info;
use std::path::Path;
use transarc_archive::AssetArchive;

/// Decode every entry; returns (ok count, failures).
pub fn verify(archive: &AssetArchive) -> (usize, Vec<(String, String)>) {
    let mut ok_count = 0usize;
    let mut errors = Vec::new();
    for asset in archive.assets() {
        match asset.data() {
            Ok(_) => {
                ok_count += 1;
                info!("  OK: {}", asset.path());
            }
            Err(e) => errors.push((asset.path().to_string(), e.to_string())),
        }
    }
    (ok_count, errors)
}

pub fn cmd_test(archive_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let archive = AssetArchive::open(archive_path)?;
    println!("Testing {} ({})", archive_path.display(), archive.compression());

    let (ok_count, errors) = verify(&archive);

    println!();
    println!("Test results:");
    println!("  Total entries: {}", archive.len());
    println!("  OK: {}", ok_count);
    println!("  Failed: {}", errors.len());

    if !errors.is_empty() {
        println!();
        println!("Errors:");
        for (name, err) in &errors {
            println!("  {}: {}", name, err);
        }
        return Err(format!("{} entries failed", errors.len()).into());
    }

    println!();
    println!("All entries OK");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use transarc_archive::{AssetSource, PackOptions, create_from_assets};
    use transarc_core::{AssetType, Compression, CompressionLevel};

    #[test]
    fn test_verify_reports_corrupt_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.assets");
        let sources = vec![
            AssetSource::from_bytes("good", AssetType::Binary, vec![3; 300]),
            AssetSource::from_bytes("bad", AssetType::Binary, vec![5; 300]),
        ];
        let options = PackOptions::new(Compression::Deflate, CompressionLevel::Optimal);
        let header = create_from_assets(&sources, &path, &options).unwrap();

        // Overwrite the second payload with bytes that are not a deflate stream.
        let mut bytes = std::fs::read(&path).unwrap();
        let header_length = i32::from_le_bytes(bytes[..4].try_into().unwrap()) as usize;
        let bad = &header.entries[1];
        let from = 4 + header_length + bad.start as usize;
        for b in &mut bytes[from..from + bad.length as usize] {
            *b = 0xFF;
        }
        std::fs::write(&path, &bytes).unwrap();

        let archive = AssetArchive::open(&path).unwrap();
        let (ok_count, errors) = verify(&archive);
        assert_eq!(ok_count, 1);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].0, "bad");
        assert!(cmd_test(&path).is_err());
    }
}
