//! Extract command implementation.

use crate::utils::{create_progress_bar, filter_assets};
use log::info;
use std::path::Path;
use transarc_archive::AssetArchive;

/// Options for extracting archive contents.
pub struct ExtractOptions<'a> {
    pub output: &'a Path,
    pub include: &'a [String],
    pub exclude: &'a [String],
    pub progress: bool,
}

pub fn cmd_extract(
    archive_path: &Path,
    options: &ExtractOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let archive = AssetArchive::open(archive_path)?;
    let selected = filter_assets(archive.assets(), options.include, options.exclude);

    std::fs::create_dir_all(options.output)?;
    let pb = create_progress_bar(selected.len() as u64, options.progress);
    for asset in &selected {
        pb.set_message(asset.path().to_string());
        let dest = asset.extract_to(options.output)?;
        info!("extracted {}", dest.display());
        pb.inc(1);
    }
    pb.finish_and_clear();

    println!(
        "Extracted {} of {} entries to {}",
        selected.len(),
        archive.len(),
        options.output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use transarc_archive::{AssetSource, PackOptions, create_from_assets};
    use transarc_core::AssetType;

    #[test]
    fn test_extract_filtered() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.assets");
        let sources = vec![
            AssetSource::from_bytes("textures/rock.png", AssetType::Texture, b"rock".to_vec()),
            AssetSource::from_bytes("sounds/step.wav", AssetType::Sound, b"step".to_vec()),
        ];
        create_from_assets(&sources, &path, &PackOptions::default()).unwrap();

        let out = dir.path().join("out");
        let include = vec!["*.png".to_string()];
        cmd_extract(
            &path,
            &ExtractOptions {
                output: &out,
                include: &include,
                exclude: &[],
                progress: false,
            },
        )
        .unwrap();

        assert_eq!(std::fs::read(out.join("textures/rock.png")).unwrap(), b"rock");
        assert!(!out.join("sounds/step.wav").exists());
    }
}
