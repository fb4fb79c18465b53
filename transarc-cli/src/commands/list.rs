//! List command implementation.

use crate::utils::{filter_assets, print_entries};
use serde::Serialize;
use std::path::Path;
use transarc_archive::AssetArchive;
use transarc_core::ArchiveEntry;

/// JSON serializable entry data for archive listings.
#[derive(Debug, Serialize)]
pub(crate) struct EntryJson {
    path: String,
    asset_type: String,
    type_id: u64,
    start: u64,
    length: u64,
    actual_length: u64,
    ratio: f64,
}

impl EntryJson {
    fn from_entry(entry: &ArchiveEntry) -> Self {
        Self {
            path: entry.path.clone(),
            asset_type: entry.asset_type.name().to_string(),
            type_id: entry.asset_type.id(),
            start: entry.start,
            length: entry.length,
            actual_length: entry.actual_length,
            ratio: entry.compression_ratio(),
        }
    }
}

/// JSON output for archive listing.
#[derive(Debug, Serialize)]
pub(crate) struct ArchiveListJson {
    archive: String,
    compression: String,
    header_length: u32,
    entries: Vec<EntryJson>,
}

/// Options for listing archive contents.
pub struct ListOptions<'a> {
    pub long: bool,
    pub json: bool,
    pub include: &'a [String],
    pub exclude: &'a [String],
}

pub(crate) fn list_json(archive_path: &Path, archive: &AssetArchive, entries: &[&ArchiveEntry]) -> ArchiveListJson {
    ArchiveListJson {
        archive: archive_path.display().to_string(),
        compression: archive.compression().name().to_string(),
        header_length: archive.header_length(),
        entries: entries.iter().map(|e| EntryJson::from_entry(e)).collect(),
    }
}

pub fn cmd_list(archive_path: &Path, options: &ListOptions) -> Result<(), Box<dyn std::error::Error>> {
    let archive = AssetArchive::open(archive_path)?;
    let entries: Vec<&ArchiveEntry> = filter_assets(archive.assets(), options.include, options.exclude)
        .into_iter()
        .map(|a| a.entry())
        .collect();

    if options.json {
        let listing = list_json(archive_path, &archive, &entries);
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    println!("Archive: {} ({})", archive_path.display(), archive.compression());
    println!();
    print_entries(&entries, options.long);
    Ok(())
}
