//! Index of loose asset files and packed archives.
//!
//! A [`FileIndex`] maps logical paths of the form `assets/<relative>` to
//! files on disk. It is built from a root directory and any number of
//! additional source directories:
//!
//! - every `*.assets` archive directly inside the root is opened and its
//!   entries are reachable as `assets/<entry path>`;
//! - every file below an immediate subdirectory `<dir>` of the root is
//!   indexed as `assets/<path relative to dir>`;
//! - every file below an immediate subdirectory of a source is indexed as
//!   `assets/<path relative to the source>`, so `mod/textures/rock.png`
//!   becomes `assets/textures/rock.png`.
//!
//! Loose files take precedence over archived entries, and sources added
//! later override earlier ones. Lookups use the archive path equivalence,
//! so `\` and `/` are interchangeable.
//!
//! The index is an ordinary value: create one per asset context and pass
//! it to whatever needs it.

use crate::reader::{AssetArchive, AssetStream};
use crate::writer::{relative_key, ARCHIVE_EXTENSION};
use log::debug;
use std::collections::{BTreeSet, HashMap};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use transarc_core::error::{ArchiveError, Result};
use transarc_core::{ArchivePath, ArchivePathBuf, BoundedStream, PathComparer};
use walkdir::WalkDir;

/// Prefix of every logical path.
pub const LOGICAL_ROOT: &str = "assets";

/// Logical-path index over loose files and archives.
#[derive(Debug, Default)]
pub struct FileIndex {
    root: Option<PathBuf>,
    sources: Vec<PathBuf>,
    files: HashMap<ArchivePathBuf, PathBuf>,
    archives: Vec<AssetArchive>,
    archived: HashMap<ArchivePathBuf, (usize, usize)>,
}

impl FileIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Index `root`: open its archives and index its subdirectories.
    ///
    /// Any previous state is discarded; added sources are kept and
    /// re-indexed on top.
    pub fn initialize(&mut self, root: impl AsRef<Path>) -> Result<()> {
        let root = root.as_ref().to_path_buf();
        self.archives.clear();
        self.archived.clear();

        let mut archive_paths = Vec::new();
        for entry in fs::read_dir(&root)? {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|e| e == ARCHIVE_EXTENSION) {
                archive_paths.push(path);
            }
        }
        archive_paths.sort();

        for path in archive_paths {
            let archive = AssetArchive::open(&path)?;
            let slot = self.archives.len();
            for (i, asset) in archive.assets().iter().enumerate() {
                self.archived.insert(logical_key(asset.path()), (slot, i));
            }
            debug!("indexed {} entries of {}", archive.len(), path.display());
            self.archives.push(archive);
        }

        self.root = Some(root);
        self.refresh()
    }

    /// Rebuild the loose-file map from the root and every source.
    pub fn refresh(&mut self) -> Result<()> {
        self.files.clear();
        if let Some(root) = self.root.clone() {
            self.index_dir(&root, KeyBase::Subdirectory)?;
        }
        for source in self.sources.clone() {
            self.index_dir(&source, KeyBase::Source)?;
        }
        Ok(())
    }

    /// Add a source directory; its files override what is already indexed.
    pub fn add_source(&mut self, source: impl AsRef<Path>) -> Result<()> {
        let source = source.as_ref().to_path_buf();
        self.index_dir(&source, KeyBase::Source)?;
        self.sources.push(source);
        Ok(())
    }

    /// Remove a source directory and rebuild. Returns false if it was not added.
    pub fn remove_source(&mut self, source: impl AsRef<Path>) -> Result<bool> {
        let source = source.as_ref();
        let Some(pos) = self.sources.iter().position(|s| s == source) else {
            return Ok(false);
        };
        self.sources.remove(pos);
        self.refresh()?;
        Ok(true)
    }

    /// Source directories in the order they were added.
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    /// Archives opened from the root.
    pub fn archives(&self) -> &[AssetArchive] {
        &self.archives
    }

    /// Number of distinct logical paths.
    pub fn len(&self) -> usize {
        self.files.len()
            + self
                .archived
                .keys()
                .filter(|k| !self.files.contains_key(k.as_path()))
                .count()
    }

    /// True if nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.archived.is_empty()
    }

    /// True if `path` is indexed as a loose file or an archived entry.
    pub fn exists(&self, path: &str) -> bool {
        let key = ArchivePath::new(path);
        self.files.contains_key(key) || self.archived.contains_key(key)
    }

    /// Disk location of a loose file, if `path` maps to one.
    pub fn resolve(&self, path: &str) -> Option<&Path> {
        self.files.get(ArchivePath::new(path)).map(PathBuf::as_path)
    }

    /// Open `path` for reading.
    ///
    /// Falls back to `path` as a plain filesystem path before consulting
    /// archives.
    pub fn open(&self, path: &str) -> Result<AssetStream> {
        if let Some(file) = self.resolve(path) {
            return open_whole(file);
        }
        let direct = Path::new(path);
        if direct.is_file() {
            return open_whole(direct);
        }
        match self.archived.get(ArchivePath::new(path)) {
            Some(&(slot, i)) => self.archives[slot].assets()[i].open(),
            None => Err(ArchiveError::entry_not_found(path)),
        }
    }

    /// Entire contents of `path`.
    pub fn read_all_bytes(&self, path: &str) -> Result<Vec<u8>> {
        self.open(path)?.read_all()
    }

    /// Entire contents of `path` as UTF-8 text.
    pub fn read_all_text(&self, path: &str) -> Result<String> {
        String::from_utf8(self.read_all_bytes(path)?)
            .map_err(|err| ArchiveError::encoding(format!("{path}: {err}")))
    }

    /// Lines of `path`, without line terminators.
    pub fn read_all_lines(&self, path: &str) -> Result<Vec<String>> {
        Ok(self.read_all_text(path)?.lines().map(str::to_owned).collect())
    }

    /// Logical paths starting with `prefix`, sorted and deduplicated.
    pub fn files(&self, prefix: &str) -> Vec<String> {
        let keys: BTreeSet<String> = self
            .files
            .keys()
            .chain(self.archived.keys())
            .filter(|k| PathComparer::starts_with(k.as_str(), prefix))
            .map(|k| k.to_forward_slashes())
            .collect();
        keys.into_iter().collect()
    }

    fn index_dir(&mut self, source: &Path, base: KeyBase) -> Result<()> {
        let mut count = 0usize;
        for entry in fs::read_dir(source)? {
            let sub = entry?.path();
            if !sub.is_dir() {
                continue;
            }
            for file in WalkDir::new(&sub).sort_by_file_name() {
                let file = file.map_err(std::io::Error::from)?;
                if !file.file_type().is_file() {
                    continue;
                }
                let relative_to = match base {
                    KeyBase::Subdirectory => sub.as_path(),
                    KeyBase::Source => source,
                };
                let key = logical_key(&relative_key(relative_to, file.path())?);
                let location = fs::canonicalize(file.path())?;
                self.files.insert(key, location);
                count += 1;
            }
        }
        debug!("indexed {count} loose files under {}", source.display());
        Ok(())
    }
}

/// What loose file keys are made relative to.
#[derive(Debug, Clone, Copy)]
enum KeyBase {
    /// The immediate subdirectory holding the file.
    Subdirectory,
    /// The source directory itself.
    Source,
}

fn logical_key(relative: &str) -> ArchivePathBuf {
    ArchivePathBuf::new(format!("{LOGICAL_ROOT}/{relative}"))
}

fn open_whole(path: &Path) -> Result<AssetStream> {
    let file = Arc::new(File::open(path)?);
    Ok(AssetStream::Raw(BoundedStream::whole(file, false)?))
}
