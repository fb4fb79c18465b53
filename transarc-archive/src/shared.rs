//! Reference-counted loose assets.
//!
//! A [`SharedAsset`] tracks how many users currently hold a loose file on
//! disk. The file is opened by the first [`SharedAsset::acquire`] and closed
//! when the last [`SharedAsset::release`] brings the count back to zero.
//! This is unrelated to archive [`crate::reader::Asset`]s, which live as
//! long as their archive.

use parking_lot::Mutex;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use transarc_core::error::{ArchiveError, Result};
use transarc_core::BoundedStream;

/// A loose file shared between users, opened while anyone holds it.
#[derive(Debug)]
pub struct SharedAsset {
    path: PathBuf,
    count: AtomicUsize,
    handle: Mutex<Option<Arc<File>>>,
}

impl SharedAsset {
    /// Track `path`. Nothing is opened yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            count: AtomicUsize::new(0),
            handle: Mutex::new(None),
        }
    }

    /// The tracked file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True if the file currently exists on disk.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Current number of holders.
    pub fn ref_count(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    /// True while the backing file is open.
    pub fn is_open(&self) -> bool {
        self.handle.lock().is_some()
    }

    /// Take a reference, opening the file if this is the first one.
    ///
    /// Returns the new count. If the file cannot be opened the count is
    /// left unchanged.
    pub fn acquire(&self) -> Result<usize> {
        let count = self.count.fetch_add(1, Ordering::AcqRel) + 1;
        let mut handle = self.handle.lock();
        if handle.is_none() {
            match File::open(&self.path) {
                Ok(file) => *handle = Some(Arc::new(file)),
                Err(err) => {
                    self.count.fetch_sub(1, Ordering::AcqRel);
                    return Err(err.into());
                }
            }
        }
        Ok(count)
    }

    /// Drop a reference, closing the file when none remain.
    ///
    /// Returns the new count. Releasing with no holders is a no-op.
    pub fn release(&self) -> usize {
        let previous = self
            .count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
        match previous {
            Ok(1) => {
                let mut handle = self.handle.lock();
                if self.count.load(Ordering::Acquire) == 0 {
                    *handle = None;
                }
                0
            }
            Ok(n) => n - 1,
            Err(_) => 0,
        }
    }

    /// Take a reference released again when the guard is dropped.
    pub fn lease(&self) -> Result<AssetLease<'_>> {
        self.acquire()?;
        Ok(AssetLease { asset: self })
    }

    /// Stream over the whole file. Requires at least one holder.
    pub fn open(&self) -> Result<BoundedStream> {
        let handle = self.handle.lock();
        let file = handle.as_ref().ok_or_else(|| {
            ArchiveError::unsupported(format!(
                "read {} without acquiring it",
                self.path.display()
            ))
        })?;
        BoundedStream::whole(Arc::clone(file), true)
    }
}

/// Scoped reference to a [`SharedAsset`].
#[derive(Debug)]
pub struct AssetLease<'a> {
    asset: &'a SharedAsset,
}

impl AssetLease<'_> {
    /// Stream over the whole file.
    pub fn open(&self) -> Result<BoundedStream> {
        self.asset.open()
    }
}

impl Drop for AssetLease<'_> {
    fn drop(&mut self) {
        self.asset.release();
    }
}
