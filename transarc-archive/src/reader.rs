//! Archive reader.
//!
//! [`AssetArchive::open`] reads the header eagerly and builds one [`Asset`]
//! per entry. Payloads are only touched when an asset is opened, so a
//! corrupt entry fails when it is read, not when the archive is opened.
//!
//! Every asset shares the archive's file handle. See
//! [`transarc_core::bounded`] for what that means for concurrent reads.

use crate::compression::decoder_for;
use crate::header::{ArchiveHeader, check_magic_prefix};
use crate::writer::{self, PackOptions};
use encoding_rs::Encoding;
use log::{trace, warn};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use transarc_core::error::{ArchiveError, Result};
use transarc_core::{
    ArchiveEntry, ArchivePath, ArchivePathBuf, BoundedStream, Compression, CompressionLevel,
    SharedSource,
};

/// Size of the leading header length field.
pub const HEADER_LENGTH_SIZE: u64 = 4;

/// An opened archive.
pub struct AssetArchive<S: SharedSource = File> {
    source: Arc<S>,
    header: ArchiveHeader,
    header_length: u32,
    assets: Vec<Asset<S>>,
    index: HashMap<ArchivePathBuf, usize>,
    location: Option<PathBuf>,
}

impl AssetArchive<File> {
    /// Open an archive file with UTF-8 entry paths.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_encoding(path, encoding_rs::UTF_8)
    }

    /// Open an archive file whose entry paths use `encoding`.
    pub fn open_with_encoding(path: impl AsRef<Path>, encoding: &'static Encoding) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut archive = Self::from_source(Arc::new(file), encoding)?;
        archive.location = Some(path.to_path_buf());
        Ok(archive)
    }
}

impl<S: SharedSource> AssetArchive<S> {
    /// Read an archive that starts at offset 0 of `source`.
    pub fn from_source(source: Arc<S>, encoding: &'static Encoding) -> Result<Self> {
        let mut len_bytes = [0u8; HEADER_LENGTH_SIZE as usize];
        read_exact_at(source.as_ref(), 0, &mut len_bytes)?;
        let header_length = i32::from_le_bytes(len_bytes);
        let header_length = u32::try_from(header_length).map_err(|_| {
            ArchiveError::invalid_header(format!("negative header length {header_length}"))
        })?;

        let available = source.byte_len()?.saturating_sub(HEADER_LENGTH_SIZE);
        let readable = u64::from(header_length).min(available) as usize;
        let mut block = vec![0u8; readable];
        read_exact_at(source.as_ref(), HEADER_LENGTH_SIZE, &mut block)?;
        check_magic_prefix(&block)?;

        let truncated = readable < header_length as usize;
        let (header, _) = ArchiveHeader::read_slice(&block, encoding).map_err(|err| match err {
            ArchiveError::BufferTooSmall { .. } if truncated => {
                truncated_header(header_length, readable)
            }
            ArchiveError::BufferTooSmall { needed, available } => ArchiveError::invalid_header(
                format!("entry table overruns the {available} byte header block (needs {needed})"),
            ),
            other => other,
        })?;
        if truncated {
            return Err(truncated_header(header_length, readable));
        }

        let content_offset = HEADER_LENGTH_SIZE + u64::from(header_length);
        trace!(
            "header: {} bytes, {} entries, content at {}",
            header_length,
            header.entries.len(),
            content_offset
        );

        let mut assets = Vec::with_capacity(header.entries.len());
        let mut index = HashMap::with_capacity(header.entries.len());
        for (i, entry) in header.entries.iter().enumerate() {
            if entry.is_inflated() {
                warn!(
                    "entry {} stores {} bytes for {} decoded bytes",
                    entry.path, entry.length, entry.actual_length
                );
            }
            assets.push(Asset {
                entry: entry.clone(),
                compression: header.compression,
                offset: content_offset.saturating_add(entry.start),
                source: Arc::clone(&source),
            });
            index.insert(ArchivePathBuf::from(entry.path.as_str()), i);
        }

        Ok(Self {
            source,
            header,
            header_length,
            assets,
            index,
            location: None,
        })
    }

    /// All assets in header order.
    pub fn assets(&self) -> &[Asset<S>] {
        &self.assets
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// True if the archive has no entries.
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// The decoded header.
    pub fn header(&self) -> &ArchiveHeader {
        &self.header
    }

    /// Compression applied to every payload.
    pub fn compression(&self) -> Compression {
        self.header.compression
    }

    /// Size of the header block, excluding its length field.
    pub fn header_length(&self) -> u32 {
        self.header_length
    }

    /// Absolute offset of the first payload byte.
    pub fn content_offset(&self) -> u64 {
        HEADER_LENGTH_SIZE + u64::from(self.header_length)
    }

    /// File the archive was opened from, if any.
    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    /// The shared source every asset reads from.
    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    /// Look up an asset; `\` and `/` are interchangeable, case matters.
    ///
    /// When several entries share a path the last one wins.
    pub fn get(&self, path: &str) -> Option<&Asset<S>> {
        self.index
            .get(ArchivePath::new(path))
            .and_then(|&i| self.assets.get(i))
    }

    /// Like [`Self::get`], failing with [`ArchiveError::EntryNotFound`].
    pub fn find(&self, path: &str) -> Result<&Asset<S>> {
        self.get(path)
            .ok_or_else(|| ArchiveError::entry_not_found(path))
    }

    /// True if an entry with this path exists.
    pub fn contains(&self, path: &str) -> bool {
        self.index.contains_key(ArchivePath::new(path))
    }

    /// Open the decoded contents of an asset by path.
    pub fn open_asset(&self, path: &str) -> Result<AssetStream<S>> {
        self.find(path)?.open()
    }

    /// Extract every asset below `target`, creating directories as needed.
    ///
    /// Returns the number of files written.
    pub fn extract(&self, target: impl AsRef<Path>) -> Result<usize> {
        self.extract_with(target, |_, _| {})
    }

    /// Like [`Self::extract`], calling `on_extracted` after each file.
    pub fn extract_with<F>(&self, target: impl AsRef<Path>, mut on_extracted: F) -> Result<usize>
    where
        F: FnMut(&Asset<S>, &Path),
    {
        let target = target.as_ref();
        fs::create_dir_all(target)?;
        for asset in &self.assets {
            let dest = asset.extract_to(target)?;
            on_extracted(asset, &dest);
        }
        Ok(self.assets.len())
    }

    /// Write every asset into a new archive at `output`, re-encoded with
    /// `compression` at `level`. Entry order, types and paths are kept.
    pub fn save(
        &self,
        output: impl AsRef<Path>,
        compression: Compression,
        level: CompressionLevel,
    ) -> Result<ArchiveHeader> {
        let output = output.as_ref();
        if let Some(location) = &self.location {
            if same_file(location, output) {
                return Err(ArchiveError::unsupported(format!(
                    "save {} over itself",
                    output.display()
                )));
            }
        }

        let options = PackOptions {
            compression,
            level,
            encoding: encoding_rs::UTF_8,
            ..PackOptions::default()
        };
        let entries = self
            .assets
            .iter()
            .map(|a| (a.entry.asset_type, a.entry.path.clone()))
            .collect();

        let mut file = io::BufWriter::new(File::create(output)?);
        let header = writer::pack(&mut file, entries, &options, &label_of(output), |i| {
            self.assets[i].data()
        })?;
        file.into_inner().map_err(io::IntoInnerError::into_error)?.sync_all()?;
        Ok(header)
    }
}

impl<S: SharedSource> std::fmt::Debug for AssetArchive<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetArchive")
            .field("location", &self.location)
            .field("compression", &self.header.compression)
            .field("entries", &self.assets.len())
            .finish()
    }
}

/// Read handle bound to one entry of an open archive.
pub struct Asset<S: SharedSource = File> {
    entry: ArchiveEntry,
    compression: Compression,
    offset: u64,
    source: Arc<S>,
}

impl<S: SharedSource> Asset<S> {
    /// Header metadata of this entry.
    pub fn entry(&self) -> &ArchiveEntry {
        &self.entry
    }

    /// Lookup path of this entry.
    pub fn path(&self) -> &str {
        &self.entry.path
    }

    /// Absolute offset of the stored payload in the archive.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Stream over the stored (possibly compressed) bytes.
    pub fn open_raw(&self) -> BoundedStream<S> {
        BoundedStream::new(Arc::clone(&self.source), self.offset, self.entry.length, true)
    }

    /// Stream over the decoded contents.
    ///
    /// Stored entries stream straight from the archive. Compressed entries
    /// are decoded in full first.
    pub fn open(&self) -> Result<AssetStream<S>> {
        if self.compression.is_stored() {
            return Ok(AssetStream::Raw(self.open_raw()));
        }
        Ok(AssetStream::Decoded(Cursor::new(self.data()?)))
    }

    /// The decoded contents.
    ///
    /// Stored entries return their `length` bytes as recorded. Compressed
    /// entries must decode to exactly `actual_length` bytes.
    pub fn data(&self) -> Result<Vec<u8>> {
        let stored = self.open_raw().read_all()?;
        if self.compression.is_stored() {
            return Ok(stored);
        }
        let decoded = decoder_for(self.compression).decode(&stored, self.entry.actual_length)?;
        if decoded.len() as u64 != self.entry.actual_length {
            return Err(ArchiveError::length_mismatch(
                &self.entry.path,
                self.entry.actual_length,
                decoded.len() as u64,
            ));
        }
        Ok(decoded)
    }

    /// Copy the decoded contents into `writer`; returns the bytes copied.
    pub fn copy_to<W: Write + ?Sized>(&self, writer: &mut W) -> Result<u64> {
        match self.open()? {
            AssetStream::Raw(stream) => Ok(io::copy(&mut &stream, writer)?),
            AssetStream::Decoded(cursor) => {
                let data = cursor.into_inner();
                writer.write_all(&data)?;
                Ok(data.len() as u64)
            }
        }
    }

    /// Write this asset below `target`; returns the file written.
    pub fn extract_to(&self, target: &Path) -> Result<PathBuf> {
        let dest = target.join(safe_relative(&self.entry.path)?);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = io::BufWriter::new(File::create(&dest)?);
        self.copy_to(&mut file)?;
        file.flush()?;
        Ok(dest)
    }
}

impl<S: SharedSource> std::fmt::Debug for Asset<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Asset")
            .field("entry", &self.entry)
            .field("compression", &self.compression)
            .field("offset", &self.offset)
            .finish()
    }
}

/// Readable contents of one asset.
#[derive(Debug)]
pub enum AssetStream<S: SharedSource = File> {
    /// Window straight into the archive.
    Raw(BoundedStream<S>),
    /// Fully decoded payload.
    Decoded(Cursor<Vec<u8>>),
}

impl<S: SharedSource> AssetStream<S> {
    /// Total decoded length.
    pub fn len(&self) -> u64 {
        match self {
            Self::Raw(stream) => stream.len(),
            Self::Decoded(cursor) => cursor.get_ref().len() as u64,
        }
    }

    /// True if there is nothing to read.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read everything from the start.
    pub fn read_all(&mut self) -> Result<Vec<u8>> {
        match self {
            Self::Raw(stream) => stream.read_all(),
            Self::Decoded(cursor) => {
                cursor.set_position(cursor.get_ref().len() as u64);
                Ok(cursor.get_ref().clone())
            }
        }
    }
}

impl<S: SharedSource> Read for AssetStream<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Raw(stream) => stream.read(buf),
            Self::Decoded(cursor) => cursor.read(buf),
        }
    }
}

impl<S: SharedSource> Seek for AssetStream<S> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            Self::Raw(stream) => stream.seek(pos),
            Self::Decoded(cursor) => cursor.seek(pos),
        }
    }
}

/// Turn an entry path into a relative filesystem path that stays below
/// the extraction directory.
pub fn safe_relative(path: &str) -> Result<PathBuf> {
    if path.starts_with(['/', '\\']) {
        return Err(ArchiveError::path_traversal(path));
    }

    let mut out = PathBuf::new();
    for segment in ArchivePath::new(path).segments() {
        match Path::new(segment).components().next() {
            _ if segment == "." => continue,
            Some(Component::Normal(_)) if !segment.contains(':') => out.push(segment),
            _ => return Err(ArchiveError::path_traversal(path)),
        }
    }
    if out.as_os_str().is_empty() {
        return Err(ArchiveError::path_traversal(path));
    }
    Ok(out)
}

fn truncated_header(declared: u32, available: usize) -> ArchiveError {
    io::Error::new(
        io::ErrorKind::UnexpectedEof,
        format!("archive truncated: header declares {declared} bytes, file holds {available}"),
    )
    .into()
}

fn read_exact_at<S: SharedSource + ?Sized>(source: &S, offset: u64, buf: &mut [u8]) -> Result<()> {
    let mut filled = 0;
    while filled < buf.len() {
        let read = source.read_at(offset + filled as u64, &mut buf[filled..])?;
        if read == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "archive truncated: needed {} bytes at offset {offset}, got {filled}",
                    buf.len()
                ),
            )
            .into());
        }
        filled += read;
    }
    Ok(())
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

pub(crate) fn label_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
