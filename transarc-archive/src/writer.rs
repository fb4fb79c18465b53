//! Archive writer.
//!
//! Packing reserves the header block, streams every (optionally
//! compressed) payload after it while recording offsets, then seeks back
//! and writes the finished header. Any error aborts the whole pack; a
//! partially written output is left behind and must be rebuilt.

use crate::classify::{classify, SHADER_BYTECODE_EXTENSION};
use crate::compression::encoder_for;
use crate::header::ArchiveHeader;
use crate::reader::label_of;
use encoding_rs::Encoding;
use log::{debug, info, trace};
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::path::{Component, Path, PathBuf};
use transarc_core::binary::{BinaryWrite, Endianness};
use transarc_core::error::{ArchiveError, Result};
use transarc_core::{ArchiveEntry, AssetType, Compression, CompressionLevel};
use walkdir::WalkDir;

/// File extension of packed archives.
pub const ARCHIVE_EXTENSION: &str = "assets";

/// Packing configuration.
#[derive(Debug, Clone)]
pub struct PackOptions {
    /// Compression applied to every payload.
    pub compression: Compression,
    /// Compression effort.
    pub level: CompressionLevel,
    /// Encoding of entry paths in the header.
    pub encoding: &'static Encoding,
    /// Extensions (without the dot) skipped when walking a directory.
    pub excluded_extensions: Vec<String>,
    /// Extension marking compiled shader bytecode.
    pub shader_bytecode_extension: String,
}

impl Default for PackOptions {
    fn default() -> Self {
        Self {
            compression: Compression::None,
            level: CompressionLevel::Optimal,
            encoding: encoding_rs::UTF_8,
            excluded_extensions: ["assets", "dll", "hexlvl"].map(String::from).to_vec(),
            shader_bytecode_extension: SHADER_BYTECODE_EXTENSION.to_owned(),
        }
    }
}

impl PackOptions {
    /// Defaults with the given compression.
    pub fn new(compression: Compression, level: CompressionLevel) -> Self {
        Self {
            compression,
            level,
            ..Self::default()
        }
    }

    /// Use `encoding` for entry paths.
    pub fn with_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Also skip files with `extension`.
    pub fn exclude(mut self, extension: impl Into<String>) -> Self {
        self.excluded_extensions.push(extension.into());
        self
    }

    /// True if a directory walk should skip `path`.
    pub fn is_excluded(&self, path: &Path) -> bool {
        path.extension()
            .and_then(OsStr::to_str)
            .is_some_and(|ext| self.excluded_extensions.iter().any(|e| e == ext))
    }
}

/// Where the bytes of an asset come from.
#[derive(Debug, Clone)]
pub enum AssetData {
    /// Read from a file at pack time.
    File(PathBuf),
    /// Already in memory.
    Bytes(Vec<u8>),
}

/// One asset to pack, with its archive path and type already decided.
#[derive(Debug, Clone)]
pub struct AssetSource {
    /// Path stored in the header.
    pub path: String,
    /// Type stored in the header.
    pub asset_type: AssetType,
    /// Payload source.
    pub data: AssetData,
}

impl AssetSource {
    /// Asset read from `file`.
    pub fn from_file(
        path: impl Into<String>,
        asset_type: AssetType,
        file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            path: path.into(),
            asset_type,
            data: AssetData::File(file.into()),
        }
    }

    /// Asset held in memory.
    pub fn from_bytes(path: impl Into<String>, asset_type: AssetType, bytes: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            asset_type,
            data: AssetData::Bytes(bytes),
        }
    }

    /// Load the raw payload.
    pub fn load(&self) -> Result<Vec<u8>> {
        match &self.data {
            AssetData::File(file) => Ok(fs::read(file)?),
            AssetData::Bytes(bytes) => Ok(bytes.clone()),
        }
    }
}

/// Builds an archive into a seekable writer.
///
/// ```rust
/// use std::io::Cursor;
/// use transarc_archive::writer::{ArchiveWriter, AssetSource, PackOptions};
/// use transarc_core::{AssetType, Compression, CompressionLevel};
///
/// let options = PackOptions::new(Compression::Deflate, CompressionLevel::Optimal);
/// let mut writer = ArchiveWriter::new(Cursor::new(Vec::new()), options);
/// writer.add(AssetSource::from_bytes("hello.txt", AssetType::Binary, b"hello".to_vec()));
/// let bytes = writer.finish().unwrap().into_inner();
/// assert_eq!(&bytes[4..17], b"TransArchive\0");
/// ```
pub struct ArchiveWriter<W: Write + Seek> {
    writer: W,
    options: PackOptions,
    sources: Vec<AssetSource>,
    label: String,
}

impl<W: Write + Seek> ArchiveWriter<W> {
    /// Create a writer; nothing is written until [`Self::finish`].
    pub fn new(writer: W, options: PackOptions) -> Self {
        Self {
            writer,
            options,
            sources: Vec::new(),
            label: String::from("<stream>"),
        }
    }

    /// Name used in log lines.
    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    /// Queue an asset.
    pub fn add(&mut self, source: AssetSource) {
        self.sources.push(source);
    }

    /// Queue an in-memory asset.
    pub fn add_bytes(&mut self, path: impl Into<String>, asset_type: AssetType, bytes: Vec<u8>) {
        self.add(AssetSource::from_bytes(path, asset_type, bytes));
    }

    /// Queue a file.
    pub fn add_file(
        &mut self,
        path: impl Into<String>,
        asset_type: AssetType,
        file: impl Into<PathBuf>,
    ) {
        self.add(AssetSource::from_file(path, asset_type, file));
    }

    /// Number of queued assets.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// True if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Write the archive and return the underlying writer.
    pub fn finish(mut self) -> Result<W> {
        write_archive(&mut self.writer, &self.sources, &self.options, &self.label)?;
        Ok(self.writer)
    }
}

/// Pack `sources` into `out` in the given order.
pub fn write_archive<W: Write + Seek + ?Sized>(
    out: &mut W,
    sources: &[AssetSource],
    options: &PackOptions,
    label: &str,
) -> Result<ArchiveHeader> {
    let entries = sources
        .iter()
        .map(|s| (s.asset_type, s.path.clone()))
        .collect();
    pack(out, entries, options, label, |i| sources[i].load())
}

/// Core pack loop. `load(i)` supplies the raw bytes of entry `i`.
pub(crate) fn pack<W, F>(
    out: &mut W,
    entries: Vec<(AssetType, String)>,
    options: &PackOptions,
    label: &str,
    mut load: F,
) -> Result<ArchiveHeader>
where
    W: Write + Seek + ?Sized,
    F: FnMut(usize) -> Result<Vec<u8>>,
{
    let codec = encoder_for(options.compression, options.level)?;

    let mut header = ArchiveHeader::new(options.compression);
    header.entries = entries
        .into_iter()
        .map(|(ty, path)| ArchiveEntry::new(ty, path))
        .collect();

    let header_size = header.size(options.encoding);
    let header_length = i32::try_from(header_size).map_err(|_| {
        ArchiveError::invalid_header(format!("header of {header_size} bytes exceeds i32"))
    })?;

    let base = out.stream_position()?;
    out.write_i32(header_length, Endianness::Little)?;
    let content_start = base + 4 + header_size as u64;
    out.seek(SeekFrom::Start(content_start))?;
    trace!("{label}: reserved {header_size} header bytes, content at {content_start}");

    let mut position = 0u64;
    for (i, entry) in header.entries.iter_mut().enumerate() {
        let raw = load(i)?;
        let stored = codec.encode(&raw)?;
        out.write_all(&stored)?;

        entry.start = position;
        entry.length = stored.len() as u64;
        entry.actual_length = raw.len() as u64;
        position += entry.length;

        debug!("packing {label} <-- [{}] {}", entry.asset_type, entry.path);
        trace!(
            "{}: start {} stored {} actual {}",
            entry.path, entry.start, entry.length, entry.actual_length
        );
    }

    let end = out.stream_position()?;
    out.seek(SeekFrom::Start(base + 4))?;
    let written = header.write_to(out, options.encoding)?;
    if written != header_size {
        return Err(ArchiveError::invalid_header(format!(
            "header wrote {written} bytes into a {header_size} byte reservation"
        )));
    }
    out.seek(SeekFrom::Start(end))?;
    out.flush()?;
    Ok(header)
}

/// Walk `dir` and turn every non-excluded file into a classified source.
///
/// Files are visited in file-name order. The stored path is the
/// classification-trimmed relative path with `/` separators.
pub fn collect_dir(dir: impl AsRef<Path>, options: &PackOptions) -> Result<Vec<AssetSource>> {
    let dir = dir.as_ref();
    let mut sources = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        if !entry.file_type().is_file() || options.is_excluded(entry.path()) {
            continue;
        }
        let relative = relative_key(dir, entry.path())?;
        let (asset_type, trimmed) = classify(&relative, &options.shader_bytecode_extension);
        sources.push(AssetSource::from_file(trimmed, asset_type, entry.path()));
    }
    Ok(sources)
}

/// Pack a directory tree into `output`.
pub fn create_from(
    dir: impl AsRef<Path>,
    output: impl AsRef<Path>,
    options: &PackOptions,
) -> Result<ArchiveHeader> {
    let sources = collect_dir(dir, options)?;
    create_from_assets(&sources, output, options)
}

/// Pack an explicit list of assets into `output`. Paths and types are
/// stored as given.
pub fn create_from_assets(
    sources: &[AssetSource],
    output: impl AsRef<Path>,
    options: &PackOptions,
) -> Result<ArchiveHeader> {
    let output = output.as_ref();
    // Fail on a bad level before truncating the output.
    encoder_for(options.compression, options.level)?;

    let mut file = BufWriter::new(File::create(output)?);
    let header = write_archive(&mut file, sources, options, &label_of(output))?;
    file.into_inner()
        .map_err(io::IntoInnerError::into_error)?
        .sync_all()?;
    info!(
        "wrote {} ({} entries, {})",
        output.display(),
        header.entries.len(),
        header.compression
    );
    Ok(header)
}

/// Write one `<name>.assets` archive into `root` for every immediate
/// subdirectory `<name>` of `root`.
///
/// With `delete_sources`, each subdirectory is removed once its archive
/// has been written. Returns the archives written, in name order.
pub fn generate_from(
    root: impl AsRef<Path>,
    options: &PackOptions,
    delete_sources: bool,
) -> Result<Vec<PathBuf>> {
    let root = root.as_ref();
    let mut dirs = Vec::new();
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();

    let mut written = Vec::with_capacity(dirs.len());
    for dir in dirs {
        let Some(name) = dir.file_name() else {
            continue;
        };
        let mut file_name = name.to_os_string();
        file_name.push(".");
        file_name.push(ARCHIVE_EXTENSION);
        let output = root.join(file_name);

        create_from(&dir, &output, options)?;
        if delete_sources {
            fs::remove_dir_all(&dir)?;
            debug!("removed {}", dir.display());
        }
        written.push(output);
    }
    Ok(written)
}

/// Relative path of `path` below `base`, joined with `/`.
pub(crate) fn relative_key(base: &Path, path: &Path) -> Result<String> {
    let relative = path.strip_prefix(base).map_err(|_| {
        ArchiveError::invalid_header(format!(
            "{} is not below {}",
            path.display(),
            base.display()
        ))
    })?;

    let mut parts = Vec::new();
    for component in relative.components() {
        if let Component::Normal(part) = component {
            let part = part.to_str().ok_or_else(|| {
                ArchiveError::encoding(format!("{} is not valid UTF-8", path.display()))
            })?;
            parts.push(part);
        }
    }
    Ok(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::MAGIC;
    use std::io::Cursor;

    #[test]
    fn test_layout_of_packed_archive() {
        let mut out = Cursor::new(Vec::new());
        let sources = vec![
            AssetSource::from_bytes("a", AssetType::Binary, b"hello".to_vec()),
            AssetSource::from_bytes("b", AssetType::Script, b"world!".to_vec()),
        ];
        let header = write_archive(&mut out, &sources, &PackOptions::default(), "test").unwrap();
        let bytes = out.into_inner();

        let header_len = i32::from_le_bytes(bytes[..4].try_into().unwrap()) as usize;
        assert_eq!(header_len, header.size(encoding_rs::UTF_8));
        assert_eq!(&bytes[4..4 + MAGIC.len()], &MAGIC);
        assert_eq!(&bytes[4 + header_len..], b"helloworld!");

        assert_eq!(header.entries[0].start, 0);
        assert_eq!(header.entries[1].start, 5);
        assert_eq!(header.entries[1].length, 6);
        assert_eq!(header.entries[1].actual_length, 6);
    }

    #[test]
    fn test_starts_accumulate_compressed_lengths() {
        let mut out = Cursor::new(Vec::new());
        let sources: Vec<_> = (0..4)
            .map(|i| {
                AssetSource::from_bytes(
                    format!("f{i}"),
                    AssetType::Binary,
                    format!("payload {i} ").repeat(50).into_bytes(),
                )
            })
            .collect();
        let options = PackOptions::new(Compression::Deflate, CompressionLevel::Fastest);
        let header = write_archive(&mut out, &sources, &options, "test").unwrap();

        let mut expected = 0;
        for entry in &header.entries {
            assert_eq!(entry.start, expected);
            assert!(entry.length < entry.actual_length);
            expected += entry.length;
        }
        let header_len = header.size(encoding_rs::UTF_8) as u64;
        assert_eq!(out.into_inner().len() as u64, 4 + header_len + expected);
    }

    #[test]
    fn test_empty_archive() {
        let mut out = Cursor::new(Vec::new());
        let header = write_archive(&mut out, &[], &PackOptions::default(), "empty").unwrap();
        assert!(header.entries.is_empty());
        assert_eq!(out.into_inner().len(), 4 + header.size(encoding_rs::UTF_8));
    }

    #[test]
    fn test_no_compression_level_rejected() {
        let options = PackOptions::new(Compression::Deflate, CompressionLevel::NoCompression);
        let writer = ArchiveWriter::new(Cursor::new(Vec::new()), options);
        assert!(matches!(
            writer.finish().unwrap_err(),
            ArchiveError::UnsupportedLevel { .. }
        ));
    }

    #[test]
    fn test_exclusions() {
        let options = PackOptions::default().exclude("tmp");
        assert!(options.is_excluded(Path::new("a/b.assets")));
        assert!(options.is_excluded(Path::new("game.dll")));
        assert!(options.is_excluded(Path::new("x.tmp")));
        assert!(!options.is_excluded(Path::new("rock.png")));
        assert!(!options.is_excluded(Path::new("noext")));
    }

    #[test]
    fn test_relative_key() {
        let base = Path::new("root");
        let path = base.join("textures").join("rock.png");
        assert_eq!(relative_key(base, &path).unwrap(), "textures/rock.png");
        assert!(relative_key(Path::new("elsewhere"), &path).is_err());
    }
}
