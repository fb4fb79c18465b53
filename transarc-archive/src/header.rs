//! Archive header codec.
//!
//! The header block is the entry table stored right after the leading
//! `i32` header length:
//!
//! ```text
//! [13 bytes] magic "TransArchive\0"
//! [u64]      version
//! [i32]      compression kind
//! [i32]      entry count
//! per entry:
//!   [u64] asset type
//!   [i64] start          (relative to 4 + header length)
//!   [i64] length         (stored size)
//!   [i64] actual length  (decoded size)
//!   [i32 + bytes] path
//! ```
//!
//! All numbers are little-endian. The stream form ([`ArchiveHeader::write_to`],
//! [`ArchiveHeader::read_from`]) and the slice form
//! ([`ArchiveHeader::write_slice`], [`ArchiveHeader::read_slice`]) produce
//! identical bytes, and [`ArchiveHeader::size`] always equals what either
//! writer emits.

use encoding_rs::Encoding;
use std::io::{Read, Write};
use transarc_core::binary::{self, span, BinaryRead, BinaryWrite, Endianness};
use transarc_core::error::{ArchiveError, Result};
use transarc_core::{ArchiveEntry, AssetType, Compression};

/// Magic bytes at the start of every header.
pub const MAGIC: [u8; 13] = *b"TransArchive\0";

/// Header format version written and accepted by this build.
pub const VERSION: u64 = 12;

/// Bytes before the first entry: magic, version, compression, count.
const PREAMBLE_SIZE: usize = MAGIC.len() + 8 + 4 + 4;

/// Fixed-width bytes of one entry, excluding its path string.
const ENTRY_FIXED_SIZE: usize = 8 * 4;

const LE: Endianness = Endianness::Little;

/// Decoded archive header.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArchiveHeader {
    /// Compression applied to every payload.
    pub compression: Compression,
    /// Entries in physical payload order.
    pub entries: Vec<ArchiveEntry>,
}

impl ArchiveHeader {
    /// Create an empty header.
    pub fn new(compression: Compression) -> Self {
        Self {
            compression,
            entries: Vec::new(),
        }
    }

    /// Exact number of bytes [`Self::write_to`] will produce.
    pub fn size(&self, encoding: &'static Encoding) -> usize {
        PREAMBLE_SIZE
            + self
                .entries
                .iter()
                .map(|e| ENTRY_FIXED_SIZE + binary::string_size(&e.path, encoding))
                .sum::<usize>()
    }

    /// Serialize into a freshly allocated buffer.
    pub fn to_bytes(&self, encoding: &'static Encoding) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; self.size(encoding)];
        let written = self.write_slice(&mut buf, encoding)?;
        buf.truncate(written);
        Ok(buf)
    }

    /// Write the header to a stream; returns the number of bytes written.
    pub fn write_to<W: Write + ?Sized>(
        &self,
        writer: &mut W,
        encoding: &'static Encoding,
    ) -> Result<usize> {
        writer.write_all(&MAGIC)?;
        let mut written = MAGIC.len();
        written += writer.write_u64(VERSION, LE)?;
        written += writer.write_i32(self.compression.id(), LE)?;
        written += writer.write_i32(entry_count(self.entries.len())?, LE)?;

        for entry in &self.entries {
            written += writer.write_u64(entry.asset_type.id(), LE)?;
            written += writer.write_i64(to_disk(entry.start, "start")?, LE)?;
            written += writer.write_i64(to_disk(entry.length, "length")?, LE)?;
            written += writer.write_i64(to_disk(entry.actual_length, "actual length")?, LE)?;
            written += writer.write_string(&entry.path, encoding)?;
        }
        Ok(written)
    }

    /// Read a header from a stream.
    pub fn read_from<R: Read + ?Sized>(reader: &mut R, encoding: &'static Encoding) -> Result<Self> {
        let mut magic = [0u8; MAGIC.len()];
        reader.read_exact(&mut magic)?;
        check_magic(&magic)?;
        check_version(reader.read_u64(LE)?)?;

        let compression = Compression::from_id(reader.read_i32(LE)?)?;
        let count = from_count(reader.read_i32(LE)?)?;

        let mut entries = Vec::with_capacity(count.min(4096));
        for _ in 0..count {
            let asset_type = AssetType::from_id(reader.read_u64(LE)?);
            let start = from_disk(reader.read_i64(LE)?, "start")?;
            let length = from_disk(reader.read_i64(LE)?, "length")?;
            let actual_length = from_disk(reader.read_i64(LE)?, "actual length")?;
            let path = reader.read_string(encoding)?;
            entries.push(ArchiveEntry {
                asset_type,
                path,
                start,
                length,
                actual_length,
            });
        }

        Ok(Self {
            compression,
            entries,
        })
    }

    /// Write the header into the start of `dst`; returns the bytes used.
    pub fn write_slice(&self, dst: &mut [u8], encoding: &'static Encoding) -> Result<usize> {
        let available = dst.len();
        dst.get_mut(..MAGIC.len())
            .ok_or_else(|| ArchiveError::buffer_too_small(MAGIC.len(), available))?
            .copy_from_slice(&MAGIC);

        let mut pos = MAGIC.len();
        pos += span::write_u64(&mut dst[pos..], VERSION, LE)?;
        pos += span::write_i32(&mut dst[pos..], self.compression.id(), LE)?;
        pos += span::write_i32(&mut dst[pos..], entry_count(self.entries.len())?, LE)?;

        for entry in &self.entries {
            pos += span::write_u64(&mut dst[pos..], entry.asset_type.id(), LE)?;
            pos += span::write_i64(&mut dst[pos..], to_disk(entry.start, "start")?, LE)?;
            pos += span::write_i64(&mut dst[pos..], to_disk(entry.length, "length")?, LE)?;
            pos += span::write_i64(
                &mut dst[pos..],
                to_disk(entry.actual_length, "actual length")?,
                LE,
            )?;
            pos += span::write_string(&mut dst[pos..], &entry.path, encoding)?;
        }
        Ok(pos)
    }

    /// Read a header from the start of `src`; returns it with the bytes consumed.
    pub fn read_slice(src: &[u8], encoding: &'static Encoding) -> Result<(Self, usize)> {
        let magic = src
            .get(..MAGIC.len())
            .ok_or_else(|| ArchiveError::buffer_too_small(MAGIC.len(), src.len()))?;
        check_magic(magic)?;

        let mut pos = MAGIC.len();
        check_version(span::read_u64(&src[pos..], LE)?)?;
        pos += 8;
        let compression = Compression::from_id(span::read_i32(&src[pos..], LE)?)?;
        pos += 4;
        let count = from_count(span::read_i32(&src[pos..], LE)?)?;
        pos += 4;

        let mut entries = Vec::with_capacity(count.min(4096));
        for _ in 0..count {
            let asset_type = AssetType::from_id(span::read_u64(&src[pos..], LE)?);
            pos += 8;
            let start = from_disk(span::read_i64(&src[pos..], LE)?, "start")?;
            pos += 8;
            let length = from_disk(span::read_i64(&src[pos..], LE)?, "length")?;
            pos += 8;
            let actual_length = from_disk(span::read_i64(&src[pos..], LE)?, "actual length")?;
            pos += 8;
            let (path, used) = span::read_string(&src[pos..], encoding)?;
            pos += used;
            entries.push(ArchiveEntry {
                asset_type,
                path,
                start,
                length,
                actual_length,
            });
        }

        Ok((
            Self {
                compression,
                entries,
            },
            pos,
        ))
    }
}

/// Reject `src` early if the bytes it has so far cannot start a header.
///
/// Only the available prefix of the magic is compared, so a short block that
/// still matches passes and is left for the full decode to reject.
pub fn check_magic_prefix(src: &[u8]) -> Result<()> {
    let n = src.len().min(MAGIC.len());
    if src[..n] != MAGIC[..n] {
        return Err(ArchiveError::invalid_magic(MAGIC.to_vec(), src[..n].to_vec()));
    }
    Ok(())
}

fn check_magic(found: &[u8]) -> Result<()> {
    if found != MAGIC {
        return Err(ArchiveError::invalid_magic(MAGIC.to_vec(), found.to_vec()));
    }
    Ok(())
}

fn check_version(found: u64) -> Result<()> {
    if found != VERSION {
        return Err(ArchiveError::unsupported_version(found, VERSION));
    }
    Ok(())
}

fn entry_count(len: usize) -> Result<i32> {
    i32::try_from(len)
        .map_err(|_| ArchiveError::invalid_header(format!("{len} entries exceed the i32 count")))
}

fn from_count(count: i32) -> Result<usize> {
    usize::try_from(count)
        .map_err(|_| ArchiveError::invalid_header(format!("negative entry count {count}")))
}

fn to_disk(value: u64, field: &str) -> Result<i64> {
    i64::try_from(value)
        .map_err(|_| ArchiveError::invalid_header(format!("entry {field} {value} exceeds i64")))
}

fn from_disk(value: i64, field: &str) -> Result<u64> {
    u64::try_from(value)
        .map_err(|_| ArchiveError::invalid_header(format!("negative entry {field} {value}")))
}
