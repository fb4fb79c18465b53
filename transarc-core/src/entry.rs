//! Archive entry metadata.
//!
//! This module defines [`ArchiveEntry`], one row of the archive's entry
//! table, together with the [`AssetType`] and [`Compression`] enums stored
//! in the header.

use crate::error::{ArchiveError, Result};
use std::fmt;

/// Kind of asset stored in an entry.
///
/// Stored on disk as a `u64`. Values this build does not know are kept as
/// [`AssetType::Unknown`] so that newer archives still list and extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AssetType {
    /// Opaque bytes.
    #[default]
    Binary,
    /// Material definition.
    Material,
    /// Texture image.
    Texture,
    /// Mesh geometry.
    Mesh,
    /// Font file.
    Font,
    /// Sound clip.
    Sound,
    /// Script source.
    Script,
    /// Shader source code.
    ShaderSource,
    /// Compiled shader bytecode.
    ShaderBytecode,
    /// Unrecognized type id.
    Unknown(u64),
}

impl AssetType {
    /// Every known type, in id order.
    pub const ALL: [AssetType; 9] = [
        Self::Binary,
        Self::Material,
        Self::Texture,
        Self::Mesh,
        Self::Font,
        Self::Sound,
        Self::Script,
        Self::ShaderSource,
        Self::ShaderBytecode,
    ];

    /// On-disk id.
    pub fn id(self) -> u64 {
        match self {
            Self::Binary => 0,
            Self::Material => 1,
            Self::Texture => 2,
            Self::Mesh => 3,
            Self::Font => 4,
            Self::Sound => 5,
            Self::Script => 6,
            Self::ShaderSource => 7,
            Self::ShaderBytecode => 8,
            Self::Unknown(id) => id,
        }
    }

    /// Map an on-disk id back to a type.
    pub fn from_id(id: u64) -> Self {
        usize::try_from(id)
            .ok()
            .and_then(|idx| Self::ALL.get(idx).copied())
            .unwrap_or(Self::Unknown(id))
    }

    /// Get the type name as a string.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Binary => "Binary",
            Self::Material => "Material",
            Self::Texture => "Texture",
            Self::Mesh => "Mesh",
            Self::Font => "Font",
            Self::Sound => "Sound",
            Self::Script => "Script",
            Self::ShaderSource => "ShaderSource",
            Self::ShaderBytecode => "ShaderBytecode",
            Self::Unknown(_) => "Unknown",
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(id) => write!(f, "Unknown({})", id),
            _ => write!(f, "{}", self.name()),
        }
    }
}

/// Payload transform applied uniformly to every entry of an archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Compression {
    /// Payloads are stored verbatim.
    #[default]
    None,
    /// Raw DEFLATE (RFC 1951).
    Deflate,
    /// LZ4-family block compression.
    FastBlock,
}

impl Compression {
    /// On-disk id.
    pub fn id(self) -> i32 {
        match self {
            Self::None => 0,
            Self::Deflate => 1,
            Self::FastBlock => 2,
        }
    }

    /// Map an on-disk id back to a kind.
    pub fn from_id(id: i32) -> Result<Self> {
        match id {
            0 => Ok(Self::None),
            1 => Ok(Self::Deflate),
            2 => Ok(Self::FastBlock),
            other => Err(ArchiveError::invalid_header(format!(
                "unknown compression kind {other}"
            ))),
        }
    }

    /// Check if this kind stores payloads verbatim.
    pub fn is_stored(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Get the kind name as a string.
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Deflate => "Deflate",
            Self::FastBlock => "FastBlock",
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One entry of the archive's header table.
///
/// `start` is relative to the first payload byte (just past the header
/// block). `length` is the stored size, `actual_length` the decoded size.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArchiveEntry {
    /// The type of the asset.
    pub asset_type: AssetType,
    /// Lookup key inside the archive.
    pub path: String,
    /// Payload offset relative to the content region.
    pub start: u64,
    /// Stored (possibly compressed) size in bytes.
    pub length: u64,
    /// Decompressed size in bytes.
    pub actual_length: u64,
}

impl ArchiveEntry {
    /// Create an entry with no payload recorded yet.
    pub fn new(asset_type: AssetType, path: impl Into<String>) -> Self {
        Self {
            asset_type,
            path: path.into(),
            ..Self::default()
        }
    }

    /// Offset one past the payload, relative to the content region.
    pub fn end(&self) -> u64 {
        self.start.saturating_add(self.length)
    }

    /// Stored size divided by decoded size (1.0 for empty entries).
    pub fn compression_ratio(&self) -> f64 {
        if self.actual_length == 0 {
            1.0
        } else {
            self.length as f64 / self.actual_length as f64
        }
    }

    /// Percentage of space saved by compression.
    pub fn space_savings(&self) -> f64 {
        (1.0 - self.compression_ratio()) * 100.0
    }

    /// True when the header claims more stored than decoded bytes.
    pub fn is_inflated(&self) -> bool {
        self.length > self.actual_length
    }
}
