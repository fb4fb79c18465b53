//! Core traits for payload transforms.
//!
//! An archive applies one [`PayloadCodec`] to every entry: `encode` at pack
//! time, `decode` when an entry is read back.

use crate::entry::Compression;
use crate::error::Result;
use std::fmt;

/// A whole-payload transform, applied per entry.
pub trait PayloadCodec: Send + Sync {
    /// The compression kind recorded in the header for this codec.
    fn kind(&self) -> Compression;

    /// Transform raw entry bytes into stored bytes.
    fn encode(&self, input: &[u8]) -> Result<Vec<u8>>;

    /// Reverse [`PayloadCodec::encode`]. `actual_length` is the decoded size
    /// recorded in the header and bounds the output.
    fn decode(&self, input: &[u8], actual_length: u64) -> Result<Vec<u8>>;
}

/// Requested compression effort.
///
/// Kinds map these onto their own settings; a kind may reject a level it
/// cannot honor rather than silently falling back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompressionLevel {
    /// Unspecified; the kind's own default.
    #[default]
    Default,
    /// Balance ratio and speed.
    Optimal,
    /// Favor speed.
    Fastest,
    /// Store without compressing.
    NoCompression,
    /// Favor ratio regardless of speed.
    SmallestSize,
}

impl CompressionLevel {
    /// Get the level name as a string.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Default => "Default",
            Self::Optimal => "Optimal",
            Self::Fastest => "Fastest",
            Self::NoCompression => "NoCompression",
            Self::SmallestSize => "SmallestSize",
        }
    }
}

impl fmt::Display for CompressionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
