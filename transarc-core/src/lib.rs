//! # Transarc Core
//!
//! Core components for the Transarc asset archive library.
//!
//! This crate provides the building blocks the archive container is made of:
//!
//! - [`binary`]: Fixed-width numbers, length-prefixed strings and float
//!   aggregates over streams and byte slices
//! - [`bounded`]: Read-only windows over a shared seekable source
//! - [`path`]: Separator-insensitive archive path keys
//! - [`entry`]: Entry metadata, asset types and compression kinds
//! - [`traits`]: The payload codec trait and compression levels
//! - [`math`]: Vector, quaternion and matrix records used by asset formats
//! - [`error`]: Error types
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ CLI: transarc create / list / extract / repack          │
//! ├─────────────────────────────────────────────────────────┤
//! │ Container (transarc-archive)                            │
//! │     header codec, packer, reader, file index            │
//! ├─────────────────────────────────────────────────────────┤
//! │ Codec: None / Deflate / FastBlock                       │
//! ├─────────────────────────────────────────────────────────┤
//! │ Primitives (this crate)                                 │
//! │     binary codec, bounded streams, path keys            │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use transarc_core::binary::{BinaryRead, BinaryWrite, Endianness};
//! use transarc_core::path::ArchivePath;
//!
//! let mut buf: Vec<u8> = Vec::new();
//! buf.write_string("textures/rock.png", encoding_rs::UTF_8).unwrap();
//! let path = (&buf[..]).read_string(encoding_rs::UTF_8).unwrap();
//!
//! assert_eq!(ArchivePath::new(&path), ArchivePath::new("textures\\rock.png"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod binary;
pub mod bounded;
pub mod entry;
pub mod error;
pub mod math;
pub mod path;
pub mod traits;

// Re-exports for convenience
pub use binary::{BinaryRead, BinaryWrite, Endianness};
pub use bounded::{BoundedStream, SharedSource};
pub use entry::{ArchiveEntry, AssetType, Compression};
pub use error::{ArchiveError, Result};
pub use math::{Matrix4x4, Quaternion, Vector2, Vector3, Vector4};
pub use path::{ArchivePath, ArchivePathBuf, PathComparer};
pub use traits::{CompressionLevel, PayloadCodec};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::binary::{BinaryRead, BinaryWrite, Endianness};
    pub use crate::bounded::BoundedStream;
    pub use crate::entry::{ArchiveEntry, AssetType, Compression};
    pub use crate::error::{ArchiveError, Result};
    pub use crate::path::{ArchivePath, ArchivePathBuf};
    pub use crate::traits::{CompressionLevel, PayloadCodec};
}
