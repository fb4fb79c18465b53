//! # Transarc Archive
//!
//! The `.assets` container format: many files packed into one blob with
//! an entry table up front and optionally compressed payloads after it.
//!
//! - [`header`]: Entry table codec (magic, version, compression, entries)
//! - [`compression`]: None / Deflate / FastBlock payload codecs
//! - [`classify`]: Asset type detection from folder names
//! - [`writer`]: Packing directories or explicit asset lists
//! - [`reader`]: Opening, looking up, streaming and extracting entries
//! - [`index`]: Logical-path index over loose files and archives
//! - [`shared`]: Reference-counted loose assets
//!
//! ## Layout
//!
//! ```text
//! [i32 header length][header block][payload 0][payload 1]...
//! ```
//!
//! Entry offsets are relative to the first payload byte.
//!
//! ## Example
//!
//! ```rust,no_run
//! use transarc_archive::{writer, AssetArchive, PackOptions};
//! use transarc_core::{Compression, CompressionLevel};
//!
//! let options = PackOptions::new(Compression::Deflate, CompressionLevel::Optimal);
//! writer::create_from("game/data", "data.assets", &options).unwrap();
//!
//! let archive = AssetArchive::open("data.assets").unwrap();
//! for asset in archive.assets() {
//!     println!("[{}] {}", asset.entry().asset_type, asset.path());
//! }
//! let bytes = archive.find("rock.png").unwrap().data().unwrap();
//! # let _ = bytes;
//! archive.extract("out").unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod classify;
pub mod compression;
pub mod header;
pub mod index;
pub mod reader;
pub mod shared;
pub mod writer;

// Re-exports
pub use classify::classify;
pub use compression::{DeflateCodec, FastBlockCodec, StoredCodec, decoder_for, encoder_for};
pub use header::{ArchiveHeader, MAGIC, VERSION};
pub use index::FileIndex;
pub use reader::{Asset, AssetArchive, AssetStream};
pub use shared::{AssetLease, SharedAsset};
pub use writer::{
    ArchiveWriter, AssetData, AssetSource, PackOptions, create_from, create_from_assets,
    generate_from,
};
