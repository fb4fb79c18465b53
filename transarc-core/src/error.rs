//! Error types for Transarc operations.
//!
//! Every fallible operation in the archive stack returns [`ArchiveError`].
//! Errors are surfaced to the immediate caller and never logged here.

use std::io;
use thiserror::Error;

/// The main error type for Transarc operations.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// I/O error from the underlying file or stream.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The archive does not start with the expected magic bytes.
    #[error("Invalid magic number: expected {expected:02x?}, found {found:02x?}")]
    InvalidMagic {
        /// Expected magic bytes.
        expected: Vec<u8>,
        /// Actual bytes found.
        found: Vec<u8>,
    },

    /// The archive was written with a format version this build cannot read.
    #[error("Unsupported archive version {found} (supported: {supported})")]
    UnsupportedVersion {
        /// Version stored in the header.
        found: u64,
        /// Version understood by this build.
        supported: u64,
    },

    /// Structurally invalid header (truncated table, negative lengths, unknown enums).
    #[error("Invalid header: {message}")]
    InvalidHeader {
        /// Description of the header error.
        message: String,
    },

    /// No entry matches the requested path.
    #[error("Entry not found: {path}")]
    EntryNotFound {
        /// The path that was looked up.
        path: String,
    },

    /// The operation is not supported by this object.
    #[error("Unsupported operation: {operation}")]
    Unsupported {
        /// Description of the rejected operation.
        operation: String,
    },

    /// A compression kind was combined with a level it cannot honor.
    #[error("Compression level {level} is not supported for {kind}")]
    UnsupportedLevel {
        /// Compression kind name.
        kind: String,
        /// Requested level name.
        level: String,
    },

    /// The compressed payload of an entry could not be decoded.
    #[error("Codec error: {0}")]
    Codec(#[from] oxiarc_core::OxiArcError),

    /// A decoded payload does not have the length recorded in the header.
    #[error("Length mismatch for {path}: header says {expected} bytes, decoded {actual}")]
    LengthMismatch {
        /// Entry path.
        path: String,
        /// Length recorded in the header.
        expected: u64,
        /// Length actually produced.
        actual: u64,
    },

    /// Destination or source span is too short for the value.
    #[error("Buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall {
        /// Number of bytes needed.
        needed: usize,
        /// Number of bytes available.
        available: usize,
    },

    /// An entry path would escape the extraction directory.
    #[error("Path traversal detected in entry: {path}")]
    PathTraversal {
        /// The offending path.
        path: String,
    },

    /// Text could not be encoded or decoded with the requested encoding.
    #[error("Encoding error: {message}")]
    Encoding {
        /// Description of the encoding error.
        message: String,
    },
}

/// Result type alias for Transarc operations.
pub type Result<T> = std::result::Result<T, ArchiveError>;

impl ArchiveError {
    /// Create an invalid magic error.
    pub fn invalid_magic(expected: impl Into<Vec<u8>>, found: impl Into<Vec<u8>>) -> Self {
        Self::InvalidMagic {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create an unsupported version error.
    pub fn unsupported_version(found: u64, supported: u64) -> Self {
        Self::UnsupportedVersion { found, supported }
    }

    /// Create an invalid header error.
    pub fn invalid_header(message: impl Into<String>) -> Self {
        Self::InvalidHeader {
            message: message.into(),
        }
    }

    /// Create an entry not found error.
    pub fn entry_not_found(path: impl Into<String>) -> Self {
        Self::EntryNotFound { path: path.into() }
    }

    /// Create an unsupported operation error.
    pub fn unsupported(operation: impl Into<String>) -> Self {
        Self::Unsupported {
            operation: operation.into(),
        }
    }

    /// Create an unsupported compression level error.
    pub fn unsupported_level(kind: impl Into<String>, level: impl Into<String>) -> Self {
        Self::UnsupportedLevel {
            kind: kind.into(),
            level: level.into(),
        }
    }

    /// Create a length mismatch error.
    pub fn length_mismatch(path: impl Into<String>, expected: u64, actual: u64) -> Self {
        Self::LengthMismatch {
            path: path.into(),
            expected,
            actual,
        }
    }

    /// Create a buffer too small error.
    pub fn buffer_too_small(needed: usize, available: usize) -> Self {
        Self::BufferTooSmall { needed, available }
    }

    /// Create a path traversal error.
    pub fn path_traversal(path: impl Into<String>) -> Self {
        Self::PathTraversal { path: path.into() }
    }

    /// Create an encoding error.
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding {
            message: message.into(),
        }
    }

    /// True for the errors that mean "this is not a readable archive".
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidMagic { .. } | Self::UnsupportedVersion { .. } | Self::InvalidHeader { .. }
        )
    }

    /// True for the unsupported-operation family.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. } | Self::UnsupportedLevel { .. })
    }
}

impl From<ArchiveError> for io::Error {
    fn from(err: ArchiveError) -> Self {
        match err {
            ArchiveError::Io(inner) => inner,
            ArchiveError::Unsupported { .. } | ArchiveError::UnsupportedLevel { .. } => {
                io::Error::new(io::ErrorKind::Unsupported, err)
            }
            ArchiveError::EntryNotFound { .. } => io::Error::new(io::ErrorKind::NotFound, err),
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}
