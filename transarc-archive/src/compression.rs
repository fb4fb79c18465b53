//! Payload codecs for the archive-wide compression kinds.
//!
//! Every payload is transformed as a whole. Empty inputs are stored as zero
//! bytes for every kind and a zero-length payload decodes to nothing.
//!
//! | Level | Deflate | FastBlock |
//! |---|---|---|
//! | `Default` | 6 | fast block |
//! | `Optimal` | 6 | HC 11 |
//! | `Fastest` | 1 | fast block |
//! | `SmallestSize` | 9 | HC 12 |
//! | `NoCompression` | rejected | rejected |

use oxiarc_lz4::HcLevel;
use transarc_core::error::{ArchiveError, Result};
use transarc_core::{Compression, CompressionLevel, PayloadCodec};

/// Identity transform.
#[derive(Debug, Clone, Copy, Default)]
pub struct StoredCodec;

impl PayloadCodec for StoredCodec {
    fn kind(&self) -> Compression {
        Compression::None
    }

    fn encode(&self, input: &[u8]) -> Result<Vec<u8>> {
        Ok(input.to_vec())
    }

    fn decode(&self, input: &[u8], _actual_length: u64) -> Result<Vec<u8>> {
        Ok(input.to_vec())
    }
}

/// Raw DEFLATE.
#[derive(Debug, Clone, Copy)]
pub struct DeflateCodec {
    level: u8,
}

impl DeflateCodec {
    /// Map a compression level onto a DEFLATE level.
    pub fn new(level: CompressionLevel) -> Result<Self> {
        let level = match level {
            CompressionLevel::Default | CompressionLevel::Optimal => 6,
            CompressionLevel::Fastest => 1,
            CompressionLevel::SmallestSize => 9,
            CompressionLevel::NoCompression => {
                return Err(ArchiveError::unsupported_level(
                    Compression::Deflate.name(),
                    level.name(),
                ));
            }
        };
        Ok(Self { level })
    }

    /// The numeric DEFLATE level.
    pub fn level(&self) -> u8 {
        self.level
    }
}

impl Default for DeflateCodec {
    fn default() -> Self {
        Self { level: 6 }
    }
}

impl PayloadCodec for DeflateCodec {
    fn kind(&self) -> Compression {
        Compression::Deflate
    }

    fn encode(&self, input: &[u8]) -> Result<Vec<u8>> {
        if input.is_empty() {
            return Ok(Vec::new());
        }
        Ok(oxiarc_deflate::deflate(input, self.level)?)
    }

    fn decode(&self, input: &[u8], _actual_length: u64) -> Result<Vec<u8>> {
        if input.is_empty() {
            return Ok(Vec::new());
        }
        Ok(oxiarc_deflate::inflate(input)?)
    }
}

/// LZ4 block compression; `None` selects the fast block compressor,
/// otherwise the HC compressor at the given level.
#[derive(Debug, Clone, Copy, Default)]
pub struct FastBlockCodec {
    hc: Option<HcLevel>,
}

impl FastBlockCodec {
    /// Map a compression level onto the block compressor.
    pub fn new(level: CompressionLevel) -> Result<Self> {
        let hc = match level {
            CompressionLevel::Default | CompressionLevel::Fastest => None,
            CompressionLevel::Optimal => Some(HcLevel::DEFAULT),
            // HcLevel::MAX runs the optimal parser, which emits literals only
            // in oxiarc-lz4 0.2 and grows the payload.
            CompressionLevel::SmallestSize => HcLevel::new(11),
            CompressionLevel::NoCompression => {
                return Err(ArchiveError::unsupported_level(
                    Compression::FastBlock.name(),
                    level.name(),
                ));
            }
        };
        Ok(Self { hc })
    }

    /// The HC level in use, if any.
    pub fn hc_level(&self) -> Option<u8> {
        self.hc.map(HcLevel::level)
    }
}

impl PayloadCodec for FastBlockCodec {
    fn kind(&self) -> Compression {
        Compression::FastBlock
    }

    fn encode(&self, input: &[u8]) -> Result<Vec<u8>> {
        if input.is_empty() {
            return Ok(Vec::new());
        }
        let out = match self.hc {
            Some(level) => oxiarc_lz4::compress_hc_level(input, level)?,
            None => oxiarc_lz4::compress_block(input)?,
        };
        Ok(out)
    }

    fn decode(&self, input: &[u8], actual_length: u64) -> Result<Vec<u8>> {
        if input.is_empty() {
            return Ok(Vec::new());
        }
        let max_output = usize::try_from(actual_length).map_err(|_| {
            ArchiveError::invalid_header(format!("actual length {actual_length} exceeds memory"))
        })?;
        Ok(oxiarc_lz4::decompress_block(input, max_output)?)
    }
}

/// Codec that packs payloads with `kind` at `level`.
///
/// Compressing kinds reject [`CompressionLevel::NoCompression`]; `None`
/// accepts any level.
pub fn encoder_for(kind: Compression, level: CompressionLevel) -> Result<Box<dyn PayloadCodec>> {
    Ok(match kind {
        Compression::None => Box::new(StoredCodec),
        Compression::Deflate => Box::new(DeflateCodec::new(level)?),
        Compression::FastBlock => Box::new(FastBlockCodec::new(level)?),
    })
}

/// Codec that reads payloads packed with `kind`. Decoding is level-independent.
pub fn decoder_for(kind: Compression) -> Box<dyn PayloadCodec> {
    match kind {
        Compression::None => Box::new(StoredCodec),
        Compression::Deflate => Box::new(DeflateCodec::default()),
        Compression::FastBlock => Box::new(FastBlockCodec::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEVELS: [CompressionLevel; 4] = [
        CompressionLevel::Default,
        CompressionLevel::Optimal,
        CompressionLevel::Fastest,
        CompressionLevel::SmallestSize,
    ];

    fn sample() -> Vec<u8> {
        "The quick brown fox jumps over the lazy dog. "
            .repeat(64)
            .into_bytes()
    }

    #[test]
    fn test_deflate_levels() {
        assert_eq!(DeflateCodec::new(CompressionLevel::Optimal).unwrap().level(), 6);
        assert_eq!(DeflateCodec::new(CompressionLevel::Fastest).unwrap().level(), 1);
        assert_eq!(DeflateCodec::new(CompressionLevel::SmallestSize).unwrap().level(), 9);
        assert_eq!(DeflateCodec::new(CompressionLevel::Default).unwrap().level(), 6);
    }

    #[test]
    fn test_fast_block_levels() {
        assert_eq!(FastBlockCodec::new(CompressionLevel::Default).unwrap().hc_level(), None);
        assert_eq!(FastBlockCodec::new(CompressionLevel::Fastest).unwrap().hc_level(), None);
        assert_eq!(FastBlockCodec::new(CompressionLevel::Optimal).unwrap().hc_level(), Some(9));
        assert_eq!(
            FastBlockCodec::new(CompressionLevel::SmallestSize).unwrap().hc_level(),
            Some(11)
        );
    }

    #[test]
    fn test_smallest_size_is_not_larger_than_fastest() {
        let data = sample();
        for kind in [Compression::Deflate, Compression::FastBlock] {
            let fastest = encoder_for(kind, CompressionLevel::Fastest).unwrap().encode(&data).unwrap();
            let smallest = encoder_for(kind, CompressionLevel::SmallestSize)
                .unwrap()
                .encode(&data)
                .unwrap();
            assert!(
                smallest.len() <= fastest.len(),
                "{kind}: smallest {} > fastest {}",
                smallest.len(),
                fastest.len()
            );
        }
    }

    #[test]
    fn test_no_compression_level_rejected() {
        for kind in [Compression::Deflate, Compression::FastBlock] {
            let err = encoder_for(kind, CompressionLevel::NoCompression)
                .err()
                .expect("level must be rejected");
            assert!(err.is_unsupported());
            assert!(matches!(err, ArchiveError::UnsupportedLevel { .. }));
        }
        assert!(encoder_for(Compression::None, CompressionLevel::NoCompression).is_ok());
    }

    #[test]
    fn test_roundtrip_every_kind_and_level() {
        let data = sample();
        for kind in [Compression::None, Compression::Deflate, Compression::FastBlock] {
            for level in LEVELS {
                let codec = encoder_for(kind, level).unwrap();
                assert_eq!(codec.kind(), kind);
                let stored = codec.encode(&data).unwrap();
                if !kind.is_stored() {
                    assert!(stored.len() < data.len(), "{kind} {level} did not compress");
                }
                let decoded = decoder_for(kind).decode(&stored, data.len() as u64).unwrap();
                assert_eq!(decoded, data);
            }
        }
    }

    #[test]
    fn test_empty_payloads() {
        for kind in [Compression::None, Compression::Deflate, Compression::FastBlock] {
            let codec = encoder_for(kind, CompressionLevel::Optimal).unwrap();
            assert!(codec.encode(&[]).unwrap().is_empty());
            assert!(decoder_for(kind).decode(&[], 0).unwrap().is_empty());
        }
    }

    #[test]
    fn test_corrupt_deflate_fails() {
        let garbage = [0xFFu8; 16];
        assert!(decoder_for(Compression::Deflate).decode(&garbage, 16).is_err());
    }
}
