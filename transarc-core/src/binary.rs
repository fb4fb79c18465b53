//! Binary primitive codec.
//!
//! Fixed-width numbers, length-prefixed strings and float aggregates in two
//! flavors that must produce identical bytes:
//!
//! - [`BinaryRead`] / [`BinaryWrite`]: extension traits over any
//!   [`std::io::Read`] / [`std::io::Write`].
//! - [`span`]: free functions over byte slices, for callers that pre-size a
//!   buffer and chain writes by the returned byte counts.
//!
//! Strings are an `i32` little-endian byte count followed by the encoded
//! bytes, with no terminator. The count is always the *encoded* length.
//!
//! ## Example
//!
//! ```rust
//! use transarc_core::binary::{span, BinaryRead, BinaryWrite, Endianness};
//!
//! let mut stream: Vec<u8> = Vec::new();
//! stream.write_u32(0xDEAD_BEEF, Endianness::Big).unwrap();
//!
//! let mut buf = [0u8; 4];
//! span::write_u32(&mut buf, 0xDEAD_BEEF, Endianness::Big).unwrap();
//! assert_eq!(stream, buf);
//!
//! let value = (&stream[..]).read_u32(Endianness::Big).unwrap();
//! assert_eq!(value, 0xDEAD_BEEF);
//! ```

use crate::error::{ArchiveError, Result};
use crate::math::{Matrix4x4, Quaternion, Vector2, Vector3, Vector4};
use encoding_rs::Encoding;
use std::borrow::Cow;
use std::io::{self, Read, Write};

/// Byte order of a fixed-width value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endianness {
    /// Least significant byte first (the archive default).
    #[default]
    Little,
    /// Most significant byte first.
    Big,
}

/// Size in bytes of the string length prefix.
pub const STRING_PREFIX_SIZE: usize = 4;

/// Encode `value` with `encoding`, borrowing when the encoding is UTF-8.
///
/// Characters the encoding cannot represent are an error rather than being
/// replaced, so that a written string always reads back unchanged.
pub fn encode_text<'a>(value: &'a str, encoding: &'static Encoding) -> Result<Cow<'a, [u8]>> {
    if encoding == encoding_rs::UTF_8 {
        return Ok(Cow::Borrowed(value.as_bytes()));
    }
    let (bytes, _, had_errors) = encoding.encode(value);
    if had_errors {
        return Err(ArchiveError::encoding(format!(
            "{value:?} is not representable in {}",
            encoding.name()
        )));
    }
    Ok(bytes)
}

/// Decode `bytes` with `encoding`, failing on malformed input.
pub fn decode_text(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(Cow::into_owned)
        .ok_or_else(|| ArchiveError::encoding(format!("malformed {} text", encoding.name())))
}

/// Number of bytes a length-prefixed string occupies once encoded.
pub fn string_size(value: &str, encoding: &'static Encoding) -> usize {
    let payload = if encoding == encoding_rs::UTF_8 {
        value.len()
    } else {
        encoding.encode(value).0.len()
    };
    STRING_PREFIX_SIZE + payload
}

fn prefix_len(len: usize) -> Result<i32> {
    i32::try_from(len)
        .map_err(|_| ArchiveError::encoding(format!("string of {len} bytes exceeds the i32 prefix")))
}

fn checked_len(len: i32) -> Result<usize> {
    usize::try_from(len)
        .map_err(|_| ArchiveError::invalid_header(format!("negative string length {len}")))
}

macro_rules! stream_reads {
    ($($ty:ty => $name:ident),* $(,)?) => {$(
        #[doc = concat!("Read a `", stringify!($ty), "` in the given byte order.")]
        fn $name(&mut self, endian: Endianness) -> Result<$ty> {
            let mut buf = [0u8; std::mem::size_of::<$ty>()];
            self.read_exact(&mut buf)?;
            Ok(match endian {
                Endianness::Little => <$ty>::from_le_bytes(buf),
                Endianness::Big => <$ty>::from_be_bytes(buf),
            })
        }
    )*};
}

macro_rules! stream_writes {
    ($($ty:ty => $name:ident),* $(,)?) => {$(
        #[doc = concat!("Write a `", stringify!($ty), "` and return the byte count.")]
        fn $name(&mut self, value: $ty, endian: Endianness) -> Result<usize> {
            let bytes = match endian {
                Endianness::Little => value.to_le_bytes(),
                Endianness::Big => value.to_be_bytes(),
            };
            self.write_all(&bytes)?;
            Ok(bytes.len())
        }
    )*};
}

/// Primitive decoding over any reader.
pub trait BinaryRead: Read {
    stream_reads! {
        u8 => read_u8,
        i8 => read_i8,
        u16 => read_u16,
        i16 => read_i16,
        u32 => read_u32,
        i32 => read_i32,
        u64 => read_u64,
        i64 => read_i64,
        f32 => read_f32,
        f64 => read_f64,
    }

    /// Read a length-prefixed string.
    fn read_string(&mut self, encoding: &'static Encoding) -> Result<String> {
        let len = checked_len(self.read_i32(Endianness::Little)?)?;
        let mut buf = Vec::with_capacity(len.min(64 * 1024));
        (&mut *self).take(len as u64).read_to_end(&mut buf)?;
        if buf.len() != len {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("string needs {len} bytes, stream had {}", buf.len()),
            )
            .into());
        }
        decode_text(&buf, encoding)
    }

    /// Read a [`Vector2`].
    fn read_vector2(&mut self, endian: Endianness) -> Result<Vector2> {
        Ok(Vector2 {
            x: self.read_f32(endian)?,
            y: self.read_f32(endian)?,
        })
    }

    /// Read a [`Vector3`].
    fn read_vector3(&mut self, endian: Endianness) -> Result<Vector3> {
        Ok(Vector3 {
            x: self.read_f32(endian)?,
            y: self.read_f32(endian)?,
            z: self.read_f32(endian)?,
        })
    }

    /// Read a [`Vector4`].
    fn read_vector4(&mut self, endian: Endianness) -> Result<Vector4> {
        Ok(Vector4 {
            x: self.read_f32(endian)?,
            y: self.read_f32(endian)?,
            z: self.read_f32(endian)?,
            w: self.read_f32(endian)?,
        })
    }

    /// Read a [`Quaternion`].
    fn read_quaternion(&mut self, endian: Endianness) -> Result<Quaternion> {
        Ok(Quaternion {
            x: self.read_f32(endian)?,
            y: self.read_f32(endian)?,
            z: self.read_f32(endian)?,
            w: self.read_f32(endian)?,
        })
    }

    /// Read a [`Matrix4x4`].
    fn read_matrix4x4(&mut self, endian: Endianness) -> Result<Matrix4x4> {
        let mut values = [0.0f32; 16];
        for value in &mut values {
            *value = self.read_f32(endian)?;
        }
        Ok(Matrix4x4::from_flat(values))
    }
}

impl<R: Read + ?Sized> BinaryRead for R {}

/// Primitive encoding over any writer. Every method returns the number of
/// bytes written.
pub trait BinaryWrite: Write {
    stream_writes! {
        u8 => write_u8,
        i8 => write_i8,
        u16 => write_u16,
        i16 => write_i16,
        u32 => write_u32,
        i32 => write_i32,
        u64 => write_u64,
        i64 => write_i64,
        f32 => write_f32,
        f64 => write_f64,
    }

    /// Write a length-prefixed string.
    fn write_string(&mut self, value: &str, encoding: &'static Encoding) -> Result<usize> {
        let bytes = encode_text(value, encoding)?;
        self.write_i32(prefix_len(bytes.len())?, Endianness::Little)?;
        self.write_all(&bytes)?;
        Ok(STRING_PREFIX_SIZE + bytes.len())
    }

    /// Write a [`Vector2`].
    fn write_vector2(&mut self, value: Vector2, endian: Endianness) -> Result<usize> {
        Ok(self.write_f32(value.x, endian)? + self.write_f32(value.y, endian)?)
    }

    /// Write a [`Vector3`].
    fn write_vector3(&mut self, value: Vector3, endian: Endianness) -> Result<usize> {
        Ok(self.write_f32(value.x, endian)?
            + self.write_f32(value.y, endian)?
            + self.write_f32(value.z, endian)?)
    }

    /// Write a [`Vector4`].
    fn write_vector4(&mut self, value: Vector4, endian: Endianness) -> Result<usize> {
        Ok(self.write_f32(value.x, endian)?
            + self.write_f32(value.y, endian)?
            + self.write_f32(value.z, endian)?
            + self.write_f32(value.w, endian)?)
    }

    /// Write a [`Quaternion`].
    fn write_quaternion(&mut self, value: Quaternion, endian: Endianness) -> Result<usize> {
        Ok(self.write_f32(value.x, endian)?
            + self.write_f32(value.y, endian)?
            + self.write_f32(value.z, endian)?
            + self.write_f32(value.w, endian)?)
    }

    /// Write a [`Matrix4x4`].
    fn write_matrix4x4(&mut self, value: &Matrix4x4, endian: Endianness) -> Result<usize> {
        let mut written = 0;
        for scalar in value.to_flat() {
            written += self.write_f32(scalar, endian)?;
        }
        Ok(written)
    }
}

impl<W: Write + ?Sized> BinaryWrite for W {}

/// Slice-based counterparts of [`BinaryRead`] and [`BinaryWrite`].
///
/// Writers return the number of bytes written so callers can advance an
/// index into a pre-sized buffer; short slices fail with
/// [`ArchiveError::BufferTooSmall`] instead of panicking.
pub mod span {
    use super::*;

    macro_rules! span_codec {
        ($($ty:ty => $read:ident, $write:ident);* $(;)?) => {$(
            #[doc = concat!("Write a `", stringify!($ty), "` at the start of `dst`.")]
            pub fn $write(dst: &mut [u8], value: $ty, endian: Endianness) -> Result<usize> {
                const N: usize = std::mem::size_of::<$ty>();
                let available = dst.len();
                let slot = dst
                    .get_mut(..N)
                    .ok_or_else(|| ArchiveError::buffer_too_small(N, available))?;
                let bytes = match endian {
                    Endianness::Little => value.to_le_bytes(),
                    Endianness::Big => value.to_be_bytes(),
                };
                slot.copy_from_slice(&bytes);
                Ok(N)
            }

            #[doc = concat!("Read a `", stringify!($ty), "` from the start of `src`.")]
            pub fn $read(src: &[u8], endian: Endianness) -> Result<$ty> {
                const N: usize = std::mem::size_of::<$ty>();
                let bytes: [u8; N] = src
                    .get(..N)
                    .and_then(|s| s.try_into().ok())
                    .ok_or_else(|| ArchiveError::buffer_too_small(N, src.len()))?;
                Ok(match endian {
                    Endianness::Little => <$ty>::from_le_bytes(bytes),
                    Endianness::Big => <$ty>::from_be_bytes(bytes),
                })
            }
        )*};
    }

    span_codec! {
        u8 => read_u8, write_u8;
        i8 => read_i8, write_i8;
        u16 => read_u16, write_u16;
        i16 => read_i16, write_i16;
        u32 => read_u32, write_u32;
        i32 => read_i32, write_i32;
        u64 => read_u64, write_u64;
        i64 => read_i64, write_i64;
        f32 => read_f32, write_f32;
        f64 => read_f64, write_f64;
    }

    /// Write a length-prefixed string at the start of `dst`.
    pub fn write_string(dst: &mut [u8], value: &str, encoding: &'static Encoding) -> Result<usize> {
        let bytes = encode_text(value, encoding)?;
        let needed = STRING_PREFIX_SIZE + bytes.len();
        if dst.len() < needed {
            return Err(ArchiveError::buffer_too_small(needed, dst.len()));
        }
        write_i32(dst, prefix_len(bytes.len())?, Endianness::Little)?;
        dst[STRING_PREFIX_SIZE..needed].copy_from_slice(&bytes);
        Ok(needed)
    }

    /// Read a length-prefixed string; returns the string and bytes consumed.
    pub fn read_string(src: &[u8], encoding: &'static Encoding) -> Result<(String, usize)> {
        let len = checked_len(read_i32(src, Endianness::Little)?)?;
        let needed = STRING_PREFIX_SIZE + len;
        let bytes = src
            .get(STRING_PREFIX_SIZE..needed)
            .ok_or_else(|| ArchiveError::buffer_too_small(needed, src.len()))?;
        Ok((decode_text(bytes, encoding)?, needed))
    }

    fn write_floats(dst: &mut [u8], values: &[f32], endian: Endianness) -> Result<usize> {
        let needed = values.len() * 4;
        if dst.len() < needed {
            return Err(ArchiveError::buffer_too_small(needed, dst.len()));
        }
        let mut idx = 0;
        for &value in values {
            idx += write_f32(&mut dst[idx..], value, endian)?;
        }
        Ok(idx)
    }

    fn read_floats<const N: usize>(src: &[u8], endian: Endianness) -> Result<[f32; N]> {
        if src.len() < N * 4 {
            return Err(ArchiveError::buffer_too_small(N * 4, src.len()));
        }
        let mut out = [0.0f32; N];
        for (i, value) in out.iter_mut().enumerate() {
            *value = read_f32(&src[i * 4..], endian)?;
        }
        Ok(out)
    }

    /// Write a [`Vector2`].
    pub fn write_vector2(dst: &mut [u8], value: Vector2, endian: Endianness) -> Result<usize> {
        write_floats(dst, &[value.x, value.y], endian)
    }

    /// Read a [`Vector2`].
    pub fn read_vector2(src: &[u8], endian: Endianness) -> Result<Vector2> {
        let [x, y] = read_floats::<2>(src, endian)?;
        Ok(Vector2 { x, y })
    }

    /// Write a [`Vector3`].
    pub fn write_vector3(dst: &mut [u8], value: Vector3, endian: Endianness) -> Result<usize> {
        write_floats(dst, &[value.x, value.y, value.z], endian)
    }

    /// Read a [`Vector3`].
    pub fn read_vector3(src: &[u8], endian: Endianness) -> Result<Vector3> {
        let [x, y, z] = read_floats::<3>(src, endian)?;
        Ok(Vector3 { x, y, z })
    }

    /// Write a [`Vector4`].
    pub fn write_vector4(dst: &mut [u8], value: Vector4, endian: Endianness) -> Result<usize> {
        write_floats(dst, &[value.x, value.y, value.z, value.w], endian)
    }

    /// Read a [`Vector4`].
    pub fn read_vector4(src: &[u8], endian: Endianness) -> Result<Vector4> {
        let [x, y, z, w] = read_floats::<4>(src, endian)?;
        Ok(Vector4 { x, y, z, w })
    }

    /// Write a [`Quaternion`].
    pub fn write_quaternion(dst: &mut [u8], value: Quaternion, endian: Endianness) -> Result<usize> {
        write_floats(dst, &[value.x, value.y, value.z, value.w], endian)
    }

    /// Read a [`Quaternion`].
    pub fn read_quaternion(src: &[u8], endian: Endianness) -> Result<Quaternion> {
        let [x, y, z, w] = read_floats::<4>(src, endian)?;
        Ok(Quaternion { x, y, z, w })
    }

    /// Write a [`Matrix4x4`].
    pub fn write_matrix4x4(dst: &mut [u8], value: &Matrix4x4, endian: Endianness) -> Result<usize> {
        write_floats(dst, &value.to_flat(), endian)
    }

    /// Read a [`Matrix4x4`].
    pub fn read_matrix4x4(src: &[u8], endian: Endianness) -> Result<Matrix4x4> {
        Ok(Matrix4x4::from_flat(read_floats::<16>(src, endian)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::{UTF_8, WINDOWS_1252};

    const BOTH: [Endianness; 2] = [Endianness::Little, Endianness::Big];

    macro_rules! check_numeric {
        ($value:expr, $read:ident, $write:ident) => {
            for endian in BOTH {
                let mut stream: Vec<u8> = Vec::new();
                let written = stream.$write($value, endian).unwrap();
                assert_eq!(written, stream.len());

                let mut buf = vec![0u8; written];
                assert_eq!(span::$write(&mut buf, $value, endian).unwrap(), written);
                assert_eq!(stream, buf, "stream and span disagree");

                assert_eq!((&stream[..]).$read(endian).unwrap(), $value);
                assert_eq!(span::$read(&buf, endian).unwrap(), $value);
            }
        };
    }

    #[test]
    fn test_numeric_roundtrip_all_widths() {
        check_numeric!(0xABu8, read_u8, write_u8);
        check_numeric!(-5i8, read_i8, write_i8);
        check_numeric!(0xBEEFu16, read_u16, write_u16);
        check_numeric!(-12345i16, read_i16, write_i16);
        check_numeric!(0xDEAD_BEEFu32, read_u32, write_u32);
        check_numeric!(i32::MIN, read_i32, write_i32);
        check_numeric!(u64::MAX - 7, read_u64, write_u64);
        check_numeric!(-1_234_567_890_123i64, read_i64, write_i64);
        check_numeric!(3.5f32, read_f32, write_f32);
        check_numeric!(-0.125f64, read_f64, write_f64);
    }

    #[test]
    fn test_endianness_byte_order() {
        let mut le: Vec<u8> = Vec::new();
        le.write_u32(0x0102_0304, Endianness::Little).unwrap();
        assert_eq!(le, [4, 3, 2, 1]);

        let mut be: Vec<u8> = Vec::new();
        be.write_u32(0x0102_0304, Endianness::Big).unwrap();
        assert_eq!(be, [1, 2, 3, 4]);
    }

    #[test]
    fn test_multibyte_string_roundtrip() {
        let text = "héllo 🎮";
        assert_eq!(text.chars().count(), 7);
        assert_eq!(text.len(), 11);

        let mut stream: Vec<u8> = Vec::new();
        let written = stream.write_string(text, UTF_8).unwrap();
        assert_eq!(written, 4 + 11);
        assert_eq!(&stream[..4], &11i32.to_le_bytes());
        assert_eq!(string_size(text, UTF_8), written);

        let mut buf = vec![0u8; written];
        assert_eq!(span::write_string(&mut buf, text, UTF_8).unwrap(), written);
        assert_eq!(stream, buf);

        assert_eq!((&stream[..]).read_string(UTF_8).unwrap(), text);
        assert_eq!(span::read_string(&buf, UTF_8).unwrap(), (text.to_string(), written));
    }

    #[test]
    fn test_caller_supplied_encoding() {
        let text = "café";
        let mut stream: Vec<u8> = Vec::new();
        let written = stream.write_string(text, WINDOWS_1252).unwrap();
        // é is a single byte in windows-1252
        assert_eq!(written, 4 + 4);
        assert_eq!(string_size(text, WINDOWS_1252), written);
        assert_eq!((&stream[..]).read_string(WINDOWS_1252).unwrap(), text);

        let err = Vec::<u8>::new().write_string("🎮", WINDOWS_1252).unwrap_err();
        assert!(matches!(err, ArchiveError::Encoding { .. }));
    }

    #[test]
    fn test_string_truncated() {
        let mut stream: Vec<u8> = Vec::new();
        stream.write_string("abcdef", UTF_8).unwrap();
        stream.truncate(6);

        assert!((&stream[..]).read_string(UTF_8).is_err());
        assert!(matches!(
            span::read_string(&stream, UTF_8),
            Err(ArchiveError::BufferTooSmall { needed: 10, available: 6 })
        ));
    }

    #[test]
    fn test_negative_string_length() {
        let bytes = (-1i32).to_le_bytes();
        assert!(matches!(
            span::read_string(&bytes, UTF_8),
            Err(ArchiveError::InvalidHeader { .. })
        ));
    }

    #[test]
    fn test_span_too_small() {
        let mut buf = [0u8; 3];
        let err = span::write_u32(&mut buf, 1, Endianness::Little).unwrap_err();
        assert!(matches!(err, ArchiveError::BufferTooSmall { needed: 4, available: 3 }));
        assert!(span::read_u64(&buf, Endianness::Little).is_err());
    }

    #[test]
    fn test_aggregates_match_between_stream_and_span() {
        let v3 = Vector3 { x: 1.0, y: -2.0, z: 3.25 };
        let q = Quaternion { x: 0.0, y: 0.5, z: 0.0, w: 0.5 };
        let mut m = Matrix4x4::IDENTITY;
        m.m[3] = [10.0, 20.0, 30.0, 1.0];

        for endian in BOTH {
            let mut stream: Vec<u8> = Vec::new();
            let mut written = stream.write_vector2(Vector2 { x: 4.0, y: 8.0 }, endian).unwrap();
            written += stream.write_vector3(v3, endian).unwrap();
            written += stream.write_vector4(Vector4 { x: 1.0, y: 2.0, z: 3.0, w: 4.0 }, endian).unwrap();
            written += stream.write_quaternion(q, endian).unwrap();
            written += stream.write_matrix4x4(&m, endian).unwrap();
            assert_eq!(written, (2 + 3 + 4 + 4 + 16) * 4);

            let mut buf = vec![0u8; written];
            let mut idx = span::write_vector2(&mut buf, Vector2 { x: 4.0, y: 8.0 }, endian).unwrap();
            idx += span::write_vector3(&mut buf[idx..], v3, endian).unwrap();
            idx += span::write_vector4(&mut buf[idx..], Vector4 { x: 1.0, y: 2.0, z: 3.0, w: 4.0 }, endian)
                .unwrap();
            idx += span::write_quaternion(&mut buf[idx..], q, endian).unwrap();
            idx += span::write_matrix4x4(&mut buf[idx..], &m, endian).unwrap();
            assert_eq!(idx, written);
            assert_eq!(stream, buf);

            let mut reader = &stream[..];
            assert_eq!(reader.read_vector2(endian).unwrap(), Vector2 { x: 4.0, y: 8.0 });
            assert_eq!(reader.read_vector3(endian).unwrap(), v3);
            assert_eq!(
                reader.read_vector4(endian).unwrap(),
                Vector4 { x: 1.0, y: 2.0, z: 3.0, w: 4.0 }
            );
            assert_eq!(reader.read_quaternion(endian).unwrap(), q);
            assert_eq!(reader.read_matrix4x4(endian).unwrap(), m);
            assert!(reader.is_empty());

            assert_eq!(span::read_vector3(&buf[8..], endian).unwrap(), v3);
            assert_eq!(span::read_matrix4x4(&buf[13 * 4..], endian).unwrap(), m);
        }
    }
}
