//! Bounded, read-only views over a shared stream.
//!
//! A [`BoundedStream`] exposes the byte window `start..start + length` of a
//! [`SharedSource`] as its own stream with a private cursor. Reads are
//! clamped to the window: asking for more than is left returns what is
//! left, and a read at the end returns `Ok(0)`.
//!
//! # Concurrency
//!
//! The source cursor is shared, so every read seeks it to
//! `start + position` right before reading. One instance serializes its own
//! reads with an internal lock. Two *different* bounded streams over the
//! same [`std::fs::File`] are **not** coordinated with each other: if they
//! are read from different threads at the same time, one thread's seek can
//! land between the other's seek and read. Callers that need that pattern
//! must coordinate externally, or wrap the source in a [`Mutex`] (which
//! implements [`SharedSource`] with the seek and read under one lock).
//!
//! The source must support absolute seeking; purely sequential streams
//! such as sockets cannot back a bounded stream.

use crate::error::{ArchiveError, Result};
use parking_lot::Mutex;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::sync::Arc;

/// A seekable byte source that can be shared between bounded streams.
pub trait SharedSource: Send + Sync {
    /// Position the source at `offset` and read into `buf`.
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize>;

    /// Total length of the source in bytes.
    fn byte_len(&self) -> io::Result<u64>;
}

impl SharedSource for File {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let mut file = self;
        file.seek(SeekFrom::Start(offset))?;
        file.read(buf)
    }

    fn byte_len(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }
}

impl<T: Read + Seek + Send> SharedSource for Mutex<T> {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let mut inner = self.lock();
        inner.seek(SeekFrom::Start(offset))?;
        inner.read(buf)
    }

    fn byte_len(&self) -> io::Result<u64> {
        let mut inner = self.lock();
        let current = inner.stream_position()?;
        let end = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(current))?;
        Ok(end)
    }
}

/// Read-only window over a [`SharedSource`].
pub struct BoundedStream<S: ?Sized = File> {
    source: Arc<S>,
    start: u64,
    length: u64,
    position: Mutex<u64>,
    leave_open: bool,
}

impl<S: SharedSource + ?Sized> BoundedStream<S> {
    /// Create a window over `source`.
    ///
    /// With `leave_open`, dropping this stream only releases this handle;
    /// other holders of `source` keep using it. Without it, the stream
    /// claims the source and [`BoundedStream::into_source`] can hand it back.
    pub fn new(source: Arc<S>, start: u64, length: u64, leave_open: bool) -> Self {
        Self {
            source,
            start,
            length,
            position: Mutex::new(0),
            leave_open,
        }
    }

    /// Window covering the whole of `source`.
    pub fn whole(source: Arc<S>, leave_open: bool) -> Result<Self> {
        let length = source.byte_len()?;
        Ok(Self::new(source, 0, length, leave_open))
    }

    /// Absolute offset of the window in the source.
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Length of the window.
    pub fn len(&self) -> u64 {
        self.length
    }

    /// True if the window is empty.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Current cursor, relative to the window start.
    pub fn position(&self) -> u64 {
        *self.position.lock()
    }

    /// Whether dropping this stream leaves the source open for others.
    pub fn leave_open(&self) -> bool {
        self.leave_open
    }

    /// Read through a shared reference, taking this stream's lock.
    pub fn read_shared(&self, buf: &mut [u8]) -> io::Result<usize> {
        let mut position = self.position.lock();
        self.read_locked(&mut position, buf)
    }

    fn read_locked(&self, position: &mut u64, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.length - *position;
        if remaining == 0 || buf.is_empty() {
            return Ok(0);
        }
        let want = buf.len().min(usize::try_from(remaining).unwrap_or(usize::MAX));
        let read = self.source.read_at(self.start + *position, &mut buf[..want])?;
        *position += read as u64;
        Ok(read)
    }

    /// Read the entire window in one locked operation.
    ///
    /// The cursor is rewound to the window start first and left at the end.
    /// A window reaching past the end of the source fails before anything
    /// is allocated.
    pub fn read_all(&self) -> Result<Vec<u8>> {
        let mut position = self.position.lock();
        let source_len = self.source.byte_len()?;
        let end = self.start.checked_add(self.length);
        if end.is_none_or(|end| end > source_len) {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "window {}+{} ends past the {source_len} byte source",
                    self.start, self.length
                ),
            )
            .into());
        }
        *position = 0;
        let size = usize::try_from(self.length)
            .map_err(|_| ArchiveError::unsupported("materialize a window larger than memory"))?;
        let mut out = vec![0u8; size];
        let mut filled = 0;
        while filled < size {
            let read = self.read_locked(&mut position, &mut out[filled..])?;
            if read == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("source ended {} bytes into a {size} byte window", filled),
                )
                .into());
            }
            filled += read;
        }
        Ok(out)
    }

    /// Bounded streams cannot be resized.
    pub fn set_len(&self, _len: u64) -> Result<()> {
        Err(ArchiveError::unsupported("resize a read-only bounded stream"))
    }

    /// The shared source.
    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    fn seek_locked(&self, position: &mut u64, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::End(delta) => self.length.checked_add_signed(delta),
            SeekFrom::Current(delta) => position.checked_add_signed(delta),
        };
        let target = target.ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "seek before start of bounded stream")
        })?;
        *position = target.min(self.length);
        Ok(*position)
    }
}

impl<S> BoundedStream<S> {
    /// Give back the source if this stream owns it exclusively.
    ///
    /// Returns `None` for leave-open streams and while other handles to the
    /// source are alive.
    pub fn into_source(self) -> Option<S> {
        if self.leave_open {
            return None;
        }
        Arc::try_unwrap(self.source).ok()
    }
}

impl<S: SharedSource + ?Sized> Read for BoundedStream<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut current = *self.position.get_mut();
        let read = self.read_locked(&mut current, buf)?;
        *self.position.get_mut() = current;
        Ok(read)
    }
}

impl<S: SharedSource + ?Sized> Read for &BoundedStream<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_shared(buf)
    }
}

impl<S: SharedSource + ?Sized> Seek for BoundedStream<S> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let mut position = self.position.lock();
        self.seek_locked(&mut position, pos)
    }
}

impl<S: SharedSource + ?Sized> Seek for &BoundedStream<S> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let mut position = self.position.lock();
        self.seek_locked(&mut position, pos)
    }
}

impl<S: SharedSource + ?Sized> Write for BoundedStream<S> {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(ArchiveError::unsupported("write to a read-only bounded stream").into())
    }

    fn flush(&mut self) -> io::Result<()> {
        let _guard = self.position.lock();
        Ok(())
    }
}

impl<S: ?Sized> std::fmt::Debug for BoundedStream<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedStream")
            .field("start", &self.start)
            .field("length", &self.length)
            .field("position", &*self.position.lock())
            .field("leave_open", &self.leave_open)
            .finish()
    }
}
