use crate::error::{Error, ErrorKind, Result};

use log::trace;
use memchr::{memchr2, memrchr2};
use std::io::{Read, Seek, SeekFrom};
use std::mem;

/// The default number of bytes a [`ChunkBuffer`] pulls per read.
///
/// [`ChunkBuffer`]: struct.ChunkBuffer.html
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

/// Buffer that walks a byte stream from its end towards its start, pulling
/// fixed-size chunks and handing back complete lines in reverse order.
///
/// Lines are terminated by `\n`, `\r\n` or a lone `\r`, and are returned
/// without their separator. A separator split across two pulls is still
/// treated as one, and the separator that terminates the stream does not
/// open an extra empty line.
///
/// # Examples
///
/// ```
/// use backlines::ChunkBuffer;
/// use std::io::Cursor;
///
/// # fn main() -> backlines::Result<()> {
/// let cursor = Cursor::new(b"first\nsecond\n".to_vec());
/// let mut buf = ChunkBuffer::with_chunk_size(cursor, 4)?;
///
/// buf.read_until_yieldable()?;
/// assert_eq!(buf.return_line(), b"second");
///
/// buf.read_until_yieldable()?;
/// assert_eq!(buf.return_line(), b"first");
///
/// assert!(buf.has_returned_every_line());
/// # Ok(())
/// # }
/// ```
///
/// The `ChunkBuffer` never holds more than one chunk plus the bytes of the
/// lines not yet returned, so reading the last few lines of a large file
/// stays cheap no matter how big the file is.
#[derive(Debug)]
pub struct ChunkBuffer<RS: Read + Seek> {
    stream: RS,
    pending: Vec<u8>,
    cursor: u64,
    chunk_size: usize,
}

impl<RS: Read + Seek> ChunkBuffer<RS> {
    /// Creates a `ChunkBuffer` over a byte stream, pulling
    /// [`DEFAULT_CHUNK_SIZE`] bytes at a time.
    ///
    /// # Errors
    ///
    /// Returns an error variant of `ErrorKind::Io` if the end of the stream
    /// cannot be seeked to.
    ///
    /// # Examples
    ///
    /// ```
    /// use backlines::ChunkBuffer;
    /// use std::io::Cursor;
    ///
    /// let cursor = Cursor::new(b"lorem ipsum".to_vec());
    /// let buf = ChunkBuffer::new(cursor).unwrap();
    ///
    /// assert_eq!(buf.remaining(), 11);
    /// ```
    ///
    /// [`DEFAULT_CHUNK_SIZE`]: constant.DEFAULT_CHUNK_SIZE.html
    pub fn new(stream: RS) -> Result<Self> {
        ChunkBuffer::with_chunk_size(stream, DEFAULT_CHUNK_SIZE)
    }

    /// Creates a `ChunkBuffer` that pulls `chunk_size` bytes at a time.
    ///
    /// Smaller chunk sizes bound memory tighter at the cost of more reads;
    /// the emitted lines are the same for every chunk size.
    ///
    /// # Errors
    ///
    /// Returns an error variant of `ErrorKind::UnsupportedChunkSize` if
    /// `chunk_size` is zero, or `ErrorKind::Io` if the end of the stream
    /// cannot be seeked to.
    ///
    /// # Examples
    ///
    /// ```
    /// use backlines::ChunkBuffer;
    /// use std::io::Cursor;
    ///
    /// let cursor = Cursor::new(b"lorem ipsum".to_vec());
    /// let buf = ChunkBuffer::with_chunk_size(cursor, 3).unwrap();
    ///
    /// assert_eq!(buf.chunk_size(), 3);
    /// ```
    pub fn with_chunk_size(mut stream: RS, chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::new(ErrorKind::UnsupportedChunkSize));
        }
        let cursor = stream.seek(SeekFrom::End(0))?;

        Ok(Self {
            stream,
            cursor,
            chunk_size,
            pending: Vec::new(),
        })
    }

    /// Returns the configured chunk size.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Returns how many bytes of the stream have not been pulled yet.
    ///
    /// Starts out as the stream length and drops by one chunk per pull.
    pub fn remaining(&self) -> u64 {
        self.cursor
    }

    /// Pulls the next chunk off the unread tail of the stream and prepends
    /// it to the pending bytes.
    ///
    /// Pulls are `chunk_size` bytes, except for the final one which covers
    /// whatever is left in front of the read position. Once the whole
    /// stream has been pulled this is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error variant of `ErrorKind::Io` if seeking or reading
    /// the stream fails. A stream that shrank since construction surfaces
    /// here as an unexpected-eof read error.
    pub fn pull_next_chunk(&mut self) -> Result<()> {
        let read_size = (self.chunk_size as u64).min(self.cursor) as usize;
        if read_size == 0 {
            return Ok(());
        }

        let offset = self.cursor - read_size as u64;
        self.stream.seek(SeekFrom::Start(offset))?;

        let mut chunk = vec![0; read_size];
        self.stream.read_exact(&mut chunk)?;
        trace!("pulled {} bytes, {} left before the read position", read_size, offset);

        chunk.extend_from_slice(&self.pending);
        self.pending = chunk;
        self.cursor = offset;
        Ok(())
    }

    /// Reports whether a complete line can be taken off the pending bytes.
    ///
    /// A separator at the very end of the pending bytes does not count: it
    /// terminates the line before it, it does not open an empty one. Once
    /// the read position has reached the start of the stream, whatever is
    /// pending forms the final line.
    pub fn has_yieldable_line(&self) -> bool {
        if self.cursor == 0 {
            return true;
        }
        let complete = strip_trailing_separator(&self.pending);
        memchr2(b'\n', b'\r', complete).is_some()
    }

    /// Pulls chunks until a complete line is available.
    ///
    /// # Errors
    ///
    /// Returns an error variant of `ErrorKind::Io` if a pull fails.
    pub fn read_until_yieldable(&mut self) -> Result<()> {
        while !self.has_yieldable_line() {
            self.pull_next_chunk()?;
        }
        Ok(())
    }

    /// Takes the last complete line off the pending bytes.
    ///
    /// The returned line carries no trailing separator. The separator that
    /// delimited it stays at the tail of the pending bytes until the next
    /// call, so an empty line between two separators is still returned on
    /// its own.
    ///
    /// Expects a line to be available; call `read_until_yieldable` first.
    ///
    /// # Examples
    ///
    /// ```
    /// use backlines::ChunkBuffer;
    /// use std::io::Cursor;
    ///
    /// let cursor = Cursor::new(b"a\n\nb".to_vec());
    /// let mut buf = ChunkBuffer::new(cursor).unwrap();
    ///
    /// buf.read_until_yieldable().unwrap();
    /// assert_eq!(buf.return_line(), b"b");
    /// assert_eq!(buf.return_line(), b"");
    /// assert_eq!(buf.return_line(), b"a");
    /// ```
    pub fn return_line(&mut self) -> Vec<u8> {
        let complete = self.pending.len() - trailing_separator_len(&self.pending);
        self.pending.truncate(complete);

        match memrchr2(b'\n', b'\r', &self.pending) {
            Some(pos) => self.pending.split_off(pos + 1),
            None => mem::take(&mut self.pending),
        }
    }

    /// Reports whether every line of the stream has been taken.
    ///
    /// Once this returns `true`, further `return_line` calls would only
    /// produce empty lines that were never in the stream.
    ///
    /// # Examples
    ///
    /// ```
    /// use backlines::ChunkBuffer;
    /// use std::io::Cursor;
    ///
    /// let mut buf = ChunkBuffer::new(Cursor::new(b"one".to_vec())).unwrap();
    /// assert!(!buf.has_returned_every_line());
    ///
    /// buf.read_until_yieldable().unwrap();
    /// buf.return_line();
    /// assert!(buf.has_returned_every_line());
    /// ```
    pub fn has_returned_every_line(&self) -> bool {
        self.cursor == 0 && self.pending.is_empty()
    }
}

// Length of the separator terminating `bytes`, if any. `\r\n` is matched
// before the single bytes so it is always consumed as one separator.
fn trailing_separator_len(bytes: &[u8]) -> usize {
    if bytes.ends_with(b"\r\n") {
        2
    } else if bytes.ends_with(b"\n") || bytes.ends_with(b"\r") {
        1
    } else {
        0
    }
}

// `bytes` without its trailing separator.
fn strip_trailing_separator(bytes: &[u8]) -> &[u8] {
    &bytes[..bytes.len() - trailing_separator_len(bytes)]
}
