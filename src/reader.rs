use crate::buffer::{ChunkBuffer, DEFAULT_CHUNK_SIZE};
use crate::encoding::Encoding;
use crate::error::{Error, ErrorKind, Result};

use log::debug;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, Weak};

/// Reads a text file line by line, last line first.
///
/// A `BackLines` does not hold the file open itself: every call to
/// [`lines`] opens the file anew and hands back an independent
/// [`BackwardLineReader`], so several traversals can be in flight at once.
/// [`close_all`] closes whichever of those are still alive.
///
/// # Examples
///
/// Find the most recent error in a log file:
///
/// ```no_run
/// use backlines::BackLines;
///
/// fn main() -> backlines::Result<()> {
///     let mut log = BackLines::new("./app.log");
///     for line in log.lines()? {
///         let line = line?;
///         if line.contains("ERROR") {
///             println!("{}", line);
///             break;
///         }
///     }
///     Ok(())
/// }
/// ```
///
/// [`lines`]: struct.BackLines.html#method.lines
/// [`close_all`]: struct.BackLines.html#method.close_all
/// [`BackwardLineReader`]: struct.BackwardLineReader.html
#[derive(Debug)]
pub struct BackLines {
    path: PathBuf,
    encoding: Encoding,
    chunk_size: usize,
    handles: Vec<Weak<Mutex<Option<File>>>>,
}

impl BackLines {
    /// Creates a `BackLines` for the file at `path`, decoding lines as
    /// UTF-8 and pulling [`DEFAULT_CHUNK_SIZE`] bytes at a time.
    ///
    /// The file is not touched until [`lines`] is called.
    ///
    /// [`DEFAULT_CHUNK_SIZE`]: constant.DEFAULT_CHUNK_SIZE.html
    /// [`lines`]: struct.BackLines.html#method.lines
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        BackLines::with_encoding(path, Encoding::default())
    }

    /// Creates a `BackLines` that decodes lines with the given encoding.
    ///
    /// # Examples
    ///
    /// ```
    /// use backlines::{BackLines, Encoding};
    ///
    /// let log = BackLines::with_encoding("./legacy.log", Encoding::Latin1);
    /// assert_eq!(log.encoding(), Encoding::Latin1);
    /// ```
    pub fn with_encoding<P: AsRef<Path>>(path: P, encoding: Encoding) -> Self {
        BackLines {
            path: path.as_ref().to_path_buf(),
            encoding,
            chunk_size: DEFAULT_CHUNK_SIZE,
            handles: Vec::new(),
        }
    }

    /// Creates a `BackLines` with both the encoding and the chunk size set.
    ///
    /// # Errors
    ///
    /// Returns an error variant of `ErrorKind::UnsupportedChunkSize` if
    /// `chunk_size` is zero.
    pub fn with_options<P: AsRef<Path>>(
        path: P,
        encoding: Encoding,
        chunk_size: usize,
    ) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::new(ErrorKind::UnsupportedChunkSize));
        }
        Ok(BackLines {
            path: path.as_ref().to_path_buf(),
            encoding,
            chunk_size,
            handles: Vec::new(),
        })
    }

    /// Returns the path this `BackLines` reads from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the encoding lines are decoded with.
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Returns the chunk size readers are spawned with.
    ///
    /// # Examples
    ///
    /// ```
    /// use backlines::{BackLines, DEFAULT_CHUNK_SIZE, Encoding};
    ///
    /// let log = BackLines::new("./app.log");
    /// assert_eq!(log.chunk_size(), DEFAULT_CHUNK_SIZE);
    ///
    /// let log = BackLines::with_options("./app.log", Encoding::Utf8, 512).unwrap();
    /// assert_eq!(log.chunk_size(), 512);
    /// ```
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Opens the file and returns an iterator over its lines, from the last
    /// line towards the first.
    ///
    /// Every call opens its own file handle, so readers spawned from the
    /// same `BackLines` are driven independently. A reader's handle is
    /// closed when it is exhausted, when its `close` is called, when
    /// [`close_all`] is called, or when the reader is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error variant of `ErrorKind::Io` if the file cannot be
    /// opened or its end cannot be seeked to.
    ///
    /// [`close_all`]: struct.BackLines.html#method.close_all
    pub fn lines(&mut self) -> Result<BackwardLineReader> {
        let file = File::open(&self.path)?;
        let handle = SharedFile::new(file);
        self.handles.push(handle.downgrade());
        debug!("opened {} for backward reading", self.path.display());

        let buf = ChunkBuffer::with_chunk_size(handle.clone(), self.chunk_size)?;
        Ok(BackwardLineReader {
            path: self.path.clone(),
            encoding: self.encoding,
            handle,
            buf,
        })
    }

    /// Closes every reader spawned by [`lines`] that is still alive.
    ///
    /// Readers that were dropped released their file handle already and are
    /// pruned from the registry; readers that were closed before stay
    /// closed. Calling this more than once is a no-op.
    ///
    /// [`lines`]: struct.BackLines.html#method.lines
    pub fn close_all(&mut self) {
        let spawned = self.handles.len();
        self.handles.retain(|handle| match handle.upgrade() {
            Some(handle) => {
                if let Ok(mut guard) = handle.lock() {
                    *guard = None;
                }
                true
            }
            None => false,
        });
        debug!(
            "close_all: {} of {} spawned readers were still alive",
            self.handles.len(),
            spawned
        );
    }
}

/// Iterator over the lines of a file, read from the end towards the start.
///
/// Yields `Ok(line)` with the trailing separator removed, `Err` when a
/// chunk cannot be read or a line cannot be decoded, and `None` once the
/// first line of the file has been returned. Reaching the first line closes
/// the underlying file handle; a closed reader keeps yielding `None`.
///
/// Returned by [`BackLines::lines`].
///
/// [`BackLines::lines`]: struct.BackLines.html#method.lines
#[derive(Debug)]
pub struct BackwardLineReader {
    path: PathBuf,
    encoding: Encoding,
    handle: SharedFile,
    buf: ChunkBuffer<SharedFile>,
}

impl BackwardLineReader {
    /// Returns the path of the file being read.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reports whether the underlying file handle has been closed.
    pub fn is_closed(&self) -> bool {
        self.handle.is_closed()
    }

    /// Closes the underlying file handle.
    ///
    /// Iteration afterwards yields `None`. Closing an already closed
    /// reader is a no-op.
    pub fn close(&mut self) {
        self.handle.close();
    }
}

impl Iterator for BackwardLineReader {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Result<String>> {
        if self.is_closed() {
            return None;
        }
        if self.buf.has_returned_every_line() {
            self.handle.close();
            return None;
        }
        if let Err(e) = self.buf.read_until_yieldable() {
            return Some(Err(e));
        }
        Some(self.encoding.decode(self.buf.return_line()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.is_closed() {
            (0, Some(0))
        } else {
            (0, None)
        }
    }
}

// File handle that can be closed from outside the reader owning it. Closing
// drops the `File`, so the descriptor is released right away; reads against
// a closed handle fail instead of blocking.
#[derive(Debug, Clone)]
struct SharedFile(Arc<Mutex<Option<File>>>);

impl SharedFile {
    fn new(file: File) -> Self {
        SharedFile(Arc::new(Mutex::new(Some(file))))
    }

    fn close(&self) {
        if let Ok(mut guard) = self.0.lock() {
            *guard = None;
        }
    }

    fn is_closed(&self) -> bool {
        match self.0.lock() {
            Ok(guard) => guard.is_none(),
            Err(_) => true,
        }
    }

    fn downgrade(&self) -> Weak<Mutex<Option<File>>> {
        Arc::downgrade(&self.0)
    }

    fn with_file<T>(&self, op: impl FnOnce(&mut File) -> io::Result<T>) -> io::Result<T> {
        let mut guard = self
            .0
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "file handle lock poisoned"))?;
        match guard.as_mut() {
            Some(file) => op(file),
            None => Err(io::Error::new(
                io::ErrorKind::Other,
                "file handle is closed",
            )),
        }
    }
}

impl Read for SharedFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.with_file(|file| file.read(buf))
    }
}

impl Seek for SharedFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.with_file(|file| file.seek(pos))
    }
}
