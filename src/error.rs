use crate::encoding::Encoding;

use std::{error, fmt, io, result};

/// A type alias for `Result<T, backlines::Error>`.
///
/// This result type embeds the error type in this crate.
pub type Result<T> = result::Result<T, Error>;

/// An error that can occur when reading a file backwards.
#[derive(Debug)]
pub struct Error(Box<ErrorKind>);

impl Error {
    /// A crate private constructor for `Error`.
    pub(crate) fn new(kind: ErrorKind) -> Error {
        Error(Box::new(kind))
    }

    /// Returns the specific type of this error.
    pub fn kind(&self) -> &ErrorKind {
        &self.0
    }

    /// Unwraps this error into its underlying type.
    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }
}

/// The specific type of an error.
///
/// This list might grow over time and it is not recommended to
/// exhaustively match against it.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Represents an I/O error.
    ///
    /// Can occur when opening the file or pulling a chunk from the
    /// underlying byte stream.
    #[error(transparent)]
    Io(io::Error),
    /// The named text encoding is not in the supported set.
    #[error("`{0}` encoding is not supported, expected one of `utf-8`, `ascii`, `latin-1`")]
    UnsupportedEncoding(String),
    /// The configured chunk size is zero.
    #[error("chunk size must be greater than zero")]
    UnsupportedChunkSize,
    /// The bytes of a line are not valid for the declared encoding.
    #[error("line is not valid {encoding} past byte {valid_up_to}")]
    Decode {
        /// The encoding the line was expected to conform to.
        encoding: Encoding,
        /// How many bytes from the start of the line decoded cleanly.
        valid_up_to: usize,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        error::Error::source(&*self.0)
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::new(ErrorKind::Io(err))
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> io::Error {
        io::Error::new(io::ErrorKind::Other, err)
    }
}
