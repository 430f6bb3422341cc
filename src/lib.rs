//! This library provides the [`BackLines`] type to read a text file line by
//! line in reverse, starting from the last line, without loading the whole
//! file into memory.
//!
//! Bytes are pulled from the end of the file in fixed-size chunks and a
//! line is decoded as soon as it is complete, so memory stays bounded by
//! the chunk size plus the longest line. Files terminated by `\n`, `\r\n`
//! or `\r` are all handled, including separators that fall across chunk
//! boundaries.
//!
//! # Examples
//!
//! - Print the last 10 lines of a log file, newest first.
//!
//! ```no_run
//! use backlines::{BackLines, Result};
//!
//! fn main() -> Result<()> {
//!     let mut log = BackLines::new("./app.log");
//!     for line in log.lines()?.take(10) {
//!         println!("{}", line?);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! Decoding defaults to UTF-8; [`Encoding`] selects ASCII or Latin-1
//! instead. The chunking machinery is exposed as well: [`ChunkBuffer`]
//! drives a backward walk over any byte stream that implements
//! `Read + Seek`, which is also how the crate is tested against in-memory
//! streams.
//!
//! [`BackLines`]: struct.BackLines.html
//! [`Encoding`]: enum.Encoding.html
//! [`ChunkBuffer`]: struct.ChunkBuffer.html
#![deny(missing_docs)]

mod error;
pub use error::{Error, ErrorKind, Result};

mod encoding;
pub use encoding::Encoding;

mod buffer;
pub use buffer::{ChunkBuffer, DEFAULT_CHUNK_SIZE};

mod reader;
pub use reader::{BackLines, BackwardLineReader};
