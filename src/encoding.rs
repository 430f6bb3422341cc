use crate::error::{Error, ErrorKind, Result};

use std::fmt;
use std::str::FromStr;

/// A text encoding that emitted lines are decoded with.
///
/// The set is limited to encodings that are backward compatible with ASCII,
/// where `\n` and `\r` bytes always mean a line break. That is what lets
/// line boundaries be found byte-wise, before any decoding happens.
///
/// Encodings can also be selected by name, matching the names
/// case-insensitively:
///
/// # Examples
///
/// ```
/// use backlines::Encoding;
///
/// let encoding: Encoding = "UTF-8".parse().unwrap();
/// assert_eq!(encoding, Encoding::Utf8);
///
/// assert!("utf-16".parse::<Encoding>().is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Encoding {
    /// UTF-8, the default.
    Utf8,
    /// ASCII, where any byte above `0x7F` is a decode error.
    Ascii,
    /// Latin-1 (ISO-8859-1), where every byte maps to the code point of the
    /// same value.
    Latin1,
}

impl Encoding {
    /// Returns the canonical name of this encoding, e.g. `"utf-8"`.
    pub fn name(self) -> &'static str {
        match self {
            Encoding::Utf8 => "utf-8",
            Encoding::Ascii => "ascii",
            Encoding::Latin1 => "latin-1",
        }
    }

    /// Decodes the bytes of one line into a `String`.
    ///
    /// # Errors
    ///
    /// Returns an error variant of `ErrorKind::Decode` if `bytes` are not
    /// valid for this encoding, reporting how many leading bytes were.
    ///
    /// # Examples
    ///
    /// ```
    /// use backlines::Encoding;
    ///
    /// assert_eq!(Encoding::Utf8.decode(b"na\xc3\xafve".to_vec()).unwrap(), "naïve");
    /// assert_eq!(Encoding::Latin1.decode(b"na\xefve".to_vec()).unwrap(), "naïve");
    /// assert!(Encoding::Ascii.decode(b"na\xefve".to_vec()).is_err());
    /// ```
    pub fn decode(self, bytes: Vec<u8>) -> Result<String> {
        match self {
            Encoding::Utf8 => String::from_utf8(bytes).map_err(|err| {
                Error::new(ErrorKind::Decode {
                    encoding: self,
                    valid_up_to: err.utf8_error().valid_up_to(),
                })
            }),
            Encoding::Ascii => match bytes.iter().position(|&b| b > 0x7F) {
                Some(pos) => Err(Error::new(ErrorKind::Decode {
                    encoding: self,
                    valid_up_to: pos,
                })),
                // SAFETY: every byte was just checked to be below 0x80, and
                // ASCII is a subset of UTF-8.
                None => Ok(unsafe { String::from_utf8_unchecked(bytes) }),
            },
            Encoding::Latin1 => Ok(bytes.into_iter().map(char::from).collect()),
        }
    }
}

impl Default for Encoding {
    fn default() -> Encoding {
        Encoding::Utf8
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Encoding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Encoding> {
        match s.to_ascii_lowercase().as_str() {
            "utf-8" => Ok(Encoding::Utf8),
            "ascii" => Ok(Encoding::Ascii),
            "latin-1" => Ok(Encoding::Latin1),
            _ => Err(Error::new(ErrorKind::UnsupportedEncoding(s.to_string()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_names() {
        assert_eq!("utf-8".parse::<Encoding>().unwrap(), Encoding::Utf8);
        assert_eq!("ascii".parse::<Encoding>().unwrap(), Encoding::Ascii);
        assert_eq!("latin-1".parse::<Encoding>().unwrap(), Encoding::Latin1);
    }

    #[test]
    fn test_parse_ignores_case() {
        assert_eq!("UTF-8".parse::<Encoding>().unwrap(), Encoding::Utf8);
        assert_eq!("Ascii".parse::<Encoding>().unwrap(), Encoding::Ascii);
        assert_eq!("LATIN-1".parse::<Encoding>().unwrap(), Encoding::Latin1);
    }

    #[test]
    fn test_parse_rejects_unknown_names() {
        for name in &["utf-16", "latin1", "utf8", "shift-jis", ""] {
            match name.parse::<Encoding>() {
                Ok(_) => assert!(false),
                Err(e) => match e.kind() {
                    ErrorKind::UnsupportedEncoding(rejected) => assert_eq!(rejected, name),
                    _ => assert!(false),
                },
            }
        }
    }

    #[test]
    fn test_name_round_trips() {
        for &encoding in &[Encoding::Utf8, Encoding::Ascii, Encoding::Latin1] {
            assert_eq!(encoding.name().parse::<Encoding>().unwrap(), encoding);
        }
    }

    #[test]
    fn test_decode_utf8() {
        let bytes = "žluťoučký kůň".as_bytes().to_vec();
        assert_eq!(Encoding::Utf8.decode(bytes).unwrap(), "žluťoučký kůň");
    }

    #[test]
    fn test_decode_utf8_reports_valid_prefix() {
        match Encoding::Utf8.decode(b"abc\x80def".to_vec()) {
            Ok(_) => assert!(false),
            Err(e) => match *e.kind() {
                ErrorKind::Decode {
                    encoding,
                    valid_up_to,
                } => {
                    assert_eq!(encoding, Encoding::Utf8);
                    assert_eq!(valid_up_to, 3);
                }
                _ => assert!(false),
            },
        }
    }

    #[test]
    fn test_decode_ascii() {
        assert_eq!(Encoding::Ascii.decode(b"plain".to_vec()).unwrap(), "plain");
        assert_eq!(Encoding::Ascii.decode(Vec::new()).unwrap(), "");
    }

    #[test]
    fn test_decode_ascii_rejects_high_bytes() {
        match Encoding::Ascii.decode(b"ok\xff".to_vec()) {
            Ok(_) => assert!(false),
            Err(e) => match *e.kind() {
                ErrorKind::Decode {
                    encoding,
                    valid_up_to,
                } => {
                    assert_eq!(encoding, Encoding::Ascii);
                    assert_eq!(valid_up_to, 2);
                }
                _ => assert!(false),
            },
        }
    }

    #[test]
    fn test_decode_latin1_never_fails() {
        assert_eq!(
            Encoding::Latin1.decode(b"caf\xe9".to_vec()).unwrap(),
            "café"
        );
        let every_byte: Vec<u8> = (0..=255).collect();
        let decoded = Encoding::Latin1.decode(every_byte).unwrap();
        assert_eq!(decoded.chars().count(), 256);
        assert_eq!(decoded.chars().last(), Some('ÿ'));
    }
}
