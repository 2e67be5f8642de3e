//! Single-byte character sets that sanitized strings are confined to.
//!
//! A [`Charset`] is either plain 7-bit ASCII or one of the single-byte,
//! ASCII-compatible encodings known to [`encoding_rs`] (the windows-125x code
//! pages, the ISO-8859 family, KOI8-R/U, IBM866 and the Mac encodings).
//! Multi-byte encodings such as UTF-8 or Shift_JIS are rejected.
//!
//! ```rust
//! use exc_string::charset::Charset;
//!
//! let cyrillic = Charset::for_label("cp1251").unwrap();
//! assert_eq!(cyrillic.name(), "windows-1251");
//! assert!(Charset::for_label("utf-8").is_err());
//! ```

use std::{borrow::Cow, fmt};

use encoding_rs::{Encoder, EncoderResult, Encoding};

/// The character substituted for anything that cannot be represented.
pub const PLACEHOLDER: char = '?';

/// Error returned when a label does not name a supported single-byte
/// encoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("`{label}` is not a supported single-byte encoding")]
pub struct UnknownEncoding {
    /// The label that was looked up.
    pub label: String,
}

/// A single-byte text encoding.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Charset {
    kind: Kind,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Kind {
    Ascii,
    SingleByte(&'static Encoding),
}

// The WHATWG label table maps these to windows-1252, so they are resolved
// before falling back to `encoding_rs`.
const ASCII_LABELS: &[&str] = &[
    "ascii",
    "us-ascii",
    "us_ascii",
    "ansi_x3.4-1968",
    "iso646-us",
    "646",
];

impl Charset {
    /// Plain 7-bit ASCII.
    pub const ASCII: Self = Self { kind: Kind::Ascii };

    /// The windows-1251 Cyrillic code page, the default charset.
    #[must_use]
    pub fn windows_1251() -> Self {
        Self {
            kind: Kind::SingleByte(encoding_rs::WINDOWS_1251),
        }
    }

    /// Looks up a charset by label.
    ///
    /// Labels are matched case-insensitively and follow the WHATWG Encoding
    /// Standard, so `"cp1251"`, `"windows-1251"` and `"x-cp1251"` all resolve
    /// to the same charset. The ASCII labels (`"ascii"`, `"us-ascii"`, ...)
    /// resolve to [`Charset::ASCII`].
    pub fn for_label(label: &str) -> Result<Self, UnknownEncoding> {
        let trimmed = label.trim();
        if ASCII_LABELS
            .iter()
            .any(|ascii| ascii.eq_ignore_ascii_case(trimmed))
        {
            return Ok(Self::ASCII);
        }

        match Encoding::for_label(trimmed.as_bytes()) {
            Some(encoding) if encoding.is_single_byte() => Ok(Self {
                kind: Kind::SingleByte(encoding),
            }),
            _ => Err(UnknownEncoding {
                label: label.to_owned(),
            }),
        }
    }

    /// The canonical name of this charset.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self.kind {
            Kind::Ascii => "ascii",
            Kind::SingleByte(encoding) => encoding.name(),
        }
    }

    /// Decodes bytes in this charset. Bytes without a mapping become
    /// U+FFFD, which [`Charset::confine`] later turns into a placeholder.
    #[must_use]
    pub fn decode_lossy<'a>(&self, bytes: &'a [u8]) -> Cow<'a, str> {
        match self.kind {
            Kind::Ascii => {
                if bytes.is_ascii() {
                    // All-ASCII input is valid UTF-8.
                    Cow::Borrowed(std::str::from_utf8(bytes).unwrap_or_default())
                } else {
                    Cow::Owned(
                        bytes
                            .iter()
                            .map(|&b| {
                                if b.is_ascii() {
                                    char::from(b)
                                } else {
                                    char::REPLACEMENT_CHARACTER
                                }
                            })
                            .collect(),
                    )
                }
            }
            Kind::SingleByte(encoding) => encoding.decode_without_bom_handling(bytes).0,
        }
    }

    /// Appends `text` to `out`, replacing every character this charset
    /// cannot represent with [`PLACEHOLDER`].
    pub fn confine(&self, text: &str, out: &mut String) {
        out.reserve(text.len());
        match self.kind {
            Kind::Ascii => out.extend(
                text.chars()
                    .map(|c| if c.is_ascii() { c } else { PLACEHOLDER }),
            ),
            Kind::SingleByte(encoding) => {
                let mut encoder = encoding.new_encoder();
                out.extend(text.chars().map(|c| {
                    if encode_char(&mut encoder, c).is_some() {
                        c
                    } else {
                        PLACEHOLDER
                    }
                }));
            }
        }
    }
}

impl Default for Charset {
    fn default() -> Self {
        Self::windows_1251()
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn encode_char(encoder: &mut Encoder, c: char) -> Option<u8> {
    let mut utf8 = [0u8; 4];
    let mut out = [0u8; 4];
    let (result, _read, written) =
        encoder.encode_from_utf8_without_replacement(c.encode_utf8(&mut utf8), &mut out, false);
    match result {
        EncoderResult::InputEmpty if written == 1 => Some(out[0]),
        _ => None,
    }
}
