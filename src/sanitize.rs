//! Forcing values into single-line, charset-safe strings.
//!
//! [`Sanitizer::force_string`] never fails: values whose description fails
//! are reported as `unable to convert <TypeName> to string, str() failed`.
//!
//! Sanitized text obeys these rules:
//!
//! - every character the charset cannot represent becomes `?`;
//! - a tab becomes a space;
//! - a newline becomes a space, and the spaces and tabs indenting the next
//!   line are folded into it;
//! - every other control character below U+0020 becomes `?`.
//!
//! Folding the indentation after a newline means the output can be shorter
//! than the input: `"a\n  b"` becomes `"a b"`. All other characters map one
//! to one.

use crate::{
    charset::{Charset, PLACEHOLDER},
    describe::{ConversionError, Describe, Description},
    panic::catch_silently,
    symbol::last_path_segment,
};

/// How deep [`Description::Value`] chains may nest before describing gives
/// up.
pub const MAX_DESCRIPTION_DEPTH: usize = 16;

/// Forces values into strings confined to a [`Charset`].
///
/// ```rust
/// use exc_string::{charset::Charset, sanitize::Sanitizer};
///
/// let sanitizer = Sanitizer::new(Charset::ASCII);
/// assert_eq!(sanitizer.force_string("caf\u{e9}\tau lait"), "caf? au lait");
/// assert_eq!(sanitizer.force_string(&10), "10");
/// ```
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Sanitizer {
    charset: Charset,
}

#[derive(PartialEq, Eq)]
struct Visited {
    address: *const (),
    type_name: &'static str,
}

impl Visited {
    fn of<V: Describe + ?Sized>(value: &V) -> Self {
        Self {
            address: core::ptr::from_ref(value).cast::<()>(),
            type_name: value.type_name(),
        }
    }
}

impl Sanitizer {
    /// Creates a sanitizer for the given charset.
    #[must_use]
    pub const fn new(charset: Charset) -> Self {
        Self { charset }
    }

    /// The charset output is confined to.
    #[must_use]
    pub const fn charset(&self) -> Charset {
        self.charset
    }

    /// Describes `value` and sanitizes the result.
    ///
    /// A [`Describe`] implementation that panics is reported like any other
    /// conversion failure.
    #[must_use]
    pub fn force_string<V: Describe + ?Sized>(&self, value: &V) -> String {
        let described = catch_silently(|| {
            value
                .describe()
                .and_then(|description| self.resolve(description, Visited::of(value)))
        })
        .unwrap_or(Err(ConversionError::Panicked));
        match described {
            Ok(text) => text,
            Err(error) => {
                let type_name = last_path_segment(value.type_name());
                tracing::debug!(type_name, %error, "value could not be converted to a string");
                format!("unable to convert {type_name} to string, str() failed")
            }
        }
    }

    /// Sanitizes text.
    #[must_use]
    pub fn sanitize_str(&self, text: &str) -> String {
        let mut confined = String::with_capacity(text.len());
        self.charset.confine(text, &mut confined);
        map_control_characters(&confined)
    }

    /// Decodes bytes in the charset and sanitizes the result.
    #[must_use]
    pub fn sanitize_bytes(&self, bytes: &[u8]) -> String {
        self.sanitize_str(&self.charset.decode_lossy(bytes))
    }

    fn resolve(
        &self,
        mut description: Description<'_>,
        origin: Visited,
    ) -> Result<String, ConversionError> {
        let mut visited = vec![origin];
        loop {
            let next = match description {
                Description::Text(text) => return Ok(self.sanitize_str(&text)),
                Description::Bytes(bytes) => return Ok(self.sanitize_bytes(&bytes)),
                Description::Value(next) => next,
            };

            let key = Visited::of(next);
            if visited.contains(&key) {
                return Err(ConversionError::SelfReferential);
            }
            if visited.len() >= MAX_DESCRIPTION_DEPTH {
                return Err(ConversionError::TooDeep(MAX_DESCRIPTION_DEPTH));
            }
            visited.push(key);
            description = next.describe()?;
        }
    }
}

fn map_control_characters(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut folding_indent = false;
    for c in text.chars() {
        match c {
            '\n' => {
                out.push(' ');
                folding_indent = true;
            }
            ' ' | '\t' if folding_indent => {}
            '\t' => out.push(' '),
            c if u32::from(c) < 0x20 => {
                out.push(PLACEHOLDER);
                folding_indent = false;
            }
            c => {
                out.push(c);
                folding_indent = false;
            }
        }
    }
    out
}
