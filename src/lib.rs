#![deny(
    missing_docs,
    unsafe_code,
    clippy::missing_safety_doc,
    clippy::as_ptr_cast_mut,
    clippy::ptr_as_ptr,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]
// Make docs.rs generate better docs
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Single-line, encoding-safe error and call stack strings for log files.
//!
//! ## Overview
//!
//! Log files written in a legacy single-byte encoding have no room for
//! multi-line backtraces, stray control characters or text the encoding
//! cannot represent. This crate renders errors as exactly one line that is
//! safe to write in such a file:
//!
//! ```text
//! Exception("z?z ") in __init__() (handler.rs:5) <- foo() (handler.rs:9) <- main() (main.rs:3)
//! ```
//!
//! The line names the exception type, the sanitized message, and the call
//! stack at the point the exception was created, innermost frame first.
//!
//! ## Quick Example
//!
//! ```
//! use exc_string::ExcStringExt;
//!
//! fn load(path: &str) -> exc_string::Result<String> {
//!     Ok(std::fs::read_to_string(path)?)
//! }
//!
//! let result = load("/definitely/not/here.cfg");
//! let line = result.exc_string();
//! assert!(line.starts_with("Error(\""));
//! assert!(!line.contains('\n'));
//! ```
//!
//! ## Core Concepts
//!
//! - **Sanitizing**: [`force_string`] turns any [`Describe`] value into text
//!   confined to the active [`Charset`](charset::Charset). Characters the
//!   charset cannot represent and control characters become `?`; tabs and
//!   newlines become spaces. Values that fail to describe themselves are
//!   reported by type name instead, so sanitizing never fails.
//! - **Stacks**: [`trace_string`] renders the caller's stack as
//!   `function() (file:line)` entries joined by `" <- "`.
//!   [`trace_string_of`] renders frames supplied by the caller.
//! - **Exceptions**: an [`Exception`] carries a type name, an optional value
//!   and the stack captured when it was created. [`exc_string`] renders it as
//!   a single line, and never fails. [`catch_panic`] turns panics into
//!   exceptions.
//!
//! ## Encodings
//!
//! The free functions in this crate use a process-wide default encoding,
//! `windows-1251` unless the `EXC_STRING_ENCODING` environment variable names
//! another one. It can be changed at runtime with [`set_encoding`]. An
//! [`ExcFormatter`] holds its own charset and is unaffected by the default.
//!
//! ```
//! use exc_string::{ExcFormatter, charset::Charset};
//!
//! let cyrillic = ExcFormatter::new(Charset::windows_1251());
//! let ascii = ExcFormatter::new(Charset::ASCII);
//! assert_eq!(cyrillic.force_string("Привет"), "Привет");
//! assert_eq!(ascii.force_string("Привет"), "??????");
//! ```
//!
//! See [`config`] for the environment variables that are recognized.

pub mod charset;
pub mod config;
pub mod describe;
pub mod exception;
pub mod formatter;
mod panic;
pub mod prelude;
pub mod sanitize;
pub mod stack;
mod symbol;

pub use self::{
    charset::UnknownEncoding,
    describe::Describe,
    exception::{ExcStringExt, Exception},
    formatter::ExcFormatter,
    panic::catch_panic,
    stack::{Stack, StackFilter, StackFrame},
};

/// A [`Result`](core::result::Result) type alias where the error defaults to
/// [`Exception`].
///
/// ```
/// fn might_fail() -> exc_string::Result<u16> {
///     Ok("8080".parse()?)
/// }
/// # assert_eq!(might_fail().unwrap(), 8080);
/// ```
pub type Result<T, E = Exception> = core::result::Result<T, E>;

/// Returns the label of the process-wide default encoding.
///
/// This is the label most recently passed to [`set_encoding`], or the
/// initial default.
#[must_use]
pub fn get_encoding() -> String {
    config::encoding_label()
}

/// Sets the process-wide default encoding used by the free functions of this
/// crate.
///
/// # Errors
///
/// Returns [`UnknownEncoding`] if `label` does not name a supported
/// single-byte encoding. The default is left unchanged in that case.
///
/// # Examples
///
/// ```
/// exc_string::set_encoding("ascii")?;
/// assert_eq!(exc_string::get_encoding(), "ascii");
/// assert!(exc_string::set_encoding("utf-8").is_err());
/// # Ok::<(), exc_string::UnknownEncoding>(())
/// ```
pub fn set_encoding(label: &str) -> core::result::Result<(), UnknownEncoding> {
    config::set_encoding(label)
}

/// Describes `value` as a string in the default encoding.
///
/// ```
/// assert_eq!(exc_string::force_string(&10), "10");
/// assert_eq!(exc_string::force_string(&None::<i32>), "None");
/// assert_eq!(exc_string::force_string("two\n  lines"), "two lines");
/// ```
#[must_use]
pub fn force_string<V: Describe + ?Sized>(value: &V) -> String {
    ExcFormatter::from_env().force_string(value)
}

/// Renders the caller's call stack as a single line.
///
/// ```
/// let chain = exc_string::trace_string();
/// assert!(!chain.contains('\n'));
/// ```
#[must_use]
#[inline(never)]
pub fn trace_string() -> String {
    ExcFormatter::from_env().trace_string()
}

/// Renders frames, given outermost first, as a single line.
#[must_use]
pub fn trace_string_of(frames: &[StackFrame]) -> String {
    ExcFormatter::from_env().trace_string_of(frames)
}

/// Renders an exception as a single line in the default encoding.
///
/// ```
/// use exc_string::Exception;
///
/// assert_eq!(exc_string::exc_string(None), "no exception");
///
/// let exception = Exception::bare("Timeout");
/// assert!(exc_string::exc_string(Some(&exception)).starts_with("Timeout(\"Timeout\") in "));
/// ```
#[must_use]
pub fn exc_string(exception: Option<&Exception>) -> String {
    ExcFormatter::from_env().exc_string(exception)
}
