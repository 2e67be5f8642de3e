//! Commonly used items for convenient importing.
//!
//! ```rust
//! use exc_string::prelude::*;
//!
//! fn port(text: &str) -> Result<u16, Exception> {
//!     Ok(text.parse()?)
//! }
//!
//! let line = port("http").exc_string();
//! assert!(line.starts_with("ParseIntError("));
//! ```

pub use crate::{
    describe::{Describe, Displayed, Opaque},
    exception::{ExcStringExt, Exception},
    formatter::ExcFormatter,
    panic::catch_panic,
};
