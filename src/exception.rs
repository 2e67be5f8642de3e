//! Explicit exception values.
//!
//! An [`Exception`] is what a diagnostic line describes: a type name, an
//! optional value that describes the failure, and the call stack captured
//! where the exception was created. Functions return it like any other error,
//! and `?` converts every [`core::error::Error`] into one:
//!
//! ```rust
//! use exc_string::{Exception, ExcFormatter, ExcStringExt, charset::Charset};
//!
//! fn parse_port(text: &str) -> Result<u16, Exception> {
//!     Ok(text.parse::<u16>()?)
//! }
//!
//! let formatter = ExcFormatter::new(Charset::ASCII);
//! assert_eq!(parse_port("80").exc_string_with(&formatter), "no exception");
//!
//! let line = parse_port("eighty").exc_string_with(&formatter);
//! assert!(line.starts_with("ParseIntError(\"invalid digit found in string\") in "));
//! ```

use std::{borrow::Cow, fmt};

use crate::{
    config,
    describe::{Describe, Displayed},
    formatter::ExcFormatter,
    stack::Stack,
    symbol::last_path_segment,
};

/// An error value with the call stack of the place it was created.
pub struct Exception {
    type_name: Cow<'static, str>,
    value: Option<Box<dyn Describe + Send + Sync>>,
    stack: Stack,
}

impl Exception {
    /// Creates an exception from a value, capturing the current call stack.
    ///
    /// The type name is the short name of the value's type.
    #[must_use]
    #[inline(never)]
    pub fn new<V>(value: V) -> Self
    where
        V: Describe + Send + Sync + 'static,
    {
        let type_name = last_path_segment(value.type_name());
        Self::from_parts(
            type_name,
            Some(Box::new(value)),
            Stack::capture(&config::stack_filter()),
        )
    }

    /// Creates an exception from an error, described by its
    /// [`Display`](fmt::Display) implementation.
    #[must_use]
    #[inline(never)]
    pub fn from_error<E>(error: E) -> Self
    where
        E: core::error::Error + Send + Sync + 'static,
    {
        Self::new(Displayed(error))
    }

    /// Creates an exception that has a type but no value, capturing the
    /// current call stack. Its message is the type name itself.
    #[must_use]
    #[inline(never)]
    pub fn bare(type_name: impl Into<Cow<'static, str>>) -> Self {
        Self::from_parts(type_name, None, Stack::capture(&config::stack_filter()))
    }

    pub(crate) fn from_parts(
        type_name: impl Into<Cow<'static, str>>,
        value: Option<Box<dyn Describe + Send + Sync>>,
        stack: Stack,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            value,
            stack,
        }
    }

    /// Replaces the type name.
    #[must_use]
    pub fn with_type_name(mut self, type_name: impl Into<Cow<'static, str>>) -> Self {
        self.type_name = type_name.into();
        self
    }

    /// Replaces the call stack, for example with frames reported by an
    /// embedded interpreter.
    #[must_use]
    pub fn with_stack(mut self, stack: Stack) -> Self {
        self.stack = stack;
        self
    }

    /// The exception's type name.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The value describing the failure, if any.
    #[must_use]
    pub fn value(&self) -> Option<&(dyn Describe + Send + Sync)> {
        self.value.as_deref()
    }

    /// Whether the exception carries a value.
    #[must_use]
    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    /// The call stack captured when the exception was created.
    #[must_use]
    pub fn stack(&self) -> &Stack {
        &self.stack
    }
}

impl<E> From<E> for Exception
where
    E: core::error::Error + Send + Sync + 'static,
{
    #[inline(never)]
    fn from(error: E) -> Self {
        Self::from_error(error)
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&ExcFormatter::from_env().exc_string(Some(self)))
    }
}

impl fmt::Debug for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exception")
            .field("type_name", &self.type_name)
            .field("has_value", &self.has_value())
            .field("stack", &self.stack)
            .finish()
    }
}

/// Extension trait for rendering exceptions held in other types.
///
/// An `Ok` result has no exception and renders as `"no exception"`.
pub trait ExcStringExt {
    /// Renders the exception with the process-wide default formatter.
    fn exc_string(&self) -> String {
        self.exc_string_with(&ExcFormatter::from_env())
    }

    /// Renders the exception with the given formatter.
    fn exc_string_with(&self, formatter: &ExcFormatter) -> String;
}

impl ExcStringExt for Exception {
    fn exc_string_with(&self, formatter: &ExcFormatter) -> String {
        formatter.exc_string(Some(self))
    }
}

impl<T> ExcStringExt for Result<T, Exception> {
    fn exc_string_with(&self, formatter: &ExcFormatter) -> String {
        formatter.exc_string(self.as_ref().err())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{charset::Charset, stack::StackFrame};

    static_assertions::assert_impl_all!(Exception: Send, Sync);
    static_assertions::assert_not_impl_any!(Exception: Clone, core::error::Error);

    fn fixed_stack() -> Stack {
        Stack::new(vec![
            StackFrame::new("/srv/test.py", 7, "?"),
            StackFrame::new("/srv/test.py", 5, "__init__"),
        ])
    }

    #[test]
    fn test_type_names() {
        assert_eq!(Exception::new(String::from("x")).type_name(), "String");
        assert_eq!(Exception::new("x").type_name(), "str");
        assert_eq!(
            Exception::from_error(std::io::Error::other("x")).type_name(),
            "Error"
        );
        assert_eq!(Exception::bare("Timeout").type_name(), "Timeout");
        assert_eq!(
            Exception::new(5).with_type_name("Exception").type_name(),
            "Exception"
        );
    }

    #[test]
    fn test_result_ext() {
        let formatter = ExcFormatter::new(Charset::ASCII);
        let ok: Result<(), Exception> = Ok(());
        assert_eq!(ok.exc_string_with(&formatter), "no exception");

        let err: Result<(), Exception> =
            Err(Exception::new("z\u{ff}z\n    ").with_type_name("Exception").with_stack(fixed_stack()));
        assert_eq!(
            err.exc_string_with(&formatter),
            "Exception(\"z?z \") in __init__() (test.py:5) <- ?() (test.py:7)"
        );
    }

    #[test]
    fn test_question_mark_conversion() {
        fn read() -> Result<u8, Exception> {
            Ok("300".parse::<u8>()?)
        }
        let exception = read().unwrap_err();
        assert_eq!(exception.type_name(), "ParseIntError");
        assert!(exception.has_value());
    }
}
