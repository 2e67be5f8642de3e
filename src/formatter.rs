//! The [`ExcFormatter`], which renders exceptions and stacks as single lines.
//!
//! A formatter owns its charset and stack filter, so formatters configured
//! differently can be used side by side. The crate-level free functions use
//! [`ExcFormatter::from_env`].

use crate::{
    charset::Charset,
    config,
    describe::Describe,
    exception::Exception,
    panic::catch_silently,
    sanitize::Sanitizer,
    stack::{Stack, StackFilter, StackFrame, format_chain},
};

/// Rendered by [`ExcFormatter::exc_string`] when there is no exception.
pub const NO_EXCEPTION: &str = "no exception";

/// Rendered by [`ExcFormatter::exc_string`] when rendering itself fails.
pub const EXTRACTION_FAILED: &str = "exc_string() failed to extract exception string";

/// Renders values, stacks and exceptions as sanitized single lines.
///
/// ```rust
/// use exc_string::{Exception, ExcFormatter, Stack, StackFrame, charset::Charset};
///
/// let formatter = ExcFormatter::new(Charset::ASCII);
/// let exception = Exception::new("connection reset\n  by peer").with_stack(Stack::new(vec![
///     StackFrame::new("/srv/app/main.rs", 10, "main"),
///     StackFrame::new("/srv/app/net.rs", 88, "read_frame"),
/// ]));
/// assert_eq!(
///     formatter.exc_string(Some(&exception)),
///     "str(\"connection reset by peer\") in read_frame() (net.rs:88) <- main() (main.rs:10)"
/// );
/// assert_eq!(formatter.exc_string(None), "no exception");
/// ```
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ExcFormatter {
    sanitizer: Sanitizer,
    filter: StackFilter,
}

impl ExcFormatter {
    /// Creates a formatter for `charset` with the default stack filter.
    #[must_use]
    pub const fn new(charset: Charset) -> Self {
        Self {
            sanitizer: Sanitizer::new(charset),
            filter: StackFilter::DEFAULT,
        }
    }

    /// Creates a formatter from the process-wide default encoding and the
    /// stack filter selected by the environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            sanitizer: Sanitizer::new(config::charset()),
            filter: config::stack_filter(),
        }
    }

    /// Replaces the filter used when capturing stacks.
    #[must_use]
    pub const fn with_filter(mut self, filter: StackFilter) -> Self {
        self.filter = filter;
        self
    }

    /// The charset output is confined to.
    #[must_use]
    pub const fn charset(&self) -> Charset {
        self.sanitizer.charset()
    }

    /// The sanitizer used for values and frames.
    #[must_use]
    pub const fn sanitizer(&self) -> &Sanitizer {
        &self.sanitizer
    }

    /// The filter used when capturing stacks.
    #[must_use]
    pub const fn filter(&self) -> &StackFilter {
        &self.filter
    }

    /// Describes `value` as a sanitized string. See
    /// [`Sanitizer::force_string`].
    #[must_use]
    pub fn force_string<V: Describe + ?Sized>(&self, value: &V) -> String {
        self.sanitizer.force_string(value)
    }

    /// Renders the call stack of the caller.
    #[must_use]
    #[inline(never)]
    pub fn trace_string(&self) -> String {
        let stack = Stack::capture(&self.filter);
        self.trace_string_of(stack.frames())
    }

    /// Renders frames given outermost first.
    #[must_use]
    pub fn trace_string_of(&self, frames: &[StackFrame]) -> String {
        format_chain(&self.sanitizer, frames)
    }

    /// Renders an exception as `Type("message") in <stack chain>`.
    ///
    /// Never fails. `None` renders as [`NO_EXCEPTION`]; a failure while
    /// rendering renders as [`EXTRACTION_FAILED`].
    #[must_use]
    pub fn exc_string(&self, exception: Option<&Exception>) -> String {
        let Some(exception) = exception else {
            return NO_EXCEPTION.to_owned();
        };
        match catch_silently(|| self.render(exception)) {
            Ok(line) => line,
            Err(_payload) => {
                tracing::debug!(
                    type_name = exception.type_name(),
                    "exception string could not be extracted"
                );
                EXTRACTION_FAILED.to_owned()
            }
        }
    }

    fn render(&self, exception: &Exception) -> String {
        let type_name = self.sanitizer.sanitize_str(exception.type_name());
        let message = match exception.value() {
            Some(value) => self.sanitizer.force_string(value),
            None => type_name.clone(),
        };
        let chain = self.trace_string_of(exception.stack().frames());
        format!("{type_name}(\"{message}\") in {chain}")
    }
}

#[cfg(test)]
mod tests {
    use std::fmt;

    use super::*;
    use crate::describe::{ConversionError, Description, Displayed, Opaque};

    struct Recursive;

    impl Describe for Recursive {
        fn describe(&self) -> Result<Description<'_>, ConversionError> {
            Ok(Description::Value(self))
        }
    }

    struct PanickingDescription;

    impl Describe for PanickingDescription {
        fn describe(&self) -> Result<Description<'_>, ConversionError> {
            panic!("describe exploded")
        }
    }

    struct CursedName;

    impl Describe for CursedName {
        fn describe(&self) -> Result<Description<'_>, ConversionError> {
            Ok(Description::Text("cursed".into()))
        }

        fn type_name(&self) -> &'static str {
            panic!("type name exploded")
        }
    }

    struct Haunted;

    impl fmt::Display for Haunted {
        fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
            panic!("display exploded")
        }
    }

    fn stack() -> Stack {
        Stack::new(vec![
            StackFrame::new("/srv/test.py", 172, "?"),
            StackFrame::new("/srv/test.py", 170, "test"),
            StackFrame::new("/srv/test.py", 166, "foo"),
        ])
    }

    const CHAIN: &str = "foo() (test.py:166) <- test() (test.py:170) <- ?() (test.py:172)";

    #[test]
    fn test_no_exception() {
        assert_eq!(ExcFormatter::default().exc_string(None), "no exception");
    }

    #[test]
    fn test_exception_line() {
        let formatter = ExcFormatter::new(Charset::ASCII);
        let exception = Exception::new(String::from("z\u{ff}z\n    "))
            .with_type_name("Exception")
            .with_stack(stack());
        assert_eq!(
            formatter.exc_string(Some(&exception)),
            format!("Exception(\"z?z \") in {CHAIN}")
        );
    }

    #[test]
    fn test_bare_exception_uses_type_name() {
        let formatter = ExcFormatter::new(Charset::ASCII);
        let exception = Exception::bare("KeyboardInterrupt").with_stack(stack());
        assert_eq!(
            formatter.exc_string(Some(&exception)),
            format!("KeyboardInterrupt(\"KeyboardInterrupt\") in {CHAIN}")
        );
    }

    #[test]
    fn test_unconvertible_values() {
        let formatter = ExcFormatter::new(Charset::ASCII);
        let exception = Exception::new(Opaque(7u8)).with_stack(stack());
        assert_eq!(
            formatter.exc_string(Some(&exception)),
            format!("u8(\"unable to convert u8 to string, str() failed\") in {CHAIN}")
        );

        let exception = Exception::new(Recursive).with_stack(Stack::default());
        assert_eq!(
            formatter.exc_string(Some(&exception)),
            "Recursive(\"unable to convert Recursive to string, str() failed\") in "
        );

        let exception = Exception::new(Displayed(Haunted)).with_stack(Stack::default());
        assert_eq!(
            formatter.exc_string(Some(&exception)),
            "Haunted(\"unable to convert Haunted to string, str() failed\") in "
        );
    }

    #[test]
    fn test_extraction_failure() {
        let formatter = ExcFormatter::new(Charset::ASCII);
        let exception =
            Exception::from_parts("CursedName", Some(Box::new(CursedName)), Stack::default());
        assert_eq!(
            formatter.exc_string(Some(&exception)),
            "exc_string() failed to extract exception string"
        );
    }

    #[test]
    fn test_panicking_description() {
        let formatter = ExcFormatter::new(Charset::ASCII);
        let exception = Exception::new(PanickingDescription).with_stack(stack());
        assert_eq!(
            formatter.exc_string(Some(&exception)),
            format!(
                "PanickingDescription(\"unable to convert PanickingDescription to string, str() failed\") in {CHAIN}"
            )
        );
    }

    #[test]
    fn test_type_name_is_sanitized() {
        let formatter = ExcFormatter::new(Charset::ASCII);
        let exception = Exception::bare("Ошибка").with_stack(Stack::default());
        assert_eq!(formatter.exc_string(Some(&exception)), "??????(\"??????\") in ");

        let formatter = ExcFormatter::new(Charset::windows_1251());
        assert_eq!(formatter.exc_string(Some(&exception)), "Ошибка(\"Ошибка\") in ");
    }

    #[test]
    fn test_trace_string_of_empty() {
        assert_eq!(ExcFormatter::default().trace_string_of(&[]), "");
    }

    #[test]
    fn test_with_filter() {
        let formatter = ExcFormatter::new(Charset::ASCII).with_filter(StackFilter::UNFILTERED);
        assert_eq!(formatter.filter(), &StackFilter::UNFILTERED);
        assert_eq!(formatter.charset(), Charset::ASCII);
    }
}
