//! Stack capture through the public API.
//!
//! These tests live outside the library crate because frames of the library
//! itself are filtered out of captured stacks.

use exc_string::{ExcFormatter, Exception, StackFilter, charset::Charset};

struct Bar;

impl Bar {
    #[inline(never)]
    fn __init__() -> Exception {
        Exception::new("z\u{ff}z\n    ").with_type_name("Exception")
    }
}

#[inline(never)]
fn foo() -> Exception {
    Bar::__init__()
}

#[inline(never)]
fn caller() -> String {
    exc_string::trace_string()
}

#[inline(never)]
fn recur(depth: usize) -> exc_string::Result<()> {
    if depth == 0 {
        return Err(Exception::bare("RecursionBottom"));
    }
    recur(depth - 1)?;
    Ok(())
}

fn entries(chain: &str) -> Vec<&str> {
    chain.split(" <- ").collect()
}

#[test]
fn test_trace_string_has_caller() {
    let chain = caller();
    let entries = entries(&chain);
    assert!(!entries.is_empty());
    assert!(
        entries[0].starts_with("caller() (stack_capture.rs:"),
        "unexpected chain: {chain}"
    );
    assert!(!chain.contains("capture() ("), "unexpected chain: {chain}");
}

#[test]
fn test_exception_line_end_to_end() {
    let exception = foo();
    let line = ExcFormatter::new(Charset::ASCII).exc_string(Some(&exception));
    assert!(
        line.starts_with("Exception(\"z?z \") in __init__() (stack_capture.rs:"),
        "unexpected line: {line}"
    );

    let chain = line.split_once(" in ").map(|(_, chain)| chain).unwrap();
    let entries = entries(chain);
    assert!(entries.len() >= 2, "unexpected line: {line}");
    assert!(entries[1].starts_with("foo() (stack_capture.rs:"));
    for entry in entries {
        let (_, location) = entry.rsplit_once(" (").unwrap();
        let (_, line_number) = location.trim_end_matches(')').rsplit_once(':').unwrap();
        assert!(
            line_number == "?" || line_number.parse::<u32>().is_ok(),
            "unexpected entry: {entry}"
        );
    }
}

#[test]
fn test_deep_recursion_is_rendered() {
    let exception = recur(100).unwrap_err();
    assert!(exception.stack().len() >= 100);

    let line = ExcFormatter::new(Charset::ASCII).exc_string(Some(&exception));
    assert!(line.starts_with("RecursionBottom(\"RecursionBottom\") in recur() ("));
    assert!(line.matches("recur() (").count() >= 100);
    assert!(!line.contains('\n'));
}

#[test]
fn test_innermost_frame() {
    let exception = foo();
    let innermost = exception.stack().innermost().unwrap();
    assert_eq!(innermost.function, "__init__");
    assert_eq!(innermost.basename(), "stack_capture.rs");
    assert!(innermost.line.is_some());
}

#[test]
fn test_unfiltered_keeps_own_frames() {
    let formatter = ExcFormatter::new(Charset::ASCII).with_filter(StackFilter::UNFILTERED);
    let chain = formatter.trace_string();
    assert!(chain.contains("trace_string() ("), "unexpected chain: {chain}");
}

#[test]
fn test_max_frames() {
    let formatter = ExcFormatter::new(Charset::ASCII).with_filter(StackFilter {
        max_frames: 1,
        ..StackFilter::DEFAULT
    });
    let chain = formatter.trace_string();
    assert_eq!(entries(&chain).len(), 1, "unexpected chain: {chain}");
}
