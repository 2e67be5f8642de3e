//! Panics converted into exceptions.

use std::panic;

use exc_string::{ExcFormatter, catch_panic, charset::Charset};

#[inline(never)]
fn explode() -> u32 {
    panic!("boom\tnow")
}

#[inline(never)]
fn explode_with(count: usize) -> u32 {
    panic!("{count} workers\ngave up")
}

fn ascii() -> ExcFormatter {
    ExcFormatter::new(Charset::ASCII)
}

#[test]
fn test_no_panic() {
    assert_eq!(catch_panic(|| 7).unwrap(), 7);
}

#[test]
fn test_panic_site_is_innermost_frame() {
    let exception = catch_panic(explode).unwrap_err();
    assert_eq!(exception.type_name(), "panic");

    let line = ascii().exc_string(Some(&exception));
    assert!(
        line.starts_with("panic(\"boom now\") in explode() (panics.rs:"),
        "unexpected line: {line}"
    );
    assert!(line.contains(" <- "), "unexpected line: {line}");
}

#[test]
fn test_formatted_message() {
    let exception = catch_panic(|| explode_with(3)).unwrap_err();
    let line = ascii().exc_string(Some(&exception));
    assert!(
        line.starts_with("panic(\"3 workers gave up\") in explode_with() (panics.rs:"),
        "unexpected line: {line}"
    );
}

#[test]
fn test_non_string_payload() {
    let exception = catch_panic(|| -> u32 { panic::panic_any(404u16) }).unwrap_err();
    assert!(!exception.has_value());
    let line = ascii().exc_string(Some(&exception));
    assert!(line.starts_with("panic(\"panic\") in "), "unexpected line: {line}");
}

#[test]
fn test_nested_catch() {
    let outer = catch_panic(|| {
        let inner = catch_panic(explode);
        assert!(inner.is_err());
        "recovered"
    });
    assert_eq!(outer.unwrap(), "recovered");
}

#[test]
fn test_plain_catch_unwind_still_works() {
    // Installs the hook first
    assert!(catch_panic(explode).is_err());

    let payload = panic::catch_unwind(|| -> u32 { panic!("outside") }).unwrap_err();
    assert_eq!(payload.downcast_ref::<&str>(), Some(&"outside"));
}

#[test]
fn test_catch_in_threads() {
    let handles: Vec<_> = (0..4)
        .map(|i| std::thread::spawn(move || catch_panic(move || explode_with(i)).unwrap_err()))
        .collect();
    for handle in handles {
        let exception = handle.join().unwrap();
        let line = ascii().exc_string(Some(&exception));
        assert!(line.contains("explode_with() (panics.rs:"), "unexpected line: {line}");
    }
}
