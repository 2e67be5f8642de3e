//! Turning panics into [`Exception`]s.
//!
//! [`catch_panic`] runs a closure and converts a panic into an [`Exception`]
//! of type `panic`, carrying the panic message and the stack of the panicking
//! thread at the point of the panic:
//!
//! ```rust
//! use exc_string::{ExcFormatter, catch_panic, charset::Charset};
//!
//! let exception = catch_panic(|| -> u32 { panic!("worker gave up") }).unwrap_err();
//! let line = ExcFormatter::new(Charset::ASCII).exc_string(Some(&exception));
//! assert!(line.starts_with("panic(\"worker gave up\") in "));
//! ```
//!
//! A panic hook is installed the first time a panic is caught. Panics inside
//! a catching scope are silent; all other panics are forwarded to the hook
//! that was installed before.

use std::{
    any::Any,
    cell::{Cell, RefCell},
    panic::{self, AssertUnwindSafe},
    sync::Once,
};

use crate::{config, exception::Exception, stack::Stack};

thread_local! {
    static CATCH_DEPTH: Cell<usize> = const { Cell::new(0) };
    static PANIC_STACK: RefCell<Option<Stack>> = const { RefCell::new(None) };
}

static HOOK: Once = Once::new();

fn install_hook() {
    // `set_hook` must not be called while unwinding
    if std::thread::panicking() {
        return;
    }
    HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if CATCH_DEPTH.with(Cell::get) > 0 {
                let stack = Stack::capture(&config::stack_filter());
                PANIC_STACK.with(|slot| *slot.borrow_mut() = Some(stack));
            } else {
                previous(info);
            }
        }));
    });
}

struct CatchScope;

impl CatchScope {
    fn enter() -> Self {
        CATCH_DEPTH.with(|depth| depth.set(depth.get() + 1));
        CatchScope
    }
}

impl Drop for CatchScope {
    fn drop(&mut self) {
        CATCH_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

fn catch_with_stack<R>(f: impl FnOnce() -> R) -> Result<R, (Box<dyn Any + Send>, Stack)> {
    install_hook();
    let result = {
        let _scope = CatchScope::enter();
        panic::catch_unwind(AssertUnwindSafe(f))
    };
    result.map_err(|payload| {
        let stack = PANIC_STACK
            .with(|slot| slot.borrow_mut().take())
            .unwrap_or_default();
        (payload, stack)
    })
}

/// Runs `f`, returning the panic payload instead of unwinding further.
pub(crate) fn catch_silently<R>(f: impl FnOnce() -> R) -> Result<R, Box<dyn Any + Send>> {
    catch_with_stack(f).map_err(|(payload, _stack)| payload)
}

/// Runs `f`, converting a panic into an [`Exception`].
///
/// The exception's type name is `panic`. Its value is the panic message when
/// the payload is a string; other payloads produce an exception without a
/// value.
pub fn catch_panic<R>(f: impl FnOnce() -> R) -> Result<R, Exception> {
    catch_with_stack(f).map_err(|(payload, stack)| {
        tracing::debug!(frames = stack.len(), "caught panic");
        match payload.downcast::<String>() {
            Ok(message) => Exception::from_parts("panic", Some(message), stack),
            Err(payload) => match payload.downcast::<&'static str>() {
                Ok(message) => Exception::from_parts("panic", Some(message), stack),
                Err(_) => Exception::from_parts("panic", None, stack),
            },
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catch_silently() {
        assert_eq!(catch_silently(|| 5).ok(), Some(5));
        let payload = catch_silently(|| -> i32 { panic!("quiet") }).unwrap_err();
        assert_eq!(payload.downcast_ref::<&str>(), Some(&"quiet"));
        assert_eq!(CATCH_DEPTH.with(Cell::get), 0);
    }

    #[test]
    fn test_nested_scopes() {
        let outer = catch_silently(|| {
            let inner = catch_silently(|| -> i32 { panic!("inner") });
            assert!(inner.is_err());
            CATCH_DEPTH.with(Cell::get)
        });
        assert_eq!(outer.ok(), Some(1));
    }

    #[test]
    fn test_payload_kinds() {
        let exception = catch_panic(|| -> i32 { panic!("{} items", 3) }).unwrap_err();
        assert_eq!(exception.type_name(), "panic");
        assert!(exception.has_value());

        let exception = catch_panic(|| -> i32 { std::panic::panic_any(17u8) }).unwrap_err();
        assert_eq!(exception.type_name(), "panic");
        assert!(!exception.has_value());
    }
}
