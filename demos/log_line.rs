//! Writing exceptions to a log as single lines.
//!
//! A request handler fails several levels down, and the failure is logged as
//! one line through `tracing`. The second request panics; the panic is turned
//! into an exception and logged the same way.
//!
//! Run with `cargo run --example log_line`. Set `EXC_STRING_ENCODING=ascii`
//! to see how text outside the log encoding is replaced.

use exc_string::{Exception, ExcStringExt, catch_panic};

#[derive(Debug, thiserror::Error)]
#[error("permission denied for user «{user}»\n  (role: {role})")]
struct PermissionError {
    user: String,
    role: &'static str,
}

fn check_user_permission(user: &str) -> Result<(), PermissionError> {
    Err(PermissionError {
        user: user.to_owned(),
        role: "гость",
    })
}

fn handle_request(user: &str) -> exc_string::Result<()> {
    check_user_permission(user)?;
    Ok(())
}

fn parse_quota(text: &str) -> u32 {
    text.parse().unwrap_or_else(|_| panic!("quota {text:?} is not a number"))
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_target(false)
        .init();

    tracing::info!(encoding = %exc_string::get_encoding(), "logging exceptions");

    let result = handle_request("Иван");
    tracing::error!("{}", result.exc_string());

    let panicked: Result<u32, Exception> = catch_panic(|| parse_quota("lots"));
    tracing::error!("{}", panicked.exc_string());

    tracing::info!("call stack: {}", exc_string::trace_string());
}
