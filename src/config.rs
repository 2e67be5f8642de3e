//! Process-wide configuration.
//!
//! Environment variables are read once per process:
//!
//! - `EXC_STRING_ENCODING` - the initial default encoding label
//! - `EXC_STRING_BACKTRACE=unfiltered` - keeps every frame of captured stacks
//! - `RUST_BACKTRACE=full` - same as `unfiltered`
//!
//! The default encoding can be changed at runtime with
//! [`set_encoding`](crate::set_encoding).

use std::sync::{OnceLock, PoisonError, RwLock};

use crate::{
    charset::{Charset, UnknownEncoding},
    stack::StackFilter,
};

/// Label of the default encoding when `EXC_STRING_ENCODING` is not set.
pub const DEFAULT_ENCODING_LABEL: &str = "windows-1251";

#[derive(Debug)]
struct ExcStringEnvOptions {
    unfiltered: bool,
    encoding: Option<String>,
}

impl ExcStringEnvOptions {
    fn get() -> &'static Self {
        static EXC_STRING_FLAGS: OnceLock<ExcStringEnvOptions> = OnceLock::new();

        EXC_STRING_FLAGS.get_or_init(|| {
            let mut unfiltered =
                std::env::var_os("RUST_BACKTRACE").is_some_and(|var| var == "full");
            if let Some(var) = std::env::var_os("EXC_STRING_BACKTRACE") {
                for v in var.to_string_lossy().split(',') {
                    if v.trim().eq_ignore_ascii_case("unfiltered") {
                        unfiltered = true;
                    }
                }
            }
            let encoding = std::env::var("EXC_STRING_ENCODING")
                .ok()
                .filter(|label| !label.trim().is_empty());
            ExcStringEnvOptions {
                unfiltered,
                encoding,
            }
        })
    }
}

#[derive(Clone, Debug)]
struct EncodingSetting {
    label: String,
    charset: Charset,
}

impl EncodingSetting {
    fn from_env() -> Self {
        let fallback = || Self {
            label: DEFAULT_ENCODING_LABEL.to_owned(),
            charset: Charset::windows_1251(),
        };
        let Some(label) = &ExcStringEnvOptions::get().encoding else {
            return fallback();
        };
        match Charset::for_label(label) {
            Ok(charset) => Self {
                label: label.clone(),
                charset,
            },
            Err(error) => {
                tracing::warn!(%error, fallback = DEFAULT_ENCODING_LABEL, "ignoring EXC_STRING_ENCODING");
                fallback()
            }
        }
    }
}

// `None` until first read or write
static DEFAULT_ENCODING: RwLock<Option<EncodingSetting>> = RwLock::new(None);

fn with_setting<R>(f: impl FnOnce(&EncodingSetting) -> R) -> R {
    {
        let guard = DEFAULT_ENCODING
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(setting) = guard.as_ref() {
            return f(setting);
        }
    }
    let mut guard = DEFAULT_ENCODING
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    f(guard.get_or_insert_with(EncodingSetting::from_env))
}

/// The charset of the process-wide default encoding.
pub(crate) fn charset() -> Charset {
    with_setting(|setting| setting.charset)
}

/// The label of the process-wide default encoding, as it was set.
pub(crate) fn encoding_label() -> String {
    with_setting(|setting| setting.label.clone())
}

/// Replaces the process-wide default encoding.
pub(crate) fn set_encoding(label: &str) -> Result<(), UnknownEncoding> {
    let charset = Charset::for_label(label)?;
    let mut guard = DEFAULT_ENCODING
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    *guard = Some(EncodingSetting {
        label: label.to_owned(),
        charset,
    });
    tracing::debug!(label, charset = charset.name(), "default encoding changed");
    Ok(())
}

/// The stack filter selected by the environment.
pub(crate) fn stack_filter() -> StackFilter {
    if ExcStringEnvOptions::get().unfiltered {
        StackFilter::UNFILTERED
    } else {
        StackFilter::DEFAULT
    }
}
