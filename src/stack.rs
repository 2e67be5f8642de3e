//! Call stacks and their one-line rendering.
//!
//! A [`Stack`] holds [`StackFrame`]s ordered from the outermost caller to the
//! innermost frame, the order stack introspection naturally produces. Stacks
//! are either captured from the running thread with [`Stack::capture`] or
//! assembled from frames supplied by the caller, for example frames reported
//! by an embedded interpreter.
//!
//! Rendered, a stack is a chain of `function() (file:line)` entries, innermost
//! first, joined by `" <- "`:
//!
//! ```rust
//! use exc_string::{ExcFormatter, StackFrame, charset::Charset};
//!
//! let frames = [
//!     StackFrame::new("/srv/app/main.rs", 7, "main"),
//!     StackFrame::new("/srv/app/worker.rs", 42, "run"),
//! ];
//! let formatter = ExcFormatter::new(Charset::ASCII);
//! assert_eq!(
//!     formatter.trace_string_of(&frames),
//!     "run() (worker.rs:42) <- main() (main.rs:7)"
//! );
//! ```
//!
//! # Filtering
//!
//! Captured stacks skip the frames of the stack walker, of this crate and of
//! the standard library, so the first entry is the code that asked for the
//! stack. See [`StackFilter`].

use std::{borrow::Cow, fmt, path::Path, sync::OnceLock};

use backtrace::BytesOrWideString;

use crate::{sanitize::Sanitizer, symbol::last_path_segment};

/// The crate name this crate's own frames are classified under.
pub(crate) const CRATE_NAME: &str = "exc-string";
const CRATE_IDENT: &str = "exc_string";

/// A single frame of a call stack.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StackFrame {
    /// Source file of the frame, as recorded in debug information.
    pub file: String,
    /// Line number in the source file, if known.
    pub line: Option<u32>,
    /// Function or method name.
    pub function: String,
}

impl StackFrame {
    /// Creates a frame.
    #[must_use]
    pub fn new(
        file: impl Into<String>,
        line: impl Into<Option<u32>>,
        function: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            line: line.into(),
            function: function.into(),
        }
    }

    /// The file name without its directory components.
    #[must_use]
    pub fn basename(&self) -> &str {
        self.file
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(self.file.as_str())
    }
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}() ({}:", self.function, self.basename())?;
        match self.line {
            Some(line) => write!(f, "{line})"),
            None => f.write_str("?)"),
        }
    }
}

/// A call stack, outermost frame first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Stack {
    frames: Vec<StackFrame>,
}

impl Stack {
    /// Creates a stack from frames ordered outermost first.
    #[must_use]
    pub fn new(frames: Vec<StackFrame>) -> Self {
        Self { frames }
    }

    /// The frames, outermost first.
    #[must_use]
    pub fn frames(&self) -> &[StackFrame] {
        &self.frames
    }

    /// The innermost frame, if any.
    #[must_use]
    pub fn innermost(&self) -> Option<&StackFrame> {
        self.frames.last()
    }

    /// Number of frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether the stack has no frames.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl FromIterator<StackFrame> for Stack {
    fn from_iter<I: IntoIterator<Item = StackFrame>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Configuration for filtering frames from certain crates out of captured
/// stacks.
///
/// Crates are recognized from the source path recorded in debug information:
/// the standard library (`std`, `core`, `alloc`, `test`, ...), crates from the
/// Cargo registry, and this crate itself.
///
/// ```rust
/// use exc_string::StackFilter;
///
/// let filter = StackFilter {
///     // Hide tokio's scheduler between application frames
///     skipped_middle_crates: &["std", "core", "alloc", "exc-string", "tokio"],
///     max_frames: 32,
///     ..StackFilter::DEFAULT
/// };
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StackFilter {
    /// Crates whose frames are hidden when they appear before the first
    /// kept frame.
    pub skipped_initial_crates: &'static [&'static str],
    /// Crates whose frames are hidden anywhere else.
    pub skipped_middle_crates: &'static [&'static str],
    /// Crates whose frames are hidden when they appear after the last kept
    /// frame.
    pub skipped_final_crates: &'static [&'static str],
    /// Maximum number of frames to keep, counted from the innermost.
    pub max_frames: usize,
}

impl StackFilter {
    /// Default filter settings.
    pub const DEFAULT: Self = Self {
        skipped_initial_crates: &["backtrace", CRATE_NAME, "core", "std", "alloc"],
        skipped_middle_crates: &["std", "core", "alloc", CRATE_NAME],
        skipped_final_crates: &["std", "core", "alloc", "test"],
        max_frames: 512,
    };

    /// Keeps every frame that has symbol and file information.
    pub const UNFILTERED: Self = Self {
        skipped_initial_crates: &[],
        skipped_middle_crates: &[],
        skipped_final_crates: &[],
        max_frames: usize::MAX,
    };
}

impl Default for StackFilter {
    fn default() -> Self {
        Self::DEFAULT
    }
}

struct CapturedFrame {
    frame: StackFrame,
    crate_name: Option<Cow<'static, str>>,
    symbol: String,
}

impl Stack {
    /// Captures the call stack of the current thread, applying `filter`.
    ///
    /// Frames without symbol names or source files are not considered.
    #[must_use]
    #[inline(never)]
    pub fn capture(filter: &StackFilter) -> Self {
        let mut initial_filtering = !filter.skipped_initial_crates.is_empty();
        let mut innermost_first: Vec<CapturedFrame> = Vec::new();
        let mut total_omitted_frames = 0usize;

        backtrace::trace(|frame| {
            backtrace::resolve_frame(frame, |symbol| {
                let (Some(sym), Some(filename_raw)) = (symbol.name(), symbol.filename_raw())
                else {
                    return;
                };

                let symbol_name = format!("{sym:#}");
                let frame_path = FramePath::new(filename_raw, &symbol_name);

                if initial_filtering {
                    if let Some(cur_crate_name) = &frame_path.crate_name
                        && filter.skipped_initial_crates.contains(&&**cur_crate_name)
                    {
                        total_omitted_frames += 1;
                        return;
                    } else {
                        initial_filtering = false;
                    }
                }

                if let Some(cur_crate_name) = &frame_path.crate_name
                    && filter.skipped_middle_crates.contains(&&**cur_crate_name)
                {
                    total_omitted_frames += 1;
                    return;
                }

                if innermost_first.len() >= filter.max_frames {
                    total_omitted_frames += 1;
                    return;
                }

                innermost_first.push(CapturedFrame {
                    frame: StackFrame {
                        file: frame_path.raw_path,
                        line: symbol.lineno(),
                        function: last_path_segment(&symbol_name).to_owned(),
                    },
                    crate_name: frame_path.crate_name,
                    symbol: symbol_name,
                });
            });

            true
        });

        while let Some(last) = innermost_first.last() {
            let skip = last
                .crate_name
                .as_deref()
                .is_some_and(|crate_name| filter.skipped_final_crates.contains(&crate_name))
                || last.symbol == "__libc_start_call_main"
                || last.symbol == "__libc_start_main_impl"
                || (last.symbol == "_start" && last.frame.file.contains("zig/libc/glibc"));
            if skip {
                total_omitted_frames += 1;
                innermost_first.pop();
            } else {
                break;
            }
        }

        tracing::trace!(
            kept = innermost_first.len(),
            omitted = total_omitted_frames,
            "captured call stack"
        );

        innermost_first
            .into_iter()
            .rev()
            .map(|captured| captured.frame)
            .collect()
    }
}

/// Renders frames, given outermost first, as an innermost-first chain.
pub(crate) fn format_chain(sanitizer: &Sanitizer, frames: &[StackFrame]) -> String {
    let mut chain = String::new();
    for (i, frame) in frames.iter().rev().enumerate() {
        if i > 0 {
            chain.push_str(" <- ");
        }
        chain.push_str(&sanitizer.sanitize_str(&frame.to_string()));
    }
    chain
}

struct FramePath {
    raw_path: String,
    crate_name: Option<Cow<'static, str>>,
}

impl FramePath {
    fn new(path: BytesOrWideString<'_>, symbol_name: &str) -> Self {
        static REGEXES: OnceLock<[regex::Regex; 2]> = OnceLock::new();
        let [std_regex, registry_regex] = REGEXES.get_or_init(|| {
            [
                // Matches Rust standard library paths:
                // - /lib/rustlib/src/rust/library/{std|core|alloc|...}/src/...
                // - /rustc/{40-char-hash}/library/{std|core|alloc|...}/src/...
                regex::Regex::new(
                    r"(?:/lib/rustlib/src/rust|^/rustc/[0-9a-f]{40})/library/(std|core|alloc|test|panic_unwind|proc_macro)/src/.*$",
                )
                .expect("built-in regex pattern for std library paths should be valid"),
                // Matches Cargo registry paths:
                // - /.cargo/registry/src/{index}-{16-char-hash}/{crate}-{version}/src/...
                regex::Regex::new(
                    r"/\.cargo/registry/src/[^/]+-[0-9a-f]{16}/([^./]+)-[0-9]+\.[^/]*/src/.*$",
                )
                .expect("built-in regex pattern for cargo registry paths should be valid"),
            ]
        });

        let raw_path = path.to_str_lossy().into_owned();
        // Windows paths are matched with forward slashes
        let path_str = raw_path.replace('\\', "/");

        let crate_name = if let Some(captures) = std_regex.captures(&path_str) {
            captures
                .get(1)
                .map(|m| Cow::Owned(m.as_str().to_owned()))
        } else if let Some(captures) = registry_regex.captures(&path_str) {
            captures
                .get(1)
                .map(|m| Cow::Owned(m.as_str().to_owned()))
        } else if is_own_source(&raw_path) || symbol_in_crate(symbol_name, CRATE_IDENT) {
            Some(Cow::Borrowed(CRATE_NAME))
        } else if symbol_in_crate(symbol_name, "backtrace") {
            // Vendored or path dependencies live outside the registry
            Some(Cow::Borrowed("backtrace"))
        } else {
            None
        };

        Self {
            raw_path,
            crate_name,
        }
    }
}

fn is_own_source(path: &str) -> bool {
    static OWN_SOURCE_DIR: OnceLock<std::path::PathBuf> = OnceLock::new();
    let own = OWN_SOURCE_DIR.get_or_init(|| Path::new(env!("CARGO_MANIFEST_DIR")).join("src"));
    Path::new(path).starts_with(own)
}

fn symbol_in_crate(symbol_name: &str, crate_ident: &str) -> bool {
    symbol_name
        .trim_start_matches('<')
        .strip_prefix(crate_ident)
        .is_some_and(|rest| rest.starts_with("::"))
}
