//! Call-site stacktraces attached to chain nodes.
//!
//! Capture only records raw instruction pointers. Symbols are resolved the
//! first time the trace is read, and the result is cached, so creating an
//! error stays cheap until somebody actually renders it.

use std::fmt;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// Maximum number of frames kept per stacktrace.
pub const MAX_FRAMES: usize = 32;

/// Path prefix of every symbol defined by this crate.
const CRATE_PATH: &str = concat!(env!("CARGO_CRATE_NAME"), "::");

/// One resolved program location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Frame {
    /// Demangled function name, without the symbol hash.
    pub function: String,
    /// Source file, when debug info is available.
    pub file: Option<String>,
    /// Line in `file`, when debug info is available.
    pub line: Option<u32>,
}

impl Frame {
    /// Creates a frame from its parts.
    pub fn new(function: impl Into<String>, file: Option<String>, line: Option<u32>) -> Self {
        Self { function: function.into(), file, line }
    }

    #[cfg(feature = "stacktrace")]
    fn from_symbol(symbol: &backtrace::BacktraceSymbol) -> Self {
        Self {
            function: symbol
                .name()
                .map_or_else(|| "<unknown>".to_owned(), |name| format!("{name:#}")),
            file: symbol.filename().map(|path| path.display().to_string()),
            line: symbol.lineno(),
        }
    }

    /// Frames of the unwinder itself and of this crate's constructors.
    ///
    /// Test modules are deliberately not internal so the crate's own tests see
    /// themselves as callers.
    fn is_internal(&self) -> bool {
        let name = self.function.as_str();
        name.starts_with("backtrace::")
            || (name.contains(CRATE_PATH) && !name.contains("::tests::"))
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "> {}\t", self.function)?;
        match (&self.file, self.line) {
            (Some(file), Some(line)) => write!(f, "{file}:{line}"),
            (Some(file), None) => f.write_str(file),
            (None, _) => f.write_str("<unknown>"),
        }
    }
}

/// Snapshot of the call stack taken when an error was created.
///
/// The first frame is the direct caller of the constructing operation; frames
/// of the capture machinery are never included. Rendering produces exactly one
/// line per frame, most recent call first.
pub struct Stacktrace {
    #[cfg(feature = "stacktrace")]
    raw: backtrace::Backtrace,
    frames: OnceLock<Vec<Frame>>,
}

impl Stacktrace {
    /// Captures the stack of the calling function.
    #[inline(never)]
    #[must_use]
    pub fn capture() -> Self {
        Self {
            #[cfg(feature = "stacktrace")]
            raw: backtrace::Backtrace::new_unresolved(),
            frames: OnceLock::new(),
        }
    }

    /// Returns the resolved frames, most recent call first.
    pub fn frames(&self) -> &[Frame] {
        self.frames.get_or_init(|| self.resolve())
    }

    /// Number of frames, equal to the number of rendered lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames().len()
    }

    /// Returns `true` if no frame could be captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames().is_empty()
    }

    #[cfg(feature = "stacktrace")]
    fn resolve(&self) -> Vec<Frame> {
        let mut raw = self.raw.clone();
        raw.resolve();
        raw.frames()
            .iter()
            .flat_map(|frame| {
                let symbols = frame.symbols();
                if symbols.is_empty() {
                    vec![Frame::new("<unknown>", None, None)]
                } else {
                    symbols.iter().map(Frame::from_symbol).collect()
                }
            })
            .skip_while(Frame::is_internal)
            .take(MAX_FRAMES)
            .collect()
    }

    #[cfg(not(feature = "stacktrace"))]
    #[allow(clippy::unused_self)]
    fn resolve(&self) -> Vec<Frame> {
        Vec::new()
    }
}

impl fmt::Display for Stacktrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for frame in self.frames() {
            writeln!(f, "{frame}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Stacktrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.frames()).finish()
    }
}
