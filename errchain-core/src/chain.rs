//! Chain nodes: base errors and wraps.
//!
//! Every node carries its own message and the stacktrace of the call that
//! created it. A wrap additionally owns a shared handle to the error it wraps,
//! which may be another node, an aggregate, or any foreign error.
//!
//! Two unwrap protocols are exposed. The shallow one is
//! [`std::error::Error::source`], which every Rust error may implement. The
//! deep one is the [`Cause`] capability, walked by [`cause`].

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use crate::shared::{share, SharedError};
use crate::stacktrace::Stacktrace;

/// An error message with the stacktrace of its creation, optionally wrapping
/// an inner error.
///
/// Cloning is cheap and yields a handle to the same node; two handles compare
/// equal only when they point to the same node.
///
/// `{}` renders the short form, `outer: inner: base`. `{:?}` renders the long
/// form: one block per node, outermost first, each block being the node's
/// message followed by its stacktrace, blocks separated by a blank line.
#[derive(Clone)]
pub struct ChainError {
    node: Arc<Node>,
}

struct Node {
    message: String,
    stacktrace: Stacktrace,
    wrapped: Option<SharedError>,
}

impl ChainError {
    /// Creates a base error. The stacktrace starts at the caller.
    #[inline(never)]
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self::with_inner(message.into(), None)
    }

    /// Wraps `err`, recording the stacktrace of this call.
    ///
    /// Wrapping a [`SharedError`] stores that handle as is.
    #[inline(never)]
    #[must_use]
    pub fn wrap<E>(err: E, message: impl Into<String>) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::with_inner(message.into(), Some(share(err)))
    }

    fn with_inner(message: String, wrapped: Option<SharedError>) -> Self {
        Self {
            node: Arc::new(Node {
                message,
                stacktrace: Stacktrace::capture(),
                wrapped,
            }),
        }
    }

    /// This node's own message, without any inner error.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.node.message
    }

    /// Stacktrace captured when this node was created.
    #[must_use]
    pub fn stacktrace(&self) -> &Stacktrace {
        &self.node.stacktrace
    }

    /// The wrapped error, `None` for a base node.
    #[must_use]
    pub fn inner(&self) -> Option<&SharedError> {
        self.node.wrapped.as_ref()
    }

    /// Returns `true` for a base node.
    #[must_use]
    pub fn is_base(&self) -> bool {
        self.node.wrapped.is_none()
    }
}

impl fmt::Display for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.node.message)?;
        if let Some(inner) = &self.node.wrapped {
            write!(f, ": {inner}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut node = self;
        loop {
            writeln!(f, "{}", node.message())?;
            write!(f, "{}", node.stacktrace())?;
            let Some(inner) = node.inner() else {
                return Ok(());
            };
            f.write_str("\n")?;
            match inner.downcast_ref::<ChainError>() {
                Some(next) => node = next,
                None => return write!(f, "{inner}"),
            }
        }
    }
}

impl PartialEq for ChainError {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }
}

impl Eq for ChainError {}

impl StdError for ChainError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.node
            .wrapped
            .as_deref()
            .map(|inner| inner as &(dyn StdError + 'static))
    }
}

mod sealed {
    pub trait Sealed {}

    impl Sealed for super::ChainError {}
}

/// Capability of reporting a recorded cause.
///
/// Returning `None` means the error participates but records no deeper cause;
/// a base [`ChainError`] does this.
///
/// Only chain nodes participate. The trait is sealed because [`cause`] finds
/// participants by downcasting, so an outside implementation would never be
/// consulted. Foreign errors, including ones whose `source()` is a chain
/// node, are the bottom of a deep-cause walk.
pub trait Cause: sealed::Sealed {
    /// The immediate recorded cause.
    fn cause(&self) -> Option<&(dyn StdError + 'static)>;
}

impl Cause for ChainError {
    fn cause(&self) -> Option<&(dyn StdError + 'static)> {
        self.source()
    }
}

/// Wraps `err` with `message`; `None` in, `None` out.
///
/// Lets callers wrap the error slot of a fallible operation unconditionally.
#[inline(never)]
pub fn wrap<E>(err: Option<E>, message: impl Into<String>) -> Option<ChainError>
where
    E: StdError + Send + Sync + 'static,
{
    match err {
        Some(err) => Some(ChainError::wrap(err, message)),
        None => None,
    }
}

/// Shallow unwrap: the immediate inner error, if `err` exposes one.
#[must_use]
pub fn unwrap<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a (dyn StdError + 'static)> {
    err.source()
}

/// Deep cause.
///
/// Follows the [`Cause`] capability until it reaches an error that does not
/// participate, which is returned, or a participant that records no cause, in
/// which case the result is `None`. A chain ending in a base node therefore
/// has no cause, while a chain ending in a foreign error yields that error.
#[must_use]
pub fn cause<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a (dyn StdError + 'static)> {
    let mut current = err;
    loop {
        let Some(participant) = as_cause(current) else {
            return Some(current);
        };
        current = participant.cause()?;
    }
}

fn as_cause<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a dyn Cause> {
    err.downcast_ref::<ChainError>().map(|node| node as &dyn Cause)
}

/// Wrapping for `Result`s: an `Ok` passes through untouched.
pub trait ResultExt<T> {
    /// Wraps the error with `message`.
    ///
    /// # Errors
    /// Returns the wrapped error when `self` is `Err`.
    fn wrap(self, message: impl Into<String>) -> Result<T, ChainError>;

    /// Wraps the error with a lazily built message.
    ///
    /// # Errors
    /// Returns the wrapped error when `self` is `Err`.
    fn wrap_with<M, F>(self, message: F) -> Result<T, ChainError>
    where
        M: Into<String>,
        F: FnOnce() -> M;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: StdError + Send + Sync + 'static,
{
    #[inline(never)]
    fn wrap(self, message: impl Into<String>) -> Result<T, ChainError> {
        match self {
            Ok(value) => Ok(value),
            Err(err) => Err(ChainError::wrap(err, message)),
        }
    }

    #[inline(never)]
    fn wrap_with<M, F>(self, message: F) -> Result<T, ChainError>
    where
        M: Into<String>,
        F: FnOnce() -> M,
    {
        match self {
            Ok(value) => Ok(value),
            Err(err) => Err(ChainError::wrap(err, message())),
        }
    }
}
