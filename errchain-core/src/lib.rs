//! Error chains with call-site stacktraces, and multi-errors that flatten.
//!
//! A [`ChainError`] is either a base error (a message) or a wrap of any other
//! error. Every node records where it was created. Shallow unwrapping follows
//! [`std::error::Error::source`]; [`cause`] digs to the deepest foreign error.
//!
//! An [`Aggregator`] collects independent errors and yields a single error
//! value: nothing, the one error it holds, or a [`MultiError`]. Matching with
//! [`is`], [`is_same`] and [`as_type`] sees through wraps and into aggregates.

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod chain;
mod macros;
pub mod matching;
pub mod multi;
pub mod shared;
pub mod stacktrace;

pub use chain::{cause, unwrap, wrap, Cause, ChainError, ResultExt};
pub use matching::{as_type, chain_of, is, is_same, matches, Chain};
pub use multi::{as_multi, Aggregator, MultiError, Pretty};
pub use shared::{share, share_boxed, SharedError};
pub use stacktrace::{Frame, Stacktrace, MAX_FRAMES};
