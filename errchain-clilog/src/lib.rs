//! Log records for command-line tools.
//!
//! Records are written as their values only, joined by `": "`, one line per
//! record. Errors that turn out to be aggregates are collected and written
//! last, pretty-printed so nested groups stay visible:
//!
//! ```text
//! sync failed: upload: 2 errors: a; (retry: 2 errors: b; c)
//! ```
//!
//! [`Encoder`] does the encoding, [`Logger`] writes whole records to an
//! `io::Write`, and [`CliFormat`] plugs the same format into
//! `tracing-subscriber`.

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod encoder;
pub mod error;
pub mod format;
pub mod logger;

pub use encoder::{Encoder, Value};
pub use error::ClilogError;
pub use format::{try_init, CliFormat};
pub use logger::{marshal_keyvals, Logger};
