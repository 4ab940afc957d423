//! Error types for the clilog crate.

use std::{fmt, io};

/// Errors raised while writing records.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ClilogError {
    /// The underlying writer rejected the record.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// Formatting a record into its buffer failed.
    #[error("formatting record failed")]
    Fmt(#[from] fmt::Error),

    /// A global `tracing` subscriber could not be installed.
    #[error("installing subscriber failed: {0}")]
    Init(String),
}
