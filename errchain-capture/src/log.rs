//! Close capture for call sites that have no error to return.

use std::error::Error as StdError;

use errchain_core::ChainError;

/// Message of the event emitted for a failed close.
pub const CLOSE_ERROR_EVENT: &str = "detected close error";

/// Runs `close` and, if it fails, emits one `warn` event carrying the close
/// error wrapped with `message` in its `error` field.
///
/// The field is recorded as `&dyn Error`, so formatters can look through it
/// for aggregates. A successful close logs nothing.
pub fn log_capture<F, E>(close: F, message: impl Into<String>)
where
    F: FnOnce() -> Result<(), E>,
    E: StdError + Send + Sync + 'static,
{
    if let Err(err) = close() {
        let wrapped = ChainError::wrap(err, message);
        tracing::warn!(error = &wrapped as &(dyn StdError + 'static), "{CLOSE_ERROR_EVENT}");
    }
}
