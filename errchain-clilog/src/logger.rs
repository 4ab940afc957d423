//! Whole-record logging to an `io::Write` sink.

use std::io;
use std::sync::Mutex;

use crate::encoder::{Encoder, Value};
use crate::error::ClilogError;

/// Logs records to a writer, one `write_all` per record.
///
/// Records are encoded before the writer lock is taken, so concurrent callers
/// only contend for the write itself.
#[derive(Debug)]
pub struct Logger<W> {
    writer: Mutex<W>,
}

impl<W: io::Write> Logger<W> {
    /// Creates a logger writing to `writer`.
    pub fn new(writer: W) -> Self {
        Self { writer: Mutex::new(writer) }
    }

    /// Encodes `keyvals` as one newline-terminated record and writes it.
    ///
    /// # Errors
    /// Returns [`ClilogError::Io`] if the writer fails.
    ///
    /// # Panics
    /// Panics if the internal `Mutex` is poisoned.
    pub fn log(&self, keyvals: &[(&str, Value<'_>)]) -> Result<(), ClilogError> {
        let mut encoder = Encoder::new(String::new());
        encoder.encode_keyvals(keyvals)?;
        encoder.end_record()?;
        let record = encoder.into_inner();

        #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
        self.writer
            .lock()
            .expect("logger writer lock poisoned")
            .write_all(record.as_bytes())?;
        Ok(())
    }

    /// Unwraps the logger, returning the writer.
    ///
    /// # Panics
    /// Panics if the internal `Mutex` is poisoned.
    #[expect(clippy::expect_used, reason = "lock poisoning is unrecoverable")]
    pub fn into_inner(self) -> W {
        self.writer.into_inner().expect("logger writer lock poisoned")
    }
}

/// Encodes `keyvals` without a trailing newline.
///
/// # Errors
/// Returns [`ClilogError::Fmt`] if a value fails to format.
pub fn marshal_keyvals(keyvals: &[(&str, Value<'_>)]) -> Result<String, ClilogError> {
    let mut encoder = Encoder::new(String::new());
    encoder.encode_keyvals(keyvals)?;
    Ok(encoder.into_inner())
}
