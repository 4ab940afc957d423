//! Record encoding.
//!
//! A record is a sequence of key/value pairs. Only values are written,
//! separated by `": "`, with no quoting or escaping beyond distinguishing the
//! string `"null"` from an absent value. Errors that resolve to a
//! [`MultiError`] are held back until the end of the record, merged, and
//! pretty-printed so nested aggregates stay readable.

use std::any::Any;
use std::error::Error as StdError;
use std::fmt::{self, Write as _};
use std::panic::{self, AssertUnwindSafe};

use errchain_core::{as_multi, MultiError};

const SEP: &str = ": ";
const NULL: &str = "null";

/// A value carried by a record.
#[derive(Clone, Copy)]
#[non_exhaustive]
pub enum Value<'a> {
    /// Absent value, written as `null`.
    Null,
    /// Text written as is; the text `null` is quoted.
    Str(&'a str),
    /// Raw bytes, written lossily as UTF-8.
    Bytes(&'a [u8]),
    /// Anything with a `Display` rendering.
    Display(&'a dyn fmt::Display),
    /// Anything with a `Debug` rendering.
    Debug(&'a dyn fmt::Debug),
    /// An error; aggregates are deferred to the end of the record.
    Error(&'a (dyn StdError + 'static)),
}

impl fmt::Debug for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Str(s) => f.debug_tuple("Str").field(s).finish(),
            Value::Bytes(b) => f.debug_tuple("Bytes").field(b).finish(),
            Value::Display(_) => f.write_str("Display(..)"),
            Value::Debug(_) => f.write_str("Debug(..)"),
            Value::Error(_) => f.write_str("Error(..)"),
        }
    }
}

impl<'a> From<&'a str> for Value<'a> {
    fn from(value: &'a str) -> Self {
        Value::Str(value)
    }
}

impl<'a> From<&'a String> for Value<'a> {
    fn from(value: &'a String) -> Self {
        Value::Str(value)
    }
}

impl<'a> From<&'a [u8]> for Value<'a> {
    fn from(value: &'a [u8]) -> Self {
        Value::Bytes(value)
    }
}

impl<'a> From<&'a (dyn StdError + 'static)> for Value<'a> {
    fn from(value: &'a (dyn StdError + 'static)) -> Self {
        Value::Error(value)
    }
}

impl<'a, T> From<Option<T>> for Value<'a>
where
    T: Into<Value<'a>>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// Writes records to a [`fmt::Write`] sink.
///
/// Each [`encode_keyval`](Self::encode_keyval) writes at most one chunk, and
/// [`end_record`](Self::end_record) writes the deferred aggregates followed
/// by a newline.
#[derive(Debug)]
pub struct Encoder<W> {
    writer: W,
    scratch: String,
    need_sep: bool,
    deferred: Vec<MultiError>,
}

impl<W: fmt::Write> Encoder<W> {
    /// Creates an encoder writing to `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            scratch: String::new(),
            need_sep: false,
            deferred: Vec::new(),
        }
    }

    /// Writes one value. The key is accepted for call-site symmetry and not
    /// written.
    ///
    /// # Errors
    /// Returns an error if the writer fails; nothing is written in that case.
    pub fn encode_keyval(&mut self, _key: &str, value: &Value<'_>) -> fmt::Result {
        if let Value::Error(err) = value {
            if let Some(multi) = as_multi(*err) {
                self.deferred.push(multi.clone());
                return Ok(());
            }
        }

        self.scratch.clear();
        if self.need_sep {
            self.scratch.push_str(SEP);
        }
        write_value(&mut self.scratch, value);
        self.writer.write_str(&self.scratch)?;
        self.need_sep = true;
        Ok(())
    }

    /// Writes every pair in order.
    ///
    /// # Errors
    /// Stops at the first writer failure; earlier pairs stay written.
    pub fn encode_keyvals(&mut self, keyvals: &[(&str, Value<'_>)]) -> fmt::Result {
        for (key, value) in keyvals {
            self.encode_keyval(key, value)?;
        }
        Ok(())
    }

    /// Ends the record: flushes deferred aggregates as one pretty-printed
    /// aggregate, then writes a newline.
    ///
    /// A panic while rendering an aggregate entry is written as
    /// `PANIC:{payload}` in place of the whole aggregate.
    ///
    /// # Errors
    /// Returns an error if the writer fails.
    pub fn end_record(&mut self) -> fmt::Result {
        if let Some(merged) = MultiError::merge(&self.deferred) {
            self.scratch.clear();
            if self.need_sep {
                self.scratch.push_str(SEP);
            }
            write_pretty(&mut self.scratch, &merged)?;
            self.writer.write_str(&self.scratch)?;
        }
        self.deferred.clear();

        self.writer.write_char('\n')?;
        self.need_sep = false;
        Ok(())
    }

    /// Discards the state of a partially written record.
    pub fn reset(&mut self) {
        self.need_sep = false;
        self.deferred.clear();
    }

    /// Returns a reference to the underlying writer.
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Returns a mutable reference to the underlying writer.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    /// Unwraps the encoder, discarding any deferred aggregates.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn write_value(out: &mut String, value: &Value<'_>) {
    match value {
        Value::Null => out.push_str(NULL),
        Value::Str(s) => write_str_value(out, s),
        Value::Bytes(b) => out.push_str(&String::from_utf8_lossy(b)),
        Value::Display(v) => write_rendered(out, || v.to_string()),
        Value::Debug(v) => write_rendered(out, || format!("{v:?}")),
        Value::Error(e) => write_rendered(out, || e.to_string()),
    }
}

fn write_str_value(out: &mut String, s: &str) {
    if s == NULL {
        out.push_str("\"null\"");
    } else {
        out.push_str(s);
    }
}

/// Renders through foreign code, writing `PANIC:{payload}` if it panics.
fn write_rendered<F>(out: &mut String, render: F)
where
    F: FnOnce() -> String,
{
    match panic::catch_unwind(AssertUnwindSafe(render)) {
        Ok(rendered) => write_str_value(out, &rendered),
        Err(payload) => {
            let _ = write!(out, "PANIC:{}", panic_message(&*payload));
        }
    }
}

/// Pretty-prints `multi`, whose entries are foreign code.
fn write_pretty(out: &mut String, multi: &MultiError) -> fmt::Result {
    let rendered = panic::catch_unwind(AssertUnwindSafe(|| {
        let mut buf = String::new();
        multi.pretty_print(&mut buf).map(|()| buf)
    }));
    match rendered {
        Ok(rendered) => out.push_str(&rendered?),
        Err(payload) => write!(out, "PANIC:{}", panic_message(&*payload))?,
    }
    Ok(())
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}

/// Renders a single value the way the encoder would, outside any record.
pub(crate) fn render(value: &Value<'_>) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}
