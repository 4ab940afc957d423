//! `tracing` integration: events rendered as clilog records.

use std::error::Error as StdError;
use std::fmt;
use std::io;

use errchain_core::{as_multi, MultiError};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

use crate::encoder::{render, Encoder, Value};
use crate::error::ClilogError;

const MESSAGE_FIELD: &str = "message";

/// Event format writing the message, then every field value, separated by
/// `": "`. Error fields holding aggregates are pretty-printed at the end.
///
/// Spans, levels and timestamps are not written.
#[derive(Debug, Default, Clone, Copy)]
pub struct CliFormat;

impl<S, N> FormatEvent<S, N> for CliFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut fields = EventFields::default();
        event.record(&mut fields);
        fields.encode(&mut writer)
    }
}

/// A field value taken out of an event, owned so it can be reordered.
enum Captured {
    Text(String),
    Multi(MultiError),
}

/// Event fields in recording order, message kept apart so it leads the
/// record wherever the macro placed it.
#[derive(Default)]
struct EventFields {
    message: Option<String>,
    values: Vec<(&'static str, Captured)>,
}

impl EventFields {
    fn push(&mut self, field: &Field, text: String) {
        if field.name() == MESSAGE_FIELD {
            self.message = Some(text);
        } else {
            self.values.push((field.name(), Captured::Text(text)));
        }
    }

    fn encode<W: fmt::Write>(&self, writer: W) -> fmt::Result {
        let mut encoder = Encoder::new(writer);
        if let Some(message) = &self.message {
            encoder.encode_keyval(MESSAGE_FIELD, &Value::Str(message))?;
        }
        for (name, value) in &self.values {
            match value {
                Captured::Text(text) => encoder.encode_keyval(name, &Value::Str(text))?,
                Captured::Multi(multi) => encoder.encode_keyval(name, &Value::Error(multi))?,
            }
        }
        encoder.end_record()
    }
}

impl Visit for EventFields {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.push(field, value.to_owned());
    }

    fn record_error(&mut self, field: &Field, value: &(dyn StdError + 'static)) {
        match as_multi(value) {
            Some(multi) => self.values.push((field.name(), Captured::Multi(multi.clone()))),
            None => self.push(field, render(&Value::Error(value))),
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.push(field, render(&Value::Debug(value)));
    }
}

/// Installs a global subscriber writing clilog records to stderr, filtered by
/// `RUST_LOG`.
///
/// # Errors
/// Returns [`ClilogError::Init`] if a global subscriber is already set.
pub fn try_init() -> Result<(), ClilogError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .event_format(CliFormat)
        .try_init()
        .map_err(|e| ClilogError::Init(e.to_string()))
}
