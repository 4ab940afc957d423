//! Close capture into an error slot.

use std::error::Error as StdError;
use std::io;
use std::sync::Arc;

use errchain_core::{Aggregator, ChainError, SharedError};

/// Message attached to a failure to drain a reader before closing it.
const EXHAUST_MESSAGE: &str = "failed to exhaust reader, performance may be impeded";

/// Runs `close` and folds its failure into `slot`.
///
/// On success `slot` is left as it was. On failure the close error is wrapped
/// with `message`; if `slot` already held an error both are kept, the
/// original first.
///
/// ```
/// use errchain_core::SharedError;
///
/// let mut slot: Option<SharedError> = None;
/// errchain_capture::capture(&mut slot, || Err(std::io::Error::other("busy")), "close");
/// assert_eq!(slot.map(|e| e.to_string()).as_deref(), Some("close: busy"));
/// ```
pub fn capture<F, E>(slot: &mut Option<SharedError>, close: F, message: impl Into<String>)
where
    F: FnOnce() -> Result<(), E>,
    E: StdError + Send + Sync + 'static,
{
    if let Err(err) = close() {
        *slot = Some(fold(slot.take(), err, message.into()));
    }
}

/// [`capture`] for code that returns a `Result`.
///
/// # Errors
/// Returns the original error, the wrapped close error, or both as one
/// aggregate.
pub fn capture_result<T, F, E>(
    result: Result<T, SharedError>,
    close: F,
    message: impl Into<String>,
) -> Result<T, SharedError>
where
    F: FnOnce() -> Result<(), E>,
    E: StdError + Send + Sync + 'static,
{
    match (result, close()) {
        (result, Ok(())) => result,
        (Ok(_), Err(err)) => Err(fold(None, err, message.into())),
        (Err(original), Err(err)) => Err(fold(Some(original), err, message.into())),
    }
}

/// Reads `reader` to its end, then closes it through `close`, folding both
/// outcomes into `slot`.
///
/// Draining lets connection-backed readers be reused. A drain failure is
/// placed ahead of whatever `slot` holds after the close.
pub fn exhaust_close<R, F, E>(
    slot: &mut Option<SharedError>,
    mut reader: R,
    close: F,
    message: impl Into<String>,
) where
    R: io::Read,
    F: FnOnce(R) -> Result<(), E>,
    E: StdError + Send + Sync + 'static,
{
    let drained = io::copy(&mut reader, &mut io::sink());
    capture(slot, || close(reader), message);

    match drained {
        Ok(bytes) => tracing::trace!(bytes, "drained reader before close"),
        Err(err) => {
            let mut agg = Aggregator::new();
            agg.add(ChainError::wrap(err, EXHAUST_MESSAGE));
            agg.add_opt(slot.take());
            *slot = agg.err();
        }
    }
}

fn fold<E>(existing: Option<SharedError>, err: E, message: String) -> SharedError
where
    E: StdError + Send + Sync + 'static,
{
    let wrapped: SharedError = Arc::new(ChainError::wrap(err, message));
    let Some(existing) = existing else {
        return wrapped;
    };
    tracing::debug!(original = %existing, close = %wrapped, "merging close error into existing error");
    let mut agg = Aggregator::new();
    agg.add(existing).add(Arc::clone(&wrapped));
    agg.err().unwrap_or(wrapped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failing(message: &'static str) -> impl FnOnce() -> Result<(), io::Error> {
        move || Err(io::Error::other(message))
    }

    fn rendered(slot: Option<&SharedError>) -> Option<String> {
        slot.map(ToString::to_string)
    }

    #[test]
    fn capture_table() {
        let cases: [(Option<&str>, Option<&'static str>, Option<&str>); 4] = [
            (None, None, None),
            (Some("test"), None, Some("test")),
            (None, Some("test"), Some("close: test")),
            (Some("test"), Some("test"), Some("2 errors: test; close: test")),
        ];
        for (original, close_err, expected) in cases {
            let mut slot: Option<SharedError> =
                original.map(|m| Arc::new(ChainError::new(m)) as SharedError);
            capture(
                &mut slot,
                || match close_err {
                    Some(m) => Err(io::Error::other(m)),
                    None => Ok(()),
                },
                "close",
            );
            assert_eq!(
                rendered(slot.as_ref()).as_deref(),
                expected,
                "original {original:?}, close error {close_err:?}"
            );
        }
    }

    #[test]
    fn capture_keeps_slot_handle_on_success() {
        let original: SharedError = Arc::new(ChainError::new("test"));
        let mut slot = Some(Arc::clone(&original));
        capture(&mut slot, || Ok::<(), io::Error>(()), "close");
        let Some(after) = slot else {
            panic!("slot must still hold the original error");
        };
        assert!(Arc::ptr_eq(&original, &after));
    }

    #[test]
    fn capture_appends_to_existing_aggregate() {
        let mut agg = Aggregator::new();
        agg.add(ChainError::new("a")).add(ChainError::new("b"));
        let mut slot = agg.err();
        capture(&mut slot, failing("c"), "close");
        assert_eq!(rendered(slot.as_ref()).as_deref(), Some("3 errors: a; b; close: c"));
    }

    #[test]
    fn capture_result_table() {
        let ok: Result<u8, SharedError> = Ok(1);
        assert!(matches!(capture_result(ok, || Ok::<(), io::Error>(()), "close"), Ok(1)));

        let ok: Result<u8, SharedError> = Ok(1);
        match capture_result(ok, failing("test"), "close") {
            Ok(v) => panic!("close failure must surface, got {v}"),
            Err(e) => assert_eq!(e.to_string(), "close: test"),
        }

        let failed: Result<u8, SharedError> = Err(Arc::new(ChainError::new("test")));
        match capture_result(failed, failing("test"), "close") {
            Ok(v) => panic!("expected an error, got {v}"),
            Err(e) => assert_eq!(e.to_string(), "2 errors: test; close: test"),
        }
    }

    #[test]
    fn exhaust_close_reads_everything_before_close() {
        let mut slot = None;
        exhaust_close(
            &mut slot,
            io::Cursor::new(b"remaining bytes".to_vec()),
            |reader| {
                if reader.position() == 15 {
                    Ok(())
                } else {
                    Err(io::Error::other(format!("closed at {}", reader.position())))
                }
            },
            "close",
        );
        assert!(slot.is_none(), "got {:?}", rendered(slot.as_ref()));
    }

    #[test]
    fn exhaust_close_puts_drain_failure_first() {
        struct Broken;

        impl io::Read for Broken {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::other("reset"))
            }
        }

        let mut slot: Option<SharedError> = Some(Arc::new(ChainError::new("work")));
        exhaust_close(&mut slot, Broken, |_| Err(io::Error::other("busy")), "close");
        assert_eq!(
            rendered(slot.as_ref()).as_deref(),
            Some(
                "3 errors: failed to exhaust reader, performance may be impeded: reset; \
                 work; close: busy"
            )
        );
    }

    proptest::proptest! {
        #[test]
        fn proptest_close_error_is_appended_last(
            existing in proptest::collection::vec("[a-z]{1,6}", 0..6usize),
        ) {
            let mut agg = Aggregator::new();
            for message in &existing {
                agg.add(ChainError::new(message.clone()));
            }
            let mut slot = agg.err();
            capture(&mut slot, failing("busy"), "close");

            let rendered = rendered(slot.as_ref()).unwrap_or_default();
            proptest::prop_assert!(rendered.ends_with("close: busy"), "got {}", rendered);
            let expected_len = existing.len() + 1;
            let prefix = if expected_len > 1 { format!("{expected_len} errors: ") } else { String::new() };
            proptest::prop_assert!(rendered.starts_with(&prefix), "got {}", rendered);
        }
    }
}
