//! Fuzz target: clilog record encoding.
//!
//! Splits arbitrary bytes into values and encodes them as one record, which
//! must end in a newline whatever the values hold.

#![no_main]

use errchain_clilog::{Encoder, Value};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let values: Vec<(&str, Value<'_>)> = data
        .split(|&b| b == 0)
        .map(|chunk| match std::str::from_utf8(chunk) {
            Ok(s) => ("s", Value::Str(s)),
            Err(_) => ("b", Value::Bytes(chunk)),
        })
        .collect();

    let mut enc = Encoder::new(String::new());
    let encoded = enc.encode_keyvals(&values).and_then(|()| enc.end_record());
    assert!(encoded.is_ok(), "encoding into a String cannot fail");
    let out = enc.into_inner();
    assert!(out.ends_with('\n'), "record must end with a newline");
});
