//! Fuzz target: JSON deserialization of stacktrace `Frame`s.
//!
//! Arbitrary bytes must never make the parser panic, and any frame that
//! parses must render.

#![no_main]

use errchain_core::Frame;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(frame) = serde_json::from_slice::<Frame>(data) {
        let _ = frame.to_string();
    }
});
