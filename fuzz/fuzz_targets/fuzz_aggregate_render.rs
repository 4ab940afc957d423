//! Fuzz target: building, rendering and counting nested aggregates.
//!
//! Each input byte is an instruction over a stack of errors: push a leaf,
//! wrap the top, or fold the top few into an aggregate. Rendering and
//! counting the result must never panic, and flattening must hold.

#![no_main]

use std::io;

use errchain_core::{as_multi, Aggregator, ChainError, MultiError, SharedError};
use libfuzzer_sys::fuzz_target;

const MAX_STACK: usize = 64;

fn leaf(byte: u8) -> SharedError {
    std::sync::Arc::new(io::Error::other(format!("e{}", byte % 4)))
}

fuzz_target!(|data: &[u8]| {
    let mut stack: Vec<SharedError> = Vec::new();
    for &byte in data {
        match byte % 3 {
            0 if stack.len() < MAX_STACK => stack.push(leaf(byte)),
            1 => {
                if let Some(top) = stack.pop() {
                    stack.push(std::sync::Arc::new(ChainError::wrap(top, "w")));
                }
            }
            _ => {
                let take = usize::from(byte >> 2).min(stack.len());
                let mut agg = Aggregator::new();
                for err in stack.drain(stack.len() - take..) {
                    agg.add(err);
                }
                if let Some(err) = agg.err() {
                    stack.push(err);
                }
            }
        }
    }

    for err in &stack {
        let _ = err.to_string();
        let Some(multi) = as_multi(&**err) else {
            continue;
        };
        let _ = multi.pretty().to_string();
        assert!(multi.len() >= 2, "aggregates hold at least two errors");
        assert!(
            multi.errors().iter().all(|e| e.downcast_ref::<MultiError>().is_none()),
            "aggregates never hold a direct aggregate"
        );
        let _ = multi.count(&ChainError::new("unmatched"));
    }
});
