//! Helpers for closing resources without losing errors.
//!
//! A close that fails after the real work already failed must not hide the
//! first error, and a close that fails after the work succeeded must not be
//! dropped on the floor. [`capture`] folds the close error into the caller's
//! error slot; [`log_capture`] reports it through `tracing` when there is no
//! slot to return it in.

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod capture;
pub mod log;

pub use capture::{capture, capture_result, exhaust_close};
pub use log::{log_capture, CLOSE_ERROR_EVENT};
