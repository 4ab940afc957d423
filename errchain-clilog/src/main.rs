//! Entry point for `errchain-cat`: concatenates files to stdout and reports
//! every failure at once.

use std::error::Error as StdError;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use errchain_core::{Aggregator, ResultExt, SharedError};

fn cat(path: &Path, out: &mut impl Write) -> Result<u64, SharedError> {
    let mut file = File::open(path)
        .wrap_with(|| format!("open {}", path.display()))
        .map_err(errchain_core::share)?;
    let copied = io::copy(&mut file, &mut *out)
        .wrap_with(|| format!("read {}", path.display()))
        .map_err(errchain_core::share);
    errchain_capture::capture_result(copied, || out.flush(), "flush")
}

fn main() {
    if let Err(e) = errchain_clilog::try_init() {
        eprintln!("{e}");
        std::process::exit(2);
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut failures = Aggregator::new();
    for arg in std::env::args_os().skip(1) {
        let path = Path::new(&arg);
        match cat(path, &mut out) {
            Ok(bytes) => tracing::debug!(path = %path.display(), bytes, "copied"),
            Err(err) => {
                failures.add(err);
            }
        }
    }

    if let Some(err) = failures.err() {
        tracing::error!(error = &*err as &(dyn StdError + 'static), "cat failed");
        std::process::exit(1);
    }
}
