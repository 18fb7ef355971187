// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// monoscan-cli: shared pieces of the `convert` and `image2pdf` binaries, namely
// argument definitions, logging setup and console output.

pub mod args;
pub mod console;

pub use args::{ConvertArgs, Image2PdfArgs};
pub use console::{ConsoleObserver, ReviewAnswer, report_failure};

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise only warnings are shown, or
/// everything down to DEBUG with `--verbose`.
pub fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_writer(std::io::stderr)
        .init();
}
