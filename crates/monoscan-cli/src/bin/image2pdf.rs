// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `image2pdf`: bundle image files into one PDF, one page per image.

use std::io;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use monoscan_cli::{ConsoleObserver, Image2PdfArgs, init_tracing};
use monoscan_document::images_to_pdf;

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let args = Image2PdfArgs::parse();
    init_tracing(args.verbose);

    let mut observer = ConsoleObserver::new(false, io::stdin().lock());
    let report = images_to_pdf(&args.files, args.assembly_options(), &mut observer)
        .context("Failed to build the PDF")?;

    if !report.skipped.is_empty() {
        eprintln!(
            "{} of {} images could not be read and were left out",
            report.skipped.len(),
            args.files.len()
        );
    }
    Ok(ExitCode::SUCCESS)
}
