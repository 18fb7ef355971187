// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `convert`: turn scanned PDFs into enhanced monochrome PDFs.

use std::io;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use monoscan_cli::{ConsoleObserver, ConvertArgs, init_tracing, report_failure};
use monoscan_document::BatchContext;

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
    let args = ConvertArgs::parse();
    init_tracing(args.verbose);

    let config = args
        .pipeline_config()
        .context("Failed to build pipeline settings")?;
    tracing::debug!(?config, "Pipeline settings");

    let observer = ConsoleObserver::new(args.interactive, io::stdin().lock());
    let mut ctx = BatchContext::new(config, args.assembly_options(), Box::new(observer))
        .context("Invalid settings")?;

    for file in &args.files {
        if let Err(err) = ctx.convert_file(file) {
            report_failure(file, &err);
        }
    }

    let stats = ctx.stats();
    tracing::info!(
        saved = stats.files_saved,
        declined = stats.files_declined,
        failed = stats.files_failed,
        pages = stats.pages_written,
        "Batch finished"
    );

    if stats.files_failed > 0 {
        eprintln!(
            "{} of {} files failed",
            stats.files_failed,
            stats.files_processed()
        );
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
