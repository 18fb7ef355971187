// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Console progress output and the interactive review prompt.

use std::io::{self, BufRead, Write};
use std::path::Path;

use image::DynamicImage;
use monoscan_core::error::MonoscanError;
use monoscan_core::human_errors::{Severity, humanize_error};
use monoscan_document::{ConvertObserver, ImageProcessor};
use tracing::debug;

/// What the user answered at the review prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewAnswer {
    Write,
    Skip,
}

impl ReviewAnswer {
    /// Parse one line of input. Unrecognised input yields `None`.
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "" | "y" | "yes" => Some(Self::Write),
            "n" | "no" | "q" | "quit" => Some(Self::Skip),
            _ => None,
        }
    }
}

/// Prints progress lines to stdout and, in interactive mode, asks before
/// each output file is written.
pub struct ConsoleObserver<R> {
    interactive: bool,
    input: R,
}

impl<R: BufRead> ConsoleObserver<R> {
    pub fn new(interactive: bool, input: R) -> Self {
        Self { interactive, input }
    }

    /// Read answers until one is recognised. End of input counts as Enter.
    fn ask(&mut self, output: &Path) -> Result<ReviewAnswer, MonoscanError> {
        loop {
            print!("Write {}? [Y/n] ", output.display());
            io::stdout().flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                println!();
                return Ok(ReviewAnswer::Write);
            }
            match ReviewAnswer::parse(&line) {
                Some(answer) => return Ok(answer),
                None => println!("Press Enter or y to write, n or q to skip."),
            }
        }
    }
}

impl<R: BufRead> ConvertObserver for ConsoleObserver<R> {
    fn on_file_start(&mut self, path: &Path, pages: usize) {
        println!("Processing {} ({} pages)", path.display(), pages);
    }

    fn on_page(&mut self, page_number: u32, width: u32, height: u32) {
        println!("  Page {page_number}");
        println!("  Image {width}x{height}");
    }

    fn on_file_saved(&mut self, output: &Path, pages: usize) {
        println!("Saved {} ({} pages)", output.display(), pages);
    }

    fn on_image_skipped(&mut self, path: &Path, error: &MonoscanError) {
        let human = humanize_error(error);
        println!("  Skipped {}: {}", path.display(), human.message);
    }

    fn review(&mut self, pages: &[DynamicImage], output: &Path) -> Result<bool, MonoscanError> {
        if !self.interactive {
            return Ok(true);
        }

        // Previews are removed when `previews` goes out of scope.
        let previews = tempfile::Builder::new()
            .prefix("monoscan-preview-")
            .tempdir()?;
        for (index, page) in pages.iter().enumerate() {
            let path = previews.path().join(format!("page-{:03}.png", index + 1));
            ImageProcessor::from_dynamic(page.clone()).save(&path)?;
        }
        debug!(dir = %previews.path().display(), pages = pages.len(), "Previews written");
        println!(
            "Preview of {} pages in {}",
            pages.len(),
            previews.path().display()
        );

        Ok(self.ask(output)? == ReviewAnswer::Write)
    }
}

/// Print a failed file with a plain-language explanation to stderr.
pub fn report_failure(path: &Path, err: &MonoscanError) -> Severity {
    let human = humanize_error(err);
    let label = match human.severity {
        Severity::FileSkipped => "skipped",
        Severity::Usage | Severity::Fatal => "error",
    };
    eprintln!("{label}: {}: {}", path.display(), human.message);
    eprintln!("  {}", human.suggestion);
    human.severity
}
