// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the command-line tools.
//
// Every technical error is mapped to plain English with a clear suggestion.
// The severity decides whether the batch can carry on with the next file.

use crate::error::MonoscanError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Only the current file is affected; the batch continues.
    FileSkipped,
    /// The invocation itself is wrong (bad flag, bad preset).
    Usage,
    /// The environment prevents any progress (disk full, permissions).
    Fatal,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary.
    pub message: String,
    /// What the user should try.
    pub suggestion: String,
    pub severity: Severity,
}

/// Convert a `MonoscanError` into a `HumanError` suitable for the console.
pub fn humanize_error(err: &MonoscanError) -> HumanError {
    match err {
        MonoscanError::PdfError(detail) => HumanError {
            message: "This PDF could not be read or written.".into(),
            suggestion: format!(
                "Check that the file is a complete, unencrypted PDF. ({detail})"
            ),
            severity: Severity::FileSkipped,
        },

        MonoscanError::ImageError(detail) => HumanError {
            message: "An image could not be decoded.".into(),
            suggestion: format!("The file may be damaged or truncated. ({detail})"),
            severity: Severity::FileSkipped,
        },

        MonoscanError::UnsupportedImage(detail) => HumanError {
            message: "This image format isn't supported.".into(),
            suggestion: format!(
                "Re-save the scan as JPEG, PNG or an uncompressed PDF image. ({detail})"
            ),
            severity: Severity::FileSkipped,
        },

        MonoscanError::MissingPageImage(page) => HumanError {
            message: format!("Page {page} has no scanned image."),
            suggestion: "Only PDFs made from scans can be converted; text pages are not rendered."
                .into(),
            severity: Severity::FileSkipped,
        },

        MonoscanError::NothingToAssemble => HumanError {
            message: "There was nothing to put into the PDF.".into(),
            suggestion: "None of the given images could be read. Check the file paths and formats."
                .into(),
            severity: Severity::FileSkipped,
        },

        MonoscanError::InvalidConfig(detail) => HumanError {
            message: "One of the options has an invalid value.".into(),
            suggestion: format!("Fix the option and run the command again. ({detail})"),
            severity: Severity::Usage,
        },

        MonoscanError::Serialization(detail) => HumanError {
            message: "The preset file could not be parsed.".into(),
            suggestion: format!("Check the preset is valid JSON. ({detail})"),
            severity: Severity::Usage,
        },

        MonoscanError::Io(io_err) => humanize_io_error(io_err),
    }
}

fn humanize_io_error(err: &std::io::Error) -> HumanError {
    use std::io::ErrorKind;

    match err.kind() {
        ErrorKind::NotFound => HumanError {
            message: "A file could not be found.".into(),
            suggestion: format!("Check the path is spelled correctly. ({err})"),
            severity: Severity::FileSkipped,
        },
        ErrorKind::PermissionDenied => HumanError {
            message: "Permission was denied.".into(),
            suggestion: format!(
                "Make sure you can read the input and write to its folder. ({err})"
            ),
            severity: Severity::Fatal,
        },
        _ => HumanError {
            message: "A file operation failed.".into(),
            suggestion: format!("Check free disk space and try again. ({err})"),
            severity: Severity::Fatal,
        },
    }
}
