// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Monoscan.

use thiserror::Error;

/// Top-level error type for all Monoscan operations.
#[derive(Debug, Error)]
pub enum MonoscanError {
    // -- Document errors --
    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("unsupported image: {0}")]
    UnsupportedImage(String),

    #[error("page {0} contains no raster image")]
    MissingPageImage(u32),

    #[error("no images could be assembled into a PDF")]
    NothingToAssemble,

    // -- Configuration --
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, MonoscanError>;
