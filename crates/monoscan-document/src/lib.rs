// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// monoscan-document: Document processing for the Monoscan tools.
//
// Provides PDF image extraction and assembly, greyscale image enhancement
// (contrast, brightness, sharpness, threshold), corner flood-fill cleanup, and
// the per-batch conversion context used by the command-line tools.

pub mod batch;
pub mod image;
pub mod naming;
pub mod pdf;
pub mod scan;

// Re-export the primary structs so callers can use `monoscan_document::PdfReader` etc.
pub use batch::{
    BatchContext, BatchStats, ConvertObserver, FileOutcome, ImageBundleReport, SilentObserver,
    images_to_pdf,
};
pub use crate::image::processor::ImageProcessor;
pub use naming::{enhanced_output_path, generated_output_path, natural_cmp, natural_sort};
pub use pdf::reader::{ExtractedImage, PdfReader};
pub use pdf::writer::PdfAssembler;
pub use scan::enhance::ScanEnhancer;
