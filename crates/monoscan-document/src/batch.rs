// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch conversion: the per-invocation context shared by every file a command
// processes, plus the image bundling flow behind `image2pdf`.
//
// All pipeline settings, assembly options and counters live in `BatchContext`,
// which is built once and passed explicitly to each conversion.

use std::path::{Path, PathBuf};

use image::DynamicImage;
use monoscan_core::error::MonoscanError;
use monoscan_core::{AssemblyOptions, PipelineConfig};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::image::processor::ImageProcessor;
use crate::naming::{enhanced_output_path, generated_output_path, natural_sort};
use crate::pdf::reader::PdfReader;
use crate::pdf::writer::PdfAssembler;
use crate::scan::enhance::ScanEnhancer;

/// Receives progress events from a conversion.
///
/// Every method has a no-op default, so observers implement only what they
/// display.
pub trait ConvertObserver {
    /// A PDF is about to be converted.
    fn on_file_start(&mut self, _path: &Path, _pages: usize) {}

    /// A page image was extracted (or an input image was loaded).
    fn on_page(&mut self, _page_number: u32, _width: u32, _height: u32) {}

    /// An output PDF was written.
    fn on_file_saved(&mut self, _output: &Path, _pages: usize) {}

    /// An input image could not be used and was left out.
    fn on_image_skipped(&mut self, _path: &Path, _error: &MonoscanError) {}

    /// Inspect the enhanced pages before they are written. Returning
    /// `Ok(false)` skips writing `output`.
    fn review(&mut self, _pages: &[DynamicImage], _output: &Path) -> Result<bool, MonoscanError> {
        Ok(true)
    }
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentObserver;

impl ConvertObserver for SilentObserver {}

/// Result of converting one PDF.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FileOutcome {
    /// The enhanced PDF was written.
    Saved { output: PathBuf, pages: usize },
    /// The review step declined the result; nothing was written.
    Declined,
}

/// Counters for one invocation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    pub files_saved: usize,
    pub files_declined: usize,
    pub files_failed: usize,
    pub pages_written: usize,
}

impl BatchStats {
    pub fn files_processed(&self) -> usize {
        self.files_saved + self.files_declined + self.files_failed
    }
}

/// Per-invocation conversion state.
///
/// ```ignore
/// let mut ctx = BatchContext::new(config, AssemblyOptions::default(), Box::new(SilentObserver))?;
/// for path in inputs {
///     ctx.convert_file(&path)?;
/// }
/// ```
pub struct BatchContext {
    config: PipelineConfig,
    assembly: AssemblyOptions,
    observer: Box<dyn ConvertObserver>,
    stats: BatchStats,
}

impl BatchContext {
    /// Validate the settings and build the context.
    pub fn new(
        config: PipelineConfig,
        assembly: AssemblyOptions,
        observer: Box<dyn ConvertObserver>,
    ) -> Result<Self, MonoscanError> {
        config.validate()?;
        assembly.validate()?;
        Ok(Self {
            config,
            assembly,
            observer,
            stats: BatchStats::default(),
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn stats(&self) -> BatchStats {
        self.stats
    }

    /// Convert one scanned PDF into `enhanced_<name>` beside it.
    ///
    /// Any extraction or write failure aborts this file only; the counters
    /// record it and the context stays usable for the next file.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn convert_file(&mut self, path: &Path) -> Result<FileOutcome, MonoscanError> {
        let result = self.convert_inner(path);
        match &result {
            Ok(FileOutcome::Saved { pages, .. }) => {
                self.stats.files_saved += 1;
                self.stats.pages_written += pages;
            }
            Ok(FileOutcome::Declined) => self.stats.files_declined += 1,
            Err(err) => {
                warn!(error = %err, "Conversion failed");
                self.stats.files_failed += 1;
            }
        }
        result
    }

    fn convert_inner(&mut self, path: &Path) -> Result<FileOutcome, MonoscanError> {
        let reader = PdfReader::open(path)?;
        let output = enhanced_output_path(path);
        self.observer.on_file_start(path, reader.page_count());

        let mut pages = Vec::with_capacity(reader.page_count());
        for page_number in reader.page_numbers() {
            let extracted = reader.page_image(page_number)?;
            self.observer.on_page(
                page_number,
                extracted.image.width(),
                extracted.image.height(),
            );
            let enhanced = ScanEnhancer::from_dynamic(extracted.image)
                .enhance(&self.config)
                .into_dynamic();
            pages.push(enhanced);
        }

        if !self.observer.review(&pages, &output)? {
            info!(output = %output.display(), "Result declined; not written");
            return Ok(FileOutcome::Declined);
        }

        let mut assembler = PdfAssembler::new(self.assembly);
        if let Some(stem) = path.file_stem() {
            assembler.set_title(stem.to_string_lossy());
        }
        for page in pages {
            assembler.push(page)?;
        }
        let written = assembler.finish(&output)?;
        self.observer.on_file_saved(&output, written);

        Ok(FileOutcome::Saved {
            output,
            pages: written,
        })
    }
}

/// Summary of an `image2pdf` run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageBundleReport {
    pub output: PathBuf,
    pub pages: usize,
    /// Inputs that could not be decoded, in processing order.
    pub skipped: Vec<PathBuf>,
}

/// Bundle image files into `generated_<dirname>.pdf`, one page per image.
///
/// Files are taken in natural order and converted to RGB. Unreadable files
/// are reported to the observer and left out; the run fails only when no
/// image at all could be used.
#[instrument(skip_all, fields(files = files.len()))]
pub fn images_to_pdf(
    files: &[PathBuf],
    options: AssemblyOptions,
    observer: &mut dyn ConvertObserver,
) -> Result<ImageBundleReport, MonoscanError> {
    options.validate()?;
    let mut sorted = files.to_vec();
    natural_sort(&mut sorted);
    let Some(first) = sorted.first() else {
        return Err(MonoscanError::NothingToAssemble);
    };
    let output = generated_output_path(first);

    let mut assembler = PdfAssembler::new(options);
    if let Some(stem) = output.file_stem() {
        assembler.set_title(stem.to_string_lossy());
    }

    let mut skipped = Vec::new();
    for file in &sorted {
        match ImageProcessor::open(file) {
            Ok(processor) => {
                let rgb = processor.into_dynamic().into_rgb8();
                let page_number = assembler.page_count() as u32 + 1;
                observer.on_page(page_number, rgb.width(), rgb.height());
                assembler.push(DynamicImage::ImageRgb8(rgb))?;
            }
            Err(err) => {
                warn!(file = %file.display(), error = %err, "Skipping unreadable image");
                observer.on_image_skipped(file, &err);
                skipped.push(file.clone());
            }
        }
    }

    let pages = assembler.finish(&output)?;
    observer.on_file_saved(&output, pages);
    info!(pages, skipped = skipped.len(), "Image bundle written");

    Ok(ImageBundleReport {
        output,
        pages,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};
    use monoscan_core::ThresholdMode;

    fn grey_page(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_fn(width, height, |x, _| {
            Luma([(x * 255 / width.max(1)) as u8])
        }))
    }

    fn write_scan_pdf(path: &Path, pages: usize) {
        let mut assembler = PdfAssembler::new(AssemblyOptions::default());
        for _ in 0..pages {
            assembler.push(grey_page(40, 30)).unwrap();
        }
        assembler.finish(path).unwrap();
    }

    #[derive(Default)]
    struct Recorder {
        started: Vec<(PathBuf, usize)>,
        pages: Vec<u32>,
        saved: Vec<(PathBuf, usize)>,
        skipped: Vec<PathBuf>,
        accept: bool,
    }

    impl ConvertObserver for Recorder {
        fn on_file_start(&mut self, path: &Path, pages: usize) {
            self.started.push((path.to_path_buf(), pages));
        }
        fn on_page(&mut self, page_number: u32, _width: u32, _height: u32) {
            self.pages.push(page_number);
        }
        fn on_file_saved(&mut self, output: &Path, pages: usize) {
            self.saved.push((output.to_path_buf(), pages));
        }
        fn on_image_skipped(&mut self, path: &Path, _error: &MonoscanError) {
            self.skipped.push(path.to_path_buf());
        }
        fn review(&mut self, _pages: &[DynamicImage], _output: &Path) -> Result<bool, MonoscanError> {
            Ok(self.accept)
        }
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let config = PipelineConfig {
            contrast: monoscan_core::Factor(f32::NAN),
            ..PipelineConfig::default()
        };
        assert!(
            BatchContext::new(config, AssemblyOptions::default(), Box::new(SilentObserver))
                .is_err()
        );
    }

    #[test]
    fn converts_scan_to_bilevel_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("scan.pdf");
        write_scan_pdf(&input, 2);

        let config = PipelineConfig {
            threshold: ThresholdMode::Binarize(192),
            ..PipelineConfig::default()
        };
        let mut ctx =
            BatchContext::new(config, AssemblyOptions::default(), Box::new(SilentObserver))
                .unwrap();
        let outcome = ctx.convert_file(&input).unwrap();

        let output = dir.path().join("enhanced_scan.pdf");
        assert_eq!(
            outcome,
            FileOutcome::Saved {
                output: output.clone(),
                pages: 2
            }
        );
        let pages = PdfReader::open(&output).unwrap().page_images().unwrap();
        assert_eq!(pages.len(), 2);
        for page in pages {
            let gray = page.image.to_luma8();
            assert!(gray.pixels().all(|p| p.0[0] == 0 || p.0[0] == 0xff));
        }
        assert_eq!(ctx.stats().files_saved, 1);
        assert_eq!(ctx.stats().pages_written, 2);
    }

    #[test]
    fn declined_review_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("book.pdf");
        write_scan_pdf(&input, 1);

        let observer = Recorder {
            accept: false,
            ..Recorder::default()
        };
        let mut ctx = BatchContext::new(
            PipelineConfig::default(),
            AssemblyOptions::default(),
            Box::new(observer),
        )
        .unwrap();

        assert_eq!(ctx.convert_file(&input).unwrap(), FileOutcome::Declined);
        assert_eq!(ctx.stats().pages_written, 0);
        assert!(!dir.path().join("enhanced_book.pdf").exists());
        assert_eq!(ctx.stats().files_declined, 1);
    }

    #[test]
    fn failed_file_is_counted_and_batch_continues() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("broken.pdf");
        std::fs::write(&broken, b"not a pdf").unwrap();
        let good = dir.path().join("good.pdf");
        write_scan_pdf(&good, 1);

        let mut ctx = BatchContext::new(
            PipelineConfig::default(),
            AssemblyOptions::default(),
            Box::new(SilentObserver),
        )
        .unwrap();
        assert!(ctx.convert_file(&broken).is_err());
        assert!(ctx.convert_file(&good).is_ok());

        let stats = ctx.stats();
        assert_eq!(stats.files_failed, 1);
        assert_eq!(stats.files_saved, 1);
        assert_eq!(stats.files_processed(), 2);
    }

    #[test]
    fn images_are_bundled_in_natural_order() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("pages");
        std::fs::create_dir(&dir).unwrap();

        // Width encodes the expected position.
        let mut files = Vec::new();
        for (name, width) in [("img10.png", 30), ("img2.png", 20), ("img1.png", 10)] {
            let path = dir.join(name);
            RgbImage::from_pixel(width, 8, Rgb([10, 20, 30]))
                .save(&path)
                .unwrap();
            files.push(path);
        }
        let junk = dir.join("img3.png");
        std::fs::write(&junk, b"garbage").unwrap();
        files.push(junk.clone());

        let mut observer = Recorder::default();
        let report = images_to_pdf(&files, AssemblyOptions::default(), &mut observer).unwrap();

        assert_eq!(report.pages, 3);
        assert_eq!(report.skipped, vec![junk]);
        assert_eq!(report.output.file_name().unwrap(), "generated_pages.pdf");
        assert_eq!(observer.skipped.len(), 1);
        assert_eq!(observer.pages, vec![1, 2, 3]);
        assert_eq!(observer.saved, vec![(report.output.clone(), 3)]);

        let widths: Vec<u32> = PdfReader::open(&report.output)
            .unwrap()
            .page_images()
            .unwrap()
            .iter()
            .map(|page| page.image.width())
            .collect();
        assert_eq!(widths, vec![10, 20, 30]);
    }

    #[test]
    fn no_usable_images_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let junk = dir.path().join("a.png");
        std::fs::write(&junk, b"garbage").unwrap();

        let result = images_to_pdf(&[junk], AssemblyOptions::default(), &mut SilentObserver);
        assert!(matches!(result, Err(MonoscanError::NothingToAssemble)));
        assert!(images_to_pdf(&[], AssemblyOptions::default(), &mut SilentObserver).is_err());
    }
}
