// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line arguments for `convert` and `image2pdf`.

use std::path::PathBuf;

use clap::Parser;
use monoscan_core::error::MonoscanError;
use monoscan_core::{AssemblyOptions, Factor, PipelineConfig, ThresholdMode};

const CONVERT_AFTER_HELP: &str = r#"EXAMPLES:
  # Binarize at the default level (192) and write enhanced_book.pdf
  convert book.pdf

  # Whiten the background only, keep darker greys
  convert -t -160 book.pdf

  # Boost contrast, pick the level automatically, clean dark corners
  convert -c 1.5 -t auto -f 40 scans/*.pdf

  # Review each result before it is written
  convert -i book.pdf
"#;

/// Convert scanned PDFs into clean monochrome PDFs.
#[derive(Parser, Debug)]
#[command(
    name = "convert",
    version,
    about = "Convert scanned PDFs into clean monochrome PDFs",
    long_about = "Extract the scanned image from every page, convert it to greyscale, apply \
the requested contrast, brightness, sharpness, threshold and corner cleanup, and write the \
result as enhanced_<name>.pdf next to each input.",
    arg_required_else_help = true,
    after_long_help = CONVERT_AFTER_HELP
)]
pub struct ConvertArgs {
    /// Input PDF files.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Threshold level: N > 0 binarizes, N < 0 whitens pixels at or above |N|,
    /// 0 disables, "auto" picks the level with Otsu's method. [default: 192]
    #[arg(short, long, allow_hyphen_values = true)]
    pub threshold: Option<ThresholdMode>,

    /// Contrast factor (1.0 = unchanged).
    #[arg(short, long)]
    pub contrast: Option<f32>,

    /// Brightness factor (1.0 = unchanged).
    #[arg(short, long)]
    pub brightness: Option<f32>,

    /// Sharpness factor (1.0 = unchanged, below 1.0 blurs).
    #[arg(short, long)]
    pub sharpness: Option<f32>,

    /// Flood-fill tolerance for whitening dark page corners (off if omitted).
    #[arg(short = 'f', long)]
    pub tolerance: Option<u8>,

    /// Preview each converted file and confirm before it is written.
    #[arg(short, long)]
    pub interactive: bool,

    /// Pixels per inch used to size output pages.
    #[arg(long, default_value_t = 72.0)]
    pub dpi: f32,

    /// JSON preset with pipeline settings; flags given here override it.
    #[arg(long, value_name = "FILE")]
    pub preset: Option<PathBuf>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    pub verbose: bool,
}

impl ConvertArgs {
    /// Pipeline settings: explicit flags, then the preset, then defaults.
    pub fn pipeline_config(&self) -> Result<PipelineConfig, MonoscanError> {
        let mut config = match &self.preset {
            Some(path) => PipelineConfig::from_json_file(path)?,
            None => PipelineConfig::default(),
        };

        if let Some(threshold) = self.threshold {
            config.threshold = threshold;
        }
        if let Some(contrast) = self.contrast {
            config.contrast = Factor(contrast);
        }
        if let Some(brightness) = self.brightness {
            config.brightness = Factor(brightness);
        }
        if let Some(sharpness) = self.sharpness {
            config.sharpness = Factor(sharpness);
        }
        if self.tolerance.is_some() {
            config.corner_tolerance = self.tolerance;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn assembly_options(&self) -> AssemblyOptions {
        AssemblyOptions {
            dpi: self.dpi,
            ..AssemblyOptions::default()
        }
    }
}

/// Bundle image files into a single PDF, one page per image.
#[derive(Parser, Debug)]
#[command(
    name = "image2pdf",
    version,
    about = "Bundle images into a single PDF, one page per image",
    long_about = "Sort the images in natural order (img2 before img10), convert each to RGB and \
write generated_<dirname>.pdf next to the folder holding them. Unreadable images are skipped.",
    arg_required_else_help = true
)]
pub struct Image2PdfArgs {
    /// Input image files.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Pixels per inch used to size output pages.
    #[arg(long, default_value_t = 72.0)]
    pub dpi: f32,

    /// Number of images encoded into the PDF at a time.
    #[arg(long, default_value_t = 20, value_parser = clap::value_parser!(u64).range(1..))]
    pub batch_size: u64,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Image2PdfArgs {
    pub fn assembly_options(&self) -> AssemblyOptions {
        AssemblyOptions {
            dpi: self.dpi,
            batch_size: usize::try_from(self.batch_size).unwrap_or(usize::MAX),
        }
    }
}
