// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan enhancement pipeline: greyscale conversion, contrast, brightness and
// sharpness enhancement, thresholding and corner cleanup for scanned pages.

use image::{DynamicImage, GrayImage, Luma};
use imageproc::contrast::{ThresholdType, otsu_level, threshold};
use monoscan_core::{PipelineConfig, Stage, ThresholdMode};
use tracing::{debug, info, instrument};

use crate::image::processor::ImageProcessor;
use crate::scan::flood;

const BLACK: u8 = 0x00;
const WHITE: u8 = 0xff;

/// Enhances one scanned page image.
///
/// The full pipeline ([`ScanEnhancer::enhance`]) runs the stages listed by
/// [`PipelineConfig::stages`] in order. The individual steps are also exposed
/// for callers that build their own sequence.
pub struct ScanEnhancer {
    /// The working image (kept as `DynamicImage` until it is made greyscale).
    image: DynamicImage,
}

impl ScanEnhancer {
    // -- Construction ---------------------------------------------------------

    /// Create an enhancer wrapping an existing `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    /// Consume the enhancer and return the underlying image.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    /// Consume the enhancer and return the image as 8-bit greyscale.
    pub fn into_gray(self) -> GrayImage {
        ImageProcessor::from_dynamic(self.image).into_gray()
    }

    // -- Enhancement pipeline -------------------------------------------------

    /// Run every stage the configuration enables, in fixed order:
    ///
    /// 1. Convert to greyscale (skipped when already `Luma8`)
    /// 2. Contrast, 3. brightness, 4. sharpness (skipped at factor 1.0)
    /// 5. Threshold (binarize, whiten-only, Otsu, or off)
    /// 6. Corner flood-fill (only with a tolerance)
    #[instrument(skip(self, config))]
    pub fn enhance(self, config: &PipelineConfig) -> Self {
        let stages = config.stages();
        info!(stages = stages.len(), "Running scan enhancement pipeline");

        stages
            .into_iter()
            .fold(self, |enhancer, stage| enhancer.apply(stage))
    }

    /// Apply a single pipeline stage.
    pub fn apply(self, stage: Stage) -> Self {
        debug!(?stage, "Applying stage");
        match stage {
            Stage::Grayscale => self.map_processor(ImageProcessor::grayscale),
            Stage::Contrast(factor) => self.map_processor(|p| p.enhance_contrast(factor)),
            Stage::Brightness(factor) => self.map_processor(|p| p.enhance_brightness(factor)),
            Stage::Sharpness(factor) => self.map_processor(|p| p.enhance_sharpness(factor)),
            Stage::Threshold(mode) => self.threshold(mode),
            Stage::CornerFill(tolerance) => self.fill_corners(tolerance),
        }
    }

    // -- Thresholding ---------------------------------------------------------

    /// Apply a threshold mode. [`ThresholdMode::Off`] returns `self` unchanged.
    #[instrument(skip(self))]
    pub fn threshold(self, mode: ThresholdMode) -> Self {
        match mode {
            ThresholdMode::Off => self,
            ThresholdMode::Binarize(level) => self.binarize(level),
            ThresholdMode::WhitenAbove(level) => self.whiten_above(level),
            ThresholdMode::Otsu => self.binarize_otsu(),
        }
    }

    /// Hard binarization: pixels below `level` become black, the rest white.
    pub fn binarize(self, level: u8) -> Self {
        info!(level, "Binarizing");
        let gray = self.into_gray();
        match level.checked_sub(1) {
            Some(cut) => Self::from_gray(threshold(&gray, cut, ThresholdType::Binary)),
            None => Self::from_gray(GrayImage::from_pixel(
                gray.width(),
                gray.height(),
                Luma([WHITE]),
            )),
        }
    }

    /// Whiten-only threshold: pixels at or above `level` become white, darker
    /// pixels keep their grey value.
    pub fn whiten_above(self, level: u8) -> Self {
        info!(level, "Whitening background");
        self.map_gray(|p| if p < level { p } else { WHITE })
    }

    /// Binarize at the level chosen by Otsu's method.
    ///
    /// `otsu_level` puts the level itself in the dark class, so pixels at or
    /// below it become black.
    pub fn binarize_otsu(self) -> Self {
        let gray = self.into_gray();
        let level = otsu_level(&gray);
        debug!(level, "Otsu threshold computed");
        Self::from_gray(threshold(&gray, level, ThresholdType::Binary))
    }

    // -- Corner cleanup -------------------------------------------------------

    /// Flood-fill from the four inset corner seeds with the given tolerance.
    pub fn fill_corners(self, tolerance: u8) -> Self {
        info!(tolerance, "Cleaning page corners");
        Self::from_gray(flood::fill_corners(self.into_gray(), tolerance))
    }

    // -- Helpers --------------------------------------------------------------

    fn from_gray(gray: GrayImage) -> Self {
        Self {
            image: DynamicImage::ImageLuma8(gray),
        }
    }

    fn map_processor(self, f: impl FnOnce(ImageProcessor) -> ImageProcessor) -> Self {
        Self {
            image: f(ImageProcessor::from_dynamic(self.image)).into_dynamic(),
        }
    }

    fn map_gray(self, f: impl Fn(u8) -> u8) -> Self {
        let mut gray = self.into_gray();
        for pixel in gray.pixels_mut() {
            pixel.0[0] = f(pixel.0[0]);
        }
        Self::from_gray(gray)
    }
}

// -- Tests --------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb, RgbImage};
    use monoscan_core::Factor;

    fn ramp() -> GrayImage {
        GrayImage::from_fn(256, 4, |x, _| Luma([x as u8]))
    }

    #[test]
    fn identity_pipeline_only_converts_colour() {
        let rgb = RgbImage::from_fn(30, 30, |x, y| {
            let v = ((x * 8 + y) % 256) as u8;
            Rgb([v, v, v])
        });
        let expected = DynamicImage::ImageRgb8(rgb.clone()).to_luma8();

        let out = ScanEnhancer::from_dynamic(DynamicImage::ImageRgb8(rgb))
            .enhance(&PipelineConfig::identity())
            .into_gray();
        assert_eq!(out, expected);
    }

    #[test]
    fn identity_pipeline_keeps_grey_pixels() {
        let gray = ramp();
        let out = ScanEnhancer::from_gray(gray.clone())
            .enhance(&PipelineConfig::identity())
            .into_gray();
        assert_eq!(out, gray);
    }

    #[test]
    fn positive_threshold_is_strictly_bilevel() {
        let config = PipelineConfig {
            threshold: ThresholdMode::Binarize(192),
            ..PipelineConfig::identity()
        };
        let out = ScanEnhancer::from_gray(ramp()).enhance(&config).into_gray();
        for (x, _, pixel) in out.enumerate_pixels() {
            let expected = if x >= 192 { WHITE } else { BLACK };
            assert_eq!(pixel.0[0], expected, "pixel at x={x}");
        }
    }

    #[test]
    fn negative_threshold_whitens_only() {
        let config = PipelineConfig {
            threshold: ThresholdMode::from_level(-160).unwrap(),
            ..PipelineConfig::identity()
        };
        let out = ScanEnhancer::from_gray(ramp()).enhance(&config).into_gray();
        for (x, _, pixel) in out.enumerate_pixels() {
            let expected = if x >= 160 { WHITE } else { x as u8 };
            assert_eq!(pixel.0[0], expected, "pixel at x={x}");
        }
    }

    #[test]
    fn binarize_at_zero_whitens_everything() {
        let out = ScanEnhancer::from_gray(ramp()).binarize(0).into_gray();
        assert!(out.pixels().all(|p| p.0[0] == WHITE));
    }

    #[test]
    fn whiten_only_then_corner_fill_clears_connected_border() {
        // Grey border (100) below the level, light paper (200) above it, dark
        // text (50) and a grey mark (105) inside the page.
        let gray = GrayImage::from_fn(40, 40, |x, y| {
            let border = x < 8 || y < 8 || x >= 32 || y >= 32;
            let text = (14..26).contains(&x) && (18..20).contains(&y);
            let mark = (14..16).contains(&x) && (26..28).contains(&y);
            Luma([if border {
                100
            } else if text {
                50
            } else if mark {
                105
            } else {
                200
            }])
        });
        let config = PipelineConfig {
            threshold: ThresholdMode::WhitenAbove(160),
            corner_tolerance: Some(10),
            ..PipelineConfig::identity()
        };
        let out = ScanEnhancer::from_gray(gray).enhance(&config).into_gray();

        assert_eq!(out.get_pixel(0, 0).0[0], WHITE, "border filled");
        assert_eq!(out.get_pixel(39, 20).0[0], WHITE, "border filled");
        assert_eq!(out.get_pixel(20, 12).0[0], WHITE, "paper whitened");
        assert_eq!(out.get_pixel(20, 19).0[0], 50, "text keeps its grey");
        assert_eq!(out.get_pixel(14, 26).0[0], 105, "unconnected mark kept");
    }

    #[test]
    fn corner_fill_seeds_from_whitened_value() {
        // Paper at 170 is whitened first, so the seeds are white and the fill
        // does nothing; a 150 stripe touching the corners keeps its value even
        // though it lies within the tolerance of the unthresholded paper.
        let gray = GrayImage::from_fn(40, 40, |x, y| {
            Luma([if y == 6 || x == 6 { 150 } else { 170 }])
        });
        let config = PipelineConfig {
            threshold: ThresholdMode::WhitenAbove(160),
            corner_tolerance: Some(25),
            ..PipelineConfig::identity()
        };
        let out = ScanEnhancer::from_gray(gray).enhance(&config).into_gray();

        assert_eq!(out.get_pixel(5, 5).0[0], WHITE);
        assert_eq!(out.get_pixel(20, 6).0[0], 150);
        assert_eq!(out.get_pixel(6, 20).0[0], 150);
    }

    #[test]
    fn otsu_splits_two_tone_image() {
        let gray = GrayImage::from_fn(20, 20, |x, _| Luma([if x < 10 { 40 } else { 210 }]));
        let out = ScanEnhancer::from_gray(gray)
            .threshold(ThresholdMode::Otsu)
            .into_gray();
        assert_eq!(out.get_pixel(0, 0).0[0], BLACK);
        assert_eq!(out.get_pixel(19, 0).0[0], WHITE);
    }

    #[test]
    fn full_pipeline_cleans_shadowed_border() {
        // Light page with a dark scanner shadow on the left and some text.
        let gray = GrayImage::from_fn(60, 60, |x, y| {
            if x < 10 {
                Luma([60])
            } else if (25..35).contains(&x) && (28..31).contains(&y) {
                Luma([20])
            } else {
                Luma([230])
            }
        });
        let config = PipelineConfig {
            contrast: Factor(1.2),
            threshold: ThresholdMode::Binarize(128),
            corner_tolerance: Some(10),
            ..PipelineConfig::identity()
        };
        let out = ScanEnhancer::from_gray(gray).enhance(&config).into_gray();

        assert!(out.pixels().all(|p| p.0[0] == BLACK || p.0[0] == WHITE));
        assert_eq!(out.get_pixel(2, 2).0[0], WHITE, "shadow removed");
        assert_eq!(out.get_pixel(30, 29).0[0], BLACK, "text kept");
    }
}
