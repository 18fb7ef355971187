// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor: greyscale conversion plus contrast, brightness and
// sharpness enhancement. Operates on in-memory images using the `image` crate.
//
// The enhancements are expressed as a blend between the image and a
// "degenerate" version of it: a flat grey at the mean intensity for contrast,
// black for brightness, and a smoothed copy for sharpness. A factor of 1.0
// returns the original image.

use image::{DynamicImage, GrayImage, Luma};
use monoscan_core::error::MonoscanError;
use tracing::{debug, info, instrument};

/// 3x3 smoothing kernel used as the sharpness baseline. Weights sum to 13.
const SMOOTH_KERNEL: [u32; 9] = [1, 1, 1, 1, 5, 1, 1, 1, 1];
const SMOOTH_DIVISOR: u32 = 13;

/// Image processing pipeline operating on a single in-memory image.
///
/// All operations are non-destructive: each method consumes `self` and returns a
/// new `ImageProcessor` wrapping the transformed image, enabling method chaining.
/// Enhancement methods work on 8-bit greyscale and convert first if needed.
///
/// ```ignore
/// let page = ImageProcessor::open("scan.jpg")?
///     .grayscale()
///     .enhance_contrast(1.4)
///     .enhance_sharpness(2.0)
///     .into_gray();
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Load an image from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, MonoscanError> {
        let img = image::open(path.as_ref()).map_err(|err| {
            MonoscanError::ImageError(format!(
                "failed to open {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        info!(
            width = img.width(),
            height = img.height(),
            color = ?img.color(),
            "Image loaded"
        );
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    /// Wrap an 8-bit greyscale buffer.
    pub fn from_gray(image: GrayImage) -> Self {
        Self {
            image: DynamicImage::ImageLuma8(image),
        }
    }

    // -- Accessors ------------------------------------------------------------

    /// Whether the image is already single-channel 8-bit greyscale.
    pub fn is_gray(&self) -> bool {
        matches!(self.image, DynamicImage::ImageLuma8(_))
    }

    /// Consume the processor and return the underlying `DynamicImage`.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    /// Consume the processor and return an 8-bit greyscale buffer, converting
    /// only when the image is not greyscale already.
    pub fn into_gray(self) -> GrayImage {
        match self.image {
            DynamicImage::ImageLuma8(gray) => gray,
            other => other.to_luma8(),
        }
    }

    // -- Transformations (consume self, return new Self) -----------------------

    /// Convert the image to 8-bit greyscale (luma).
    ///
    /// An image that is already `Luma8` is returned as-is.
    #[instrument(skip(self))]
    pub fn grayscale(self) -> Self {
        if self.is_gray() {
            debug!("Image already greyscale");
            return self;
        }
        info!(from = ?self.image.color(), "Converting to greyscale");
        Self::from_gray(self.image.to_luma8())
    }

    /// Scale contrast around the mean intensity.
    ///
    /// `out = mean + factor * (p - mean)`. Values > 1.0 increase contrast,
    /// values < 1.0 flatten towards the mean; 1.0 is a no-op.
    #[instrument(skip(self))]
    pub fn enhance_contrast(self, factor: f32) -> Self {
        let mut gray = self.into_gray();
        let mean = mean_intensity(&gray);
        info!(factor, mean, "Adjusting contrast");

        for pixel in gray.pixels_mut() {
            pixel.0[0] = blend(mean, f32::from(pixel.0[0]), factor);
        }
        Self::from_gray(gray)
    }

    /// Scale brightness: `out = p * factor`. 1.0 is a no-op, 0.0 is black.
    #[instrument(skip(self))]
    pub fn enhance_brightness(self, factor: f32) -> Self {
        let mut gray = self.into_gray();
        info!(factor, "Adjusting brightness");

        for pixel in gray.pixels_mut() {
            pixel.0[0] = blend(0.0, f32::from(pixel.0[0]), factor);
        }
        Self::from_gray(gray)
    }

    /// Sharpen (factor > 1.0) or soften (factor < 1.0) the image.
    ///
    /// Blends between a 3x3 smoothed copy and the image:
    /// `out = smooth + factor * (p - smooth)`. The outermost rows and columns
    /// have no full neighbourhood and keep their values.
    #[instrument(skip(self))]
    pub fn enhance_sharpness(self, factor: f32) -> Self {
        let gray = self.into_gray();
        info!(factor, "Adjusting sharpness");

        let smooth = smooth3x3(&gray);
        let output = GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
            let base = f32::from(smooth.get_pixel(x, y).0[0]);
            let original = f32::from(gray.get_pixel(x, y).0[0]);
            Luma([blend(base, original, factor)])
        });
        Self::from_gray(output)
    }

    // -- Output ---------------------------------------------------------------

    /// Write the image to a file. The format is inferred from the file extension.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<(), MonoscanError> {
        self.image.save(path.as_ref()).map_err(|err| {
            MonoscanError::ImageError(format!(
                "failed to save image to {}: {}",
                path.as_ref().display(),
                err
            ))
        })
    }
}

/// `base + factor * (value - base)`, rounded and clamped to a u8.
fn blend(base: f32, value: f32, factor: f32) -> u8 {
    (base + factor * (value - base)).round().clamp(0.0, 255.0) as u8
}

/// Mean pixel value, rounded to the nearest integer.
fn mean_intensity(gray: &GrayImage) -> f32 {
    let count = u64::from(gray.width()) * u64::from(gray.height());
    if count == 0 {
        return 0.0;
    }
    let sum: u64 = gray.pixels().map(|p| u64::from(p.0[0])).sum();
    (sum as f64 / count as f64).round() as f32
}

/// Apply [`SMOOTH_KERNEL`] to every interior pixel; border pixels are copied.
fn smooth3x3(gray: &GrayImage) -> GrayImage {
    let (width, height) = gray.dimensions();
    let mut output = gray.clone();
    if width < 3 || height < 3 {
        return output;
    }

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let mut acc = 0u32;
            for (i, weight) in SMOOTH_KERNEL.iter().enumerate() {
                let dx = (i % 3) as u32;
                let dy = (i / 3) as u32;
                acc += weight * u32::from(gray.get_pixel(x + dx - 1, y + dy - 1).0[0]);
            }
            let value = (acc + SMOOTH_DIVISOR / 2) / SMOOTH_DIVISOR;
            output.put_pixel(x, y, Luma([value as u8]));
        }
    }
    output
}
