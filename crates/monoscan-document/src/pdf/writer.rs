// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF assembler: build a multi-page PDF from raster images using `lopdf`,
// one image per page.
//
// Images are queued and encoded into page objects in batches; once encoded,
// the decoded pixel buffers are dropped. Page objects are collected under a
// single /Pages node that is written when the document is finished.

use std::path::Path;

use image::{DynamicImage, GrayImage};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};
use monoscan_core::AssemblyOptions;
use monoscan_core::error::MonoscanError;
use tracing::{debug, info, instrument};

/// Resource name under which each page refers to its image.
const IMAGE_NAME: &[u8] = b"Im0";

/// How a page image is stored in the PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageEncoding {
    /// 1 bit per pixel `DeviceGray`, for strictly black-and-white pages.
    Bilevel,
    /// 8 bit `DeviceGray`.
    Gray,
    /// 8 bit `DeviceRGB`.
    Rgb,
}

impl PageEncoding {
    /// Pick the most compact lossless encoding for an image.
    pub fn for_image(image: &DynamicImage) -> Self {
        match image {
            DynamicImage::ImageLuma8(gray) if is_bilevel(gray) => Self::Bilevel,
            DynamicImage::ImageLuma8(_) => Self::Gray,
            _ => Self::Rgb,
        }
    }
}

/// Assembles images into a PDF, one image per page, in push order.
///
/// ```ignore
/// let mut assembler = PdfAssembler::new(AssemblyOptions::default());
/// for page in pages {
///     assembler.push(page)?;
/// }
/// assembler.finish("enhanced_scan.pdf")?;
/// ```
pub struct PdfAssembler {
    document: Document,
    /// Reserved id of the /Pages node, written in [`PdfAssembler::to_bytes`].
    pages_id: ObjectId,
    page_ids: Vec<ObjectId>,
    /// Images waiting to be encoded.
    pending: Vec<DynamicImage>,
    options: AssemblyOptions,
    title: Option<String>,
}

impl PdfAssembler {
    pub fn new(options: AssemblyOptions) -> Self {
        let mut document = Document::with_version("1.5");
        let pages_id = document.new_object_id();
        Self {
            document,
            pages_id,
            page_ids: Vec::new(),
            pending: Vec::new(),
            options,
            title: None,
        }
    }

    /// Set a title for the PDF metadata.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    /// Pages added so far, encoded or still queued.
    pub fn page_count(&self) -> usize {
        self.page_ids.len() + self.pending.len()
    }

    /// Queue an image as the next page. A full batch is encoded immediately.
    pub fn push(&mut self, image: DynamicImage) -> Result<(), MonoscanError> {
        self.pending.push(image);
        if self.pending.len() >= self.options.batch_size.max(1) {
            self.flush()?;
        }
        Ok(())
    }

    /// Encode every queued image into page objects.
    #[instrument(skip(self), fields(pending = self.pending.len()))]
    pub fn flush(&mut self) -> Result<(), MonoscanError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let batch = std::mem::take(&mut self.pending);
        let batch_len = batch.len();
        for image in batch {
            self.encode_page(image)?;
        }
        debug!(batch_len, total = self.page_ids.len(), "Batch of pages encoded");
        Ok(())
    }

    /// Finish the document and serialise it.
    #[instrument(skip(self), fields(pages = self.page_count()))]
    pub fn to_bytes(mut self) -> Result<Vec<u8>, MonoscanError> {
        self.flush()?;
        if self.page_ids.is_empty() {
            return Err(MonoscanError::NothingToAssemble);
        }

        let kids: Vec<Object> = self.page_ids.iter().map(|id| Object::Reference(*id)).collect();
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(self.page_ids.len() as i64),
        };
        self.document
            .objects
            .insert(self.pages_id, Object::Dictionary(pages));

        let catalog_id = self.document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.document.trailer.set("Root", catalog_id);

        if let Some(title) = self.title.take() {
            let info_id = self.document.add_object(dictionary! {
                "Title" => Object::string_literal(title),
                "Producer" => Object::string_literal("monoscan"),
            });
            self.document.trailer.set("Info", info_id);
        }

        self.document.compress();

        let mut output = Vec::new();
        self.document.save_to(&mut output).map_err(|err| {
            MonoscanError::PdfError(format!("failed to serialise PDF: {}", err))
        })?;
        Ok(output)
    }

    /// Finish the document and write it to `path`. Returns the page count.
    pub fn finish(self, path: impl AsRef<Path>) -> Result<usize, MonoscanError> {
        let pages = self.page_count();
        let bytes = self.to_bytes()?;
        std::fs::write(path.as_ref(), &bytes)?;
        info!(pages, bytes = bytes.len(), "Wrote PDF to {}", path.as_ref().display());
        Ok(pages)
    }

    // -- Helpers --------------------------------------------------------------

    /// Add the image XObject, its content stream and the page dictionary.
    fn encode_page(&mut self, image: DynamicImage) -> Result<(), MonoscanError> {
        let (width, height) = (image.width(), image.height());
        let encoding = PageEncoding::for_image(&image);

        let (color_space, bits, samples) = match encoding {
            PageEncoding::Bilevel => ("DeviceGray", 1, pack_bilevel(&image.to_luma8())),
            PageEncoding::Gray => ("DeviceGray", 8, image.into_luma8().into_raw()),
            PageEncoding::Rgb => ("DeviceRGB", 8, image.into_rgb8().into_raw()),
        };

        let mut image_stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => Object::Integer(i64::from(width)),
                "Height" => Object::Integer(i64::from(height)),
                "ColorSpace" => color_space,
                "BitsPerComponent" => Object::Integer(bits),
            },
            samples,
        );
        // Only the Flate-encoded samples stay in memory until the file is written.
        image_stream.compress().map_err(|err| {
            MonoscanError::PdfError(format!("failed to compress page image: {}", err))
        })?;
        let image_id = self.document.add_object(image_stream);

        // Page size in points from the pixel size at the configured DPI.
        let page_w = width as f32 * 72.0 / self.options.dpi;
        let page_h = height as f32 * 72.0 / self.options.dpi;

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        Object::Real(page_w),
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Real(page_h),
                        Object::Integer(0),
                        Object::Integer(0),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(IMAGE_NAME.to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_bytes = content.encode().map_err(|err| {
            MonoscanError::PdfError(format!("failed to encode page content: {}", err))
        })?;
        let content_id = self
            .document
            .add_object(Stream::new(lopdf::Dictionary::new(), content_bytes));

        let mut xobjects = lopdf::Dictionary::new();
        xobjects.set(IMAGE_NAME, Object::Reference(image_id));

        let page_id = self.document.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(page_w),
                Object::Real(page_h),
            ],
            "Contents" => content_id,
            "Resources" => dictionary! { "XObject" => xobjects },
        });
        self.page_ids.push(page_id);

        debug!(width, height, ?encoding, page_w, page_h, "Page encoded");
        Ok(())
    }
}

/// Whether every pixel is pure black or pure white.
pub fn is_bilevel(gray: &GrayImage) -> bool {
    gray.pixels().all(|p| p.0[0] == 0x00 || p.0[0] == 0xff)
}

/// Pack a black-and-white image into 1-bit rows (1 = white), each row padded
/// to a whole byte.
fn pack_bilevel(gray: &GrayImage) -> Vec<u8> {
    let (width, height) = gray.dimensions();
    let row_bytes = (width as usize).div_ceil(8);
    let mut packed = vec![0u8; row_bytes * height as usize];

    for (x, y, pixel) in gray.enumerate_pixels() {
        if pixel.0[0] >= 0x80 {
            let index = y as usize * row_bytes + x as usize / 8;
            packed[index] |= 0x80 >> (x % 8);
        }
    }
    packed
}
