// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader: open existing PDF documents with the `lopdf` crate and pull the
// embedded scan image out of each page.

use std::path::Path;

use image::{DynamicImage, GrayImage, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use monoscan_core::error::MonoscanError;
use tracing::{debug, info, instrument, warn};

/// Guards the walk up the page tree when looking for inherited resources.
const MAX_TREE_DEPTH: usize = 32;

/// Reads existing PDF files and extracts the raster image of each page.
///
/// Wraps `lopdf::Document`. Each page is expected to carry its scan as an
/// image XObject; when a page holds several images the largest one is used.
pub struct PdfReader {
    document: Document,
}

/// A decoded page image together with where it came from.
#[derive(Debug, Clone)]
pub struct ExtractedImage {
    /// 1-indexed page number.
    pub page_number: u32,
    /// Object id of the image XObject inside the source PDF.
    pub object_id: ObjectId,
    pub image: DynamicImage,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, MonoscanError> {
        let path_ref = path.as_ref();
        info!("Opening PDF: {}", path_ref.display());

        let document = Document::load(path_ref).map_err(|err| {
            MonoscanError::PdfError(format!("failed to open {}: {}", path_ref.display(), err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded");

        Ok(Self { document })
    }

    /// Create a reader from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, MonoscanError> {
        let document = Document::load_mem(data).map_err(|err| {
            MonoscanError::PdfError(format!("failed to load PDF from memory: {}", err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");

        Ok(Self { document })
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Page numbers (1-indexed) in page order.
    pub fn page_numbers(&self) -> Vec<u32> {
        self.document.get_pages().keys().copied().collect()
    }

    // -- Extraction -----------------------------------------------------------

    /// Decode the scan image of a single page (1-indexed).
    #[instrument(skip(self))]
    pub fn page_image(&self, page_number: u32) -> Result<ExtractedImage, MonoscanError> {
        let pages = self.document.get_pages();
        let page_id = *pages.get(&page_number).ok_or_else(|| {
            MonoscanError::PdfError(format!(
                "page {} out of range (document has {} pages)",
                page_number,
                pages.len()
            ))
        })?;

        let candidates = image_xobjects(&self.document, page_id)?;
        if candidates.len() > 1 {
            debug!(count = candidates.len(), "Several images on page; using the largest");
        }
        let (object_id, stream) = candidates
            .into_iter()
            .max_by_key(|(_, stream)| pixel_area(&stream.dict))
            .ok_or(MonoscanError::MissingPageImage(page_number))?;

        let image = decode_image_stream(&self.document, stream)?;
        debug!(
            page_number,
            ?object_id,
            width = image.width(),
            height = image.height(),
            color = ?image.color(),
            "Page image decoded"
        );

        Ok(ExtractedImage {
            page_number,
            object_id,
            image,
        })
    }

    /// Decode the scan image of every page, in page order.
    pub fn page_images(&self) -> Result<Vec<ExtractedImage>, MonoscanError> {
        self.page_numbers()
            .into_iter()
            .map(|page_number| self.page_image(page_number))
            .collect()
    }
}

// -- Page tree helpers ----------------------------------------------------------

fn pdf_error(context: &str, err: lopdf::Error) -> MonoscanError {
    MonoscanError::PdfError(format!("{context}: {err}"))
}

/// Follow a single indirect reference, if `object` is one.
fn resolve<'a>(document: &'a Document, object: &'a Object) -> Result<&'a Object, MonoscanError> {
    match object {
        Object::Reference(id) => document
            .get_object(*id)
            .map_err(|err| pdf_error(&format!("cannot resolve {id:?}"), err)),
        other => Ok(other),
    }
}

fn name_str(object: &Object) -> Option<String> {
    match object {
        Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
        _ => None,
    }
}

fn as_number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value as f32),
        _ => None,
    }
}

/// The `/Resources` dictionary of a page, inherited from its ancestors when the
/// page itself has none.
fn page_resources(
    document: &Document,
    page_id: ObjectId,
) -> Result<Option<&Dictionary>, MonoscanError> {
    let mut node = document
        .get_dictionary(page_id)
        .map_err(|err| pdf_error(&format!("cannot read page object {page_id:?}"), err))?;

    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(resources) = node.get(b"Resources") {
            let dict = resolve(document, resources)?
                .as_dict()
                .map_err(|err| pdf_error("/Resources is not a dictionary", err))?;
            return Ok(Some(dict));
        }
        match node.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => {
                node = document
                    .get_dictionary(*parent_id)
                    .map_err(|err| pdf_error("cannot read page tree node", err))?;
            }
            _ => return Ok(None),
        }
    }
    warn!(?page_id, "Page tree too deep while looking for resources");
    Ok(None)
}

/// All image XObjects referenced directly by a page's resources.
fn image_xobjects(
    document: &Document,
    page_id: ObjectId,
) -> Result<Vec<(ObjectId, &Stream)>, MonoscanError> {
    let Some(resources) = page_resources(document, page_id)? else {
        return Ok(Vec::new());
    };
    let Ok(xobjects) = resources.get(b"XObject") else {
        return Ok(Vec::new());
    };
    let xobjects = resolve(document, xobjects)?
        .as_dict()
        .map_err(|err| pdf_error("/XObject is not a dictionary", err))?;

    let mut images = Vec::new();
    for (name, value) in xobjects.iter() {
        let Object::Reference(id) = value else {
            continue;
        };
        let Ok(Object::Stream(stream)) = document.get_object(*id) else {
            warn!(name = %String::from_utf8_lossy(name), "XObject is not a stream; skipped");
            continue;
        };
        let is_image = stream
            .dict
            .get(b"Subtype")
            .ok()
            .and_then(name_str)
            .is_some_and(|subtype| subtype == "Image");
        let is_mask = matches!(stream.dict.get(b"ImageMask"), Ok(Object::Boolean(true)));
        if is_image && !is_mask {
            images.push((*id, stream));
        }
    }
    Ok(images)
}

fn pixel_area(dict: &Dictionary) -> u64 {
    dimension(dict, b"Width") * dimension(dict, b"Height")
}

fn dimension(dict: &Dictionary, key: &[u8]) -> u64 {
    dict.get(key)
        .ok()
        .and_then(as_number)
        .map(|v| v.max(0.0) as u64)
        .unwrap_or(0)
}

// -- Image decoding -------------------------------------------------------------

fn required_dimension(dict: &Dictionary, key: &[u8]) -> Result<u32, MonoscanError> {
    dict.get(key)
        .ok()
        .and_then(as_number)
        .filter(|v| *v >= 1.0)
        .map(|v| v as u32)
        .ok_or_else(|| {
            MonoscanError::UnsupportedImage(format!(
                "image has no valid /{}",
                String::from_utf8_lossy(key)
            ))
        })
}

fn filter_names(document: &Document, dict: &Dictionary) -> Result<Vec<String>, MonoscanError> {
    let Ok(filter) = dict.get(b"Filter") else {
        return Ok(Vec::new());
    };
    let filter = resolve(document, filter)?;
    match filter {
        Object::Name(_) => Ok(name_str(filter).into_iter().collect()),
        Object::Array(items) => items
            .iter()
            .map(|item| {
                resolve(document, item).map(|object| name_str(object).unwrap_or_default())
            })
            .collect(),
        _ => Ok(Vec::new()),
    }
}

/// Number of colour components for the image's `/ColorSpace`.
fn component_count(document: &Document, dict: &Dictionary) -> Result<u32, MonoscanError> {
    let color_space = dict
        .get(b"ColorSpace")
        .map_err(|_| MonoscanError::UnsupportedImage("image has no /ColorSpace".into()))?;
    let color_space = resolve(document, color_space)?;

    let (family, params) = match color_space {
        Object::Name(_) => (name_str(color_space).unwrap_or_default(), None),
        Object::Array(items) if !items.is_empty() => (
            name_str(resolve(document, &items[0])?).unwrap_or_default(),
            items.get(1),
        ),
        _ => (String::new(), None),
    };

    match family.as_str() {
        "DeviceGray" | "CalGray" | "G" => Ok(1),
        "DeviceRGB" | "CalRGB" | "RGB" => Ok(3),
        "DeviceCMYK" | "CMYK" => Ok(4),
        "ICCBased" => {
            let profile = params
                .map(|p| resolve(document, p))
                .transpose()?
                .and_then(|object| object.as_stream().ok())
                .ok_or_else(|| {
                    MonoscanError::UnsupportedImage("ICCBased colour space without profile".into())
                })?;
            profile
                .dict
                .get(b"N")
                .ok()
                .and_then(as_number)
                .map(|n| n as u32)
                .filter(|n| matches!(n, 1 | 3 | 4))
                .ok_or_else(|| {
                    MonoscanError::UnsupportedImage("ICC profile with unsupported /N".into())
                })
        }
        other => Err(MonoscanError::UnsupportedImage(format!(
            "colour space {other:?} is not supported"
        ))),
    }
}

/// Whether a single-component image has an inverting `/Decode [1 0]` array.
fn decode_inverted(dict: &Dictionary) -> bool {
    match dict.get(b"Decode") {
        Ok(Object::Array(range)) if range.len() >= 2 => {
            matches!((as_number(&range[0]), as_number(&range[1])), (Some(lo), Some(hi)) if lo > hi)
        }
        _ => false,
    }
}

/// Decode an image XObject stream into a `DynamicImage`.
fn decode_image_stream(document: &Document, stream: &Stream) -> Result<DynamicImage, MonoscanError> {
    let dict = &stream.dict;
    let filters = filter_names(document, dict)?;

    match filters.last().map(String::as_str) {
        Some("DCTDecode" | "DCT") => {
            if filters.len() > 1 {
                return Err(MonoscanError::UnsupportedImage(format!(
                    "JPEG wrapped in filter chain {filters:?}"
                )));
            }
            return image::load_from_memory_with_format(&stream.content, image::ImageFormat::Jpeg)
                .map_err(|err| {
                    MonoscanError::ImageError(format!("failed to decode JPEG page image: {err}"))
                });
        }
        Some(unsupported @ ("JPXDecode" | "CCITTFaxDecode" | "CCF" | "JBIG2Decode")) => {
            return Err(MonoscanError::UnsupportedImage(format!(
                "{unsupported} images are not supported"
            )));
        }
        _ => {}
    }

    let width = required_dimension(dict, b"Width")?;
    let height = required_dimension(dict, b"Height")?;
    let components = component_count(document, dict)?;
    let bits = dict
        .get(b"BitsPerComponent")
        .ok()
        .and_then(as_number)
        .map(|b| b as u32)
        .unwrap_or(8);

    let data = if filters.is_empty() {
        stream.content.clone()
    } else {
        stream
            .decompressed_content()
            .map_err(|err| pdf_error(&format!("cannot decompress {filters:?} image"), err))?
    };

    let mut samples = unpack_samples(&data, width, height, components, bits)?;
    if components == 1 && decode_inverted(dict) {
        for sample in &mut samples {
            *sample = 255 - *sample;
        }
    }
    samples_to_image(samples, width, height, components)
}

/// Expand packed samples of `bits` width into one byte per sample.
///
/// Rows are padded to a byte boundary as in the PDF image model. Samples of
/// fewer than 8 bits are scaled up to 0..=255; 16-bit samples keep their high
/// byte.
pub(crate) fn unpack_samples(
    data: &[u8],
    width: u32,
    height: u32,
    components: u32,
    bits: u32,
) -> Result<Vec<u8>, MonoscanError> {
    if !matches!(bits, 1 | 2 | 4 | 8 | 16) {
        return Err(MonoscanError::UnsupportedImage(format!(
            "{bits} bits per component"
        )));
    }
    let samples_per_row = width as usize * components as usize;
    let row_bytes = (samples_per_row * bits as usize).div_ceil(8);
    let needed = row_bytes * height as usize;
    if data.len() < needed {
        return Err(MonoscanError::ImageError(format!(
            "image data truncated: expected {needed} bytes, found {}",
            data.len()
        )));
    }

    let mut out = Vec::with_capacity(samples_per_row * height as usize);
    for row in data[..needed].chunks_exact(row_bytes) {
        match bits {
            8 => out.extend_from_slice(&row[..samples_per_row]),
            16 => out.extend(row.chunks_exact(2).take(samples_per_row).map(|pair| pair[0])),
            _ => {
                let max = (1u32 << bits) - 1;
                for i in 0..samples_per_row {
                    let offset = i * bits as usize;
                    let byte = u32::from(row[offset / 8]);
                    let shift = 8 - bits as usize - offset % 8;
                    let value = (byte >> shift) & max;
                    out.push((value * 255 / max) as u8);
                }
            }
        }
    }
    Ok(out)
}

fn samples_to_image(
    samples: Vec<u8>,
    width: u32,
    height: u32,
    components: u32,
) -> Result<DynamicImage, MonoscanError> {
    let mismatch = || MonoscanError::ImageError("sample buffer does not match image size".into());
    match components {
        1 => GrayImage::from_raw(width, height, samples)
            .map(DynamicImage::ImageLuma8)
            .ok_or_else(mismatch),
        3 => RgbImage::from_raw(width, height, samples)
            .map(DynamicImage::ImageRgb8)
            .ok_or_else(mismatch),
        4 => {
            let rgb: Vec<u8> = samples
                .chunks_exact(4)
                .flat_map(|cmyk| {
                    let k = 255 - u32::from(cmyk[3]);
                    let channel = |c: u8| ((255 - u32::from(c)) * k / 255) as u8;
                    [channel(cmyk[0]), channel(cmyk[1]), channel(cmyk[2])]
                })
                .collect();
            RgbImage::from_raw(width, height, rgb)
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(mismatch)
        }
        other => Err(MonoscanError::UnsupportedImage(format!(
            "{other} colour components"
        ))),
    }
}
