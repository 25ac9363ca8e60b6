//! Image codec adapter.
//!
//! Decoding inspects the file's magic bytes rather than trusting its name: the
//! extension is only a hint, and a recognized extension that disagrees with the
//! content is rejected. Encoding writes through [`atomic_write`] so a reader never
//! sees a half-written file.

pub mod format;

pub use format::{RasterFormat, SUPPORTED_EXTENSIONS, is_supported_extension};

use crate::core::{ForensicsError, ForensicsResult};
use crate::utils::atomic_write;
use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::tiff::TiffEncoder;
use std::io::Cursor;
use std::path::Path;

const MEMORY: &str = "<memory>";

/// Loads and decodes the image at `path`.
///
/// # Errors
///
/// Returns [`ForensicsError::Decode`] if the file is missing, unreadable, empty,
/// not a png/jpeg/tiff image, named with an extension that contradicts its
/// content, or corrupt.
pub fn load(path: &Path) -> ForensicsResult<DynamicImage> {
    let bytes = std::fs::read(path)
        .map_err(|e| ForensicsError::decode_error_with_source(path, "failed to read file", e))?;
    decode(&bytes, RasterFormat::from_path(path), path)
}

/// Decodes an in-memory image.
///
/// `hint` is the format suggested by the file name, if any; `origin` is only used
/// in error messages.
pub fn decode(
    bytes: &[u8],
    hint: Option<RasterFormat>,
    origin: &Path,
) -> ForensicsResult<DynamicImage> {
    if bytes.is_empty() {
        return Err(ForensicsError::decode_error(origin, "file is empty"));
    }

    let detected = RasterFormat::sniff(bytes).ok_or_else(|| {
        ForensicsError::decode_error(origin, "content is not a supported raster format")
    })?;

    if let Some(hint) = hint.filter(|hint| *hint != detected) {
        return Err(ForensicsError::decode_error(
            origin,
            format!("extension suggests {hint} but content is {detected}"),
        ));
    }

    image::load_from_memory_with_format(bytes, detected.image_format()).map_err(|e| {
        ForensicsError::decode_error_with_source(origin, format!("corrupt {detected} data"), e)
    })
}

/// Encodes `image` into memory.
///
/// `quality` (1-100) is used by the JPEG encoder only; other formats accept and
/// ignore it. JPEG output drops any alpha channel.
pub fn encode(
    image: &DynamicImage,
    format: RasterFormat,
    quality: u8,
) -> ForensicsResult<Vec<u8>> {
    let mut buffer = Vec::new();
    let result = match format {
        RasterFormat::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
            match image {
                DynamicImage::ImageRgb8(_) | DynamicImage::ImageLuma8(_) => {
                    image.write_with_encoder(encoder)
                }
                other => DynamicImage::ImageRgb8(other.to_rgb8()).write_with_encoder(encoder),
            }
        }
        RasterFormat::Png => image.write_with_encoder(PngEncoder::new(&mut buffer)),
        RasterFormat::Tiff => {
            image.write_with_encoder(TiffEncoder::new(Cursor::new(&mut buffer)))
        }
    };
    result.map_err(|e| {
        ForensicsError::encode_error(MEMORY, format!("{format} encoding failed"), e)
    })?;
    Ok(buffer)
}

/// Encodes `image` in the format named by `path`'s extension and writes it
/// atomically.
///
/// # Errors
///
/// Returns [`ForensicsError::Encode`] if the extension is not a supported format,
/// encoding fails, or the file cannot be written.
pub fn save(image: &DynamicImage, path: &Path, quality: u8) -> ForensicsResult<()> {
    let format = RasterFormat::from_path(path).ok_or_else(|| ForensicsError::Encode {
        path: path.display().to_string(),
        reason: "extension does not name a supported raster format".to_string(),
        source: None,
    })?;
    save_as(image, path, format, quality)
}

/// Like [`save`], with an explicit format.
pub fn save_as(
    image: &DynamicImage,
    path: &Path,
    format: RasterFormat,
    quality: u8,
) -> ForensicsResult<()> {
    let bytes = encode(image, format, quality).map_err(|e| match e {
        ForensicsError::Encode { reason, source, .. } => ForensicsError::Encode {
            path: path.display().to_string(),
            reason,
            source,
        },
        other => other,
    })?;
    atomic_write(path, &bytes)
        .map_err(|e| ForensicsError::encode_error(path, "failed to write file", e))?;
    tracing::debug!(path = %path.display(), %format, bytes = bytes.len(), "image written");
    Ok(())
}
