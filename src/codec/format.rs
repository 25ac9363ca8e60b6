//! Raster formats accepted by the codec and their detection.

use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File extensions the upload handler is allowed to hand to the pipeline.
pub const SUPPORTED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "tiff"];

/// Raster formats the codec decodes and encodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RasterFormat {
    /// Portable Network Graphics (lossless)
    Png,
    /// JPEG (lossy, honours the quality setting)
    Jpeg,
    /// TIFF (lossless)
    Tiff,
}

impl RasterFormat {
    /// Maps an `image` crate format onto a supported raster format.
    pub fn from_image_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Png => Some(RasterFormat::Png),
            ImageFormat::Jpeg => Some(RasterFormat::Jpeg),
            ImageFormat::Tiff => Some(RasterFormat::Tiff),
            _ => None,
        }
    }

    /// Returns the matching `image` crate format.
    pub fn image_format(self) -> ImageFormat {
        match self {
            RasterFormat::Png => ImageFormat::Png,
            RasterFormat::Jpeg => ImageFormat::Jpeg,
            RasterFormat::Tiff => ImageFormat::Tiff,
        }
    }

    /// Derives a format from a path's extension, case-insensitively.
    ///
    /// Only the extensions in [`SUPPORTED_EXTENSIONS`] are recognized; `tif` is
    /// not, matching the upload contract.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "png" => Some(RasterFormat::Png),
            "jpg" | "jpeg" => Some(RasterFormat::Jpeg),
            "tiff" => Some(RasterFormat::Tiff),
            _ => None,
        }
    }

    /// Detects the format from the leading magic bytes of an encoded image.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        image::guess_format(bytes)
            .ok()
            .and_then(Self::from_image_format)
    }

    /// Whether encoding in this format discards information.
    pub fn is_lossy(self) -> bool {
        matches!(self, RasterFormat::Jpeg)
    }
}

impl std::fmt::Display for RasterFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RasterFormat::Png => "png",
            RasterFormat::Jpeg => "jpeg",
            RasterFormat::Tiff => "tiff",
        };
        f.write_str(name)
    }
}

/// Returns true if `path` carries one of the accepted upload extensions.
pub fn is_supported_extension(path: &Path) -> bool {
    RasterFormat::from_path(path).is_some()
}
