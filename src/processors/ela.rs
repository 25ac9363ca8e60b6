//! Error level analysis.
//!
//! Regions of an image that were edited after its last lossy save re-encode
//! differently from untouched regions. The engine recompresses the image at a
//! pinned JPEG quality, takes the per-channel absolute difference against the
//! original and amplifies it so those regions become visible.
//!
//! The quality and amplification constants are part of the classifier's training
//! preprocessing. Changing them without retraining makes confidences meaningless.

use crate::codec::{self, RasterFormat};
use crate::core::config::{ConfigError, ConfigValidator};
use crate::core::{ForensicsError, ForensicsResult};
use image::{DynamicImage, RgbImage};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// JPEG quality used for the recompression pass.
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Multiplier applied to raw differences in [`Amplification::Fixed`] mode.
pub const DEFAULT_AMPLIFICATION: f32 = 15.0;

/// Images with at least this many channel samples are diffed on the rayon pool.
const PARALLEL_DIFF_THRESHOLD: usize = 1 << 16;

/// How raw differences are stretched into the visible range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Amplification {
    /// Multiply by a constant factor, saturating at 255.
    Fixed {
        /// The multiplier.
        factor: f32,
    },
    /// Stretch so the largest difference maps to 255 (`factor = 255 / max_diff`,
    /// with `max_diff = 0` treated as 1).
    MaxNormalized,
}

impl Default for Amplification {
    fn default() -> Self {
        Amplification::Fixed {
            factor: DEFAULT_AMPLIFICATION,
        }
    }
}

impl Amplification {
    /// Resolves the multiplier for an image whose largest raw difference is
    /// `max_difference`.
    pub fn factor(&self, max_difference: u8) -> f32 {
        match *self {
            Amplification::Fixed { factor } => factor,
            Amplification::MaxNormalized => 255.0 / f32::from(max_difference.max(1)),
        }
    }
}

/// Configuration for the ELA transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElaConfig {
    /// JPEG quality of the recompression pass (1-100)
    pub quality: u8,
    /// Difference amplification
    pub amplification: Amplification,
}

impl Default for ElaConfig {
    fn default() -> Self {
        Self {
            quality: DEFAULT_JPEG_QUALITY,
            amplification: Amplification::default(),
        }
    }
}

impl ConfigValidator for ElaConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.validate_u8_range(self.quality, 1, 100, "ELA JPEG quality")?;
        if let Amplification::Fixed { factor } = self.amplification {
            self.validate_positive_f32(factor, "ELA amplification factor")?;
        }
        Ok(())
    }

    fn get_defaults() -> Self {
        Self::default()
    }
}

/// Output of one ELA transform.
#[derive(Debug, Clone, PartialEq)]
pub struct ElaImage {
    /// Amplified difference image, same dimensions as the source.
    pub image: RgbImage,
    /// Largest raw (unamplified) per-channel difference.
    pub max_difference: u8,
}

impl ElaImage {
    /// Returns the amplified image as a [`DynamicImage`].
    pub fn to_dynamic(&self) -> DynamicImage {
        DynamicImage::ImageRgb8(self.image.clone())
    }

    /// Consumes the output, returning the amplified image as a [`DynamicImage`].
    pub fn into_dynamic(self) -> DynamicImage {
        DynamicImage::ImageRgb8(self.image)
    }
}

/// The ELA transform engine.
#[derive(Debug, Clone)]
pub struct ElaEngine {
    config: ElaConfig,
}

impl ElaEngine {
    /// Creates an engine after validating `config`.
    pub fn new(config: ElaConfig) -> ForensicsResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Returns the pinned configuration.
    pub fn config(&self) -> &ElaConfig {
        &self.config
    }

    /// Runs ELA on an in-memory image.
    ///
    /// Any alpha channel is dropped before recompression.
    ///
    /// # Errors
    ///
    /// * [`ForensicsError::Transform`] if the image has zero area or the
    ///   recompressed copy comes back with different dimensions.
    /// * [`ForensicsError::Encode`] / [`ForensicsError::Decode`] if the
    ///   in-memory JPEG round trip fails.
    pub fn transform(&self, source: &DynamicImage) -> ForensicsResult<ElaImage> {
        let original = source.to_rgb8();
        let (width, height) = original.dimensions();
        if width == 0 || height == 0 {
            return Err(ForensicsError::transform_error(format!(
                "source image has zero area ({width}x{height})"
            )));
        }

        let original = DynamicImage::ImageRgb8(original);
        let jpeg = codec::encode(&original, RasterFormat::Jpeg, self.config.quality)?;
        let recompressed = codec::decode(
            &jpeg,
            Some(RasterFormat::Jpeg),
            Path::new("<recompressed>"),
        )?
        .to_rgb8();

        check_round_trip((width, height), recompressed.dimensions())?;

        let original = original.into_rgb8();
        let mut diff = absolute_difference(original.as_raw(), recompressed.as_raw());
        let max_difference = diff.iter().copied().max().unwrap_or(0);

        let factor = self.config.amplification.factor(max_difference);
        let lut = amplification_table(factor);
        for value in diff.iter_mut() {
            *value = lut[*value as usize];
        }

        debug!(
            width,
            height,
            quality = self.config.quality,
            max_difference,
            factor,
            "ELA transform complete"
        );

        let image = RgbImage::from_raw(width, height, diff).ok_or_else(|| {
            ForensicsError::transform_error("difference buffer does not match image dimensions")
        })?;
        Ok(ElaImage {
            image,
            max_difference,
        })
    }

    /// Loads `source`, runs ELA, and persists the amplified image as a PNG at
    /// `artifact_path`.
    pub fn run(&self, source: &Path, artifact_path: &Path) -> ForensicsResult<ElaImage> {
        let image = codec::load(source)?;
        let ela = self.transform(&image)?;
        codec::save_as(
            &ela.to_dynamic(),
            artifact_path,
            RasterFormat::Png,
            self.config.quality,
        )?;
        Ok(ela)
    }
}

/// Rejects a recompressed copy whose dimensions differ from the source. The
/// difference is only defined pixel for pixel, so nothing is resized.
fn check_round_trip(expected: (u32, u32), actual: (u32, u32)) -> ForensicsResult<()> {
    if expected == actual {
        return Ok(());
    }
    let ((width, height), (rw, rh)) = (expected, actual);
    Err(ForensicsError::transform_error(format!(
        "recompressed image is {rw}x{rh}, expected {width}x{height}"
    )))
}

fn absolute_difference(a: &[u8], b: &[u8]) -> Vec<u8> {
    if a.len() >= PARALLEL_DIFF_THRESHOLD {
        a.par_iter()
            .zip(b.par_iter())
            .map(|(&x, &y)| x.abs_diff(y))
            .collect()
    } else {
        a.iter().zip(b).map(|(&x, &y)| x.abs_diff(y)).collect()
    }
}

fn amplification_table(factor: f32) -> [u8; 256] {
    std::array::from_fn(|d| (d as f32 * factor).round().clamp(0.0, 255.0) as u8)
}
