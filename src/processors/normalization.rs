//! Image normalization into model input tensors.

use crate::core::{ForensicsResult, Tensor4D};
use crate::core::config::ConfigError;
use crate::processors::types::ChannelOrder;
use image::RgbImage;
use serde::{Deserialize, Serialize};

/// Pinned normalization constants: `value = (pixel * scale - mean) / std`.
///
/// These belong to the trained weights, not to the runtime; the defaults map
/// pixels onto `[0, 1]` with no mean/std shift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Scaling factor applied to raw pixel values
    pub scale: f32,
    /// Per-channel mean (RGB order)
    pub mean: [f32; 3],
    /// Per-channel standard deviation (RGB order)
    pub std: [f32; 3],
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            scale: 1.0 / 255.0,
            mean: [0.0, 0.0, 0.0],
            std: [1.0, 1.0, 1.0],
        }
    }
}

/// Normalizes RGB images into batch-of-one tensors.
#[derive(Debug, Clone)]
pub struct NormalizeImage {
    /// Scaling factors for each channel (alpha = scale / std)
    alpha: [f32; 3],
    /// Offset values for each channel (beta = -mean / std)
    beta: [f32; 3],
    /// Channel ordering (CHW or HWC)
    order: ChannelOrder,
}

impl NormalizeImage {
    /// Creates a normalizer from pinned constants.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `scale` or any `std` entry is not a
    /// finite positive number, or any `mean` entry is not finite.
    pub fn new(config: &NormalizeConfig, order: ChannelOrder) -> ForensicsResult<Self> {
        if !config.scale.is_finite() || config.scale <= 0.0 {
            return Err(ConfigError::InvalidConfig {
                message: format!("Scale must be greater than 0, got {}", config.scale),
            }
            .into());
        }

        for (i, &s) in config.std.iter().enumerate() {
            if !s.is_finite() || s <= 0.0 {
                return Err(ConfigError::InvalidConfig {
                    message: format!(
                        "Standard deviation at index {i} must be greater than 0, got {s}"
                    ),
                }
                .into());
            }
        }

        if let Some((i, m)) = config.mean.iter().enumerate().find(|(_, m)| !m.is_finite()) {
            return Err(ConfigError::InvalidConfig {
                message: format!("Mean at index {i} is not finite: {m}"),
            }
            .into());
        }

        let alpha = std::array::from_fn(|c| config.scale / config.std[c]);
        let beta = std::array::from_fn(|c| -config.mean[c] / config.std[c]);
        Ok(Self { alpha, beta, order })
    }

    /// Returns the channel order of produced tensors.
    pub fn order(&self) -> ChannelOrder {
        self.order
    }

    /// Normalizes one image into a `(1, C, H, W)` or `(1, H, W, C)` tensor.
    pub fn normalize_to_tensor(&self, img: &RgbImage) -> Tensor4D {
        let (width, height) = img.dimensions();
        let (w, h) = (width as usize, height as usize);

        match self.order {
            ChannelOrder::CHW => {
                let mut tensor = Tensor4D::zeros((1, 3, h, w));
                for (x, y, pixel) in img.enumerate_pixels() {
                    for c in 0..3 {
                        tensor[[0, c, y as usize, x as usize]] =
                            pixel[c] as f32 * self.alpha[c] + self.beta[c];
                    }
                }
                tensor
            }
            ChannelOrder::HWC => {
                let mut tensor = Tensor4D::zeros((1, h, w, 3));
                for (x, y, pixel) in img.enumerate_pixels() {
                    for c in 0..3 {
                        tensor[[0, y as usize, x as usize, c]] =
                            pixel[c] as f32 * self.alpha[c] + self.beta[c];
                    }
                }
                tensor
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_default_maps_to_unit_range() {
        let normalizer =
            NormalizeImage::new(&NormalizeConfig::default(), ChannelOrder::HWC).unwrap();
        let mut img = RgbImage::new(2, 1);
        img.put_pixel(0, 0, Rgb([0, 255, 51]));
        img.put_pixel(1, 0, Rgb([255, 0, 102]));

        let tensor = normalizer.normalize_to_tensor(&img);
        assert_eq!(tensor.shape(), &[1, 1, 2, 3]);
        assert_eq!(tensor[[0, 0, 0, 0]], 0.0);
        assert!((tensor[[0, 0, 0, 1]] - 1.0).abs() < 1e-6);
        assert!((tensor[[0, 0, 0, 2]] - 0.2).abs() < 1e-6);
        assert!((tensor[[0, 0, 1, 0]] - 1.0).abs() < 1e-6);
        assert!((tensor[[0, 0, 1, 2]] - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_chw_layout() {
        let normalizer =
            NormalizeImage::new(&NormalizeConfig::default(), ChannelOrder::CHW).unwrap();
        let img = RgbImage::from_pixel(3, 2, Rgb([255, 0, 0]));

        let tensor = normalizer.normalize_to_tensor(&img);
        assert_eq!(tensor.shape(), &[1, 3, 2, 3]);
        assert!((tensor[[0, 0, 1, 2]] - 1.0).abs() < 1e-6);
        assert_eq!(tensor[[0, 1, 1, 2]], 0.0);
    }

    #[test]
    fn test_mean_std_applied() {
        let config = NormalizeConfig {
            scale: 1.0 / 255.0,
            mean: [0.5, 0.5, 0.5],
            std: [0.5, 0.5, 0.5],
        };
        let normalizer = NormalizeImage::new(&config, ChannelOrder::HWC).unwrap();
        let img = RgbImage::from_pixel(1, 1, Rgb([0, 255, 0]));

        let tensor = normalizer.normalize_to_tensor(&img);
        assert!((tensor[[0, 0, 0, 0]] + 1.0).abs() < 1e-6);
        assert!((tensor[[0, 0, 0, 1]] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_constants_rejected() {
        let zero_scale = NormalizeConfig {
            scale: 0.0,
            ..Default::default()
        };
        assert!(NormalizeImage::new(&zero_scale, ChannelOrder::HWC).is_err());

        let zero_std = NormalizeConfig {
            std: [1.0, 0.0, 1.0],
            ..Default::default()
        };
        assert!(NormalizeImage::new(&zero_std, ChannelOrder::HWC).is_err());

        let nan_mean = NormalizeConfig {
            mean: [0.0, f32::NAN, 0.0],
            ..Default::default()
        };
        assert!(NormalizeImage::new(&nan_mean, ChannelOrder::HWC).is_err());
    }
}
