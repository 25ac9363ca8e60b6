//! Shared fixtures for unit tests: synthetic images, a deterministic stand-in
//! classifier and a counting model loader.

use crate::codec::{self, RasterFormat};
use crate::core::{ForensicsError, ForensicsResult, Tensor2D, Tensor4D};
use crate::models::{Classifier, ModelHandle, ModelLoader, ModelSpec};
use image::{DynamicImage, Rgb, RgbImage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Smooth RGB gradient; survives JPEG recompression almost unchanged.
pub fn gradient_image(width: u32, height: u32) -> RgbImage {
    let wx = width.saturating_sub(1).max(1);
    let hy = height.saturating_sub(1).max(1);
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / wx) as u8,
            (y * 255 / hy) as u8,
            ((x + y) * 255 / (wx + hy)) as u8,
        ])
    })
}

/// Uniform pseudo-random noise from a xorshift generator.
pub fn noise_image(width: u32, height: u32, seed: u64) -> RgbImage {
    let mut state = seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) | 1;
    RgbImage::from_fn(width, height, |_, _| {
        let mut next = || {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state >> 24) as u8
        };
        Rgb([next(), next(), next()])
    })
}

/// Encodes and decodes `image` once as JPEG.
pub fn jpeg_round_trip(image: &RgbImage, quality: u8) -> RgbImage {
    let bytes = codec::encode(&DynamicImage::ImageRgb8(image.clone()), RasterFormat::Jpeg, quality)
        .unwrap();
    codec::decode(&bytes, Some(RasterFormat::Jpeg), Path::new("<test>"))
        .unwrap()
        .to_rgb8()
}

/// Pastes never-compressed noise into the center of a once-compressed image.
pub fn spliced_image(width: u32, height: u32, patch: u32) -> RgbImage {
    let mut base = jpeg_round_trip(&gradient_image(width, height), 90);
    let noise = noise_image(patch, patch, 42);
    let (ox, oy) = ((width - patch) / 2, (height - patch) / 2);
    image::imageops::replace(&mut base, &noise, ox as i64, oy as i64);
    base
}

/// Spec matching the default preprocessing with a placeholder weights path.
pub fn test_spec() -> ModelSpec {
    ModelSpec::new("test-weights.onnx")
}

/// Stand-in classifier: the share of strongly amplified ELA samples drives the
/// tampered probability. Emits probabilities in `[tampered, authentic]` order.
#[derive(Debug, Default)]
pub struct EnergyClassifier;

impl EnergyClassifier {
    /// Share of samples above 0.5 at which the verdict flips.
    pub const FLIP_FRACTION: f32 = 0.01;
}

impl Classifier for EnergyClassifier {
    fn model_name(&self) -> &str {
        "energy-test"
    }

    fn forward(&self, batch: &Tensor4D) -> ForensicsResult<Tensor2D> {
        let batch_size = batch.shape()[0];
        let mut scores = Tensor2D::zeros((batch_size, 2));
        for (i, sample) in batch.outer_iter().enumerate() {
            let hot = sample.iter().filter(|&&v| v > 0.5).count() as f32;
            let fraction = hot / sample.len().max(1) as f32;
            let tampered = (fraction / (2.0 * Self::FLIP_FRACTION)).clamp(0.0, 1.0);
            scores[[i, 0]] = tampered;
            scores[[i, 1]] = 1.0 - tampered;
        }
        Ok(scores)
    }
}

/// Classifier that returns fixed scores regardless of input.
#[derive(Debug)]
pub struct FixedScoresClassifier(pub Vec<f32>);

impl Classifier for FixedScoresClassifier {
    fn model_name(&self) -> &str {
        "fixed-test"
    }

    fn forward(&self, batch: &Tensor4D) -> ForensicsResult<Tensor2D> {
        let rows = batch.shape()[0];
        let cols = self.0.len();
        let data: Vec<f32> = (0..rows).flat_map(|_| self.0.iter().copied()).collect();
        Ok(Tensor2D::from_shape_vec((rows, cols), data)?)
    }
}

/// Builds a handle around `classifier` with the test spec.
pub fn handle_with(classifier: impl Classifier + 'static) -> ModelHandle {
    ModelHandle::new(&test_spec(), Box::new(classifier)).unwrap()
}

/// Loader producing [`EnergyClassifier`] handles while counting loads.
#[derive(Debug, Default)]
pub struct CountingLoader {
    successful: Arc<AtomicUsize>,
    required_file: Option<PathBuf>,
    delay: Option<Duration>,
}

impl CountingLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail with a model load error while `path` does not exist.
    pub fn requiring_file(mut self, path: &Path) -> Self {
        self.required_file = Some(path.to_path_buf());
        self
    }

    /// Sleep inside every load to widen race windows.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Counter of loads that returned a handle.
    pub fn successful_loads(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.successful)
    }
}

impl ModelLoader for CountingLoader {
    fn load(&self, spec: &ModelSpec) -> ForensicsResult<ModelHandle> {
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        if let Some(path) = &self.required_file {
            if !path.is_file() {
                return Err(ForensicsError::model_load_error(
                    path,
                    "weights file not found",
                    None,
                    None::<std::io::Error>,
                ));
            }
        }
        let handle = ModelHandle::new(spec, Box::new(EnergyClassifier))?;
        self.successful.fetch_add(1, Ordering::SeqCst);
        Ok(handle)
    }
}
