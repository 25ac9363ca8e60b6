//! Tampering classifier over ELA images.
//!
//! Turns an ELA image into a [`Verdict`] using the shared model handle: resize to
//! the model's fixed input, normalize with the pinned constants, run the forward
//! pass and map the highest-scoring class to its label.

use crate::core::{ForensicsError, ForensicsResult, Tensor2D, Tensor4D};
use crate::domain::Verdict;
use crate::models::{ModelHandle, ModelRegistry, ScoreActivation};
use image::DynamicImage;
use image::imageops::{self, FilterType};
use std::sync::Arc;
use tracing::debug;

/// Classifies ELA images with the registry's model.
#[derive(Debug, Clone)]
pub struct TamperClassifier {
    registry: Arc<ModelRegistry>,
}

impl TamperClassifier {
    /// Creates a classifier backed by `registry`. The model is loaded on the
    /// first call to [`TamperClassifier::classify`].
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self { registry }
    }

    /// The registry supplying the model handle.
    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    /// Classifies one ELA image.
    ///
    /// # Errors
    ///
    /// * [`ForensicsError::ModelLoad`] if the model cannot be loaded.
    /// * [`ForensicsError::Preprocess`] if the image has zero area or is not RGB.
    /// * [`ForensicsError::Inference`] if the forward pass fails or returns
    ///   unusable scores.
    pub fn classify(&self, ela_image: &DynamicImage) -> ForensicsResult<Verdict> {
        let handle = self.registry.get_handle()?;
        Self::classify_with(ela_image, &handle)
    }

    /// Classifies one ELA image with an already loaded handle.
    pub fn classify_with(
        ela_image: &DynamicImage,
        handle: &ModelHandle,
    ) -> ForensicsResult<Verdict> {
        let batch = Self::preprocess(ela_image, handle)?;
        let scores = handle.forward(&batch)?;
        let verdict = Self::scores_to_verdict(&scores, handle)?;
        debug!(
            model = handle.model_name(),
            label = %verdict.label,
            confidence = verdict.confidence,
            "classified ELA image"
        );
        Ok(verdict)
    }

    /// Resizes and normalizes `ela_image` into a batch of one.
    pub fn preprocess(ela_image: &DynamicImage, handle: &ModelHandle) -> ForensicsResult<Tensor4D> {
        let (width, height) = (ela_image.width(), ela_image.height());
        if width == 0 || height == 0 {
            return Err(ForensicsError::preprocess_error(format!(
                "ELA image has zero area ({width}x{height})"
            )));
        }
        let DynamicImage::ImageRgb8(rgb) = ela_image else {
            return Err(ForensicsError::preprocess_error(format!(
                "expected an 8-bit RGB ELA image, got {:?}",
                ela_image.color()
            )));
        };

        let (target_h, target_w) = handle.input_shape();
        let tensor = if (width, height) == (target_w, target_h) {
            handle.normalizer().normalize_to_tensor(rgb)
        } else {
            let filter: FilterType = handle.resize_filter().into();
            let resized = imageops::resize(rgb, target_w, target_h, filter);
            handle.normalizer().normalize_to_tensor(&resized)
        };
        Ok(tensor)
    }

    /// Maps one row of class scores to a verdict.
    ///
    /// The highest score wins, ties going to the lowest index. Logits are passed
    /// through softmax first; probabilities are clamped to `[0, 1]`.
    pub fn scores_to_verdict(scores: &Tensor2D, handle: &ModelHandle) -> ForensicsResult<Verdict> {
        let model = handle.model_name();
        let labels = handle.labels();

        if scores.nrows() != 1 {
            return Err(ForensicsError::invalid_output(
                model,
                format!("expected scores for one image, got {}", scores.nrows()),
            ));
        }
        if scores.ncols() != labels.len() {
            return Err(ForensicsError::invalid_output(
                model,
                format!(
                    "model returned {} classes but the label map has {}",
                    scores.ncols(),
                    labels.len()
                ),
            ));
        }

        let raw: Vec<f32> = scores.row(0).to_vec();
        if let Some(bad) = raw.iter().find(|v| !v.is_finite()) {
            return Err(ForensicsError::invalid_output(
                model,
                format!("non-finite score {bad}"),
            ));
        }

        let probabilities = match handle.score_activation() {
            ScoreActivation::Probabilities => raw.iter().map(|v| v.clamp(0.0, 1.0)).collect(),
            ScoreActivation::Logits => softmax(&raw),
        };

        let (index, confidence) = argmax(&probabilities).ok_or_else(|| {
            ForensicsError::invalid_output(model, "model returned no scores")
        })?;
        let label = labels.label_for(index).ok_or_else(|| {
            ForensicsError::invalid_output(model, format!("no label for class {index}"))
        })?;
        Ok(Verdict::new(label, confidence))
    }
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|v| (v - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|v| v / sum).collect()
}

/// First index of the maximum value.
fn argmax(values: &[f32]) -> Option<(usize, f32)> {
    values
        .iter()
        .copied()
        .enumerate()
        .fold(None, |best, (i, v)| match best {
            Some((_, b)) if b >= v => best,
            _ => Some((i, v)),
        })
}
