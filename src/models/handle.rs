//! Model metadata and the immutable handle handed out by the registry.

use crate::core::config::{ConfigError, ConfigValidator, ModelInferenceConfig};
use crate::core::{ForensicsResult, Tensor2D, Tensor4D};
use crate::domain::Label;
use crate::models::classifier::Classifier;
use crate::processors::{ChannelOrder, NormalizeConfig, NormalizeImage, ResizeFilter};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default weights location, relative to the working directory.
///
/// The weights found here must have been trained on the default ELA constants
/// (quality 90, fixed ×15 amplification). CASIA weights trained on the
/// max-normalized stretch are configured through [`crate::core::AnalysisConfig::casia`].
pub const DEFAULT_WEIGHTS_PATH: &str = "models/ela_classifier.onnx";

/// Default model input (height, width).
pub const DEFAULT_INPUT_SHAPE: (u32, u32) = (128, 128);

/// Mapping from output index to verdict label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelMap(Vec<Label>);

impl LabelMap {
    /// Creates a label map from output-index order.
    pub fn new(labels: Vec<Label>) -> Self {
        Self(labels)
    }

    /// Label of output `index`.
    pub fn label_for(&self, index: usize) -> Option<Label> {
        self.0.get(index).copied()
    }

    /// Number of classes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for LabelMap {
    /// Index 0 is the tampered class and index 1 the authentic class.
    fn default() -> Self {
        Self(vec![Label::Tampered, Label::Authentic])
    }
}

/// What the model's final layer emits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreActivation {
    /// Normalized probabilities (softmax already applied in the graph).
    #[default]
    Probabilities,
    /// Raw logits; softmax is applied before reporting.
    Logits,
}

/// Everything needed to load a classifier and feed it correctly.
///
/// Apart from `weights_path` and `inference`, every field is part of the
/// model's training-time contract and must match the deployed weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSpec {
    /// Path to the ONNX weights file
    pub weights_path: PathBuf,
    /// Model input (height, width)
    pub input_shape: (u32, u32),
    /// Input tensor layout
    pub channel_order: ChannelOrder,
    /// Pixel normalization constants
    pub normalize: NormalizeConfig,
    /// Filter used to resize ELA images to `input_shape`
    pub resize_filter: ResizeFilter,
    /// Output index to label mapping
    pub labels: LabelMap,
    /// Whether outputs are probabilities or logits
    pub score_activation: ScoreActivation,
    /// Runtime settings
    pub inference: ModelInferenceConfig,
}

impl Default for ModelSpec {
    fn default() -> Self {
        Self {
            weights_path: PathBuf::from(DEFAULT_WEIGHTS_PATH),
            input_shape: DEFAULT_INPUT_SHAPE,
            channel_order: ChannelOrder::default(),
            normalize: NormalizeConfig::default(),
            resize_filter: ResizeFilter::default(),
            labels: LabelMap::default(),
            score_activation: ScoreActivation::default(),
            inference: ModelInferenceConfig::default(),
        }
    }
}

impl ModelSpec {
    /// Creates a spec with default preprocessing for the given weights.
    pub fn new(weights_path: impl Into<PathBuf>) -> Self {
        Self {
            weights_path: weights_path.into(),
            ..Self::default()
        }
    }

    /// Sets the model input (height, width).
    pub fn with_input_shape(mut self, height: u32, width: u32) -> Self {
        self.input_shape = (height, width);
        self
    }

    /// Sets the label order.
    pub fn with_labels(mut self, labels: LabelMap) -> Self {
        self.labels = labels;
        self
    }

    /// Sets the score activation.
    pub fn with_score_activation(mut self, activation: ScoreActivation) -> Self {
        self.score_activation = activation;
        self
    }

    /// Sets the runtime settings.
    pub fn with_inference(mut self, inference: ModelInferenceConfig) -> Self {
        self.inference = inference;
        self
    }
}

impl ConfigValidator for ModelSpec {
    fn validate(&self) -> Result<(), ConfigError> {
        let (height, width) = self.input_shape;
        self.validate_image_dimensions(width, height)?;

        if self.labels.len() != 2 {
            return Err(ConfigError::InvalidConfig {
                message: format!(
                    "label map must name exactly two classes, got {}",
                    self.labels.len()
                ),
            });
        }
        if self.labels.label_for(0) == self.labels.label_for(1) {
            return Err(ConfigError::InvalidConfig {
                message: "label map must contain both AUTHENTIC and TAMPERED".to_string(),
            });
        }

        self.inference.validate()
    }

    fn get_defaults() -> Self {
        Self::default()
    }
}

/// A loaded classifier plus its fixed preprocessing and label mapping.
///
/// Built once by the registry and shared read-only afterwards.
#[derive(Debug)]
pub struct ModelHandle {
    classifier: Box<dyn Classifier>,
    weights_path: PathBuf,
    input_shape: (u32, u32),
    normalizer: NormalizeImage,
    resize_filter: ResizeFilter,
    labels: LabelMap,
    score_activation: ScoreActivation,
}

impl ModelHandle {
    /// Wraps a loaded classifier with the preprocessing contract from `spec`.
    pub fn new(spec: &ModelSpec, classifier: Box<dyn Classifier>) -> ForensicsResult<Self> {
        spec.validate()?;
        let normalizer = NormalizeImage::new(&spec.normalize, spec.channel_order)?;
        Ok(Self {
            classifier,
            weights_path: spec.weights_path.clone(),
            input_shape: spec.input_shape,
            normalizer,
            resize_filter: spec.resize_filter,
            labels: spec.labels.clone(),
            score_activation: spec.score_activation,
        })
    }

    /// Name of the underlying model.
    pub fn model_name(&self) -> &str {
        self.classifier.model_name()
    }

    /// Path the weights were loaded from.
    pub fn weights_path(&self) -> &Path {
        &self.weights_path
    }

    /// Model input (height, width).
    pub fn input_shape(&self) -> (u32, u32) {
        self.input_shape
    }

    /// Normalizer bound to the model's pinned constants.
    pub fn normalizer(&self) -> &NormalizeImage {
        &self.normalizer
    }

    /// Resize filter used to reach `input_shape`.
    pub fn resize_filter(&self) -> ResizeFilter {
        self.resize_filter
    }

    /// Output index to label mapping.
    pub fn labels(&self) -> &LabelMap {
        &self.labels
    }

    /// Activation of the model's outputs.
    pub fn score_activation(&self) -> ScoreActivation {
        self.score_activation
    }

    /// Runs the classifier.
    pub fn forward(&self, batch: &Tensor4D) -> ForensicsResult<Tensor2D> {
        self.classifier.forward(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_spec_preprocessing() {
        let spec = ModelSpec::default();
        assert_eq!(spec.input_shape, (128, 128));
        assert_eq!(spec.channel_order, ChannelOrder::HWC);
        assert_eq!(spec.labels.label_for(0), Some(Label::Tampered));
        assert_eq!(spec.labels.label_for(1), Some(Label::Authentic));
        assert_eq!(spec.score_activation, ScoreActivation::Probabilities);
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn test_label_map_must_have_both_classes() {
        let spec = ModelSpec::default()
            .with_labels(LabelMap::new(vec![Label::Authentic, Label::Authentic]));
        assert!(spec.validate().is_err());

        let spec = ModelSpec::default().with_labels(LabelMap::new(vec![Label::Authentic]));
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_zero_input_shape_rejected() {
        let spec = ModelSpec::default().with_input_shape(0, 128);
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_spec_deserializes_with_defaults() {
        let spec: ModelSpec = serde_json::from_str(
            r#"{
                "weights_path": "weights/ela.onnx",
                "labels": ["AUTHENTIC", "TAMPERED"],
                "score_activation": "logits"
            }"#,
        )
        .unwrap();
        assert_eq!(spec.weights_path, PathBuf::from("weights/ela.onnx"));
        assert_eq!(spec.input_shape, DEFAULT_INPUT_SHAPE);
        assert_eq!(spec.labels.label_for(0), Some(Label::Authentic));
        assert_eq!(spec.score_activation, ScoreActivation::Logits);
    }
}
