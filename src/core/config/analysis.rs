//! Top-level configuration for an analysis deployment.

use crate::core::config::errors::{ConfigError, ConfigValidator};
use crate::domain::DocumentId;
use crate::models::ModelSpec;
use crate::processors::{Amplification, ElaConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Weights file name of the CASIA-trained classifier.
pub const CASIA_WEIGHTS_FILE: &str = "model_casia_run1.onnx";

/// Default directory for ELA artifacts.
pub const DEFAULT_ARTIFACT_DIR: &str = "static/ela";

/// Where ELA artifacts are written when the caller does not choose a path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactConfig {
    /// Directory holding one artifact per document
    pub dir: PathBuf,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_ARTIFACT_DIR),
        }
    }
}

impl ArtifactConfig {
    /// Creates a config rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Artifact path for `document_id`. Re-analysis maps to the same path.
    pub fn path_for(&self, document_id: DocumentId) -> PathBuf {
        self.dir.join(format!("ela_{document_id}.png"))
    }
}

/// Configuration for the whole pipeline.
///
/// # Example
///
/// ```json
/// {
///   "ela": { "quality": 90, "amplification": { "mode": "fixed", "factor": 15.0 } },
///   "model": { "weights_path": "models/ela_classifier.onnx", "input_shape": [128, 128] },
///   "artifacts": { "dir": "static/ela" }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// ELA transform constants
    pub ela: ElaConfig,
    /// Classifier weights and preprocessing contract
    pub model: ModelSpec,
    /// Artifact placement
    pub artifacts: ArtifactConfig,
}

impl AnalysisConfig {
    /// Configuration for the CASIA-trained classifier at `weights_path`.
    ///
    /// Those weights were trained on ELA images stretched by `255 / max_diff`,
    /// so the amplification is pinned to [`Amplification::MaxNormalized`].
    pub fn casia(weights_path: impl Into<PathBuf>) -> Self {
        let mut config = Self::default().with_weights_path(weights_path);
        config.ela.amplification = Amplification::MaxNormalized;
        config
    }

    /// Reads and validates a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let load_failed = |message: String| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message,
        };

        let content = std::fs::read_to_string(path).map_err(|e| load_failed(e.to_string()))?;
        let config: Self =
            serde_json::from_str(&content).map_err(|e| load_failed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the weights path.
    pub fn with_weights_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model.weights_path = path.into();
        self
    }

    /// Sets the artifact directory.
    pub fn with_artifact_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifacts.dir = dir.into();
        self
    }
}

impl ConfigValidator for AnalysisConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.ela.validate()?;
        self.model.validate()?;
        if self.artifacts.dir.as_os_str().is_empty() {
            return Err(ConfigError::InvalidConfig {
                message: "artifact directory must not be empty".to_string(),
            });
        }
        Ok(())
    }

    fn get_defaults() -> Self {
        Self::default()
    }
}
