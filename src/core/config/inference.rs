//! Runtime settings for an ONNX inference engine.

use super::errors::{ConfigError, ConfigValidator};
use super::onnx::OrtSessionConfig;
use serde::{Deserialize, Serialize};

/// Settings that control how a model is executed, independent of what it computes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelInferenceConfig {
    /// Display name of the model; defaults to the weights file stem
    pub model_name: Option<String>,
    /// Input tensor name; defaults to the first input declared by the model
    pub input_name: Option<String>,
    /// Output tensor name; defaults to the first output declared by the model
    pub output_name: Option<String>,
    /// Number of ONNX Runtime sessions to round-robin across (default: 1)
    pub session_pool_size: Option<usize>,
    /// ONNX Runtime session tuning
    pub ort_session: Option<OrtSessionConfig>,
}

impl ModelInferenceConfig {
    /// Creates an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the session pool size.
    pub fn session_pool_size(mut self, size: usize) -> Self {
        self.session_pool_size = Some(size);
        self
    }

    /// Sets the ONNX Runtime session configuration.
    pub fn ort_session(mut self, config: OrtSessionConfig) -> Self {
        self.ort_session = Some(config);
        self
    }

    /// Sets the input tensor name.
    pub fn input_name(mut self, name: impl Into<String>) -> Self {
        self.input_name = Some(name.into());
        self
    }
}

impl ConfigValidator for ModelInferenceConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(size) = self.session_pool_size {
            self.validate_positive_usize(size, "session_pool_size")?;
        }
        if let Some(ort) = &self.ort_session {
            if let Some(intra) = ort.intra_threads {
                self.validate_thread_count(intra)?;
            }
            if let Some(inter) = ort.inter_threads {
                self.validate_thread_count(inter)?;
            }
        }
        Ok(())
    }

    fn get_defaults() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_pool_size_rejected() {
        let config = ModelInferenceConfig::new().session_pool_size(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_thread_counts_validated() {
        let config = ModelInferenceConfig::new()
            .session_pool_size(2)
            .ort_session(OrtSessionConfig::new().with_intra_threads(0));
        assert!(config.validate().is_err());

        let config = ModelInferenceConfig::new()
            .ort_session(OrtSessionConfig::new().with_intra_threads(4));
        assert!(config.validate().is_ok());
    }
}
