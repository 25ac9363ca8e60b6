//! Configuration management.
//!
//! This module provides configuration types, validation traits, and the
//! top-level [`AnalysisConfig`] loaded by embedding applications.

pub mod analysis;
pub mod errors;
pub mod inference;
pub mod onnx;

pub use analysis::{AnalysisConfig, ArtifactConfig, CASIA_WEIGHTS_FILE};
pub use errors::{ConfigError, ConfigValidator};
pub use inference::ModelInferenceConfig;
pub use onnx::*;
