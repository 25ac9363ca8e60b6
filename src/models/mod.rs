//! Classifier models and their lifecycle.
//!
//! * [`classifier`] - The forward-pass trait and its ONNX implementation
//! * [`handle`] - Model metadata ([`ModelSpec`]) and the loaded [`ModelHandle`]
//! * [`registry`] - Lazy, load-once [`ModelRegistry`]

pub mod classifier;
pub mod handle;
pub mod registry;

pub use classifier::{Classifier, OrtClassifier};
pub use handle::{LabelMap, ModelHandle, ModelSpec, ScoreActivation};
pub use registry::{ModelLoader, ModelRegistry, OrtModelLoader};
