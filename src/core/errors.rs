//! Error types for the analysis pipeline.
//!
//! Every stage of an analysis fails fast with a stage-tagged [`ForensicsError`].
//! Callers that need to render a message switch on [`ForensicsError::kind`]; the
//! crate itself never produces display text beyond the `Display` impls below.

use crate::core::config::ConfigError;
use crate::domain::DocumentId;
use thiserror::Error;

/// Boxed source error carried by the contextual variants.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Convenient result alias for analysis operations.
pub type ForensicsResult<T> = Result<T, ForensicsError>;

/// Coarse classification of a [`ForensicsError`].
///
/// This is the stable surface callers map to user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The document reference is unknown.
    NotFound,
    /// The source image could not be read or decoded.
    Decode,
    /// An image could not be encoded or written.
    Encode,
    /// The ELA transform hit an invariant violation.
    Transform,
    /// The classifier weights are missing or unusable.
    ModelLoad,
    /// The ELA output could not be turned into a model input.
    Preprocess,
    /// The forward pass itself failed.
    Inference,
    /// The configuration is invalid.
    Config,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::NotFound => "not found",
            ErrorKind::Decode => "decode",
            ErrorKind::Encode => "encode",
            ErrorKind::Transform => "transform",
            ErrorKind::ModelLoad => "model load",
            ErrorKind::Preprocess => "preprocess",
            ErrorKind::Inference => "inference",
            ErrorKind::Config => "configuration",
        };
        f.write_str(name)
    }
}

/// Errors produced by the codec, ELA engine, model registry, inference service
/// and orchestrator.
#[derive(Error, Debug)]
pub enum ForensicsError {
    /// The document store has no record for the requested id.
    #[error("document {document_id} not found")]
    NotFound {
        /// The id that was looked up.
        document_id: DocumentId,
    },

    /// Reading or decoding an image failed.
    #[error("failed to decode '{path}': {reason}")]
    Decode {
        /// Path (or `<memory>`) of the image being decoded.
        path: String,
        /// Short description of what went wrong.
        reason: String,
        /// The underlying error, if any.
        #[source]
        source: Option<BoxedError>,
    },

    /// Encoding or writing an image failed.
    #[error("failed to encode '{path}': {reason}")]
    Encode {
        /// Destination path (or `<memory>`) of the encode.
        path: String,
        /// Short description of what went wrong.
        reason: String,
        /// The underlying error, if any.
        #[source]
        source: Option<BoxedError>,
    },

    /// The ELA transform could not be applied.
    #[error("ELA transform failed: {message}")]
    Transform {
        /// Description of the violated invariant.
        message: String,
    },

    /// The classifier could not be loaded.
    #[error("failed to load model '{model_path}': {reason}{suggestion}")]
    ModelLoad {
        /// Path to the weights file.
        model_path: String,
        /// Short description of what went wrong.
        reason: String,
        /// Pre-formatted suggestion suffix (may be empty).
        suggestion: String,
        /// The underlying error, if any.
        #[source]
        source: Option<BoxedError>,
    },

    /// The ELA image could not be turned into a model input.
    #[error("preprocessing failed: {message}")]
    Preprocess {
        /// Description of the problem.
        message: String,
    },

    /// Running the model failed or produced unusable output.
    #[error("inference failed for model '{model_name}': {context}")]
    Inference {
        /// Name of the model that was running.
        model_name: String,
        /// What the engine was doing.
        context: String,
        /// The underlying error, if any.
        #[source]
        source: Option<BoxedError>,
    },

    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Tensor shape error while building or reading a tensor.
    #[error("tensor operation")]
    Tensor(#[from] ndarray::ShapeError),
}

impl ForensicsError {
    /// Returns the coarse kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ForensicsError::NotFound { .. } => ErrorKind::NotFound,
            ForensicsError::Decode { .. } => ErrorKind::Decode,
            ForensicsError::Encode { .. } => ErrorKind::Encode,
            ForensicsError::Transform { .. } => ErrorKind::Transform,
            ForensicsError::ModelLoad { .. } => ErrorKind::ModelLoad,
            ForensicsError::Preprocess { .. } | ForensicsError::Tensor(_) => {
                ErrorKind::Preprocess
            }
            ForensicsError::Inference { .. } => ErrorKind::Inference,
            ForensicsError::Config(_) => ErrorKind::Config,
        }
    }

    /// Creates a `NotFound` error for a document id.
    pub fn not_found(document_id: DocumentId) -> Self {
        Self::NotFound { document_id }
    }

    /// Creates a `Decode` error without an underlying source.
    pub fn decode_error(path: impl AsRef<std::path::Path>, reason: impl Into<String>) -> Self {
        Self::Decode {
            path: path.as_ref().display().to_string(),
            reason: reason.into(),
            source: None,
        }
    }

    /// Creates a `Decode` error wrapping the error that caused it.
    pub fn decode_error_with_source(
        path: impl AsRef<std::path::Path>,
        reason: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Decode {
            path: path.as_ref().display().to_string(),
            reason: reason.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates an `Encode` error wrapping the error that caused it.
    pub fn encode_error(
        path: impl AsRef<std::path::Path>,
        reason: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Encode {
            path: path.as_ref().display().to_string(),
            reason: reason.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a `Transform` error.
    pub fn transform_error(message: impl Into<String>) -> Self {
        Self::Transform {
            message: message.into(),
        }
    }

    /// Creates a `Preprocess` error.
    pub fn preprocess_error(message: impl Into<String>) -> Self {
        Self::Preprocess {
            message: message.into(),
        }
    }

    /// Creates a `ModelLoad` error with an optional suggestion and source.
    ///
    /// # Arguments
    /// * `model_path` - Path to the weights file
    /// * `reason` - Short reason description
    /// * `suggestion` - Optional suggestion message (without punctuation)
    /// * `source` - Optional underlying error
    pub fn model_load_error(
        model_path: impl AsRef<std::path::Path>,
        reason: impl Into<String>,
        suggestion: Option<&str>,
        source: Option<impl std::error::Error + Send + Sync + 'static>,
    ) -> Self {
        let suggestion = suggestion
            .map(|s| format!("; suggested fix: {}", s))
            .unwrap_or_default();
        Self::ModelLoad {
            model_path: model_path.as_ref().display().to_string(),
            reason: reason.into(),
            suggestion,
            source: source.map(|e| Box::new(e) as _),
        }
    }

    /// Creates an `Inference` error wrapping the error that caused it.
    pub fn inference_error(
        model_name: &str,
        context: &str,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Inference {
            model_name: model_name.to_string(),
            context: context.to_string(),
            source: Some(Box::new(error)),
        }
    }

    /// Creates an `Inference` error for malformed model output.
    pub fn invalid_output(model_name: &str, context: impl Into<String>) -> Self {
        Self::Inference {
            model_name: model_name.to_string(),
            context: context.into(),
            source: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            ForensicsError::not_found(DocumentId::new(7)).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            ForensicsError::decode_error("a.png", "empty file").kind(),
            ErrorKind::Decode
        );
        assert_eq!(
            ForensicsError::transform_error("size mismatch").kind(),
            ErrorKind::Transform
        );
        assert_eq!(
            ForensicsError::preprocess_error("zero area").kind(),
            ErrorKind::Preprocess
        );
    }

    #[test]
    fn test_model_load_error_formats_suggestion() {
        let err = ForensicsError::model_load_error(
            "weights/model.onnx",
            "file not found",
            Some("check the configured weights path"),
            None::<std::io::Error>,
        );
        let message = err.to_string();
        assert!(message.contains("weights/model.onnx"));
        assert!(message.contains("suggested fix: check the configured weights path"));
        assert_eq!(err.kind(), ErrorKind::ModelLoad);
    }

    #[test]
    fn test_source_chain_is_preserved() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err = ForensicsError::encode_error("out/ela.png", "write failed", io);
        assert!(err.source().is_some());
        assert_eq!(err.kind(), ErrorKind::Encode);
    }

    #[test]
    fn test_not_found_display() {
        let err = ForensicsError::not_found(DocumentId::new(42));
        assert_eq!(err.to_string(), "document 42 not found");
    }
}
