//! Core building blocks of the analysis pipeline.
//!
//! * [`config`] - Configuration types and validation
//! * [`errors`] - The [`ForensicsError`] taxonomy
//! * [`inference`] - ONNX Runtime integration
//! * [`tensor`] - Tensor aliases shared by preprocessing and inference

pub mod config;
pub mod errors;
pub mod inference;
pub mod tensor;

pub use config::{AnalysisConfig, ConfigError, ConfigValidator};
pub use errors::{BoxedError, ErrorKind, ForensicsError, ForensicsResult};
pub use inference::{OrtInfer, build_session};
pub use tensor::{Tensor2D, Tensor4D};

/// Initializes the tracing subscriber for logging.
///
/// Installs an environment-filtered formatting subscriber (`RUST_LOG`). Call it
/// once at the start of an application.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();
}
