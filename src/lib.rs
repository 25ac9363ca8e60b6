//! # ELA Forensics
//!
//! Detects tampering in document images with Error Level Analysis and a trained
//! ONNX classifier.
//!
//! An uploaded image is recompressed at a pinned JPEG quality; regions edited
//! after the last lossy save re-encode differently and stand out in the
//! amplified difference image. That ELA image is persisted as an artifact and
//! classified as `AUTHENTIC` or `TAMPERED` with a confidence in `[0, 1]`.
//!
//! ## Modules
//!
//! * [`codec`] - Content-sniffing image decode and atomic encode
//! * [`core`] - Errors, configuration and ONNX Runtime integration
//! * [`domain`] - Documents, labels and verdicts
//! * [`models`] - Classifier trait, model handle and the load-once registry
//! * [`pipeline`] - The analysis orchestrator
//! * [`predictor`] - ELA image to verdict
//! * [`processors`] - ELA transform and input normalization
//! * [`store`] - Document lookup
//! * [`utils`] - Filesystem helpers
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ela_forensics::prelude::*;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AnalysisConfig::casia("models/model_casia_run1.onnx")
//!     .with_artifact_dir("static/ela");
//!
//! let store = Arc::new(InMemoryDocumentStore::new());
//! let document = store.insert("uploads/contract.jpg", OwnerId::new(1));
//!
//! let orchestrator = AnalysisOrchestrator::from_config(store, &config)?;
//! let report = orchestrator.analyze(document.id)?;
//! println!(
//!     "{}: {:.1}% ({})",
//!     report.verdict.label,
//!     report.verdict.confidence_percent(),
//!     report.artifact_path.display()
//! );
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod core;
pub mod domain;
pub mod models;
pub mod pipeline;
pub mod predictor;
pub mod processors;
pub mod store;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;

/// Prelude module for convenient imports.
///
/// ```rust
/// use ela_forensics::prelude::*;
/// ```
pub mod prelude {
    pub use crate::core::{AnalysisConfig, ErrorKind, ForensicsError, ForensicsResult};
    pub use crate::domain::{Document, DocumentId, Label, OwnerId, Verdict};
    pub use crate::models::{ModelRegistry, ModelSpec};
    pub use crate::pipeline::{AnalysisOrchestrator, AnalysisReport};
    pub use crate::store::{DocumentStore, InMemoryDocumentStore};
}
