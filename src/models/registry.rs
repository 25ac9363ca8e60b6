//! Lazily loaded, shared model handle.
//!
//! The registry owns exactly one [`ModelHandle`] for its lifetime. The first
//! caller of [`ModelRegistry::get_handle`] loads it; concurrent first callers
//! block until that load finishes and then share the result. A failed load
//! leaves the registry empty, so the next call tries again.

use crate::core::config::ConfigValidator;
use crate::core::{ForensicsError, ForensicsResult};
use crate::models::classifier::OrtClassifier;
use crate::models::handle::{ModelHandle, ModelSpec};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tracing::{info, warn};

/// Builds a [`ModelHandle`] from a [`ModelSpec`].
pub trait ModelLoader: Send + Sync {
    /// Loads the weights named by `spec`.
    ///
    /// # Errors
    ///
    /// Returns [`ForensicsError::ModelLoad`] if the weights are missing or unusable.
    fn load(&self, spec: &ModelSpec) -> ForensicsResult<ModelHandle>;
}

/// Loads ONNX weights through ONNX Runtime.
#[derive(Debug, Default, Clone, Copy)]
pub struct OrtModelLoader;

impl ModelLoader for OrtModelLoader {
    fn load(&self, spec: &ModelSpec) -> ForensicsResult<ModelHandle> {
        if let Err(e) = spec.validate_model_path(&spec.weights_path) {
            return Err(ForensicsError::model_load_error(
                &spec.weights_path,
                "weights file not usable",
                Some("check the configured weights_path"),
                Some(e),
            ));
        }
        let classifier = OrtClassifier::load(spec)?;
        ModelHandle::new(spec, Box::new(classifier))
    }
}

/// Single-initialization guard around the process's classifier.
pub struct ModelRegistry {
    spec: ModelSpec,
    loader: Box<dyn ModelLoader>,
    handle: OnceCell<Arc<ModelHandle>>,
    load_attempts: AtomicUsize,
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("weights_path", &self.spec.weights_path)
            .field("loaded", &self.is_loaded())
            .field("load_attempts", &self.load_attempts())
            .finish()
    }
}

impl ModelRegistry {
    /// Creates a registry that loads `spec` through ONNX Runtime.
    pub fn new(spec: ModelSpec) -> ForensicsResult<Self> {
        Self::with_loader(spec, OrtModelLoader)
    }

    /// Creates a registry with a custom loader.
    pub fn with_loader(
        spec: ModelSpec,
        loader: impl ModelLoader + 'static,
    ) -> ForensicsResult<Self> {
        spec.validate()?;
        Ok(Self {
            spec,
            loader: Box::new(loader),
            handle: OnceCell::new(),
            load_attempts: AtomicUsize::new(0),
        })
    }

    /// Returns the shared handle, loading it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`ForensicsError::ModelLoad`] if loading fails. Nothing is cached
    /// on failure.
    pub fn get_handle(&self) -> ForensicsResult<Arc<ModelHandle>> {
        self.handle
            .get_or_try_init(|| {
                let attempt = self.load_attempts.fetch_add(1, Ordering::SeqCst) + 1;
                let start = Instant::now();
                info!(
                    weights = %self.spec.weights_path.display(),
                    attempt,
                    "loading classifier"
                );
                match self.loader.load(&self.spec) {
                    Ok(handle) => {
                        info!(
                            model = handle.model_name(),
                            weights = %handle.weights_path().display(),
                            elapsed_ms = start.elapsed().as_millis() as u64,
                            "classifier loaded"
                        );
                        Ok(Arc::new(handle))
                    }
                    Err(e) => {
                        warn!(attempt, error = %e, "classifier load failed");
                        Err(e)
                    }
                }
            })
            .map(Arc::clone)
    }

    /// Whether a handle has been loaded.
    pub fn is_loaded(&self) -> bool {
        self.handle.get().is_some()
    }

    /// Number of load attempts so far, successful or not.
    pub fn load_attempts(&self) -> usize {
        self.load_attempts.load(Ordering::SeqCst)
    }

    /// The spec this registry loads.
    pub fn spec(&self) -> &ModelSpec {
        &self.spec
    }
}
