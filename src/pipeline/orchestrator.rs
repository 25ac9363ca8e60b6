//! End-to-end analysis of one stored document.
//!
//! Each request walks `Received -> Loaded -> Transformed -> Classified ->
//! Persisted`. The first failing stage aborts the request with its own error;
//! nothing is retried. Requests share only the model handle, so any number may
//! run at once.

use crate::codec::{self, RasterFormat};
use crate::core::config::{AnalysisConfig, ArtifactConfig, ConfigValidator};
use crate::core::{ForensicsError, ForensicsResult};
use crate::domain::{DocumentId, Verdict};
use crate::models::ModelRegistry;
use crate::predictor::TamperClassifier;
use crate::processors::ElaEngine;
use crate::store::DocumentStore;
use rayon::prelude::*;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Progress of a single analysis request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStage {
    /// The request was accepted and the document resolved.
    Received,
    /// The source image was decoded.
    Loaded,
    /// The ELA image was computed.
    Transformed,
    /// The classifier produced a verdict.
    Classified,
    /// The artifact was written and verified.
    Persisted,
    /// A stage failed; terminal.
    Failed,
}

impl fmt::Display for AnalysisStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AnalysisStage::Received => "received",
            AnalysisStage::Loaded => "loaded",
            AnalysisStage::Transformed => "transformed",
            AnalysisStage::Classified => "classified",
            AnalysisStage::Persisted => "persisted",
            AnalysisStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Wall-clock time spent in each stage, in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StageTimings {
    pub load_ms: f64,
    pub transform_ms: f64,
    pub classify_ms: f64,
    pub persist_ms: f64,
    pub total_ms: f64,
}

/// Everything one analysis produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    /// The analyzed document.
    pub document_id: DocumentId,
    /// Classification of the ELA image.
    pub verdict: Verdict,
    /// Where the ELA artifact was written.
    pub artifact_path: PathBuf,
    /// Per-stage timings.
    pub timings: StageTimings,
}

/// Runs documents through decode, ELA, classification and artifact persistence.
pub struct AnalysisOrchestrator {
    store: Arc<dyn DocumentStore>,
    ela: ElaEngine,
    classifier: TamperClassifier,
    artifacts: ArtifactConfig,
}

impl fmt::Debug for AnalysisOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisOrchestrator")
            .field("ela", &self.ela)
            .field("classifier", &self.classifier)
            .field("artifacts", &self.artifacts)
            .finish_non_exhaustive()
    }
}

impl AnalysisOrchestrator {
    /// Creates an orchestrator sharing an existing model registry.
    ///
    /// The model itself is not loaded until the first request needs it.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        registry: Arc<ModelRegistry>,
        config: &AnalysisConfig,
    ) -> ForensicsResult<Self> {
        config.validate()?;
        Ok(Self {
            store,
            ela: ElaEngine::new(config.ela.clone())?,
            classifier: TamperClassifier::new(registry),
            artifacts: config.artifacts.clone(),
        })
    }

    /// Creates an orchestrator with its own registry built from `config.model`.
    pub fn from_config(
        store: Arc<dyn DocumentStore>,
        config: &AnalysisConfig,
    ) -> ForensicsResult<Self> {
        let registry = Arc::new(ModelRegistry::new(config.model.clone())?);
        Self::new(store, registry, config)
    }

    /// The model registry used for classification.
    pub fn registry(&self) -> &Arc<ModelRegistry> {
        self.classifier.registry()
    }

    /// Artifact placement for [`AnalysisOrchestrator::analyze`].
    pub fn artifacts(&self) -> &ArtifactConfig {
        &self.artifacts
    }

    /// Analyzes a document, writing the artifact to its default path.
    ///
    /// # Errors
    ///
    /// Fails with the error of the first failing stage: `NotFound`, `Decode`,
    /// `Transform`, `ModelLoad`, `Preprocess`, `Inference` or `Encode`.
    pub fn analyze(&self, document_id: DocumentId) -> ForensicsResult<AnalysisReport> {
        let artifact_path = self.artifacts.path_for(document_id);
        self.analyze_to(document_id, &artifact_path)
    }

    /// Analyzes a document, writing the artifact to `artifact_path`.
    ///
    /// An existing file at `artifact_path` is replaced.
    pub fn analyze_to(
        &self,
        document_id: DocumentId,
        artifact_path: &Path,
    ) -> ForensicsResult<AnalysisReport> {
        let mut reached = AnalysisStage::Received;
        match self.run_stages(document_id, artifact_path, &mut reached) {
            Ok(report) => {
                info!(
                    document_id = %document_id,
                    label = %report.verdict.label,
                    confidence = report.verdict.confidence,
                    artifact = %report.artifact_path.display(),
                    total_ms = report.timings.total_ms,
                    "analysis complete"
                );
                Ok(report)
            }
            Err(e) => {
                warn!(
                    document_id = %document_id,
                    stage = %AnalysisStage::Failed,
                    reached = %reached,
                    kind = %e.kind(),
                    error = %e,
                    "analysis failed"
                );
                Err(e)
            }
        }
    }

    /// Analyzes several documents in parallel. Results keep the input order.
    pub fn analyze_batch(
        &self,
        document_ids: &[DocumentId],
    ) -> Vec<ForensicsResult<AnalysisReport>> {
        document_ids.par_iter().map(|&id| self.analyze(id)).collect()
    }

    fn run_stages(
        &self,
        document_id: DocumentId,
        artifact_path: &Path,
        reached: &mut AnalysisStage,
    ) -> ForensicsResult<AnalysisReport> {
        let started = Instant::now();
        let mut timings = StageTimings::default();

        let document = self.store.get_document(document_id)?;
        debug!(
            document_id = %document_id,
            stage = %AnalysisStage::Received,
            path = %document.path.display()
        );

        let stage_start = Instant::now();
        let source = codec::load(document.path())?;
        timings.load_ms = elapsed_ms(stage_start);
        *reached = AnalysisStage::Loaded;
        debug!(
            document_id = %document_id,
            stage = %AnalysisStage::Loaded,
            width = source.width(),
            height = source.height()
        );

        let stage_start = Instant::now();
        let ela = self.ela.transform(&source)?.into_dynamic();
        timings.transform_ms = elapsed_ms(stage_start);
        *reached = AnalysisStage::Transformed;
        debug!(document_id = %document_id, stage = %AnalysisStage::Transformed);

        let stage_start = Instant::now();
        let verdict = self.classifier.classify(&ela)?;
        timings.classify_ms = elapsed_ms(stage_start);
        *reached = AnalysisStage::Classified;
        debug!(
            document_id = %document_id,
            stage = %AnalysisStage::Classified,
            label = %verdict.label
        );

        let stage_start = Instant::now();
        self.persist(&ela, artifact_path)?;
        timings.persist_ms = elapsed_ms(stage_start);
        *reached = AnalysisStage::Persisted;
        debug!(
            document_id = %document_id,
            stage = %AnalysisStage::Persisted,
            artifact = %artifact_path.display()
        );

        timings.total_ms = elapsed_ms(started);
        Ok(AnalysisReport {
            document_id,
            verdict,
            artifact_path: artifact_path.to_path_buf(),
            timings,
        })
    }

    /// Writes the artifact and confirms it can be opened before reporting it.
    fn persist(&self, ela: &image::DynamicImage, artifact_path: &Path) -> ForensicsResult<()> {
        if let Some(dir) = artifact_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| {
                ForensicsError::encode_error(dir, "failed to create artifact directory", e)
            })?;
        }
        codec::save_as(ela, artifact_path, RasterFormat::Png, self.ela.config().quality)?;
        std::fs::File::open(artifact_path).map_err(|e| {
            ForensicsError::encode_error(artifact_path, "artifact is not readable", e)
        })?;
        Ok(())
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
