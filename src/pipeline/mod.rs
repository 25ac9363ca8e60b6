//! The analysis pipeline.
//!
//! [`AnalysisOrchestrator`] ties the document store, codec, ELA engine and
//! tamper classifier together for one request at a time.

pub mod orchestrator;

pub use orchestrator::{AnalysisOrchestrator, AnalysisReport, AnalysisStage, StageTimings};
