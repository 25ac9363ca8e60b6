//! Domain types shared across the pipeline.
//!
//! * [`document`] - Document records and their identifiers
//! * [`verdict`] - Tampering labels and verdicts

pub mod document;
pub mod verdict;

pub use document::{Document, DocumentId, OwnerId};
pub use verdict::{Label, Verdict};
