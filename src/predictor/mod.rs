//! Inference services built on loaded models.
//!
//! * [`tamper_classifier`] - Maps ELA images to tampering verdicts

pub mod tamper_classifier;

pub use tamper_classifier::TamperClassifier;
