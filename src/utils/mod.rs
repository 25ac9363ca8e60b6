//! Filesystem helpers shared by the codec and the orchestrator.

pub mod fs;

pub use fs::atomic_write;
