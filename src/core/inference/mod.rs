//! ONNX Runtime integration.

pub mod ort_infer;
pub mod session;

pub use ort_infer::OrtInfer;
pub use session::build_session;
