//! Tensor type aliases used between preprocessing, inference and postprocessing.

/// Model output scores, `(batch, classes)`.
pub type Tensor2D = ndarray::Array2<f32>;

/// Model input batch, `(batch, C, H, W)` or `(batch, H, W, C)`.
pub type Tensor4D = ndarray::Array4<f32>;
