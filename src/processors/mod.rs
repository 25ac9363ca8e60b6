//! Image processing stages.
//!
//! * [`ela`] - Error level analysis transform
//! * [`normalization`] - Pixel normalization into model input tensors
//! * [`types`] - Layout and resampling enums shared by preprocessing

pub mod ela;
pub mod normalization;
pub mod types;

pub use ela::{Amplification, ElaConfig, ElaEngine, ElaImage};
pub use normalization::{NormalizeConfig, NormalizeImage};
pub use types::{ChannelOrder, ResizeFilter};
