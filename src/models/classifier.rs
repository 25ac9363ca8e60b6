//! Forward-pass abstraction over trained tampering classifiers.

use crate::core::inference::OrtInfer;
use crate::core::{ForensicsError, ForensicsResult, Tensor2D, Tensor4D};
use crate::models::handle::ModelSpec;
use crate::processors::ChannelOrder;

/// A loaded classifier that maps a preprocessed batch to per-class scores.
///
/// Implementations must be safe to call from several threads at once; any
/// internal serialization the runtime needs is the implementation's business.
pub trait Classifier: Send + Sync + std::fmt::Debug {
    /// Name used in logs and errors.
    fn model_name(&self) -> &str;

    /// Runs a forward pass, returning `(batch, classes)` scores.
    fn forward(&self, batch: &Tensor4D) -> ForensicsResult<Tensor2D>;
}

/// Classifier backed by an ONNX model.
#[derive(Debug)]
pub struct OrtClassifier {
    inference: OrtInfer,
}

impl OrtClassifier {
    /// Loads the ONNX weights named by `spec` and checks the declared input
    /// shape against the pinned preprocessing.
    pub fn load(spec: &ModelSpec) -> ForensicsResult<Self> {
        let inference = OrtInfer::from_config(&spec.inference, &spec.weights_path)?;

        if let Some(declared) = inference.input_shape() {
            let (height, width) = spec.input_shape;
            let expected: [i64; 3] = match spec.channel_order {
                ChannelOrder::HWC => [height as i64, width as i64, 3],
                ChannelOrder::CHW => [3, height as i64, width as i64],
            };
            let compatible = declared.len() == 4
                && declared[1..]
                    .iter()
                    .zip(expected.iter())
                    .all(|(&d, &e)| d <= 0 || d == e);
            if !compatible {
                return Err(ForensicsError::model_load_error(
                    &spec.weights_path,
                    format!(
                        "model input shape {:?} does not match configured {:?} input {:?}",
                        declared, spec.channel_order, expected
                    ),
                    Some("align input_shape and channel_order with the exported model"),
                    None::<ort::Error>,
                ));
            }
        }

        Ok(Self { inference })
    }
}

impl Classifier for OrtClassifier {
    fn model_name(&self) -> &str {
        self.inference.model_name()
    }

    fn forward(&self, batch: &Tensor4D) -> ForensicsResult<Tensor2D> {
        self.inference.infer_2d(batch)
    }
}
