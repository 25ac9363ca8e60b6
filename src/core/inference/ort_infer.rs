//! ONNX Runtime inference engine with a pool of mutex-guarded sessions.
//!
//! `Session::run` needs exclusive access, so every forward pass locks one session
//! of the pool. Concurrent callers spread over the pool round-robin; with a pool
//! of one, forward passes are serialized on that session's lock and nothing else.

use super::session::build_session;
use crate::core::config::ModelInferenceConfig;
use crate::core::{ForensicsError, ForensicsResult, Tensor2D, Tensor4D};
use ndarray::ArrayView2;
use ort::session::Session;
use ort::value::{TensorRef, ValueType};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

pub struct OrtInfer {
    sessions: Vec<Mutex<Session>>,
    next_idx: AtomicUsize,
    input_name: String,
    output_name: String,
    model_path: PathBuf,
    model_name: String,
}

impl std::fmt::Debug for OrtInfer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrtInfer")
            .field("sessions", &self.sessions.len())
            .field("input_name", &self.input_name)
            .field("output_name", &self.output_name)
            .field("model_path", &self.model_path)
            .field("model_name", &self.model_name)
            .finish()
    }
}

impl OrtInfer {
    /// Creates an engine with a single session and default settings.
    pub fn new(model_path: impl AsRef<Path>) -> ForensicsResult<Self> {
        Self::from_config(&ModelInferenceConfig::default(), model_path)
    }

    /// Creates an engine from `config`, building `session_pool_size` sessions.
    ///
    /// Input and output names not given in `config` are taken from the first
    /// input/output the model declares.
    pub fn from_config(
        config: &ModelInferenceConfig,
        model_path: impl AsRef<Path>,
    ) -> ForensicsResult<Self> {
        let path = model_path.as_ref();
        let pool_size = config.session_pool_size.unwrap_or(1).max(1);

        let mut sessions = Vec::with_capacity(pool_size);
        for _ in 0..pool_size {
            let session = build_session(path, config.ort_session.as_ref()).map_err(|e| {
                ForensicsError::model_load_error(
                    path,
                    "failed to create ONNX session",
                    Some("verify the weights file is a valid ONNX model"),
                    Some(e),
                )
            })?;
            sessions.push(session);
        }

        let first = &sessions[0];
        let input_name = match &config.input_name {
            Some(name) => name.clone(),
            None => first.inputs.first().map(|i| i.name.clone()).ok_or_else(|| {
                ForensicsError::model_load_error(
                    path,
                    "model declares no inputs",
                    None,
                    None::<ort::Error>,
                )
            })?,
        };
        let output_name = match &config.output_name {
            Some(name) => name.clone(),
            None => first.outputs.first().map(|o| o.name.clone()).ok_or_else(|| {
                ForensicsError::model_load_error(
                    path,
                    "model declares no outputs",
                    None,
                    None::<ort::Error>,
                )
            })?,
        };

        let model_name = config
            .model_name
            .clone()
            .or_else(|| {
                path.file_stem()
                    .and_then(|s| s.to_str())
                    .map(|s| s.to_string())
            })
            .unwrap_or_else(|| "unknown_model".to_string());

        Ok(OrtInfer {
            sessions: sessions.into_iter().map(Mutex::new).collect(),
            next_idx: AtomicUsize::new(0),
            input_name,
            output_name,
            model_path: path.to_path_buf(),
            model_name,
        })
    }

    /// Returns the model path associated with this inference engine.
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// Returns the model name associated with this inference engine.
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Number of sessions in the pool.
    pub fn pool_size(&self) -> usize {
        self.sessions.len()
    }

    /// Retrieves the declared shape of the input tensor.
    ///
    /// Dynamic dimensions are returned as-is (typically `-1`).
    pub fn input_shape(&self) -> Option<Vec<i64>> {
        let session = self.sessions.first()?.lock().ok()?;
        let input = session
            .inputs
            .iter()
            .find(|input| input.name == self.input_name)?;
        match &input.input_type {
            ValueType::Tensor { shape, .. } => Some(shape.iter().copied().collect()),
            _ => None,
        }
    }

    /// Runs a forward pass and returns the `(batch, classes)` output.
    pub fn infer_2d(&self, x: &Tensor4D) -> ForensicsResult<Tensor2D> {
        let batch_size = x.shape()[0];
        let input_shape = x.shape().to_vec();

        let input_tensor = TensorRef::from_array_view(x.view()).map_err(|e| {
            ForensicsError::inference_error(
                &self.model_name,
                &format!("failed to convert input tensor with shape {:?}", input_shape),
                e,
            )
        })?;
        let inputs = ort::inputs![self.input_name.as_str() => input_tensor];

        let idx = self.next_idx.fetch_add(1, Ordering::Relaxed) % self.sessions.len();
        let mut session = self.sessions[idx].lock().map_err(|_| {
            ForensicsError::invalid_output(
                &self.model_name,
                format!(
                    "session {}/{} lock poisoned by an earlier panic",
                    idx,
                    self.sessions.len()
                ),
            )
        })?;

        let outputs = session.run(inputs).map_err(|e| {
            ForensicsError::inference_error(
                &self.model_name,
                &format!(
                    "forward pass failed with input '{}' -> output '{}'",
                    self.input_name, self.output_name
                ),
                e,
            )
        })?;

        let (output_shape, output_data) = outputs[self.output_name.as_str()]
            .try_extract_tensor::<f32>()
            .map_err(|e| {
                ForensicsError::inference_error(
                    &self.model_name,
                    &format!("failed to extract output tensor '{}' as f32", self.output_name),
                    e,
                )
            })?;

        if output_shape.len() != 2 || output_shape[0] as usize != batch_size {
            return Err(ForensicsError::invalid_output(
                &self.model_name,
                format!(
                    "expected output of shape [{}, classes], got {:?}",
                    batch_size, output_shape
                ),
            ));
        }

        let num_classes = output_shape[1] as usize;
        let scores = ArrayView2::from_shape((batch_size, num_classes), output_data)
            .map_err(|e| {
                ForensicsError::inference_error(&self.model_name, "output data size mismatch", e)
            })?;
        Ok(scores.to_owned())
    }
}
