//! Inference backend seam and the ONNX Runtime implementation.

use std::path::Path;

use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::TensorRef;

use crate::codec::Tensor;
use crate::error::BackendError;

/// Something that can turn a model artifact into a runnable session.
pub trait InferenceBackend: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Parse and compile the artifact at `path`.
    ///
    /// # Errors
    ///
    /// Returns the backend's error if the artifact is unreadable or invalid.
    fn load(&self, path: &Path) -> Result<Box<dyn ModelSession>, BackendError>;
}

/// A loaded model, bound to one artifact.
///
/// `run` takes `&mut self`; callers serialise access per session.
pub trait ModelSession: Send {
    /// Declared input slots, in graph order.
    fn input_names(&self) -> Vec<String>;

    /// Declared output slots, in graph order.
    fn output_names(&self) -> Vec<String>;

    /// Bind `input` to `input_name`, run the graph and return `output_name`.
    ///
    /// # Errors
    ///
    /// Returns the backend's error if the computation fails.
    fn run(
        &mut self,
        input_name: &str,
        output_name: &str,
        input: &Tensor,
    ) -> Result<Tensor, BackendError>;
}

/// ONNX Runtime backend on the default (CPU) execution provider.
#[derive(Debug, Clone)]
pub struct OrtBackend {
    optimization_level: u8,
    intra_threads: Option<usize>,
}

impl OrtBackend {
    /// `optimization_level` is 0 (disabled) through 3 (all).
    #[must_use]
    pub const fn new(optimization_level: u8, intra_threads: Option<usize>) -> Self {
        Self {
            optimization_level,
            intra_threads,
        }
    }

    const fn graph_optimization(&self) -> GraphOptimizationLevel {
        match self.optimization_level {
            0 => GraphOptimizationLevel::Disable,
            1 => GraphOptimizationLevel::Level1,
            2 => GraphOptimizationLevel::Level2,
            _ => GraphOptimizationLevel::Level3,
        }
    }

    fn build_session(&self, path: &Path) -> ort::Result<Session> {
        let mut builder = Session::builder()?.with_optimization_level(self.graph_optimization())?;
        if let Some(threads) = self.intra_threads {
            builder = builder.with_intra_threads(threads)?;
        }
        builder.commit_from_file(path)
    }
}

impl Default for OrtBackend {
    fn default() -> Self {
        Self::new(3, None)
    }
}

impl InferenceBackend for OrtBackend {
    fn name(&self) -> &'static str {
        "onnxruntime"
    }

    fn load(&self, path: &Path) -> Result<Box<dyn ModelSession>, BackendError> {
        let session = self.build_session(path)?;
        Ok(Box::new(OrtSession { session }))
    }
}

struct OrtSession {
    session: Session,
}

impl ModelSession for OrtSession {
    fn input_names(&self) -> Vec<String> {
        self.session
            .inputs()
            .iter()
            .map(|input| input.name().to_string())
            .collect()
    }

    fn output_names(&self) -> Vec<String> {
        self.session
            .outputs()
            .iter()
            .map(|output| output.name().to_string())
            .collect()
    }

    #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
    fn run(
        &mut self,
        input_name: &str,
        output_name: &str,
        input: &Tensor,
    ) -> Result<Tensor, BackendError> {
        let dims: Vec<i64> = input.shape().iter().map(|&d| d as i64).collect();
        let value = TensorRef::from_array_view((dims, input.as_slice()))?;

        let outputs = self.session.run(ort::inputs![input_name => value])?;

        let (shape, data) = outputs[output_name].try_extract_tensor::<f32>()?;
        // Safe: tensor dimensions are always non-negative
        let shape: Vec<usize> = shape.iter().map(|&d| d as usize).collect();

        Ok(Tensor::from_shape_vec(&shape, data.to_vec())?)
    }
}
