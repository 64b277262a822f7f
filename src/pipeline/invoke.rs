//! Running one inference call against a cached session.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::codec::Tensor;
use crate::error::{Error, Result};
use crate::model::StyleSession;

/// Output tensor of one inference call and how long the call took.
#[derive(Debug, Clone)]
pub struct InferenceResult {
    pub tensor: Tensor,
    pub elapsed: Duration,
}

impl InferenceResult {
    #[must_use]
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }
}

/// Bind `input` to the session's input slot, run it on the blocking pool and
/// return the tensor in its output slot.
///
/// Cancelling `cancel` returns [`Error::Cancelled`] right away; the backend
/// call itself runs to completion in the background and its output is dropped.
///
/// # Errors
///
/// Returns [`Error::Inference`] with the backend's message if the computation
/// fails.
pub async fn run(
    session: Arc<StyleSession>,
    input: Tensor,
    cancel: &CancellationToken,
) -> Result<InferenceResult> {
    let style = session.style();
    tracing::debug!("Running {style} on input of shape {:?}", input.shape());

    let task = tokio::task::spawn_blocking(move || {
        let mut guard = session.lock();
        let start = Instant::now();
        let output = guard.run(session.input_name(), session.output_name(), &input);
        (output, start.elapsed())
    });

    let (output, elapsed) = tokio::select! {
        biased;
        () = cancel.cancelled() => return Err(Error::Cancelled),
        joined = task => joined.map_err(|join| Error::Inference {
            style,
            source: Box::new(join),
        })?,
    };

    let tensor = output.map_err(|source| Error::Inference { style, source })?;
    tracing::debug!(
        "Style transfer completed in {:.3} seconds, output shape {:?}",
        elapsed.as_secs_f64(),
        tensor.shape()
    );

    Ok(InferenceResult { tensor, elapsed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{TENSOR_LEN, TENSOR_SHAPE};
    use crate::model::{InferenceBackend, SessionRegistry, StyleId};
    use crate::testing::{write_artifact, MockBackend};

    async fn session(backend: MockBackend) -> (tempfile::TempDir, Arc<StyleSession>) {
        let dir = tempfile::tempdir().unwrap();
        write_artifact(dir.path(), StyleId::Mosaic);
        let backend: Arc<dyn InferenceBackend> = Arc::new(backend);
        let registry = SessionRegistry::new(backend, dir.path());
        let session = registry.acquire(StyleId::Mosaic).await.unwrap();
        (dir, session)
    }

    fn input() -> Tensor {
        Tensor::from_shape_vec(&TENSOR_SHAPE, vec![100.0; TENSOR_LEN]).unwrap()
    }

    #[tokio::test]
    async fn test_run_returns_output_and_timing() {
        let (_dir, session) = session(MockBackend::default()).await;
        let result = run(session, input(), &CancellationToken::new()).await.unwrap();

        assert_eq!(result.tensor.shape(), &TENSOR_SHAPE);
        assert!(result.elapsed_secs() >= 0.0);
    }

    #[tokio::test]
    async fn test_backend_failure_carries_message() {
        let (_dir, session) = session(MockBackend::failing_runs("arena exhausted")).await;
        let err = run(Arc::clone(&session), input(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Inference { style: StyleId::Mosaic, .. }));
        assert!(err.to_string().contains("arena exhausted"));
    }

    #[tokio::test]
    async fn test_cancelled_before_completion() {
        let backend = MockBackend::default().with_run_delay(Duration::from_millis(500));
        let (_dir, session) = session(backend).await;
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = run(session, input(), &cancel).await.unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }
}
