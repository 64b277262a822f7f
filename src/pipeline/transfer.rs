//! The end-to-end style transfer operation.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::codec::{self, Image, MODEL_SIZE};
use crate::error::{Error, Result};
use crate::model::{OrtBackend, SessionRegistry, StyleId};

use super::{invoke, Config};

/// Result of one style transfer request.
#[derive(Debug, Clone)]
pub struct StyleTransferOutcome {
    /// 224x224 RGBA output.
    pub image: Image,
    pub width: u32,
    pub height: u32,
    /// Wall-clock duration of the inference call alone.
    pub inference_time: Duration,
}

/// Runs images through style models, sharing one [`SessionRegistry`].
#[derive(Clone)]
pub struct StyleTransfer {
    registry: Arc<SessionRegistry>,
}

impl StyleTransfer {
    /// Pipeline over an existing registry, which may be shared with others.
    pub const fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    /// Build a pipeline on the ONNX Runtime backend from `config`.
    ///
    /// No model is loaded until the first request for its style.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        tracing::info!("Initializing pipeline with config: {config:?}");

        let backend = OrtBackend::new(config.optimization_level, config.intra_threads);
        let registry = SessionRegistry::new(Arc::new(backend), config.models_dir.clone());
        Ok(Self::new(Arc::new(registry)))
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Restyle `image` with `style`.
    ///
    /// # Errors
    ///
    /// Returns the first error from encoding, session loading, inference or
    /// decoding. Nothing is retried.
    pub async fn transfer_style(&self, image: Image, style: StyleId) -> Result<StyleTransferOutcome> {
        self.transfer_style_with_cancel(image, style, &CancellationToken::new())
            .await
    }

    /// [`transfer_style`](Self::transfer_style) that gives up with
    /// [`Error::Cancelled`] once `cancel` fires.
    ///
    /// # Errors
    ///
    /// As for `transfer_style`, plus `Cancelled`.
    pub async fn transfer_style_with_cancel(
        &self,
        image: Image,
        style: StyleId,
        cancel: &CancellationToken,
    ) -> Result<StyleTransferOutcome> {
        tracing::info!(
            "Processing {}x{} image with style {style}",
            image.width(),
            image.height()
        );

        let tensor = codec::encode(image)?;

        let session = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(Error::Cancelled),
            session = self.registry.acquire(style) => session?,
        };

        let result = invoke::run(session, tensor, cancel).await?;
        let image = codec::decode(&result.tensor)?;

        tracing::info!(
            "Style {style} applied in {:.3} seconds",
            result.elapsed_secs()
        );

        Ok(StyleTransferOutcome {
            image,
            width: MODEL_SIZE,
            height: MODEL_SIZE,
            inference_time: result.elapsed,
        })
    }
}
