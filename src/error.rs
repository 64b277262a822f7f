//! Custom error types for neural-style.

use std::path::PathBuf;
use thiserror::Error;

use crate::model::StyleId;

/// Boxed error produced by an inference backend.
pub type BackendError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for the neural-style library.
#[derive(Error, Debug)]
pub enum Error {
    /// The source image is empty or its buffer does not match its dimensions.
    #[error("invalid source image: {reason}")]
    Decode { reason: String },

    /// A tensor does not have the element count the model contract requires.
    #[error("tensor shape mismatch: expected {expected}, got {actual}")]
    Shape { expected: String, actual: String },

    /// The model artifact for a style is missing, unreadable or rejected by the backend.
    #[error("failed to load model for style {style} from {path}: {source}")]
    ModelLoad {
        style: StyleId,
        path: PathBuf,
        #[source]
        source: BackendError,
    },

    /// The backend failed while running inference.
    #[error("inference failed for style {style}: {source}")]
    Inference {
        style: StyleId,
        #[source]
        source: BackendError,
    },

    /// The request was cancelled before it completed.
    #[error("style transfer cancelled")]
    Cancelled,

    /// Failed to load an image file.
    #[error("failed to load image from {path}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Failed to save an image file.
    #[error("failed to save image to {path}: {source}")]
    ImageSave {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Failed to download a model artifact.
    #[error("failed to download model {name}: {source}")]
    ModelDownload {
        name: String,
        #[source]
        source: reqwest::Error,
    },

    /// Failed to create the models directory.
    #[error("failed to create models directory {path}: {source}")]
    ModelDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of an [`Error`], for callers that present the kind to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or empty source image.
    Decode,
    /// Model output broke the tensor contract.
    Shape,
    /// Artifact missing, unreadable or rejected.
    ModelLoad,
    /// Backend computation failed.
    Inference,
    /// Request cancelled by the caller.
    Cancelled,
    /// File, network or directory failure.
    Io,
    /// Configuration or argument out of range.
    InvalidParameter,
}

impl Error {
    /// The kind of failure, independent of its payload.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Decode { .. } => ErrorKind::Decode,
            Self::Shape { .. } => ErrorKind::Shape,
            Self::ModelLoad { .. } => ErrorKind::ModelLoad,
            Self::Inference { .. } => ErrorKind::Inference,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::InvalidParameter { .. } => ErrorKind::InvalidParameter,
            Self::ImageLoad { .. }
            | Self::ImageSave { .. }
            | Self::ModelDownload { .. }
            | Self::ModelDir { .. }
            | Self::Io(_) => ErrorKind::Io,
        }
    }
}

/// Result type alias for neural-style operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        let err = Error::Decode {
            reason: "empty".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert_eq!(Error::Cancelled.kind(), ErrorKind::Cancelled);
    }

    #[test]
    fn test_inference_message_carries_backend_text() {
        let err = Error::Inference {
            style: StyleId::Candy,
            source: "out of memory".into(),
        };
        assert_eq!(err.to_string(), "inference failed for style candy: out of memory");
    }
}
