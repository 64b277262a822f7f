//! Inference invocation and the end-to-end style transfer pipeline.

mod config;
mod invoke;
mod transfer;

pub use config::Config;
pub use invoke::{run, InferenceResult};
pub use transfer::{StyleTransfer, StyleTransferOutcome};
