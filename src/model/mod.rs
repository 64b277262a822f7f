//! Style table, inference backends and the session registry.

mod backend;
pub mod download;
mod registry;
mod style;

pub use backend::{InferenceBackend, ModelSession, OrtBackend};
pub use registry::{SessionRegistry, SessionState, StyleSession};
pub use style::StyleId;
