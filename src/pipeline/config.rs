//! Pipeline configuration.

use std::path::PathBuf;

use crate::error::{Error, Result};

/// Configuration for the style transfer pipeline.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the `<style>-9.onnx` artifacts.
    pub models_dir: PathBuf,

    /// ONNX Runtime graph optimization level (0-3).
    pub optimization_level: u8,

    /// Intra-op thread count. None lets the runtime decide.
    pub intra_threads: Option<usize>,

    /// Output JPEG quality (1-100).
    pub output_quality: u8,
}

impl Default for Config {
    fn default() -> Self {
        let base = dirs::cache_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            models_dir: base.join("neural-style").join("models"),
            optimization_level: 3,
            intra_threads: None,
            output_quality: 95,
        }
    }
}

impl Config {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any parameter is out of valid range.
    pub fn validate(&self) -> Result<()> {
        if self.models_dir.as_os_str().is_empty() {
            return Err(Error::InvalidParameter {
                name: "models_dir".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        if self.optimization_level > 3 {
            return Err(Error::InvalidParameter {
                name: "optimization_level".to_string(),
                reason: "must be between 0 and 3".to_string(),
            });
        }

        if self.intra_threads == Some(0) {
            return Err(Error::InvalidParameter {
                name: "intra_threads".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        if !(1..=100).contains(&self.output_quality) {
            return Err(Error::InvalidParameter {
                name: "output_quality".to_string(),
                reason: "must be between 1 and 100".to_string(),
            });
        }

        Ok(())
    }
}
