//! # `neural-style`
//!
//! Fast neural style transfer with pretrained feed-forward ONNX models.
//!
//! An image is resized to the models' fixed 224x224 input, split into planar
//! RGB, run through the session for the chosen style and turned back into an
//! RGBA buffer. Sessions are loaded on first use and cached per style.
//!
//! ## Example
//!
//! ```no_run
//! use neural_style::{codec, Config, StyleId, StyleTransfer};
//!
//! # async fn run() -> neural_style::Result<()> {
//! let pipeline = StyleTransfer::from_config(&Config::default())?;
//! let image = codec::load_image("photo.jpg")?;
//!
//! let outcome = pipeline.transfer_style(image, StyleId::Mosaic).await?;
//! codec::save_image(&outcome.image, "mosaic.png", 95)?;
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod error;
pub mod model;
pub mod pipeline;

#[cfg(test)]
mod testing;

pub use codec::{Image, Tensor};
pub use error::{Error, ErrorKind, Result};
pub use model::{SessionRegistry, StyleId};
pub use pipeline::{Config, StyleTransfer, StyleTransferOutcome};
