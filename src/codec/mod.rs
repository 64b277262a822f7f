//! Conversion between RGBA pixel buffers and the planar model tensor.

mod decode;
mod encode;

pub use decode::{decode, save_image};
pub use encode::{encode, load_image};

use ndarray::{ArrayD, IxDyn};

use crate::error::{Error, Result};

/// Spatial size the style transfer models expect, for both input and output.
pub const MODEL_SIZE: u32 = 224;

/// Number of channels in the model tensor.
pub const RGB_CHANNELS: usize = 3;

/// Number of interleaved channels in an [`Image`] buffer.
pub const RGBA_CHANNELS: usize = 4;

/// Elements in one `(1, 3, 224, 224)` tensor.
pub const TENSOR_LEN: usize = RGB_CHANNELS * (MODEL_SIZE as usize) * (MODEL_SIZE as usize);

/// Shape of every model input and output tensor.
pub const TENSOR_SHAPE: [usize; 4] = [1, RGB_CHANNELS, MODEL_SIZE as usize, MODEL_SIZE as usize];

/// Decoded 2-D pixel buffer with 4 interleaved 8-bit channels (RGBA).
///
/// The buffer is not validated on construction; [`encode`] rejects images whose
/// byte length disagrees with `width * height * 4`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Image {
    /// Wrap an RGBA buffer of `width * height * 4` bytes.
    #[must_use]
    pub const fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data,
        }
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Interleaved RGBA bytes, row by row.
    #[must_use]
    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    /// Consume the image, returning its RGBA bytes.
    #[must_use]
    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }
}

/// Immutable `f32` tensor in row-major (standard) layout.
///
/// Tensors produced by [`encode`] always have shape `(1, 3, 224, 224)`; tensors
/// handed back by a backend may not, which [`decode`] reports as a shape error.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    data: ArrayD<f32>,
}

impl Tensor {
    /// Build a tensor from a shape and row-major data.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Shape`] if `data.len()` is not the product of `shape`.
    pub fn from_shape_vec(shape: &[usize], data: Vec<f32>) -> Result<Self> {
        let actual = data.len();
        ArrayD::from_shape_vec(IxDyn(shape), data)
            .map(|data| Self { data })
            .map_err(|_| Error::Shape {
                expected: format!("{} elements for {shape:?}", shape.iter().product::<usize>()),
                actual: format!("{actual} elements"),
            })
    }

    pub(crate) const fn from_array(data: ArrayD<f32>) -> Self {
        Self { data }
    }

    /// Dimensions, outermost first.
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// Total element count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Row-major view of the elements.
    ///
    /// # Panics
    ///
    /// Never: every constructor produces a standard-layout array.
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        self.data
            .as_slice()
            .expect("tensor constructors produce standard layout")
    }
}
