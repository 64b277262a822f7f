//! Image loading and tensor encoding.

use std::path::Path;

use image::{imageops::FilterType, RgbaImage};
use ndarray::Array4;

use crate::error::{Error, Result};

use super::{Image, Tensor, MODEL_SIZE, RGBA_CHANNELS, RGB_CHANNELS};

/// Load an image file and convert it to an RGBA [`Image`].
///
/// Any format the `image` crate can decode is accepted.
///
/// # Errors
///
/// Returns an error if the file cannot be read or decoded.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<Image> {
    let path = path.as_ref();

    let img = image::open(path).map_err(|source| Error::ImageLoad {
        path: path.to_path_buf(),
        source,
    })?;

    let rgba = img.to_rgba8();
    tracing::debug!("Image loaded: {}x{}", rgba.width(), rgba.height());

    let (width, height) = rgba.dimensions();
    Ok(Image::new(width, height, rgba.into_raw()))
}

/// Convert an image to the `(1, 3, 224, 224)` planar model tensor.
///
/// The image is:
/// 1. Resized to 224x224 with bilinear filtering
/// 2. Stripped of its alpha channel
/// 3. Split into contiguous red, green and blue planes
/// 4. Kept in the raw [0, 255] range (the style models take pixel magnitudes)
///
/// # Errors
///
/// Returns [`Error::Decode`] if the image is empty or its buffer length does not
/// match `width * height * 4`.
#[allow(clippy::cast_possible_truncation)]
pub fn encode(image: Image) -> Result<Tensor> {
    validate(&image)?;

    let (width, height) = (image.width(), image.height());
    let source = RgbaImage::from_raw(width, height, image.into_raw()).ok_or_else(|| {
        Error::Decode {
            reason: format!("buffer does not hold a {width}x{height} RGBA image"),
        }
    })?;

    let resized = if (width, height) == (MODEL_SIZE, MODEL_SIZE) {
        source
    } else {
        image::imageops::resize(&source, MODEL_SIZE, MODEL_SIZE, FilterType::Triangle)
    };

    let size = MODEL_SIZE as usize;
    let mut tensor = Array4::<f32>::zeros((1, RGB_CHANNELS, size, size));

    for (x, y, pixel) in resized.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        tensor[[0, 0, y, x]] = f32::from(pixel[0]);
        tensor[[0, 1, y, x]] = f32::from(pixel[1]);
        tensor[[0, 2, y, x]] = f32::from(pixel[2]);
    }

    Ok(Tensor::from_array(tensor.into_dyn()))
}

fn validate(image: &Image) -> Result<()> {
    if image.as_raw().is_empty() {
        return Err(Error::Decode {
            reason: "pixel buffer is empty".to_string(),
        });
    }

    if image.width() == 0 || image.height() == 0 {
        return Err(Error::Decode {
            reason: format!("zero dimension {}x{}", image.width(), image.height()),
        });
    }

    let expected = u64::from(image.width()) * u64::from(image.height()) * RGBA_CHANNELS as u64;
    if image.as_raw().len() as u64 != expected {
        return Err(Error::Decode {
            reason: format!(
                "buffer holds {} bytes, {}x{} RGBA needs {expected}",
                image.as_raw().len(),
                image.width(),
                image.height()
            ),
        });
    }

    Ok(())
}
