//! Tensor decoding and image saving.

use std::path::Path;

use image::{DynamicImage, RgbaImage};

use crate::error::{Error, Result};

use super::{Image, Tensor, MODEL_SIZE, RGBA_CHANNELS, TENSOR_LEN};

/// Convert a planar `(1, 3, 224, 224)` tensor back to a 224x224 RGBA image.
///
/// Values are clamped to [0, 255] and rounded to the nearest integer, halves
/// away from zero. NaN becomes 0. Alpha is always 255.
///
/// # Errors
///
/// Returns [`Error::Shape`] if the tensor does not hold exactly `3 * 224 * 224`
/// elements.
pub fn decode(tensor: &Tensor) -> Result<Image> {
    if tensor.len() != TENSOR_LEN {
        return Err(Error::Shape {
            expected: format!("{TENSOR_LEN} elements"),
            actual: format!("{} elements (shape {:?})", tensor.len(), tensor.shape()),
        });
    }

    let data = tensor.as_slice();
    let plane = TENSOR_LEN / 3;
    let (red, rest) = data.split_at(plane);
    let (green, blue) = rest.split_at(plane);

    let mut pixels = Vec::with_capacity(plane * RGBA_CHANNELS);
    for ((&r, &g), &b) in red.iter().zip(green).zip(blue) {
        pixels.extend_from_slice(&[to_byte(r), to_byte(g), to_byte(b), u8::MAX]);
    }

    Ok(Image::new(MODEL_SIZE, MODEL_SIZE, pixels))
}

/// Save an image to disk.
///
/// The format is inferred from the extension; JPEG output drops alpha and uses
/// `quality` (1-100), other formats ignore it.
///
/// # Errors
///
/// Returns an error if the buffer is malformed or the file cannot be written.
pub fn save_image<P: AsRef<Path>>(image: &Image, path: P, quality: u8) -> Result<()> {
    let path = path.as_ref();

    let buffer = RgbaImage::from_raw(image.width(), image.height(), image.as_raw().to_vec())
        .ok_or_else(|| Error::Decode {
            reason: format!(
                "buffer does not hold a {}x{} RGBA image",
                image.width(),
                image.height()
            ),
        })?;
    let img = DynamicImage::ImageRgba8(buffer);

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("png")
        .to_lowercase();

    match extension.as_str() {
        "jpg" | "jpeg" => {
            let mut output = std::fs::File::create(path)?;
            let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut output, quality);
            DynamicImage::ImageRgb8(img.to_rgb8())
                .write_with_encoder(encoder)
                .map_err(|source| Error::ImageSave {
                    path: path.to_path_buf(),
                    source,
                })?;
        }
        _ => {
            img.save(path).map_err(|source| Error::ImageSave {
                path: path.to_path_buf(),
                source,
            })?;
        }
    }

    Ok(())
}

/// Clamp a model output value into a byte.
#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_byte(value: f32) -> u8 {
    if value.is_nan() {
        return 0;
    }
    // Safe: clamped to [0, 255] before casting
    value.clamp(0.0, 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::TENSOR_SHAPE;

    fn planes(r: f32, g: f32, b: f32) -> Vec<f32> {
        let plane = TENSOR_LEN / 3;
        let mut data = vec![r; plane];
        data.extend(std::iter::repeat(g).take(plane));
        data.extend(std::iter::repeat(b).take(plane));
        data
    }

    #[test]
    fn test_to_byte_clamps() {
        assert_eq!(to_byte(-12.5), 0);
        assert_eq!(to_byte(310.0), 255);
        assert_eq!(to_byte(f32::NAN), 0);
    }

    #[test]
    fn test_to_byte_rounds_half_up() {
        assert_eq!(to_byte(0.49), 0);
        assert_eq!(to_byte(0.5), 1);
        assert_eq!(to_byte(127.5), 128);
        assert_eq!(to_byte(254.6), 255);
    }

    #[test]
    fn test_output_dimensions() {
        let tensor = Tensor::from_shape_vec(&TENSOR_SHAPE, planes(1.0, 2.0, 3.0)).unwrap();
        let image = decode(&tensor).unwrap();

        assert_eq!((image.width(), image.height()), (MODEL_SIZE, MODEL_SIZE));
        assert_eq!(image.as_raw().len(), 224 * 224 * 4);
        assert_eq!(&image.as_raw()[..4], &[1, 2, 3, 255]);
    }

    #[test]
    fn test_out_of_range_values_clamp() {
        let tensor = Tensor::from_shape_vec(&TENSOR_SHAPE, planes(-12.5, 310.0, 42.0)).unwrap();
        let image = decode(&tensor).unwrap();
        assert!(image.as_raw().chunks_exact(4).all(|px| px == [0, 255, 42, 255]));
    }

    #[test]
    fn test_blue_plane_changes_leave_red_and_green() {
        let base = planes(10.0, 20.0, 30.0);
        let mut altered = base.clone();
        let plane = TENSOR_LEN / 3;
        for (i, v) in altered[2 * plane..].iter_mut().enumerate() {
            *v = (i % 256) as f32;
        }

        let a = decode(&Tensor::from_shape_vec(&TENSOR_SHAPE, base).unwrap()).unwrap();
        let b = decode(&Tensor::from_shape_vec(&TENSOR_SHAPE, altered).unwrap()).unwrap();

        for (pa, pb) in a.as_raw().chunks_exact(4).zip(b.as_raw().chunks_exact(4)) {
            assert_eq!(pa[..2], pb[..2]);
        }
    }

    #[test]
    fn test_wrong_element_count_is_shape_error() {
        let tensor = Tensor::from_shape_vec(&[1, 3, 112, 112], vec![0.0; 3 * 112 * 112]).unwrap();
        assert!(matches!(decode(&tensor), Err(Error::Shape { .. })));
    }

    #[test]
    fn test_flat_tensor_with_right_count_decodes() {
        let tensor = Tensor::from_shape_vec(&[TENSOR_LEN], planes(5.0, 5.0, 5.0)).unwrap();
        assert!(decode(&tensor).is_ok());
    }

    #[test]
    fn test_save_and_reload_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let tensor = Tensor::from_shape_vec(&TENSOR_SHAPE, planes(9.0, 99.0, 199.0)).unwrap();
        let image = decode(&tensor).unwrap();

        save_image(&image, &path, 95).unwrap();
        let reloaded = crate::codec::load_image(&path).unwrap();
        assert_eq!(reloaded, image);
    }
}
