//! CLIP image preprocessing: resize-to-fill, center crop, per-channel normalization.

use candle_core::{Device, Tensor};
use image::DynamicImage;
use image::imageops::FilterType;

use crate::constants::{CLIP_PIXEL_MEAN, CLIP_PIXEL_STD};
use crate::embedding::error::EmbeddingError;

/// Rejects images the vision tower cannot consume.
pub fn validate_image(image: &DynamicImage) -> Result<(), EmbeddingError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(EmbeddingError::InvalidImage {
            reason: format!(
                "image has zero size ({}x{})",
                image.width(),
                image.height()
            ),
        });
    }
    Ok(())
}

/// Returns normalized pixel values in CHW order, `3 * size * size` long.
///
/// The shorter side is scaled to `size` and the center is cropped, matching the
/// reference CLIP processor. Alpha is discarded.
pub fn pixel_values(image: &DynamicImage, size: usize) -> Result<Vec<f32>, EmbeddingError> {
    validate_image(image)?;

    let side = u32::try_from(size).map_err(|_| EmbeddingError::InvalidConfig {
        reason: format!("image_size {size} does not fit in u32"),
    })?;

    let rgb = image
        .resize_to_fill(side, side, FilterType::CatmullRom)
        .to_rgb8();

    let plane = size * size;
    let mut values = vec![0.0f32; 3 * plane];
    for (i, pixel) in rgb.pixels().enumerate() {
        for channel in 0..3 {
            let scaled = f32::from(pixel.0[channel]) / 255.0;
            values[channel * plane + i] =
                (scaled - CLIP_PIXEL_MEAN[channel]) / CLIP_PIXEL_STD[channel];
        }
    }

    Ok(values)
}

/// Builds the `[1, 3, size, size]` input tensor on `device`.
pub fn pixel_tensor(
    image: &DynamicImage,
    size: usize,
    device: &Device,
) -> Result<Tensor, EmbeddingError> {
    let values = pixel_values(image, size)?;
    let tensor = Tensor::from_vec(values, (3, size, size), device)?.unsqueeze(0)?;
    Ok(tensor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, RgbaImage};

    #[test]
    fn test_zero_size_image_is_rejected() {
        let image = DynamicImage::new_rgb8(0, 10);
        let err = validate_image(&image).unwrap_err();
        assert!(err.is_input_error());
        assert!(err.to_string().contains("0x10"));
    }

    #[test]
    fn test_pixel_values_length_and_layout() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 20, Rgb([255, 0, 0])));
        let values = pixel_values(&image, 8).unwrap();
        assert_eq!(values.len(), 3 * 8 * 8);

        let red = (1.0 - CLIP_PIXEL_MEAN[0]) / CLIP_PIXEL_STD[0];
        let green = (0.0 - CLIP_PIXEL_MEAN[1]) / CLIP_PIXEL_STD[1];
        assert!((values[0] - red).abs() < 1e-4);
        assert!((values[64] - green).abs() < 1e-4);
    }

    #[test]
    fn test_alpha_channel_is_dropped() {
        let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            16,
            16,
            image::Rgba([10, 20, 30, 255]),
        ));
        let rgb = DynamicImage::ImageRgb8(RgbImage::from_pixel(16, 16, Rgb([10, 20, 30])));
        assert_eq!(pixel_values(&rgba, 4).unwrap(), pixel_values(&rgb, 4).unwrap());
    }

    #[test]
    fn test_pixel_tensor_shape() {
        let image = DynamicImage::new_rgb8(30, 30);
        let tensor = pixel_tensor(&image, 16, &Device::Cpu).unwrap();
        assert_eq!(tensor.dims(), &[1, 3, 16, 16]);
    }
}
