//! Fast SIMD-accelerated grayscale resizing.
//!
//! Uses the fast_image_resize crate, which picks AVX2/NEON kernels when
//! available. Hashing requires Lanczos resampling, so the resize always
//! runs a Lanczos3 convolution.

use crate::error::HashError;
use fast_image_resize::{images::Image, FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::{GrayImage, ImageBuffer, Luma};

/// Resize a grayscale image to the given dimensions with Lanczos3
pub fn resize_gray(id: &str, gray: &GrayImage, width: u32, height: u32) -> Result<GrayImage, HashError> {
    let fail = |reason: String| HashError::ImageDecodeFailed {
        id: id.to_string(),
        reason,
    };

    let src_width = gray.width();
    let src_height = gray.height();
    if src_width == 0 || src_height == 0 {
        return Err(fail("image has a zero dimension".to_string()));
    }

    let src_image = Image::from_vec_u8(src_width, src_height, gray.as_raw().clone(), PixelType::U8)
        .map_err(|e| fail(format!("failed to create source image: {e}")))?;

    let mut dst_image = Image::new(width, height, PixelType::U8);

    let options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Lanczos3));

    Resizer::new()
        .resize(&src_image, &mut dst_image, &options)
        .map_err(|e| fail(format!("resize failed: {e}")))?;

    let buffer: ImageBuffer<Luma<u8>, Vec<u8>> =
        ImageBuffer::from_raw(width, height, dst_image.into_vec())
            .ok_or_else(|| fail("failed to create result buffer".to_string()))?;

    Ok(buffer)
}
