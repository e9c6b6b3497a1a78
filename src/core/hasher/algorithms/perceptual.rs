//! Perceptual Hash (pHash) implementation.
//!
//! pHash extracts frequency information with a 2-D DCT-II, which makes it
//! robust to scaling, brightness shifts and compression artifacts:
//! 1. Resize the grayscale image to size x size (32 by default)
//! 2. Compute the low-frequency block of the 2-D DCT in double precision
//! 3. Take the median of the block's coefficients, excluding the DC term
//! 4. Each bit is 1 if its coefficient exceeds the median, packed
//!    row-major, most-significant bit first

use super::PHASH_BLOCK_SIZE;
use image::GrayImage;
use std::f64::consts::{FRAC_1_SQRT_2, PI};

/// Relative magnitude below which a DCT coefficient is treated as zero.
///
/// Accumulated f64 rounding leaves residue on coefficients that are
/// mathematically zero (flat images); without the flush that residue
/// straddles the median and flips bits nondeterministically across
/// summation orders.
const NOISE_FLOOR: f64 = 1e-12;

/// Compute a 64-bit pHash from a square grayscale grid
pub fn phash(gray: &GrayImage) -> u64 {
    let n = gray.width() as usize;
    let pixels: Vec<f64> = gray.as_raw().iter().map(|&p| f64::from(p)).collect();

    let mut block = dct_low_frequency_block(&pixels, n, PHASH_BLOCK_SIZE);
    flush_noise(&mut block);

    let threshold = median(&block[1..]);
    let mut hash: u64 = 0;
    for coefficient in &block {
        hash = (hash << 1) | u64::from(*coefficient > threshold);
    }
    hash
}

/// The top-left `block` x `block` coefficients of the 2-D DCT-II.
///
/// `DCT[u,v] = sqrt(2/n) * C(u) * C(v) * sum over x,y of
/// M[x,y] * cos((2x+1)u*pi / 2n) * cos((2y+1)v*pi / 2n)`
/// with `C(0) = 1/sqrt(2)` and `C(k>0) = 1`. Coefficients outside the
/// low-frequency block never feed the hash, so only the block is computed.
fn dct_low_frequency_block(pixels: &[f64], n: usize, block: usize) -> Vec<f64> {
    let cos_table: Vec<Vec<f64>> = (0..block)
        .map(|u| {
            (0..n)
                .map(|x| (((2 * x + 1) * u) as f64 * PI / (2 * n) as f64).cos())
                .collect()
        })
        .collect();

    let scale = (2.0 / n as f64).sqrt();
    let mut coefficients = vec![0.0; block * block];
    for u in 0..block {
        for v in 0..block {
            let mut total = 0.0;
            for x in 0..n {
                for y in 0..n {
                    total += pixels[x * n + y] * cos_table[u][x] * cos_table[v][y];
                }
            }
            let cu = if u == 0 { FRAC_1_SQRT_2 } else { 1.0 };
            let cv = if v == 0 { FRAC_1_SQRT_2 } else { 1.0 };
            coefficients[u * block + v] = scale * cu * cv * total;
        }
    }
    coefficients
}

/// Zero every coefficient whose magnitude is negligible next to the block's
/// largest one
fn flush_noise(coefficients: &mut [f64]) {
    let max_abs = coefficients.iter().fold(0.0f64, |acc, c| acc.max(c.abs()));
    if max_abs == 0.0 {
        return;
    }
    let floor = max_abs * NOISE_FLOOR;
    for coefficient in coefficients.iter_mut() {
        if coefficient.abs() < floor {
            *coefficient = 0.0;
        }
    }
}

/// Median of a slice; empty slices yield 0, even lengths average the two
/// central values
fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma};

    fn uniform_image(value: u8) -> GrayImage {
        ImageBuffer::from_pixel(32, 32, Luma([value]))
    }

    #[test]
    fn uniform_image_sets_only_the_dc_bit() {
        // All AC coefficients are zero, so only the DC term beats the median
        let expected = 1u64 << (PHASH_BLOCK_SIZE * PHASH_BLOCK_SIZE - 1);

        assert_eq!(phash(&uniform_image(200)), expected);
        assert_eq!(phash(&uniform_image(1)), expected);
    }

    #[test]
    fn black_image_sets_no_bits() {
        // Every coefficient is exactly zero; none exceeds the zero median
        assert_eq!(phash(&uniform_image(0)), 0);
    }

    #[test]
    fn identical_images_produce_identical_hashes() {
        let image: GrayImage =
            ImageBuffer::from_fn(32, 32, |x, y| Luma([((x * 7 + y * 13) % 256) as u8]));

        assert_eq!(phash(&image), phash(&image));
    }

    #[test]
    fn structurally_different_images_differ() {
        let horizontal: GrayImage = ImageBuffer::from_fn(32, 32, |x, _| Luma([(x * 8) as u8]));
        let vertical: GrayImage = ImageBuffer::from_fn(32, 32, |_, y| Luma([(y * 8) as u8]));

        assert_ne!(phash(&horizontal), phash(&vertical));
    }

    #[test]
    fn dc_coefficient_tracks_mean_brightness() {
        let dark = vec![10.0; 32 * 32];
        let bright = vec![250.0; 32 * 32];

        let dark_dc = dct_low_frequency_block(&dark, 32, 8)[0];
        let bright_dc = dct_low_frequency_block(&bright, 32, 8)[0];

        assert!(bright_dc > dark_dc);
        assert!(dark_dc > 0.0);
    }

    #[test]
    fn median_of_empty_is_zero() {
        assert_eq!(median(&[]), 0.0);
    }

    #[test]
    fn median_of_odd_length_is_middle_element() {
        assert_eq!(median(&[5.0, 1.0, 3.0]), 3.0);
    }

    #[test]
    fn median_of_even_length_averages_central_pair() {
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
    }

    #[test]
    fn noise_flush_zeroes_residue_but_keeps_signal() {
        let mut coefficients = vec![1000.0, 1e-11, -3.0, -1e-12];
        flush_noise(&mut coefficients);

        assert_eq!(coefficients, vec![1000.0, 0.0, -3.0, 0.0]);
    }
}
