//! Difference Hash (dHash) implementation.
//!
//! dHash works by:
//! 1. Resizing the grayscale image to (size+1) x size
//! 2. Comparing each pixel to the one on its right
//! 3. If the left pixel is brighter, the bit is 1, else 0
//!
//! This captures the relative gradient of brightness changes. Bits are
//! packed row-major, most-significant bit first.

use image::GrayImage;

/// Compute a 64-bit dHash from a (size+1) x size grayscale grid.
///
/// Rows x (columns-1) comparisons must not exceed 64; the default 9x8
/// grid yields exactly 64 bits.
pub fn dhash(gray: &GrayImage) -> u64 {
    let rows = gray.height();
    let cols = gray.width().saturating_sub(1);

    let mut hash: u64 = 0;
    for row in 0..rows {
        for col in 0..cols {
            let left = gray.get_pixel(col, row)[0];
            let right = gray.get_pixel(col + 1, row)[0];
            hash = (hash << 1) | u64::from(left > right);
        }
    }
    hash
}
