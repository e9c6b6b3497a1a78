//! Perceptual hash algorithms.
//!
//! Both hashes are 64-bit fingerprints computed from small grayscale
//! grids: dHash from adjacent-pixel brightness comparisons, pHash from the
//! sign of low-frequency DCT coefficients against their median.

mod difference;
mod perceptual;

pub use difference::dhash;
pub use perceptual::phash;

/// dHash comparison grid is DHASH_SIZE x DHASH_SIZE (input is one column wider)
pub const DHASH_SIZE: u32 = 8;
/// pHash input grid edge length
pub const PHASH_IMAGE_SIZE: u32 = 32;
/// pHash low-frequency block edge length
pub const PHASH_BLOCK_SIZE: usize = 8;
