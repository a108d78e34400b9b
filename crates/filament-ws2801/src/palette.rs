//! Random frame colors for the animation loop

use filament_core::{Color, ResourceError};

/// Channel values step in buckets of 32: {0, 32, ..., 224}
const BUCKET_MASK: u8 = 0b1110_0000;

/// One uniformly random color per pixel
pub fn random_frame(len: usize) -> Result<Vec<Color>, ResourceError> {
    let mut entropy = vec![0u8; len * 3];
    getrandom::getrandom(&mut entropy)
        .map_err(|e| ResourceError::bus(format!("Entropy source unavailable: {}", e)))?;

    Ok(entropy
        .chunks_exact(3)
        .map(|c| Color::new(quantize(c[0]), quantize(c[1]), quantize(c[2])))
        .collect())
}

/// Keep the top three bits, so each of the 8 buckets is equally likely
fn quantize(byte: u8) -> u8 {
    byte & BUCKET_MASK
}
