//! Utility functions for pixel buffers and coordinate conversions.

pub mod safe_cast;

use crate::{canvas::Color, landmarks::SegmentationMask, Error, Result};

/// Replace background pixels of an interleaved 3-channel image
///
/// `pixels` holds `width * height` pixels of three bytes each, in the same
/// channel order as [`Color`]. A pixel is kept when the mask's foreground
/// probability at that position is above `threshold`; otherwise it is
/// overwritten with `background`. The mask is sampled with nearest-neighbor
/// scaling when its resolution differs from the image.
///
/// Returns the number of replaced pixels.
///
/// # Errors
///
/// Returns an error if the buffer length does not match the dimensions
pub fn replace_background(
    pixels: &mut [u8],
    width: u32,
    height: u32,
    mask: &SegmentationMask,
    threshold: f32,
    background: Color,
) -> Result<usize> {
    let expected = width as usize * height as usize * 3;
    if pixels.len() != expected {
        return Err(Error::InvalidInput(format!(
            "Pixel buffer of {} bytes does not match {width}x{height}x3",
            pixels.len()
        )));
    }
    if width == 0 || height == 0 {
        return Ok(0);
    }

    let fill = background.to_array();
    let mut replaced = 0;
    for (index, pixel) in pixels.chunks_exact_mut(3).enumerate() {
        let x = (index % width as usize) as u64;
        let y = (index / width as usize) as u64;
        let mask_x = x * u64::from(mask.width()) / u64::from(width);
        let mask_y = y * u64::from(mask.height()) / u64::from(height);

        let keep = mask.is_foreground(
            u32::try_from(mask_x).unwrap_or(u32::MAX),
            u32::try_from(mask_y).unwrap_or(u32::MAX),
            threshold,
        );
        if !keep {
            pixel.copy_from_slice(&fill);
            replaced += 1;
        }
    }

    Ok(replaced)
}
