//! Numeric conversions for pixel coordinates

use crate::{Error, Result};

/// Truncate a floating point offset to whole pixels, toward zero
///
/// Non-finite input maps to 0 and out-of-range input saturates, so a
/// runaway pose angle can never wrap around to the other side of the canvas.
#[must_use]
#[allow(clippy::cast_possible_truncation)] // Saturating `as` cast is intended
pub fn trunc_px(value: f64) -> i32 {
    if value.is_finite() {
        value.trunc() as i32
    } else {
        0
    }
}

/// Convert a pixel dimension to a signed coordinate, saturating at `i32::MAX`
#[must_use]
pub fn dim_to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Convert a signed pixel count to an unsigned dimension
///
/// # Errors
///
/// Returns an error if the value is negative
pub fn i32_to_dim(value: i32) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::InvalidInput(format!("Dimension {value} is negative")))
}
