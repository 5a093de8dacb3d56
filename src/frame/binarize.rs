//! Two-level thresholding of RGBA rasters
//!
//! A flip-dot can only be flipped or not, so every pixel is reduced to fully
//! on or fully off. This is a hard threshold on the mean of the color
//! channels: no dithering and no error diffusion, gradients are lost.

use image::{Rgba, RgbaImage};

/// Brightness a pixel must exceed to be switched on
pub const BRIGHTNESS_THRESHOLD: u16 = 127;

/// Channel value of an "on" pixel after binarization
pub const ON: u8 = 255;

/// Channel value of an "off" pixel after binarization
pub const OFF: u8 = 0;

/// Decide whether a single pixel is on
///
/// The mean of red, green and blue must be strictly greater than 127.
/// Compared on the channel sum so no rounding is involved.
pub fn threshold(r: u8, g: u8, b: u8) -> bool {
    let sum = u16::from(r) + u16::from(g) + u16::from(b);
    sum > BRIGHTNESS_THRESHOLD * 3
}

/// Binarize a raster in place
///
/// Color channels become 0 or 255 and alpha is forced to 255, the panel
/// has no notion of transparency.
pub fn binarize(image: &mut RgbaImage) {
    for pixel in image.pixels_mut() {
        let Rgba([r, g, b, _]) = *pixel;
        let level = if threshold(r, g, b) { ON } else { OFF };
        *pixel = Rgba([level, level, level, 255]);
    }
}
