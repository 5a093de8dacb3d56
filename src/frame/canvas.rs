//! RGBA raster the scene draws into
//!
//! [`Canvas`] owns an [`RgbaImage`] sized to the panel and implements the
//! embedded-graphics [`DrawTarget`] trait so scenes can use its primitives,
//! fonts and styles directly.

use embedded_graphics::draw_target::DrawTarget;
use embedded_graphics::geometry::{OriginDimensions, Size};
use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use embedded_graphics::Pixel;
use image::{Rgba, RgbaImage};
use std::convert::Infallible;

use super::binarize::binarize;

/// Fixed-size RGBA frame buffer
#[derive(Debug, Clone)]
pub struct Canvas {
    image: RgbaImage,
}

impl Canvas {
    /// Create a transparent black canvas
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    /// Borrow the underlying raster
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Reset every pixel to fully transparent black
    pub fn clear_transparent(&mut self) {
        for pixel in self.image.pixels_mut() {
            *pixel = Rgba([0, 0, 0, 0]);
        }
    }

    /// Threshold the canvas in place, see [`binarize`]
    pub fn binarize(&mut self) {
        binarize(&mut self.image);
    }
}

impl OriginDimensions for Canvas {
    fn size(&self) -> Size {
        Size::new(self.image.width(), self.image.height())
    }
}

impl DrawTarget for Canvas {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let (width, height) = self.image.dimensions();

        for Pixel(point, color) in pixels {
            // Scenes may draw partly off-panel; those pixels are dropped
            if point.x < 0 || point.y < 0 {
                continue;
            }
            let (x, y) = (point.x as u32, point.y as u32);
            if x >= width || y >= height {
                continue;
            }
            self.image
                .put_pixel(x, y, Rgba([color.r(), color.g(), color.b(), 255]));
        }

        Ok(())
    }
}
