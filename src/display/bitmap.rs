//! One-bit-per-dot image

use image::RgbaImage;

use crate::frame::binarize::ON;

/// Row-major grid of on/off dots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    cells: Vec<bool>,
}

impl Bitmap {
    /// All dots off
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![false; (width * height) as usize],
        }
    }

    /// Read a binarized raster: a dot is on when its color channels are all 255
    pub fn from_rgba(image: &RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        let mut bitmap = Self::new(width, height);
        for (x, y, p) in image.enumerate_pixels() {
            bitmap.set(x, y, p[0] == ON && p[1] == ON && p[2] == ON);
        }
        bitmap
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Dot state; out-of-range coordinates read as off
    pub fn get(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        self.cells[(y * self.width + x) as usize]
    }

    /// Set a dot; out-of-range coordinates are ignored
    pub fn set(&mut self, x: u32, y: u32, on: bool) {
        if x >= self.width || y >= self.height {
            return;
        }
        self.cells[(y * self.width + x) as usize] = on;
    }

    /// Number of dots switched on
    pub fn count_on(&self) -> usize {
        self.cells.iter().filter(|&&on| on).count()
    }
}
