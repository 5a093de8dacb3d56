//! PNG preview written in development mode
//!
//! When no panel is attached the binarized frame is saved to a fixed path
//! every tick so it can be inspected with any image viewer.

use anyhow::{Context, Result};
use image::ImageFormat;
use std::fs;
use std::path::Path;

use super::Canvas;

/// Save the canvas as a PNG, overwriting any previous frame
///
/// The parent directory is created if it does not exist yet.
pub fn save_png(canvas: &Canvas, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
    }

    canvas
        .image()
        .save_with_format(path, ImageFormat::Png)
        .with_context(|| format!("Failed to write frame: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::pixelcolor::Rgb888;
    use embedded_graphics::prelude::*;
    use image::Rgba;

    #[test]
    fn test_save_creates_directory_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output").join("frame.png");

        let mut canvas = Canvas::new(4, 2);
        canvas.binarize();
        save_png(&canvas, &path).unwrap();

        Pixel(Point::new(0, 0), Rgb888::WHITE).draw(&mut canvas).unwrap();
        save_png(&canvas, &path).unwrap();

        let written = image::open(&path).unwrap().to_rgba8();
        assert_eq!(written.dimensions(), (4, 2));
        assert_eq!(*written.get_pixel(0, 0), Rgba([255, 255, 255, 255]));
        assert_eq!(*written.get_pixel(1, 0), Rgba([0, 0, 0, 255]));
    }
}
