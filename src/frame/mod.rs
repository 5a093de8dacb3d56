//! Raster frame handling
//!
//! This module provides functionality for:
//! - Holding the per-tick RGBA raster the scene draws into
//! - Thresholding that raster down to the two levels a flip-dot panel can show
//! - Writing the raster to disk as a PNG preview

pub mod artifact;
pub mod binarize;
pub mod canvas;

pub use artifact::save_png;
pub use canvas::Canvas;
