//! Shared test utilities: small real image files on disk.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! let source = tmp.path().join("src.png");
//! write_test_png(&source, 20, 10);
//! ```

use image::{Rgba, RgbaImage};
use std::path::Path;

/// A `width`×`height` image split into four colored quadrants, so crops,
/// flips and rotations are visible in pixel assertions.
pub fn quadrants(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        match (x < width / 2, y < height / 2) {
            (true, true) => Rgba([255, 0, 0, 255]),
            (false, true) => Rgba([0, 255, 0, 255]),
            (true, false) => Rgba([0, 0, 255, 255]),
            (false, false) => Rgba([255, 255, 0, 255]),
        }
    })
}

/// Write a [`quadrants`] PNG to `path`, creating parent directories.
pub fn write_test_png(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    quadrants(width, height).save(path).unwrap();
}
