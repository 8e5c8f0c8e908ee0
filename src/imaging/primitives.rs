//! Pixel primitives over single RGBA frames.
//!
//! Operations compose these; none of them know about pipelines, keys or
//! frames beyond the one buffer they are handed (except [`trim_bounds`] and
//! [`paint_transparent`], which span a whole canvas).

use super::calculations::rotated_bounds;
use super::canvas::Canvas;
use super::params::Color;
use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, RgbaImage};
use imageproc::geometric_transformations::{Interpolation, rotate_about_center};

/// Luma value a mask shape is drawn with.
pub const MASK_SHAPE: Luma<u8> = Luma([255]);

/// Copy a region. The caller guarantees it lies inside the image.
pub fn crop(image: &RgbaImage, x: u32, y: u32, width: u32, height: u32) -> RgbaImage {
    imageops::crop_imm(image, x, y, width, height).to_image()
}

pub fn resize(image: &RgbaImage, width: u32, height: u32, filter: FilterType) -> RgbaImage {
    imageops::resize(image, width, height, filter)
}

/// Place `image` at `offset` on a new `width`×`height` canvas filled with
/// `fill`. Parts falling outside the new canvas are cut off.
pub fn extent(
    image: &RgbaImage,
    width: u32,
    height: u32,
    offset: (i64, i64),
    fill: Color,
) -> RgbaImage {
    let mut out = RgbaImage::from_pixel(width, height, fill.rgba());
    imageops::overlay(&mut out, image, offset.0, offset.1);
    out
}

/// Surround `image` with a uniform border of `size` pixels.
pub fn border(image: &RgbaImage, size: u32, color: Color) -> RgbaImage {
    extent(
        image,
        image.width() + 2 * size,
        image.height() + 2 * size,
        (size as i64, size as i64),
        color,
    )
}

/// Multiply every pixel's alpha by `opacity` (clamped to `0.0..=1.0`).
pub fn scale_alpha(image: &mut RgbaImage, opacity: f32) {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity >= 1.0 {
        return;
    }
    for px in image.pixels_mut() {
        px[3] = (px[3] as f32 * opacity).round() as u8;
    }
}

/// Rotate clockwise by `degrees`, growing the canvas so nothing is cut off.
///
/// Quarter turns are exact; any other angle is resampled bilinearly with
/// `fill` in the uncovered corners.
pub fn rotate(image: &RgbaImage, degrees: f32, fill: Color) -> RgbaImage {
    let normalized = degrees.rem_euclid(360.0);
    if normalized == 0.0 {
        return image.clone();
    }
    if normalized == 90.0 {
        return imageops::rotate90(image);
    }
    if normalized == 180.0 {
        return imageops::rotate180(image);
    }
    if normalized == 270.0 {
        return imageops::rotate270(image);
    }

    let (bw, bh) = rotated_bounds(image.dimensions(), normalized);
    // Pad to the final bounds first; rotating in place would clip corners.
    let offset = (
        (bw as i64 - image.width() as i64) / 2,
        (bh as i64 - image.height() as i64) / 2,
    );
    let mut padded = RgbaImage::from_pixel(bw, bh, fill.rgba());
    imageops::replace(&mut padded, image, offset.0, offset.1);
    rotate_about_center(
        &padded,
        normalized.to_radians(),
        Interpolation::Bilinear,
        fill.rgba(),
    )
}

/// Smallest rectangle `(x, y, w, h)` holding every pixel that differs from
/// `background`, over all frames. `None` when every pixel matches.
pub fn trim_bounds(canvas: &Canvas, background: Color) -> Option<(u32, u32, u32, u32)> {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for frame in canvas.frames() {
        for (x, y, px) in frame.image.enumerate_pixels() {
            if background.matches(*px) {
                continue;
            }
            bounds = Some(match bounds {
                None => (x, y, x, y),
                Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
            });
        }
    }
    bounds.map(|(x0, y0, x1, y1)| (x0, y0, x1 - x0 + 1, y1 - y0 + 1))
}

/// Make part of every frame transparent through a drawn mask.
///
/// `draw` paints a shape with [`MASK_SHAPE`] onto an opaque black mask the
/// size of the canvas. With `invert == false` the shape becomes
/// transparent; with `invert == true` everything outside it does. The mask
/// lives only for the duration of this call.
pub fn paint_transparent(canvas: &mut Canvas, invert: bool, draw: impl FnOnce(&mut GrayImage)) {
    let (width, height) = canvas.dimensions();
    let mut mask = GrayImage::from_pixel(width, height, Luma([0]));
    draw(&mut mask);

    canvas.for_each_frame(|image| {
        for (x, y, px) in image.enumerate_pixels_mut() {
            let Some(m) = mask.get_pixel_checked(x, y) else {
                continue;
            };
            let in_shape = *m == MASK_SHAPE;
            if in_shape != invert {
                px[3] = 0;
            }
        }
    });
}
