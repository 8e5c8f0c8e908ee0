//! Pure calculation functions for image geometry.
//!
//! All functions here are pure and testable without any I/O or images.
//! Integer results follow one rule throughout: scaled sizes and centering
//! offsets are truncated toward zero, never rounded, unless the function
//! says otherwise.

use super::params::{Anchor, FitMode, Placement};

/// Resolve a fit target against the original size.
///
/// - both zero: the original size (no-op scale)
/// - one zero: derived from the other through the source aspect ratio
///
/// Returns `None` when either side does not resolve to a positive integer.
///
/// # Examples
/// ```
/// # use imagesmith::imaging::calculations::resolve_target;
/// assert_eq!(resolve_target((200, 100), (0, 0)), Some((200, 100)));
/// assert_eq!(resolve_target((200, 100), (100, 0)), Some((100, 50)));
/// assert_eq!(resolve_target((200, 100), (0, 25)), Some((50, 25)));
/// assert_eq!(resolve_target((200, 1), (100, 0)), None);
/// ```
pub fn resolve_target(original: (u32, u32), target: (u32, u32)) -> Option<(u32, u32)> {
    let (ow, oh) = original;
    if ow == 0 || oh == 0 {
        return None;
    }
    let (mut tw, mut th) = target;
    if tw == 0 && th == 0 {
        return Some(original);
    }
    if tw == 0 {
        tw = (ow as f64 * (th as f64 / oh as f64)) as u32;
    }
    if th == 0 {
        th = (oh as f64 * (tw as f64 / ow as f64)) as u32;
    }
    (tw > 0 && th > 0).then_some((tw, th))
}

/// Scalar scale factor for a fit mode.
pub fn fit_scale(mode: FitMode, original: (u32, u32), target: (u32, u32)) -> f64 {
    let sw = target.0 as f64 / original.0 as f64;
    let sh = target.1 as f64 / original.1 as f64;
    match mode {
        FitMode::Fit => sw.min(sh),
        FitMode::FitWidth => sw,
        FitMode::FitHeight => sh,
        FitMode::Fill => sw.max(sh),
    }
}

/// Multiply both sides by `scale` and truncate.
///
/// A tiny epsilon absorbs float error so that e.g. `3 * (10 / 3)` lands on
/// 10 rather than 9.
pub fn scale_dimensions(original: (u32, u32), scale: f64) -> (u32, u32) {
    const EPSILON: f64 = 1e-9;
    (
        (original.0 as f64 * scale + EPSILON) as u32,
        (original.1 as f64 * scale + EPSILON) as u32,
    )
}

/// Offset of a centered `target` window inside larger `scaled` content.
pub fn center_crop_offset(scaled: (u32, u32), target: (u32, u32)) -> (i64, i64) {
    (
        (scaled.0 as i64 - target.0 as i64) / 2,
        (scaled.1 as i64 - target.1 as i64) / 2,
    )
}

/// Where `content` goes on a `canvas` for a 9-point anchor.
///
/// Offsets may be negative when the content is larger than the canvas on
/// that axis (`fitWidth` on a tall image, for instance).
pub fn anchor_offset(anchor: Anchor, canvas: (u32, u32), content: (u32, u32)) -> (i64, i64) {
    let dx = canvas.0 as i64 - content.0 as i64;
    let dy = canvas.1 as i64 - content.1 as i64;
    let (cx, cy) = (dx / 2, dy / 2);
    match anchor {
        Anchor::TopLeft => (0, 0),
        Anchor::TopCenter => (cx, 0),
        Anchor::TopRight => (dx, 0),
        Anchor::CenterLeft => (0, cy),
        Anchor::Center => (cx, cy),
        Anchor::CenterRight => (dx, cy),
        Anchor::BottomLeft => (0, dy),
        Anchor::BottomCenter => (cx, dy),
        Anchor::BottomRight => (dx, dy),
    }
}

/// Where a watermark of size `mark` goes on a `base` image.
pub fn placement_offset(placement: Placement, base: (u32, u32), mark: (u32, u32)) -> (i64, i64) {
    let dx = base.0 as i64 - mark.0 as i64;
    let dy = base.1 as i64 - mark.1 as i64;
    match placement {
        Placement::TopLeft => (0, 0),
        Placement::TopRight => (dx, 0),
        Placement::BottomLeft => (0, dy),
        Placement::BottomRight => (dx, dy),
        Placement::Top => (dx / 2, 0),
        Placement::Bottom => (dx / 2, dy),
        Placement::Left => (0, dy / 2),
        Placement::Right => (dx, dy / 2),
        Placement::Center => (dx / 2, dy / 2),
    }
}

/// Largest size with the source aspect ratio that fits inside `bounds`.
///
/// May grow the image. Sides are rounded and never drop below 1.
///
/// # Examples
/// ```
/// # use imagesmith::imaging::calculations::fit_within;
/// assert_eq!(fit_within((400, 300), (200, 200)), (200, 150));
/// assert_eq!(fit_within((10, 20), (100, 100)), (50, 100));
/// ```
pub fn fit_within(original: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let (ow, oh) = original;
    if ow == 0 || oh == 0 {
        return original;
    }
    let ratio = (bounds.0 as f64 / ow as f64).min(bounds.1 as f64 / oh as f64);
    (
        ((ow as f64 * ratio).round() as u32).max(1),
        ((oh as f64 * ratio).round() as u32).max(1),
    )
}

/// Shrink an overlay so it fits inside `base`, keeping its aspect ratio.
///
/// Returns `None` when the overlay already fits on both axes.
pub fn shrink_to_fit(overlay: (u32, u32), base: (u32, u32)) -> Option<(u32, u32)> {
    let (mw, mh) = overlay;
    if mw <= base.0 && mh <= base.1 {
        return None;
    }
    Some(fit_within(overlay, base))
}

/// Uniform scale factor that brings a side of length `reference` to `dim`.
pub fn axis_ratio(dim: u32, reference: u32) -> Option<f64> {
    (reference > 0).then(|| dim as f64 / reference as f64)
}

/// Apply a ratio to a frame size, rounding each side (minimum 1).
pub fn ratio_dimensions(frame: (u32, u32), ratio: f64) -> (u32, u32) {
    (
        ((frame.0 as f64 * ratio).round() as u32).max(1),
        ((frame.1 as f64 * ratio).round() as u32).max(1),
    )
}

/// `pct` percent of `dim`, truncated.
pub fn percent_of(dim: u32, pct: f32) -> u32 {
    (dim as f64 * pct as f64 / 100.0) as u32
}

/// Bounding box of a `width`×`height` rectangle rotated by `degrees`.
///
/// # Examples
/// ```
/// # use imagesmith::imaging::calculations::rotated_bounds;
/// assert_eq!(rotated_bounds((40, 10), 90.0), (10, 40));
/// assert_eq!(rotated_bounds((40, 10), 180.0), (40, 10));
/// ```
pub fn rotated_bounds(size: (u32, u32), degrees: f32) -> (u32, u32) {
    let theta = (degrees as f64).to_radians();
    let (sin, cos) = (theta.sin().abs(), theta.cos().abs());
    let (w, h) = (size.0 as f64, size.1 as f64);
    // Round away float noise before taking the ceiling.
    let snap = |v: f64| ((v * 1e6).round() / 1e6).ceil() as u32;
    (snap(w * cos + h * sin).max(1), snap(w * sin + h * cos).max(1))
}
