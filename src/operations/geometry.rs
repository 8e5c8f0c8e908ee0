//! Geometry operations: crop, trim, resize variants, fit, margin, padding,
//! rotate, and the background setter they read their fill color from.

use super::{Apply, Context, OperationError, fill_key};
use crate::imaging::calculations::{
    anchor_offset, axis_ratio, center_crop_offset, fit_scale, fit_within, percent_of,
    ratio_dimensions, resolve_target, scale_dimensions,
};
use crate::imaging::primitives::{self, trim_bounds};
use crate::imaging::{Anchor, Axis, Canvas, Color, Edges, FitMode};
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

/// High-quality resampling kernel.
const QUALITY_FILTER: FilterType = FilterType::Lanczos3;
/// Fast kernel for stretches and down-scaling.
const FAST_FILTER: FilterType = FilterType::Triangle;

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Crop {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub x: u32,
    #[serde(default)]
    pub y: u32,
}

impl Apply for Crop {
    fn key(&self) -> String {
        format!("crop:{}x{}-{}-{}", self.width, self.height, self.x, self.y)
    }

    fn apply(&self, canvas: &mut Canvas, _ctx: &mut Context<'_>) -> Result<(), OperationError> {
        let (w, h) = canvas.dimensions();
        if self.width == 0 || self.height == 0 || self.x >= w || self.y >= h {
            return Err(OperationError::InvalidGeometry(format!(
                "crop {}x{}+{}+{} does not overlap {w}x{h}",
                self.width, self.height, self.x, self.y
            )));
        }
        // Clamp to what is actually inside the image.
        let cw = self.width.min(w - self.x);
        let ch = self.height.min(h - self.y);
        let (x, y) = (self.x, self.y);
        canvas.map_frames(|img| primitives::crop(img, x, y, cw, ch));
        canvas.set_page_offset((x as i32, y as i32));
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Trim {
    #[serde(default)]
    pub background: Color,
}

impl Apply for Trim {
    fn key(&self) -> String {
        format!("trim:{}", self.background)
    }

    fn apply(&self, canvas: &mut Canvas, _ctx: &mut Context<'_>) -> Result<(), OperationError> {
        canvas.set_background(self.background);
        let Some((x, y, w, h)) = trim_bounds(canvas, self.background) else {
            // Nothing but background: leave the image alone.
            return Ok(());
        };
        canvas.map_frames(|img| primitives::crop(img, x, y, w, h));
        canvas.set_page_offset((x as i32, y as i32));
        Ok(())
    }
}

/// Resize into a box. With `keep_aspect` the result is the largest
/// aspect-preserving size inside the box; without it the box exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Resize {
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default = "default_true")]
    pub keep_aspect: bool,
}

impl Apply for Resize {
    fn key(&self) -> String {
        format!("resize:{}x{}:{}", self.width, self.height, self.keep_aspect)
    }

    fn apply(&self, canvas: &mut Canvas, _ctx: &mut Context<'_>) -> Result<(), OperationError> {
        let (tw, th) = if self.keep_aspect {
            if self.width == 0 && self.height == 0 {
                return Err(OperationError::InvalidGeometry(
                    "resize needs a width or a height".to_string(),
                ));
            }
            // A zero side leaves that axis unbounded.
            let bound = |v: u32| if v == 0 { u32::MAX } else { v };
            fit_within(canvas.dimensions(), (bound(self.width), bound(self.height)))
        } else {
            if self.width == 0 || self.height == 0 {
                return Err(OperationError::InvalidGeometry(format!(
                    "cannot resize to {}x{}",
                    self.width, self.height
                )));
            }
            (self.width, self.height)
        };
        canvas.map_frames(|img| primitives::resize(img, tw, th, QUALITY_FILTER));
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResizeByRatio {
    pub dim: u32,
    #[serde(default)]
    pub axis: Axis,
}

impl Apply for ResizeByRatio {
    fn key(&self) -> String {
        let axis = match self.axis {
            Axis::Width => "width",
            Axis::Height => "height",
        };
        format!("resize-by-ratio:{}-{axis}", self.dim)
    }

    fn apply(&self, canvas: &mut Canvas, _ctx: &mut Context<'_>) -> Result<(), OperationError> {
        let reference = match self.axis {
            Axis::Width => canvas.width(),
            Axis::Height => canvas.height(),
        };
        let ratio = axis_ratio(self.dim, reference)
            .filter(|_| self.dim > 0)
            .ok_or_else(|| OperationError::InvalidGeometry("dimension must be > 0".to_string()))?;
        if ratio == 1.0 {
            return Ok(());
        }
        // Same factor for every frame, each from its own size.
        let filter = if ratio < 1.0 {
            FAST_FILTER
        } else {
            QUALITY_FILTER
        };
        canvas.map_frames(|img| {
            let (w, h) = ratio_dimensions(img.dimensions(), ratio);
            primitives::resize(img, w, h, filter)
        });
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Stretch {
    pub width: u32,
    pub height: u32,
}

impl Apply for Stretch {
    fn key(&self) -> String {
        format!("stretch:{}-{}", self.width, self.height)
    }

    fn apply(&self, canvas: &mut Canvas, _ctx: &mut Context<'_>) -> Result<(), OperationError> {
        stretch_to(canvas, self.width, self.height)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StretchByPercent {
    pub width_percent: f32,
    pub height_percent: f32,
}

impl Apply for StretchByPercent {
    fn key(&self) -> String {
        format!(
            "stretch-by-percent:{}-{}",
            self.width_percent, self.height_percent
        )
    }

    fn apply(&self, canvas: &mut Canvas, _ctx: &mut Context<'_>) -> Result<(), OperationError> {
        let w = percent_of(canvas.width(), self.width_percent);
        let h = percent_of(canvas.height(), self.height_percent);
        stretch_to(canvas, w, h)
    }
}

fn stretch_to(canvas: &mut Canvas, width: u32, height: u32) -> Result<(), OperationError> {
    if width == 0 || height == 0 {
        return Err(OperationError::InvalidGeometry(format!(
            "cannot stretch to {width}x{height}"
        )));
    }
    canvas.map_frames(|img| primitives::resize(img, width, height, FAST_FILTER));
    Ok(())
}

/// Fit-to-target. See [`Operation::fit_to_target`](super::Operation::fit_to_target).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Fit {
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub mode: FitMode,
    #[serde(default)]
    pub anchor: Anchor,
    #[serde(default)]
    pub background: Option<Color>,
}

impl Apply for Fit {
    fn key(&self) -> String {
        format!(
            "{}:{}x{}:{}:{}",
            self.mode.as_str(),
            self.width,
            self.height,
            self.anchor.as_str(),
            fill_key(self.background)
        )
    }

    fn apply(&self, canvas: &mut Canvas, _ctx: &mut Context<'_>) -> Result<(), OperationError> {
        let original = canvas.dimensions();
        let (tw, th) = resolve_target(original, (self.width, self.height)).ok_or_else(|| {
            OperationError::InvalidGeometry(format!(
                "target {}x{} does not resolve to a positive size for {}x{}",
                self.width, self.height, original.0, original.1
            ))
        })?;

        let scale = fit_scale(self.mode, original, (tw, th));
        let (nw, nh) = scale_dimensions(original, scale);
        if nw == 0 || nh == 0 {
            return Err(OperationError::InvalidGeometry(format!(
                "{} of {}x{} into {tw}x{th} scales to nothing",
                self.mode.as_str(),
                original.0,
                original.1
            )));
        }

        let fill = self.background.unwrap_or(canvas.background());
        let offset = match self.mode {
            FitMode::Fill => {
                let (cx, cy) = center_crop_offset((nw, nh), (tw, th));
                (-cx, -cy)
            }
            _ => anchor_offset(self.anchor, (tw, th), (nw, nh)),
        };

        canvas.map_frames(|img| {
            let scaled = primitives::resize(img, nw, nh, QUALITY_FILTER);
            primitives::extent(&scaled, tw, th, offset, fill)
        });
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Margin {
    #[serde(default)]
    pub top: u32,
    #[serde(default)]
    pub right: u32,
    #[serde(default)]
    pub bottom: u32,
    #[serde(default)]
    pub left: u32,
    #[serde(default)]
    pub background: Option<Color>,
}

impl Margin {
    pub fn new(edges: Edges, background: Option<Color>) -> Self {
        Self {
            top: edges.top,
            right: edges.right,
            bottom: edges.bottom,
            left: edges.left,
            background,
        }
    }

    pub fn edges(&self) -> Edges {
        Edges::new(self.top, self.right, self.bottom, self.left)
    }
}

impl Apply for Margin {
    fn key(&self) -> String {
        format!("margin:{}:{}", self.edges(), fill_key(self.background))
    }

    fn apply(&self, canvas: &mut Canvas, _ctx: &mut Context<'_>) -> Result<(), OperationError> {
        let edges = self.edges();
        if edges.is_zero() {
            return Ok(());
        }
        let fill = self.background.unwrap_or(canvas.background());

        if edges.is_uniform() {
            canvas.map_frames(|img| primitives::border(img, edges.top, fill));
            return Ok(());
        }

        canvas.map_frames(|img| grow(img, edges, fill));
        canvas.reset_page();
        Ok(())
    }
}

/// Enlarge by `edges`, shifting content right by `left` and down by `top`.
fn grow(img: &image::RgbaImage, edges: Edges, fill: Color) -> image::RgbaImage {
    primitives::extent(
        img,
        img.width() + edges.horizontal(),
        img.height() + edges.vertical(),
        (edges.left as i64, edges.top as i64),
        fill,
    )
}

/// Shrink the content by the edge sizes, then grow the canvas back: same
/// outer size, with a colored frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Padding {
    #[serde(default)]
    pub top: u32,
    #[serde(default)]
    pub right: u32,
    #[serde(default)]
    pub bottom: u32,
    #[serde(default)]
    pub left: u32,
    #[serde(default)]
    pub background: Option<Color>,
}

impl Padding {
    pub fn new(edges: Edges, background: Option<Color>) -> Self {
        Self {
            top: edges.top,
            right: edges.right,
            bottom: edges.bottom,
            left: edges.left,
            background,
        }
    }

    pub fn edges(&self) -> Edges {
        Edges::new(self.top, self.right, self.bottom, self.left)
    }
}

impl Apply for Padding {
    fn key(&self) -> String {
        format!("padding:{}:{}", self.edges(), fill_key(self.background))
    }

    fn apply(&self, canvas: &mut Canvas, _ctx: &mut Context<'_>) -> Result<(), OperationError> {
        let edges = self.edges();
        let (w, h) = canvas.dimensions();
        let inner = w
            .checked_sub(edges.horizontal())
            .zip(h.checked_sub(edges.vertical()))
            .filter(|&(iw, ih)| iw > 0 && ih > 0);
        let Some((iw, ih)) = inner else {
            return Err(OperationError::InvalidGeometry(format!(
                "padding {edges} leaves no room inside {w}x{h}"
            )));
        };
        let fill = self.background.unwrap_or(canvas.background());

        canvas.map_frames(|img| {
            let shrunk = primitives::resize(img, iw, ih, QUALITY_FILTER);
            grow(&shrunk, edges, fill)
        });
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Rotate {
    pub degrees: f32,
}

impl Apply for Rotate {
    fn key(&self) -> String {
        format!("rotate:{}", self.degrees)
    }

    fn apply(&self, canvas: &mut Canvas, _ctx: &mut Context<'_>) -> Result<(), OperationError> {
        let degrees = self.degrees;
        canvas.map_frames(|img| primitives::rotate(img, degrees, Color::TRANSPARENT));
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Background {
    pub color: Color,
}

impl Apply for Background {
    fn key(&self) -> String {
        format!("background:{}", self.color)
    }

    fn apply(&self, canvas: &mut Canvas, _ctx: &mut Context<'_>) -> Result<(), OperationError> {
        canvas.set_background(self.color);
        Ok(())
    }
}
