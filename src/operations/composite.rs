//! Compositing: image watermarks and text overlays.
//!
//! Both draw once and blend the result onto every frame. Neither treats a
//! missing asset as an error: an unreadable watermark or font is noted on
//! the context and the operation does as much as it still can.

use super::{Apply, Context, OperationError, opacity_key};
use crate::imaging::calculations::{placement_offset, shrink_to_fit};
use crate::imaging::primitives::{self, scale_alpha};
use crate::imaging::{Canvas, Color, Placement, TextAlign};
use crate::info::percent_encode;
use ab_glyph::{Font, FontVec, PxScale, ScaleFont};
use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use imageproc::geometric_transformations::{Interpolation, rotate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_TEXT_SIZE: f32 = 20.0;

fn default_text_size() -> f32 {
    DEFAULT_TEXT_SIZE
}

fn default_text_color() -> Color {
    Color::BLACK
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Watermark {
    pub path: PathBuf,
    #[serde(default)]
    pub placement: Placement,
    /// 0–1, clamped. `None` keeps the watermark's own alpha.
    #[serde(default)]
    pub opacity: Option<f32>,
}

impl Apply for Watermark {
    fn key(&self) -> String {
        format!(
            "watermark:{}:{}:{}",
            self.path.display(),
            self.placement.as_str(),
            opacity_key(self.opacity)
        )
    }

    fn apply(&self, canvas: &mut Canvas, ctx: &mut Context<'_>) -> Result<(), OperationError> {
        let mark = match ctx.backend().decode(&self.path) {
            Ok(decoded) => decoded.into_frames().swap_remove(0).image,
            Err(e) => {
                ctx.note(format!(
                    "watermark: cannot read {} ({e})",
                    self.path.display()
                ));
                return Ok(());
            }
        };

        let base = canvas.dimensions();
        let mut mark = match shrink_to_fit(mark.dimensions(), base) {
            Some((w, h)) => primitives::resize(&mark, w, h, FilterType::Triangle),
            None => mark,
        };
        if let Some(opacity) = self.opacity {
            scale_alpha(&mut mark, opacity);
        }

        let (x, y) = placement_offset(self.placement, base, mark.dimensions());
        canvas.for_each_frame(|frame| imageops::overlay(frame, &mark, x, y));
        Ok(())
    }
}

/// Text drawn at an absolute position; `y` is the baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TextOverlay {
    pub text: String,
    pub x: i32,
    pub y: i32,
    /// TTF/OTF path. `None` uses the configured default font.
    #[serde(default)]
    pub font: Option<PathBuf>,
    /// Pixel height of the em square.
    #[serde(default = "default_text_size")]
    pub size: f32,
    #[serde(default = "default_text_color")]
    pub color: Color,
    /// 0–1, replaces the color's alpha when set.
    #[serde(default)]
    pub opacity: Option<f32>,
    /// Clockwise degrees around (`x`, `y`).
    #[serde(default)]
    pub angle: f32,
    #[serde(default)]
    pub align: TextAlign,
}

impl TextOverlay {
    pub fn new(text: impl Into<String>, x: i32, y: i32) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            font: None,
            size: DEFAULT_TEXT_SIZE,
            color: Color::BLACK,
            opacity: None,
            angle: 0.0,
            align: TextAlign::Left,
        }
    }

    pub fn font(mut self, path: impl Into<PathBuf>) -> Self {
        self.font = Some(path.into());
        self
    }

    pub fn size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn opacity(mut self, opacity: f32) -> Self {
        self.opacity = Some(opacity);
        self
    }

    pub fn angle(mut self, degrees: f32) -> Self {
        self.angle = degrees;
        self
    }

    pub fn align(mut self, align: TextAlign) -> Self {
        self.align = align;
        self
    }

    /// The requested font, then the default one. Each failure is noted.
    fn load_font(&self, ctx: &mut Context<'_>) -> Option<FontVec> {
        let candidates = [self.font.as_deref(), ctx.default_font()];
        for path in candidates.into_iter().flatten() {
            match read_font(path) {
                Ok(font) => return Some(font),
                Err(reason) => {
                    ctx.note(format!("overlay: cannot load font {} ({reason})", path.display()))
                }
            }
        }
        None
    }

    /// Coverage mask of the rendered text, already rotated.
    fn coverage(&self, font: &FontVec, width: u32, height: u32) -> GrayImage {
        let scale = PxScale::from(self.size.max(1.0));
        let (text_width, _) = text_size(scale, font, &self.text);
        let left = match self.align {
            TextAlign::Left => self.x,
            TextAlign::Center => self.x - (text_width / 2) as i32,
            TextAlign::Right => self.x - text_width as i32,
        };
        let ascent = font.as_scaled(scale).ascent();
        let top = self.y - ascent.round() as i32;

        let mut mask = GrayImage::new(width, height);
        draw_text_mut(&mut mask, Luma([255]), left, top, scale, font, &self.text);

        if self.angle == 0.0 {
            return mask;
        }
        rotate(
            &mask,
            (self.x as f32, self.y as f32),
            self.angle.to_radians(),
            Interpolation::Bilinear,
            Luma([0]),
        )
    }
}

fn read_font(path: &Path) -> Result<FontVec, String> {
    let bytes = std::fs::read(path).map_err(|e| e.to_string())?;
    FontVec::try_from_vec(bytes).map_err(|e| e.to_string())
}

impl Apply for TextOverlay {
    fn key(&self) -> String {
        let font = self
            .font
            .as_ref()
            .map_or_else(|| "default".to_string(), |p| p.display().to_string());
        format!(
            "overlay:{}-{}x{}x{}:{}:{}:{}:{}:{}",
            percent_encode(&self.text),
            self.x,
            self.y,
            self.size,
            self.color,
            opacity_key(self.opacity),
            self.angle,
            self.align.as_str(),
            font
        )
    }

    fn apply(&self, canvas: &mut Canvas, ctx: &mut Context<'_>) -> Result<(), OperationError> {
        let Some(font) = self.load_font(ctx) else {
            ctx.note("overlay: no usable font, text skipped");
            return Ok(());
        };

        let color = match self.opacity {
            Some(opacity) => self
                .color
                .with_alpha((opacity.clamp(0.0, 1.0) * 255.0).round() as u8),
            None => self.color,
        };
        let [r, g, b, a] = color.0;

        let (width, height) = canvas.dimensions();
        let coverage = self.coverage(&font, width, height);
        let layer = RgbaImage::from_fn(width, height, |x, y| {
            let c = coverage.get_pixel(x, y)[0] as u32;
            Rgba([r, g, b, (a as u32 * c / 255) as u8])
        });

        canvas.for_each_frame(|frame| imageops::overlay(frame, &layer, 0, 0));
        Ok(())
    }
}
