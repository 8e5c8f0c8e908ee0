//! Parameter types shared by the operation catalog and the backend.
//!
//! These types describe *what* to do, never *how*. Operations embed them in
//! their keys, recipes deserialize them from TOML, and the backend reads
//! [`Quality`] and [`OutputFormat`] when encoding.
//!
//! ## Types
//!
//! - [`Quality`]: lossy encoding quality (1–100, default 75). Clamped on construction.
//! - [`OutputFormat`]: target encoding, parsed case-insensitively from an extension.
//! - [`Color`]: RGBA color parsed from a name (`white`, `transparent`, ...) or hex.
//! - [`FitMode`] / [`Anchor`]: scaling policy and 9-point anchor for fit-to-target.
//! - [`Placement`]: watermark position; unknown names fall back to center.
//! - [`Edges`]: per-side sizes for margin and padding.
//! - [`Axis`], [`TextAlign`], [`Interlace`]: small closed enums.

use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParamError {
    #[error("invalid color: {0}")]
    InvalidColor(String),
    #[error("invalid fit mode: {0}")]
    InvalidMode(String),
    #[error("invalid anchor: {0}")]
    InvalidAnchor(String),
    #[error("unknown output format: {0}")]
    UnknownFormat(String),
}

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Quality(u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(75)
    }
}

/// Encoding target of a rendered artifact.
///
/// The extension is the lower-cased identifier used in artifact filenames.
/// `jpg`/`jpeg` and `tif`/`tiff` are separate variants that share an encoder,
/// so an artifact keeps the extension the caller asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum OutputFormat {
    #[default]
    WebP,
    Png,
    Jpeg,
    Jpg,
    Gif,
    Avif,
    Bmp,
    Tiff,
    Tif,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::WebP => "webp",
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Jpg => "jpg",
            Self::Gif => "gif",
            Self::Avif => "avif",
            Self::Bmp => "bmp",
            Self::Tiff => "tiff",
            Self::Tif => "tif",
        }
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            Self::WebP => ImageFormat::WebP,
            Self::Png => ImageFormat::Png,
            Self::Jpeg | Self::Jpg => ImageFormat::Jpeg,
            Self::Gif => ImageFormat::Gif,
            Self::Avif => ImageFormat::Avif,
            Self::Bmp => ImageFormat::Bmp,
            Self::Tiff | Self::Tif => ImageFormat::Tiff,
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::WebP => "image/webp",
            Self::Png => "image/png",
            Self::Jpeg | Self::Jpg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Avif => "image/avif",
            Self::Bmp => "image/bmp",
            Self::Tiff | Self::Tif => "image/tiff",
        }
    }

    /// Whether every frame of an animated canvas survives encoding.
    pub fn keeps_frames(self) -> bool {
        matches!(self, Self::Gif)
    }
}

impl FromStr for OutputFormat {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "webp" => Ok(Self::WebP),
            "png" => Ok(Self::Png),
            "jpeg" => Ok(Self::Jpeg),
            "jpg" => Ok(Self::Jpg),
            "gif" => Ok(Self::Gif),
            "avif" => Ok(Self::Avif),
            "bmp" => Ok(Self::Bmp),
            "tiff" => Ok(Self::Tiff),
            "tif" => Ok(Self::Tif),
            _ => Err(ParamError::UnknownFormat(s.to_string())),
        }
    }
}

impl TryFrom<String> for OutputFormat {
    type Error = ParamError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OutputFormat> for String {
    fn from(value: OutputFormat) -> Self {
        value.extension().to_string()
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Straight (non-premultiplied) RGBA color.
///
/// Parsed from a handful of CSS names, `transparent`/`none`, or `#rgb`,
/// `#rgba`, `#rrggbb`, `#rrggbbaa`. Displays as `#rrggbbaa`, so `white` and
/// `#fff` produce identical operation keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(pub [u8; 4]);

impl Color {
    pub const WHITE: Color = Color([255, 255, 255, 255]);
    pub const BLACK: Color = Color([0, 0, 0, 255]);
    pub const TRANSPARENT: Color = Color([0, 0, 0, 0]);

    pub fn rgba(self) -> image::Rgba<u8> {
        image::Rgba(self.0)
    }

    pub fn alpha(self) -> u8 {
        self.0[3]
    }

    pub fn with_alpha(self, alpha: u8) -> Self {
        let [r, g, b, _] = self.0;
        Self([r, g, b, alpha])
    }

    /// Exact match; any two fully transparent colors match each other.
    pub fn matches(self, pixel: image::Rgba<u8>) -> bool {
        if self.alpha() == 0 {
            pixel.0[3] == 0
        } else {
            self.0 == pixel.0
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl FromStr for Color {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        let named = match name.as_str() {
            "transparent" | "none" => Some([0, 0, 0, 0]),
            "white" => Some([255, 255, 255, 255]),
            "black" => Some([0, 0, 0, 255]),
            "red" => Some([255, 0, 0, 255]),
            "green" => Some([0, 128, 0, 255]),
            "lime" => Some([0, 255, 0, 255]),
            "blue" => Some([0, 0, 255, 255]),
            "yellow" => Some([255, 255, 0, 255]),
            "gray" | "grey" => Some([128, 128, 128, 255]),
            "silver" => Some([192, 192, 192, 255]),
            _ => None,
        };
        if let Some(rgba) = named {
            return Ok(Self(rgba));
        }

        let invalid = || ParamError::InvalidColor(s.to_string());
        let hex = name.strip_prefix('#').ok_or_else(invalid)?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let nibble = |i: usize| u8::from_str_radix(&hex[i..=i], 16).map(|v| v * 17);
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16);

        let rgba = match hex.len() {
            3 => [nibble(0), nibble(1), nibble(2), Ok(255)],
            4 => [nibble(0), nibble(1), nibble(2), nibble(3)],
            6 => [byte(0), byte(2), byte(4), Ok(255)],
            8 => [byte(0), byte(2), byte(4), byte(6)],
            _ => return Err(invalid()),
        };
        let mut out = [0u8; 4];
        for (slot, value) in out.iter_mut().zip(rgba) {
            *slot = value.map_err(|_| invalid())?;
        }
        Ok(Self(out))
    }
}

impl TryFrom<String> for Color {
    type Error = ParamError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(value: Color) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b, a] = self.0;
        write!(f, "#{r:02x}{g:02x}{b:02x}{a:02x}")
    }
}

/// Scaling policy for fit-to-target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FitMode {
    /// Whole image visible inside the box; padding likely.
    #[default]
    Fit,
    /// Width matches the box.
    FitWidth,
    /// Height matches the box.
    FitHeight,
    /// Box fully covered, excess center-cropped.
    Fill,
}

impl FitMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fit => "fit",
            Self::FitWidth => "fitWidth",
            Self::FitHeight => "fitHeight",
            Self::Fill => "fill",
        }
    }
}

impl FromStr for FitMode {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fit" => Ok(Self::Fit),
            "fitWidth" | "fit-width" => Ok(Self::FitWidth),
            "fitHeight" | "fit-height" => Ok(Self::FitHeight),
            "fill" => Ok(Self::Fill),
            _ => Err(ParamError::InvalidMode(s.to_string())),
        }
    }
}

impl TryFrom<String> for FitMode {
    type Error = ParamError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FitMode> for String {
    fn from(value: FitMode) -> Self {
        value.as_str().to_string()
    }
}

/// Nine-point anchor used to place scaled content inside a fit canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Anchor {
    TopLeft,
    TopCenter,
    TopRight,
    CenterLeft,
    #[default]
    Center,
    CenterRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl Anchor {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TopLeft => "top-left",
            Self::TopCenter => "top-center",
            Self::TopRight => "top-right",
            Self::CenterLeft => "center-left",
            Self::Center => "center",
            Self::CenterRight => "center-right",
            Self::BottomLeft => "bottom-left",
            Self::BottomCenter => "bottom-center",
            Self::BottomRight => "bottom-right",
        }
    }
}

impl FromStr for Anchor {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "top-left" => Ok(Self::TopLeft),
            "top-center" => Ok(Self::TopCenter),
            "top-right" => Ok(Self::TopRight),
            "center-left" => Ok(Self::CenterLeft),
            "center" => Ok(Self::Center),
            "center-right" => Ok(Self::CenterRight),
            "bottom-left" => Ok(Self::BottomLeft),
            "bottom-center" => Ok(Self::BottomCenter),
            "bottom-right" => Ok(Self::BottomRight),
            _ => Err(ParamError::InvalidAnchor(s.to_string())),
        }
    }
}

impl TryFrom<String> for Anchor {
    type Error = ParamError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Anchor> for String {
    fn from(value: Anchor) -> Self {
        value.as_str().to_string()
    }
}

/// Watermark position. Parsing never fails: unknown names mean center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Placement {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Top,
    Bottom,
    Left,
    Right,
    #[default]
    Center,
}

impl Placement {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TopLeft => "top-left",
            Self::TopRight => "top-right",
            Self::BottomLeft => "bottom-left",
            Self::BottomRight => "bottom-right",
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Left => "left",
            Self::Right => "right",
            Self::Center => "center",
        }
    }
}

impl From<&str> for Placement {
    fn from(value: &str) -> Self {
        match value {
            "top-left" => Self::TopLeft,
            "top-right" => Self::TopRight,
            "bottom-left" => Self::BottomLeft,
            "bottom-right" => Self::BottomRight,
            "top" => Self::Top,
            "bottom" => Self::Bottom,
            "left" => Self::Left,
            "right" => Self::Right,
            _ => Self::Center,
        }
    }
}

impl From<String> for Placement {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<Placement> for String {
    fn from(value: Placement) -> Self {
        value.as_str().to_string()
    }
}

/// Per-side sizes in pixels, CSS order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Edges {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
}

impl Edges {
    pub fn new(top: u32, right: u32, bottom: u32, left: u32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    pub fn uniform(size: u32) -> Self {
        Self::new(size, size, size, size)
    }

    pub fn is_zero(&self) -> bool {
        (self.top | self.right | self.bottom | self.left) == 0
    }

    pub fn is_uniform(&self) -> bool {
        self.top == self.right && self.right == self.bottom && self.bottom == self.left
    }

    /// Left plus right.
    pub fn horizontal(&self) -> u32 {
        self.left + self.right
    }

    /// Top plus bottom.
    pub fn vertical(&self) -> u32 {
        self.top + self.bottom
    }
}

impl fmt::Display for Edges {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}",
            self.top, self.right, self.bottom, self.left
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    #[default]
    Width,
    Height,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl TextAlign {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        }
    }
}

/// Interlace scheme hint handed to the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interlace {
    Gif,
    Jpeg,
    Plane,
    Png,
}

impl Interlace {
    /// `None` for names outside the supported set.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "gif" => Some(Self::Gif),
            "jpeg" | "jpg" => Some(Self::Jpeg),
            "plane" => Some(Self::Plane),
            "png" => Some(Self::Png),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gif => "gif",
            Self::Jpeg => "jpeg",
            Self::Plane => "plane",
            Self::Png => "png",
        }
    }
}
