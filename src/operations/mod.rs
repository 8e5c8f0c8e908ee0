//! The operation catalog.
//!
//! An [`Operation`] is one named, deterministic mutation of a [`Canvas`].
//! The set of operations is closed: every family is a variant carrying its
//! own parameter struct, and both [`Operation::key`] and
//! [`Operation::apply`] dispatch over it exhaustively.
//!
//! ## Keys
//!
//! A key is a pure function of an operation's parameters. The executor joins
//! the keys of a pipeline into the render signature, so any parameter change
//! yields a new artifact name. Keys are identity only and never parsed back.
//!
//! ## Errors
//!
//! Factories that take free-form names (fit mode, fit anchor, filter name)
//! validate them up front and fail with [`OperationError`]. Everything that
//! depends on the live image (crop bounds, resolved fit target, padding
//! size) can only fail inside `apply`; the executor isolates those failures
//! so the rest of the pipeline still runs.
//!
//! ## Recipes
//!
//! Operations deserialize from an internally tagged map, so a TOML recipe
//! reads naturally:
//!
//! ```toml
//! [[operations]]
//! op = "fit"
//! width = 300
//! height = 200
//! mode = "fill"
//!
//! [[operations]]
//! op = "filter"
//! filter = "sepia"
//! threshold = 70
//! ```

mod composite;
mod filter;
mod geometry;
mod mask;

pub use composite::{TextOverlay, Watermark};
pub use filter::Filter;
pub use geometry::{
    Background, Crop, Fit, Margin, Padding, Resize, ResizeByRatio, Rotate, Stretch,
    StretchByPercent, Trim,
};
pub use mask::{ClipPathMask, Drill};

use crate::imaging::{Anchor, Axis, Canvas, Color, Edges, FitMode, ImageBackend, Placement};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OperationError {
    #[error("invalid fit mode: {0}")]
    InvalidMode(String),
    #[error("invalid anchor: {0}")]
    InvalidAnchor(String),
    #[error("unsupported filter: {0}")]
    UnsupportedFilter(String),
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
}

/// What an operation may reach while it runs, besides the canvas.
pub struct Context<'a> {
    backend: &'a dyn ImageBackend,
    default_font: Option<&'a Path>,
    notes: Vec<String>,
}

impl<'a> Context<'a> {
    pub fn new(backend: &'a dyn ImageBackend, default_font: Option<&'a Path>) -> Self {
        Self {
            backend,
            default_font,
            notes: Vec::new(),
        }
    }

    /// Backend used to load external bitmaps (watermarks).
    pub fn backend(&self) -> &'a dyn ImageBackend {
        self.backend
    }

    pub fn default_font(&self) -> Option<&'a Path> {
        self.default_font
    }

    /// Record a non-fatal degradation: the operation carried on without
    /// doing everything it was asked to.
    pub fn note(&mut self, message: impl Into<String>) {
        self.notes.push(message.into());
    }

    /// Drain the notes recorded since the last call.
    pub fn take_notes(&mut self) -> Vec<String> {
        std::mem::take(&mut self.notes)
    }
}

/// Behavior shared by every operation parameter struct.
trait Apply {
    fn key(&self) -> String;
    fn apply(&self, canvas: &mut Canvas, ctx: &mut Context<'_>) -> Result<(), OperationError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum Operation {
    Crop(Crop),
    Trim(Trim),
    Resize(Resize),
    ResizeByRatio(ResizeByRatio),
    Stretch(Stretch),
    StretchByPercent(StretchByPercent),
    Fit(Fit),
    Margin(Margin),
    Padding(Padding),
    Filter(Filter),
    Watermark(Watermark),
    Overlay(TextOverlay),
    ClipPath(ClipPathMask),
    Drill(Drill),
    Background(Background),
    Rotate(Rotate),
}

impl Operation {
    fn inner(&self) -> &dyn Apply {
        match self {
            Self::Crop(op) => op,
            Self::Trim(op) => op,
            Self::Resize(op) => op,
            Self::ResizeByRatio(op) => op,
            Self::Stretch(op) => op,
            Self::StretchByPercent(op) => op,
            Self::Fit(op) => op,
            Self::Margin(op) => op,
            Self::Padding(op) => op,
            Self::Filter(op) => op,
            Self::Watermark(op) => op,
            Self::Overlay(op) => op,
            Self::ClipPath(op) => op,
            Self::Drill(op) => op,
            Self::Background(op) => op,
            Self::Rotate(op) => op,
        }
    }

    /// Stable identity string derived from every parameter.
    pub fn key(&self) -> String {
        self.inner().key()
    }

    pub fn apply(&self, canvas: &mut Canvas, ctx: &mut Context<'_>) -> Result<(), OperationError> {
        self.inner().apply(canvas, ctx)
    }

    // =====================================================================
    // Factories
    // =====================================================================

    /// Extract a `width`×`height` rectangle at (`x`, `y`).
    pub fn crop(width: u32, height: u32, x: u32, y: u32) -> Self {
        Self::Crop(Crop {
            width,
            height,
            x,
            y,
        })
    }

    /// Remove the border matching `background`, which also becomes the
    /// canvas background.
    pub fn trim(background: Color) -> Self {
        Self::Trim(Trim { background })
    }

    pub fn resize(width: u32, height: u32, keep_aspect: bool) -> Self {
        Self::Resize(Resize {
            width,
            height,
            keep_aspect,
        })
    }

    /// Scale uniformly so that `axis` of the first frame equals `dim`.
    pub fn resize_by_ratio(dim: u32, axis: Axis) -> Self {
        Self::ResizeByRatio(ResizeByRatio { dim, axis })
    }

    pub fn stretch(width: u32, height: u32) -> Self {
        Self::Stretch(Stretch { width, height })
    }

    pub fn stretch_by_percent(width_percent: f32, height_percent: f32) -> Self {
        Self::StretchByPercent(StretchByPercent {
            width_percent,
            height_percent,
        })
    }

    /// Scale into a `width`×`height` box.
    ///
    /// `mode` is one of `fit`, `fitWidth`, `fitHeight`, `fill`; `anchor` one
    /// of the nine `top-left` … `bottom-right` positions. Both are checked
    /// here. `background` fills uncovered area; `None` uses the canvas
    /// background.
    pub fn fit_to_target(
        width: u32,
        height: u32,
        mode: &str,
        anchor: &str,
        background: Option<Color>,
    ) -> Result<Self, OperationError> {
        let mode: FitMode = mode
            .parse()
            .map_err(|_| OperationError::InvalidMode(mode.to_string()))?;
        let anchor: Anchor = anchor
            .parse()
            .map_err(|_| OperationError::InvalidAnchor(anchor.to_string()))?;
        Ok(Self::Fit(Fit {
            width,
            height,
            mode,
            anchor,
            background,
        }))
    }

    pub fn margin(edges: Edges, background: Option<Color>) -> Self {
        Self::Margin(Margin::new(edges, background))
    }

    pub fn padding(edges: Edges, background: Option<Color>) -> Self {
        Self::Padding(Padding::new(edges, background))
    }

    pub fn filter(filter: Filter) -> Self {
        Self::Filter(filter)
    }

    /// Look a filter up by name, taking numeric arguments positionally.
    pub fn filter_named(name: &str, args: &[f32]) -> Result<Self, OperationError> {
        Filter::from_name(name, args).map(Self::Filter)
    }

    pub fn watermark(
        path: impl Into<PathBuf>,
        placement: impl Into<Placement>,
        opacity: Option<f32>,
    ) -> Self {
        Self::Watermark(Watermark {
            path: path.into(),
            placement: placement.into(),
            opacity,
        })
    }

    pub fn overlay(overlay: TextOverlay) -> Self {
        Self::Overlay(overlay)
    }

    /// Mask with the clipping path embedded in the source. `inside == false`
    /// keeps the area inside the path; `true` removes it.
    pub fn clip_path(inside: bool) -> Self {
        Self::ClipPath(ClipPathMask { inside })
    }

    /// Punch a rectangular hole (`invert == false`) or keep only the
    /// rectangle (`invert == true`).
    pub fn drill(x: i32, y: i32, width: u32, height: u32, invert: bool) -> Self {
        Self::Drill(Drill {
            x,
            y,
            width,
            height,
            invert,
        })
    }

    pub fn background(color: Color) -> Self {
        Self::Background(Background { color })
    }

    /// Rotate clockwise by `degrees`.
    pub fn rotate(degrees: f32) -> Self {
        Self::Rotate(Rotate { degrees })
    }
}

/// Key fragment for an optional fill color.
fn fill_key(color: Option<Color>) -> String {
    color.map_or_else(|| "inherit".to_string(), |c| c.to_string())
}

/// Key fragment for an optional opacity; `α` means "keep the source alpha".
fn opacity_key(opacity: Option<f32>) -> String {
    opacity.map_or_else(|| "α".to_string(), |o| o.to_string())
}
