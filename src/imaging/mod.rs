//! Image handling: codecs, buffers and pixel primitives.
//!
//! | Concern | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions`, `avif-parse` for AVIF |
//! | **Decode / encode** | `image` codecs and `webp` behind [`ImageBackend`] |
//! | **Clipping paths** | custom 8BIM reader (JPEG APP13 + TIFF IFD) |
//! | **Resample, crop, composite** | `image::imageops` |
//! | **Rotate, draw** | `imageproc` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Typed values operations are configured with
//! - **Canvas**: The mutable multi-frame buffer a pipeline runs against
//! - **Primitives**: Frame-level pixel helpers shared by operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
pub mod calculations;
pub mod canvas;
pub mod clip_path;
pub mod params;
pub mod primitives;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use canvas::{Canvas, Frame};
pub use clip_path::ClipPath;
pub use params::{
    Anchor, Axis, Color, Edges, FitMode, Interlace, OutputFormat, ParamError, Placement, Quality,
    TextAlign,
};
pub use rust_backend::RustBackend;
