//! Image codec backend trait and shared types.
//!
//! The [`ImageBackend`] trait covers everything that touches encoded bytes:
//! identify (header-only dimensions), decode into a [`Canvas`], and encode a
//! canvas to a file. Pixel work happens on the canvas itself, so a backend
//! never has to know about operations.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), statically linked.

use super::canvas::Canvas;
use super::params::{Interlace, OutputFormat, Quality};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode {path}: {message}")]
    Decode { path: String, message: String },
    #[error("Failed to encode {format}: {message}")]
    Encode {
        format: OutputFormat,
        message: String,
    },
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image codec backends.
///
/// `Sync` so a processor can be shared by reference across threads.
pub trait ImageBackend: Sync {
    /// Get image dimensions without decoding pixels where possible.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Decode every frame of an image into a canvas.
    fn decode(&self, path: &Path) -> Result<Canvas, BackendError>;

    /// Encode a canvas to `output` in the given format.
    fn encode(
        &self,
        canvas: &Canvas,
        output: &Path,
        format: OutputFormat,
        quality: Quality,
    ) -> Result<(), BackendError>;

    /// Whether [`encode`](Self::encode) writes `format` with the canvas's
    /// interlace scheme. A canvas carrying a scheme the encoder cannot honor
    /// is still written, just not interlaced.
    fn supports_interlace(&self, format: OutputFormat, scheme: Interlace) -> bool;
}
