//! # imagesmith
//!
//! Ordered image operation pipelines with a content-addressed render cache.
//! Give it a source image and a list of operations (crop, fit, watermark,
//! filter, clip, …); it renders the result once and serves the same file for
//! every identical request afterwards.
//!
//! ```no_run
//! use imagesmith::config::ProcessorConfig;
//! use imagesmith::imaging::{Axis, Edges, OutputFormat};
//! use imagesmith::operations::Operation;
//! use imagesmith::process::Processor;
//! use imagesmith::recipe::RenderOptions;
//! use std::path::Path;
//!
//! let processor = Processor::new(ProcessorConfig::default())?;
//! let options = RenderOptions::new()
//!     .output_dir("cache")
//!     .format(OutputFormat::WebP)
//!     .operation(Operation::fit_to_target(300, 200, "fill", "center", None)?)
//!     .operation(Operation::margin(Edges::uniform(4), None))
//!     .operation(Operation::resize_by_ratio(150, Axis::Width));
//!
//! let render = processor.process(Path::new("photo.jpg"), &options)?;
//! println!("{} ({}x{})", render.info.path.display(), render.info.width, render.info.height);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Architecture
//!
//! ```text
//! RenderOptions ──► Processor::plan ──► signature ──► artifact exists? ──► ImageInfo
//!                                                          │ no
//!                                                          ▼
//!                  decode ──► Operation::apply × N ──► strip ──► encode ──► rename
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`process`] | Pipeline executor and cache gate: source resolution, fault isolation, atomic writes |
//! | [`operations`] | The operation catalog: one enum variant per transformation, each with a key and an `apply` |
//! | [`cache`] | Render signatures, artifact naming, hit/miss statistics |
//! | [`recipe`] | Per-render options, loadable from TOML |
//! | [`config`] | Processor-wide settings from `imagesmith.toml` |
//! | [`info`] | Descriptor of a rendered artifact, data URI and SVG placeholder helpers |
//! | [`imaging`] | Canvas, codecs and pixel primitives behind the `ImageBackend` trait |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## File Names Are the Cache
//!
//! There is no index to load, lock or corrupt. An artifact is named
//! `<stem>-<signature>.<ext>`, where the signature hashes the source's mtime,
//! every operation key in order, and the encoder settings. A hit costs one
//! `stat`. Old artifacts are never touched; cleaning up is left to whoever
//! owns the output directory.
//!
//! ## Operations Are Data
//!
//! Each operation is a plain struct inside the [`operations::Operation`]
//! enum. Its key is derived from every field, so the cache key cannot forget
//! a parameter, and the whole list deserializes from a TOML recipe.
//!
//! ## Degrade, Don't Abort
//!
//! A missing watermark, an unreadable font or a crop outside the image does
//! not cost the caller their image. The failing step is skipped and
//! reported in [`process::Render::diagnostics`]; only filesystem and codec
//! failures are fatal.
//!
//! ## Statically Linked Imaging
//!
//! Decoding, encoding, resampling and drawing use the `image` and `imageproc`
//! crates. Lossy WebP goes through libwebp, which the `webp` crate builds
//! from source. No system libraries are required beyond a font file for text
//! overlays.

pub mod cache;
pub mod config;
pub mod imaging;
pub mod info;
pub mod operations;
pub mod output;
pub mod process;
pub mod recipe;

#[cfg(test)]
pub(crate) mod test_helpers;
