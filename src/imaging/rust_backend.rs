//! Codec backend on the `image` crate ecosystem.
//!
//! Everything is statically linked into the binary; libwebp is compiled from
//! source by the `webp` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP, BMP) | `image` crate, format sniffed from bytes |
//! | Decode (animated GIF, WebP) | `GifDecoder` / `WebPDecoder` + `AnimationDecoder::into_frames` |
//! | Identify (AVIF) | `avif-parse` container metadata |
//! | Clipping path | [`clip_path`](super::clip_path) (JPEG APP13 + TIFF tag 34377) |
//! | Encode → WebP | `webp::Encoder` (libwebp), lossy at the render quality |
//! | Encode → JPEG | `JpegEncoder` with quality, flattened onto the background |
//! | Encode → GIF | `GifEncoder::encode_frames`, infinite loop |
//! | Encode → AVIF | `AvifEncoder` (rav1e, speed 6) |
//!
//! The `image` crate's `"avif"` feature only enables the encoder, so AVIF
//! sources can be identified but not decoded. None of the encoders take an
//! interlace switch; see [`ImageBackend::supports_interlace`].

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::canvas::{Canvas, Frame};
use super::clip_path::read_clip_path;
use super::params::{Interlace, OutputFormat, Quality};
use image::codecs::gif::{GifDecoder, GifEncoder, Repeat};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPDecoder;
use image::{AnimationDecoder, DynamicImage, Frames, ImageFormat, RgbaImage};
use std::io::{BufWriter, Cursor, Write};
use std::path::Path;
use tracing::debug;

/// AVIF encoder speed: 1 (slowest, best) to 10 (fastest).
const AVIF_SPEED: u8 = 6;

/// Backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn is_avif(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("avif"))
}

fn decode_error(source: impl std::fmt::Display, err: impl std::fmt::Display) -> BackendError {
    BackendError::Decode {
        path: source.to_string(),
        message: err.to_string(),
    }
}

/// Extract dimensions from an AVIF file's container metadata (no full decode needed).
fn identify_avif(path: &Path) -> Result<Dimensions, BackendError> {
    let file_data = std::fs::read(path)?;
    let avif = avif_parse::read_avif(&mut Cursor::new(&file_data))
        .map_err(|e| decode_error(path.display(), format!("{e:?}")))?;
    let meta = avif
        .primary_item_metadata()
        .map_err(|e| decode_error(path.display(), format!("{e:?}")))?;
    Ok(Dimensions {
        width: meta.max_frame_width.get(),
        height: meta.max_frame_height.get(),
    })
}

fn collect_frames(source: &str, frames: Frames<'_>) -> Result<Vec<Frame>, BackendError> {
    let frames = frames
        .collect_frames()
        .map_err(|e| decode_error(source, e))?;
    Ok(frames
        .into_iter()
        .map(|f| {
            let delay = f.delay();
            Frame {
                image: f.into_buffer(),
                delay,
            }
        })
        .collect())
}

/// Decode the pixel frames of an in-memory image. `source` labels errors.
fn decode_frames(source: &str, bytes: &[u8], format: ImageFormat) -> Result<Vec<Frame>, BackendError> {
    match format {
        ImageFormat::Gif => {
            let decoder =
                GifDecoder::new(Cursor::new(bytes)).map_err(|e| decode_error(source, e))?;
            collect_frames(source, decoder.into_frames())
        }
        ImageFormat::WebP => {
            let decoder =
                WebPDecoder::new(Cursor::new(bytes)).map_err(|e| decode_error(source, e))?;
            if decoder.has_animation() {
                collect_frames(source, decoder.into_frames())
            } else {
                let img = DynamicImage::from_decoder(decoder).map_err(|e| decode_error(source, e))?;
                Ok(vec![Frame::still(img.to_rgba8())])
            }
        }
        ImageFormat::Avif => Err(BackendError::Unsupported(format!(
            "AVIF decoding ({source})"
        ))),
        other => {
            let img = image::load_from_memory_with_format(bytes, other)
                .map_err(|e| decode_error(source, e))?;
            Ok(vec![Frame::still(img.to_rgba8())])
        }
    }
}

/// Build a canvas from encoded bytes, attaching the embedded clipping path.
fn canvas_from_bytes(
    source: &str,
    bytes: &[u8],
    format: ImageFormat,
) -> Result<Canvas, BackendError> {
    let frames = decode_frames(source, bytes, format)?;
    let mut canvas =
        Canvas::from_frames(frames).ok_or_else(|| decode_error(source, "image has no frames"))?;
    if matches!(format, ImageFormat::Jpeg | ImageFormat::Tiff) {
        canvas.set_clip_path(read_clip_path(bytes));
    }

    debug!(
        source,
        ?format,
        frames = canvas.frame_count(),
        clip_path = canvas.clip_path().is_some(),
        "decoded"
    );
    Ok(canvas)
}

/// Composite `image` onto an opaque `background`, dropping alpha.
fn flatten(image: &RgbaImage, background: image::Rgba<u8>) -> DynamicImage {
    let mut base = RgbaImage::from_pixel(image.width(), image.height(), background);
    image::imageops::overlay(&mut base, image, 0, 0);
    DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(base).to_rgb8())
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        if is_avif(path) {
            return identify_avif(path);
        }
        let (width, height) =
            image::image_dimensions(path).map_err(|e| decode_error(path.display(), e))?;
        Ok(Dimensions { width, height })
    }

    fn decode(&self, path: &Path) -> Result<Canvas, BackendError> {
        let bytes = std::fs::read(path)?;
        let source = path.display().to_string();
        let format = image::guess_format(&bytes)
            .or_else(|_| ImageFormat::from_path(path))
            .map_err(|e| decode_error(&source, e))?;
        canvas_from_bytes(&source, &bytes, format)
    }

    fn encode(
        &self,
        canvas: &Canvas,
        output: &Path,
        format: OutputFormat,
        quality: Quality,
    ) -> Result<(), BackendError> {
        let encode_error = |e: image::ImageError| BackendError::Encode {
            format,
            message: e.to_string(),
        };
        let file = std::fs::File::create(output)?;
        let mut writer = BufWriter::new(file);
        let first = DynamicImage::ImageRgba8(canvas.first().clone());

        match format {
            OutputFormat::WebP => {
                let image = canvas.first();
                let encoded = webp::Encoder::from_rgba(image.as_raw(), image.width(), image.height())
                    .encode_simple(false, quality.value() as f32)
                    .map_err(|e| BackendError::Encode {
                        format,
                        message: format!("{e:?}"),
                    })?;
                writer.write_all(&encoded)?;
                writer.flush()?;
                Ok(())
            }
            OutputFormat::Png => first
                .write_with_encoder(PngEncoder::new(writer))
                .map_err(encode_error),
            OutputFormat::Jpeg | OutputFormat::Jpg => {
                let mut background = canvas.background();
                if background.alpha() < 255 {
                    background = super::params::Color::WHITE;
                }
                flatten(canvas.first(), background.rgba())
                    .write_with_encoder(JpegEncoder::new_with_quality(
                        writer,
                        quality.value() as u8,
                    ))
                    .map_err(encode_error)
            }
            OutputFormat::Gif => {
                let mut encoder = GifEncoder::new(writer);
                encoder.set_repeat(Repeat::Infinite).map_err(encode_error)?;
                let frames = canvas
                    .frames()
                    .iter()
                    .map(|f| image::Frame::from_parts(f.image.clone(), 0, 0, f.delay));
                encoder.encode_frames(frames).map_err(encode_error)
            }
            OutputFormat::Avif => first
                .write_with_encoder(image::codecs::avif::AvifEncoder::new_with_speed_quality(
                    writer,
                    AVIF_SPEED,
                    quality.value() as u8,
                ))
                .map_err(encode_error),
            OutputFormat::Bmp | OutputFormat::Tiff | OutputFormat::Tif => first
                .write_to(&mut writer, format.image_format())
                .map_err(encode_error),
        }
    }

    fn supports_interlace(&self, _format: OutputFormat, _scheme: Interlace) -> bool {
        false
    }
}
