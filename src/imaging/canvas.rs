//! The mutable image buffer a pipeline runs against.
//!
//! A [`Canvas`] owns one or more RGBA8 frames. Still images have exactly
//! one; animated GIF and WebP sources keep every frame so that animation-safe
//! operations can touch each of them. Geometry queries always answer for the
//! first frame, which is also the frame scale factors are derived from.
//!
//! Besides pixels the canvas carries the state later operations and the
//! encoder read: the background fill color, an interlace hint, the page
//! offset, and the clipping path found in the source file.

use super::clip_path::ClipPath;
use super::params::{Color, Interlace};
use image::{Delay, RgbaImage};

/// One frame of a canvas.
#[derive(Debug, Clone)]
pub struct Frame {
    pub image: RgbaImage,
    pub delay: Delay,
}

impl Frame {
    pub fn still(image: RgbaImage) -> Self {
        Self {
            image,
            delay: Delay::from_numer_denom_ms(0, 1),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Canvas {
    /// Never empty.
    frames: Vec<Frame>,
    background: Color,
    interlace: Option<Interlace>,
    page_offset: (i32, i32),
    clip_path: Option<ClipPath>,
}

impl Canvas {
    pub fn new(image: RgbaImage) -> Self {
        Self::from_first(Frame::still(image), Vec::new())
    }

    /// Build an animated canvas. Returns `None` when `frames` is empty.
    pub fn from_frames(frames: Vec<Frame>) -> Option<Self> {
        let mut iter = frames.into_iter();
        let first = iter.next()?;
        Some(Self::from_first(first, iter.collect()))
    }

    fn from_first(first: Frame, rest: Vec<Frame>) -> Self {
        let mut frames = Vec::with_capacity(rest.len() + 1);
        frames.push(first);
        frames.extend(rest);
        Self {
            frames,
            background: Color::WHITE,
            interlace: None,
            page_offset: (0, 0),
            clip_path: None,
        }
    }

    /// Solid single-frame canvas.
    pub fn blank(width: u32, height: u32, color: Color) -> Self {
        let mut canvas = Self::new(RgbaImage::from_pixel(width, height, color.rgba()));
        canvas.background = color;
        canvas
    }

    pub fn width(&self) -> u32 {
        self.first().width()
    }

    pub fn height(&self) -> u32 {
        self.first().height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.first().dimensions()
    }

    pub fn first(&self) -> &RgbaImage {
        &self.frames[0].image
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn is_animated(&self) -> bool {
        self.frames.len() > 1
    }

    pub fn into_frames(self) -> Vec<Frame> {
        self.frames
    }

    /// Mutate every frame in place.
    pub fn for_each_frame(&mut self, mut f: impl FnMut(&mut RgbaImage)) {
        for frame in &mut self.frames {
            f(&mut frame.image);
        }
    }

    /// Replace every frame with `f(frame)`.
    pub fn map_frames(&mut self, mut f: impl FnMut(&RgbaImage) -> RgbaImage) {
        for frame in &mut self.frames {
            frame.image = f(&frame.image);
        }
    }

    pub fn background(&self) -> Color {
        self.background
    }

    pub fn set_background(&mut self, color: Color) {
        self.background = color;
    }

    pub fn interlace(&self) -> Option<Interlace> {
        self.interlace
    }

    pub fn set_interlace(&mut self, scheme: Interlace) {
        self.interlace = Some(scheme);
    }

    pub fn page_offset(&self) -> (i32, i32) {
        self.page_offset
    }

    pub fn set_page_offset(&mut self, offset: (i32, i32)) {
        self.page_offset = offset;
    }

    pub fn reset_page(&mut self) {
        self.page_offset = (0, 0);
    }

    pub fn clip_path(&self) -> Option<&ClipPath> {
        self.clip_path.as_ref()
    }

    pub fn set_clip_path(&mut self, path: Option<ClipPath>) {
        self.clip_path = path;
    }

    /// Drop auxiliary data that must not reach the written artifact.
    pub fn strip_metadata(&mut self) {
        self.clip_path = None;
        self.page_offset = (0, 0);
    }
}
