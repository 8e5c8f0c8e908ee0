//! Transparency masks: the embedded clipping path and rectangular drills.

use super::{Apply, Context, OperationError};
use crate::imaging::Canvas;
use crate::imaging::primitives::{MASK_SHAPE, paint_transparent};
use imageproc::drawing::{draw_filled_rect_mut, draw_polygon_mut};
use imageproc::point::Point;
use imageproc::rect::Rect;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClipPathMask {
    /// Remove the area inside the path instead of keeping it.
    #[serde(default)]
    pub inside: bool,
}

impl Apply for ClipPathMask {
    fn key(&self) -> String {
        format!("clip-path:{}", self.inside)
    }

    fn apply(&self, canvas: &mut Canvas, ctx: &mut Context<'_>) -> Result<(), OperationError> {
        let Some(path) = canvas.clip_path().filter(|p| !p.is_empty()) else {
            ctx.note("clip-path: source has no clipping path");
            return Ok(());
        };
        let (width, height) = canvas.dimensions();
        let polygons: Vec<Vec<Point<i32>>> = path
            .polygons(width, height)
            .iter()
            .filter_map(|poly| pixel_polygon(poly))
            .collect();

        // The path marks what stays; painting it keeps the outside.
        paint_transparent(canvas, !self.inside, |mask| {
            for poly in &polygons {
                draw_polygon_mut(mask, poly, MASK_SHAPE);
            }
        });
        Ok(())
    }
}

/// Snap a float polygon to pixels in the form `draw_polygon_mut` accepts:
/// no repeated neighbours, not closed explicitly, at least three points.
fn pixel_polygon(points: &[(f32, f32)]) -> Option<Vec<Point<i32>>> {
    let mut out: Vec<Point<i32>> = Vec::with_capacity(points.len());
    for &(x, y) in points {
        let p = Point::new(x.round() as i32, y.round() as i32);
        if out.last() != Some(&p) {
            out.push(p);
        }
    }
    while out.len() > 1 && out.first() == out.last() {
        out.pop();
    }
    (out.len() >= 3).then_some(out)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Drill {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    /// Keep only the rectangle instead of removing it.
    #[serde(default)]
    pub invert: bool,
}

impl Apply for Drill {
    fn key(&self) -> String {
        format!(
            "drill:{}x{}-{}-{}:{}",
            self.width, self.height, self.x, self.y, self.invert
        )
    }

    fn apply(&self, canvas: &mut Canvas, _ctx: &mut Context<'_>) -> Result<(), OperationError> {
        // Both corners are inclusive, so the hole spans width+1 by height+1.
        let rect = Rect::at(self.x, self.y)
            .of_size(self.width.saturating_add(1), self.height.saturating_add(1));
        paint_transparent(canvas, self.invert, |mask| {
            draw_filled_rect_mut(mask, rect, MASK_SHAPE);
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::Operation;
    use super::super::tests::run;
    use super::*;
    use crate::imaging::clip_path::{ClipPath, Knot, PathPoint, Subpath};
    use crate::imaging::{Color, Frame};
    use image::{Rgba, RgbaImage};

    fn rect_clip_path(x0: f64, y0: f64, x1: f64, y1: f64) -> ClipPath {
        let knot = |x, y| {
            let p = PathPoint { x, y };
            Knot {
                control_in: p,
                anchor: p,
                control_out: p,
            }
        };
        ClipPath {
            name: Some("Path 1".to_string()),
            subpaths: vec![Subpath {
                closed: true,
                knots: vec![knot(x0, y0), knot(x1, y0), knot(x1, y1), knot(x0, y1)],
            }],
        }
    }

    fn alpha(c: &Canvas, x: u32, y: u32) -> u8 {
        c.first().get_pixel(x, y)[3]
    }

    #[test]
    fn drill_punches_hole() {
        let mut c = Canvas::blank(10, 10, Color::WHITE);
        let (result, _) = run(&Operation::drill(2, 2, 3, 3, false), &mut c);
        assert_eq!(result, Ok(()));
        assert_eq!(alpha(&c, 2, 2), 0);
        assert_eq!(alpha(&c, 5, 5), 0);
        assert_eq!(alpha(&c, 6, 6), 255);
        assert_eq!(alpha(&c, 0, 0), 255);
    }

    #[test]
    fn inverted_drill_keeps_only_rect() {
        let mut c = Canvas::blank(10, 10, Color::WHITE);
        run(&Operation::drill(2, 2, 3, 3, true), &mut c);
        assert_eq!(alpha(&c, 3, 3), 255);
        assert_eq!(alpha(&c, 0, 0), 0);
        assert_eq!(alpha(&c, 9, 9), 0);
    }

    #[test]
    fn drill_outside_canvas_is_clipped() {
        let mut c = Canvas::blank(10, 10, Color::WHITE);
        let (result, _) = run(&Operation::drill(-5, -5, 7, 7, false), &mut c);
        assert_eq!(result, Ok(()));
        assert_eq!(alpha(&c, 0, 0), 0);
        assert_eq!(alpha(&c, 3, 3), 255);
    }

    #[test]
    fn drill_applies_to_every_frame() {
        let frames = (0..3)
            .map(|_| Frame::still(RgbaImage::from_pixel(6, 6, Rgba([1, 2, 3, 255]))))
            .collect();
        let mut c = Canvas::from_frames(frames).unwrap();
        run(&Operation::drill(0, 0, 1, 1, false), &mut c);
        assert!(c.frames().iter().all(|f| f.image.get_pixel(1, 1)[3] == 0));
    }

    #[test]
    fn clip_path_without_path_is_noted_noop() {
        let mut c = Canvas::blank(10, 10, Color::WHITE);
        let (result, notes) = run(&Operation::clip_path(false), &mut c);
        assert_eq!(result, Ok(()));
        assert_eq!(notes.len(), 1);
        assert!(c.first().pixels().all(|p| p[3] == 255));
    }

    #[test]
    fn clip_path_keeps_inside() {
        let mut c = Canvas::blank(100, 100, Color::WHITE);
        c.set_clip_path(Some(rect_clip_path(0.25, 0.25, 0.75, 0.75)));
        let (result, notes) = run(&Operation::clip_path(false), &mut c);
        assert_eq!(result, Ok(()));
        assert!(notes.is_empty());
        assert_eq!(alpha(&c, 50, 50), 255);
        assert_eq!(alpha(&c, 5, 5), 0);
        assert_eq!(alpha(&c, 95, 50), 0);
    }

    #[test]
    fn clip_path_inside_removes_inside() {
        let mut c = Canvas::blank(100, 100, Color::WHITE);
        c.set_clip_path(Some(rect_clip_path(0.25, 0.25, 0.75, 0.75)));
        run(&Operation::clip_path(true), &mut c);
        assert_eq!(alpha(&c, 50, 50), 0);
        assert_eq!(alpha(&c, 5, 5), 255);
    }

    #[test]
    fn degenerate_polygons_are_dropped() {
        assert_eq!(pixel_polygon(&[(1.0, 1.0), (1.2, 0.9), (5.0, 5.0)]), None);
        let square = pixel_polygon(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0), (0.0, 0.0)])
            .unwrap();
        assert_eq!(square.len(), 4);
    }
}
