//! Trail canvas and fading streak compositing.
//!
//! Each frame the existing trails are faded by scaling their alpha, then
//! the new segments are stroked on top, one path per colour bucket.

use tiny_skia::{
    BlendMode, Color, LineCap, Paint, PathBuilder, Pixmap, Rect, Stroke, Transform,
};
use tracing::debug;
use velocity_common::PixelBounds;

use crate::error::RenderError;
use crate::png;

/// A straight trail segment in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Segment {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }
}

/// Drawing surface used by the animator.
///
/// Implementations must keep pixels outside the faded or stroked areas
/// untouched.
pub trait TrailCanvas {
    /// Canvas size in pixels.
    fn size(&self) -> (u32, u32);

    /// Multiply the alpha of every pixel inside `bounds` by `retain`,
    /// keeping only what is already drawn.
    fn fade(&mut self, bounds: &PixelBounds, retain: f32) -> Result<(), RenderError>;

    /// Stroke all `segments` in one pass with a single colour.
    fn stroke_segments(
        &mut self,
        color: [u8; 4],
        line_width: f32,
        segments: &[Segment],
    ) -> Result<(), RenderError>;

    /// Erase the whole canvas.
    fn clear(&mut self);
}

/// In-memory trail canvas backed by a tiny-skia pixmap.
pub struct PixmapCanvas {
    pixmap: Pixmap,
}

impl PixmapCanvas {
    /// Create a transparent canvas.
    pub fn new(width: u32, height: u32) -> Result<Self, RenderError> {
        let mut pixmap =
            Pixmap::new(width, height).ok_or(RenderError::CanvasAllocation { width, height })?;
        pixmap.fill(Color::TRANSPARENT);
        debug!(width, height, "Created trail canvas");
        Ok(Self { pixmap })
    }

    /// Underlying pixmap (premultiplied RGBA).
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Straight-alpha RGBA value of one pixel.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let color = self.pixmap.pixel(x, y)?.demultiply();
        Some([color.red(), color.green(), color.blue(), color.alpha()])
    }

    /// Number of pixels with non-zero alpha.
    pub fn painted_pixels(&self) -> usize {
        self.pixmap.pixels().iter().filter(|p| p.alpha() > 0).count()
    }

    /// Encode the current canvas as an RGBA PNG.
    pub fn encode_png(&self) -> Result<Vec<u8>, RenderError> {
        png::encode_pixmap(&self.pixmap)
    }
}

impl TrailCanvas for PixmapCanvas {
    fn size(&self) -> (u32, u32) {
        (self.pixmap.width(), self.pixmap.height())
    }

    fn fade(&mut self, bounds: &PixelBounds, retain: f32) -> Result<(), RenderError> {
        if bounds.is_empty() {
            return Ok(());
        }
        let rect = Rect::from_xywh(
            bounds.x as f32,
            bounds.y as f32,
            bounds.width() as f32,
            bounds.height() as f32,
        )
        .ok_or_else(|| RenderError::Canvas(format!("invalid fade rectangle {:?}", bounds)))?;

        let alpha = (retain.clamp(0.0, 1.0) * 255.0).round() as u8;
        let mut paint = Paint::default();
        paint.set_color_rgba8(0, 0, 0, alpha);
        paint.blend_mode = BlendMode::DestinationIn;
        paint.anti_alias = false;

        self.pixmap.fill_rect(rect, &paint, Transform::identity(), None);
        Ok(())
    }

    fn stroke_segments(
        &mut self,
        color: [u8; 4],
        line_width: f32,
        segments: &[Segment],
    ) -> Result<(), RenderError> {
        if segments.is_empty() || color[3] == 0 {
            return Ok(());
        }

        let mut pb = PathBuilder::new();
        for segment in segments {
            pb.move_to(segment.x0, segment.y0);
            pb.line_to(segment.x1, segment.y1);
        }
        let mut paint = Paint::default();
        paint.set_color_rgba8(color[0], color[1], color[2], color[3]);
        paint.anti_alias = true;

        let stroke = Stroke {
            width: line_width,
            line_cap: LineCap::Butt,
            ..Stroke::default()
        };

        // None when every segment has zero length
        if let Some(path) = pb.finish() {
            self.pixmap
                .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }
        Ok(())
    }

    fn clear(&mut self) {
        self.pixmap.fill(Color::TRANSPARENT);
    }
}
