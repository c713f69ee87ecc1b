//! The abstract 2D drawing surface the overlay engine renders against.
//!
//! The engine only ever needs four primitives: stroke a polyline, stroke an
//! arc, fill rotated text, and measure text. Anything that can do those can
//! display the overlay; [`RecordingCanvas`] captures the commands for tests
//! and headless use.

use nalgebra::Point2;

/// An 8-bit RGBA color.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Color(pub [u8; 4]);

impl Color {
    pub const BLACK: Self = Self([0, 0, 0, 255]);
    pub const WHITE: Self = Self([255, 255, 255, 255]);
    pub const RED: Self = Self([255, 0, 0, 255]);
    pub const GREEN: Self = Self([0, 255, 0, 255]);
    pub const BLUE: Self = Self([0, 0, 255, 255]);
    pub const YELLOW: Self = Self([255, 255, 0, 255]);
    pub const CYAN: Self = Self([0, 255, 255, 255]);

    #[inline]
    pub const fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b, 255])
    }

    #[inline]
    pub fn r(&self) -> u8 {
        self.0[0]
    }

    #[inline]
    pub fn g(&self) -> u8 {
        self.0[1]
    }

    #[inline]
    pub fn b(&self) -> u8 {
        self.0[2]
    }

    #[inline]
    pub fn a(&self) -> u8 {
        self.0[3]
    }

    /// Returns this color with its alpha scaled by `factor` (0.0 to 1.0).
    pub fn fade(self, factor: f32) -> Self {
        let a = (f32::from(self.a()) * factor.clamp(0.0, 1.0)) as u8;
        Self([self.r(), self.g(), self.b(), a])
    }
}

/// Horizontal text anchoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HAlign {
    Left,
    Center,
    Right,
}

/// Vertical text anchoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VAlign {
    Top,
    Middle,
    Bottom,
}

/// Measured extent of a piece of text, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextSize {
    pub width: f32,
    pub height: f32,
}

/// A 2D drawing surface.
///
/// Implementations are infallible: a surface that cannot draw a primitive
/// drops it, it does not error. The overlay engine never aborts a frame.
pub trait Canvas {
    /// Strokes connected line segments through `points`.
    fn stroke_polyline(&mut self, points: &[Point2<f32>], color: Color, stroke_width: f32);

    /// Strokes a circular arc around `center`, from `start_angle` sweeping by
    /// `sweep` radians (positive is the +y winding direction).
    fn stroke_arc(
        &mut self,
        center: Point2<f32>,
        radius: f32,
        start_angle: f32,
        sweep: f32,
        color: Color,
        stroke_width: f32,
    );

    /// Fills `text` anchored at `pos`, rotated by `rotation` radians.
    fn fill_text(
        &mut self,
        text: &str,
        pos: Point2<f32>,
        rotation: f32,
        align: HAlign,
        baseline: VAlign,
        color: Color,
    );

    /// Returns the bounding size `text` would occupy, unrotated.
    fn measure_text(&self, text: &str) -> TextSize;
}

/// A draw command captured by [`RecordingCanvas`].
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCmd {
    Polyline {
        points: Vec<Point2<f32>>,
        color: Color,
        stroke_width: f32,
    },
    Arc {
        center: Point2<f32>,
        radius: f32,
        start_angle: f32,
        sweep: f32,
        color: Color,
        stroke_width: f32,
    },
    Text {
        text: String,
        pos: Point2<f32>,
        rotation: f32,
        align: HAlign,
        baseline: VAlign,
        color: Color,
    },
}

/// Records draw commands instead of rasterizing them.
///
/// Text metrics mirror a 10×20 monospace font so layout decisions match the
/// raster backend.
#[derive(Debug, Default)]
pub struct RecordingCanvas {
    commands: Vec<DrawCmd>,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn commands(&self) -> &[DrawCmd] {
        &self.commands
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Iterates over the recorded text commands.
    pub fn texts(&self) -> impl Iterator<Item = &DrawCmd> {
        self.commands
            .iter()
            .filter(|cmd| matches!(cmd, DrawCmd::Text { .. }))
    }
}

/// Glyph cell of the reference monospace font.
pub(crate) const GLYPH_WIDTH: f32 = 10.0;
pub(crate) const GLYPH_HEIGHT: f32 = 20.0;

impl Canvas for RecordingCanvas {
    fn stroke_polyline(&mut self, points: &[Point2<f32>], color: Color, stroke_width: f32) {
        self.commands.push(DrawCmd::Polyline {
            points: points.to_vec(),
            color,
            stroke_width,
        });
    }

    fn stroke_arc(
        &mut self,
        center: Point2<f32>,
        radius: f32,
        start_angle: f32,
        sweep: f32,
        color: Color,
        stroke_width: f32,
    ) {
        self.commands.push(DrawCmd::Arc {
            center,
            radius,
            start_angle,
            sweep,
            color,
            stroke_width,
        });
    }

    fn fill_text(
        &mut self,
        text: &str,
        pos: Point2<f32>,
        rotation: f32,
        align: HAlign,
        baseline: VAlign,
        color: Color,
    ) {
        self.commands.push(DrawCmd::Text {
            text: text.to_owned(),
            pos,
            rotation,
            align,
            baseline,
            color,
        });
    }

    fn measure_text(&self, text: &str) -> TextSize {
        TextSize {
            width: text.chars().count() as f32 * GLYPH_WIDTH,
            height: GLYPH_HEIGHT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fade_scales_alpha_only() {
        let c = Color::from_rgb8(10, 20, 30).fade(0.5);
        assert_eq!((c.r(), c.g(), c.b()), (10, 20, 30));
        assert_eq!(c.a(), 127);
    }

    #[test]
    fn recording_canvas_measures_monospace() {
        let canvas = RecordingCanvas::new();
        let size = canvas.measure_text("12.3 mm");
        assert_eq!(size.width, 70.0);
        assert_eq!(size.height, 20.0);
    }
}
