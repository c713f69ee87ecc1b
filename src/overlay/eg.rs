//! [`embedded-graphics`] backend for the overlay canvas.
//!
//! Rasterizes the overlay onto any infallible [`DrawTarget`]. The mono-font
//! text renderer only produces horizontal glyph runs, so label rotation is
//! quantized away here; the layout (collision boxes, candidate selection)
//! still uses the same glyph metrics, so placement matches the recording
//! backend exactly.
//!
//! [`embedded-graphics`]: https://docs.rs/embedded-graphics

use std::convert::Infallible;

use embedded_graphics::{
    draw_target::DrawTarget,
    mono_font::{ascii::FONT_10X20, MonoTextStyle},
    pixelcolor::Rgb888,
    prelude::*,
    primitives::{Line, PrimitiveStyle},
    text::{Alignment, Baseline, Text, TextStyleBuilder},
};
use itertools::Itertools;
use nalgebra::Point2;

use super::canvas::{Canvas, Color, HAlign, TextSize, VAlign, GLYPH_HEIGHT, GLYPH_WIDTH};
use crate::geom;

/// Arc flattening granularity, in degrees of sweep per segment.
const ARC_SEGMENT_DEG: f32 = 5.0;

/// Adapts an [`embedded_graphics`] draw target to the overlay [`Canvas`].
pub struct EgCanvas<D> {
    target: D,
}

impl<D> EgCanvas<D>
where
    D: DrawTarget<Color = Rgb888, Error = Infallible>,
{
    pub fn new(target: D) -> Self {
        Self { target }
    }

    pub fn into_inner(self) -> D {
        self.target
    }

    fn draw_line(&mut self, a: Point2<f32>, b: Point2<f32>, color: Rgb888, width: u32) {
        match Line::new(to_pixel(a), to_pixel(b))
            .into_styled(PrimitiveStyle::with_stroke(color, width))
            .draw(&mut self.target)
        {
            Ok(()) => {}
            Err(infallible) => match infallible {},
        }
    }
}

fn to_pixel(p: Point2<f32>) -> Point {
    Point::new(p.x.round() as i32, p.y.round() as i32)
}

/// Raster targets have no alpha channel; faded overlay colors are darkened
/// instead, which reads the same against a video background.
fn to_rgb(color: Color) -> Rgb888 {
    let a = f32::from(color.a()) / 255.0;
    Rgb888::new(
        (f32::from(color.r()) * a) as u8,
        (f32::from(color.g()) * a) as u8,
        (f32::from(color.b()) * a) as u8,
    )
}

impl<D> Canvas for EgCanvas<D>
where
    D: DrawTarget<Color = Rgb888, Error = Infallible>,
{
    fn stroke_polyline(&mut self, points: &[Point2<f32>], color: Color, stroke_width: f32) {
        let color = to_rgb(color);
        let width = stroke_width.round().max(1.0) as u32;
        for (a, b) in points.iter().tuple_windows() {
            self.draw_line(*a, *b, color, width);
        }
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
        let segments = (sweep.abs().to_degrees() / ARC_SEGMENT_DEG).ceil().max(1.0) as usize;
        let points: Vec<_> = (0..=segments)
            .map(|i| {
                let theta = start_angle + sweep * i as f32 / segments as f32;
                geom::point_on_ray(center, theta, radius)
            })
            .collect();
        self.stroke_polyline(&points, color, stroke_width);
    }

    fn fill_text(
        &mut self,
        text: &str,
        pos: Point2<f32>,
        _rotation: f32,
        align: HAlign,
        baseline: VAlign,
        color: Color,
    ) {
        let style = MonoTextStyle::new(&FONT_10X20, to_rgb(color));
        let text_style = TextStyleBuilder::new()
            .alignment(match align {
                HAlign::Left => Alignment::Left,
                HAlign::Center => Alignment::Center,
                HAlign::Right => Alignment::Right,
            })
            .baseline(match baseline {
                VAlign::Top => Baseline::Top,
                VAlign::Middle => Baseline::Middle,
                VAlign::Bottom => Baseline::Bottom,
            })
            .build();
        match Text::with_text_style(text, to_pixel(pos), style, text_style).draw(&mut self.target)
        {
            Ok(_) => {}
            Err(infallible) => match infallible {},
        }
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
    use embedded_graphics::mock_display::MockDisplay;

    fn canvas() -> EgCanvas<MockDisplay<Rgb888>> {
        let mut display = MockDisplay::new();
        display.set_allow_overdraw(true);
        display.set_allow_out_of_bounds_drawing(true);
        EgCanvas::new(display)
    }

    #[test]
    fn polyline_rasterizes() {
        let mut canvas = canvas();
        canvas.stroke_polyline(
            &[Point2::new(5.0, 10.0), Point2::new(20.0, 10.0)],
            Color::WHITE,
            1.0,
        );
        let display = canvas.into_inner();
        assert_eq!(display.get_pixel(Point::new(10, 10)), Some(Rgb888::WHITE));
    }

    #[test]
    fn arc_flattens_into_segments() {
        let mut canvas = canvas();
        canvas.stroke_arc(
            Point2::new(32.0, 32.0),
            10.0,
            0.0,
            std::f32::consts::FRAC_PI_2,
            Color::WHITE,
            1.0,
        );
        let display = canvas.into_inner();
        // The arc starts at angle 0, i.e. at (42, 32).
        assert_eq!(display.get_pixel(Point::new(42, 32)), Some(Rgb888::WHITE));
    }

    #[test]
    fn text_draws_horizontally() {
        let mut canvas = canvas();
        canvas.fill_text(
            "1",
            Point2::new(20.0, 20.0),
            0.4,
            HAlign::Center,
            VAlign::Middle,
            Color::WHITE,
        );
        let display = canvas.into_inner();
        assert!(!display.affected_area().is_zero_sized());
    }
}
