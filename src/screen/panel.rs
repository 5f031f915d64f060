//! ST7735 TFT panel adapter.
//!
//! Bridges the renderer's [`DisplayOps`] calls onto any
//! `embedded-graphics` draw target with RGB565 color, which the
//! `st7735-lcd` driver provides over SPI.

use embedded_graphics::mono_font::ascii::FONT_7X13;
use embedded_graphics::mono_font::MonoTextStyleBuilder;
use embedded_graphics::pixelcolor::raw::RawU16;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Line, PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Baseline, Text};

use crate::screen::surface::{Color, DisplayOps};

/// Wraps a draw target; drawing errors are swallowed because there is
/// no recovery path for a dead panel beyond continuing blind.
pub struct Panel<D> {
    target: D,
}

impl<D> Panel<D>
where
    D: DrawTarget<Color = Rgb565>,
{
    pub fn new(target: D) -> Self {
        Self { target }
    }

    /// Clear the whole screen to black.
    pub fn clear(&mut self) {
        let _ = self.target.clear(Rgb565::BLACK);
    }
}

fn rgb(c: Color) -> Rgb565 {
    Rgb565::from(RawU16::new(c))
}

impl<D> DisplayOps for Panel<D>
where
    D: DrawTarget<Color = Rgb565>,
{
    fn draw_char(&mut self, x: u16, y: u16, c: char, fg: Color, bg: Color) {
        let style = MonoTextStyleBuilder::new()
            .font(&FONT_7X13)
            .text_color(rgb(fg))
            .background_color(rgb(bg))
            .build();
        let mut buf = [0u8; 4];
        let s: &str = c.encode_utf8(&mut buf);
        let _ = Text::with_baseline(
            s,
            Point::new(i32::from(x), i32::from(y)),
            style,
            Baseline::Top,
        )
        .draw(&mut self.target);
    }

    fn fill_rect(&mut self, x: u16, y: u16, w: u16, h: u16, color: Color) {
        let _ = Rectangle::new(
            Point::new(i32::from(x), i32::from(y)),
            Size::new(u32::from(w), u32::from(h)),
        )
        .into_styled(PrimitiveStyle::with_fill(rgb(color)))
        .draw(&mut self.target);
    }

    fn draw_rect(&mut self, x: u16, y: u16, w: u16, h: u16, color: Color) {
        let _ = Rectangle::new(
            Point::new(i32::from(x), i32::from(y)),
            Size::new(u32::from(w), u32::from(h)),
        )
        .into_styled(PrimitiveStyle::with_stroke(rgb(color), 1))
        .draw(&mut self.target);
    }

    fn draw_vline(&mut self, x: u16, y: u16, h: u16, color: Color) {
        let _ = Line::new(
            Point::new(i32::from(x), i32::from(y)),
            Point::new(i32::from(x), i32::from(y) + i32::from(h) - 1),
        )
        .into_styled(PrimitiveStyle::with_stroke(rgb(color), 1))
        .draw(&mut self.target);
    }
}
