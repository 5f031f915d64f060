//! Display primitives and diff-based drawing.
//!
//! The renderer draws through the [`DisplayOps`] trait; the embedded
//! build adapts the ST7735 panel, tests record draw calls. Text goes
//! through per-field glyph caches so only changed character cells
//! touch the (slow) panel.

/// RGB565 color.
pub type Color = u16;

pub const BLACK: Color = 0x0000;
pub const WHITE: Color = 0xFFFF;
pub const RED: Color = 0xF800;
pub const GREEN: Color = 0x07E0;
pub const YELLOW: Color = 0xFFE0;
pub const CYAN: Color = 0x07FF;

/// Character cell width in pixels.
pub const CHAR_W: u16 = 7;

/// Line height in pixels (7x13 font cell).
pub const LINE_H: u16 = 13;

/// Pixel-level drawing primitives of the panel.
pub trait DisplayOps {
    /// Draw one character with the fixed 7x10 font, background filled.
    fn draw_char(&mut self, x: u16, y: u16, c: char, fg: Color, bg: Color);

    /// Fill a rectangle.
    fn fill_rect(&mut self, x: u16, y: u16, w: u16, h: u16, color: Color);

    /// Outline a rectangle.
    fn draw_rect(&mut self, x: u16, y: u16, w: u16, h: u16, color: Color);

    /// Draw a vertical line.
    fn draw_vline(&mut self, x: u16, y: u16, h: u16, color: Color);
}

/// Widest text field we cache.
pub const FIELD_MAX: usize = 22;

/// One text field at a fixed pixel position, with the last-rendered
/// glyphs kept for diffing.
pub struct TextField {
    x: u16,
    y: u16,
    last: [u8; FIELD_MAX],
    last_len: usize,
}

impl TextField {
    pub const fn new(x: u16, y: u16) -> Self {
        Self {
            x,
            y,
            last: [0; FIELD_MAX],
            last_len: 0,
        }
    }

    /// Draw `text`, touching only cells that differ from the previous
    /// call. When the new text is shorter, leftover cells are blanked.
    pub fn set(&mut self, surface: &mut impl DisplayOps, text: &[u8], fg: Color, bg: Color) {
        let len = text.len().min(FIELD_MAX);
        let span = len.max(self.last_len);

        for i in 0..span {
            let new_c = if i < len { text[i] } else { b' ' };
            // Cells past the cached length are unknown, not blank, so
            // a fresh field draws its spaces too.
            let old_c = if i < self.last_len { self.last[i] } else { 0 };
            if new_c != old_c {
                surface.draw_char(
                    self.x + (i as u16) * CHAR_W,
                    self.y,
                    new_c as char,
                    fg,
                    bg,
                );
            }
        }

        self.last[..len].copy_from_slice(&text[..len]);
        self.last_len = len;
    }

    /// Forget the cached glyphs so the next `set` redraws every cell
    /// (used after the screen area has been cleared).
    pub fn invalidate(&mut self) {
        self.last_len = 0;
    }
}

/// A labeled horizontal override gauge with a 100% center reference.
///
/// Values left of 100% fill a deficit zone from the value toward
/// center; values right of it fill a surplus zone from center toward
/// the value. The range is clamped at construction-time bounds.
pub struct GaugeBar {
    x: u16,
    y: u16,
    w: u16,
    h: u16,
    min: u16,
    max: u16,
    last: Option<u16>,
}

impl GaugeBar {
    pub const fn new(x: u16, y: u16, w: u16, h: u16, min: u16, max: u16) -> Self {
        Self {
            x,
            y,
            w,
            h,
            min,
            max,
            last: None,
        }
    }

    fn col(&self, value: u16) -> u16 {
        // Inner width excludes the 1px frame on each side.
        let inner = self.w - 2;
        let clamped = value.clamp(self.min, self.max);
        let span = (self.max - self.min) as u32;
        (u32::from(clamped - self.min) * u32::from(inner - 1) / span) as u16
    }

    /// Redraw for `value` if it changed since the last call.
    pub fn set(&mut self, surface: &mut impl DisplayOps, value: u16) {
        if self.last == Some(value) {
            return;
        }
        self.last = Some(value);

        let inner_x = self.x + 1;
        let inner_y = self.y + 1;
        let inner_w = self.w - 2;
        let inner_h = self.h - 2;

        surface.draw_rect(self.x, self.y, self.w, self.h, WHITE);
        surface.fill_rect(inner_x, inner_y, inner_w, inner_h, BLACK);

        let center = self.col(100);
        let at = self.col(value);
        if at < center {
            // Deficit: fill from the value up to center.
            surface.fill_rect(inner_x + at, inner_y, center - at, inner_h, YELLOW);
        } else if at > center {
            // Surplus: fill from center up to the value.
            surface.fill_rect(inner_x + center, inner_y, at - center, inner_h, GREEN);
        }
        surface.draw_vline(inner_x + center, inner_y, inner_h, WHITE);
    }

    /// Force a full redraw on the next `set`.
    pub fn invalidate(&mut self) {
        self.last = None;
    }
}


#[cfg(test)]
mod tests {
    use super::recording::{Op, RecordingSurface};
    use super::*;

    #[test]
    fn first_set_draws_every_cell() {
        let mut surface = RecordingSurface::new();
        let mut field = TextField::new(0, 12);

        field.set(&mut surface, b"X:  12.5", WHITE, BLACK);
        assert_eq!(surface.chars_drawn(), 8);
    }

    #[test]
    fn unchanged_cells_are_skipped() {
        let mut surface = RecordingSurface::new();
        let mut field = TextField::new(0, 0);

        field.set(&mut surface, b"  123.4560", WHITE, BLACK);
        surface.clear();
        field.set(&mut surface, b"  123.4570", WHITE, BLACK);

        // Only the '6' -> '7' cell changed.
        assert_eq!(surface.ops, [Op::Char { x: 8 * CHAR_W, y: 0, c: '7' }]);
    }

    #[test]
    fn shrinking_text_blanks_the_tail() {
        let mut surface = RecordingSurface::new();
        let mut field = TextField::new(0, 0);

        field.set(&mut surface, b"8.000", WHITE, BLACK);
        surface.clear();
        field.set(&mut surface, b"900", WHITE, BLACK);

        // '8'->'9', '.'->'0', '0'->'0' (skip), '0'->' ', '0'->' '.
        let drawn: std::vec::Vec<char> = surface
            .ops
            .iter()
            .filter_map(|o| match o {
                Op::Char { c, .. } => Some(*c),
                _ => None,
            })
            .collect();
        assert_eq!(drawn, ['9', '0', ' ', ' ']);
    }

    #[test]
    fn invalidate_forces_full_redraw() {
        let mut surface = RecordingSurface::new();
        let mut field = TextField::new(0, 0);

        field.set(&mut surface, b"abc", WHITE, BLACK);
        field.invalidate();
        surface.clear();
        field.set(&mut surface, b"abc", WHITE, BLACK);
        assert_eq!(surface.chars_drawn(), 3);
    }

    #[test]
    fn gauge_center_reference_and_zones() {
        let mut surface = RecordingSurface::new();
        // Feed gauge range 0..250, 102px wide -> 100px inner.
        let mut gauge = GaugeBar::new(0, 100, 102, 8, 0, 250);

        gauge.set(&mut surface, 100);
        // At exactly 100% neither zone is filled.
        let zone_fills = surface
            .ops
            .iter()
            .filter(|o| {
                matches!(o, Op::FillRect { color, .. } if *color == YELLOW || *color == GREEN)
            })
            .count();
        assert_eq!(zone_fills, 0);

        surface.clear();
        gauge.set(&mut surface, 50);
        assert!(surface
            .ops
            .iter()
            .any(|o| matches!(o, Op::FillRect { color, .. } if *color == YELLOW)));

        surface.clear();
        gauge.set(&mut surface, 200);
        assert!(surface
            .ops
            .iter()
            .any(|o| matches!(o, Op::FillRect { color, .. } if *color == GREEN)));
    }

    #[test]
    fn gauge_skips_unchanged_value_and_clamps() {
        let mut surface = RecordingSurface::new();
        let mut gauge = GaugeBar::new(0, 0, 52, 8, 50, 150);

        gauge.set(&mut surface, 120);
        surface.clear();
        gauge.set(&mut surface, 120);
        assert!(surface.ops.is_empty());

        // Out-of-range values clamp instead of overflowing the bar.
        gauge.set(&mut surface, 9999);
        assert!(!surface.ops.is_empty());
    }
}
