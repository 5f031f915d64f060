//! Screen source multiplexing and rendering.
//!
//! Two asynchronous feeds compete for the screen: the live 7-segment
//! value (one decoded number) and the periodically reassembled status
//! frame (full coordinate snapshot). A fresh frame wins for
//! [`FRAME_HOLD_MS`]; afterwards the screen falls back to the last
//! live value. Same-source redraws are throttled; a source switch
//! clears the content area and redraws immediately.

use crate::config::{
    AXIS_OFF_SHOW_MS, CHUNK_LEN, FEATURE_REPORT_ID, FEED_OVR_MAX, FEED_OVR_MIN, FRAME_HOLD_MS,
    RENDER_MIN_PERIOD_MS, SPINDLE_OVR_MAX, SPINDLE_OVR_MIN,
};
use crate::format::{format_coord, format_u16_thousands, COORD_WIDTH};
use crate::frame::{FrameAssembler, StatusFrame};
use crate::io::rotary::RotaryCode;
use crate::screen::seg7::decode_live;
use crate::screen::surface::{
    Color, DisplayOps, GaugeBar, TextField, BLACK, CHAR_W, CYAN, LINE_H, WHITE,
};

/// What the screen currently shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Source {
    None,
    Live,
    Frame,
}

/// Screen geometry (160x128 panel, 7x13 font cells).
const HEADER_Y: u16 = 0;
const CONTENT_Y: u16 = LINE_H;
const AXIS_X: u16 = 152;
const COORD_LABELS: [&[u8; 2]; 6] = [b"Xw", b"Yw", b"Zw", b"Xm", b"Ym", b"Zm"];
const STATUS_Y: u16 = CONTENT_Y + 6 * LINE_H;
const GAUGE_FEED_Y: u16 = STATUS_Y + LINE_H + 2;
const GAUGE_SPINDLE_Y: u16 = GAUGE_FEED_Y + 11;
const GAUGE_X: u16 = 10;
const GAUGE_W: u16 = 102;
const GAUGE_H: u16 = 9;
const SCREEN_W: u16 = 160;
const SCREEN_H: u16 = 128;

struct Layout {
    header: TextField,
    axis: TextField,
    coords: [TextField; 6],
    status: TextField,
    live_value: TextField,
    feed_label: TextField,
    spindle_label: TextField,
    feed_gauge: GaugeBar,
    spindle_gauge: GaugeBar,
}

impl Layout {
    const fn new() -> Self {
        Self {
            header: TextField::new(0, HEADER_Y),
            axis: TextField::new(AXIS_X, HEADER_Y),
            coords: [
                TextField::new(0, CONTENT_Y),
                TextField::new(0, CONTENT_Y + LINE_H),
                TextField::new(0, CONTENT_Y + 2 * LINE_H),
                TextField::new(0, CONTENT_Y + 3 * LINE_H),
                TextField::new(0, CONTENT_Y + 4 * LINE_H),
                TextField::new(0, CONTENT_Y + 5 * LINE_H),
            ],
            status: TextField::new(0, STATUS_Y),
            live_value: TextField::new(4 * CHAR_W, CONTENT_Y + LINE_H),
            feed_label: TextField::new(0, GAUGE_FEED_Y + 1),
            spindle_label: TextField::new(0, GAUGE_SPINDLE_Y + 1),
            feed_gauge: GaugeBar::new(GAUGE_X, GAUGE_FEED_Y, GAUGE_W, GAUGE_H, FEED_OVR_MIN, FEED_OVR_MAX),
            spindle_gauge: GaugeBar::new(
                GAUGE_X,
                GAUGE_SPINDLE_Y,
                GAUGE_W,
                GAUGE_H,
                SPINDLE_OVR_MIN,
                SPINDLE_OVR_MAX,
            ),
        }
    }

    fn invalidate(&mut self) {
        self.header.invalidate();
        for f in &mut self.coords {
            f.invalidate();
        }
        self.status.invalidate();
        self.live_value.invalidate();
        self.feed_label.invalidate();
        self.spindle_label.invalidate();
        self.feed_gauge.invalidate();
        self.spindle_gauge.invalidate();
    }
}

/// Owns both inbound display feeds and the per-field render caches.
pub struct RenderMux {
    assembler: FrameAssembler,
    live: [u8; CHUNK_LEN],
    have_live: bool,
    frame: Option<StatusFrame>,
    frame_at_ms: u32,
    shown: Source,
    last_draw_ms: u32,
    axis_shown: char,
    axis_off_since: Option<u32>,
    layout: Layout,
}

impl RenderMux {
    pub const fn new() -> Self {
        Self {
            assembler: FrameAssembler::new(),
            live: [0; CHUNK_LEN],
            have_live: false,
            frame: None,
            frame_at_ms: 0,
            shown: Source::None,
            last_draw_ms: 0,
            axis_shown: ' ',
            axis_off_since: None,
            layout: Layout::new(),
        }
    }

    /// Feed one raw host report popped from the inbound queue.
    ///
    /// Every feature-report chunk refreshes the live payload and feeds
    /// the frame assembler. Returns the decoded frame when this chunk
    /// completed a magic-valid one (the caller forwards its day value
    /// to the report builder).
    pub fn ingest(&mut self, report: &[u8], now_ms: u32) -> Option<StatusFrame> {
        if report.len() < 1 + CHUNK_LEN || report[0] != FEATURE_REPORT_ID {
            return None;
        }

        let mut chunk = [0u8; CHUNK_LEN];
        chunk.copy_from_slice(&report[1..1 + CHUNK_LEN]);
        self.live = chunk;
        self.have_live = true;

        let raw = self.assembler.feed(&chunk)?;
        // A completed frame with a bad magic is treated as absent.
        let frame = StatusFrame::parse(&raw)?;
        self.frame = Some(frame);
        self.frame_at_ms = now_ms;
        Some(frame)
    }

    /// Currently displayed source.
    pub fn shown(&self) -> Source {
        self.shown
    }

    /// Which source would be drawn at `now_ms`.
    fn pick(&self, now_ms: u32) -> Source {
        if self.frame.is_some() && now_ms.wrapping_sub(self.frame_at_ms) <= FRAME_HOLD_MS {
            Source::Frame
        } else if self.have_live {
            Source::Live
        } else {
            Source::None
        }
    }

    /// Resolve the axis letter with its own anti-flicker debounce: a
    /// non-Off position shows immediately, Off only after it has
    /// persisted for [`AXIS_OFF_SHOW_MS`].
    fn axis_letter(&mut self, rotary: RotaryCode, now_ms: u32) -> char {
        if rotary != RotaryCode::Off {
            self.axis_off_since = None;
            self.axis_shown = rotary.letter();
        } else {
            let since = *self.axis_off_since.get_or_insert(now_ms);
            if now_ms.wrapping_sub(since) >= AXIS_OFF_SHOW_MS {
                self.axis_shown = ' ';
            }
        }
        self.axis_shown
    }

    /// Run one render pass. Call once per main-loop iteration, after
    /// draining the inbound queue.
    pub fn render(&mut self, surface: &mut impl DisplayOps, rotary: RotaryCode, now_ms: u32) {
        let axis = self.axis_letter(rotary, now_ms);
        self.layout.axis.set(surface, &[axis as u8], CYAN, BLACK);

        let want = self.pick(now_ms);
        if want == Source::None {
            return;
        }

        // Same source: throttle. Source change: redraw immediately on
        // a cleared content area.
        if want == self.shown {
            if now_ms.wrapping_sub(self.last_draw_ms) < RENDER_MIN_PERIOD_MS {
                return;
            }
        } else {
            surface.fill_rect(0, CONTENT_Y, SCREEN_W, SCREEN_H - CONTENT_Y, BLACK);
            self.layout.invalidate();
        }

        // `pick` only returns Frame when one is stored; anything else
        // that reaches here is the live view.
        if let (Source::Frame, Some(frame)) = (want, self.frame) {
            self.draw_frame(surface, &frame);
        } else {
            self.draw_live(surface);
        }

        self.shown = want;
        self.last_draw_ms = now_ms;
    }

    fn draw_frame(&mut self, surface: &mut impl DisplayOps, frame: &StatusFrame) {
        let mut header = [b' '; 13];
        header[..10].copy_from_slice(b"FRAME Day:");
        header[10] = b'0' + (frame.day / 100) % 10;
        header[11] = b'0' + (frame.day / 10) % 10;
        header[12] = b'0' + frame.day % 10;
        self.layout.header.set(surface, &header, WHITE, BLACK);

        let mut line = [b' '; 14];
        for (i, pos) in frame.pos.iter().enumerate() {
            line[..2].copy_from_slice(COORD_LABELS[i]);
            line[2] = b' ';
            line[3] = b' ';
            let mut value = [0u8; COORD_WIDTH];
            format_coord(pos.int_part, pos.frac_part, &mut value);
            line[4..14].copy_from_slice(&value);
            self.layout.coords[i].set(surface, &line, WHITE, BLACK);
        }

        // "F 1.500 S 8.000 x04"
        let mut num = [0u8; 8];
        let mut status: heapless::Vec<u8, 22> = heapless::Vec::new();
        let _ = status.extend_from_slice(b"F ");
        let n = format_u16_thousands(frame.feedrate, &mut num);
        let _ = status.extend_from_slice(&num[..n]);
        let _ = status.extend_from_slice(b" S ");
        let n = format_u16_thousands(frame.spindle_speed, &mut num);
        let _ = status.extend_from_slice(&num[..n]);
        let _ = status.extend_from_slice(&[
            b' ',
            b'x',
            b'0' + (frame.step_multiplier / 10) % 10,
            b'0' + frame.step_multiplier % 10,
        ]);
        self.layout.status.set(surface, &status, WHITE, BLACK);

        self.layout.feed_label.set(surface, b"F", WHITE, BLACK);
        self.layout.spindle_label.set(surface, b"S", WHITE, BLACK);
        self.layout.feed_gauge.set(surface, frame.feed_override);
        self.layout.spindle_gauge.set(surface, frame.spindle_override);
    }

    fn draw_live(&mut self, surface: &mut impl DisplayOps) {
        self.layout.header.set(surface, b"LIVE", WHITE, BLACK);

        let mut value = [0u8; COORD_WIDTH];
        decode_live(&self.live, &mut value);
        self.layout.live_value.set(surface, &value, WHITE, BLACK);
    }
}

impl Default for RenderMux {
    fn default() -> Self {
        Self::new()
    }
}
