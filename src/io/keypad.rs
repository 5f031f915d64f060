//! 4x4 keypad matrix scanner with per-cell debouncing.
//!
//! One row is driven active-low per tick (round-robin); the columns of
//! that row are sampled and debounced with a counter per cell. Only
//! press edges produce key codes; the hardware supports two keys held
//! at once, so up to two codes queue between fetches.

use crate::config::{KEY_DEBOUNCE_TICKS, MATRIX_COLS, MATRIX_ROWS};
use crate::io::hal::MatrixPins;

/// Pendant key codes as they appear on the wire (input report bytes
/// 1 and 2).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Key {
    Goto0 = 0x01,
    StartStop = 0x02,
    Rewind = 0x03,
    ProbeZ = 0x04,
    Macro3 = 0x05,
    Half = 0x06,
    Zero = 0x07,
    SafeZ = 0x08,
    GotoHome = 0x09,
    Macro1 = 0x0A,
    Macro2 = 0x0B,
    Spindle = 0x0C,
    Step = 0x0D,
    Mpg = 0x0E,
    Macro6 = 0x0F,
    Macro7 = 0x10,
    Stop = 0x16,
    Reset = 0x17,
}

impl Key {
    /// Wire code of this key.
    pub const fn code(self) -> u8 {
        self as u8
    }
}

/// Which key sits at each (row, column) cell. Mirrored vertically to
/// match the membrane layout.
pub const KEYMAP: [[Key; MATRIX_COLS]; MATRIX_ROWS] = [
    [Key::StartStop, Key::Zero, Key::Macro1, Key::Stop],
    [Key::Spindle, Key::SafeZ, Key::ProbeZ, Key::Goto0],
    [Key::Macro7, Key::Macro6, Key::Macro3, Key::GotoHome],
    [Key::Macro2, Key::Rewind, Key::Half, Key::Step],
];

/// Matrix scanner state. Call [`tick`](Self::tick) once per
/// scheduling period and [`fetch`](Self::fetch) whenever an outbound
/// report is being built.
pub struct KeypadScanner {
    counters: [[u8; MATRIX_COLS]; MATRIX_ROWS],
    pressed: [[bool; MATRIX_COLS]; MATRIX_ROWS],
    queue: [u8; 2],
    queue_len: usize,
    cur_row: usize,
}

impl KeypadScanner {
    pub const fn new() -> Self {
        Self {
            counters: [[0; MATRIX_COLS]; MATRIX_ROWS],
            pressed: [[false; MATRIX_COLS]; MATRIX_ROWS],
            queue: [0; 2],
            queue_len: 0,
            cur_row: 0,
        }
    }

    /// Drive the current row, sample its columns through the debounce
    /// counters, then advance to the next row. Sweeps run 0..3 so row 0
    /// is sampled on the very first tick.
    pub fn tick(&mut self, pins: &mut impl MatrixPins) {
        let row = self.cur_row;
        pins.drive_row(row);
        // The open-drain row settles well within a GPIO read at these
        // clock rates; no extra delay before sampling.
        for col in 0..MATRIX_COLS {
            let raw_on = pins.col_active(col);
            if self.pressed[row][col] != raw_on {
                if self.counters[row][col] < KEY_DEBOUNCE_TICKS {
                    self.counters[row][col] += 1;
                }
                if self.counters[row][col] >= KEY_DEBOUNCE_TICKS {
                    self.pressed[row][col] = raw_on;
                    self.counters[row][col] = 0;
                    // Press edge only; releases are not reported.
                    if raw_on && self.queue_len < self.queue.len() {
                        self.queue[self.queue_len] = KEYMAP[row][col].code();
                        self.queue_len += 1;
                    }
                }
            } else {
                self.counters[row][col] = 0;
            }
        }

        pins.release_row(row);
        self.cur_row = (row + 1) % MATRIX_ROWS;
    }

    /// Drain the press queue: up to two codes since the last fetch,
    /// zero-filled when fewer were pending.
    pub fn fetch(&mut self) -> (u8, u8) {
        let c1 = if self.queue_len >= 1 { self.queue[0] } else { 0 };
        let c2 = if self.queue_len >= 2 { self.queue[1] } else { 0 };
        self.queue_len = 0;
        (c1, c2)
    }

    /// Debounced state of one cell (held keys read true).
    pub fn is_pressed(&self, row: usize, col: usize) -> bool {
        if row >= MATRIX_ROWS || col >= MATRIX_COLS {
            return false;
        }
        self.pressed[row][col]
    }
}

impl Default for KeypadScanner {
    fn default() -> Self {
        Self::new()
    }
}
