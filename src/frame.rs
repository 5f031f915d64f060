//! Status frame reassembly and decoding.
//!
//! The host streams its 37-byte status snapshot as 7-byte feature
//! report chunks. A chunk beginning with the `FE FD` marker starts a
//! new accumulation; later chunks append until the frame is full, with
//! any trailing bytes of the final chunk discarded.
//!
//! Frame layout (little-endian):
//! ```text
//! [0..2)   magic (0xFDFE)
//! [2]      day counter
//! [3..27)  six positions, each u16 integer part + u16 fraction part
//!          (fraction MSB = sign), ordered Xw Yw Zw Xm Ym Zm
//! [27..29) feedrate override (percent)
//! [29..31) spindle override (percent)
//! [31..33) feedrate
//! [33..35) spindle speed
//! [35]     step multiplier
//! [36]     machine state
//! ```

use crate::config::{CHUNK_LEN, FRAME_LEN, FRAME_MAGIC, FRAME_MARKER};

/// Accumulates chunks into a full frame.
pub struct FrameAssembler {
    buf: [u8; FRAME_LEN],
    len: usize,
}

impl FrameAssembler {
    pub const fn new() -> Self {
        Self {
            buf: [0; FRAME_LEN],
            len: 0,
        }
    }

    /// Feed one 7-byte chunk. Returns the raw frame when this chunk
    /// completes it; the assembler then resets for the next marker.
    pub fn feed(&mut self, chunk: &[u8; CHUNK_LEN]) -> Option<[u8; FRAME_LEN]> {
        if self.len == 0 {
            // Only a marker-bearing chunk starts an accumulation;
            // anything else is noise between frames.
            if chunk[..2] != FRAME_MARKER {
                return None;
            }
            self.buf[..CHUNK_LEN].copy_from_slice(chunk);
            self.len = CHUNK_LEN;
            return None;
        }

        let room = FRAME_LEN - self.len;
        let take = room.min(CHUNK_LEN);
        self.buf[self.len..self.len + take].copy_from_slice(&chunk[..take]);
        self.len += take;

        if self.len >= FRAME_LEN {
            self.len = 0;
            return Some(self.buf);
        }
        None
    }

    /// Bytes accumulated toward the current frame.
    pub fn fill(&self) -> usize {
        self.len
    }
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self::new()
    }
}

/// One coordinate: unsigned integer part plus fraction part with the
/// sign bit in the fraction's MSB.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Position {
    pub int_part: u16,
    pub frac_part: u16,
}

impl Position {
    pub fn is_negative(self) -> bool {
        self.frac_part & 0x8000 != 0
    }

    /// Fraction digits with the sign bit stripped.
    pub fn frac_abs(self) -> u16 {
        self.frac_part & 0x7FFF
    }
}

/// Decoded 37-byte status snapshot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusFrame {
    pub day: u8,
    /// Work X/Y/Z then machine X/Y/Z.
    pub pos: [Position; 6],
    pub feed_override: u16,
    pub spindle_override: u16,
    pub feedrate: u16,
    pub spindle_speed: u16,
    pub step_multiplier: u8,
    pub machine_state: u8,
}

impl StatusFrame {
    /// Decode a raw frame. `None` when the magic does not match; the
    /// caller then falls back to the live feed.
    pub fn parse(raw: &[u8; FRAME_LEN]) -> Option<Self> {
        let magic = u16::from_le_bytes([raw[0], raw[1]]);
        if magic != FRAME_MAGIC {
            return None;
        }

        let mut pos = [Position::default(); 6];
        for (i, p) in pos.iter_mut().enumerate() {
            let at = 3 + i * 4;
            p.int_part = u16::from_le_bytes([raw[at], raw[at + 1]]);
            p.frac_part = u16::from_le_bytes([raw[at + 2], raw[at + 3]]);
        }

        Some(Self {
            day: raw[2],
            pos,
            feed_override: u16::from_le_bytes([raw[27], raw[28]]),
            spindle_override: u16::from_le_bytes([raw[29], raw[30]]),
            feedrate: u16::from_le_bytes([raw[31], raw[32]]),
            spindle_speed: u16::from_le_bytes([raw[33], raw[34]]),
            step_multiplier: raw[35],
            machine_state: raw[36],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A valid raw frame split into six chunks (the last chunk's
    /// trailing 5 bytes are filler the assembler must discard).
    pub(crate) fn sample_frame_bytes() -> [u8; FRAME_LEN] {
        let mut raw = [0u8; FRAME_LEN];
        raw[0] = 0xFE;
        raw[1] = 0xFD;
        raw[2] = 0x2A; // day
        for i in 0..6 {
            let at = 3 + i * 4;
            let int_part = 100 * (i as u16 + 1);
            let frac_part = 1234 + i as u16;
            raw[at..at + 2].copy_from_slice(&int_part.to_le_bytes());
            raw[at + 2..at + 4].copy_from_slice(&frac_part.to_le_bytes());
        }
        raw[27..29].copy_from_slice(&120u16.to_le_bytes()); // feed ovr
        raw[29..31].copy_from_slice(&90u16.to_le_bytes()); // spindle ovr
        raw[31..33].copy_from_slice(&1500u16.to_le_bytes());
        raw[33..35].copy_from_slice(&8000u16.to_le_bytes());
        raw[35] = 0x03;
        raw[36] = 0x01;
        raw
    }

    pub(crate) fn chunks_of(raw: &[u8; FRAME_LEN]) -> [[u8; CHUNK_LEN]; 6] {
        let mut chunks = [[0u8; CHUNK_LEN]; 6];
        for (i, chunk) in chunks.iter_mut().enumerate() {
            for (j, b) in chunk.iter_mut().enumerate() {
                let at = i * CHUNK_LEN + j;
                *b = if at < FRAME_LEN { raw[at] } else { 0xCC };
            }
        }
        chunks
    }

    #[test]
    fn six_chunks_complete_one_frame() {
        let raw = sample_frame_bytes();
        let mut asm = FrameAssembler::new();

        let mut out = None;
        for chunk in chunks_of(&raw) {
            assert!(out.is_none());
            out = asm.feed(&chunk);
        }
        assert_eq!(out, Some(raw));
        // 42 bytes offered, 37 consumed, filler dropped, ready again.
        assert_eq!(asm.fill(), 0);
    }

    #[test]
    fn noise_without_marker_never_starts() {
        let mut asm = FrameAssembler::new();
        for b in 0..10u8 {
            assert!(asm.feed(&[b, 0xFD, 1, 2, 3, 4, 5]).is_none());
            assert_eq!(asm.fill(), 0);
        }
    }

    #[test]
    fn mid_stream_marker_resumes_after_completion() {
        let raw = sample_frame_bytes();
        let chunks = chunks_of(&raw);
        let mut asm = FrameAssembler::new();

        // Tail chunks without a preceding marker are ignored...
        assert!(asm.feed(&chunks[3]).is_none());
        assert_eq!(asm.fill(), 0);

        // ...then a full marker-led sequence assembles normally.
        for (i, chunk) in chunks.iter().enumerate() {
            let done = asm.feed(chunk);
            assert_eq!(done.is_some(), i == 5);
        }
    }

    #[test]
    fn parse_decodes_all_fields() {
        let raw = sample_frame_bytes();
        let frame = StatusFrame::parse(&raw).expect("valid magic");

        assert_eq!(frame.day, 0x2A);
        assert_eq!(frame.pos[0].int_part, 100);
        assert_eq!(frame.pos[0].frac_part, 1234);
        assert_eq!(frame.pos[5].int_part, 600);
        assert_eq!(frame.feed_override, 120);
        assert_eq!(frame.spindle_override, 90);
        assert_eq!(frame.feedrate, 1500);
        assert_eq!(frame.spindle_speed, 8000);
        assert_eq!(frame.step_multiplier, 0x03);
        assert_eq!(frame.machine_state, 0x01);
    }

    #[test]
    fn bad_magic_is_rejected() {
        let mut raw = sample_frame_bytes();
        raw[0] = 0xFD;
        raw[1] = 0xFE;
        assert!(StatusFrame::parse(&raw).is_none());
    }

    #[test]
    fn sign_bit_lives_in_fraction_msb() {
        let p = Position {
            int_part: 12,
            frac_part: 0x8000 | 345,
        };
        assert!(p.is_negative());
        assert_eq!(p.frac_abs(), 345);

        let q = Position {
            int_part: 12,
            frac_part: 345,
        };
        assert!(!q.is_negative());
    }
}
