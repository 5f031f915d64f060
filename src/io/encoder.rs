//! Handwheel detent counter.
//!
//! The hardware timer counts every quadrature edge and wraps freely;
//! this wrapper differences snapshots wrap-safely and converts pulses
//! to whole detents, carrying the sub-detent remainder between reads.

use crate::config::ENCODER_PULSES_PER_DETENT;
use crate::io::hal::EncoderCounter;

pub struct EncoderWheel {
    prev_count: u16,
    remainder: i32,
}

impl EncoderWheel {
    /// Snapshot the counter so the first read yields only motion that
    /// happens afterwards.
    pub fn new(counter: &impl EncoderCounter) -> Self {
        Self {
            prev_count: counter.count(),
            remainder: 0,
        }
    }

    /// Signed whole detents since the last read. The remainder that
    /// does not make a full detent carries over to the next call.
    pub fn read_detents(&mut self, counter: &impl EncoderCounter) -> i16 {
        let cur = counter.count();
        let diff = cur.wrapping_sub(self.prev_count) as i16;
        self.prev_count = cur;

        self.remainder += i32::from(diff);
        let detents = self.remainder / ENCODER_PULSES_PER_DETENT;
        self.remainder -= detents * ENCODER_PULSES_PER_DETENT;
        detents as i16
    }

    /// Drop all accumulated motion and re-snapshot the counter.
    ///
    /// Called while the axis selector is Off so that re-selecting an
    /// axis cannot replay a burst of stale detents.
    pub fn resync(&mut self, counter: &impl EncoderCounter) {
        self.prev_count = counter.count();
        self.remainder = 0;
    }

    /// Sub-detent pulses currently carried over.
    pub fn remainder(&self) -> i32 {
        self.remainder
    }
}
