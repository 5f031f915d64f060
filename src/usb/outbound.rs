//! Outbound input-report builder.
//!
//! Coalesces handwheel motion into rate-limited 6-byte reports. Motion
//! accumulates while the transport is busy and is paid out at most
//! [`WHEEL_MAX_PER_REPORT`] detents per report, so nothing is lost to
//! a slow host - except while the axis selector is Off, where motion
//! is discarded by policy. Key presses bank the same way: codes handed
//! in while the transport is busy ride along in the next report that
//! goes out, Off or not.
//!
//! Report layout (fixed offsets):
//! ```text
//! [0] report ID (0x04)
//! [1] first key code or 0
//! [2] second key code or 0
//! [3] rotary mode code
//! [4] signed wheel detents for this report
//! [5] check byte: day ^ byte[1]
//! ```

use crate::config::{IN_REPORT_ID, IN_REPORT_LEN, WHEEL_MAX_PER_REPORT};
use crate::io::rotary::RotaryCode;

/// Why a report could not be handed to the transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SendError {
    /// The previous report is still in flight. Not an error, a
    /// deferral: retry next tick.
    Busy,
}

/// Where finished reports go. The embedded build adapts the USB HID
/// writer; tests record.
pub trait ReportSink {
    /// Whether the transport can take a report right now.
    fn ready(&self) -> bool;

    /// Hand over one report. Must not block.
    fn send(&mut self, report: &[u8; IN_REPORT_LEN]) -> Result<(), SendError>;
}

/// Accumulates wheel motion and key presses between sends.
pub struct ReportBuilder {
    pending: i16,
    keys: [u8; 2],
    day: u8,
}

impl ReportBuilder {
    pub const fn new() -> Self {
        Self {
            pending: 0,
            keys: [0; 2],
            day: 0,
        }
    }

    /// Store the host-supplied day value used in the check byte.
    pub fn set_day(&mut self, day: u8) {
        self.day = day;
    }

    /// Fold newly observed detents into the pending accumulator,
    /// saturating at the i16 range.
    pub fn add_motion(&mut self, detents: i16) {
        self.pending = self.pending.saturating_add(detents);
    }

    /// Detents not yet delivered to the host.
    pub fn pending(&self) -> i16 {
        self.pending
    }

    /// Bank freshly fetched key codes until a report carries them. The
    /// wire has two key slots; a press arriving while both are taken is
    /// dropped, matching the scanner queue depth.
    fn bank_keys(&mut self, keys: (u8, u8)) {
        for code in [keys.0, keys.1] {
            if code == 0 {
                continue;
            }
            if self.keys[0] == 0 {
                self.keys[0] = code;
            } else if self.keys[1] == 0 {
                self.keys[1] = code;
            }
        }
    }

    /// Try to emit one report. Returns `true` when a report was handed
    /// to the transport.
    ///
    /// Nothing happens when there is neither motion nor a key to
    /// report; while the transport is busy both pending motion and
    /// banked keys are preserved. With the selector Off, pending motion
    /// is flushed, but banked key presses still go out (with a zero
    /// wheel byte and the Off mode code).
    pub fn tick(
        &mut self,
        keys: (u8, u8),
        rotary: RotaryCode,
        sink: &mut impl ReportSink,
    ) -> bool {
        self.bank_keys(keys);
        let (btn1, btn2) = (self.keys[0], self.keys[1]);

        if rotary == RotaryCode::Off {
            self.pending = 0;
        }

        if self.pending == 0 && btn1 == 0 && btn2 == 0 {
            return false;
        }

        if !sink.ready() {
            return false;
        }

        let wheel = self.pending.clamp(-WHEEL_MAX_PER_REPORT, WHEEL_MAX_PER_REPORT);
        let report = build_report(btn1, btn2, rotary, wheel as i8, self.day);

        match sink.send(&report) {
            Ok(()) => {
                // Only what was actually sent leaves the builder.
                self.pending -= wheel;
                self.keys = [0; 2];
                true
            }
            Err(SendError::Busy) => false,
        }
    }
}

impl Default for ReportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Assemble the fixed 6-byte input report.
pub fn build_report(
    btn1: u8,
    btn2: u8,
    rotary: RotaryCode,
    wheel: i8,
    day: u8,
) -> [u8; IN_REPORT_LEN] {
    [
        IN_REPORT_ID,
        btn1,
        btn2,
        rotary.code(),
        wheel as u8,
        day ^ btn1,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeSink {
        ready: bool,
        accept: bool,
        sent: std::vec::Vec<[u8; IN_REPORT_LEN]>,
    }

    impl FakeSink {
        fn new() -> Self {
            Self {
                ready: true,
                accept: true,
                sent: std::vec::Vec::new(),
            }
        }
    }

    impl ReportSink for FakeSink {
        fn ready(&self) -> bool {
            self.ready
        }

        fn send(&mut self, report: &[u8; IN_REPORT_LEN]) -> Result<(), SendError> {
            if !self.accept {
                return Err(SendError::Busy);
            }
            self.sent.push(*report);
            Ok(())
        }
    }

    #[test]
    fn motion_drains_in_capped_reports() {
        let mut b = ReportBuilder::new();
        let mut sink = FakeSink::new();
        b.add_motion(17);

        let mut sends = 0;
        while b.tick((0, 0), RotaryCode::X, &mut sink) {
            sends += 1;
        }
        // ceil(17 / 7) = 3 reports: 7 + 7 + 3.
        assert_eq!(sends, 3);
        assert_eq!(b.pending(), 0);
        let wheels: std::vec::Vec<i8> = sink.sent.iter().map(|r| r[4] as i8).collect();
        assert_eq!(wheels, [7, 7, 3]);
    }

    #[test]
    fn negative_motion_keeps_its_sign() {
        let mut b = ReportBuilder::new();
        let mut sink = FakeSink::new();
        b.add_motion(-9);

        assert!(b.tick((0, 0), RotaryCode::Z, &mut sink));
        assert!(b.tick((0, 0), RotaryCode::Z, &mut sink));
        assert!(!b.tick((0, 0), RotaryCode::Z, &mut sink));
        let wheels: std::vec::Vec<i8> = sink.sent.iter().map(|r| r[4] as i8).collect();
        assert_eq!(wheels, [-7, -2]);
    }

    #[test]
    fn busy_transport_preserves_pending() {
        let mut b = ReportBuilder::new();
        let mut sink = FakeSink::new();
        sink.ready = false;
        b.add_motion(5);

        for _ in 0..10 {
            assert!(!b.tick((0, 0), RotaryCode::Y, &mut sink));
        }
        assert_eq!(b.pending(), 5);

        sink.ready = true;
        assert!(b.tick((0, 0), RotaryCode::Y, &mut sink));
        assert_eq!(b.pending(), 0);
    }

    #[test]
    fn rejected_send_preserves_pending() {
        let mut b = ReportBuilder::new();
        let mut sink = FakeSink::new();
        sink.accept = false;
        b.add_motion(3);

        assert!(!b.tick((0, 0), RotaryCode::X, &mut sink));
        assert_eq!(b.pending(), 3);
    }

    #[test]
    fn off_selector_discards_motion() {
        let mut b = ReportBuilder::new();
        let mut sink = FakeSink::new();
        b.add_motion(12);

        assert!(!b.tick((0, 0), RotaryCode::Off, &mut sink));
        assert_eq!(b.pending(), 0);
        assert!(sink.sent.is_empty());
    }

    #[test]
    fn idle_builder_does_nothing() {
        let mut b = ReportBuilder::new();
        let mut sink = FakeSink::new();
        assert!(!b.tick((0, 0), RotaryCode::X, &mut sink));
        assert!(sink.sent.is_empty());
    }

    #[test]
    fn key_press_sends_even_without_motion() {
        let mut b = ReportBuilder::new();
        let mut sink = FakeSink::new();
        b.set_day(0x2A);

        assert!(b.tick((0x07, 0x0D), RotaryCode::Spindle, &mut sink));
        let r = &sink.sent[0];
        assert_eq!(r, &[0x04, 0x07, 0x0D, 0x15, 0x00, 0x2A ^ 0x07]);
    }

    #[test]
    fn key_press_survives_a_busy_transport() {
        let mut b = ReportBuilder::new();
        let mut sink = FakeSink::new();
        sink.ready = false;

        // The scanner queue is drained every tick, so the press is
        // handed over exactly once while the transport is busy.
        assert!(!b.tick((0x07, 0), RotaryCode::X, &mut sink));
        assert!(!b.tick((0, 0), RotaryCode::X, &mut sink));

        sink.ready = true;
        assert!(b.tick((0, 0), RotaryCode::X, &mut sink));
        assert_eq!(sink.sent[0][1], 0x07);

        // Delivered once, not re-sent.
        assert!(!b.tick((0, 0), RotaryCode::X, &mut sink));
        assert_eq!(sink.sent.len(), 1);
    }

    #[test]
    fn rejected_send_keeps_keys_banked() {
        let mut b = ReportBuilder::new();
        let mut sink = FakeSink::new();
        sink.accept = false;

        assert!(!b.tick((0x0A, 0), RotaryCode::Y, &mut sink));

        sink.accept = true;
        assert!(b.tick((0, 0), RotaryCode::Y, &mut sink));
        assert_eq!(sink.sent[0][1], 0x0A);
    }

    #[test]
    fn key_press_reaches_host_while_selector_is_off() {
        let mut b = ReportBuilder::new();
        let mut sink = FakeSink::new();
        b.add_motion(6);

        assert!(b.tick((0x16, 0), RotaryCode::Off, &mut sink));
        let r = &sink.sent[0];
        assert_eq!(r[1], 0x16);
        assert_eq!(r[3], 0x00);
        // The motion was discarded, not sent.
        assert_eq!(r[4], 0);
        assert_eq!(b.pending(), 0);
    }

    #[test]
    fn third_banked_press_is_dropped() {
        let mut b = ReportBuilder::new();
        let mut sink = FakeSink::new();
        sink.ready = false;

        b.tick((0x01, 0x02), RotaryCode::Z, &mut sink);
        b.tick((0x03, 0), RotaryCode::Z, &mut sink);

        sink.ready = true;
        assert!(b.tick((0, 0), RotaryCode::Z, &mut sink));
        assert_eq!(sink.sent[0][1], 0x01);
        assert_eq!(sink.sent[0][2], 0x02);
    }

    #[test]
    fn accumulator_saturates_at_i16_range() {
        let mut b = ReportBuilder::new();
        b.add_motion(i16::MAX);
        b.add_motion(100);
        assert_eq!(b.pending(), i16::MAX);

        let mut c = ReportBuilder::new();
        c.add_motion(i16::MIN);
        c.add_motion(-100);
        assert_eq!(c.pending(), i16::MIN);
    }

    #[test]
    fn check_byte_is_day_xor_first_button() {
        let r = build_report(0x0A, 0x00, RotaryCode::Feed, -3, 0x55);
        assert_eq!(r[0], 0x04);
        assert_eq!(r[3], 0x14);
        assert_eq!(r[4], (-3i8) as u8);
        assert_eq!(r[5], 0x55 ^ 0x0A);
    }
}
