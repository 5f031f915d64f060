//! 6-position axis selector with time-based debouncing.
//!
//! The selector grounds at most one of six inputs. A raw code is only
//! taken over as the stable position after it has stayed unchanged for
//! [`ROTARY_DEBOUNCE_MS`]; until then the previous stable code keeps
//! being reported.

use crate::config::ROTARY_DEBOUNCE_MS;
use crate::io::hal::RotaryPins;

/// Stabilized axis-selector position, with the wire codes the host
/// expects in input report byte 3.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum RotaryCode {
    #[default]
    Off = 0x00,
    X = 0x11,
    Y = 0x12,
    Z = 0x13,
    Feed = 0x14,
    Spindle = 0x15,
    Processing = 0x18,
}

impl RotaryCode {
    /// Wire code of this position.
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Axis letter shown on the screen.
    pub const fn letter(self) -> char {
        match self {
            RotaryCode::Off => ' ',
            RotaryCode::X => 'X',
            RotaryCode::Y => 'Y',
            RotaryCode::Z => 'Z',
            RotaryCode::Feed => 'F',
            RotaryCode::Spindle => 'S',
            RotaryCode::Processing => 'A',
        }
    }

    /// Map the six active-low position inputs to a code. First active
    /// input wins; none active means Off.
    pub fn from_pins(pins: &impl RotaryPins) -> Self {
        const POSITIONS: [RotaryCode; 6] = [
            RotaryCode::X,
            RotaryCode::Y,
            RotaryCode::Z,
            RotaryCode::Spindle,
            RotaryCode::Feed,
            RotaryCode::Processing,
        ];
        for (idx, &code) in POSITIONS.iter().enumerate() {
            if pins.position_active(idx) {
                return code;
            }
        }
        RotaryCode::Off
    }
}

/// Debounce state for the selector.
pub struct RotaryDebouncer {
    last_raw: RotaryCode,
    stable: RotaryCode,
    changed_at_ms: u32,
}

impl RotaryDebouncer {
    pub const fn new() -> Self {
        Self {
            last_raw: RotaryCode::Off,
            stable: RotaryCode::Off,
            changed_at_ms: 0,
        }
    }

    /// Sample the pins and return the current stable code.
    pub fn read(&mut self, pins: &impl RotaryPins, now_ms: u32) -> RotaryCode {
        let raw = RotaryCode::from_pins(pins);

        if raw != self.last_raw {
            // Debounce restarts on every raw change.
            self.last_raw = raw;
            self.changed_at_ms = now_ms;
            return self.stable;
        }

        if now_ms.wrapping_sub(self.changed_at_ms) >= ROTARY_DEBOUNCE_MS {
            self.stable = raw;
        }
        self.stable
    }

    /// Last accepted stable code without sampling.
    pub fn stable(&self) -> RotaryCode {
        self.stable
    }
}

impl Default for RotaryDebouncer {
    fn default() -> Self {
        Self::new()
    }
}
