//! Application-wide constants and compile-time configuration.
//!
//! All matrix geometry, timing parameters, and protocol constants live
//! here so they can be tuned in one place.

// Keypad matrix

/// Number of matrix rows (driven one at a time, active-low).
pub const MATRIX_ROWS: usize = 4;

/// Number of matrix columns (read with pull-ups, active-low).
pub const MATRIX_COLS: usize = 4;

/// Scan ticks a cell level must persist before the debounced state
/// flips. One tick = one scheduling period (nominally 1 ms).
pub const KEY_DEBOUNCE_TICKS: u8 = 5;

// Axis selector / handwheel

/// Milliseconds the raw rotary code must stay unchanged before it is
/// accepted as the new stable position.
pub const ROTARY_DEBOUNCE_MS: u32 = 5;

/// Quadrature edges per mechanical detent of the handwheel.
pub const ENCODER_PULSES_PER_DETENT: i32 = 4;

// Inbound report ring

/// Slots in the host->device report ring. One slot is sacrificed to
/// distinguish full from empty, so usable capacity is one less.
pub const RX_RING_SLOTS: usize = 8;

/// Largest host->device report we buffer (bytes).
pub const RX_ITEM_MAX: usize = 64;

// Device -> host input report

/// Report ID of the pendant's input report.
pub const IN_REPORT_ID: u8 = 0x04;

/// Total input report length including the ID byte.
pub const IN_REPORT_LEN: usize = 6;

/// Maximum wheel detents carried by a single input report (magnitude).
pub const WHEEL_MAX_PER_REPORT: i16 = 7;

// Host -> device feature report / status frame

/// Report ID of the host's feature report chunks.
pub const FEATURE_REPORT_ID: u8 = 0x06;

/// Payload bytes per feature report chunk (excluding the ID byte).
pub const CHUNK_LEN: usize = 7;

/// Total assembled status frame length (bytes).
pub const FRAME_LEN: usize = 37;

/// First two wire bytes of a frame-starting chunk.
pub const FRAME_MARKER: [u8; 2] = [0xFE, 0xFD];

/// The frame's leading u16 read little-endian. Same bytes as
/// [`FRAME_MARKER`], just interpreted as a number.
pub const FRAME_MAGIC: u16 = 0xFDFE;

// Screen timing

/// How long a freshly assembled frame is preferred over the live feed.
pub const FRAME_HOLD_MS: u32 = 700;

/// Minimum period between redraws of an unchanged source.
pub const RENDER_MIN_PERIOD_MS: u32 = 150;

/// An Off axis reading is only shown after it has persisted this long,
/// so the axis letter does not flicker while the selector moves.
pub const AXIS_OFF_SHOW_MS: u32 = 400;

// Override gauge ranges (percent)

pub const FEED_OVR_MIN: u16 = 0;
pub const FEED_OVR_MAX: u16 = 250;
pub const SPINDLE_OVR_MIN: u16 = 50;
pub const SPINDLE_OVR_MAX: u16 = 150;

// USB

/// USB VID/PID of the original pendant, so stock host drivers bind.
pub const USB_VID: u16 = 0x10CE;
pub const USB_PID: u16 = 0xEB70;

/// USB device strings.
pub const USB_MANUFACTURER: &str = "hb04-pendant";
pub const USB_PRODUCT: &str = "CNC Handwheel Pendant";
pub const USB_SERIAL_NUMBER: &str = "000001";

/// USB HID polling interval (ms).
pub const USB_HID_POLL_MS: u8 = 1;

// GPIO pin assignments (Blue Pill / STM32F103C8 defaults)
//
// These are logical names; actual `embassy_stm32::peripherals::*` types
// are selected in `main.rs`.  Adjust for your custom PCB.
//
//   Matrix rows    -> PB5, PB7, PB8, PB9 (open-drain; PB3/PB4 are
//                     JTAG pins on the F1 and stay untouched)
//   Matrix cols    -> PB12..PB15 (pull-up)
//   Rotary pos 1-6 -> PA8, PA9, PA10, PB10, PB11, PB1 (pull-up)
//   Encoder A/B    -> PA0, PA1 (TIM2 CH1/CH2, quadrature mode)
//   Display SPI1   -> PA5 SCK, PA7 MOSI, PA4 CS, PB0 DC, PB6 RST
