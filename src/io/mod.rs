//! Input subsystem - keypad matrix, axis selector, handwheel.
//!
//! All three scanners are pure state machines over the capability
//! traits in [`hal`], so they run identically against real GPIO/timer
//! peripherals and against test fixtures with synthetic pin levels and
//! synthetic time.
//!
//! ## Components
//!
//! - **Keypad**: 4x4 matrix, one row driven per 1 ms tick, per-cell
//!   counter debouncing, press events queued two deep.
//! - **Rotary**: 6-position axis selector, time-based debounce.
//! - **Encoder**: handwheel detent counter on a free-running
//!   quadrature timer, wrap-safe.

pub mod encoder;
pub mod hal;
pub mod keypad;
pub mod rotary;

pub use encoder::EncoderWheel;
pub use keypad::KeypadScanner;
pub use rotary::{RotaryCode, RotaryDebouncer};
