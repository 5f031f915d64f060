//! CNC handwheel pendant firmware library.
//!
//! Everything that does not touch hardware registers lives here and is
//! testable on the host: input debouncing and scanning (`io`), the
//! inbound/outbound USB report plumbing (`usb`), status frame
//! reassembly (`frame`), and the display pipeline (`screen`).
//!
//! `cargo test --lib` runs the host suite. The embedded binary in
//! `main.rs` (feature `embedded`) wires these parts to the STM32F103
//! peripherals and the Embassy runtime.

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod format;
pub mod frame;
pub mod io;
pub mod screen;
pub mod usb;
