//! USB subsystem - presents the pendant as a vendor HID device.
//!
//! One interface, two reports:
//!
//! - Input report 0x04 (device -> host): keys, rotary mode, wheel
//!   motion, check byte. Built by [`outbound::ReportBuilder`].
//! - Feature report 0x06 (host -> device): 7-byte display chunks,
//!   landed in the lock-free [`queue::InboundQueue`] from the class
//!   callback and drained by the main loop.

pub mod outbound;
pub mod queue;

#[cfg(feature = "embedded")]
pub mod hid_device;
