//! Display subsystem - decodes what the host wants shown and draws it.
//!
//! Two feeds arrive interleaved over the same feature report: a live
//! 7-segment value (`seg7`) and chunked full status frames
//! (`crate::frame`). The [`render::RenderMux`] decides which one owns
//! the screen and draws through the [`surface::DisplayOps`] trait, so
//! the whole pipeline runs in host tests against a recording surface.
//! The embedded build plugs in the ST7735 panel (`panel`).

pub mod render;
pub mod seg7;
pub mod surface;

#[cfg(feature = "embedded")]
pub mod panel;

pub use render::{RenderMux, Source};
pub use surface::DisplayOps;
