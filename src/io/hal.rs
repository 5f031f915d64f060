//! Hardware capability traits.
//!
//! The scanners never touch registers directly; they go through these
//! small traits. `main.rs` provides GPIO/timer-backed implementations,
//! the unit tests provide fixture-driven ones.

/// Keypad matrix pins. Rows are open-drain outputs (drive = pull low,
/// release = high impedance), columns are pulled-up inputs.
pub trait MatrixPins {
    /// Pull the given row low so its keys can be read.
    fn drive_row(&mut self, row: usize);

    /// Return the given row to high impedance.
    fn release_row(&mut self, row: usize);

    /// Whether the given column reads active (low) for the driven row.
    fn col_active(&self, col: usize) -> bool;
}

/// The six position inputs of the axis selector, active-low.
pub trait RotaryPins {
    /// Whether position input `idx` (0..6) is active.
    fn position_active(&self, idx: usize) -> bool;
}

/// A free-running hardware quadrature pulse counter.
///
/// The counter wraps naturally; consumers must difference snapshots
/// with wrapping arithmetic.
pub trait EncoderCounter {
    fn count(&self) -> u16;
}
