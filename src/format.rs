//! Pure numeric formatting helpers for the screen.
//!
//! Coordinates are rendered into a fixed 10-character form so decimal
//! points align down the screen regardless of magnitude:
//!
//! ```text
//! |  -12.3456|
//! | 1234.0078|
//! |    0.0000|
//! ```
//!
//! Five columns before the point (right-justified digits, sign glued
//! to the first digit), the point, then exactly four zero-padded
//! fraction digits.

/// Width of the aligned coordinate form.
pub const COORD_WIDTH: usize = 10;

/// Columns before the decimal point (sign + up to 4 digits).
const INT_FIELD: usize = 5;

/// Fraction digits after the decimal point.
const FRAC_DIGITS: usize = 4;

/// Format a coordinate given as separate integer and fraction parts,
/// with the sign carried in the fraction's MSB.
///
/// Integer parts that would need more than four digits render as
/// `####` rather than shifting the point.
pub fn format_coord(int_part: u16, frac_part: u16, out: &mut [u8; COORD_WIDTH]) {
    let negative = frac_part & 0x8000 != 0;
    let frac = frac_part & 0x7FFF;
    format_aligned(u32::from(int_part), u32::from(frac), negative, out);
}

/// Shared worker for [`format_coord`] and the live decoder: render
/// `int.frac` (frac already scaled to 4 digits) into the aligned form.
pub(crate) fn format_aligned(
    int_part: u32,
    frac_4digits: u32,
    negative: bool,
    out: &mut [u8; COORD_WIDTH],
) {
    out.fill(b' ');

    // Integer digits, right-justified in the 5-column field.
    let mut digits = [0u8; INT_FIELD];
    let mut n = 0;
    let mut v = int_part;
    loop {
        digits[n] = b'0' + (v % 10) as u8;
        v /= 10;
        n += 1;
        if v == 0 || n == digits.len() {
            break;
        }
    }

    if n > 4 || v != 0 {
        out[INT_FIELD - 4..INT_FIELD].fill(b'#');
    } else {
        let mut at = INT_FIELD;
        for d in &digits[..n] {
            at -= 1;
            out[at] = *d;
        }
        // Sign goes directly before the first digit, no gap.
        if negative && at > 0 {
            out[at - 1] = b'-';
        }
    }

    out[INT_FIELD] = b'.';

    let mut f = frac_4digits % 10_000;
    for i in (0..FRAC_DIGITS).rev() {
        out[INT_FIELD + 1 + i] = b'0' + (f % 10) as u8;
        f /= 10;
    }
}

/// Write `value` into `out` with thousands separators (`8.000` style),
/// returning the byte length used. `out` must hold at least 7 bytes
/// for the full u16 range.
pub fn format_u16_thousands(value: u16, out: &mut [u8]) -> usize {
    let mut digits = [0u8; 5];
    let mut n = 0;
    let mut v = value;
    loop {
        digits[n] = b'0' + (v % 10) as u8;
        v /= 10;
        n += 1;
        if v == 0 {
            break;
        }
    }

    let mut at = 0;
    for i in (0..n).rev() {
        out[at] = digits[i];
        at += 1;
        if i > 0 && i % 3 == 0 {
            out[at] = b'.';
            at += 1;
        }
    }
    at
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(int_part: u16, frac_part: u16) -> std::string::String {
        let mut buf = [0u8; COORD_WIDTH];
        format_coord(int_part, frac_part, &mut buf);
        std::str::from_utf8(&buf).unwrap().into()
    }

    #[test]
    fn decimal_points_align() {
        assert_eq!(coord(0, 0), "    0.0000");
        assert_eq!(coord(12, 3456), "   12.3456");
        assert_eq!(coord(1234, 78), " 1234.0078");
    }

    #[test]
    fn sign_sits_against_first_digit() {
        assert_eq!(coord(12, 0x8000 | 3456), "  -12.3456");
        assert_eq!(coord(1234, 0x8000 | 5), "-1234.0005");
        assert_eq!(coord(0, 0x8000), "   -0.0000");
    }

    #[test]
    fn oversized_integer_renders_hashes() {
        assert_eq!(coord(12345, 0), " ####.0000");
        assert_eq!(coord(u16::MAX, 0x8000 | 1), " ####.0001");
    }

    #[test]
    fn thousands_separators() {
        let mut buf = [0u8; 8];
        let n = format_u16_thousands(999, &mut buf);
        assert_eq!(&buf[..n], b"999");

        let n = format_u16_thousands(8000, &mut buf);
        assert_eq!(&buf[..n], b"8.000");

        let n = format_u16_thousands(65535, &mut buf);
        assert_eq!(&buf[..n], b"65.535");

        let n = format_u16_thousands(0, &mut buf);
        assert_eq!(&buf[..n], b"0");
    }
}
