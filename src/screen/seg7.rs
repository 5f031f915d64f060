//! 7-segment live payload decoding.
//!
//! Outside of full status frames the host drives the pendant like the
//! original's LCD: a 7-byte payload whose bytes 1..=6 are 7-segment
//! digit codes, bit 7 flagging a decimal point after that digit and
//! code 0x40 (just the middle bar) meaning minus.

use crate::config::CHUNK_LEN;
use crate::format::{format_aligned, COORD_WIDTH};

/// Map one 7-segment code (bit 7 masked off) to a glyph. Codes that
/// are not a digit or minus render blank.
pub fn seg7_to_char(code: u8) -> char {
    match code & 0x7F {
        0x3F => '0',
        0x06 => '1',
        0x5B => '2',
        0x4F => '3',
        0x66 => '4',
        0x6D => '5',
        0x7D => '6',
        0x07 => '7',
        0x7F => '8',
        0x6F => '9',
        0x40 => '-',
        _ => ' ',
    }
}

/// Encode a glyph back to its segment code (tests and host tooling).
pub fn char_to_seg7(c: char) -> u8 {
    match c {
        '0' => 0x3F,
        '1' => 0x06,
        '2' => 0x5B,
        '3' => 0x4F,
        '4' => 0x66,
        '5' => 0x6D,
        '6' => 0x7D,
        '7' => 0x07,
        '8' => 0x7F,
        '9' => 0x6F,
        '-' => 0x40,
        _ => 0x00,
    }
}

/// Decode a live payload into the aligned 10-character coordinate
/// form shared with the frame renderer.
///
/// A minus code before the first digit sets the sign; blank digits are
/// skipped; the decimal-point flag splits integer from fraction. With
/// no point flag the value is integral. Fraction digits are taken
/// left-aligned and zero-padded to four places.
pub fn decode_live(payload: &[u8; CHUNK_LEN], out: &mut [u8; COORD_WIDTH]) {
    let mut negative = false;
    let mut int_part: u32 = 0;
    let mut frac: u32 = 0;
    let mut frac_len: u32 = 0;
    let mut in_fraction = false;
    let mut saw_digit = false;

    for &b in &payload[1..] {
        let c = seg7_to_char(b);
        match c {
            '-' if !saw_digit => negative = true,
            '0'..='9' => {
                saw_digit = true;
                let digit = u32::from(c as u8 - b'0');
                if in_fraction {
                    if frac_len < 4 {
                        frac = frac * 10 + digit;
                        frac_len += 1;
                    }
                } else {
                    int_part = int_part * 10 + digit;
                }
                if b & 0x80 != 0 {
                    in_fraction = true;
                }
            }
            _ => {}
        }
    }

    // Left-align the fraction: "45" means ".4500".
    while frac_len < 4 {
        frac *= 10;
        frac_len += 1;
    }

    format_aligned(int_part, frac, negative, out);
}
