// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Standard-font metrics for measuring text drawn with the built-in PDF fonts.
//
// Widths are in 1/1000 em, taken from the Adobe core font AFM files for the
// printable ASCII range. Bold faces reuse the regular widths; the difference
// only matters for mask padding, which already has slack.

use pagemark_core::types::StandardFont;

/// Helvetica advance widths for U+0020..=U+007E.
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // space../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0..9
    278, 278, 584, 584, 584, 556, 1015, // :..@
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A..M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N..Z
    278, 278, 278, 469, 556, 333, // [..`
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a..m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n..z
    334, 260, 334, 584, // {..~
];

/// Times-Roman advance widths for U+0020..=U+007E.
const TIMES_ROMAN: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278, // space../
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, // 0..9
    278, 278, 564, 564, 564, 444, 921, // :..@
    722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, // A..M
    722, 722, 556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611, // N..Z
    333, 278, 333, 469, 500, 333, // [..`
    444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, // a..m
    500, 500, 500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444, // n..z
    480, 200, 480, 541, // {..~
];

const COURIER_WIDTH: u16 = 600;

/// Advance width of one character in 1/1000 em.
pub fn glyph_width(font: StandardFont, c: char) -> u16 {
    let table = match font {
        StandardFont::Helvetica | StandardFont::HelveticaBold => &HELVETICA,
        StandardFont::TimesRoman | StandardFont::TimesBold => &TIMES_ROMAN,
        StandardFont::Courier | StandardFont::CourierBold => return COURIER_WIDTH,
    };
    match c as u32 {
        code @ 0x20..=0x7e => table[(code - 0x20) as usize],
        // Outside ASCII: the width of a typical lowercase letter.
        _ => table[(u32::from('n') - 0x20) as usize],
    }
}

/// Width of `text` set at `size` points.
pub fn text_width(font: StandardFont, text: &str, size: f64) -> f64 {
    let units: u32 = text.chars().map(|c| u32::from(glyph_width(font, c))).sum();
    f64::from(units) * size / 1000.0
}
