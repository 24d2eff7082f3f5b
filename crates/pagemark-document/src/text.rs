// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text preparation for fonts with narrow glyph coverage.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Replace diacritic-bearing characters with their closest ASCII spelling.
///
/// Letters that do not decompose (Turkish dotless i, ß, ø, ...) are mapped
/// explicitly; everything else is NFD-decomposed and stripped of combining
/// marks. Characters with no ASCII form pass through unchanged.
pub fn transliterate(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            'İ' => out.push('I'),
            'ı' => out.push('i'),
            'ß' => out.push_str("ss"),
            'Æ' => out.push_str("AE"),
            'æ' => out.push_str("ae"),
            'Œ' => out.push_str("OE"),
            'œ' => out.push_str("oe"),
            'Ø' => out.push('O'),
            'ø' => out.push('o'),
            'Ł' => out.push('L'),
            'ł' => out.push('l'),
            'Đ' => out.push('D'),
            'đ' => out.push('d'),
            c if c.is_ascii() => out.push(c),
            c => {
                let base: String = std::iter::once(c).nfd().filter(|m| !is_combining_mark(*m)).collect();
                if !base.is_empty() && base.is_ascii() {
                    out.push_str(&base);
                } else {
                    out.push(c);
                }
            }
        }
    }
    out
}

/// Encode text for a standard font with `/WinAnsiEncoding`. Characters
/// outside the encoding become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{20}'..='\u{7e}' => c as u8,
            '\u{a0}'..='\u{ff}' => c as u32 as u8,
            '€' => 0x80,
            '‚' => 0x82,
            'ƒ' => 0x83,
            '„' => 0x84,
            '…' => 0x85,
            '†' => 0x86,
            '‡' => 0x87,
            'ˆ' => 0x88,
            '‰' => 0x89,
            'Š' => 0x8a,
            '‹' => 0x8b,
            'Œ' => 0x8c,
            'Ž' => 0x8e,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201c}' => 0x93,
            '\u{201d}' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '˜' => 0x98,
            '™' => 0x99,
            'š' => 0x9a,
            '›' => 0x9b,
            'œ' => 0x9c,
            'ž' => 0x9e,
            'Ÿ' => 0x9f,
            '\t' => b' ',
            _ => b'?',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turkish_letters_become_ascii() {
        assert_eq!(transliterate("İĞÜŞÖÇ ığüşöç"), "IGUSOC igusoc");
        assert_eq!(transliterate("Şişli Çarşı"), "Sisli Carsi");
    }

    #[test]
    fn other_accents_are_stripped() {
        assert_eq!(transliterate("Crème brûlée, naïve, Łódź"), "Creme brulee, naive, Lodz");
        assert_eq!(transliterate("Straße"), "Strasse");
    }

    #[test]
    fn unmappable_characters_pass_through() {
        assert_eq!(transliterate("Привет"), "Привет");
        assert_eq!(transliterate("plain ASCII"), "plain ASCII");
    }

    #[test]
    fn win_ansi_encoding() {
        assert_eq!(encode_win_ansi("Hi é"), vec![b'H', b'i', b' ', 0xe9]);
        assert_eq!(encode_win_ansi("€—"), vec![0x80, 0x97]);
        assert_eq!(encode_win_ansi("ı"), vec![b'?']);
    }
}
