//! Base-14 font handling: family/variant resolution, advance widths and
//! WinAnsi encoding

/// Font family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FontFamily {
    #[default]
    Helvetica,
    Times,
}

/// Font weight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FontWeight {
    #[default]
    Regular,
    Bold,
}

/// Font style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

/// One of the standard PDF Type1 fonts every viewer ships
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    HelveticaBoldOblique,
    TimesRoman,
    TimesBold,
    TimesItalic,
    TimesBoldItalic,
}

impl FontFamily {
    /// Get the concrete font for the specified weight and style
    pub fn variant(self, weight: FontWeight, style: FontStyle) -> StandardFont {
        match (self, weight, style) {
            (FontFamily::Helvetica, FontWeight::Regular, FontStyle::Normal) => {
                StandardFont::Helvetica
            }
            (FontFamily::Helvetica, FontWeight::Bold, FontStyle::Normal) => {
                StandardFont::HelveticaBold
            }
            (FontFamily::Helvetica, FontWeight::Regular, FontStyle::Italic) => {
                StandardFont::HelveticaOblique
            }
            (FontFamily::Helvetica, FontWeight::Bold, FontStyle::Italic) => {
                StandardFont::HelveticaBoldOblique
            }
            (FontFamily::Times, FontWeight::Regular, FontStyle::Normal) => StandardFont::TimesRoman,
            (FontFamily::Times, FontWeight::Bold, FontStyle::Normal) => StandardFont::TimesBold,
            (FontFamily::Times, FontWeight::Regular, FontStyle::Italic) => StandardFont::TimesItalic,
            (FontFamily::Times, FontWeight::Bold, FontStyle::Italic) => {
                StandardFont::TimesBoldItalic
            }
        }
    }
}

impl StandardFont {
    /// All fonts, in resource order
    pub const ALL: [StandardFont; 8] = [
        StandardFont::Helvetica,
        StandardFont::HelveticaBold,
        StandardFont::HelveticaOblique,
        StandardFont::HelveticaBoldOblique,
        StandardFont::TimesRoman,
        StandardFont::TimesBold,
        StandardFont::TimesItalic,
        StandardFont::TimesBoldItalic,
    ];

    /// PostScript name used as /BaseFont
    pub fn base_font_name(self) -> &'static str {
        match self {
            StandardFont::Helvetica => "Helvetica",
            StandardFont::HelveticaBold => "Helvetica-Bold",
            StandardFont::HelveticaOblique => "Helvetica-Oblique",
            StandardFont::HelveticaBoldOblique => "Helvetica-BoldOblique",
            StandardFont::TimesRoman => "Times-Roman",
            StandardFont::TimesBold => "Times-Bold",
            StandardFont::TimesItalic => "Times-Italic",
            StandardFont::TimesBoldItalic => "Times-BoldItalic",
        }
    }

    pub fn family(self) -> FontFamily {
        match self {
            StandardFont::Helvetica
            | StandardFont::HelveticaBold
            | StandardFont::HelveticaOblique
            | StandardFont::HelveticaBoldOblique => FontFamily::Helvetica,
            _ => FontFamily::Times,
        }
    }

    pub fn weight(self) -> FontWeight {
        match self {
            StandardFont::HelveticaBold
            | StandardFont::HelveticaBoldOblique
            | StandardFont::TimesBold
            | StandardFont::TimesBoldItalic => FontWeight::Bold,
            _ => FontWeight::Regular,
        }
    }

    pub fn style(self) -> FontStyle {
        match self {
            StandardFont::HelveticaOblique
            | StandardFont::HelveticaBoldOblique
            | StandardFont::TimesItalic
            | StandardFont::TimesBoldItalic => FontStyle::Italic,
            _ => FontStyle::Normal,
        }
    }

    /// Advance widths for printable ASCII (0x20..=0x7E), in 1/1000 em.
    ///
    /// Oblique Helvetica shares the upright metrics exactly. The Times italic
    /// cuts are approximated by their upright counterparts.
    fn ascii_widths(self) -> &'static [u16; 95] {
        match (self.family(), self.weight()) {
            (FontFamily::Helvetica, FontWeight::Regular) => &HELVETICA_WIDTHS,
            (FontFamily::Helvetica, FontWeight::Bold) => &HELVETICA_BOLD_WIDTHS,
            (FontFamily::Times, FontWeight::Regular) => &TIMES_ROMAN_WIDTHS,
            (FontFamily::Times, FontWeight::Bold) => &TIMES_BOLD_WIDTHS,
        }
    }

    /// Glyph advance for a character in 1/1000 em
    pub fn glyph_width(self, c: char) -> u16 {
        let code = c as u32;
        if (0x20..=0x7E).contains(&code) {
            return self.ascii_widths()[(code - 0x20) as usize];
        }
        let helvetica = self.family() == FontFamily::Helvetica;
        match c {
            '\u{00A9}' | '\u{00AE}' => {
                if helvetica {
                    737
                } else {
                    760
                }
            }
            '\u{2014}' | '\u{2030}' => 1000,
            '\u{2026}' => 1000,
            '\u{2013}' => {
                if helvetica {
                    556
                } else {
                    500
                }
            }
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{2039}' | '\u{203A}' => {
                if helvetica {
                    222
                } else {
                    333
                }
            }
            _ => match encode_char(c) {
                Some(_) => {
                    if helvetica {
                        556
                    } else {
                        500
                    }
                }
                None => self.glyph_width('?'),
            },
        }
    }

    /// Calculate text width in points
    pub fn text_width_points(self, text: &str, font_size: f64) -> f64 {
        let units: u32 = text.chars().map(|c| self.glyph_width(c) as u32).sum();
        units as f64 * font_size / 1000.0
    }

    /// Ascender in 1/1000 em
    pub fn ascender(self) -> i16 {
        match self.family() {
            FontFamily::Helvetica => 718,
            FontFamily::Times => 683,
        }
    }

    /// Descender in 1/1000 em
    pub fn descender(self) -> i16 {
        match self.family() {
            FontFamily::Helvetica => -207,
            FontFamily::Times => -217,
        }
    }

    /// Replace characters the WinAnsi encoding cannot represent with `?`
    pub fn sanitize(text: &str) -> String {
        text.chars()
            .map(|c| if encode_char(c).is_some() { c } else { '?' })
            .collect()
    }

    /// Encode text as WinAnsi bytes
    pub fn encode_win_ansi(text: &str) -> Vec<u8> {
        text.chars().map(|c| encode_char(c).unwrap_or(b'?')).collect()
    }

    /// Encode text as a PDF hex string (e.g., `<48656C6C6F>`)
    pub fn encode_text_hex(text: &str) -> String {
        let mut hex = String::with_capacity(text.len() * 2 + 2);
        hex.push('<');
        for byte in Self::encode_win_ansi(text) {
            hex.push_str(&format!("{byte:02X}"));
        }
        hex.push('>');
        hex
    }
}

/// Map a character to its WinAnsiEncoding code
fn encode_char(c: char) -> Option<u8> {
    let code = c as u32;
    match code {
        0x20..=0x7E | 0xA0..=0xFF => Some(code as u8),
        _ => {
            let mapped = match c {
                '\u{20AC}' => 0x80,
                '\u{201A}' => 0x82,
                '\u{0192}' => 0x83,
                '\u{201E}' => 0x84,
                '\u{2026}' => 0x85,
                '\u{2020}' => 0x86,
                '\u{2021}' => 0x87,
                '\u{02C6}' => 0x88,
                '\u{2030}' => 0x89,
                '\u{0160}' => 0x8A,
                '\u{2039}' => 0x8B,
                '\u{0152}' => 0x8C,
                '\u{017D}' => 0x8E,
                '\u{2018}' => 0x91,
                '\u{2019}' => 0x92,
                '\u{201C}' => 0x93,
                '\u{201D}' => 0x94,
                '\u{2022}' => 0x95,
                '\u{2013}' => 0x96,
                '\u{2014}' => 0x97,
                '\u{02DC}' => 0x98,
                '\u{2122}' => 0x99,
                '\u{0161}' => 0x9A,
                '\u{203A}' => 0x9B,
                '\u{0153}' => 0x9C,
                '\u{017E}' => 0x9E,
                '\u{0178}' => 0x9F,
                _ => return None,
            };
            Some(mapped)
        }
    }
}

#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

#[rustfmt::skip]
const TIMES_ROMAN_WIDTHS: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278, 564, 564, 564, 444,
    921, 722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722,
    556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611, 333, 278, 333, 469, 500,
    333, 444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, 500, 500,
    500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541,
];

#[rustfmt::skip]
const TIMES_BOLD_WIDTHS: [u16; 95] = [
    250, 333, 555, 500, 500, 1000, 833, 278, 333, 333, 500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 570, 570, 570, 500,
    930, 722, 667, 722, 722, 667, 611, 778, 778, 389, 500, 778, 667, 944, 722, 778,
    611, 778, 722, 556, 667, 722, 722, 1000, 722, 722, 667, 333, 278, 333, 581, 500,
    333, 500, 556, 444, 556, 444, 333, 500, 556, 278, 333, 556, 278, 833, 556, 500,
    556, 556, 444, 389, 333, 556, 500, 722, 500, 500, 444, 394, 220, 394, 520,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_resolution() {
        assert_eq!(
            FontFamily::Helvetica.variant(FontWeight::Bold, FontStyle::Normal),
            StandardFont::HelveticaBold
        );
        assert_eq!(
            FontFamily::Times.variant(FontWeight::Bold, FontStyle::Italic),
            StandardFont::TimesBoldItalic
        );
        assert_eq!(
            FontFamily::Times.variant(FontWeight::Regular, FontStyle::Normal),
            StandardFont::TimesRoman
        );
    }

    #[test]
    fn test_variant_round_trip() {
        for font in StandardFont::ALL {
            assert_eq!(font.family().variant(font.weight(), font.style()), font);
        }
    }

    #[test]
    fn test_glyph_widths() {
        assert_eq!(StandardFont::Helvetica.glyph_width(' '), 278);
        assert_eq!(StandardFont::Helvetica.glyph_width('A'), 667);
        assert_eq!(StandardFont::HelveticaBold.glyph_width('b'), 611);
        assert_eq!(StandardFont::TimesRoman.glyph_width('m'), 778);
        assert_eq!(StandardFont::TimesBold.glyph_width('W'), 1000);
        assert_eq!(StandardFont::Helvetica.glyph_width('~'), 584);
    }

    #[test]
    fn test_text_width_points() {
        // "Hi" = 722 + 222 = 944 units -> 9.44pt at 10pt
        let width = StandardFont::Helvetica.text_width_points("Hi", 10.0);
        assert!((width - 9.44).abs() < 1e-9);
    }

    #[test]
    fn test_unsupported_chars_measure_as_question_mark() {
        let font = StandardFont::Helvetica;
        assert_eq!(font.glyph_width('\u{0E01}'), font.glyph_width('?'));
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(StandardFont::sanitize("Caf\u{00E9} \u{4E2D}"), "Caf\u{00E9} ?");
    }

    #[test]
    fn test_encode_win_ansi() {
        assert_eq!(StandardFont::encode_win_ansi("A\u{00AB}\u{2014}"), vec![0x41, 0xAB, 0x97]);
    }

    #[test]
    fn test_encode_text_hex() {
        assert_eq!(StandardFont::encode_text_hex("Hi!"), "<486921>");
        assert_eq!(StandardFont::encode_text_hex(""), "<>");
    }
}
