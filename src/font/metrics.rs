//! Glyph advance widths for the standard PDF fonts we register.
//!
//! Widths come from the Adobe Font Metrics files and are expressed in
//! 1/1000 em for the printable ASCII range (0x20..=0x7E). Oblique variants
//! share their upright widths.

use super::StandardFont;

pub struct StandardFontMetrics {
    widths: &'static [u16; 95],
    /// Advance used for characters outside the table.
    default_width: u16,
}

impl StandardFontMetrics {
    /// Advance width of `ch` in points at `font_size`.
    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        let code = ch as u32;
        let w = if (0x20..=0x7E).contains(&code) {
            self.widths[(code - 0x20) as usize]
        } else if ch == '\u{2022}' {
            350
        } else {
            self.default_width
        };
        w as f64 * font_size / 1000.0
    }

    /// Width of `text` in points.
    pub fn measure_string(&self, text: &str, font_size: f64, letter_spacing: f64) -> f64 {
        text.chars()
            .map(|ch| self.char_width(ch, font_size) + letter_spacing)
            .sum()
    }
}

impl StandardFont {
    pub fn metrics(&self) -> StandardFontMetrics {
        match self {
            StandardFont::Helvetica | StandardFont::HelveticaOblique => StandardFontMetrics {
                widths: &HELVETICA,
                default_width: 556,
            },
            StandardFont::HelveticaBold | StandardFont::HelveticaBoldOblique => {
                StandardFontMetrics {
                    widths: &HELVETICA_BOLD,
                    default_width: 556,
                }
            }
            StandardFont::Courier
            | StandardFont::CourierBold
            | StandardFont::CourierOblique
            | StandardFont::CourierBoldOblique => StandardFontMetrics {
                widths: &COURIER,
                default_width: 600,
            },
        }
    }
}

#[rustfmt::skip]
static HELVETICA: [u16; 95] = [
    // space ! " # $ % & ' ( ) * + , - . /
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    // 0-9
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    // : ; < = > ? @
    278, 278, 584, 584, 584, 556, 1015,
    // A-Z
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    // [ \ ] ^ _ `
    278, 278, 278, 469, 556, 333,
    // a-z
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
    // { | } ~
    334, 260, 334, 584,
];

#[rustfmt::skip]
static HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    333, 333, 584, 584, 584, 611, 975,
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    333, 278, 333, 584, 556, 333,
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    389, 280, 389, 584,
];

static COURIER: [u16; 95] = [600; 95];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helvetica_space_width() {
        let m = StandardFont::Helvetica.metrics();
        assert!((m.char_width(' ', 12.0) - 3.336).abs() < 0.001);
    }

    #[test]
    fn table_lines_up_with_ascii() {
        let m = StandardFont::Helvetica.metrics();
        // 'A' is 667, 'i' is 222, '~' is the last entry
        assert!((m.char_width('A', 1000.0) - 667.0).abs() < 1e-9);
        assert!((m.char_width('i', 1000.0) - 222.0).abs() < 1e-9);
        assert!((m.char_width('~', 1000.0) - 584.0).abs() < 1e-9);
    }

    #[test]
    fn courier_is_monospaced() {
        let m = StandardFont::Courier.metrics();
        assert_eq!(m.measure_string("iiii", 10.0, 0.0), m.measure_string("WWWW", 10.0, 0.0));
    }
}
