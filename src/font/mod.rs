//! # Font Management
//!
//! Maps the paper's logical font families to either embedded TrueType data or
//! one of the standard PDF fonts.
//!
//! The registry is owned by the [`FontContext`], which is owned by the canvas
//! of a single render pass. Nothing here is global: two passes rendering
//! different sets never share font state.

pub mod metrics;

pub use metrics::StandardFontMetrics;

use std::collections::HashMap;
use std::path::Path;

use crate::error::ExamError;
use crate::style::{BODY_FAMILY, DISPLAY_FAMILY, QUESTION_FAMILY};

/// A font registry that maps font family + weight + style to font data.
#[derive(Clone)]
pub struct FontRegistry {
    fonts: HashMap<FontKey, FontData>,
}

#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct FontKey {
    pub family: String,
    pub weight: u32,
    pub italic: bool,
}

impl FontKey {
    pub fn new(family: &str, weight: u32, italic: bool) -> Self {
        Self {
            family: family.to_string(),
            weight: if weight >= 600 { 700 } else { 400 },
            italic,
        }
    }
}

#[derive(Debug, Clone)]
pub enum FontData {
    /// One of the standard PDF fonts. No embedding needed.
    Standard(StandardFont),
    /// A TrueType font embedded in full.
    Custom {
        data: Vec<u8>,
        metrics: CustomFontMetrics,
    },
}

static FALLBACK_FONT: FontData = FontData::Standard(StandardFont::Helvetica);

/// Parsed metrics from a TrueType/OpenType font via ttf-parser.
#[derive(Debug, Clone)]
pub struct CustomFontMetrics {
    pub units_per_em: u16,
    pub advance_widths: HashMap<char, u16>,
    pub default_advance: u16,
    pub ascender: i16,
    pub descender: i16,
    /// Maps characters to their glyph IDs.
    pub glyph_ids: HashMap<char, u16>,
}

impl CustomFontMetrics {
    /// Get the advance width of a character in points.
    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        let w = self
            .advance_widths
            .get(&ch)
            .copied()
            .unwrap_or(self.default_advance);
        (w as f64 / self.units_per_em as f64) * font_size
    }

    /// Parse metrics from font data using ttf-parser.
    pub fn from_font_data(data: &[u8]) -> Option<Self> {
        let face = ttf_parser::Face::parse(data, 0).ok()?;
        let units_per_em = face.units_per_em();

        let mut advance_widths = HashMap::new();
        let mut glyph_ids = HashMap::new();
        let mut default_advance = 0u16;

        for code in 32u32..=0xFFFF {
            let Some(ch) = char::from_u32(code) else {
                continue;
            };
            if let Some(glyph_id) = face.glyph_index(ch) {
                let advance = face.glyph_hor_advance(glyph_id).unwrap_or(0);
                advance_widths.insert(ch, advance);
                glyph_ids.insert(ch, glyph_id.0);
                if ch == ' ' {
                    default_advance = advance;
                }
            }
        }

        if default_advance == 0 {
            default_advance = units_per_em / 2;
        }

        Some(CustomFontMetrics {
            units_per_em,
            advance_widths,
            default_advance,
            ascender: face.ascender(),
            descender: face.descender(),
            glyph_ids,
        })
    }
}

/// The standard PDF fonts the renderer can fall back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    HelveticaBoldOblique,
    Courier,
    CourierBold,
    CourierOblique,
    CourierBoldOblique,
}

impl StandardFont {
    /// The PDF name for this font.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
            Self::HelveticaOblique => "Helvetica-Oblique",
            Self::HelveticaBoldOblique => "Helvetica-BoldOblique",
            Self::Courier => "Courier",
            Self::CourierBold => "Courier-Bold",
            Self::CourierOblique => "Courier-Oblique",
            Self::CourierBoldOblique => "Courier-BoldOblique",
        }
    }

    /// The Helvetica variant standing in for a missing font of this style.
    pub fn helvetica(weight: u32, italic: bool) -> Self {
        match (weight >= 600, italic) {
            (false, false) => Self::Helvetica,
            (true, false) => Self::HelveticaBold,
            (false, true) => Self::HelveticaOblique,
            (true, true) => Self::HelveticaBoldOblique,
        }
    }
}

/// One TrueType file backing a logical family style.
#[derive(Debug, Clone, Copy)]
pub struct FontFile {
    pub family: &'static str,
    pub weight: u32,
    pub italic: bool,
    pub file_name: &'static str,
}

/// Files looked up in the font directory, one per logical family style.
pub const EXAM_FONT_FILES: &[FontFile] = &[
    FontFile { family: BODY_FAMILY, weight: 400, italic: false, file_name: "NotoSans-Regular.ttf" },
    FontFile { family: BODY_FAMILY, weight: 700, italic: false, file_name: "NotoSans-Bold.ttf" },
    FontFile { family: BODY_FAMILY, weight: 400, italic: true, file_name: "NotoSans-Italic.ttf" },
    FontFile { family: DISPLAY_FAMILY, weight: 700, italic: false, file_name: "StingerFitTrial-Bold.ttf" },
    FontFile { family: QUESTION_FAMILY, weight: 400, italic: false, file_name: "Arial-Unicode.ttf" },
    FontFile { family: QUESTION_FAMILY, weight: 700, italic: false, file_name: "Arial-Unicode-Bold.ttf" },
    FontFile { family: QUESTION_FAMILY, weight: 400, italic: true, file_name: "Arial-Unicode-Italic.ttf" },
];

impl Default for FontRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FontRegistry {
    /// Standard fonts only. Logical families resolve to Helvetica.
    pub fn new() -> Self {
        let mut fonts = HashMap::new();

        let standard_mappings = [
            (("Helvetica", 400, false), StandardFont::Helvetica),
            (("Helvetica", 700, false), StandardFont::HelveticaBold),
            (("Helvetica", 400, true), StandardFont::HelveticaOblique),
            (("Helvetica", 700, true), StandardFont::HelveticaBoldOblique),
            (("Courier", 400, false), StandardFont::Courier),
            (("Courier", 700, false), StandardFont::CourierBold),
            (("Courier", 400, true), StandardFont::CourierOblique),
            (("Courier", 700, true), StandardFont::CourierBoldOblique),
        ];

        for ((family, weight, italic), font) in standard_mappings {
            fonts.insert(FontKey::new(family, weight, italic), FontData::Standard(font));
        }

        Self { fonts }
    }

    /// Load the exam font files from `dir`.
    ///
    /// A file that is missing or unparsable is substituted with the matching
    /// Helvetica style and logged; it never fails the render.
    pub fn with_font_dir(dir: &Path) -> Self {
        let mut registry = Self::new();
        for file in EXAM_FONT_FILES {
            let path = dir.join(file.file_name);
            let loaded = std::fs::read(&path)
                .map_err(|e| ExamError::io(&path, e))
                .and_then(|data| registry.register(file.family, file.weight, file.italic, data));
            match loaded {
                Ok(()) => log::debug!("Loaded font {} from {}", file.family, path.display()),
                Err(e) => {
                    log::warn!(
                        "Font {} unavailable ({}); substituting {}",
                        file.family,
                        e,
                        StandardFont::helvetica(file.weight, file.italic).pdf_name()
                    );
                    registry.substitute(file.family, file.weight, file.italic);
                }
            }
        }
        registry
    }

    /// Look up a font, falling back to Helvetica if not found.
    pub fn resolve(&self, family: &str, weight: u32, italic: bool) -> &FontData {
        let key = FontKey::new(family, weight, italic);
        if let Some(font) = self.fonts.get(&key) {
            return font;
        }

        // Same family, any registered style
        for (w, i) in [(key.weight, false), (400, italic), (400, false)] {
            if let Some(font) = self.fonts.get(&FontKey::new(family, w, i)) {
                return font;
            }
        }

        self.fonts
            .get(&FontKey::new("Helvetica", key.weight, italic))
            .unwrap_or(&FALLBACK_FONT)
    }

    /// Register a custom TrueType font.
    pub fn register(
        &mut self,
        family: &str,
        weight: u32,
        italic: bool,
        data: Vec<u8>,
    ) -> Result<(), ExamError> {
        let metrics = CustomFontMetrics::from_font_data(&data).ok_or_else(|| {
            ExamError::Font(format!("'{}' is not a parsable TrueType font", family))
        })?;
        self.fonts.insert(
            FontKey::new(family, weight, italic),
            FontData::Custom { data, metrics },
        );
        Ok(())
    }

    /// Map a family style to the matching standard font.
    pub fn substitute(&mut self, family: &str, weight: u32, italic: bool) {
        self.fonts.insert(
            FontKey::new(family, weight, italic),
            FontData::Standard(StandardFont::helvetica(weight, italic)),
        );
    }
}

/// Font context used by the canvas and the PDF writer.
/// Provides text measurement with real glyph metrics.
#[derive(Default, Clone)]
pub struct FontContext {
    registry: FontRegistry,
}

impl FontContext {
    pub fn new() -> Self {
        Self {
            registry: FontRegistry::new(),
        }
    }

    pub fn with_registry(registry: FontRegistry) -> Self {
        Self { registry }
    }

    /// Get the advance width of a single character in points.
    pub fn char_width(&self, ch: char, family: &str, weight: u32, italic: bool, font_size: f64) -> f64 {
        match self.registry.resolve(family, weight, italic) {
            FontData::Standard(std_font) => std_font.metrics().char_width(ch, font_size),
            FontData::Custom { metrics, .. } => metrics.char_width(ch, font_size),
        }
    }

    /// Measure the width of a string in points.
    pub fn measure_string(
        &self,
        text: &str,
        family: &str,
        weight: u32,
        italic: bool,
        font_size: f64,
    ) -> f64 {
        match self.registry.resolve(family, weight, italic) {
            FontData::Standard(std_font) => std_font.metrics().measure_string(text, font_size, 0.0),
            FontData::Custom { metrics, .. } => {
                text.chars().map(|ch| metrics.char_width(ch, font_size)).sum()
            }
        }
    }

    /// Resolve a font key to its font data.
    pub fn resolve(&self, family: &str, weight: u32, italic: bool) -> &FontData {
        self.registry.resolve(family, weight, italic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_context_helvetica() {
        let ctx = FontContext::new();
        let w = ctx.char_width(' ', "Helvetica", 400, false, 12.0);
        assert!((w - 3.336).abs() < 0.001);
    }

    #[test]
    fn test_font_context_bold_wider() {
        let ctx = FontContext::new();
        let regular = ctx.char_width('A', "Helvetica", 400, false, 12.0);
        let bold = ctx.char_width('A', "Helvetica", 700, false, 12.0);
        assert!(bold > regular, "Bold A should be wider than regular A");
    }

    #[test]
    fn test_logical_family_falls_back_to_helvetica() {
        let ctx = FontContext::new();
        let w1 = ctx.measure_string("Question", "Helvetica", 400, true, 13.0);
        let w2 = ctx.measure_string("Question", QUESTION_FAMILY, 400, true, 13.0);
        assert!((w1 - w2).abs() < 0.001);
    }

    #[test]
    fn test_missing_font_dir_substitutes_standard_fonts() {
        let registry = FontRegistry::with_font_dir(Path::new("/nonexistent/fonts"));
        match registry.resolve(DISPLAY_FAMILY, 700, false) {
            FontData::Standard(f) => assert_eq!(*f, StandardFont::HelveticaBold),
            FontData::Custom { .. } => panic!("expected a standard substitute"),
        }
    }

    #[test]
    fn test_garbage_font_data_is_rejected() {
        let mut registry = FontRegistry::new();
        let err = registry
            .register(BODY_FAMILY, 400, false, vec![0, 1, 2, 3])
            .unwrap_err();
        assert!(matches!(err, ExamError::Font(_)));
    }

    #[test]
    fn test_weight_snaps() {
        let ctx = FontContext::new();
        let w700 = ctx.char_width('A', "Helvetica", 700, false, 12.0);
        let w800 = ctx.char_width('A', "Helvetica", 800, false, 12.0);
        assert!((w700 - w800).abs() < 0.001);
    }
}
