//! # Style System
//!
//! Size tiers, font specifications and colors for exam papers.
//!
//! A size tier scales every font size and spacing constant together, so a
//! paper rendered at `large` keeps the same proportions as one at `small`.
//! All spacing values are layout units (millimetres); font sizes are points.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ExamError;

/// Logical font family for body text: labels, numbers, headers, footers.
pub const BODY_FAMILY: &str = "Noto";
/// Logical font family for the school title and subtitle.
pub const DISPLAY_FAMILY: &str = "Stinger";
/// Logical font family for question stems, choices and sub-blocks.
pub const QUESTION_FAMILY: &str = "ArialUni";

/// An RGB color with components in 0.0 - 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };
    pub const LIGHT_GREY: Color = Color {
        r: 200.0 / 255.0,
        g: 200.0 / 255.0,
        b: 200.0 / 255.0,
    };

    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// A neutral grey from an 8-bit level.
    pub fn grey(level: u8) -> Self {
        let v = level as f64 / 255.0;
        Self { r: v, g: v, b: v }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Everything needed to measure or draw a run of text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontSpec {
    pub family: &'static str,
    pub bold: bool,
    pub italic: bool,
    /// Size in points.
    pub size: f64,
}

impl FontSpec {
    pub fn regular(family: &'static str, size: f64) -> Self {
        Self {
            family,
            bold: false,
            italic: false,
            size,
        }
    }

    pub fn bold(family: &'static str, size: f64) -> Self {
        Self {
            bold: true,
            ..Self::regular(family, size)
        }
    }

    pub fn italic(family: &'static str, size: f64) -> Self {
        Self {
            italic: true,
            ..Self::regular(family, size)
        }
    }

    pub fn with_bold(self, bold: bool) -> Self {
        Self { bold, ..self }
    }

    /// Registry weight for this font (400 or 700).
    pub fn weight(&self) -> u32 {
        if self.bold {
            700
        } else {
            400
        }
    }

    /// Hashable identity, used as part of memoization keys.
    pub fn key(&self) -> (&'static str, bool, bool, u64) {
        (self.family, self.bold, self.italic, self.size.to_bits())
    }
}

/// Named preset scaling font sizes and spacing together.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeTier {
    Small,
    #[default]
    Medium,
    Large,
}

impl SizeTier {
    pub fn font_sizes(self) -> FontSizes {
        match self {
            SizeTier::Small => FontSizes {
                title: 26.0,
                subtitle: 14.0,
                exam_title: 18.0,
                header: 10.0,
                question: 11.0,
                option: 11.0,
                footer: 8.0,
                section_name: 13.0,
                section_description: 11.0,
                question_number: 9.0,
                option_label: 9.0,
            },
            SizeTier::Medium => FontSizes {
                title: 30.0,
                subtitle: 16.0,
                exam_title: 20.0,
                header: 12.0,
                question: 13.0,
                option: 13.0,
                footer: 10.0,
                section_name: 15.0,
                section_description: 13.0,
                question_number: 11.0,
                option_label: 10.0,
            },
            SizeTier::Large => FontSizes {
                title: 34.0,
                subtitle: 18.0,
                exam_title: 22.0,
                header: 14.0,
                question: 15.0,
                option: 15.0,
                footer: 12.0,
                section_name: 17.0,
                section_description: 15.0,
                question_number: 13.0,
                option_label: 12.0,
            },
        }
    }

    pub fn spacing(self) -> Spacing {
        let (line_height, option_column_gap, before_section, after_section_name, after_description) =
            match self {
                SizeTier::Small => (4.0, 3.0, 4.0, 1.0, 3.0),
                SizeTier::Medium => (5.0, 4.0, 6.0, 2.0, 4.0),
                SizeTier::Large => (6.0, 5.0, 8.0, 3.0, 5.0),
            };
        Spacing {
            line_height,
            question_number_width: 10.0,
            column_spacing: 15.0,
            option_column_gap,
            before_section,
            after_section_name,
            after_description,
        }
    }
}

impl FromStr for SizeTier {
    type Err = ExamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "small" => Ok(SizeTier::Small),
            "medium" => Ok(SizeTier::Medium),
            "large" => Ok(SizeTier::Large),
            other => Err(ExamError::config(format!(
                "Unknown size tier '{}'. Expected small, medium or large",
                other
            ))),
        }
    }
}

impl fmt::Display for SizeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SizeTier::Small => "small",
            SizeTier::Medium => "medium",
            SizeTier::Large => "large",
        };
        f.write_str(name)
    }
}

/// Font sizes in points for every text role on the paper.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontSizes {
    pub title: f64,
    pub subtitle: f64,
    pub exam_title: f64,
    pub header: f64,
    pub question: f64,
    pub option: f64,
    pub footer: f64,
    pub section_name: f64,
    pub section_description: f64,
    pub question_number: f64,
    pub option_label: f64,
}

/// Spacing constants in layout units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spacing {
    /// Height of one wrapped text line.
    pub line_height: f64,
    /// Gutter holding the right-aligned question number.
    pub question_number_width: f64,
    /// Subtracted from half the page width to get the column width.
    pub column_spacing: f64,
    /// Horizontal gap between two paired choices.
    pub option_column_gap: f64,
    pub before_section: f64,
    pub after_section_name: f64,
    pub after_description: f64,
}
