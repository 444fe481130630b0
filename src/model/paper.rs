//! Paper-level configuration: titles, paper format, size tier.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ExamError;
use crate::style::SizeTier;

pub const TITLE_PLACEHOLDER: &str = "Enter School Name (max 60 chars)";
pub const SUBTITLE_PLACEHOLDER: &str = "Enter Subtitle (max 50 chars)";
pub const EXAM_TITLE_PLACEHOLDER: &str = "Enter Exam Title (max 50 chars)";

const MAX_TITLE_CHARS: usize = 60;
const MAX_SUBTITLE_CHARS: usize = 50;
const MAX_EXAM_TITLE_CHARS: usize = 50;

/// Supported physical paper sizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperFormat {
    #[default]
    A4,
    A3,
}

impl PaperFormat {
    /// Portrait (width, height) in millimetres.
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            PaperFormat::A4 => (210.0, 297.0),
            PaperFormat::A3 => (297.0, 420.0),
        }
    }
}

impl FromStr for PaperFormat {
    type Err = ExamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A4" => Ok(PaperFormat::A4),
            "A3" => Ok(PaperFormat::A3),
            other => Err(ExamError::config(format!(
                "Unknown paper format '{}'. Expected A4 or A3",
                other
            ))),
        }
    }
}

impl fmt::Display for PaperFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaperFormat::A4 => f.write_str("A4"),
            PaperFormat::A3 => f.write_str("A3"),
        }
    }
}

/// Everything that shapes a paper apart from its questions.
#[derive(Debug, Clone)]
pub struct PaperConfig {
    pub title: String,
    pub subtitle: String,
    pub exam_title: String,
    pub size: SizeTier,
    pub format: PaperFormat,
    pub show_student_info: bool,
    /// Shown next to "Duration:" on the first page.
    pub duration: String,
    /// Directory holding the exam's TrueType files. `None` uses standard fonts.
    pub font_dir: Option<PathBuf>,
}

impl PaperConfig {
    /// Validate the titles and build a config with default layout options.
    pub fn new(
        title: impl Into<String>,
        subtitle: impl Into<String>,
        exam_title: impl Into<String>,
    ) -> Result<Self, ExamError> {
        let config = Self {
            title: title.into(),
            subtitle: subtitle.into(),
            exam_title: exam_title.into(),
            size: SizeTier::default(),
            format: PaperFormat::default(),
            show_student_info: true,
            duration: "45min".to_string(),
            font_dir: None,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_size(mut self, size: SizeTier) -> Self {
        self.size = size;
        self
    }

    pub fn with_format(mut self, format: PaperFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_student_info(mut self, show: bool) -> Self {
        self.show_student_info = show;
        self
    }

    pub fn with_duration(mut self, duration: impl Into<String>) -> Self {
        self.duration = duration.into();
        self
    }

    pub fn with_font_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.font_dir = Some(dir.into());
        self
    }

    /// Length limits and placeholder checks.
    pub fn validate(&self) -> Result<(), ExamError> {
        if self.title.chars().count() > MAX_TITLE_CHARS {
            return Err(ExamError::config("Title must be 60 characters or less"));
        }
        if self.subtitle.chars().count() > MAX_SUBTITLE_CHARS {
            return Err(ExamError::config("Subtitle must be 50 characters or less"));
        }
        if self.exam_title.chars().count() > MAX_EXAM_TITLE_CHARS {
            return Err(ExamError::config("Exam title must be 50 characters or less"));
        }
        if self.title == TITLE_PLACEHOLDER {
            return Err(ExamError::config("Please enter a school name"));
        }
        if self.subtitle == SUBTITLE_PLACEHOLDER {
            return Err(ExamError::config("Please enter a subtitle"));
        }
        if self.exam_title == EXAM_TITLE_PLACEHOLDER {
            return Err(ExamError::config("Please enter an exam title"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_config() {
        let config = PaperConfig::new("Springfield High", "Class 8", "Unit Test 1").unwrap();
        assert_eq!(config.size, SizeTier::Medium);
        assert_eq!(config.format, PaperFormat::A4);
        assert!(config.show_student_info);
    }

    #[test]
    fn title_length_limits() {
        let long = "x".repeat(61);
        assert!(PaperConfig::new(long, "s", "e").is_err());
        assert!(PaperConfig::new("t", "x".repeat(51), "e").is_err());
        assert!(PaperConfig::new("t", "s", "x".repeat(51)).is_err());
        assert!(PaperConfig::new("x".repeat(60), "x".repeat(50), "x".repeat(50)).is_ok());
    }

    #[test]
    fn placeholders_rejected() {
        let err = PaperConfig::new(TITLE_PLACEHOLDER, "s", "e").unwrap_err();
        assert_eq!(err.to_string(), "Invalid configuration: Please enter a school name");
        assert!(PaperConfig::new("t", SUBTITLE_PLACEHOLDER, "e").is_err());
        assert!(PaperConfig::new("t", "s", EXAM_TITLE_PLACEHOLDER).is_err());
    }

    #[test]
    fn paper_format_parsing() {
        assert_eq!("a3".parse::<PaperFormat>().unwrap(), PaperFormat::A3);
        assert!("letter".parse::<PaperFormat>().is_err());
        assert_eq!(PaperFormat::A4.dimensions(), (210.0, 297.0));
    }
}
