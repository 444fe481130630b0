//! Structured error types for the exam renderer.
//!
//! Configuration problems surface before any layout work starts. Rendering
//! problems that can be absorbed (font fallback, blank booklet pages,
//! oversized questions) are logged instead and never reach this type.

use std::path::PathBuf;

use thiserror::Error;

/// The unified error type returned by all public API functions.
#[derive(Debug, Error)]
pub enum ExamError {
    /// Invalid paper configuration or question bank content.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// JSON input failed to parse as a question bank.
    #[error("Failed to parse question bank: {source}{}", hint_suffix(.hint))]
    Parse {
        #[source]
        source: serde_json::Error,
        hint: String,
    },

    /// A file could not be read or written.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A font could not be loaded, parsed, or embedded.
    #[error("Font error: {0}")]
    Font(String),
}

fn hint_suffix(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl ExamError {
    pub fn config(msg: impl Into<String>) -> Self {
        ExamError::Config(msg.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ExamError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<serde_json::Error> for ExamError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the question bank schema. Each section needs name, description and questions.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        ExamError::Parse { source: e, hint }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_carries_hint() {
        let err: ExamError = serde_json::from_str::<serde_json::Value>("{\"a\": 1,}")
            .unwrap_err()
            .into();
        let msg = err.to_string();
        assert!(msg.starts_with("Failed to parse question bank"));
        assert!(msg.contains("Hint: Check for trailing commas"));
    }

    #[test]
    fn eof_hint() {
        let err: ExamError = serde_json::from_str::<serde_json::Value>("{\"sections\": [")
            .unwrap_err()
            .into();
        assert!(err.to_string().contains("truncated"));
    }

    #[test]
    fn config_error_display() {
        let err = ExamError::config("Title must be 60 characters or less");
        assert_eq!(
            err.to_string(),
            "Invalid configuration: Title must be 60 characters or less"
        );
    }
}
