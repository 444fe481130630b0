//! # Text Layout
//!
//! Greedy word wrapping and the memoized line-count model the estimator
//! relies on.
//!
//! The same [`wrap_lines`] routine backs both measurement and drawing, so a
//! height computed here is exactly the height the canvas consumes when it
//! draws the same string at the same width and font.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::style::FontSpec;

/// Width measurement for a string in a given font, in layout units.
pub trait TextMeasure {
    fn measure_width(&self, text: &str, font: &FontSpec) -> f64;
}

/// Split `text` into lines no wider than `max_width`.
///
/// Words are separated on whitespace and re-joined with single spaces. A word
/// wider than `max_width` stays whole on its own line; words are never broken.
/// Empty text yields one empty line.
pub fn wrap_lines(text: &str, max_width: f64, measure: impl Fn(&str) -> f64) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }
        let candidate = format!("{} {}", current, word);
        if measure(&candidate) > max_width {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        } else {
            current = candidate;
        }
    }

    lines.push(current);
    lines
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MetricsKey {
    /// Address of the measurer, so two measurers never share an entry.
    measurer: usize,
    text: String,
    width_bits: u64,
    font: (&'static str, bool, bool, u64),
}

/// Line-count and height model with a per-pass memo.
///
/// The cache key is the full argument tuple, measurer included, so a cached
/// answer is always the answer a fresh computation would give.
pub struct TextMetrics {
    line_height: f64,
    cache: RefCell<HashMap<MetricsKey, usize>>,
}

impl TextMetrics {
    pub fn new(line_height: f64) -> Self {
        Self {
            line_height,
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn line_height(&self) -> f64 {
        self.line_height
    }

    /// Number of wrapped lines (at least one).
    pub fn line_count<M: TextMeasure + ?Sized>(
        &self,
        measurer: &M,
        text: &str,
        max_width: f64,
        font: &FontSpec,
    ) -> usize {
        let key = MetricsKey {
            measurer: measurer as *const M as *const () as usize,
            text: text.to_string(),
            width_bits: max_width.to_bits(),
            font: font.key(),
        };
        if let Some(&count) = self.cache.borrow().get(&key) {
            return count;
        }
        let count = wrap_lines(text, max_width, |s| measurer.measure_width(s, font)).len();
        self.cache.borrow_mut().insert(key, count);
        count
    }

    /// `line_count × line_height`.
    pub fn height<M: TextMeasure + ?Sized>(
        &self,
        measurer: &M,
        text: &str,
        max_width: f64,
        font: &FontSpec,
    ) -> f64 {
        self.line_count(measurer, text, max_width, font) as f64 * self.line_height
    }

    /// Number of memoized entries.
    pub fn cached_entries(&self) -> usize {
        self.cache.borrow().len()
    }
}
