//! # Page-Aware Flow Layout
//!
//! The heart of the exam renderer: measure a question completely, decide
//! where it goes, and only then draw it.
//!
//! ## Why measure first
//!
//! A renderer that starts drawing a question and bails halfway when it runs
//! out of column has to undo what it drew. Undo logic is where printed papers
//! end up with an option list split across a page turn, or a section title
//! stranded at the bottom of a column. This engine never draws speculatively:
//!
//! 1. Estimate the full height of the next placement unit (a question, or a
//!    section header together with its first question)
//! 2. Ask the [`placement::PlacementEngine`] where that height fits: here,
//!    at the top of the right column, or on a fresh page
//! 3. Draw the unit at the chosen position with [`render::QuestionRenderer`]
//!
//! The estimate and the drawing share one wrapping routine and one choice
//! pairing plan, so an estimate is always at least the height drawn.
//!
//! Layout units are millimetres with the origin at the top-left of the page.

pub mod canvas;
pub mod choices;
pub mod estimate;
pub mod flow;
pub mod frame;
pub mod geometry;
pub mod placement;
pub mod render;
pub mod segment;

pub use canvas::{Canvas, PageCanvas};
pub use flow::{RenderSummary, SectionFlowController};
pub use geometry::{Column, FlowCursor, PageGeometry};

use std::sync::Arc;

use crate::image_loader::LoadedImage;
use crate::model::PaperConfig;
use crate::style::{
    Color, FontSizes, FontSpec, Spacing, BODY_FAMILY, QUESTION_FAMILY,
};
use crate::text::TextMetrics;

/// A finished page: its size and every positioned drawing command.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutPage {
    pub width: f64,
    pub height: f64,
    pub elements: Vec<LayoutElement>,
}

impl LayoutPage {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            elements: Vec::new(),
        }
    }

    /// Elements that belong to `source`.
    pub fn elements_of(&self, source: ContentRef) -> impl Iterator<Item = &LayoutElement> {
        self.elements
            .iter()
            .filter(move |e| e.source == Some(source))
    }

    /// Concatenated text of every text element, in drawing order.
    pub fn text(&self) -> String {
        self.elements
            .iter()
            .filter_map(|e| match &e.draw {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                DrawCommand::Line { .. } | DrawCommand::Image { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A positioned element on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutElement {
    /// Top-left corner in layout units.
    pub x: f64,
    pub y: f64,
    /// For text and images, the box the content sits in. For lines, the
    /// vector from (x, y) to the end point.
    pub width: f64,
    pub height: f64,
    pub draw: DrawCommand,
    /// Logical content this element was drawn for.
    pub source: Option<ContentRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// One already-wrapped line of text.
    Text {
        text: String,
        font: FontSpec,
        color: Color,
    },
    /// A straight rule.
    Line { color: Color, thickness: f64 },
    /// A figure stretched to the element's box.
    Image { image: Arc<LoadedImage> },
}

/// What a drawn element belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentRef {
    /// Headers, footers and column dividers.
    PageFrame,
    /// Header of the section at this index.
    SectionHeader(usize),
    /// Question with this printed number.
    Question(usize),
    EndMarker,
}

/// Which rendering of the paper a pass produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    #[default]
    QuestionPaper,
    /// Correct choices marked and explanations shown.
    AnswerKey,
}

/// Immutable per-pass layout state shared by the estimator and the renderer.
pub struct LayoutContext {
    pub geometry: PageGeometry,
    pub fonts: FontSizes,
    pub spacing: Spacing,
    pub metrics: TextMetrics,
    pub mode: RenderMode,
}

impl LayoutContext {
    pub fn new(config: &PaperConfig, mode: RenderMode) -> Self {
        let fonts = config.size.font_sizes();
        let spacing = config.size.spacing();
        Self {
            geometry: PageGeometry::new(config.format, &spacing),
            fonts,
            spacing,
            metrics: TextMetrics::new(spacing.line_height),
            mode,
        }
    }

    pub fn line_height(&self) -> f64 {
        self.spacing.line_height
    }

    pub fn answer_key(&self) -> bool {
        self.mode == RenderMode::AnswerKey
    }

    /// Italic stem text.
    pub fn question_font(&self) -> FontSpec {
        FontSpec::italic(QUESTION_FAMILY, self.fonts.question)
    }

    /// Choices and sub-block bodies.
    pub fn option_font(&self) -> FontSpec {
        FontSpec::regular(QUESTION_FAMILY, self.fonts.option)
    }

    /// "A.", "Explanation:" and similar labels.
    pub fn label_font(&self) -> FontSpec {
        FontSpec::bold(BODY_FAMILY, self.fonts.option_label)
    }

    pub fn number_font(&self) -> FontSpec {
        FontSpec::bold(BODY_FAMILY, self.fonts.question_number)
    }

    pub fn section_name_font(&self) -> FontSpec {
        FontSpec::bold(BODY_FAMILY, self.fonts.section_name)
    }

    pub fn section_description_font(&self) -> FontSpec {
        FontSpec::italic(BODY_FAMILY, self.fonts.section_description)
    }
}
