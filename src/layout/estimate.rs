//! Height estimation for placement units.

use super::choices;
use super::{segment, Canvas, LayoutContext};
use crate::model::{Question, Section};

/// Slack added on top of the computed extent of a question.
pub const SAFETY_BUFFER: f64 = 3.0;
/// Height reserved for the END marker.
pub const END_MARKER_HEIGHT: f64 = 20.0;

/// Measures content without drawing it.
pub struct HeightEstimator<'a> {
    ctx: &'a LayoutContext,
    canvas: &'a dyn Canvas,
}

impl<'a> HeightEstimator<'a> {
    pub fn new(ctx: &'a LayoutContext, canvas: &'a dyn Canvas) -> Self {
        Self { ctx, canvas }
    }

    /// Height of the stem: every segment, never less than one line.
    pub fn stem_height(&self, question: &Question) -> f64 {
        let segments: f64 = question
            .segments
            .iter()
            .map(|s| segment::measure(self.ctx, self.canvas, s))
            .sum();
        segments.max(self.ctx.line_height())
    }

    /// The exact vertical distance the renderer moves the cursor for
    /// `question`, trailing line included.
    pub fn question_extent(&self, question: &Question) -> f64 {
        self.stem_height(question)
            + choices::top_gap(question)
            + choices::choices_height(self.ctx, self.canvas, question)
            + choices::explanation_height(self.ctx, self.canvas, question)
            + self.ctx.line_height()
    }

    /// Height to reserve before rendering `question`.
    pub fn estimate_question(&self, question: &Question) -> f64 {
        self.question_extent(question) + SAFETY_BUFFER
    }

    /// Section name and description with their trailing gaps.
    pub fn header_height(&self, section: &Section) -> f64 {
        let ctx = self.ctx;
        ctx.metrics.height(
            self.canvas,
            &section.name,
            ctx.geometry.column_width,
            &ctx.section_name_font(),
        ) + ctx.spacing.after_section_name
            + ctx.metrics.height(
                self.canvas,
                &section.description,
                ctx.geometry.question_width,
                &ctx.section_description_font(),
            )
            + ctx.spacing.after_description
    }
}
