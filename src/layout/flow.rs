//! # Section Flow
//!
//! Drives one render pass: the first-page frame, every section's header and
//! questions, and the closing END marker. Each unit is measured, placed and
//! only then drawn.
//!
//! A section header never travels alone. Its height is added to the height
//! of the section's first question and the pair is placed as one unit, so a
//! header can't be left at the foot of a column with its first question on
//! the next one.

use super::estimate::{HeightEstimator, END_MARKER_HEIGHT};
use super::frame::PageFrame;
use super::placement::{Placement, PlacementEngine};
use super::render::QuestionRenderer;
use super::{Canvas, ContentRef, FlowCursor, LayoutContext};
use crate::model::Section;
use crate::style::{Color, FontSpec, TextAlign, BODY_FAMILY};

/// Asterisk greys on the left of the END marker, outermost first.
const END_MARKER_GREYS: [u8; 4] = [200, 170, 140, 110];
const END_MARKER_CELL: f64 = 7.0;

/// What a render pass produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderSummary {
    pub pages: usize,
    pub question_count: usize,
    pub total_marks: u32,
    /// Units taller than a fresh column, drawn past the footer reserve.
    pub overflows: usize,
}

pub struct SectionFlowController<'a> {
    ctx: &'a LayoutContext,
    frame: PageFrame<'a>,
    engine: PlacementEngine,
}

impl<'a> SectionFlowController<'a> {
    pub fn new(ctx: &'a LayoutContext, frame: PageFrame<'a>) -> Self {
        Self {
            ctx,
            frame,
            engine: PlacementEngine::new(),
        }
    }

    /// Lay out every selected question of `sections` onto `canvas`.
    pub fn run(&self, canvas: &mut dyn Canvas, sections: &[Section]) -> RenderSummary {
        let mut summary = RenderSummary::default();

        canvas.new_page();
        let offset = self.frame.first_page(canvas);
        let mut cursor = FlowCursor::new(self.ctx.geometry, offset);
        let renderer = QuestionRenderer::new(self.ctx);
        let mut number = 1;

        for (index, section) in sections.iter().enumerate() {
            let Some((first, rest)) = section.selected().split_first() else {
                continue;
            };

            let unit = {
                let estimator = HeightEstimator::new(self.ctx, &*canvas);
                estimator.header_height(section) + estimator.estimate_question(first)
            };
            if !cursor.at_column_top() {
                cursor.advance_by(self.ctx.spacing.before_section);
            }
            self.place(canvas, &mut cursor, unit, &mut summary);
            self.draw_header(canvas, &mut cursor, index, section);
            renderer.render(canvas, &mut cursor, first, number);
            number += 1;

            for question in rest {
                let height = HeightEstimator::new(self.ctx, &*canvas).estimate_question(question);
                self.place(canvas, &mut cursor, height, &mut summary);
                renderer.render(canvas, &mut cursor, question, number);
                number += 1;
            }

            summary.total_marks = summary.total_marks.saturating_add(section.total_marks());
            log::debug!(
                "Section '{}' laid out: {} questions, ending on page {}",
                section.name,
                section.selected().len(),
                cursor.page()
            );
        }

        self.place(canvas, &mut cursor, END_MARKER_HEIGHT, &mut summary);
        self.draw_end_marker(canvas, &mut cursor);

        summary.question_count = number - 1;
        summary.pages = canvas.current_page_number();
        summary
    }

    fn place(
        &self,
        canvas: &mut dyn Canvas,
        cursor: &mut FlowCursor,
        required: f64,
        summary: &mut RenderSummary,
    ) -> Placement {
        let frame = &self.frame;
        let placement = self.engine.place(cursor, required, &mut |page| {
            canvas.new_page();
            frame.subsequent_page(&mut *canvas, page);
        });
        if placement.overflow {
            summary.overflows += 1;
        }
        placement
    }

    /// Centred bold name, then the italic description aligned with the
    /// question text.
    fn draw_header(
        &self,
        canvas: &mut dyn Canvas,
        cursor: &mut FlowCursor,
        index: usize,
        section: &Section,
    ) {
        let ctx = self.ctx;
        let g = &ctx.geometry;
        let lh = ctx.line_height();
        let x = cursor.x();

        canvas.set_source(Some(ContentRef::SectionHeader(index)));
        let y = canvas.draw_text(
            x,
            cursor.y(),
            g.column_width,
            lh,
            &section.name,
            &ctx.section_name_font(),
            TextAlign::Center,
        ) + ctx.spacing.after_section_name;
        let y = canvas.draw_text(
            x + g.number_width + 1.0,
            y,
            g.question_width,
            lh,
            &section.description,
            &ctx.section_description_font(),
            TextAlign::Left,
        ) + ctx.spacing.after_description;
        canvas.set_source(None);
        cursor.set_y(y);
    }

    /// "* * * * END * * * *" with asterisks fading outward.
    fn draw_end_marker(&self, canvas: &mut dyn Canvas, cursor: &mut FlowCursor) {
        cursor.advance_by(10.0);
        let y = cursor.y();
        let center = cursor.x() + self.ctx.geometry.column_width / 2.0;

        let font = FontSpec::bold(BODY_FAMILY, self.ctx.fonts.section_name);
        let text_width = canvas.measure_width("END", &font);
        let left_start = center - text_width / 2.0 - 30.0;
        let right_start = center + text_width / 2.0;

        canvas.set_source(Some(ContentRef::EndMarker));
        for (i, &grey) in END_MARKER_GREYS.iter().enumerate() {
            let offset = i as f64 * END_MARKER_CELL;
            canvas.set_text_color(Color::grey(grey));
            canvas.draw_cell(left_start + offset, y, END_MARKER_CELL, 5.0, "*", &font, TextAlign::Center);
            canvas.set_text_color(Color::grey(END_MARKER_GREYS[3 - i]));
            canvas.draw_cell(right_start + offset, y, END_MARKER_CELL, 5.0, "*", &font, TextAlign::Center);
        }
        canvas.set_text_color(Color::BLACK);
        canvas.draw_cell(center - text_width / 2.0, y, text_width, 5.0, "END", &font, TextAlign::Center);
        canvas.set_source(None);

        cursor.advance_by(10.0);
    }
}
