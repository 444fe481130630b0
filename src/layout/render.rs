//! Draws a question that placement has already made room for.
//!
//! The renderer never moves the cursor between columns or pages. It draws
//! from the cursor's position downward and leaves the cursor one line below
//! the question.

use super::choices;
use super::{segment, Canvas, ContentRef, FlowCursor, LayoutContext};
use crate::model::Question;
use crate::style::TextAlign;

/// Offset of the choices from the stem's left edge.
const OPTIONS_INDENT: f64 = 2.0;

pub struct QuestionRenderer<'a> {
    ctx: &'a LayoutContext,
}

impl<'a> QuestionRenderer<'a> {
    pub fn new(ctx: &'a LayoutContext) -> Self {
        Self { ctx }
    }

    /// Draw `question` as number `number` and advance the cursor past it.
    /// Returns the distance advanced.
    pub fn render(
        &self,
        canvas: &mut dyn Canvas,
        cursor: &mut FlowCursor,
        question: &Question,
        number: usize,
    ) -> f64 {
        let ctx = self.ctx;
        let lh = ctx.line_height();
        let x = cursor.x();
        let top = cursor.y();

        canvas.set_source(Some(ContentRef::Question(number)));
        canvas.draw_cell(
            x,
            top,
            ctx.geometry.number_width,
            lh,
            &format!("{}.", number),
            &ctx.number_font(),
            TextAlign::Right,
        );

        let question_x = x + ctx.geometry.number_width + 1.0;
        let mut y = top;
        for seg in &question.segments {
            y = segment::draw(ctx, canvas, seg, question_x, y);
        }
        let stem_end = y.max(top + lh);

        let options_x = question_x + OPTIONS_INDENT;
        let y = choices::draw_choices(ctx, canvas, question, options_x, stem_end + choices::top_gap(question));
        let y = choices::draw_explanation(ctx, canvas, question, options_x, y);
        canvas.set_source(None);

        let end = y + lh;
        cursor.set_y(end);
        end - top
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::font::FontContext;
    use crate::image_loader::{ImagePixelData, LoadedImage};
    use crate::layout::estimate::HeightEstimator;
    use crate::layout::{PageCanvas, PageGeometry, RenderMode};
    use crate::model::{PaperConfig, Segment};

    fn question() -> Question {
        Question {
            segments: vec![
                Segment::PlainText("Match the animals with their diets.".into()),
                Segment::MatchTable {
                    left: vec!["Lion".into(), "Cow".into(), "Bear".into()],
                    right: vec!["Grass".into(), "Meat".into()],
                },
                Segment::PlainText("Choose the correct option.".into()),
            ],
            choices: vec!["1-b, 2-a, 3-c".into(), "1-a, 2-b, 3-c".into(), "None".into()],
            answer: 0,
            explanation: Some("Lions eat meat; cows eat grass; bears eat both.".into()),
            marks: 1,
        }
    }

    #[test]
    fn advance_equals_extent_in_both_modes() {
        for mode in [RenderMode::QuestionPaper, RenderMode::AnswerKey] {
            let config = PaperConfig::new("School", "Sub", "Exam").unwrap();
            let ctx = LayoutContext::new(&config, mode);
            let mut canvas = PageCanvas::new(FontContext::new(), 210.0, 297.0);
            canvas.new_page();
            let mut cursor = FlowCursor::new(PageGeometry::new(config.format, &ctx.spacing), 53.0);

            let q = question();
            let extent = HeightEstimator::new(&ctx, &canvas).question_extent(&q);
            let advanced = QuestionRenderer::new(&ctx).render(&mut canvas, &mut cursor, &q, 7);
            assert!((advanced - extent).abs() < 1e-9);
            assert_eq!(cursor.y(), 58.0 + advanced);
        }
    }

    fn written(segments: Vec<Segment>) -> Question {
        Question {
            segments,
            choices: Vec::new(),
            answer: 0,
            explanation: None,
            marks: 2,
        }
    }

    #[test]
    fn choiceless_questions_advance_by_their_extent() {
        let figure = Arc::new(LoadedImage {
            pixel_data: ImagePixelData::Decoded { rgb: vec![0; 12], alpha: None },
            width_px: 2,
            height_px: 2,
        });
        let questions = [
            written(vec![
                Segment::PlainText("Label the diagram.".into()),
                Segment::Image(figure),
            ]),
            written(vec![Segment::Blank {
                text: "The capital of Japan is ___.".into(),
                answer: Some("Tokyo".into()),
            }]),
            written(vec![
                Segment::PlainText("Match the inventors.".into()),
                Segment::MatchPairs {
                    left: vec![("A".into(), "Telephone".into())],
                    right: vec![("1".into(), "Telephone".into())],
                },
            ]),
        ];
        for mode in [RenderMode::QuestionPaper, RenderMode::AnswerKey] {
            let config = PaperConfig::new("School", "Sub", "Exam").unwrap();
            let ctx = LayoutContext::new(&config, mode);
            let mut canvas = PageCanvas::new(FontContext::new(), 210.0, 297.0);
            canvas.new_page();
            for q in &questions {
                let mut cursor = FlowCursor::new(ctx.geometry, 53.0);
                let extent = HeightEstimator::new(&ctx, &canvas).question_extent(q);
                let advanced = QuestionRenderer::new(&ctx).render(&mut canvas, &mut cursor, q, 1);
                assert!((advanced - extent).abs() < 1e-9, "{:?}", q.kind());
            }
        }
    }

    #[test]
    fn elements_are_tagged_with_the_number() {
        let config = PaperConfig::new("School", "Sub", "Exam").unwrap();
        let ctx = LayoutContext::new(&config, RenderMode::QuestionPaper);
        let mut canvas = PageCanvas::new(FontContext::new(), 210.0, 297.0);
        canvas.new_page();
        let mut cursor = FlowCursor::new(ctx.geometry, 53.0);
        QuestionRenderer::new(&ctx).render(&mut canvas, &mut cursor, &question(), 12);

        let page = &canvas.pages()[0];
        assert_eq!(page.elements_of(ContentRef::Question(12)).count(), page.elements.len());
        assert!(page.text().starts_with("12."));
    }
}
