//! Choice rows and the answer-key explanation block.
//!
//! [`choice_rows`] is the single place that decides whether two choices sit
//! side by side. Both the estimator and the renderer consume its plan.

use super::{Canvas, LayoutContext};
use crate::model::Question;
use crate::style::{FontSpec, TextAlign};

/// Width of the "A." label cell.
pub const LABEL_WIDTH: f64 = 5.0;
/// Gap between the stem and the first choice row.
pub const CHOICES_TOP_GAP: f64 = 1.0;
/// Gap after each choice row.
pub const ROW_GAP: f64 = 1.0;
pub const EXPLANATION_LABEL: &str = "Explanation:";
/// Marker appended to the correct choice in the answer key.
pub const ANSWER_MARKER: &str = " *";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceRow {
    /// Two choices side by side.
    Pair(usize, usize),
    /// One choice across the full options width.
    Single(usize),
}

/// Gap above the choice rows. Questions without choices have none.
pub fn top_gap(question: &Question) -> f64 {
    if question.choices.is_empty() {
        0.0
    } else {
        CHOICES_TOP_GAP
    }
}

/// "A.", "B.", …
pub fn choice_label(index: usize) -> String {
    let letter = char::from_u32('A' as u32 + index as u32).unwrap_or('?');
    format!("{}.", letter)
}

/// Width available to each half of a paired row.
pub fn half_width(ctx: &LayoutContext) -> f64 {
    (ctx.geometry.options_width - ctx.geometry.option_gap) / 2.0
}

fn fits_half(ctx: &LayoutContext, canvas: &dyn Canvas, text: &str) -> bool {
    LABEL_WIDTH + canvas.measure_width(text, &ctx.option_font()) <= half_width(ctx)
}

/// Lay choices out two at a time where both of a pair fit half the
/// options width, one per row otherwise.
///
/// Measured with the regular option font in every mode, so a question
/// pairs the same way in the paper and in its answer key.
pub fn choice_rows(ctx: &LayoutContext, canvas: &dyn Canvas, question: &Question) -> Vec<ChoiceRow> {
    let n = question.choices.len();
    let pairing = !question.forces_single_choices();
    let mut rows = Vec::new();
    let mut i = 0;
    while i < n {
        if pairing
            && i + 1 < n
            && fits_half(ctx, canvas, &question.choices[i])
            && fits_half(ctx, canvas, &question.choices[i + 1])
        {
            rows.push(ChoiceRow::Pair(i, i + 1));
            i += 2;
        } else {
            rows.push(ChoiceRow::Single(i));
            i += 1;
        }
    }
    rows
}

/// Text and font a choice is drawn with in the current mode.
fn display(ctx: &LayoutContext, question: &Question, index: usize) -> (String, FontSpec) {
    let text = &question.choices[index];
    if ctx.answer_key() && index == question.answer {
        (format!("{}{}", text, ANSWER_MARKER), ctx.option_font().with_bold(true))
    } else {
        (text.clone(), ctx.option_font())
    }
}

fn choice_height(
    ctx: &LayoutContext,
    canvas: &dyn Canvas,
    question: &Question,
    index: usize,
    cell_width: f64,
) -> f64 {
    let (text, font) = display(ctx, question, index);
    ctx.metrics.height(canvas, &text, cell_width - LABEL_WIDTH, &font)
}

fn row_cells(ctx: &LayoutContext, row: ChoiceRow) -> Vec<(usize, f64, f64)> {
    let half = half_width(ctx);
    match row {
        ChoiceRow::Pair(a, b) => vec![(a, 0.0, half), (b, half + ctx.geometry.option_gap, half)],
        ChoiceRow::Single(a) => vec![(a, 0.0, ctx.geometry.options_width)],
    }
}

fn row_height(ctx: &LayoutContext, canvas: &dyn Canvas, question: &Question, row: ChoiceRow) -> f64 {
    row_cells(ctx, row)
        .into_iter()
        .map(|(i, _, w)| choice_height(ctx, canvas, question, i, w))
        .fold(0.0, f64::max)
}

/// Vertical extent of all choice rows.
pub fn choices_height(ctx: &LayoutContext, canvas: &dyn Canvas, question: &Question) -> f64 {
    choice_rows(ctx, canvas, question)
        .into_iter()
        .map(|row| row_height(ctx, canvas, question, row) + ROW_GAP)
        .sum()
}

/// Draw the choice rows at `x`. Returns the Y below the last row.
pub fn draw_choices(
    ctx: &LayoutContext,
    canvas: &mut dyn Canvas,
    question: &Question,
    x: f64,
    y: f64,
) -> f64 {
    let lh = ctx.line_height();
    let mut y = y;
    for row in choice_rows(ctx, &*canvas, question) {
        let height = row_height(ctx, &*canvas, question, row);
        for (index, offset, width) in row_cells(ctx, row) {
            let cell_x = x + offset;
            canvas.draw_cell(
                cell_x,
                y,
                LABEL_WIDTH,
                lh,
                &choice_label(index),
                &ctx.label_font(),
                TextAlign::Left,
            );
            let (text, font) = display(ctx, question, index);
            canvas.draw_text(
                cell_x + LABEL_WIDTH,
                y,
                width - LABEL_WIDTH,
                lh,
                &text,
                &font,
                TextAlign::Left,
            );
        }
        y += height + ROW_GAP;
    }
    y
}

/// Height of the explanation block, zero outside the answer key.
pub fn explanation_height(ctx: &LayoutContext, canvas: &dyn Canvas, question: &Question) -> f64 {
    match (&question.explanation, ctx.answer_key()) {
        (Some(text), true) => {
            1.0 + ctx.line_height()
                + ctx.metrics.height(canvas, text, ctx.geometry.options_width, &ctx.option_font())
                + 2.0
        }
        _ => 0.0,
    }
}

pub fn draw_explanation(
    ctx: &LayoutContext,
    canvas: &mut dyn Canvas,
    question: &Question,
    x: f64,
    y: f64,
) -> f64 {
    let Some(text) = question.explanation.as_deref().filter(|_| ctx.answer_key()) else {
        return y;
    };
    let width = ctx.geometry.options_width;
    let lh = ctx.line_height();
    let y = y + 1.0;
    canvas.draw_cell(x, y, width, lh, EXPLANATION_LABEL, &ctx.label_font(), TextAlign::Left);
    let y = canvas.draw_text(x, y + lh, width, lh, text, &ctx.option_font(), TextAlign::Left);
    y + 2.0
}
