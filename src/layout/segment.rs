//! # Segment Dispatch
//!
//! One table maps each [`SegmentKind`] to its visual rules and a
//! (measure, draw) function pair. Every stem segment of every question type
//! goes through this table, so a new segment kind is a new row, not a new
//! copy of the question renderer.
//!
//! Measure and draw for a row walk the same geometry: `measure` returns
//! exactly the vertical extent `draw` consumes.

use std::borrow::Cow;

use super::{Canvas, LayoutContext};
use crate::model::{matching_pair, Segment, SegmentKind, BLANK};
use crate::style::TextAlign;

/// Per-kind spacing and labelling, in layout units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentStyle {
    /// Offset from the stem's left edge.
    pub indent: f64,
    /// Bold caption drawn on its own line above the body.
    pub label: Option<&'static str>,
    pub before: f64,
    /// Added after each item or table row.
    pub item_gap: f64,
    pub after: f64,
}

pub type MeasureFn = fn(&LayoutContext, &dyn Canvas, &Segment, &SegmentStyle) -> f64;
/// Draws at (x, y) and returns the Y below the segment.
pub type DrawFn = fn(&LayoutContext, &mut dyn Canvas, &Segment, &SegmentStyle, f64, f64) -> f64;

pub struct SegmentOps {
    pub style: SegmentStyle,
    pub measure: MeasureFn,
    pub draw: DrawFn,
}

/// Indexed by `SegmentKind as usize`.
static SEGMENT_OPS: [SegmentOps; 9] = [
    SegmentOps {
        style: SegmentStyle { indent: 0.0, label: None, before: 0.0, item_gap: 0.0, after: 0.0 },
        measure: measure_plain,
        draw: draw_plain,
    },
    SegmentOps {
        style: SegmentStyle { indent: 5.0, label: Some("Statement:"), before: 2.0, item_gap: 0.0, after: 1.0 },
        measure: measure_block,
        draw: draw_block,
    },
    SegmentOps {
        style: SegmentStyle { indent: 5.0, label: None, before: 2.0, item_gap: 1.0, after: 2.0 },
        measure: measure_items,
        draw: draw_items,
    },
    SegmentOps {
        style: SegmentStyle { indent: 5.0, label: None, before: 2.0, item_gap: 1.0, after: 2.0 },
        measure: measure_items,
        draw: draw_items,
    },
    SegmentOps {
        style: SegmentStyle { indent: 5.0, label: None, before: 2.0, item_gap: 0.0, after: 2.0 },
        measure: measure_block,
        draw: draw_block,
    },
    SegmentOps {
        style: SegmentStyle { indent: 5.0, label: None, before: 2.0, item_gap: 1.0, after: 3.0 },
        measure: measure_table,
        draw: draw_table,
    },
    SegmentOps {
        style: SegmentStyle { indent: 0.0, label: None, before: 2.0, item_gap: 0.0, after: 2.0 },
        measure: measure_image,
        draw: draw_image,
    },
    SegmentOps {
        style: SegmentStyle { indent: 0.0, label: None, before: 0.0, item_gap: 0.0, after: 2.0 },
        measure: measure_blank,
        draw: draw_blank,
    },
    SegmentOps {
        style: SegmentStyle { indent: 0.0, label: None, before: 1.0, item_gap: 1.0, after: 2.0 },
        measure: measure_pairs,
        draw: draw_pairs,
    },
];

pub fn ops(kind: SegmentKind) -> &'static SegmentOps {
    &SEGMENT_OPS[kind as usize]
}

/// Height of one segment at the stem's width.
pub fn measure(ctx: &LayoutContext, canvas: &dyn Canvas, segment: &Segment) -> f64 {
    let ops = ops(segment.kind());
    (ops.measure)(ctx, canvas, segment, &ops.style)
}

/// Draw one segment with the stem's left edge at `x`.
pub fn draw(ctx: &LayoutContext, canvas: &mut dyn Canvas, segment: &Segment, x: f64, y: f64) -> f64 {
    let ops = ops(segment.kind());
    (ops.draw)(ctx, canvas, segment, &ops.style, x, y)
}

fn body_width(ctx: &LayoutContext, style: &SegmentStyle) -> f64 {
    ctx.geometry.question_width - style.indent
}

fn label_height(ctx: &LayoutContext, style: &SegmentStyle) -> f64 {
    if style.label.is_some() {
        ctx.line_height()
    } else {
        0.0
    }
}

fn single_text(segment: &Segment) -> &str {
    match segment {
        Segment::PlainText(text) | Segment::Statement(text) | Segment::Paragraph(text) => text.as_str(),
        _ => "",
    }
}

fn items(segment: &Segment) -> &[String] {
    match segment {
        Segment::StatementList(items) | Segment::Sequence(items) => items.as_slice(),
        _ => &[],
    }
}

// ─── Plain text ─────────────────────────────────────────────────

fn measure_plain(ctx: &LayoutContext, canvas: &dyn Canvas, segment: &Segment, _: &SegmentStyle) -> f64 {
    ctx.metrics.height(
        canvas,
        single_text(segment),
        ctx.geometry.question_width,
        &ctx.question_font(),
    )
}

fn draw_plain(
    ctx: &LayoutContext,
    canvas: &mut dyn Canvas,
    segment: &Segment,
    _: &SegmentStyle,
    x: f64,
    y: f64,
) -> f64 {
    canvas.draw_text(
        x,
        y,
        ctx.geometry.question_width,
        ctx.line_height(),
        single_text(segment),
        &ctx.question_font(),
        TextAlign::Left,
    )
}

// ─── Statement / paragraph ──────────────────────────────────────

fn measure_block(ctx: &LayoutContext, canvas: &dyn Canvas, segment: &Segment, style: &SegmentStyle) -> f64 {
    style.before
        + label_height(ctx, style)
        + ctx.metrics.height(
            canvas,
            single_text(segment),
            body_width(ctx, style),
            &ctx.option_font(),
        )
        + style.after
}

fn draw_block(
    ctx: &LayoutContext,
    canvas: &mut dyn Canvas,
    segment: &Segment,
    style: &SegmentStyle,
    x: f64,
    y: f64,
) -> f64 {
    let body_x = x + style.indent;
    let mut y = y + style.before;
    if let Some(label) = style.label {
        canvas.draw_cell(
            body_x,
            y,
            body_width(ctx, style),
            ctx.line_height(),
            label,
            &ctx.label_font(),
            TextAlign::Left,
        );
        y += ctx.line_height();
    }
    let y = canvas.draw_text(
        body_x,
        y,
        body_width(ctx, style),
        ctx.line_height(),
        single_text(segment),
        &ctx.option_font(),
        TextAlign::Left,
    );
    y + style.after
}

// ─── Statement lists and sequences ──────────────────────────────

fn measure_items(ctx: &LayoutContext, canvas: &dyn Canvas, segment: &Segment, style: &SegmentStyle) -> f64 {
    let width = body_width(ctx, style);
    let font = ctx.option_font();
    let body: f64 = items(segment)
        .iter()
        .map(|item| ctx.metrics.height(canvas, item, width, &font) + style.item_gap)
        .sum();
    style.before + body + style.after
}

fn draw_items(
    ctx: &LayoutContext,
    canvas: &mut dyn Canvas,
    segment: &Segment,
    style: &SegmentStyle,
    x: f64,
    y: f64,
) -> f64 {
    let width = body_width(ctx, style);
    let font = ctx.option_font();
    let mut y = y + style.before;
    for item in items(segment) {
        y = canvas.draw_text(x + style.indent, y, width, ctx.line_height(), item, &font, TextAlign::Left);
        y += style.item_gap;
    }
    y + style.after
}

// ─── Match-the-following table ──────────────────────────────────

/// Column widths of a match table: left, separator, right.
fn table_columns(width: f64) -> (f64, f64, f64) {
    (width * 0.45, width * 0.10, width * 0.45)
}

fn table_rows(segment: &Segment) -> Vec<(Option<&str>, Option<&str>)> {
    let Segment::MatchTable { left, right } = segment else {
        return Vec::new();
    };
    (0..left.len().max(right.len()))
        .map(|i| (left.get(i).map(String::as_str), right.get(i).map(String::as_str)))
        .collect()
}

fn row_height(
    ctx: &LayoutContext,
    canvas: &dyn Canvas,
    row: (Option<&str>, Option<&str>),
    cell_width: f64,
) -> f64 {
    let font = ctx.option_font();
    let side = |text: Option<&str>| {
        text.map(|t| ctx.metrics.height(canvas, t, cell_width, &font))
            .unwrap_or(0.0)
    };
    side(row.0).max(side(row.1))
}

fn measure_table(ctx: &LayoutContext, canvas: &dyn Canvas, segment: &Segment, style: &SegmentStyle) -> f64 {
    let (cell, _, _) = table_columns(body_width(ctx, style));
    let body: f64 = table_rows(segment)
        .into_iter()
        .map(|row| row_height(ctx, canvas, row, cell) + style.item_gap)
        .sum();
    style.before + body + style.after
}

fn draw_table(
    ctx: &LayoutContext,
    canvas: &mut dyn Canvas,
    segment: &Segment,
    style: &SegmentStyle,
    x: f64,
    y: f64,
) -> f64 {
    let table_x = x + style.indent;
    let (left_w, sep_w, right_w) = table_columns(body_width(ctx, style));
    let font = ctx.option_font();
    let lh = ctx.line_height();

    let mut y = y + style.before;
    for row in table_rows(segment) {
        let height = row_height(ctx, &*canvas, row, left_w);
        if let Some(text) = row.0 {
            canvas.draw_text(table_x, y, left_w, lh, text, &font, TextAlign::Left);
        }
        let dash_y = y + (height - lh) / 2.0;
        canvas.draw_cell(table_x + left_w, dash_y, sep_w, lh, "-", &font, TextAlign::Center);
        if let Some(text) = row.1 {
            canvas.draw_text(table_x + left_w + sep_w, y, right_w, lh, text, &font, TextAlign::Left);
        }
        y += height + style.item_gap;
    }
    y + style.after
}

// ─── Figures ────────────────────────────────────────────────────

fn image_height(ctx: &LayoutContext, segment: &Segment) -> f64 {
    match segment {
        Segment::Image(image) => ctx.geometry.question_width * image.aspect(),
        _ => 0.0,
    }
}

fn measure_image(ctx: &LayoutContext, _: &dyn Canvas, segment: &Segment, style: &SegmentStyle) -> f64 {
    style.before + image_height(ctx, segment) + style.after
}

fn draw_image(
    ctx: &LayoutContext,
    canvas: &mut dyn Canvas,
    segment: &Segment,
    style: &SegmentStyle,
    x: f64,
    y: f64,
) -> f64 {
    let y = y + style.before;
    let height = image_height(ctx, segment);
    if let Segment::Image(image) = segment {
        canvas.draw_image(x, y, ctx.geometry.question_width, height, image);
    }
    y + height + style.after
}

// ─── Fill in the blank ──────────────────────────────────────────

/// The blank's text, with the answer written in when drawing the key.
fn blank_text<'s>(ctx: &LayoutContext, segment: &'s Segment) -> Cow<'s, str> {
    match segment {
        Segment::Blank { text, answer: Some(answer) } if ctx.answer_key() => {
            Cow::Owned(text.replace(BLANK, answer))
        }
        Segment::Blank { text, .. } => Cow::Borrowed(text.as_str()),
        _ => Cow::Borrowed(""),
    }
}

fn measure_blank(ctx: &LayoutContext, canvas: &dyn Canvas, segment: &Segment, style: &SegmentStyle) -> f64 {
    style.before
        + ctx.metrics.height(
            canvas,
            &blank_text(ctx, segment),
            ctx.geometry.question_width,
            &ctx.question_font(),
        )
        + style.after
}

fn draw_blank(
    ctx: &LayoutContext,
    canvas: &mut dyn Canvas,
    segment: &Segment,
    style: &SegmentStyle,
    x: f64,
    y: f64,
) -> f64 {
    let y = canvas.draw_text(
        x,
        y + style.before,
        ctx.geometry.question_width,
        ctx.line_height(),
        &blank_text(ctx, segment),
        &ctx.question_font(),
        TextAlign::Left,
    );
    y + style.after
}

// ─── Match pairs ────────────────────────────────────────────────

const PAIR_HEADERS: (&str, &str) = ("Column A", "Column B");
/// Space between the two pair columns.
const PAIR_GAP: f64 = 8.0;
/// Shown for an item whose match isn't among the numbered entries.
const UNMATCHED_KEY: &str = "?";

type PairCell<'s> = Option<(&'s str, &'s str)>;

fn pair_column_width(ctx: &LayoutContext) -> f64 {
    (ctx.geometry.question_width - PAIR_GAP) / 2.0
}

/// Rows of (item, match). The question paper lists both sides in key order.
/// The answer key puts each item's match beside it.
fn pair_rows<'s>(ctx: &LayoutContext, segment: &'s Segment) -> Vec<(PairCell<'s>, PairCell<'s>)> {
    let Segment::MatchPairs { left, right } = segment else {
        return Vec::new();
    };
    let cell = |(key, text): &'s (String, String)| (key.as_str(), text.as_str());
    if ctx.answer_key() {
        left.iter()
            .map(|item| {
                let matched = matching_pair(right, &item.1)
                    .map(cell)
                    .unwrap_or((UNMATCHED_KEY, ""));
                (Some(cell(item)), Some(matched))
            })
            .collect()
    } else {
        (0..left.len().max(right.len()))
            .map(|i| (left.get(i).map(cell), right.get(i).map(cell)))
            .collect()
    }
}

fn pair_label(key: &str) -> String {
    format!("{}. ", key)
}

fn pair_cell_height(ctx: &LayoutContext, canvas: &dyn Canvas, cell: PairCell<'_>) -> f64 {
    let Some((key, text)) = cell else {
        return 0.0;
    };
    let label_width = canvas.measure_width(&pair_label(key), &ctx.label_font());
    ctx.metrics.height(
        canvas,
        text,
        pair_column_width(ctx) - label_width,
        &ctx.option_font(),
    )
}

fn measure_pairs(ctx: &LayoutContext, canvas: &dyn Canvas, segment: &Segment, style: &SegmentStyle) -> f64 {
    let header = ctx.line_height() + style.item_gap;
    let body: f64 = pair_rows(ctx, segment)
        .into_iter()
        .map(|(l, r)| pair_cell_height(ctx, canvas, l).max(pair_cell_height(ctx, canvas, r)) + style.item_gap)
        .sum();
    style.before + header + body + style.after
}

fn draw_pair_cell(ctx: &LayoutContext, canvas: &mut dyn Canvas, cell: PairCell<'_>, x: f64, y: f64) {
    let Some((key, text)) = cell else {
        return;
    };
    let lh = ctx.line_height();
    let label = pair_label(key);
    let label_font = ctx.label_font();
    let label_width = canvas.measure_width(&label, &label_font);
    canvas.draw_cell(x, y, label_width, lh, &label, &label_font, TextAlign::Left);
    canvas.draw_text(
        x + label_width,
        y,
        pair_column_width(ctx) - label_width,
        lh,
        text,
        &ctx.option_font(),
        TextAlign::Left,
    );
}

fn draw_pairs(
    ctx: &LayoutContext,
    canvas: &mut dyn Canvas,
    segment: &Segment,
    style: &SegmentStyle,
    x: f64,
    y: f64,
) -> f64 {
    let lh = ctx.line_height();
    let column = pair_column_width(ctx);
    let right_x = x + column + PAIR_GAP;

    let mut y = y + style.before;
    canvas.draw_cell(x, y, column, lh, PAIR_HEADERS.0, &ctx.label_font(), TextAlign::Left);
    canvas.draw_cell(right_x, y, column, lh, PAIR_HEADERS.1, &ctx.label_font(), TextAlign::Left);
    y += lh + style.item_gap;

    for (left, right) in pair_rows(ctx, segment) {
        let height = pair_cell_height(ctx, &*canvas, left).max(pair_cell_height(ctx, &*canvas, right));
        draw_pair_cell(ctx, canvas, left, x, y);
        draw_pair_cell(ctx, canvas, right, right_x, y);
        y += height + style.item_gap;
    }
    y + style.after
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::font::FontContext;
    use crate::image_loader::{ImagePixelData, LoadedImage};
    use crate::layout::{DrawCommand, PageCanvas, RenderMode};
    use crate::model::PaperConfig;

    fn setup() -> (LayoutContext, PageCanvas) {
        setup_in(RenderMode::QuestionPaper)
    }

    fn setup_in(mode: RenderMode) -> (LayoutContext, PageCanvas) {
        let config = PaperConfig::new("School", "Sub", "Exam").unwrap();
        let ctx = LayoutContext::new(&config, mode);
        let mut canvas = PageCanvas::new(FontContext::new(), 210.0, 297.0);
        canvas.new_page();
        (ctx, canvas)
    }

    fn figure(width_px: u32, height_px: u32) -> Segment {
        Segment::Image(Arc::new(LoadedImage {
            pixel_data: ImagePixelData::Decoded {
                rgb: vec![0; (width_px * height_px * 3) as usize],
                alpha: None,
            },
            width_px,
            height_px,
        }))
    }

    fn capitals() -> Segment {
        let pair = |k: &str, v: &str| (k.to_string(), v.to_string());
        Segment::MatchPairs {
            left: vec![pair("A", "France"), pair("B", "Italy"), pair("C", "Peru")],
            right: vec![pair("1", "Italy"), pair("2", "France")],
        }
    }

    fn every_kind() -> Vec<Segment> {
        vec![
            Segment::PlainText("Which of the following is correct about the water cycle?".into()),
            Segment::Statement("Evaporation happens only at the boiling point.".into()),
            Segment::StatementList(vec!["I. Plants need light.".into(), "II. Roots absorb water and minerals from the soil.".into()]),
            Segment::Sequence(vec!["Seed".into(), "Sapling".into(), "Tree".into()]),
            Segment::Paragraph("A long passage about photosynthesis that wraps over several lines in a narrow column of text.".into()),
            Segment::MatchTable {
                left: vec!["Lion".into(), "Cow".into(), "Eagle".into()],
                right: vec!["Herbivore".into(), "Carnivore".into()],
            },
            figure(40, 30),
            Segment::Blank {
                text: "The chemical symbol for sodium is ___ and for potassium is ___.".into(),
                answer: Some("Na".into()),
            },
            capitals(),
        ]
    }

    #[test]
    fn table_is_indexed_by_kind() {
        for segment in every_kind() {
            let style = ops(segment.kind()).style;
            match segment.kind() {
                SegmentKind::PlainText => assert_eq!(style.indent, 0.0),
                SegmentKind::Statement => assert_eq!(style.label, Some("Statement:")),
                SegmentKind::MatchTable => assert_eq!(style.after, 3.0),
                SegmentKind::Image | SegmentKind::Blank | SegmentKind::MatchPairs => {
                    assert_eq!(style.indent, 0.0);
                    assert_eq!(style.after, 2.0);
                }
                _ => assert_eq!(style.indent, 5.0),
            }
        }
    }

    #[test]
    fn measure_matches_draw() {
        for mode in [RenderMode::QuestionPaper, RenderMode::AnswerKey] {
            let (ctx, mut canvas) = setup_in(mode);
            for segment in every_kind() {
                let measured = measure(&ctx, &canvas, &segment);
                let end = draw(&ctx, &mut canvas, &segment, 21.0, 40.0);
                assert!(
                    (end - 40.0 - measured).abs() < 1e-9,
                    "{:?} in {:?}: measured {} drew {}",
                    segment.kind(),
                    mode,
                    measured,
                    end - 40.0
                );
            }
        }
    }

    #[test]
    fn figure_spans_the_stem_width() {
        let (ctx, mut canvas) = setup();
        let end = draw(&ctx, &mut canvas, &figure(200, 100), 21.0, 40.0);
        let element = &canvas.pages()[0].elements[0];
        assert!(matches!(element.draw, DrawCommand::Image { .. }));
        assert_eq!((element.x, element.y), (21.0, 42.0));
        assert_eq!(element.width, ctx.geometry.question_width);
        assert_eq!(element.height, ctx.geometry.question_width / 2.0);
        assert_eq!(end, 42.0 + element.height + 2.0);
    }

    #[test]
    fn blank_is_filled_only_in_the_answer_key() {
        let segment = Segment::Blank {
            text: "Water boils at ___ C.".into(),
            answer: Some("100".into()),
        };
        let (ctx, mut canvas) = setup();
        draw(&ctx, &mut canvas, &segment, 21.0, 40.0);
        assert_eq!(canvas.pages()[0].text(), "Water boils at ___ C.");

        let (ctx, mut canvas) = setup_in(RenderMode::AnswerKey);
        draw(&ctx, &mut canvas, &segment, 21.0, 40.0);
        assert_eq!(canvas.pages()[0].text(), "Water boils at 100 C.");
    }

    #[test]
    fn pairs_list_both_sides_in_the_question_paper() {
        let (ctx, mut canvas) = setup();
        draw(&ctx, &mut canvas, &capitals(), 21.0, 40.0);
        let text = canvas.pages()[0].text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(&lines[..2], &["Column A", "Column B"]);
        assert_eq!(&lines[2..6], &["A. ", "France", "1. ", "Italy"]);
        // The third item has no numbered entry beside it
        assert_eq!(&lines[10..], &["C. ", "Peru"]);
    }

    #[test]
    fn pairs_are_matched_in_the_answer_key() {
        let (ctx, mut canvas) = setup_in(RenderMode::AnswerKey);
        draw(&ctx, &mut canvas, &capitals(), 21.0, 40.0);
        let text = canvas.pages()[0].text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(&lines[2..6], &["A. ", "France", "2. ", "France"]);
        assert_eq!(&lines[6..10], &["B. ", "Italy", "1. ", "Italy"]);
        assert_eq!(&lines[10..], &["C. ", "Peru", "?. "]);
    }

    #[test]
    fn uneven_match_table_has_a_row_per_longest_side() {
        let (ctx, mut canvas) = setup();
        let segment = Segment::MatchTable {
            left: (1..=5).map(|i| format!("Left {}", i)).collect(),
            right: (1..=3).map(|i| format!("Right {}", i)).collect(),
        };
        draw(&ctx, &mut canvas, &segment, 21.0, 40.0);
        let dashes = canvas.pages()[0].text().matches('-').count();
        assert_eq!(dashes, 5);
    }

    #[test]
    fn statement_label_is_bold() {
        let (ctx, mut canvas) = setup();
        draw(&ctx, &mut canvas, &Segment::Statement("x".into()), 21.0, 40.0);
        let label = &canvas.pages()[0].elements[0];
        match &label.draw {
            crate::layout::DrawCommand::Text { text, font, .. } => {
                assert_eq!(text, "Statement:");
                assert!(font.bold);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
