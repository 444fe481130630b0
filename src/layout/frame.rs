//! Page furniture: the first-page header, running headers, footers and the
//! centre divider between the columns.

use super::{Canvas, ContentRef, LayoutContext};
use crate::model::PaperConfig;
use crate::style::{Color, FontSpec, TextAlign, BODY_FAMILY, DISPLAY_FAMILY};

const MARGIN: f64 = 10.0;
const TITLE_Y: f64 = 7.0;
const TITLE_CELL: f64 = 10.0;
const MIN_TITLE_SIZE: f64 = 16.0;
const RUNNING_HEADER_Y: f64 = 5.0;
/// Student info labels, instructions and the questions/duration table.
const INFO_FONT_SIZE: f64 = 10.0;
const FIELD_SPACING: f64 = 10.0;
const FIELD_LINE_OFFSET: f64 = 3.0;
const CLASS_LINE_LENGTH: f64 = 25.0;
const SET_NAME_SIZE: f64 = 28.0;

pub const BLANK_PAGE_TEXT: &str = "Empty page for rough work";

const INSTRUCTIONS: [&str; 4] = [
    "Fill OMR sheet with blue/black pen.",
    "Fill circles completely.",
    "No stray marks.",
    "Enter Name, Class, Section.",
];

/// Draws the frame of every page of one paper.
pub struct PageFrame<'a> {
    ctx: &'a LayoutContext,
    config: &'a PaperConfig,
    set_name: &'a str,
    question_count: usize,
}

impl<'a> PageFrame<'a> {
    pub fn new(
        ctx: &'a LayoutContext,
        config: &'a PaperConfig,
        set_name: &'a str,
        question_count: usize,
    ) -> Self {
        Self {
            ctx,
            config,
            set_name,
            question_count,
        }
    }

    /// Draw the first page's header, divider and footer. Returns the Y at
    /// which the header ends.
    pub fn first_page(&self, canvas: &mut dyn Canvas) -> f64 {
        let ctx = self.ctx;
        let (w, h) = canvas.page_size();
        canvas.set_source(Some(ContentRef::PageFrame));

        let title_size = fitted_title_size(canvas, &self.config.title, w - 2.0 * MARGIN, ctx.fonts.title);
        let rows = [
            (self.config.title.clone(), FontSpec::bold(DISPLAY_FAMILY, title_size)),
            (self.config.subtitle.clone(), FontSpec::bold(DISPLAY_FAMILY, ctx.fonts.subtitle)),
            (self.exam_title(" (ANSWERS)"), FontSpec::italic(BODY_FAMILY, ctx.fonts.exam_title)),
        ];
        let mut y = TITLE_Y;
        for (text, font) in &rows {
            canvas.draw_cell(MARGIN, y, w - 2.0 * MARGIN, TITLE_CELL, text, font, TextAlign::Center);
            y += TITLE_CELL;
        }

        let first_line_y = y + 1.0;
        canvas.draw_line(MARGIN, first_line_y, w - MARGIN, first_line_y);

        let second_line_y = if self.config.show_student_info {
            let split_end = self.student_info(canvas, first_line_y);
            canvas.draw_line(w / 2.0, first_line_y, w / 2.0, split_end + 2.0);
            split_end + 2.0
        } else {
            first_line_y + 1.0
        };
        canvas.draw_line(MARGIN, second_line_y, w - MARGIN, second_line_y);

        let set_y = second_line_y + 1.0;
        let third_line_y = set_y + 10.0 + 1.0;
        self.set_row(canvas, set_y);

        canvas.draw_line(MARGIN, third_line_y, w - MARGIN, third_line_y);
        canvas.draw_line(MARGIN, third_line_y + 1.0, w - MARGIN, third_line_y + 1.0);
        canvas.draw_line(w / 2.0, third_line_y, w / 2.0, h - 12.0);
        self.footer(canvas, 1);
        canvas.set_source(None);

        third_line_y + 1.0
    }

    /// Running header for pages after the first. Titles swap sides on odd
    /// page numbers.
    pub fn subsequent_page(&self, canvas: &mut dyn Canvas, page: usize) {
        let (w, h) = canvas.page_size();
        canvas.set_source(Some(ContentRef::PageFrame));

        let font = FontSpec::bold(BODY_FAMILY, self.ctx.fonts.header);
        let exam = self.exam_title(" - Answer Key");
        let school = self.config.title.as_str();
        let (left, right) = if page % 2 != 0 {
            (school, exam.as_str())
        } else {
            (exam.as_str(), school)
        };
        let cell_w = w / 2.0 - 15.0;
        canvas.draw_cell(MARGIN, RUNNING_HEADER_Y, cell_w, 10.0, left, &font, TextAlign::Left);
        canvas.draw_cell(w / 2.0 + 5.0, RUNNING_HEADER_Y, cell_w, 10.0, right, &font, TextAlign::Right);

        let rule_y = RUNNING_HEADER_Y + 10.0;
        canvas.draw_line(MARGIN, rule_y, w - MARGIN, rule_y);
        canvas.draw_line(w / 2.0, rule_y, w / 2.0, h - 12.0);
        self.footer(canvas, page);
        canvas.set_source(None);
    }

    pub fn footer(&self, canvas: &mut dyn Canvas, page: usize) {
        draw_footer(self.ctx, canvas, page);
    }

    fn exam_title(&self, answer_suffix: &str) -> String {
        if self.ctx.answer_key() {
            format!("{}{}", self.config.exam_title, answer_suffix)
        } else {
            self.config.exam_title.clone()
        }
    }

    /// Name/class/roll fields on the left, instructions on the right.
    /// Returns the lower of the two halves' bottoms.
    fn student_info(&self, canvas: &mut dyn Canvas, first_line_y: f64) -> f64 {
        let (w, _) = canvas.page_size();
        let label_font = FontSpec::regular(BODY_FAMILY, INFO_FONT_SIZE);
        let field_end = w / 2.0 - 5.0;
        let start_y = first_line_y + 5.0;
        let x = 12.0;

        canvas.set_draw_color(Color::LIGHT_GREY);
        info_field(canvas, &label_font, x, start_y, "Name:", Some(field_end));
        let class_y = start_y + FIELD_SPACING;
        let class_end = info_field(canvas, &label_font, x, class_y, "Class:", None);
        info_field(canvas, &label_font, class_end + 5.0, class_y, "Section:", Some(field_end));
        let roll_y = class_y + FIELD_SPACING;
        info_field(canvas, &label_font, x, roll_y, "Roll no.:", Some(field_end));
        canvas.set_draw_color(Color::BLACK);
        let student_end = roll_y + 5.0;

        let instructions_x = w / 2.0 + 5.0;
        let instructions_w = w / 2.0 - 15.0;
        let mut y = start_y - 2.0;
        canvas.draw_cell(
            instructions_x,
            y,
            instructions_w,
            5.0,
            "Instructions:",
            &FontSpec::bold(BODY_FAMILY, INFO_FONT_SIZE),
            TextAlign::Left,
        );
        y += 5.0;
        let bullet_w = canvas.measure_width("\u{2022} ", &label_font);
        for line in INSTRUCTIONS {
            canvas.draw_cell(instructions_x, y, bullet_w, 5.0, "\u{2022}", &label_font, TextAlign::Left);
            y = canvas.draw_text(
                instructions_x + bullet_w,
                y,
                instructions_w - bullet_w - 2.0,
                5.0,
                line,
                &label_font,
                TextAlign::Left,
            ) + 1.0;
        }

        student_end.max(y)
    }

    /// "SET X" on the left and the questions/duration table on the right.
    fn set_row(&self, canvas: &mut dyn Canvas, y: f64) {
        let (w, _) = canvas.page_size();
        let set_font = FontSpec::bold(BODY_FAMILY, self.ctx.fonts.header);
        canvas.draw_cell(MARGIN, y, 7.0, 10.0, "SET", &set_font, TextAlign::Left);
        canvas.draw_cell(
            MARGIN + 7.0,
            y,
            20.0,
            10.0,
            &format!(" {}", self.set_name),
            &FontSpec::bold(DISPLAY_FAMILY, SET_NAME_SIZE),
            TextAlign::Left,
        );

        let label_font = FontSpec::regular(BODY_FAMILY, INFO_FONT_SIZE);
        let value_font = FontSpec::bold(BODY_FAMILY, INFO_FONT_SIZE);
        let rows = [
            ("Questions:", self.question_count.to_string()),
            ("Duration:", self.config.duration.clone()),
        ];
        let label_w = rows
            .iter()
            .map(|(label, _)| canvas.measure_width(label, &label_font))
            .fold(0.0, f64::max)
            + 5.0;
        let table_x = w * 0.78;
        let value_w = (w / 2.0 - 15.0) - label_w;
        for (i, (label, value)) in rows.iter().enumerate() {
            let row_y = y + i as f64 * 5.0;
            canvas.draw_cell(table_x, row_y, label_w, 5.0, label, &label_font, TextAlign::Right);
            canvas.draw_cell(table_x + label_w, row_y, value_w, 5.0, value, &value_font, TextAlign::Left);
        }
    }
}

/// A label followed by a fill-in underline ending at `line_end`, or a
/// fixed-length one. Returns the underline's end.
fn info_field(
    canvas: &mut dyn Canvas,
    font: &FontSpec,
    x: f64,
    y: f64,
    label: &str,
    line_end: Option<f64>,
) -> f64 {
    let label_w = canvas.measure_width(label, font);
    canvas.draw_cell(x, y, label_w, 5.0, label, font, TextAlign::Left);
    let line_start = x + label_w + 2.0;
    let line_end = line_end.unwrap_or(line_start + CLASS_LINE_LENGTH);
    canvas.draw_line(line_start, y + FIELD_LINE_OFFSET, line_end, y + FIELD_LINE_OFFSET);
    line_end
}

/// Largest size from `start` down to the minimum at which `title` fits.
fn fitted_title_size(canvas: &dyn Canvas, title: &str, max_width: f64, start: f64) -> f64 {
    let mut size = start;
    while size > MIN_TITLE_SIZE
        && canvas.measure_width(title, &FontSpec::bold(DISPLAY_FAMILY, size)) > max_width
    {
        size -= 1.0;
    }
    size
}

/// Footer rule and centred "Page N".
pub fn draw_footer(ctx: &LayoutContext, canvas: &mut dyn Canvas, page: usize) {
    let (w, h) = canvas.page_size();
    canvas.draw_line(MARGIN, h - 12.0, w - MARGIN, h - 12.0);
    canvas.draw_cell(
        MARGIN,
        h - 10.0,
        w - 2.0 * MARGIN,
        5.0,
        &format!("Page {}", page),
        &FontSpec::italic(BODY_FAMILY, ctx.fonts.footer),
        TextAlign::Center,
    );
}

/// A page left empty for rough work, numbered `page`.
pub fn draw_blank_page(ctx: &LayoutContext, canvas: &mut dyn Canvas, page: usize) {
    let (w, h) = canvas.page_size();
    canvas.set_source(Some(ContentRef::PageFrame));
    canvas.draw_cell(
        MARGIN,
        RUNNING_HEADER_Y,
        w - 2.0 * MARGIN,
        10.0,
        BLANK_PAGE_TEXT,
        &FontSpec::bold(BODY_FAMILY, ctx.fonts.header),
        TextAlign::Center,
    );
    let rule_y = RUNNING_HEADER_Y + 10.0;
    canvas.draw_line(MARGIN, rule_y, w - MARGIN, rule_y);
    canvas.draw_line(w / 2.0, rule_y, w / 2.0, h - 12.0);
    draw_footer(ctx, canvas, page);
    canvas.set_source(None);
}
