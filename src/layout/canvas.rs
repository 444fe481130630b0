//! The drawing surface the layout engine writes to.
//!
//! [`Canvas`] is the capability boundary between layout and output: it can
//! measure a string, draw wrapped text, cells, rules and images, and start
//! pages. [`PageCanvas`] records everything into [`LayoutPage`]s which the
//! PDF writer serializes later.

use std::sync::Arc;

use super::{ContentRef, DrawCommand, LayoutElement, LayoutPage};
use crate::font::FontContext;
use crate::image_loader::LoadedImage;
use crate::style::{Color, FontSpec, TextAlign};
use crate::text::{wrap_lines, TextMeasure};

/// Points to millimetres.
const PT_TO_MM: f64 = 25.4 / 72.0;

pub trait Canvas: TextMeasure {
    /// (width, height) of the active paper format.
    fn page_size(&self) -> (f64, f64);

    fn new_page(&mut self);

    /// 1-based number of the page being drawn. 0 before the first page.
    fn current_page_number(&self) -> usize;

    /// Tag subsequent elements with the content they belong to.
    fn set_source(&mut self, source: Option<ContentRef>);

    fn set_text_color(&mut self, color: Color);

    fn set_draw_color(&mut self, color: Color);

    /// Draw `text` wrapped at `width`, one line every `line_height`.
    /// Returns the Y below the last line.
    #[allow(clippy::too_many_arguments)]
    fn draw_text(
        &mut self,
        x: f64,
        y: f64,
        width: f64,
        line_height: f64,
        text: &str,
        font: &FontSpec,
        align: TextAlign,
    ) -> f64;

    /// Draw a single unwrapped line of text inside a cell.
    #[allow(clippy::too_many_arguments)]
    fn draw_cell(
        &mut self,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        text: &str,
        font: &FontSpec,
        align: TextAlign,
    );

    fn draw_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64);

    /// Draw `image` stretched to the given box.
    fn draw_image(&mut self, x: f64, y: f64, width: f64, height: f64, image: &Arc<LoadedImage>);
}

/// Records drawing commands into pages.
pub struct PageCanvas {
    fonts: FontContext,
    width: f64,
    height: f64,
    pages: Vec<LayoutPage>,
    source: Option<ContentRef>,
    text_color: Color,
    draw_color: Color,
    line_thickness: f64,
}

impl PageCanvas {
    pub fn new(fonts: FontContext, width: f64, height: f64) -> Self {
        Self {
            fonts,
            width,
            height,
            pages: Vec::new(),
            source: None,
            text_color: Color::BLACK,
            draw_color: Color::BLACK,
            line_thickness: 0.2,
        }
    }

    pub fn fonts(&self) -> &FontContext {
        &self.fonts
    }

    pub fn pages(&self) -> &[LayoutPage] {
        &self.pages
    }

    pub fn into_parts(self) -> (Vec<LayoutPage>, FontContext) {
        (self.pages, self.fonts)
    }

    fn push(&mut self, element: LayoutElement) {
        if self.pages.is_empty() {
            self.new_page();
        }
        if let Some(page) = self.pages.last_mut() {
            page.elements.push(element);
        }
    }

    fn push_text(&mut self, x: f64, y: f64, width: f64, height: f64, text: &str, font: &FontSpec) {
        let element = LayoutElement {
            x,
            y,
            width,
            height,
            draw: DrawCommand::Text {
                text: text.to_string(),
                font: *font,
                color: self.text_color,
            },
            source: self.source,
        };
        self.push(element);
    }
}

impl TextMeasure for PageCanvas {
    fn measure_width(&self, text: &str, font: &FontSpec) -> f64 {
        self.fonts
            .measure_string(text, font.family, font.weight(), font.italic, font.size)
            * PT_TO_MM
    }
}

fn aligned_x(x: f64, width: f64, text_width: f64, align: TextAlign) -> f64 {
    match align {
        TextAlign::Left => x,
        TextAlign::Center => x + (width - text_width) / 2.0,
        TextAlign::Right => x + width - text_width,
    }
}

impl Canvas for PageCanvas {
    fn page_size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn new_page(&mut self) {
        self.pages.push(LayoutPage::new(self.width, self.height));
    }

    fn current_page_number(&self) -> usize {
        self.pages.len()
    }

    fn set_source(&mut self, source: Option<ContentRef>) {
        self.source = source;
    }

    fn set_text_color(&mut self, color: Color) {
        self.text_color = color;
    }

    fn set_draw_color(&mut self, color: Color) {
        self.draw_color = color;
    }

    fn draw_text(
        &mut self,
        x: f64,
        y: f64,
        width: f64,
        line_height: f64,
        text: &str,
        font: &FontSpec,
        align: TextAlign,
    ) -> f64 {
        let lines = wrap_lines(text, width, |s| self.measure_width(s, font));
        let mut line_y = y;
        for line in &lines {
            let line_width = self.measure_width(line, font);
            let line_x = aligned_x(x, width, line_width, align);
            if !line.is_empty() {
                self.push_text(line_x, line_y, line_width, line_height, line, font);
            }
            line_y += line_height;
        }
        line_y
    }

    fn draw_cell(
        &mut self,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        text: &str,
        font: &FontSpec,
        align: TextAlign,
    ) {
        if text.is_empty() {
            return;
        }
        let text_width = self.measure_width(text, font);
        let cell_x = aligned_x(x, width, text_width, align);
        self.push_text(cell_x, y, text_width, height, text, font);
    }

    fn draw_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
        let element = LayoutElement {
            x: x1,
            y: y1,
            width: x2 - x1,
            height: y2 - y1,
            draw: DrawCommand::Line {
                color: self.draw_color,
                thickness: self.line_thickness,
            },
            source: self.source,
        };
        self.push(element);
    }

    fn draw_image(&mut self, x: f64, y: f64, width: f64, height: f64, image: &Arc<LoadedImage>) {
        let element = LayoutElement {
            x,
            y,
            width,
            height,
            draw: DrawCommand::Image {
                image: Arc::clone(image),
            },
            source: self.source,
        };
        self.push(element);
    }
}
