//! Page geometry and the flow cursor.
//!
//! The cursor is the only mutable layout state of a render pass. It knows
//! which column and page it is on and how much vertical room is left, and it
//! moves only when the placement engine tells it to.

use crate::model::PaperFormat;
use crate::style::Spacing;

/// Left margin of the left column.
pub const LEFT_MARGIN: f64 = 10.0;
/// Column top on every page after the first.
pub const SUBSEQUENT_COLUMN_TOP: f64 = 20.0;
/// Gap between the first-page header and the column top.
pub const FIRST_PAGE_TOP_GAP: f64 = 5.0;
/// Distance of the footer rule from the bottom edge.
pub const FOOTER_HEIGHT: f64 = 12.0;
/// Room kept free above the footer rule.
pub const FOOTER_RESERVE: f64 = 5.0;

/// Static measurements of a two-column page, in layout units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f64,
    pub height: f64,
    pub column_width: f64,
    pub number_width: f64,
    /// Stem text width, right of the number gutter.
    pub question_width: f64,
    pub options_width: f64,
    pub option_gap: f64,
}

impl PageGeometry {
    pub fn new(format: PaperFormat, spacing: &Spacing) -> Self {
        let (width, height) = format.dimensions();
        let column_width = width / 2.0 - spacing.column_spacing;
        Self {
            width,
            height,
            column_width,
            number_width: spacing.question_number_width,
            question_width: column_width - spacing.question_number_width - 1.0,
            options_width: column_width - spacing.question_number_width - 3.0,
            option_gap: spacing.option_column_gap,
        }
    }

    pub fn column_x(&self, column: Column) -> f64 {
        match column {
            Column::Left => LEFT_MARGIN,
            Column::Right => self.width / 2.0 + 2.0,
        }
    }

    /// Y of the footer rule.
    pub fn footer_y(&self) -> f64 {
        self.height - FOOTER_HEIGHT
    }

    /// Lowest Y content may reach.
    pub fn column_bottom(&self) -> f64 {
        self.footer_y() - FOOTER_RESERVE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Left,
    Right,
}

/// How the cursor moved when content did not fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Column,
    Page,
}

/// Current write position plus column and page state.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowCursor {
    geometry: PageGeometry,
    column: Column,
    y: f64,
    page: usize,
    first_page_offset: f64,
}

impl FlowCursor {
    /// A cursor at the top of the left column of page 1, whose header ends
    /// at `first_page_offset`.
    pub fn new(geometry: PageGeometry, first_page_offset: f64) -> Self {
        Self {
            geometry,
            column: Column::Left,
            y: first_page_offset + FIRST_PAGE_TOP_GAP,
            page: 1,
            first_page_offset,
        }
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn column(&self) -> Column {
        self.column
    }

    pub fn x(&self) -> f64 {
        self.geometry.column_x(self.column)
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn page(&self) -> usize {
        self.page
    }

    /// Column top on the current page. Page 1 starts below its taller
    /// header, on both columns.
    pub fn column_top(&self) -> f64 {
        if self.page == 1 {
            self.first_page_offset + FIRST_PAGE_TOP_GAP
        } else {
            SUBSEQUENT_COLUMN_TOP
        }
    }

    /// Room left below the cursor in the current column.
    pub fn available_space(&self) -> f64 {
        self.geometry.column_bottom() - self.y
    }

    /// Full height of an empty column on the current page.
    pub fn column_capacity(&self) -> f64 {
        self.geometry.column_bottom() - self.column_top()
    }

    pub fn at_column_top(&self) -> bool {
        (self.y - self.column_top()).abs() < 1e-6
    }

    /// Whether this is the top of a fresh page's left column, where no
    /// further move can gain room.
    pub fn at_fresh_page(&self) -> bool {
        self.page > 1 && self.column == Column::Left && self.at_column_top()
    }

    /// Move to the right column if its full height holds `required`,
    /// otherwise to a new page.
    pub fn advance_column_or_page(&mut self, required: f64) -> Advance {
        if self.column == Column::Left && self.column_capacity() >= required {
            self.switch_to_right();
            Advance::Column
        } else {
            self.start_new_page();
            Advance::Page
        }
    }

    pub fn switch_to_right(&mut self) {
        self.column = Column::Right;
        self.y = self.column_top();
    }

    pub fn start_new_page(&mut self) {
        self.page += 1;
        self.column = Column::Left;
        self.y = self.column_top();
    }

    pub fn advance_by(&mut self, dy: f64) {
        self.y += dy;
    }

    pub fn set_y(&mut self, y: f64) {
        self.y = y;
    }
}
