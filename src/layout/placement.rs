//! # Placement Decisions
//!
//! Decides where a measured unit of content goes before anything is drawn.
//! The decision is a bounded loop rather than a recursive retry: at most one
//! column switch and one page break, after which a fresh column is the best
//! the page can offer.

use super::geometry::{Advance, Column, FlowCursor};

/// Retries after the first evaluation: switch column, then break page.
pub const MAX_RETRIES: usize = 2;

/// Outcome of evaluating a required height against the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementDecision {
    /// Draw at the current position.
    Fits,
    /// Move to the top of the right column and evaluate again.
    NeedsColumnSwitch,
    /// Start a new page and evaluate again.
    NeedsPageBreak,
}

/// Where a unit ended up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub page: usize,
    pub column: Column,
    pub y: f64,
    pub retries: usize,
    /// The unit is taller than a fresh column and will run past the
    /// footer reserve.
    pub overflow: bool,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PlacementEngine;

impl PlacementEngine {
    pub fn new() -> Self {
        Self
    }

    /// Classify `required` against the cursor without moving it.
    pub fn evaluate(&self, cursor: &FlowCursor, required: f64) -> PlacementDecision {
        if required <= cursor.available_space() {
            PlacementDecision::Fits
        } else if cursor.column() == Column::Left && cursor.column_capacity() >= required {
            PlacementDecision::NeedsColumnSwitch
        } else {
            PlacementDecision::NeedsPageBreak
        }
    }

    /// Move the cursor until `required` fits, calling `on_new_page` with
    /// the new page number whenever a page is started.
    ///
    /// A unit that cannot fit a fresh column is placed at the top of one
    /// and reported as overflowing.
    pub fn place(
        &self,
        cursor: &mut FlowCursor,
        required: f64,
        on_new_page: &mut dyn FnMut(usize),
    ) -> Placement {
        let mut retries = 0;
        let overflow = loop {
            if self.evaluate(cursor, required) == PlacementDecision::Fits {
                break false;
            }
            if retries == MAX_RETRIES || cursor.at_fresh_page() {
                break true;
            }
            retries += 1;
            match cursor.advance_column_or_page(required) {
                Advance::Column => {
                    log::debug!("Switching to right column on page {}", cursor.page());
                }
                Advance::Page => {
                    log::debug!("Breaking to page {}", cursor.page());
                    on_new_page(cursor.page());
                }
            }
        };

        if overflow {
            log::warn!(
                "Content of height {:.1} exceeds a fresh column ({:.1} available) on page {}; rendering past the footer reserve",
                required,
                cursor.available_space(),
                cursor.page()
            );
        }

        Placement {
            page: cursor.page(),
            column: cursor.column(),
            y: cursor.y(),
            retries,
            overflow,
        }
    }
}
