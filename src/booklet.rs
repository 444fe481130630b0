//! # Booklet Imposition
//!
//! Reorders a finished paper so that, printed double-sided and folded, the
//! sheets read in page order. Works on [`LayoutPage`]s in memory, before
//! serialization.
//!
//! A paper whose page count isn't a multiple of four is padded with pages
//! left for rough work. The padding is drawn with the same frame as the
//! rest of the paper so every page still carries its number.

use crate::font::FontContext;
use crate::layout::frame::draw_blank_page;
use crate::layout::{Canvas, LayoutContext, LayoutPage, PageCanvas};

/// Page order for a saddle-stitched booklet of `page_count` pages.
///
/// The count is padded to a multiple of four. Each sheet side holds
/// `[last, first]` on the front and `[second, second-last]` on the back.
pub fn booklet_order(page_count: usize) -> Vec<usize> {
    let padded = page_count.div_ceil(4) * 4;
    let mut order = Vec::with_capacity(padded);
    for i in (0..padded / 2).step_by(2) {
        order.extend([padded - i - 1, i, i + 1, padded - i - 2]);
    }
    order
}

/// Arrange `pages` in booklet order, substituting blank rough-work pages
/// for indices past the end.
///
/// The font context is moved through so the blank pages measure with the
/// same fonts as the paper, and handed back for serialization.
pub fn impose_booklet(
    pages: Vec<LayoutPage>,
    fonts: FontContext,
    ctx: &LayoutContext,
) -> (Vec<LayoutPage>, FontContext) {
    let count = pages.len();
    let order = booklet_order(count);

    let mut canvas = PageCanvas::new(fonts, ctx.geometry.width, ctx.geometry.height);
    for index in count..order.len() {
        log::warn!(
            "Booklet page {} is past the end of a {}-page paper; using a blank page",
            index + 1,
            count
        );
        canvas.new_page();
        draw_blank_page(ctx, &mut canvas, index + 1);
    }
    let (blanks, fonts) = canvas.into_parts();

    let mut slots: Vec<Option<LayoutPage>> = pages.into_iter().chain(blanks).map(Some).collect();
    let ordered = order
        .iter()
        .filter_map(|&i| slots.get_mut(i).and_then(Option::take))
        .collect();
    (ordered, fonts)
}

/// Place consecutive pages side by side on landscape sheets twice as wide.
pub fn two_up(pages: Vec<LayoutPage>) -> Vec<LayoutPage> {
    let mut sheets = Vec::with_capacity(pages.len().div_ceil(2));
    let mut iter = pages.into_iter();
    while let Some(left) = iter.next() {
        let mut sheet = LayoutPage::new(left.width * 2.0, left.height);
        let offset = left.width;
        sheet.elements = left.elements;
        if let Some(right) = iter.next() {
            sheet.elements.extend(right.elements.into_iter().map(|mut e| {
                e.x += offset;
                e
            }));
        }
        sheets.push(sheet);
    }
    sheets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::frame::BLANK_PAGE_TEXT;
    use crate::layout::RenderMode;
    use crate::model::PaperConfig;

    fn numbered_pages(n: usize) -> Vec<LayoutPage> {
        let mut canvas = PageCanvas::new(FontContext::new(), 210.0, 297.0);
        let config = PaperConfig::new("School", "Sub", "Exam").unwrap();
        let ctx = LayoutContext::new(&config, RenderMode::QuestionPaper);
        for page in 1..=n {
            canvas.new_page();
            crate::layout::frame::draw_footer(&ctx, &mut canvas, page);
        }
        canvas.into_parts().0
    }

    #[test]
    fn order_for_four_and_eight() {
        assert_eq!(booklet_order(4), vec![3, 0, 1, 2]);
        assert_eq!(booklet_order(8), vec![7, 0, 1, 6, 5, 2, 3, 4]);
    }

    #[test]
    fn order_pads_to_multiple_of_four() {
        let order = booklet_order(5);
        assert_eq!(order.len(), 8);
        let mut sorted = order.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..8).collect::<Vec<_>>());
        assert!(booklet_order(0).is_empty());
    }

    #[test]
    fn missing_pages_become_blank() {
        let config = PaperConfig::new("School", "Sub", "Exam").unwrap();
        let ctx = LayoutContext::new(&config, RenderMode::QuestionPaper);
        let (pages, _) = impose_booklet(numbered_pages(2), FontContext::new(), &ctx);

        assert_eq!(pages.len(), 4);
        // [3, 0, 1, 2]: index 3 and 2 are padding
        assert!(pages[0].text().contains(BLANK_PAGE_TEXT));
        assert!(pages[0].text().contains("Page 4"));
        assert!(pages[1].text().contains("Page 1"));
        assert!(pages[2].text().contains("Page 2"));
        assert!(pages[3].text().contains("Page 3"));
    }

    #[test]
    fn two_up_shifts_right_page() {
        let sheets = two_up(numbered_pages(3));
        assert_eq!(sheets.len(), 2);
        assert_eq!((sheets[0].width, sheets[0].height), (420.0, 297.0));
        assert!(sheets[0].elements.iter().any(|e| e.x >= 210.0));
        assert!(sheets[1].elements.iter().all(|e| e.x < 210.0));
    }
}
