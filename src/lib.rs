//! # Forme Exam
//!
//! A page-native renderer for two-column exam papers: multiple choice, or
//! mixed with answer-writing, fill-in-the-blank and match-the-following
//! sections.
//!
//! Every question is measured in full before a single mark is drawn, and
//! placed only where it fits whole: in the current column, at the top of the
//! right column, or on a fresh page. Options never split across a page turn
//! and a section title never sits alone at the foot of a column.
//!
//! ## Architecture
//!
//! ```text
//! Question bank (JSON)
//!       ↓
//!   [model]    - Sections, questions, typed stem segments, paper config
//!       ↓
//!   [sets]     - Per-set shuffling and the consolidated answer key
//!       ↓
//!   [layout]   - Measure, place, draw onto LayoutPages
//!       ↓
//!   [booklet]  - Booklet page order and 2-up sheets
//!       ↓
//!   [pdf]      - Serialize to PDF bytes
//! ```

pub mod booklet;
pub mod error;
pub mod font;
pub mod image_loader;
pub mod layout;
pub mod model;
pub mod pdf;
pub mod sets;
pub mod style;
pub mod text;

pub use error::ExamError;

use rand::rngs::StdRng;

use font::{FontContext, FontRegistry};
use layout::frame::PageFrame;
use layout::{LayoutContext, LayoutPage, PageCanvas, RenderMode, RenderSummary, SectionFlowController};
use model::{PaperConfig, PaperFormat, Section};
use pdf::{Metadata, PdfWriter};
use sets::SetAnswers;

/// One laid-out render pass, ready to serialize.
pub struct RenderedPaper {
    pub pages: Vec<LayoutPage>,
    pub fonts: FontContext,
    pub summary: RenderSummary,
    pub metadata: Metadata,
}

impl RenderedPaper {
    pub fn to_pdf(&self) -> Result<Vec<u8>, ExamError> {
        PdfWriter::new().write(&self.pages, &self.metadata, &self.fonts)
    }

    /// Reorder into booklet order and put two pages on each sheet. Sheets
    /// are twice as wide as the laid-out pages, so only an A4 layout gives
    /// A3 landscape sheets. [`render_booklet`] always lays out at A4.
    pub fn into_booklet(self, config: &PaperConfig) -> RenderedPaper {
        let ctx = LayoutContext::new(config, RenderMode::QuestionPaper);
        let (pages, fonts) = booklet::impose_booklet(self.pages, self.fonts, &ctx);
        RenderedPaper {
            pages: booklet::two_up(pages),
            fonts,
            summary: self.summary,
            metadata: self.metadata,
        }
    }
}

/// Every file one set produces.
pub struct SetOutput {
    pub name: String,
    pub question_paper: Vec<u8>,
    pub answer_key: Vec<u8>,
    pub booklet: Vec<u8>,
    pub answers: SetAnswers,
    pub summary: RenderSummary,
}

/// The font context a config asks for.
pub fn load_fonts(config: &PaperConfig) -> FontContext {
    let registry = match &config.font_dir {
        Some(dir) => FontRegistry::with_font_dir(dir),
        None => FontRegistry::new(),
    };
    FontContext::with_registry(registry)
}

/// Lay out `sections` as set `set_name` in `mode`, using `fonts`.
pub fn render_paper_with_fonts(
    config: &PaperConfig,
    sections: &[Section],
    set_name: &str,
    mode: RenderMode,
    fonts: FontContext,
) -> Result<RenderedPaper, ExamError> {
    config.validate()?;
    if sections.is_empty() {
        return Err(ExamError::config("A paper needs at least one section"));
    }
    model::paper_marks(sections)?;

    let ctx = LayoutContext::new(config, mode);
    let question_count = sections.iter().map(|s| s.selected().len()).sum();
    let frame = PageFrame::new(&ctx, config, set_name, question_count);
    let mut canvas = PageCanvas::new(fonts, ctx.geometry.width, ctx.geometry.height);
    let summary = SectionFlowController::new(&ctx, frame).run(&mut canvas, sections);
    let (pages, fonts) = canvas.into_parts();

    let title = match mode {
        RenderMode::QuestionPaper => format!("{} (Set {})", config.exam_title, set_name),
        RenderMode::AnswerKey => format!("{} (Set {}) - Answer Key", config.exam_title, set_name),
    };
    Ok(RenderedPaper {
        pages,
        fonts,
        summary,
        metadata: Metadata {
            title: Some(title),
            author: Some(config.title.clone()),
            subject: Some(config.subtitle.clone()),
        },
    })
}

/// Lay out `sections` with the fonts named by `config`.
pub fn render_paper(
    config: &PaperConfig,
    sections: &[Section],
    set_name: &str,
    mode: RenderMode,
) -> Result<RenderedPaper, ExamError> {
    render_paper_with_fonts(config, sections, set_name, mode, load_fonts(config))
}

/// Lay out the question paper at A4 whatever `config.format` says, then
/// impose it as a booklet of A3 landscape sheets (420 x 297 mm).
pub fn render_booklet(
    config: &PaperConfig,
    sections: &[Section],
    set_name: &str,
    fonts: FontContext,
) -> Result<RenderedPaper, ExamError> {
    let a4 = config.clone().with_format(PaperFormat::A4);
    let paper = render_paper_with_fonts(&a4, sections, set_name, RenderMode::QuestionPaper, fonts)?;
    Ok(paper.into_booklet(&a4))
}

/// Render a question bank given as JSON to the PDF bytes of one
/// unshuffled question paper.
pub fn render_json(json: &str, config: &PaperConfig) -> Result<Vec<u8>, ExamError> {
    let sections = model::load_sections(json)?;
    render_paper(config, &sections, "A", RenderMode::QuestionPaper)?.to_pdf()
}

/// Produce the question paper, answer key and booklet of one set.
///
/// With an RNG the set's choices and questions are shuffled first; without
/// one the bank's order is kept. Both passes share the same shuffled data.
pub fn build_set(
    config: &PaperConfig,
    sections: &[Section],
    name: &str,
    rng: Option<&mut StdRng>,
) -> Result<SetOutput, ExamError> {
    let shuffled;
    let sections = match rng {
        Some(rng) => {
            shuffled = sets::shuffle_sections(sections, rng);
            shuffled.as_slice()
        }
        None => sections,
    };

    let fonts = load_fonts(config);
    let booklet = if config.format == PaperFormat::A4 {
        None
    } else {
        Some(render_booklet(config, sections, name, fonts.clone())?)
    };
    let paper = render_paper_with_fonts(config, sections, name, RenderMode::QuestionPaper, fonts.clone())?;
    let answers_pass = render_paper_with_fonts(config, sections, name, RenderMode::AnswerKey, fonts)?;

    let question_paper = paper.to_pdf()?;
    let answer_key = answers_pass.to_pdf()?;
    let summary = paper.summary.clone();
    // An A4 question paper already is the booklet's source
    let booklet = match booklet {
        Some(booklet) => booklet,
        None => paper.into_booklet(config),
    }
    .to_pdf()?;

    Ok(SetOutput {
        name: name.to_string(),
        question_paper,
        answer_key,
        booklet,
        answers: SetAnswers::from_sections(sections),
        summary,
    })
}
