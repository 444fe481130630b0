//! # Question Bank Model
//!
//! The input representation of an exam paper. A question bank is a list of
//! sections; each section holds questions whose stems are ordered lists of
//! typed segments.
//!
//! Raw JSON is deserialized into the `Raw*` types and then validated into
//! [`Section`] and [`Question`]. Validation fails fast: a bank that loads is
//! a bank that renders.
//!
//! A section's `section_type` picks how its questions are read. Multiple
//! choice is the default. Answer-writing, fill-in-the-blank and match-pairs
//! sections have no choices; their questions carry an image, a blank or a
//! pair table as a stem segment instead, so layout treats every section the
//! same way.

pub mod paper;

pub use paper::{PaperConfig, PaperFormat};

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::ExamError;
use crate::image_loader::{self, LoadedImage};

/// Sentinel strings inside a `question_text` list.
const STATEMENT: &str = "STATEMENT";
const STATEMENTS: &str = "STATEMENTS";
const LIST: &str = "LIST";
const MTF_DATA: &str = "MTF_DATA";
const PARAGRAPH: &str = "PARAGRAPH";

/// Placeholder in fill-in-the-blank text.
pub const BLANK: &str = "___";

// ─── Validated model ────────────────────────────────────────────

/// One typed chunk of a question stem.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    PlainText(String),
    /// A single labelled statement.
    Statement(String),
    /// Several statements, one per line.
    StatementList(Vec<String>),
    /// Items to be put in order. Forces one choice per line.
    Sequence(Vec<String>),
    Paragraph(String),
    /// Match-the-following columns. The columns may differ in length.
    MatchTable { left: Vec<String>, right: Vec<String> },
    /// A figure scaled to the stem width.
    Image(Arc<LoadedImage>),
    /// Text with [`BLANK`] placeholders, filled with `answer` in the
    /// answer key.
    Blank { text: String, answer: Option<String> },
    /// Lettered items to pair with numbered ones, each side sorted by key.
    MatchPairs {
        left: Vec<(String, String)>,
        right: Vec<(String, String)>,
    },
}

/// Discriminant of [`Segment`], used to look up per-kind visual rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    PlainText,
    Statement,
    StatementList,
    Sequence,
    Paragraph,
    MatchTable,
    Image,
    Blank,
    MatchPairs,
}

impl Segment {
    pub fn kind(&self) -> SegmentKind {
        match self {
            Segment::PlainText(_) => SegmentKind::PlainText,
            Segment::Statement(_) => SegmentKind::Statement,
            Segment::StatementList(_) => SegmentKind::StatementList,
            Segment::Sequence(_) => SegmentKind::Sequence,
            Segment::Paragraph(_) => SegmentKind::Paragraph,
            Segment::MatchTable { .. } => SegmentKind::MatchTable,
            Segment::Image(_) => SegmentKind::Image,
            Segment::Blank { .. } => SegmentKind::Blank,
            Segment::MatchPairs { .. } => SegmentKind::MatchPairs,
        }
    }
}

/// The first right-hand entry whose text equals `value`.
pub fn matching_pair<'a>(right: &'a [(String, String)], value: &str) -> Option<&'a (String, String)> {
    right.iter().find(|(_, text)| text == value)
}

/// One assessable item. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub segments: Vec<Segment>,
    pub choices: Vec<String>,
    /// Index into `choices` of the correct answer.
    pub answer: usize,
    pub explanation: Option<String>,
    /// Marks awarded, inherited from the section.
    pub marks: u32,
}

impl Question {
    /// The correct choice's text. `None` for questions without choices.
    pub fn correct_choice(&self) -> Option<&str> {
        self.choices.get(self.answer).map(String::as_str)
    }

    /// What the answer key records for this question: the correct choice,
    /// the blank's answer, or the pairings as "A-2, B-1". Empty for
    /// answer-writing questions.
    pub fn key_answer(&self) -> String {
        if let Some(choice) = self.correct_choice() {
            return choice.to_string();
        }
        self.segments
            .iter()
            .find_map(|segment| match segment {
                Segment::Blank { answer, .. } => answer.clone(),
                Segment::MatchPairs { left, right } => Some(
                    left.iter()
                        .map(|(key, text)| {
                            let matched = matching_pair(right, text).map_or("?", |(k, _)| k.as_str());
                            format!("{}-{}", key, matched)
                        })
                        .collect::<Vec<_>>()
                        .join(", "),
                ),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// A new question with choices permuted by `order`, where `order[i]` is
    /// the original index of the choice placed at position `i`. The correct
    /// answer follows its text.
    pub fn with_choice_order(&self, order: &[usize]) -> Question {
        let choices = order.iter().map(|&i| self.choices[i].clone()).collect();
        let answer = order
            .iter()
            .position(|&i| i == self.answer)
            .unwrap_or(self.answer);
        Question {
            choices,
            answer,
            ..self.clone()
        }
    }

    /// Whether choices must be laid out one per line regardless of width.
    pub fn forces_single_choices(&self) -> bool {
        self.segments
            .iter()
            .any(|s| s.kind() == SegmentKind::Sequence)
    }

    /// Classification by the first specialised segment. A question with
    /// neither choices nor a specialised segment is answer-writing.
    pub fn kind(&self) -> QuestionKind {
        self.segments
            .iter()
            .find_map(|s| match s.kind() {
                SegmentKind::PlainText => None,
                SegmentKind::Statement => Some(QuestionKind::Statement),
                SegmentKind::StatementList => Some(QuestionKind::MultiStatement),
                SegmentKind::Sequence => Some(QuestionKind::List),
                SegmentKind::Paragraph => Some(QuestionKind::Paragraph),
                SegmentKind::MatchTable => Some(QuestionKind::MatchTheFollowing),
                SegmentKind::Image => Some(QuestionKind::AnswerWriting),
                SegmentKind::Blank => Some(QuestionKind::FillBlank),
                SegmentKind::MatchPairs => Some(QuestionKind::MatchPairs),
            })
            .unwrap_or(if self.choices.is_empty() {
                QuestionKind::AnswerWriting
            } else {
                QuestionKind::Standard
            })
    }
}

/// A named group of questions of which the first `required_count` are set.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub name: String,
    pub description: String,
    pub questions: Vec<Question>,
    pub required_count: usize,
    pub marks_per_question: u32,
    pub section_type: SectionType,
}

impl Section {
    /// Build a section, rejecting empty or over-subscribed ones.
    ///
    /// `required_count` of `None` or `Some(0)` means every question.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        questions: Vec<Question>,
        required_count: Option<usize>,
        marks_per_question: u32,
    ) -> Result<Self, ExamError> {
        let name = name.into();
        let description = description.into();
        if name.trim().is_empty() || description.trim().is_empty() {
            return Err(ExamError::config("Section name and description are required"));
        }
        if questions.is_empty() {
            return Err(ExamError::config(format!(
                "Section '{}' must contain at least one question",
                name
            )));
        }
        let required_count = match required_count {
            None | Some(0) => questions.len(),
            Some(n) => n,
        };
        if required_count > questions.len() {
            return Err(ExamError::config(format!(
                "Section '{}': required questions ({}) cannot exceed available questions ({})",
                name,
                required_count,
                questions.len()
            )));
        }
        let total = u32::try_from(required_count)
            .ok()
            .and_then(|n| n.checked_mul(marks_per_question));
        if total.is_none() {
            return Err(ExamError::config(format!(
                "Section '{}': {} questions at {} marks each overflows the marks total",
                name, required_count, marks_per_question
            )));
        }
        let questions = questions
            .into_iter()
            .map(|q| Question {
                marks: marks_per_question,
                ..q
            })
            .collect();
        Ok(Self {
            name,
            description,
            questions,
            required_count,
            marks_per_question,
            section_type: SectionType::default(),
        })
    }

    pub fn with_type(mut self, section_type: SectionType) -> Self {
        self.section_type = section_type;
        self
    }

    /// The questions that will actually be printed.
    pub fn selected(&self) -> &[Question] {
        &self.questions[..self.required_count]
    }

    /// Marks for the printed questions. Fits in `u32` by construction.
    pub fn total_marks(&self) -> u32 {
        self.required_count as u32 * self.marks_per_question
    }

    /// Same section with a new question list of equal length.
    pub fn with_questions(&self, questions: Vec<Question>) -> Section {
        Section {
            questions,
            ..self.clone()
        }
    }
}

/// Marks for a whole paper, rejecting totals that do not fit in `u32`.
pub fn paper_marks(sections: &[Section]) -> Result<u32, ExamError> {
    sections.iter().try_fold(0u32, |total, section| {
        total.checked_add(section.total_marks()).ok_or_else(|| {
            ExamError::config(format!(
                "Total marks overflow when adding section '{}'",
                section.name
            ))
        })
    })
}

/// How a section's questions are answered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SectionType {
    #[default]
    MultipleChoice,
    AnswerWriting,
    FillBlank,
    MatchPairs,
}

impl FromStr for SectionType {
    type Err = ExamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MCQ" => Ok(SectionType::MultipleChoice),
            "AW" => Ok(SectionType::AnswerWriting),
            "FB" => Ok(SectionType::FillBlank),
            "MTF" => Ok(SectionType::MatchPairs),
            other => Err(ExamError::config(format!(
                "Invalid section type '{}'. Must be MCQ, AW, FB, or MTF",
                other
            ))),
        }
    }
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SectionType::MultipleChoice => "MCQ",
            SectionType::AnswerWriting => "AW",
            SectionType::FillBlank => "FB",
            SectionType::MatchPairs => "MTF",
        })
    }
}

/// Question type classification for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum QuestionKind {
    Standard,
    Statement,
    MultiStatement,
    List,
    MatchTheFollowing,
    Paragraph,
    AnswerWriting,
    FillBlank,
    MatchPairs,
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QuestionKind::Standard => "standard-mcq",
            QuestionKind::Statement => "statement-mcq",
            QuestionKind::MultiStatement => "multi-statement-mcq",
            QuestionKind::List => "list-mcq",
            QuestionKind::MatchTheFollowing => "match-the-following",
            QuestionKind::Paragraph => "paragraph-mcq",
            QuestionKind::AnswerWriting => "answer-writing",
            QuestionKind::FillBlank => "fill-in-the-blank",
            QuestionKind::MatchPairs => "match-pairs",
        };
        f.write_str(name)
    }
}

/// Count question kinds across every question in the bank.
pub fn analyze(sections: &[Section]) -> BTreeMap<QuestionKind, usize> {
    let mut counts = BTreeMap::new();
    for question in sections.iter().flat_map(|s| &s.questions) {
        *counts.entry(question.kind()).or_insert(0) += 1;
    }
    counts
}

// ─── Raw JSON input ─────────────────────────────────────────────

/// Top-level question bank document.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionBank {
    pub sections: Vec<RawSection>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSection {
    pub name: String,
    pub description: String,
    pub questions: Vec<RawQuestion>,
    #[serde(default)]
    pub required_questions: Option<usize>,
    #[serde(default)]
    pub marks_per_question: Option<u32>,
    /// "MCQ", "AW", "FB" or "MTF". Multiple choice when absent.
    #[serde(default)]
    pub section_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawQuestion {
    #[serde(alias = "question")]
    pub question_text: QuestionText,
    #[serde(default)]
    pub choices: Vec<String>,
    #[serde(default)]
    pub answer: Option<AnswerRef>,
    #[serde(default)]
    pub reasoning: Option<String>,
    #[serde(default)]
    pub statement: Option<String>,
    #[serde(default)]
    pub statements: Option<Vec<String>>,
    #[serde(default)]
    pub list_items: Option<Vec<String>>,
    #[serde(default)]
    pub mtf_data: Option<MtfData>,
    #[serde(default)]
    pub paragraph: Option<String>,
    /// Figure for an answer-writing question, relative to `questions_data`.
    #[serde(default)]
    pub image: Option<String>,
    /// Letter keys are items, digit keys are what they match.
    #[serde(default)]
    pub match_pairs: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum QuestionText {
    Single(String),
    Segments(Vec<String>),
}

/// The correct answer, as a choice's text or its zero-based index.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AnswerRef {
    Index(usize),
    Text(String),
}

impl fmt::Display for AnswerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerRef::Index(i) => write!(f, "{}", i),
            AnswerRef::Text(text) => f.write_str(text),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MtfData {
    #[serde(default)]
    pub left_column: Vec<String>,
    #[serde(default)]
    pub right_column: Vec<String>,
}

impl RawQuestion {
    /// Validate into a [`Question`] of a `section_type` section. `label`
    /// identifies it in error messages. Image paths resolve under `root`.
    pub fn into_question(
        self,
        label: &str,
        section_type: SectionType,
        root: &Path,
    ) -> Result<Question, ExamError> {
        match section_type {
            SectionType::MultipleChoice => self.into_choice_question(label),
            SectionType::AnswerWriting => {
                let mut segments = self.stem_segments(label)?;
                if let Some(image) = self.load_figure(root) {
                    segments.push(Segment::Image(image));
                }
                Ok(self.written(segments))
            }
            SectionType::FillBlank => {
                let text = match &self.question_text {
                    QuestionText::Single(text) => text.clone(),
                    QuestionText::Segments(parts) => parts.join(" "),
                };
                let answer = self.answer.as_ref().map(AnswerRef::to_string);
                Ok(self.written(vec![Segment::Blank { text, answer }]))
            }
            SectionType::MatchPairs => {
                let pairs = self.match_pairs.clone().ok_or_else(|| {
                    ExamError::config(format!("{} has no 'match_pairs' field", label))
                })?;
                let (right, left): (Vec<_>, Vec<_>) = pairs
                    .into_iter()
                    .partition(|(key, _)| !key.is_empty() && key.chars().all(|c| c.is_ascii_digit()));
                let mut segments = self.stem_segments(label)?;
                segments.push(Segment::MatchPairs { left, right });
                Ok(self.written(segments))
            }
        }
    }

    fn into_choice_question(self, label: &str) -> Result<Question, ExamError> {
        if self.choices.is_empty() {
            return Err(ExamError::config(format!("{} has no choices", label)));
        }

        let answer = match &self.answer {
            None => return Err(ExamError::config(format!("{} has no answer", label))),
            Some(AnswerRef::Index(i)) if *i < self.choices.len() => *i,
            Some(AnswerRef::Index(i)) => {
                return Err(ExamError::config(format!(
                    "{}: answer index {} is out of range for {} choices",
                    label,
                    i,
                    self.choices.len()
                )))
            }
            Some(AnswerRef::Text(text)) => self
                .choices
                .iter()
                .position(|c| c == text)
                .ok_or_else(|| {
                    ExamError::config(format!(
                        "{}: answer '{}' does not match any choice",
                        label, text
                    ))
                })?,
        };

        let segments = self.stem_segments(label)?;
        Ok(Question {
            segments,
            choices: self.choices,
            answer,
            explanation: self.reasoning.filter(|r| !r.trim().is_empty()),
            marks: 1,
        })
    }

    /// A choiceless question with `segments` as its stem.
    fn written(self, segments: Vec<Segment>) -> Question {
        Question {
            segments,
            choices: Vec::new(),
            answer: 0,
            explanation: self.reasoning.filter(|r| !r.trim().is_empty()),
            marks: 1,
        }
    }

    /// The figure, or `None` with a warning when it can't be loaded.
    fn load_figure(&self, root: &Path) -> Option<Arc<LoadedImage>> {
        let src = self.image.as_deref().filter(|s| !s.trim().is_empty())?;
        let path = image_loader::resolve_image_path(root, src);
        match image_loader::load_image(&path) {
            Ok(image) => Some(Arc::new(image)),
            Err(e) => {
                log::warn!("Leaving out image '{}': {}", src, e);
                None
            }
        }
    }

    fn stem_segments(&self, label: &str) -> Result<Vec<Segment>, ExamError> {
        match &self.question_text {
            QuestionText::Single(text) => Ok(vec![Segment::PlainText(text.clone())]),
            QuestionText::Segments(parts) => parts
                .iter()
                .filter(|p| !p.trim().is_empty())
                .map(|p| self.segment_for(p, label))
                .collect(),
        }
    }

    fn segment_for(&self, part: &str, label: &str) -> Result<Segment, ExamError> {
        let missing = |field: &str| {
            ExamError::config(format!(
                "{} uses {} but has no '{}' field",
                label, part, field
            ))
        };
        let segment = match part {
            STATEMENT => Segment::Statement(self.statement.clone().ok_or_else(|| missing("statement"))?),
            STATEMENTS => Segment::StatementList(
                self.statements.clone().ok_or_else(|| missing("statements"))?,
            ),
            LIST => Segment::Sequence(self.list_items.clone().ok_or_else(|| missing("list_items"))?),
            MTF_DATA => {
                let data = self.mtf_data.clone().ok_or_else(|| missing("mtf_data"))?;
                Segment::MatchTable {
                    left: data.left_column,
                    right: data.right_column,
                }
            }
            PARAGRAPH => Segment::Paragraph(self.paragraph.clone().ok_or_else(|| missing("paragraph"))?),
            text => Segment::PlainText(text.to_string()),
        };
        Ok(segment)
    }
}

impl QuestionBank {
    /// Validate every section and question, resolving image paths against
    /// the working directory.
    pub fn into_sections(self) -> Result<Vec<Section>, ExamError> {
        self.into_sections_at(Path::new("."))
    }

    /// Validate every section and question, resolving image paths against
    /// `root`.
    pub fn into_sections_at(self, root: &Path) -> Result<Vec<Section>, ExamError> {
        if self.sections.is_empty() {
            return Err(ExamError::config("Question bank has no sections"));
        }
        let sections = self
            .sections
            .into_iter()
            .map(|raw| {
                let section_type = match &raw.section_type {
                    Some(name) => name.parse::<SectionType>()?,
                    None => SectionType::default(),
                };
                let questions = raw
                    .questions
                    .into_iter()
                    .enumerate()
                    .map(|(i, q)| {
                        let label = format!("Section '{}', question {}", raw.name, i + 1);
                        q.into_question(&label, section_type, root)
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Section::new(
                    raw.name,
                    raw.description,
                    questions,
                    raw.required_questions,
                    raw.marks_per_question.unwrap_or(1),
                )
                .map(|s| s.with_type(section_type))
            })
            .collect::<Result<Vec<_>, _>>()?;
        paper_marks(&sections)?;
        Ok(sections)
    }
}

/// Parse and validate a question bank from JSON.
pub fn load_sections(json: &str) -> Result<Vec<Section>, ExamError> {
    let bank: QuestionBank = serde_json::from_str(json)?;
    bank.into_sections()
}

/// Parse and validate a question bank from JSON, with image paths resolved
/// against `root`.
pub fn load_sections_at(json: &str, root: &Path) -> Result<Vec<Section>, ExamError> {
    let bank: QuestionBank = serde_json::from_str(json)?;
    bank.into_sections_at(root)
}

/// Read, parse and validate a question bank file.
pub fn load_sections_file(path: &Path) -> Result<Vec<Section>, ExamError> {
    let json = std::fs::read_to_string(path).map_err(|e| ExamError::io(path, e))?;
    load_sections(&json)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bank(questions: &str) -> String {
        format!(
            r#"{{"sections": [{{"name": "Science", "description": "Choose one.", "questions": [{}]}}]}}"#,
            questions
        )
    }

    fn typed_bank(section_type: &str, questions: &str) -> String {
        format!(
            r#"{{"sections": [{{"name": "Part B", "description": "Answer all.", "section_type": "{}", "questions": [{}]}}]}}"#,
            section_type, questions
        )
    }

    #[test]
    fn plain_string_question() {
        let sections = load_sections(&bank(
            r#"{"question_text": "2 + 2?", "choices": ["3", "4"], "answer": "4"}"#,
        ))
        .unwrap();
        let q = &sections[0].questions[0];
        assert_eq!(q.segments, vec![Segment::PlainText("2 + 2?".into())]);
        assert_eq!(q.answer, 1);
        assert_eq!(q.kind(), QuestionKind::Standard);
    }

    #[test]
    fn question_alias_and_index_answer() {
        let sections = load_sections(&bank(
            r#"{"question": "Pick", "choices": ["a", "b", "c"], "answer": 2}"#,
        ))
        .unwrap();
        assert_eq!(sections[0].questions[0].correct_choice(), Some("c"));
    }

    #[test]
    fn sentinels_become_typed_segments() {
        let sections = load_sections(&bank(
            r#"{
                "question_text": ["Read:", "STATEMENT", "", "Then match:", "MTF_DATA"],
                "statement": "Water boils at 100C.",
                "mtf_data": {"left_column": ["a", "b"], "right_column": ["x"]},
                "choices": ["True", "False"],
                "answer": "True"
            }"#,
        ))
        .unwrap();
        let q = &sections[0].questions[0];
        assert_eq!(q.segments.len(), 4);
        assert_eq!(q.segments[1], Segment::Statement("Water boils at 100C.".into()));
        assert_eq!(
            q.segments[3],
            Segment::MatchTable {
                left: vec!["a".into(), "b".into()],
                right: vec!["x".into()]
            }
        );
        assert_eq!(q.kind(), QuestionKind::Statement);
    }

    #[test]
    fn missing_sibling_field_is_config_error() {
        let err = load_sections(&bank(
            r#"{"question_text": ["PARAGRAPH"], "choices": ["a"], "answer": "a"}"#,
        ))
        .unwrap_err();
        assert!(err.to_string().contains("'paragraph'"));
    }

    #[test]
    fn unknown_answer_is_config_error() {
        let err = load_sections(&bank(
            r#"{"question_text": "Q", "choices": ["a", "b"], "answer": "z"}"#,
        ))
        .unwrap_err();
        assert!(matches!(err, ExamError::Config(_)));
    }

    #[test]
    fn empty_section_rejected() {
        let err = Section::new("S", "D", vec![], None, 1).unwrap_err();
        assert!(err.to_string().contains("at least one question"));
    }

    #[test]
    fn required_count_cannot_exceed_available() {
        let q = Question {
            segments: vec![Segment::PlainText("Q".into())],
            choices: vec!["a".into()],
            answer: 0,
            explanation: None,
            marks: 1,
        };
        let err = Section::new("S", "D", vec![q.clone()], Some(2), 1).unwrap_err();
        assert!(err.to_string().contains("cannot exceed"));

        let ok = Section::new("S", "D", vec![q.clone(), q], Some(0), 3).unwrap();
        assert_eq!(ok.required_count, 2);
        assert_eq!(ok.total_marks(), 6);
        assert_eq!(ok.questions[0].marks, 3);
    }

    #[test]
    fn choice_order_preserves_answer_text() {
        let q = Question {
            segments: vec![],
            choices: vec!["a".into(), "b".into(), "c".into()],
            answer: 1,
            explanation: None,
            marks: 1,
        };
        let shuffled = q.with_choice_order(&[2, 0, 1]);
        assert_eq!(shuffled.choices, vec!["c", "a", "b"]);
        assert_eq!(shuffled.correct_choice(), Some("b"));
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let err = load_sections("{\"sections\": [}").unwrap_err();
        assert!(matches!(err, ExamError::Parse { .. }));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_sections_file(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, ExamError::Io { .. }));
    }

    #[test]
    fn analysis_counts_kinds() {
        let sections = load_sections(&bank(
            r#"{"question_text": "Q", "choices": ["a"], "answer": "a"},
               {"question_text": ["Order:", "LIST"], "list_items": ["x", "y"], "choices": ["a"], "answer": "a"}"#,
        ))
        .unwrap();
        let counts = analyze(&sections);
        assert_eq!(counts[&QuestionKind::Standard], 1);
        assert_eq!(counts[&QuestionKind::List], 1);
        assert!(sections[0].questions[1].forces_single_choices());
    }

    #[test]
    fn marks_that_overflow_are_rejected() {
        let json = r#"{"sections": [{"name": "S", "description": "D", "marks_per_question": 4294967295,
            "questions": [{"question": "a", "choices": ["x"], "answer": 0},
                          {"question": "b", "choices": ["x"], "answer": 0}]}]}"#;
        let err = load_sections(json).unwrap_err();
        assert!(matches!(err, ExamError::Config(_)));
        assert!(err.to_string().contains("overflows"));

        // One question at the maximum is fine on its own
        let single = r#"{"sections": [{"name": "S", "description": "D", "marks_per_question": 4294967295,
            "questions": [{"question": "a", "choices": ["x"], "answer": 0}]}]}"#;
        assert_eq!(load_sections(single).unwrap()[0].total_marks(), u32::MAX);
    }

    #[test]
    fn paper_total_that_overflows_is_rejected() {
        let section = |name: &str| {
            format!(
                r#"{{"name": "{}", "description": "D", "marks_per_question": 4294967295,
                    "questions": [{{"question": "a", "choices": ["x"], "answer": 0}}]}}"#,
                name
            )
        };
        let json = format!(r#"{{"sections": [{}, {}]}}"#, section("A"), section("B"));
        let err = load_sections(&json).unwrap_err();
        assert!(err.to_string().contains("Total marks overflow"));
    }

    #[test]
    fn multiple_choice_needs_an_answer() {
        let err = load_sections(&bank(r#"{"question_text": "Q", "choices": ["a"]}"#)).unwrap_err();
        assert!(err.to_string().contains("has no answer"));
    }

    #[test]
    fn section_type_is_parsed() {
        assert_eq!("mcq".parse::<SectionType>().unwrap(), SectionType::MultipleChoice);
        assert_eq!("MTF".parse::<SectionType>().unwrap(), SectionType::MatchPairs);
        assert_eq!(SectionType::FillBlank.to_string(), "FB");

        let err = load_sections(&typed_bank("ESSAY", r#"{"question": "Q"}"#)).unwrap_err();
        assert!(matches!(err, ExamError::Config(_)));
        assert!(err.to_string().contains("Must be MCQ, AW, FB, or MTF"));
    }

    #[test]
    fn fill_blank_keeps_its_answer() {
        let sections = load_sections(&typed_bank(
            "FB",
            r#"{"question": "Water boils at ___ degrees.", "answer": "100"}"#,
        ))
        .unwrap();
        let section = &sections[0];
        assert_eq!(section.section_type, SectionType::FillBlank);
        let q = &section.questions[0];
        assert!(q.choices.is_empty());
        assert_eq!(
            q.segments,
            vec![Segment::Blank {
                text: "Water boils at ___ degrees.".into(),
                answer: Some("100".into())
            }]
        );
        assert_eq!(q.kind(), QuestionKind::FillBlank);
        assert_eq!(q.key_answer(), "100");
    }

    #[test]
    fn match_pairs_split_by_key() {
        let sections = load_sections(&typed_bank(
            "MTF",
            r#"{"question": "Match the capitals.",
                "match_pairs": {"B": "Rome", "A": "Paris", "2": "Paris", "1": "Rome"}}"#,
        ))
        .unwrap();
        let q = &sections[0].questions[0];
        assert_eq!(q.segments.len(), 2);
        let Segment::MatchPairs { left, right } = &q.segments[1] else {
            panic!("expected match pairs, got {:?}", q.segments[1]);
        };
        assert_eq!(left[0], ("A".to_string(), "Paris".to_string()));
        assert_eq!(right[0], ("1".to_string(), "Rome".to_string()));
        assert_eq!(q.kind(), QuestionKind::MatchPairs);
        assert_eq!(q.key_answer(), "A-2, B-1");
    }

    #[test]
    fn match_pairs_are_required() {
        let err = load_sections(&typed_bank("MTF", r#"{"question": "Match."}"#)).unwrap_err();
        assert!(err.to_string().contains("'match_pairs'"));
    }

    #[test]
    fn answer_writing_loads_its_figure() {
        let root = std::env::temp_dir().join(format!("forme-exam-figure-{}", std::process::id()));
        let dir = root.join(image_loader::IMAGE_DIR);
        std::fs::create_dir_all(&dir).unwrap();
        image::RgbImage::from_pixel(8, 4, image::Rgb([0, 0, 0]))
            .save(dir.join("leaf.png"))
            .unwrap();

        let json = typed_bank(
            "AW",
            r#"{"question": "Label the parts of the leaf.", "image": "leaf.png"},
               {"question": "Describe photosynthesis.", "image": "missing.png"}"#,
        );
        let sections = load_sections_at(&json, &root).unwrap();
        std::fs::remove_dir_all(&root).ok();

        let with_figure = &sections[0].questions[0];
        match &with_figure.segments[1] {
            Segment::Image(image) => assert_eq!(image.aspect(), 0.5),
            other => panic!("expected an image, got {:?}", other),
        }
        assert_eq!(with_figure.kind(), QuestionKind::AnswerWriting);

        // A figure that can't be read is left out
        let without = &sections[0].questions[1];
        assert_eq!(without.segments, vec![Segment::PlainText("Describe photosynthesis.".into())]);
        assert_eq!(without.kind(), QuestionKind::AnswerWriting);
        assert_eq!(without.key_answer(), "");
    }
}
