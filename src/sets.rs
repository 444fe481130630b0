//! # Paper Sets and Answer Keys
//!
//! A paper is printed in several sets, A, B, C and so on, that hold the same
//! questions in a different order. Each set gets its own seeded RNG so a
//! run with `--seed` is reproducible, and its answers land in one
//! consolidated table exported as CSV and JSON.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;

use crate::error::ExamError;
use crate::model::{Question, Section};

/// Set names are single letters.
pub const MAX_SETS: usize = 26;

/// Printed in the CSV when a set has no answer for a row.
const MISSING_ANSWER: &str = "?";

/// Names for `count` sets: "A", "B", ...
pub fn set_names(count: usize) -> Result<Vec<String>, ExamError> {
    if count == 0 || count > MAX_SETS {
        return Err(ExamError::config(format!(
            "Number of sets must be between 1 and {}, got {}",
            MAX_SETS, count
        )));
    }
    Ok((b'A'..=b'Z')
        .take(count)
        .map(|b| char::from(b).to_string())
        .collect())
}

/// RNG for the set at `index`. A fixed seed gives each set `seed + index`.
pub fn set_rng(seed: Option<u64>, index: usize) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(index as u64)),
        None => StdRng::from_entropy(),
    }
}

fn shuffle_choices(question: &Question, rng: &mut StdRng) -> Question {
    let mut order: Vec<usize> = (0..question.choices.len()).collect();
    order.shuffle(rng);
    question.with_choice_order(&order)
}

/// Shuffle every question's choices, then the question order, in each
/// section.
pub fn shuffle_sections(sections: &[Section], rng: &mut StdRng) -> Vec<Section> {
    sections
        .iter()
        .map(|section| {
            let mut questions: Vec<Question> = section
                .questions
                .iter()
                .map(|q| shuffle_choices(q, rng))
                .collect();
            questions.shuffle(rng);
            section.with_questions(questions)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerEntry {
    /// Printed question number, continuing across sections.
    pub number: usize,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionAnswers {
    pub name: String,
    pub questions: Vec<AnswerEntry>,
}

/// Answers of one set, in print order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetAnswers {
    pub total_marks: u32,
    pub sections: Vec<SectionAnswers>,
}

impl SetAnswers {
    /// Collect the printed questions' answers, numbered the way the paper
    /// numbers them.
    pub fn from_sections(sections: &[Section]) -> Self {
        let mut number = 0;
        let mut answers = Vec::with_capacity(sections.len());
        for section in sections {
            let questions = section
                .selected()
                .iter()
                .map(|q| {
                    number += 1;
                    AnswerEntry {
                        number,
                        answer: q.key_answer(),
                    }
                })
                .collect();
            answers.push(SectionAnswers {
                name: section.name.clone(),
                questions,
            });
        }
        Self {
            total_marks: sections
                .iter()
                .map(Section::total_marks)
                .fold(0, u32::saturating_add),
            sections: answers,
        }
    }

    fn answer(&self, section: &str, number: usize) -> Option<&str> {
        self.sections
            .iter()
            .find(|s| s.name == section)?
            .questions
            .iter()
            .find(|q| q.number == number)
            .map(|q| q.answer.as_str())
    }
}

/// Answers of every set, keyed `"Set X"`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AnswerKeyTable {
    sets: BTreeMap<String, SetAnswers>,
}

impl AnswerKeyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, set_name: &str, answers: SetAnswers) {
        self.sets.insert(format!("Set {}", set_name), answers);
    }

    pub fn get(&self, set_name: &str) -> Option<&SetAnswers> {
        self.sets.get(&format!("Set {}", set_name))
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// One row per (section, question number), one column per set.
    ///
    /// Rows follow the first set that has them. A set without an entry for
    /// a row shows "?".
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        let header: Vec<&str> = ["Section", "Question Number"]
            .into_iter()
            .chain(self.sets.keys().map(String::as_str))
            .collect();
        push_csv_row(&mut out, &header);

        let mut rows: Vec<(&str, usize)> = Vec::new();
        for set in self.sets.values() {
            for section in &set.sections {
                for q in &section.questions {
                    let row = (section.name.as_str(), q.number);
                    if !rows.contains(&row) {
                        rows.push(row);
                    }
                }
            }
        }

        for (section, number) in rows {
            let printed = number.to_string();
            let mut fields = vec![section, printed.as_str()];
            fields.extend(
                self.sets
                    .values()
                    .map(|set| set.answer(section, number).unwrap_or(MISSING_ANSWER)),
            );
            push_csv_row(&mut out, &fields);
        }
        out
    }

    pub fn to_json(&self) -> Result<String, ExamError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// RFC 4180: quote fields holding a comma, quote or line break, doubling
/// inner quotes. Records end in CRLF.
fn push_csv_row(out: &mut String, fields: &[&str]) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        if field.contains([',', '"', '\r', '\n']) {
            out.push('"');
            out.push_str(&field.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(field);
        }
    }
    out.push_str("\r\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Segment;

    fn question(text: &str, choices: &[&str], answer: usize) -> Question {
        Question {
            segments: vec![Segment::PlainText(text.into())],
            choices: choices.iter().map(|c| c.to_string()).collect(),
            answer,
            explanation: None,
            marks: 1,
        }
    }

    fn sections() -> Vec<Section> {
        let a = Section::new(
            "Physics",
            "Answer all.",
            vec![
                question("Unit of force?", &["Newton", "Joule", "Watt", "Pascal"], 0),
                question("Unit of power?", &["Newton", "Joule", "Watt", "Pascal"], 2),
            ],
            None,
            2,
        )
        .unwrap();
        let b = Section::new(
            "Chemistry",
            "Answer one.",
            vec![
                question("Symbol for gold?", &["Ag", "Au"], 1),
                question("Symbol for iron?", &["Fe", "Ir"], 0),
            ],
            Some(1),
            1,
        )
        .unwrap();
        vec![a, b]
    }

    #[test]
    fn set_names_are_letters() {
        assert_eq!(set_names(3).unwrap(), vec!["A", "B", "C"]);
        assert_eq!(set_names(26).unwrap().last().map(String::as_str), Some("Z"));
        assert!(matches!(set_names(0), Err(ExamError::Config(_))));
        assert!(set_names(27).is_err());
    }

    #[test]
    fn shuffle_keeps_correct_answer_text() {
        let original = sections();
        for seed in 0..20 {
            let mut rng = set_rng(Some(seed), 0);
            let shuffled = shuffle_sections(&original, &mut rng);
            for (before, after) in original.iter().zip(&shuffled) {
                assert_eq!(before.questions.len(), after.questions.len());
                for q in &after.questions {
                    let source = before
                        .questions
                        .iter()
                        .find(|b| b.segments == q.segments)
                        .unwrap();
                    assert_eq!(q.correct_choice(), source.correct_choice());
                    assert!(q.correct_choice().is_some());
                    let mut a = q.choices.clone();
                    let mut b = source.choices.clone();
                    a.sort();
                    b.sort();
                    assert_eq!(a, b);
                }
            }
        }
    }

    #[test]
    fn fixed_seed_is_reproducible() {
        let original = sections();
        let first = shuffle_sections(&original, &mut set_rng(Some(42), 1));
        let second = shuffle_sections(&original, &mut set_rng(Some(42), 1));
        assert_eq!(first, second);
    }

    #[test]
    fn answers_are_numbered_across_sections() {
        let answers = SetAnswers::from_sections(&sections());
        assert_eq!(answers.total_marks, 5);
        assert_eq!(answers.sections[0].questions[1].number, 2);
        assert_eq!(answers.sections[1].questions.len(), 1);
        assert_eq!(
            answers.sections[1].questions[0],
            AnswerEntry {
                number: 3,
                answer: "Au".into()
            }
        );
    }

    #[test]
    fn written_sections_record_their_answers() {
        let blank = Question {
            segments: vec![Segment::Blank {
                text: "The largest planet is ___.".into(),
                answer: Some("Jupiter".into()),
            }],
            choices: Vec::new(),
            answer: 0,
            explanation: None,
            marks: 1,
        };
        let essay = Question {
            segments: vec![Segment::PlainText("Describe the water cycle.".into())],
            ..blank.clone()
        };
        let section = Section::new("Part B", "Answer all.", vec![blank, essay], None, 2)
            .unwrap()
            .with_type(crate::model::SectionType::FillBlank);

        let mut rng = set_rng(Some(3), 0);
        let shuffled = shuffle_sections(&[section], &mut rng);
        let answers = SetAnswers::from_sections(&shuffled);
        let mut recorded: Vec<&str> = answers.sections[0]
            .questions
            .iter()
            .map(|q| q.answer.as_str())
            .collect();
        recorded.sort_unstable();
        assert_eq!(recorded, vec!["", "Jupiter"]);
        assert_eq!(answers.total_marks, 4);
        assert_eq!(shuffled[0].section_type, crate::model::SectionType::FillBlank);
    }

    #[test]
    fn csv_quotes_and_fills_missing() {
        let mut table = AnswerKeyTable::new();
        table.insert("A", SetAnswers::from_sections(&sections()));
        let mut partial = SetAnswers::from_sections(&sections());
        partial.sections[1].questions.clear();
        partial.sections[0].questions[0].answer = "Newton, SI".into();
        table.insert("B", partial);

        let csv = table.to_csv();
        similar_asserts::assert_eq!(
            csv,
            "Section,Question Number,Set A,Set B\r\n\
             Physics,1,Newton,\"Newton, SI\"\r\n\
             Physics,2,Watt,Watt\r\n\
             Chemistry,3,Au,?\r\n"
        );
    }

    #[test]
    fn json_is_keyed_by_set() {
        let mut table = AnswerKeyTable::new();
        table.insert("A", SetAnswers::from_sections(&sections()));
        let value: serde_json::Value = serde_json::from_str(&table.to_json().unwrap()).unwrap();
        assert_eq!(value["Set A"]["total_marks"], 5);
        assert_eq!(value["Set A"]["sections"][1]["name"], "Chemistry");
        assert_eq!(value["Set A"]["sections"][1]["questions"][0]["number"], 3);
        assert_eq!(value["Set A"]["sections"][1]["questions"][0]["answer"], "Au");
    }
}
