//! # Forme Exam CLI
//!
//! Usage:
//!   forme-exam --input-file questions.json --title "Springfield High" \
//!       --subtitle "Class 8" --exam-title "Unit Test 1" --num-sets 3
//!
//! Logging is controlled with `RUST_LOG`, e.g. `RUST_LOG=debug`.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;

use forme_exam::model::paper::{EXAM_TITLE_PLACEHOLDER, SUBTITLE_PLACEHOLDER, TITLE_PLACEHOLDER};
use forme_exam::model::{self, PaperConfig, PaperFormat, SectionType};
use forme_exam::sets::{self, AnswerKeyTable};
use forme_exam::style::SizeTier;
use forme_exam::{build_set, ExamError};

#[derive(Parser, Debug)]
#[command(version, about = "Generate two-column exam sets with answer keys and booklets")]
struct CliArguments {
    #[arg(long = "num-sets", default_value_t = 2, help = "Number of sets to generate")]
    num_sets: usize,
    #[arg(long, default_value = TITLE_PLACEHOLDER, help = "School name (max 60 characters)")]
    title: String,
    #[arg(long, default_value = SUBTITLE_PLACEHOLDER, help = "Subtitle (max 50 characters)")]
    subtitle: String,
    #[arg(long = "exam-title", default_value = EXAM_TITLE_PLACEHOLDER, help = "Exam title (max 50 characters)")]
    exam_title: String,
    #[arg(
        long = "input-file",
        value_name = "json_file",
        default_value = "questions_data/mcq_questions.json",
        help = "Question bank in JSON"
    )]
    input_file: PathBuf,
    #[arg(long, default_value = "medium", help = "Font and spacing preset: small, medium or large")]
    size: SizeTier,
    #[arg(long, default_value = "A4", help = "Paper format: A4 or A3")]
    paper: PaperFormat,
    #[arg(long = "no-student-info", help = "Leave out student information and instructions")]
    no_student_info: bool,
    #[arg(long = "no-shuffle", help = "Keep the bank's question and choice order in every set")]
    no_shuffle: bool,
    #[arg(long, help = "Seed for reproducible shuffling")]
    seed: Option<u64>,
    #[arg(long, default_value = "45min", help = "Duration shown on the first page")]
    duration: String,
    #[arg(
        long = "output-dir",
        value_name = "dir",
        help = "Defaults to Generated_Papers/MCQ, or Generated_Papers/Mixed for mixed banks"
    )]
    output_dir: Option<PathBuf>,
    #[arg(long = "font-dir", value_name = "dir", help = "Directory with the exam's TrueType fonts")]
    font_dir: Option<PathBuf>,
}

fn main() {
    env_logger::init();
    if let Err(error) = fallible_main() {
        log::error!("{}", error);
        eprintln!("Error: {}", error);
        std::process::exit(1);
    }
}

fn fallible_main() -> Result<(), ExamError> {
    let arguments = CliArguments::parse();
    log::debug!("{:?}", arguments);

    let mut config = PaperConfig::new(&arguments.title, &arguments.subtitle, &arguments.exam_title)?
        .with_size(arguments.size)
        .with_format(arguments.paper)
        .with_student_info(!arguments.no_student_info)
        .with_duration(&arguments.duration);
    if let Some(dir) = &arguments.font_dir {
        config = config.with_font_dir(dir.clone());
    }
    let set_names = sets::set_names(arguments.num_sets)?;

    let sections = model::load_sections_file(&arguments.input_file)?;
    log::info!(
        "Loaded {} sections with {} questions from {}",
        sections.len(),
        sections.iter().map(|s| s.questions.len()).sum::<usize>(),
        arguments.input_file.display()
    );
    for section in &sections {
        log::info!(
            "  {}: {} questions, {} required",
            section.name,
            section.questions.len(),
            section.required_count
        );
    }
    for (kind, count) in model::analyze(&sections) {
        log::debug!("  {}: {}", kind, count);
    }

    let mixed = sections
        .iter()
        .any(|s| s.section_type != SectionType::MultipleChoice);
    let (prefix, default_dir) = if mixed {
        ("mixed", "Generated_Papers/Mixed")
    } else {
        ("mcq", "Generated_Papers/MCQ")
    };
    let out = &arguments
        .output_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(default_dir));
    let questions_dir = out.join("Questions");
    let answers_dir = out.join("Answers");
    let booklets_dir = out.join("Booklets");
    for dir in [out, &questions_dir, &answers_dir, &booklets_dir] {
        fs::create_dir_all(dir).map_err(|e| ExamError::io(dir, e))?;
    }

    let mut table = AnswerKeyTable::new();
    for (index, name) in set_names.iter().enumerate() {
        let mut rng = (!arguments.no_shuffle).then(|| sets::set_rng(arguments.seed, index));
        let set = build_set(&config, &sections, name, rng.as_mut())?;

        write_file(&questions_dir.join(format!("{}_set_{}.pdf", prefix, name)), &set.question_paper)?;
        write_file(&answers_dir.join(format!("{}_set_{}_answers.pdf", prefix, name)), &set.answer_key)?;
        write_file(&booklets_dir.join(format!("{}_set_{}_booklet.pdf", prefix, name)), &set.booklet)?;

        log::info!(
            "Set {}: {} questions, {} marks, {} pages{}",
            name,
            set.summary.question_count,
            set.summary.total_marks,
            set.summary.pages,
            if set.summary.overflows > 0 {
                format!(", {} oversized questions", set.summary.overflows)
            } else {
                String::new()
            }
        );
        table.insert(name, set.answers);
    }

    write_file(&out.join(format!("{}_set_answer_keys.csv", prefix)), table.to_csv().as_bytes())?;
    write_file(
        &out.join(format!("{}_set_answer_keys_detailed.json", prefix)),
        table.to_json()?.as_bytes(),
    )?;
    log::info!("Wrote {} sets to {}", set_names.len(), out.display());
    Ok(())
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), ExamError> {
    fs::write(path, bytes).map_err(|e| ExamError::io(path, e))?;
    log::debug!("Written {} bytes to {}", bytes.len(), path.display());
    Ok(())
}
