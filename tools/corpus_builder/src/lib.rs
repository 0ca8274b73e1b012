//! tools/corpus_builder/src/lib.rs
//!
//! Merges teacher-annotated CSV exports into a JSON-lines training corpus.
//!
//! Every `*.csv` file in the input directory must carry the `Input`, `Output`
//! and `Updated Feedback` columns. Rows are cleaned, rows with an empty field
//! are dropped, and each survivor becomes one `{"input", "output"}` line. A file
//! that cannot be read is skipped; only an input directory without any CSV
//! file stops the run.

use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use tracing::{info, warn};

pub const INPUT_COLUMN: &str = "Input";
pub const OUTPUT_COLUMN: &str = "Output";
pub const FEEDBACK_COLUMN: &str = "Updated Feedback";

/// Errors that abort the whole run.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("No CSV files found in {0}")]
    NoCsvFiles(PathBuf),
    #[error("Failed to read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Errors that cause a single input file to be skipped.
#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error("missing required columns. Found: {found:?}")]
    MissingColumns { found: Vec<String> },
    #[error("failed to open file: {0}")]
    Open(#[from] io::Error),
    #[error("failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// One line of the output corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrainingRecord {
    pub input: String,
    pub output: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BuildSummary {
    pub samples: usize,
    pub files_processed: usize,
    pub files_skipped: usize,
    pub bytes_written: u64,
}

fn whitespace_run() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\s+").expect("whitespace pattern is a valid regex"))
}

/// Trims, collapses whitespace runs to one space, and straightens curly quotes.
pub fn clean_text(raw: &str) -> String {
    whitespace_run()
        .replace_all(raw.trim(), " ")
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'")
}

/// Builds the corpus line for one row, or `None` if a cleaned field is empty.
pub fn training_record(input: &str, output: &str, feedback: &str) -> Option<TrainingRecord> {
    let input = clean_text(input);
    let output = clean_text(output);
    let feedback = clean_text(feedback);
    if input.is_empty() || output.is_empty() || feedback.is_empty() {
        return None;
    }
    Some(TrainingRecord {
        input,
        output: format!("CORRECTION: {}\n\nFEEDBACK: {}", output, feedback),
    })
}

/// Converts CSV data with a header row into corpus records.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<TrainingRecord>, FileError> {
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let column = |name: &str| headers.iter().position(|h| h == name);

    let (Some(input_idx), Some(output_idx), Some(feedback_idx)) = (
        column(INPUT_COLUMN),
        column(OUTPUT_COLUMN),
        column(FEEDBACK_COLUMN),
    ) else {
        return Err(FileError::MissingColumns {
            found: headers.iter().map(str::to_string).collect(),
        });
    };

    let mut records = Vec::new();
    for row in csv_reader.records() {
        let row = row?;
        let field = |idx: usize| row.get(idx).unwrap_or("");
        if let Some(record) =
            training_record(field(input_idx), field(output_idx), field(feedback_idx))
        {
            records.push(record);
        }
    }
    Ok(records)
}

pub fn process_csv_file(path: &Path) -> Result<Vec<TrainingRecord>, FileError> {
    read_records(File::open(path)?)
}

/// Lists the `*.csv` files directly inside `dir`, sorted by path.
pub fn find_csv_files(dir: &Path) -> Result<Vec<PathBuf>, BuildError> {
    let read_dir_error = |source| BuildError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_dir_error)? {
        let path = entry.map_err(read_dir_error)?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "csv") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Writes one JSON object per line.
pub fn write_jsonl<W: Write>(records: &[TrainingRecord], mut writer: W) -> io::Result<()> {
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()
}

/// Runs the whole conversion from `input_dir` into `output`.
pub fn build_corpus(input_dir: &Path, output: &Path) -> Result<BuildSummary, BuildError> {
    let csv_files = find_csv_files(input_dir)?;
    if csv_files.is_empty() {
        return Err(BuildError::NoCsvFiles(input_dir.to_path_buf()));
    }

    let mut summary = BuildSummary::default();
    let mut records = Vec::new();
    for path in &csv_files {
        match process_csv_file(path) {
            Ok(file_records) => {
                info!(file = %path.display(), samples = file_records.len(), "Processed CSV file");
                summary.files_processed += 1;
                records.extend(file_records);
            }
            Err(e) => {
                warn!(file = %path.display(), error = %e, "Skipping CSV file");
                summary.files_skipped += 1;
            }
        }
    }
    if records.is_empty() {
        warn!("No usable rows found; writing an empty corpus");
    }

    let write_error = |source| BuildError::Write {
        path: output.to_path_buf(),
        source,
    };
    let file = File::create(output).map_err(write_error)?;
    write_jsonl(&records, BufWriter::new(file)).map_err(write_error)?;

    summary.samples = records.len();
    summary.bytes_written = fs::metadata(output).map_err(write_error)?.len();
    Ok(summary)
}
