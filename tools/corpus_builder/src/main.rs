//! tools/corpus_builder/src/main.rs

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use corpus_builder::build_corpus;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build a JSON-lines fine-tuning corpus from annotated CSV files.
#[derive(Debug, Parser)]
#[command(name = "corpus-builder", version, about)]
struct Args {
    /// Directory containing the `*.csv` exports.
    #[arg(long, default_value = "m2_csv_file")]
    input_dir: PathBuf,

    /// Path of the JSONL file to write.
    #[arg(long, default_value = "cbc_dataset.jsonl")]
    output: PathBuf,

    /// Log filter, e.g. `info` or `corpus_builder=debug`.
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> ExitCode {
    let args = Args::parse();
    tracing_subscriber::registry()
        .with(EnvFilter::new(&args.log_level))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(input_dir = %args.input_dir.display(), "Building training corpus");
    match build_corpus(&args.input_dir, &args.output) {
        Ok(summary) => {
            info!(
                samples = summary.samples,
                files_processed = summary.files_processed,
                files_skipped = summary.files_skipped,
                bytes_written = summary.bytes_written,
                output = %args.output.display(),
                "Corpus written"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
