// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Attestwerk — certificate text extraction CLI
//
// Reads a scanned certificate (image or PDF), runs it through the extraction
// pipeline, and prints either a human summary or the full JSON result.
// Logs go to stderr so `--json` output stays pipeable.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use attestwerk_core::error::AttestwerkError;
use attestwerk_core::human_errors::humanize_error;
use attestwerk_core::{Document, ExtractionResult};
use attestwerk_extract::{EngineConfig, RecognitionEngine, TextExtractor};

#[derive(Parser)]
#[command(
    name = "attestwerk",
    version,
    about = "Extract text and certificate fields from scanned documents"
)]
struct Cli {
    /// Document to process (image or PDF; the type is sniffed from content).
    file: PathBuf,

    /// Recognition language passed to the engine.
    #[arg(long, default_value = "eng")]
    language: String,

    /// Directory containing the engine's language data files.
    #[arg(long)]
    datapath: Option<PathBuf>,

    /// Emit the full extraction result as JSON on stdout.
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let friendly = humanize_error(&err);
            eprintln!("error: {}", friendly.message);
            eprintln!("  {}", friendly.suggestion);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), AttestwerkError> {
    let data = fs::read(&cli.file)?;
    let name = cli
        .file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| cli.file.display().to_string());
    let document = Document::with_sniffed_type(data, name);
    tracing::info!(name = %document.name, media_type = %document.media_type, "document loaded");

    let config = EngineConfig {
        language: cli.language.clone(),
        datapath: cli.datapath.clone(),
        ..EngineConfig::default()
    };
    let extractor = TextExtractor::new(RecognitionEngine::tesseract(config))?;

    let report = |pct: u8| eprint!("\r{pct:>3}%");
    let result = extractor.extract_text(&document, Some(&report))?;
    eprintln!();
    extractor.engine().terminate();

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_summary(&result);
    }
    Ok(())
}

fn print_summary(result: &ExtractionResult) {
    println!("confidence: {:.1}%", result.confidence);
    if let Some(pages) = result.page_count {
        println!("pages: {pages}");
    }
    let info = &result.certificate_info;
    print_field("names", &info.names);
    print_field("institutions", &info.institutions);
    print_field("dates", &info.dates);
    print_field("degrees", &info.degrees);
    print_field("certificates", &info.certificates);
    print_field("emails", &info.emails);
    print_field("ids", &info.ids);
    println!();
    println!("{}", result.text);
}

fn print_field(label: &str, values: &[String]) {
    if !values.is_empty() {
        println!("{label}: {}", values.join("; "));
    }
}
