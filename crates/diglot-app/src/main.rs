// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Diglot — command-line entry point.
//
// Edition A fills the left column and edition B the right one. Languages come
// from the `languages` section of the config.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use diglot_core::RenderConfig;
use diglot_core::human_errors::humanize_error;
use diglot_pipeline::{CancelFlag, Orchestrator};

/// Pair two editions of a book into side-by-side DOCX and EPUB output
#[derive(Parser, Debug)]
#[command(name = "diglot", version, about)]
struct Args {
    /// Edition for the left column (.docx, .pdf or .epub)
    edition_a: PathBuf,

    /// Edition for the right column (.docx, .pdf or .epub)
    edition_b: PathBuf,

    /// Output path without extension; each format appends its own
    output_base: PathBuf,

    /// JSON render configuration. Missing or malformed files fall back to defaults.
    #[arg(default_value = "config.json")]
    config: PathBuf,
}

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Arc::new(RenderConfig::load(&args.config));
    tracing::info!(config = %args.config.display(), "Diglot starting");

    let orchestrator = Orchestrator::new(config);
    let (left, right) = orchestrator.edition_pair(&args.edition_a, &args.edition_b);

    match orchestrator.process_books(&left, &right, &args.output_base, &CancelFlag::new()) {
        Ok(report) => {
            for output in &report.outputs {
                println!("{}: {}", output.format, output.path.display());
            }
            for failure in &report.failures {
                eprintln!("{} not produced: {}", failure.format, failure.reason);
            }
            for warning in &report.warnings {
                eprintln!("warning: {warning}");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            let human = humanize_error(&err);
            eprintln!("{}", human.message);
            eprintln!("{}", human.suggestion);
            tracing::debug!(error = %err, severity = ?human.severity, "Run failed");
            ExitCode::FAILURE
        }
    }
}
