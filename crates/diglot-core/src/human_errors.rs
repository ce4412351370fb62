// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for people running the formatter.
//
// Every technical error is mapped to plain English with a clear suggestion.
// The severity drives how the outer layer (CLI, web, desktop) presents it.

use crate::error::{DiglotError, ExtractionFailure};

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Retrying the same run may succeed (disk full, file locked, upload blip).
    Transient,
    /// The user must change an input file or the configuration.
    ActionRequired,
    /// The input cannot be processed by this build.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Severity level.
    pub severity: Severity,
}

/// Convert a `DiglotError` into a `HumanError`.
pub fn humanize_error(err: &DiglotError) -> HumanError {
    match err {
        DiglotError::UnsupportedFormat(detail) => HumanError {
            message: "This type of document isn't supported.".into(),
            suggestion: format!("Save the book as DOCX, PDF or EPUB and try again. (File: {detail})"),
            severity: Severity::Permanent,
        },

        DiglotError::Extraction(ExtractionFailure::IoError { path, .. }) => HumanError {
            message: "One of the books could not be opened.".into(),
            suggestion: format!("Check that {} exists and is readable.", path.display()),
            severity: Severity::ActionRequired,
        },

        DiglotError::Extraction(ExtractionFailure::ParseError { path, .. }) => HumanError {
            message: "One of the books looks damaged.".into(),
            suggestion: format!(
                "Open {} in its usual reader, save a fresh copy, and try again.",
                path.display()
            ),
            severity: Severity::ActionRequired,
        },

        DiglotError::EmptyContent { side } => HumanError {
            message: format!("No text was found in the {side} edition."),
            suggestion: "Make sure the file contains selectable text (scanned PDFs need OCR first).".into(),
            severity: Severity::ActionRequired,
        },

        DiglotError::ImageNormalization(detail) => HumanError {
            message: "An image in the book could not be converted.".into(),
            suggestion: format!("The image was left out. ({detail})"),
            severity: Severity::Permanent,
        },

        DiglotError::RenderFailure { format, detail } => HumanError {
            message: format!("The {format} file could not be written."),
            suggestion: format!("Check free disk space and folder permissions. ({detail})"),
            severity: Severity::Transient,
        },

        DiglotError::NoOutputProduced { .. } => HumanError {
            message: "No bilingual file was produced.".into(),
            suggestion: "Every output format failed. Check the log for each format's reason.".into(),
            severity: Severity::Transient,
        },

        DiglotError::NoOutputRequested => HumanError {
            message: "No output format is switched on.".into(),
            suggestion: "Set export_pdf (DOCX) or export_epub to true in config.json.".into(),
            severity: Severity::ActionRequired,
        },

        DiglotError::Cancelled { .. } => HumanError {
            message: "Processing was cancelled.".into(),
            suggestion: "Start the run again when ready.".into(),
            severity: Severity::Transient,
        },

        DiglotError::Upload(detail) => HumanError {
            message: "The finished book could not be uploaded.".into(),
            suggestion: format!("The local file is still available. ({detail})"),
            severity: Severity::Transient,
        },

        DiglotError::Io(io_err) => HumanError {
            message: "A file could not be read or written.".into(),
            suggestion: format!("Check disk space and permissions. ({io_err})"),
            severity: Severity::Transient,
        },

        DiglotError::Serialization(detail) => HumanError {
            message: "Settings data is corrupted.".into(),
            suggestion: format!("Delete config.json to restore the defaults. ({detail})"),
            severity: Severity::ActionRequired,
        },
    }
}
