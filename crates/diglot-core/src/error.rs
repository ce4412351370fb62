// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Diglot.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::{OutputFormat, Side};

/// Why a single source file could not be turned into content units.
#[derive(Debug, Error)]
pub enum ExtractionFailure {
    /// The file could not be read at all (missing, permission denied, ...).
    /// Fatal to the run.
    #[error("cannot read {}: {source}", path.display())]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file was read but its container or markup could not be parsed.
    /// Recovered: the extractor yields no units for this file.
    #[error("cannot parse {}: {detail}", path.display())]
    ParseError { path: PathBuf, detail: String },
}

impl ExtractionFailure {
    /// Build a `ParseError` for `path` from any displayable cause.
    pub fn parse(path: impl Into<PathBuf>, detail: impl std::fmt::Display) -> Self {
        Self::ParseError {
            path: path.into(),
            detail: detail.to_string(),
        }
    }

    /// Whether this failure must abort the run rather than degrade to an
    /// empty unit sequence.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::IoError { .. })
    }
}

/// Top-level error type for all Diglot operations.
#[derive(Debug, Error)]
pub enum DiglotError {
    // -- Extraction errors --
    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractionFailure),

    #[error("{side} edition produced no content")]
    EmptyContent { side: Side },

    // -- Image errors --
    #[error("image normalization failed: {0}")]
    ImageNormalization(String),

    // -- Render errors --
    #[error("{format} rendering failed: {detail}")]
    RenderFailure { format: OutputFormat, detail: String },

    #[error("no output produced: every requested format failed ({failed} attempted)")]
    NoOutputProduced { failed: usize },

    #[error("configuration enables no output format")]
    NoOutputRequested,

    // -- Run control --
    #[error("run cancelled before {stage}")]
    Cancelled { stage: String },

    // -- External collaborators --
    #[error("upload failed: {0}")]
    Upload(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DiglotError {
    /// Shorthand for a `RenderFailure` with a displayable cause.
    pub fn render(format: OutputFormat, detail: impl std::fmt::Display) -> Self {
        Self::RenderFailure {
            format,
            detail: detail.to_string(),
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DiglotError>;
