// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// diglot-document — Document processing for the Diglot bilingual formatter.
//
// Provides format extraction (DOCX, PDF, EPUB), embedded image normalization
// (orientation, bounded resize, re-encode), positional alignment of two
// editions, and bilingual rendering (two-column DOCX, flex-row EPUB).

pub mod align;
pub mod capabilities;
pub mod extract;
pub mod image;
pub mod render;

#[cfg(any(feature = "docx", feature = "epub"))]
mod package;

// Re-export the primary entry points so callers can use `diglot_document::align` etc.
pub use align::align;
pub use capabilities::Capabilities;
pub use extract::{Extraction, extract};
pub use image::processor::ImageProcessor;
pub use render::{RenderContext, output_path, render_to_file};
