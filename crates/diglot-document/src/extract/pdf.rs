// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF extractor — one paragraph unit per page, holding that page's full text,
// using the `lopdf` crate.

use std::path::Path;

use diglot_core::error::ExtractionFailure;
use diglot_core::types::{ContentUnit, SourceMeta};
use lopdf::Document;
use tracing::{debug, info, instrument, warn};

/// Extract one unit per page, in page order. Each unit carries its 1-based
/// page number. A page whose text cannot be decoded becomes an empty unit so
/// page numbering stays intact.
#[instrument(skip(data), fields(path = %path.display(), bytes = data.len()))]
pub fn extract(path: &Path, data: &[u8]) -> Result<Vec<ContentUnit>, ExtractionFailure> {
    let document = Document::load_mem(data)
        .map_err(|err| ExtractionFailure::parse(path, format!("failed to load PDF: {err}")))?;

    let pages = document.get_pages();
    info!(pages = pages.len(), "PDF loaded");

    // lopdf pages are keyed by 1-indexed page number, in ascending order.
    let units = pages
        .keys()
        .enumerate()
        .map(|(index, &page_number)| {
            let text = document.extract_text(&[page_number]).unwrap_or_else(|err| {
                warn!(page_number, error = %err, "Cannot decode page text");
                String::new()
            });
            debug!(page_number, chars = text.len(), "Page extracted");
            ContentUnit::paragraph(index, text).with_meta(SourceMeta::Page(page_number))
        })
        .collect();

    Ok(units)
}
