// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Extraction module — turns one source file into an ordered sequence of
// content units, dispatching on the file extension.

#[cfg(feature = "docx")]
pub mod docx;
#[cfg(feature = "epub")]
pub mod epub;
#[cfg(feature = "pdf")]
pub mod pdf;

use std::path::Path;

use diglot_core::config::ImageSettings;
use diglot_core::error::{DiglotError, ExtractionFailure};
use diglot_core::types::{ContentUnit, InputFormat};
use tracing::{info, instrument, warn};

use crate::capabilities::Capabilities;
use crate::image::normalize_units;

/// Signature every format extractor implements: the source path (for
/// diagnostics and metadata) and the file's bytes.
pub type ExtractFn = fn(&Path, &[u8]) -> Result<Vec<ContentUnit>, ExtractionFailure>;

/// Result of extracting one edition.
#[derive(Debug)]
pub struct Extraction {
    pub format: InputFormat,
    /// Units in source reading order.
    pub units: Vec<ContentUnit>,
    /// Recovered parse failure, when the file could not be parsed and the
    /// unit sequence is therefore empty.
    pub failure: Option<ExtractionFailure>,
    /// Embedded images dropped because they failed to normalize.
    pub images_dropped: usize,
}

/// Extract `path` into content units.
///
/// The format is resolved from the extension before the file is touched, so
/// an unsupported extension fails with `UnsupportedFormat` without any read.
/// A file that cannot be read fails with `ExtractionFailure::IoError`; a file
/// that cannot be parsed is logged and yields an empty sequence.
#[instrument(skip(capabilities, images), fields(path = %path.display()))]
pub fn extract(
    path: &Path,
    capabilities: &Capabilities,
    images: &ImageSettings,
) -> Result<Extraction, DiglotError> {
    let format = InputFormat::from_path(path)?;
    let extractor = capabilities
        .extractor(format)
        .ok_or_else(|| DiglotError::UnsupportedFormat(format!("{format} support is not built in")))?;

    let data = std::fs::read(path).map_err(|source| ExtractionFailure::IoError {
        path: path.to_path_buf(),
        source,
    })?;

    let units = match extractor(path, &data) {
        Ok(units) => units,
        Err(failure) if failure.is_fatal() => return Err(failure.into()),
        Err(failure) => {
            warn!(%format, error = %failure, "Extraction failed, continuing with no units");
            return Ok(Extraction {
                format,
                units: Vec::new(),
                failure: Some(failure),
                images_dropped: 0,
            });
        }
    };

    let (units, images_dropped) = if images.enable {
        normalize_units(units, images)
    } else {
        (units, 0)
    };

    info!(%format, units = units.len(), images_dropped, "Extraction complete");
    Ok(Extraction {
        format,
        units,
        failure: None,
        images_dropped,
    })
}
