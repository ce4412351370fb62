// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Rendering module — turns aligned pairs into bilingual DOCX and EPUB files.
//
// Renderers are pure: they build the whole package in memory from the pairs
// and the render context. Only `render_to_file` touches the filesystem, and
// it never leaves a partial output behind.

#[cfg(feature = "docx")]
pub mod docx;
#[cfg(feature = "epub")]
pub mod epub;

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};

use diglot_core::config::{LanguageProfile, RenderConfig};
use diglot_core::error::DiglotError;
use diglot_core::types::{AlignedPair, OutputFormat, Side, UnitKind};
use tracing::{debug, info, instrument};

use crate::capabilities::Capabilities;

/// Signature every renderer implements.
pub type RenderFn = fn(&[AlignedPair<'_>], &RenderContext<'_>) -> Result<Vec<u8>, DiglotError>;

/// Everything a renderer needs besides the pairs themselves.
#[derive(Debug, Clone)]
pub struct RenderContext<'a> {
    pub config: &'a RenderConfig,
    pub left: LanguageProfile,
    pub right: LanguageProfile,
    /// Book title used in package metadata.
    pub title: String,
}

impl<'a> RenderContext<'a> {
    pub fn new(
        config: &'a RenderConfig,
        left_language: &str,
        right_language: &str,
        title: impl Into<String>,
    ) -> Self {
        Self {
            config,
            left: config.language_profile(left_language),
            right: config.language_profile(right_language),
            title: title.into(),
        }
    }

    pub fn profile(&self, side: Side) -> &LanguageProfile {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    /// Whether `side` gets right alignment. Only the right column is ever
    /// forced, and only for a right-to-left language.
    pub fn right_aligned(&self, side: Side) -> bool {
        side == Side::Right && self.right.direction.is_rtl()
    }
}

/// `<output_base>.<ext>`. The extension is appended, never substituted, so a
/// base such as `out/book.v2` keeps its dot.
pub fn output_path(output_base: &Path, format: OutputFormat) -> PathBuf {
    let mut name = OsString::from(output_base.as_os_str());
    name.push(".");
    name.push(format.extension());
    PathBuf::from(name)
}

/// Render `pairs` in `format` and write the result next to `output_base`.
///
/// A missing backend or a renderer error yields `RenderFailure` for this
/// format. The file appears at its final path only after every byte has been
/// written.
#[instrument(skip(pairs, ctx, capabilities), fields(%format, pairs = pairs.len()))]
pub fn render_to_file(
    format: OutputFormat,
    pairs: &[AlignedPair<'_>],
    ctx: &RenderContext<'_>,
    capabilities: &Capabilities,
    output_base: &Path,
) -> Result<PathBuf, DiglotError> {
    let renderer = capabilities
        .renderer(format)
        .ok_or_else(|| DiglotError::render(format, "renderer not available in this build"))?;

    let skipped_images = pairs
        .iter()
        .flat_map(|pair| [pair.left, pair.right])
        .flatten()
        .filter(|unit| unit.kind() == UnitKind::Image)
        .count();
    if skipped_images > 0 {
        debug!(skipped_images, "Image units are not placed in the output");
    }

    let bytes = renderer(pairs, ctx)?;
    let dest = output_path(output_base, format);
    write_atomic(&dest, &bytes).map_err(|err| DiglotError::render(format, err))?;

    info!(path = %dest.display(), bytes = bytes.len(), "Output written");
    Ok(dest)
}

/// Write `bytes` to a temporary file in the destination directory, then
/// rename it over `dest`.
fn write_atomic(dest: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(dest).map_err(|err| err.error)?;
    Ok(())
}

/// Split cell text into lines, one output paragraph each. Empty text yields a
/// single empty line so every cell keeps a paragraph.
pub(crate) fn cell_lines(text: &str) -> Vec<&str> {
    let lines: Vec<&str> = text.lines().collect();
    if lines.is_empty() { vec![""] } else { lines }
}
