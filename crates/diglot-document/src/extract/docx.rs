// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// DOCX extractor — walks the body paragraphs of `word/document.xml`, then
// appends one image unit per embedded image relationship.
//
// DOCX files are ZIP archives of Open XML parts. Body paragraphs are
// emitted in document order; paragraphs nested in tables or text boxes are
// not part of the body walk. Images are listed from `word/_rels/document.xml.rels` and
// follow all text units.

use std::io::Cursor;
use std::path::Path;

use diglot_core::error::ExtractionFailure;
use diglot_core::types::ContentUnit;
use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::{debug, instrument, warn};
use zip::ZipArchive;

use crate::package::{attr, read_entry, resolve_href};

const DOCUMENT_PART: &str = "word/document.xml";
const DOCUMENT_RELS: &str = "word/_rels/document.xml.rels";

/// A body paragraph as read from the document part.
#[derive(Debug, Default)]
struct RawParagraph {
    text: String,
    style: Option<String>,
}

/// Extract the ordered content units of a DOCX file.
#[instrument(skip(data), fields(path = %path.display(), bytes = data.len()))]
pub fn extract(path: &Path, data: &[u8]) -> Result<Vec<ContentUnit>, ExtractionFailure> {
    let mut archive = ZipArchive::new(Cursor::new(data))
        .map_err(|err| ExtractionFailure::parse(path, format!("not a DOCX archive: {err}")))?;

    let document = read_entry(&mut archive, DOCUMENT_PART)
        .map_err(|err| ExtractionFailure::parse(path, err))?
        .ok_or_else(|| ExtractionFailure::parse(path, "missing word/document.xml"))?;

    let paragraphs = parse_body_paragraphs(&document).map_err(|err| {
        ExtractionFailure::parse(path, format!("malformed document.xml: {err}"))
    })?;

    let mut units: Vec<ContentUnit> = paragraphs
        .into_iter()
        .filter(|p| !p.text.trim().is_empty())
        .enumerate()
        .map(|(index, p)| ContentUnit::paragraph(index, p.text).with_style(p.style))
        .collect();

    let text_count = units.len();
    for (reference, bytes) in embedded_images(&mut archive, path) {
        units.push(ContentUnit::image(units.len(), bytes, reference));
    }

    debug!(
        paragraphs = text_count,
        images = units.len() - text_count,
        "DOCX extracted"
    );
    Ok(units)
}

/// Elements whose paragraphs are not part of the body walk: tables, text
/// box content, and the fallback branch of markup-compatibility blocks.
fn is_excluded_container(local_name: &[u8]) -> bool {
    matches!(local_name, b"tbl" | b"txbxContent" | b"Fallback")
}

/// Stream `word/document.xml` and collect body-level paragraphs.
fn parse_body_paragraphs(xml: &[u8]) -> quick_xml::Result<Vec<RawParagraph>> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();

    let mut paragraphs = Vec::new();
    let mut current: Option<RawParagraph> = None;
    let mut excluded_depth = 0usize;
    // Paragraphs opened inside the current body paragraph.
    let mut nested_paragraphs = 0usize;
    let mut in_run = false;
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Eof => break,
            Event::Start(ref e) if is_excluded_container(e.local_name().as_ref()) => {
                excluded_depth += 1;
            }
            Event::End(ref e) if is_excluded_container(e.local_name().as_ref()) => {
                excluded_depth = excluded_depth.saturating_sub(1);
            }
            _ if excluded_depth > 0 => {}
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"p" if current.is_some() => nested_paragraphs += 1,
                b"p" => current = Some(RawParagraph::default()),
                b"r" => in_run = true,
                b"t" => in_text = current.is_some(),
                b"pStyle" if nested_paragraphs == 0 => set_style(&mut current, e),
                _ => {}
            },
            Event::Empty(ref e) => match e.local_name().as_ref() {
                b"p" if current.is_none() => paragraphs.push(RawParagraph::default()),
                b"pStyle" if nested_paragraphs == 0 => set_style(&mut current, e),
                b"tab" if in_run => push_char(&mut current, '\t'),
                b"br" | b"cr" if in_run => push_char(&mut current, '\n'),
                _ => {}
            },
            Event::Text(ref t) if in_text => {
                if let Some(p) = current.as_mut() {
                    p.text.push_str(&t.unescape()?);
                }
            }
            Event::End(ref e) => match e.local_name().as_ref() {
                b"p" if nested_paragraphs > 0 => nested_paragraphs -= 1,
                b"p" => {
                    if let Some(p) = current.take() {
                        paragraphs.push(p);
                    }
                }
                b"r" => in_run = false,
                b"t" => in_text = false,
                _ => {}
            },
            _ => {}
        }
        buf.clear();
    }

    Ok(paragraphs)
}

fn set_style(current: &mut Option<RawParagraph>, element: &quick_xml::events::BytesStart<'_>) {
    if let Some(p) = current.as_mut() {
        p.style = attr(element, b"val");
    }
}

fn push_char(current: &mut Option<RawParagraph>, c: char) {
    if let Some(p) = current.as_mut() {
        p.text.push(c);
    }
}

/// Embedded images in relationship order, as `(target, bytes)`. Unreadable
/// relationships or media parts are logged and skipped.
fn embedded_images(archive: &mut ZipArchive<Cursor<&[u8]>>, path: &Path) -> Vec<(String, Vec<u8>)> {
    let rels = match read_entry(archive, DOCUMENT_RELS) {
        Ok(Some(rels)) => rels,
        Ok(None) => return Vec::new(),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Cannot read document relationships");
            return Vec::new();
        }
    };

    let targets = match image_targets(&rels) {
        Ok(targets) => targets,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Malformed document relationships");
            return Vec::new();
        }
    };

    let mut images = Vec::with_capacity(targets.len());
    for target in targets {
        let part = resolve_href(DOCUMENT_PART, &target);
        match read_entry(archive, &part) {
            Ok(Some(bytes)) => images.push((target, bytes)),
            Ok(None) => warn!(part = %part, "Image relationship points at a missing part"),
            Err(err) => warn!(part = %part, error = %err, "Cannot read image part"),
        }
    }
    images
}

/// Internal targets of image relationships, in file order.
fn image_targets(rels: &[u8]) -> quick_xml::Result<Vec<String>> {
    let mut reader = Reader::from_reader(rels);
    let mut buf = Vec::new();
    let mut targets = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) | Event::Empty(ref e)
                if e.local_name().as_ref() == b"Relationship" =>
            {
                let is_image = attr(e, b"Type").is_some_and(|t| t.ends_with("/image"));
                let external = attr(e, b"TargetMode").is_some_and(|m| m == "External");
                if is_image && !external {
                    if let Some(target) = attr(e, b"Target") {
                        targets.push(target);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(targets)
}
