// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// EPUB extractor — one paragraph unit per content document, in reading
// order, with markup stripped.
//
// The package document is located through `META-INF/container.xml`. Reading
// order is the spine; a package with an empty spine falls back to the
// manifest order of its XHTML items.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;

use diglot_core::error::ExtractionFailure;
use diglot_core::types::{ContentUnit, SourceMeta};
use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::{debug, instrument, warn};
use zip::ZipArchive;

use crate::package::{attr, read_entry, resolve_href};

const CONTAINER: &str = "META-INF/container.xml";
const XHTML: &str = "application/xhtml+xml";

/// One manifest entry of the package document.
#[derive(Debug, Clone)]
struct ManifestItem {
    id: String,
    href: String,
    media_type: String,
}

/// The parts of the package document the extractor needs.
#[derive(Debug, Default)]
struct Package {
    manifest: Vec<ManifestItem>,
    spine: Vec<String>,
}

impl Package {
    /// Content documents in reading order.
    fn content_items(&self) -> Vec<&ManifestItem> {
        let by_id: HashMap<&str, &ManifestItem> = self
            .manifest
            .iter()
            .map(|item| (item.id.as_str(), item))
            .collect();

        let from_spine: Vec<&ManifestItem> = self
            .spine
            .iter()
            .filter_map(|idref| by_id.get(idref.as_str()).copied())
            .collect();
        if !from_spine.is_empty() {
            return from_spine;
        }

        self.manifest
            .iter()
            .filter(|item| item.media_type == XHTML)
            .collect()
    }
}

/// Extract one unit per content document, carrying the document's file name.
#[instrument(skip(data), fields(path = %path.display(), bytes = data.len()))]
pub fn extract(path: &Path, data: &[u8]) -> Result<Vec<ContentUnit>, ExtractionFailure> {
    let mut archive = ZipArchive::new(Cursor::new(data))
        .map_err(|err| ExtractionFailure::parse(path, format!("not an EPUB archive: {err}")))?;

    let container = read_entry(&mut archive, CONTAINER)
        .map_err(|err| ExtractionFailure::parse(path, err))?
        .ok_or_else(|| ExtractionFailure::parse(path, "missing META-INF/container.xml"))?;
    let opf_path = rootfile_path(&container)
        .map_err(|err| ExtractionFailure::parse(path, format!("malformed container.xml: {err}")))?
        .ok_or_else(|| ExtractionFailure::parse(path, "container.xml names no rootfile"))?;

    let opf = read_entry(&mut archive, &opf_path)
        .map_err(|err| ExtractionFailure::parse(path, err))?
        .ok_or_else(|| ExtractionFailure::parse(path, format!("missing package {opf_path}")))?;
    let package = parse_package(&opf)
        .map_err(|err| ExtractionFailure::parse(path, format!("malformed {opf_path}: {err}")))?;

    let mut units = Vec::new();
    for item in package.content_items() {
        let part = resolve_href(&opf_path, &item.href);
        let xhtml = match read_entry(&mut archive, &part) {
            Ok(Some(xhtml)) => xhtml,
            Ok(None) => {
                warn!(part = %part, "Manifest item missing from archive");
                continue;
            }
            Err(err) => {
                warn!(part = %part, error = %err, "Cannot read content document");
                continue;
            }
        };

        let text = match strip_markup(&xhtml) {
            Ok(text) => text,
            Err(err) => {
                warn!(part = %part, error = %err, "Cannot parse content document");
                continue;
            }
        };

        let chapter = Path::new(&part)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| part.clone());
        debug!(chapter = %chapter, chars = text.len(), "Chapter extracted");
        units.push(ContentUnit::paragraph(units.len(), text).with_meta(SourceMeta::Chapter(chapter)));
    }

    Ok(units)
}

/// `full-path` of the first rootfile in `container.xml`.
fn rootfile_path(xml: &[u8]) -> quick_xml::Result<Option<String>> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) | Event::Empty(ref e) if e.local_name().as_ref() == b"rootfile" => {
                if let Some(full_path) = attr(e, b"full-path") {
                    return Ok(Some(full_path));
                }
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
        buf.clear();
    }
}

/// Read manifest items and spine order from the package document.
fn parse_package(xml: &[u8]) -> quick_xml::Result<Package> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut package = Package::default();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) | Event::Empty(ref e) => match e.local_name().as_ref() {
                b"item" => {
                    if let (Some(id), Some(href)) = (attr(e, b"id"), attr(e, b"href")) {
                        package.manifest.push(ManifestItem {
                            id,
                            href,
                            media_type: attr(e, b"media-type").unwrap_or_default(),
                        });
                    }
                }
                b"itemref" => {
                    if let Some(idref) = attr(e, b"idref") {
                        package.spine.push(idref);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(package)
}

/// Element names whose end starts a new line of text.
fn is_block(name: &[u8]) -> bool {
    matches!(
        name,
        b"p" | b"div"
            | b"h1"
            | b"h2"
            | b"h3"
            | b"h4"
            | b"h5"
            | b"h6"
            | b"li"
            | b"blockquote"
            | b"section"
            | b"article"
            | b"tr"
            | b"pre"
    )
}

/// Text content of an XHTML document's `<body>`, one line per block element,
/// with whitespace collapsed and `script`/`style` dropped.
fn strip_markup(xhtml: &[u8]) -> quick_xml::Result<String> {
    let mut reader = Reader::from_reader(xhtml);
    reader.check_end_names(false);
    let mut buf = Vec::new();

    let mut raw = String::new();
    let mut in_body = false;
    let mut skip_depth = 0usize;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"body" => in_body = true,
                b"script" | b"style" => skip_depth += 1,
                _ => {}
            },
            Event::Empty(ref e) if in_body && e.local_name().as_ref() == b"br" => {
                break_line(&mut raw)
            }
            Event::Text(ref t) if in_body && skip_depth == 0 => {
                let encoded = String::from_utf8_lossy(t);
                push_collapsed(&mut raw, &html_escape::decode_html_entities(&encoded));
            }
            Event::CData(ref c) if in_body && skip_depth == 0 => {
                push_collapsed(&mut raw, &String::from_utf8_lossy(c));
            }
            Event::End(ref e) => {
                let name = e.local_name();
                match name.as_ref() {
                    b"body" => in_body = false,
                    b"script" | b"style" => skip_depth = skip_depth.saturating_sub(1),
                    other if in_body && is_block(other) => break_line(&mut raw),
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    let lines: Vec<&str> = raw
        .lines()
        .map(|line| line.trim_matches(' '))
        .filter(|line| !line.is_empty())
        .collect();
    Ok(lines.join("\n"))
}

/// Append `text` with every run of ASCII whitespace collapsed to one space.
/// Non-breaking spaces are content and survive.
fn push_collapsed(out: &mut String, text: &str) {
    for c in text.chars() {
        if c.is_ascii_whitespace() {
            if !(out.is_empty() || out.ends_with(' ') || out.ends_with('\n')) {
                out.push(' ');
            }
        } else {
            out.push(c);
        }
    }
}

fn break_line(out: &mut String) {
    while out.ends_with(' ') {
        out.pop();
    }
    out.push('\n');
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::package::PackageWriter;

    /// Build a minimal EPUB with the given `(file name, body xhtml)` chapters,
    /// listed in the spine in order.
    pub(crate) fn epub_with(chapters: &[(&str, &str)]) -> Vec<u8> {
        let mut manifest = String::new();
        let mut spine = String::new();
        for (i, (name, _)) in chapters.iter().enumerate() {
            manifest.push_str(&format!(
                r#"<item id="c{i}" href="text/{name}" media-type="application/xhtml+xml"/>"#
            ));
            spine.push_str(&format!(r#"<itemref idref="c{i}"/>"#));
        }
        let opf = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0"><metadata/><manifest>{manifest}</manifest><spine>{spine}</spine></package>"#
        );

        let mut writer = PackageWriter::new();
        writer.add_stored("mimetype", b"application/epub+zip").unwrap();
        writer
            .add_deflated(
                CONTAINER,
                br#"<?xml version="1.0"?><container xmlns="urn:oasis:names:tc:opendocument:xmlns:container" version="1.0"><rootfiles><rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/></rootfiles></container>"#,
            )
            .unwrap();
        writer.add_deflated("OEBPS/content.opf", opf.as_bytes()).unwrap();
        for (name, body) in chapters {
            let xhtml = format!(
                r#"<?xml version="1.0" encoding="UTF-8"?><html xmlns="http://www.w3.org/1999/xhtml"><head><title>t</title><style>p {{ color: red; }}</style></head><body>{body}</body></html>"#
            );
            writer
                .add_deflated(&format!("OEBPS/text/{name}"), xhtml.as_bytes())
                .unwrap();
        }
        writer.finish().unwrap()
    }

    #[test]
    fn chapters_in_spine_order_with_file_names() {
        let data = epub_with(&[
            ("ch1.xhtml", "<h1>One</h1><p>First   page\n text.</p>"),
            ("ch2.xhtml", "<p>Second&nbsp;chapter &amp; more</p><p>Line<br/>break</p>"),
        ]);
        let units = extract(Path::new("book.epub"), &data).unwrap();

        assert_eq!(units.len(), 2);
        assert_eq!(units[0].text(), Some("One\nFirst page text."));
        assert_eq!(units[0].source_meta, Some(SourceMeta::Chapter("ch1.xhtml".into())));
        assert_eq!(units[1].text(), Some("Second\u{a0}chapter & more\nLine\nbreak"));
        assert_eq!(units[1].sequence_index, 1);
    }

    #[test]
    fn style_and_head_text_are_dropped() {
        let text = strip_markup(
            br#"<html><head><title>Title</title></head><body><style>.x{}</style><p>Body</p><script>var a = 1;</script></body></html>"#,
        )
        .unwrap();
        assert_eq!(text, "Body");
    }

    #[test]
    fn named_and_numeric_entities_are_decoded() {
        let text = strip_markup(
            "<html><body><p>Caf&eacute; &amp; cr&egrave;me &#x2014; &lt;ok&gt;</p></body></html>".as_bytes(),
        )
        .unwrap();
        assert_eq!(text, "Café & crème \u{2014} <ok>");
    }

    #[test]
    fn empty_spine_falls_back_to_manifest_order() {
        let package = parse_package(
            br#"<package><manifest>
                <item id="css" href="s.css" media-type="text/css"/>
                <item id="b" href="b.xhtml" media-type="application/xhtml+xml"/>
                <item id="a" href="a.xhtml" media-type="application/xhtml+xml"/>
            </manifest><spine/></package>"#,
        )
        .unwrap();
        let hrefs: Vec<&str> = package.content_items().iter().map(|i| i.href.as_str()).collect();
        assert_eq!(hrefs, vec!["b.xhtml", "a.xhtml"]);
    }

    #[test]
    fn missing_container_is_a_parse_error() {
        let mut writer = PackageWriter::new();
        writer.add_stored("mimetype", b"application/epub+zip").unwrap();
        let err = extract(Path::new("book.epub"), &writer.finish().unwrap()).unwrap_err();
        assert!(matches!(err, ExtractionFailure::ParseError { .. }));
    }
}
