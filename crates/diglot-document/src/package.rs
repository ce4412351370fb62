// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Zip package helpers shared by the DOCX and EPUB readers and writers:
// entry lookup, attribute access on quick-xml events, XML escaping, and a
// deterministic package writer.

use std::borrow::Cow;
use std::io::{Cursor, Read, Seek, Write};

use quick_xml::events::BytesStart;
use zip::result::{ZipError, ZipResult};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Read a whole archive entry. Missing entries yield `Ok(None)`.
pub(crate) fn read_entry<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> ZipResult<Option<Vec<u8>>> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(err) => return Err(err),
    };
    let mut data = Vec::with_capacity(file.size() as usize);
    file.read_to_end(&mut data)?;
    Ok(Some(data))
}

/// Value of the attribute whose local name is `name` (namespace prefix
/// ignored), unescaped.
pub(crate) fn attr(element: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == name)
        .and_then(|a| a.unescape_value().ok().map(Cow::into_owned))
}

/// Escape text for use in XML content or attribute values.
pub(crate) fn escape(text: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(text)
}

/// Resolve `href` relative to the directory of `base` inside a package
/// (`OEBPS/content.opf` + `text/ch1.xhtml` -> `OEBPS/text/ch1.xhtml`).
pub(crate) fn resolve_href(base: &str, href: &str) -> String {
    let href = href.split('#').next().unwrap_or(href);
    let mut parts: Vec<&str> = match base.rfind('/') {
        _ if href.starts_with('/') => Vec::new(),
        Some(idx) => base[..idx].split('/').collect(),
        None => Vec::new(),
    };
    for segment in href.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

/// Writes zip packages whose bytes depend only on the entries added: every
/// entry carries the same fixed timestamp.
pub(crate) struct PackageWriter {
    zip: ZipWriter<Cursor<Vec<u8>>>,
}

impl PackageWriter {
    pub(crate) fn new() -> Self {
        Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
        }
    }

    fn options(method: CompressionMethod) -> SimpleFileOptions {
        SimpleFileOptions::default()
            .compression_method(method)
            .last_modified_time(zip::DateTime::default())
    }

    /// Add an uncompressed entry (EPUB requires this for `mimetype`).
    pub(crate) fn add_stored(&mut self, name: &str, data: &[u8]) -> ZipResult<()> {
        self.zip
            .start_file(name, Self::options(CompressionMethod::Stored))?;
        self.zip.write_all(data)?;
        Ok(())
    }

    pub(crate) fn add_deflated(&mut self, name: &str, data: &[u8]) -> ZipResult<()> {
        self.zip
            .start_file(name, Self::options(CompressionMethod::Deflated))?;
        self.zip.write_all(data)?;
        Ok(())
    }

    pub(crate) fn finish(self) -> ZipResult<Vec<u8>> {
        Ok(self.zip.finish()?.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hrefs_resolve_against_package_directory() {
        assert_eq!(resolve_href("OEBPS/content.opf", "text/ch1.xhtml"), "OEBPS/text/ch1.xhtml");
        assert_eq!(resolve_href("content.opf", "ch1.xhtml#top"), "ch1.xhtml");
        assert_eq!(resolve_href("OPS/pkg/content.opf", "../text/a.xhtml"), "OPS/text/a.xhtml");
        assert_eq!(resolve_href("word/document.xml", "/word/media/i.png"), "word/media/i.png");
    }

    #[test]
    fn written_package_reads_back() {
        let mut writer = PackageWriter::new();
        writer.add_stored("mimetype", b"application/epub+zip").unwrap();
        writer.add_deflated("a/b.xml", b"<x/>").unwrap();
        let bytes = writer.finish().unwrap();

        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(read_entry(&mut archive, "a/b.xml").unwrap().unwrap(), b"<x/>");
        assert!(read_entry(&mut archive, "missing").unwrap().is_none());
    }

    #[test]
    fn escape_handles_markup_characters() {
        assert_eq!(escape("a < b & \"c\""), "a &lt; b &amp; &quot;c&quot;");
    }
}
