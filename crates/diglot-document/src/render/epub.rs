// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// EPUB renderer — a single-chapter EPUB 3 book with one flex row per pair.

use std::fmt::Write as _;

use diglot_core::error::DiglotError;
use diglot_core::types::{AlignedPair, OutputFormat, Side};
use tracing::{debug, instrument};

use super::{RenderContext, cell_lines};
use crate::package::{PackageWriter, escape};

/// Fixed modification stamp. EPUB 3 requires one; a constant keeps the
/// package byte-identical across runs.
const MODIFIED: &str = "2000-01-01T00:00:00Z";

const CHAPTER_FILE: &str = "chapter.xhtml";

const CONTAINER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container"><rootfiles><rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/></rootfiles></container>"#;

/// BCP 47 code for the language tags the default config knows about.
fn language_code(tag: &str) -> &'static str {
    match tag {
        "english" => "en",
        "arabic" => "ar",
        "persian" | "farsi" => "fa",
        "hebrew" => "he",
        "urdu" => "ur",
        "french" => "fr",
        "german" => "de",
        "spanish" => "es",
        _ => "und",
    }
}

/// FNV-1a over the chapter body, used as a stable book identifier.
fn content_id(chapter: &str) -> String {
    let hash = chapter.bytes().fold(0xcbf2_9ce4_8422_2325_u64, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
    });
    format!("urn:diglot:{hash:016x}")
}

/// Render the pairs as a complete `.epub` package.
#[instrument(skip_all, fields(pairs = pairs.len()))]
pub fn render(pairs: &[AlignedPair<'_>], ctx: &RenderContext<'_>) -> Result<Vec<u8>, DiglotError> {
    let chapter = chapter_xhtml(pairs, ctx);
    let title = escape(&ctx.title);
    let opf = package_opf(&title, &content_id(&chapter), ctx);
    let nav = nav_xhtml(&title);
    let ncx = toc_ncx(&title, &content_id(&chapter));
    debug!(chapter_bytes = chapter.len(), "Chapter built");

    let fail = |err: zip::result::ZipError| DiglotError::render(OutputFormat::Epub, err);
    let mut writer = PackageWriter::new();
    writer.add_stored("mimetype", b"application/epub+zip").map_err(fail)?;
    writer.add_deflated("META-INF/container.xml", CONTAINER_XML.as_bytes()).map_err(fail)?;
    writer.add_deflated("OEBPS/content.opf", opf.as_bytes()).map_err(fail)?;
    writer.add_deflated("OEBPS/nav.xhtml", nav.as_bytes()).map_err(fail)?;
    writer.add_deflated("OEBPS/toc.ncx", ncx.as_bytes()).map_err(fail)?;
    writer.add_deflated(&format!("OEBPS/{CHAPTER_FILE}"), chapter.as_bytes()).map_err(fail)?;
    writer.finish().map_err(fail)
}

fn chapter_xhtml(pairs: &[AlignedPair<'_>], ctx: &RenderContext<'_>) -> String {
    let mut xhtml = String::with_capacity(512 + pairs.len() * 256);
    let _ = write!(
        xhtml,
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops" lang="{lang}" xml:lang="{lang}"><head><meta charset="utf-8"/><title>{title}</title></head><body>
"#,
        lang = language_code(&ctx.left.tag),
        title = escape(&ctx.title),
    );

    for pair in pairs {
        xhtml.push_str(r#"<div class="row" style="display:flex">"#);
        for side in [Side::Left, Side::Right] {
            push_side(&mut xhtml, pair.text(side), side, ctx);
        }
        xhtml.push_str("</div>\n");
    }

    xhtml.push_str("</body></html>\n");
    xhtml
}

fn push_side(xhtml: &mut String, text: &str, side: Side, ctx: &RenderContext<'_>) {
    let profile = ctx.profile(side);
    // Quotes would terminate the CSS string.
    let stripped = profile.font.replace(['\'', '"'], "");
    let font = escape(&stripped);
    let mut style = format!("flex:1; font-family:'{font}'");
    if ctx.right_aligned(side) {
        style.push_str("; text-align:right; direction:rtl");
    }

    let _ = write!(
        xhtml,
        r#"<div class="{side}" lang="{lang}" style="{style}">"#,
        lang = language_code(&profile.tag),
    );
    for line in cell_lines(text) {
        let _ = write!(xhtml, "<p>{}</p>", escape(line));
    }
    xhtml.push_str("</div>");
}

fn package_opf(title: &str, identifier: &str, ctx: &RenderContext<'_>) -> String {
    let left = language_code(&ctx.left.tag);
    let right = language_code(&ctx.right.tag);
    let right_language = if right != left {
        format!("<dc:language>{right}</dc:language>")
    } else {
        String::new()
    };
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="bookid"><metadata xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:identifier id="bookid">{identifier}</dc:identifier><dc:title>{title}</dc:title><dc:language>{left}</dc:language>{right_language}<meta property="dcterms:modified">{MODIFIED}</meta></metadata><manifest><item id="nav" href="nav.xhtml" media-type="application/xhtml+xml" properties="nav"/><item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/><item id="chapter" href="{CHAPTER_FILE}" media-type="application/xhtml+xml"/></manifest><spine toc="ncx"><itemref idref="chapter"/></spine></package>"#
    )
}

fn nav_xhtml(title: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops"><head><title>{title}</title></head><body><nav epub:type="toc" id="toc"><ol><li><a href="{CHAPTER_FILE}">{title}</a></li></ol></nav></body></html>"#
    )
}

fn toc_ncx(title: &str, identifier: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1"><head><meta name="dtb:uid" content="{identifier}"/><meta name="dtb:depth" content="1"/></head><docTitle><text>{title}</text></docTitle><navMap><navPoint id="chapter" playOrder="1"><navLabel><text>{title}</text></navLabel><content src="{CHAPTER_FILE}"/></navPoint></navMap></ncx>"#
    )
}
