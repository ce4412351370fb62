// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// DOCX renderer — a single two-column table, one row per aligned pair.
//
// The package is the minimal WordprocessingML set: content types, package
// relationships, core properties, the document part and a styles part.
// Lengths are in twips (1/1440 inch).

use std::fmt::Write as _;

use diglot_core::error::DiglotError;
use diglot_core::types::{AlignedPair, OutputFormat, Side};
use tracing::{debug, instrument};

use super::{RenderContext, cell_lines};
use crate::package::{PackageWriter, escape};

const TWIPS_PER_INCH: f64 = 1440.0;
const HEADER_FOOTER_TWIPS: u32 = 720;

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/><Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/></Relationships>"#;

const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

fn twips(inches: f64) -> u32 {
    (inches * TWIPS_PER_INCH).round().max(0.0) as u32
}

/// Page and column geometry derived from the config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Geometry {
    page_width: u32,
    page_height: u32,
    top: u32,
    bottom: u32,
    left: u32,
    right: u32,
    column: u32,
}

impl Geometry {
    fn from_context(ctx: &RenderContext<'_>) -> Self {
        let margins = &ctx.config.page_margins;
        let size = &ctx.config.page_size;
        let page_width = twips(size.width);
        let left = twips(margins.left);
        let right = twips(margins.right);
        let text_width = page_width.saturating_sub(left.saturating_add(right));
        Self {
            page_width,
            page_height: twips(size.height),
            top: twips(margins.top),
            bottom: twips(margins.bottom),
            left,
            right,
            column: text_width / 2,
        }
    }
}

/// Render the pairs as a complete `.docx` package.
#[instrument(skip_all, fields(pairs = pairs.len()))]
pub fn render(pairs: &[AlignedPair<'_>], ctx: &RenderContext<'_>) -> Result<Vec<u8>, DiglotError> {
    let geometry = Geometry::from_context(ctx);
    debug!(column_twips = geometry.column, "Laying out two-column table");

    let document = document_xml(pairs, ctx, &geometry);
    let styles = styles_xml(ctx);
    let core = core_xml(&ctx.title);

    let fail = |err: zip::result::ZipError| DiglotError::render(OutputFormat::Docx, err);
    let mut writer = PackageWriter::new();
    writer.add_deflated("[Content_Types].xml", CONTENT_TYPES.as_bytes()).map_err(fail)?;
    writer.add_deflated("_rels/.rels", PACKAGE_RELS.as_bytes()).map_err(fail)?;
    writer.add_deflated("docProps/core.xml", core.as_bytes()).map_err(fail)?;
    writer.add_deflated("word/_rels/document.xml.rels", DOCUMENT_RELS.as_bytes()).map_err(fail)?;
    writer.add_deflated("word/document.xml", document.as_bytes()).map_err(fail)?;
    writer.add_deflated("word/styles.xml", styles.as_bytes()).map_err(fail)?;
    writer.finish().map_err(fail)
}

fn document_xml(pairs: &[AlignedPair<'_>], ctx: &RenderContext<'_>, g: &Geometry) -> String {
    let mut xml = String::with_capacity(512 + pairs.len() * 512);
    let _ = write!(
        xml,
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="{W_NS}"><w:body>"#
    );

    // A table must have at least one row.
    if !pairs.is_empty() {
        let border = |edge: &str| format!(r#"<w:{edge} w:val="single" w:sz="4" w:space="0" w:color="auto"/>"#);
        let borders: String = ["top", "left", "bottom", "right", "insideH", "insideV"]
            .into_iter()
            .map(border)
            .collect();
        let _ = write!(
            xml,
            r#"<w:tbl><w:tblPr><w:tblW w:w="{width}" w:type="dxa"/><w:tblLayout w:type="fixed"/><w:tblBorders>{borders}</w:tblBorders></w:tblPr><w:tblGrid><w:gridCol w:w="{col}"/><w:gridCol w:w="{col}"/></w:tblGrid>"#,
            width = g.column * 2,
            col = g.column,
        );
        for pair in pairs {
            xml.push_str("<w:tr>");
            for side in [Side::Left, Side::Right] {
                push_cell(&mut xml, pair.text(side), side, ctx, g.column);
            }
            xml.push_str("</w:tr>");
        }
        xml.push_str("</w:tbl>");
    }

    let _ = write!(
        xml,
        r#"<w:p/><w:sectPr><w:pgSz w:w="{pw}" w:h="{ph}"/><w:pgMar w:top="{top}" w:right="{right}" w:bottom="{bottom}" w:left="{left}" w:header="{hf}" w:footer="{hf}" w:gutter="0"/></w:sectPr></w:body></w:document>"#,
        pw = g.page_width,
        ph = g.page_height,
        top = g.top,
        right = g.right,
        bottom = g.bottom,
        left = g.left,
        hf = HEADER_FOOTER_TWIPS,
    );
    xml
}

fn push_cell(xml: &mut String, text: &str, side: Side, ctx: &RenderContext<'_>, width: u32) {
    let font = escape(&ctx.profile(side).font).into_owned();
    let right_aligned = ctx.right_aligned(side);

    let _ = write!(xml, r#"<w:tc><w:tcPr><w:tcW w:w="{width}" w:type="dxa"/></w:tcPr>"#);
    for line in cell_lines(text) {
        xml.push_str("<w:p>");
        if right_aligned {
            xml.push_str(r#"<w:pPr><w:jc w:val="right"/></w:pPr>"#);
        }
        if !line.is_empty() {
            let _ = write!(
                xml,
                r#"<w:r><w:rPr><w:rFonts w:ascii="{font}" w:hAnsi="{font}" w:cs="{font}"/>{rtl}</w:rPr>"#,
                rtl = if right_aligned { "<w:rtl/>" } else { "" },
            );
            for (i, segment) in line.split('\t').enumerate() {
                if i > 0 {
                    xml.push_str("<w:tab/>");
                }
                if !segment.is_empty() {
                    let _ = write!(xml, r#"<w:t xml:space="preserve">{}</w:t>"#, escape(segment));
                }
            }
            xml.push_str("</w:r>");
        }
        xml.push_str("</w:p>");
    }
    xml.push_str("</w:tc>");
}

fn styles_xml(ctx: &RenderContext<'_>) -> String {
    let font = escape(&ctx.left.font);
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="{W_NS}"><w:docDefaults><w:rPrDefault><w:rPr><w:rFonts w:ascii="{font}" w:hAnsi="{font}" w:cs="{font}"/><w:sz w:val="24"/></w:rPr></w:rPrDefault></w:docDefaults><w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style><w:style w:type="table" w:default="1" w:styleId="TableNormal"><w:name w:val="Normal Table"/></w:style></w:styles>"#
    )
}

fn core_xml(title: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:title>{}</dc:title><dc:creator>Diglot</dc:creator></cp:coreProperties>"#,
        escape(title)
    )
}
