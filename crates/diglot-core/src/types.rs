// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Diglot bilingual formatter.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::DiglotError;

/// Supported source document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum InputFormat {
    Docx,
    Pdf,
    Epub,
}

impl InputFormat {
    /// Infer the input format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "docx" => Some(Self::Docx),
            "pdf" => Some(Self::Pdf),
            "epub" => Some(Self::Epub),
            _ => None,
        }
    }

    /// Resolve the format of `path` from its extension alone. Never touches
    /// the filesystem.
    pub fn from_path(path: &Path) -> Result<Self, DiglotError> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
            .ok_or_else(|| DiglotError::UnsupportedFormat(path.display().to_string()))
    }
}

impl std::fmt::Display for InputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Docx => "DOCX",
            Self::Pdf => "PDF",
            Self::Epub => "EPUB",
        })
    }
}

/// Bilingual output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Two-column table document.
    Docx,
    /// Single-chapter book of flex rows.
    Epub,
}

impl OutputFormat {
    /// File extension (without the dot) for files of this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Docx => "docx",
            Self::Epub => "epub",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Docx => "DOCX",
            Self::Epub => "EPUB",
        })
    }
}

/// Which of the two editions a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Edition A, rendered in the first column.
    Left,
    /// Edition B, rendered in the second column.
    Right,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Left => "left",
            Self::Right => "right",
        })
    }
}

/// Horizontal text direction of a language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextDirection {
    LeftToRight,
    RightToLeft,
}

impl TextDirection {
    pub fn is_rtl(&self) -> bool {
        matches!(self, Self::RightToLeft)
    }
}

/// Discriminant of a [`ContentUnit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitKind {
    Paragraph,
    Image,
}

/// Payload of a content unit. Text exists only on paragraphs and image data
/// only on images.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitBody {
    /// Raw extracted text, not yet re-flowed.
    Paragraph { text: String },
    /// Encoded image bytes plus an identifier relative to the source package.
    Image { bytes: Vec<u8>, reference: String },
}

/// Where in the source document a unit came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceMeta {
    /// 1-based PDF page number.
    Page(u32),
    /// EPUB content document file name.
    Chapter(String),
}

/// One structural element extracted from a source document.
///
/// Units are built once by an extractor and never mutated afterwards; image
/// normalization produces a replacement unit through [`ContentUnit::with_image_bytes`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentUnit {
    /// Position in the source document. Monotonic within one extraction.
    pub sequence_index: usize,
    pub body: UnitBody,
    /// Source style label such as `Heading1`, when the format carries one.
    pub style_name: Option<String>,
    pub source_meta: Option<SourceMeta>,
}

impl ContentUnit {
    pub fn paragraph(sequence_index: usize, text: impl Into<String>) -> Self {
        Self {
            sequence_index,
            body: UnitBody::Paragraph { text: text.into() },
            style_name: None,
            source_meta: None,
        }
    }

    pub fn image(sequence_index: usize, bytes: Vec<u8>, reference: impl Into<String>) -> Self {
        Self {
            sequence_index,
            body: UnitBody::Image {
                bytes,
                reference: reference.into(),
            },
            style_name: None,
            source_meta: None,
        }
    }

    pub fn with_style(mut self, style_name: Option<String>) -> Self {
        self.style_name = style_name;
        self
    }

    pub fn with_meta(mut self, meta: SourceMeta) -> Self {
        self.source_meta = Some(meta);
        self
    }

    /// Replace the encoded bytes of an image unit, keeping its position and
    /// reference. Paragraph units are returned unchanged.
    pub fn with_image_bytes(self, new_bytes: Vec<u8>) -> Self {
        match self.body {
            UnitBody::Image { reference, .. } => Self {
                body: UnitBody::Image {
                    bytes: new_bytes,
                    reference,
                },
                ..self
            },
            UnitBody::Paragraph { .. } => self,
        }
    }

    pub fn kind(&self) -> UnitKind {
        match self.body {
            UnitBody::Paragraph { .. } => UnitKind::Paragraph,
            UnitBody::Image { .. } => UnitKind::Image,
        }
    }

    /// Paragraph text, or `None` for image units.
    pub fn text(&self) -> Option<&str> {
        match &self.body {
            UnitBody::Paragraph { text } => Some(text),
            UnitBody::Image { .. } => None,
        }
    }
}

/// One row of the bilingual output, borrowing units from both editions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignedPair<'a> {
    pub left: Option<&'a ContentUnit>,
    pub right: Option<&'a ContentUnit>,
    /// 0-based row position.
    pub pair_index: usize,
}

impl<'a> AlignedPair<'a> {
    /// The unit on `side`, if present.
    pub fn unit(&self, side: Side) -> Option<&'a ContentUnit> {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    /// Text to render on `side`: the paragraph text, or empty when the side
    /// is absent or holds an image.
    pub fn text(&self, side: Side) -> &'a str {
        self.unit(side).and_then(ContentUnit::text).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_dispatch_is_case_insensitive() {
        assert_eq!(InputFormat::from_extension("DOCX"), Some(InputFormat::Docx));
        assert_eq!(InputFormat::from_extension("Pdf"), Some(InputFormat::Pdf));
        assert_eq!(InputFormat::from_extension("epub"), Some(InputFormat::Epub));
        assert_eq!(InputFormat::from_extension("md"), None);
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        let err = InputFormat::from_path(Path::new("notes.txt")).unwrap_err();
        assert!(matches!(err, DiglotError::UnsupportedFormat(_)));

        let err = InputFormat::from_path(Path::new("no_extension")).unwrap_err();
        assert!(matches!(err, DiglotError::UnsupportedFormat(_)));
    }

    #[test]
    fn image_bytes_replacement_keeps_position() {
        let unit = ContentUnit::image(7, vec![1, 2, 3], "media/image1.png");
        let replaced = unit.with_image_bytes(vec![9]);
        assert_eq!(replaced.sequence_index, 7);
        assert_eq!(
            replaced.body,
            UnitBody::Image {
                bytes: vec![9],
                reference: "media/image1.png".into()
            }
        );
    }

    #[test]
    fn pair_text_is_empty_for_absent_or_image_sides() {
        let para = ContentUnit::paragraph(0, "hello");
        let img = ContentUnit::image(1, vec![], "a.png");
        let pair = AlignedPair {
            left: Some(&para),
            right: Some(&img),
            pair_index: 0,
        };
        assert_eq!(pair.text(Side::Left), "hello");
        assert_eq!(pair.text(Side::Right), "");

        let half = AlignedPair {
            left: None,
            right: Some(&para),
            pair_index: 1,
        };
        assert_eq!(half.text(Side::Left), "");
    }
}
