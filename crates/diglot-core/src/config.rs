// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Render configuration: margins, fonts, right-to-left languages, image
// constraints and output selection. Loaded once per run and read-only after.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::types::{OutputFormat, TextDirection};

/// Font used when a language has no entry in the font table.
pub const FALLBACK_FONT: &str = "Times New Roman";

/// Page margins in inches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageMargins {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

impl Default for PageMargins {
    fn default() -> Self {
        Self {
            top: 2.5,
            bottom: 2.5,
            left: 2.0,
            right: 2.0,
        }
    }
}

/// Page dimensions in inches (US Letter by default).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl Default for PageSize {
    fn default() -> Self {
        Self {
            width: 8.5,
            height: 11.0,
        }
    }
}

/// Encoded format that normalized images are written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetImageFormat {
    #[serde(alias = "WEBP")]
    Webp,
    #[serde(alias = "jpg", alias = "JPEG", alias = "JPG")]
    Jpeg,
    #[serde(alias = "PNG")]
    Png,
}

/// Constraints applied by the image pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageSettings {
    /// When false, embedded images are passed through untouched.
    pub enable: bool,
    /// Maximum output width in pixels; 0 means no bound. Images are never
    /// upscaled.
    pub max_width: u32,
    pub format: TargetImageFormat,
    /// Encoder quality 1-100. Only lossy formats (JPEG) use it.
    pub quality: u8,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            enable: true,
            max_width: 800,
            format: TargetImageFormat::Webp,
            quality: 85,
        }
    }
}

/// Default language tags of the two editions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditionLanguages {
    pub left: String,
    pub right: String,
}

impl Default for EditionLanguages {
    fn default() -> Self {
        Self {
            left: "english".into(),
            right: "arabic".into(),
        }
    }
}

/// Immutable settings governing one processing run.
///
/// Every key is optional in the JSON form; missing keys take the built-in
/// defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub page_margins: PageMargins,
    pub page_size: PageSize,
    /// Display font per language tag.
    pub fonts: BTreeMap<String, String>,
    pub rtl_languages: BTreeSet<String>,
    /// Legacy key name: gates DOCX output.
    pub export_pdf: bool,
    pub export_epub: bool,
    pub image_processing: ImageSettings,
    pub languages: EditionLanguages,
}

impl Default for RenderConfig {
    fn default() -> Self {
        let fonts = [
            ("english", "Times New Roman"),
            ("arabic", "Traditional Arabic"),
            ("persian", "B Nazanin"),
            ("hebrew", "David"),
        ]
        .into_iter()
        .map(|(lang, font)| (lang.to_string(), font.to_string()))
        .collect();

        let rtl_languages = ["arabic", "persian", "hebrew"]
            .into_iter()
            .map(String::from)
            .collect();

        Self {
            page_margins: PageMargins::default(),
            page_size: PageSize::default(),
            fonts,
            rtl_languages,
            export_pdf: true,
            export_epub: true,
            image_processing: ImageSettings::default(),
            languages: EditionLanguages::default(),
        }
    }
}

impl RenderConfig {
    /// Load configuration from a JSON file.
    ///
    /// Never fails: an absent file silently yields the defaults, and an
    /// unreadable or malformed file is logged and also yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                return Self::default();
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "config unreadable, using defaults");
                return Self::default();
            }
        };

        match Self::from_json(&raw) {
            Ok(config) => {
                debug!(path = %path.display(), "config loaded");
                config
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "malformed config, using defaults");
                Self::default()
            }
        }
    }

    /// Parse configuration from a JSON string. Language tags in the font
    /// table and RTL set are normalised to lowercase.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let parsed: Self = serde_json::from_str(raw)?;
        Ok(parsed.normalised())
    }

    fn normalised(self) -> Self {
        Self {
            fonts: self
                .fonts
                .into_iter()
                .map(|(lang, font)| (lang.to_lowercase(), font))
                .collect(),
            rtl_languages: self
                .rtl_languages
                .into_iter()
                .map(|lang| lang.to_lowercase())
                .collect(),
            languages: EditionLanguages {
                left: self.languages.left.to_lowercase(),
                right: self.languages.right.to_lowercase(),
            },
            ..self
        }
    }

    /// Output formats enabled by this configuration, in render order.
    pub fn requested_formats(&self) -> Vec<OutputFormat> {
        let mut formats = Vec::with_capacity(2);
        if self.export_pdf {
            formats.push(OutputFormat::Docx);
        }
        if self.export_epub {
            formats.push(OutputFormat::Epub);
        }
        formats
    }

    /// Whether `language` is configured as right-to-left.
    pub fn is_rtl(&self, language: &str) -> bool {
        self.rtl_languages.contains(&language.to_lowercase())
    }

    /// Build the display profile for a language tag.
    pub fn language_profile(&self, language: &str) -> LanguageProfile {
        let tag = language.to_lowercase();
        let font = self
            .fonts
            .get(&tag)
            .cloned()
            .unwrap_or_else(|| FALLBACK_FONT.to_string());
        let direction = if self.rtl_languages.contains(&tag) {
            TextDirection::RightToLeft
        } else {
            TextDirection::LeftToRight
        };
        LanguageProfile {
            tag,
            font,
            direction,
        }
    }
}

/// Display settings for one edition's language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageProfile {
    /// Lowercase language tag, e.g. `arabic`.
    pub tag: String,
    pub font: String,
    pub direction: TextDirection,
}
