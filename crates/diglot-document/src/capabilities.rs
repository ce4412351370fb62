// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capability registry — which input and output formats this build supports.
//
// Each format backend sits behind a cargo feature. The registry is filled at
// startup from whatever was compiled in, so a missing backend surfaces as a
// typed error at the point of use instead of a link failure.

use std::collections::BTreeMap;

use diglot_core::types::{InputFormat, OutputFormat};
use tracing::debug;

use crate::extract::ExtractFn;
use crate::render::RenderFn;

/// Extractors and renderers available in this build.
#[derive(Clone)]
pub struct Capabilities {
    extractors: BTreeMap<InputFormat, ExtractFn>,
    renderers: BTreeMap<OutputFormat, RenderFn>,
}

impl Capabilities {
    /// A registry with nothing registered.
    pub fn empty() -> Self {
        Self {
            extractors: BTreeMap::new(),
            renderers: BTreeMap::new(),
        }
    }

    /// Register every backend compiled into this build.
    pub fn detect() -> Self {
        #[allow(unused_mut)]
        let mut caps = Self::empty();

        #[cfg(feature = "docx")]
        {
            caps.register_extractor(InputFormat::Docx, crate::extract::docx::extract);
            caps.register_renderer(OutputFormat::Docx, crate::render::docx::render);
        }
        #[cfg(feature = "pdf")]
        caps.register_extractor(InputFormat::Pdf, crate::extract::pdf::extract);
        #[cfg(feature = "epub")]
        {
            caps.register_extractor(InputFormat::Epub, crate::extract::epub::extract);
            caps.register_renderer(OutputFormat::Epub, crate::render::epub::render);
        }

        debug!(
            inputs = ?caps.input_formats(),
            outputs = ?caps.output_formats(),
            "Capabilities detected"
        );
        caps
    }

    pub fn register_extractor(&mut self, format: InputFormat, extractor: ExtractFn) {
        self.extractors.insert(format, extractor);
    }

    pub fn register_renderer(&mut self, format: OutputFormat, renderer: RenderFn) {
        self.renderers.insert(format, renderer);
    }

    pub fn extractor(&self, format: InputFormat) -> Option<ExtractFn> {
        self.extractors.get(&format).copied()
    }

    pub fn renderer(&self, format: OutputFormat) -> Option<RenderFn> {
        self.renderers.get(&format).copied()
    }

    pub fn input_formats(&self) -> Vec<InputFormat> {
        self.extractors.keys().copied().collect()
    }

    pub fn output_formats(&self) -> Vec<OutputFormat> {
        self.renderers.keys().copied().collect()
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::detect()
    }
}

impl std::fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capabilities")
            .field("inputs", &self.input_formats())
            .field("outputs", &self.output_formats())
            .finish()
    }
}
