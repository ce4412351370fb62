// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Orchestrator — owns one processing run from source files to output files.
//
// Both editions are extracted in parallel and joined before the empty-content
// guard. Rendering failures are collected per format; the run fails only when
// no requested format produced a file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use diglot_core::config::RenderConfig;
use diglot_core::error::{DiglotError, Result};
use diglot_core::types::{OutputFormat, Side};
use diglot_document::{Capabilities, Extraction, RenderContext, align, extract, render_to_file};
use tracing::{info, instrument, warn};

use crate::services::RemoteStorage;
use crate::state::{CancelFlag, RunState, RunTracker};

/// One source edition: a file plus the language it is written in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edition {
    pub path: PathBuf,
    /// Language tag, looked up in the font table and RTL set.
    pub language: String,
}

impl Edition {
    pub fn new(path: impl Into<PathBuf>, language: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            language: language.into().to_lowercase(),
        }
    }
}

/// A file written by the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProducedOutput {
    pub format: OutputFormat,
    pub path: PathBuf,
}

/// A requested format that could not be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatFailure {
    pub format: OutputFormat,
    pub reason: String,
}

/// Outcome of a successful run (at least one output produced).
#[derive(Debug, Clone)]
pub struct RunReport {
    pub outputs: Vec<ProducedOutput>,
    pub failures: Vec<FormatFailure>,
    pub left_units: usize,
    pub right_units: usize,
    pub pair_count: usize,
    /// Non-fatal problems met while extracting.
    pub warnings: Vec<String>,
    pub images_dropped: usize,
    /// Every state the run passed through, ending in `Done`.
    pub states: Vec<RunState>,
}

impl RunReport {
    pub fn final_state(&self) -> Option<&RunState> {
        self.states.last()
    }

    /// Some requested formats were written and some failed.
    pub fn is_partial(&self) -> bool {
        !self.outputs.is_empty() && !self.failures.is_empty()
    }
}

/// Runs the extraction, alignment and rendering pipeline.
pub struct Orchestrator {
    config: Arc<RenderConfig>,
    capabilities: Capabilities,
    remote: Option<Box<dyn RemoteStorage>>,
}

impl Orchestrator {
    pub fn new(config: Arc<RenderConfig>) -> Self {
        Self {
            config,
            capabilities: Capabilities::detect(),
            remote: None,
        }
    }

    /// Replace the detected backends.
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_remote_storage(mut self, storage: Box<dyn RemoteStorage>) -> Self {
        self.remote = Some(storage);
        self
    }

    /// Two editions using the default languages from the config.
    pub fn edition_pair(&self, left: impl Into<PathBuf>, right: impl Into<PathBuf>) -> (Edition, Edition) {
        (
            Edition::new(left, &self.config.languages.left),
            Edition::new(right, &self.config.languages.right),
        )
    }

    /// Produce `<output_base>.<ext>` for every enabled output format.
    #[instrument(skip_all, fields(left = %left.path.display(), right = %right.path.display(), output = %output_base.display()))]
    pub fn process_books(
        &self,
        left: &Edition,
        right: &Edition,
        output_base: &Path,
        cancel: &CancelFlag,
    ) -> Result<RunReport> {
        let mut tracker = RunTracker::new();

        let formats = self.config.requested_formats();
        if formats.is_empty() {
            return Err(tracker.fail(DiglotError::NoOutputRequested));
        }

        checkpoint(cancel, &mut tracker, "extraction")?;
        tracker.advance(RunState::Extracting(Side::Left));
        tracker.advance(RunState::Extracting(Side::Right));

        let caps = &self.capabilities;
        let images = &self.config.image_processing;
        let (left_result, right_result) = rayon::join(
            || extract(&left.path, caps, images),
            || extract(&right.path, caps, images),
        );
        let left_extraction = left_result.map_err(|err| tracker.fail(err))?;
        let right_extraction = right_result.map_err(|err| tracker.fail(err))?;

        for (side, extraction) in [(Side::Left, &left_extraction), (Side::Right, &right_extraction)] {
            if extraction.units.is_empty() {
                return Err(tracker.fail(DiglotError::EmptyContent { side }));
            }
        }

        let mut warnings = Vec::new();
        collect_warnings(Side::Left, &left_extraction, &mut warnings);
        collect_warnings(Side::Right, &right_extraction, &mut warnings);

        checkpoint(cancel, &mut tracker, "alignment")?;
        tracker.advance(RunState::Aligning);
        let pairs = align(&left_extraction.units, &right_extraction.units);

        let title = output_base
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Diglot".to_string());
        let ctx = RenderContext::new(&self.config, &left.language, &right.language, title);

        let mut outputs = Vec::new();
        let mut failures = Vec::new();
        for format in formats {
            checkpoint(cancel, &mut tracker, &format!("{format} rendering"))?;
            tracker.advance(RunState::Rendering(format));
            match render_to_file(format, &pairs, &ctx, caps, output_base) {
                Ok(path) => outputs.push(ProducedOutput { format, path }),
                Err(err) => {
                    warn!(%format, error = %err, "Output format failed, continuing");
                    failures.push(FormatFailure {
                        format,
                        reason: err.to_string(),
                    });
                }
            }
        }

        if outputs.is_empty() {
            return Err(tracker.fail(DiglotError::NoOutputProduced {
                failed: failures.len(),
            }));
        }

        tracker.advance(RunState::Done);
        info!(
            produced = outputs.len(),
            failed = failures.len(),
            pairs = pairs.len(),
            "Run complete"
        );

        Ok(RunReport {
            outputs,
            failures,
            left_units: left_extraction.units.len(),
            right_units: right_extraction.units.len(),
            pair_count: pairs.len(),
            warnings,
            images_dropped: left_extraction.images_dropped + right_extraction.images_dropped,
            states: tracker.history().to_vec(),
        })
    }

    /// Hand every produced file to the injected remote storage, returning the
    /// identifiers in output order.
    pub fn upload_outputs(&self, report: &RunReport) -> Result<Vec<String>> {
        let storage = self
            .remote
            .as_deref()
            .ok_or_else(|| DiglotError::Upload("no remote storage configured".into()))?;

        report
            .outputs
            .iter()
            .map(|output| -> Result<String> {
                let id = storage.upload(&output.path)?;
                info!(service = storage.name(), path = %output.path.display(), id = %id, "Uploaded");
                Ok(id)
            })
            .collect()
    }
}

/// Stop with `Cancelled` if the flag is set.
fn checkpoint(cancel: &CancelFlag, tracker: &mut RunTracker, stage: &str) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(tracker.fail(DiglotError::Cancelled {
            stage: stage.to_string(),
        }));
    }
    Ok(())
}

fn collect_warnings(side: Side, extraction: &Extraction, warnings: &mut Vec<String>) {
    if let Some(failure) = &extraction.failure {
        warnings.push(format!("{side} edition: {failure}"));
    }
    if extraction.images_dropped > 0 {
        warnings.push(format!(
            "{side} edition: {} embedded image(s) could not be normalized and were skipped",
            extraction.images_dropped
        ));
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};
    use std::sync::Mutex;

    use diglot_core::types::AlignedPair;
    use zip::write::SimpleFileOptions;

    use super::*;

    fn docx_bytes(paragraphs: &[&str]) -> Vec<u8> {
        let body: String = paragraphs
            .iter()
            .map(|t| format!("<w:p><w:r><w:t>{t}</w:t></w:r></w:p>"))
            .collect();
        let document = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
        );
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("word/document.xml", SimpleFileOptions::default()).unwrap();
        zip.write_all(document.as_bytes()).unwrap();
        zip.finish().unwrap().into_inner()
    }

    fn write_docx(dir: &Path, name: &str, paragraphs: &[&str]) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, docx_bytes(paragraphs)).unwrap();
        path
    }

    fn orchestrator() -> Orchestrator {
        Orchestrator::new(Arc::new(RenderConfig::default()))
    }

    fn failing_epub(_: &[AlignedPair<'_>], _: &RenderContext<'_>) -> Result<Vec<u8>> {
        Err(DiglotError::render(OutputFormat::Epub, "disk on fire"))
    }

    #[test]
    fn full_run_writes_both_formats() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_docx(dir.path(), "en.docx", &["one", "two", "three"]);
        let b = write_docx(dir.path(), "ar.docx", &["واحد", "اثنان", "ثلاثة", "أربعة", "خمسة"]);
        let orch = orchestrator();
        let (left, right) = orch.edition_pair(a, b);

        let report = orch
            .process_books(&left, &right, &dir.path().join("book"), &CancelFlag::new())
            .unwrap();

        assert_eq!(report.pair_count, 5);
        assert_eq!((report.left_units, report.right_units), (3, 5));
        assert!(!report.is_partial());
        assert!(dir.path().join("book.docx").exists());
        assert!(dir.path().join("book.epub").exists());
        assert_eq!(
            report.states,
            vec![
                RunState::Idle,
                RunState::Extracting(Side::Left),
                RunState::Extracting(Side::Right),
                RunState::Aligning,
                RunState::Rendering(OutputFormat::Docx),
                RunState::Rendering(OutputFormat::Epub),
                RunState::Done,
            ]
        );
    }

    #[test]
    fn empty_edition_fails_before_alignment() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_docx(dir.path(), "a.docx", &["   ", ""]);
        let b = write_docx(dir.path(), "b.docx", &["1", "2", "3", "4"]);
        let orch = orchestrator();
        let (left, right) = orch.edition_pair(a, b);

        let err = orch
            .process_books(&left, &right, &dir.path().join("out"), &CancelFlag::new())
            .unwrap_err();
        assert!(matches!(err, DiglotError::EmptyContent { side: Side::Left }));
        assert!(!dir.path().join("out.docx").exists());
        assert!(!dir.path().join("out.epub").exists());
    }

    #[test]
    fn one_failing_format_is_a_partial_success() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_docx(dir.path(), "a.docx", &["x"]);
        let b = write_docx(dir.path(), "b.docx", &["y"]);
        let mut caps = Capabilities::detect();
        caps.register_renderer(OutputFormat::Epub, failing_epub);
        let orch = orchestrator().with_capabilities(caps);
        let (left, right) = orch.edition_pair(a, b);

        let report = orch
            .process_books(&left, &right, &dir.path().join("out"), &CancelFlag::new())
            .unwrap();
        assert!(report.is_partial());
        assert_eq!(report.outputs.len(), 1);
        assert_eq!(report.outputs[0].format, OutputFormat::Docx);
        assert_eq!(report.failures[0].format, OutputFormat::Epub);
        assert!(!dir.path().join("out.epub").exists());
    }

    #[test]
    fn all_formats_failing_fails_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_docx(dir.path(), "a.docx", &["x"]);
        let b = write_docx(dir.path(), "b.docx", &["y"]);
        let mut caps = Capabilities::empty();
        caps.register_extractor(
            diglot_core::types::InputFormat::Docx,
            diglot_document::extract::docx::extract,
        );
        let orch = orchestrator().with_capabilities(caps);
        let (left, right) = orch.edition_pair(a, b);

        let err = orch
            .process_books(&left, &right, &dir.path().join("out"), &CancelFlag::new())
            .unwrap_err();
        assert!(matches!(err, DiglotError::NoOutputProduced { failed: 2 }));
    }

    #[test]
    fn no_requested_format_fails_before_extraction() {
        let config = RenderConfig {
            export_pdf: false,
            export_epub: false,
            ..RenderConfig::default()
        };
        let orch = Orchestrator::new(Arc::new(config));
        // Neither file exists; extraction would report an I/O error.
        let (left, right) = orch.edition_pair("/nope/a.docx", "/nope/b.docx");
        let err = orch
            .process_books(&left, &right, Path::new("/nope/out"), &CancelFlag::new())
            .unwrap_err();
        assert!(matches!(err, DiglotError::NoOutputRequested));
    }

    #[test]
    fn unsupported_input_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let b = write_docx(dir.path(), "b.docx", &["y"]);
        let orch = orchestrator();
        let (left, right) = orch.edition_pair(dir.path().join("notes.txt"), b);
        let err = orch
            .process_books(&left, &right, &dir.path().join("out"), &CancelFlag::new())
            .unwrap_err();
        assert!(matches!(err, DiglotError::UnsupportedFormat(_)));
    }

    #[test]
    fn cancelled_run_stops_at_the_next_stage() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_docx(dir.path(), "a.docx", &["x"]);
        let b = write_docx(dir.path(), "b.docx", &["y"]);
        let orch = orchestrator();
        let (left, right) = orch.edition_pair(a, b);
        let cancel = CancelFlag::new();
        cancel.cancel();

        let err = orch
            .process_books(&left, &right, &dir.path().join("out"), &cancel)
            .unwrap_err();
        assert!(matches!(err, DiglotError::Cancelled { ref stage } if stage == "extraction"));
        assert!(!dir.path().join("out.docx").exists());
    }

    #[derive(Default)]
    struct RecordingStorage {
        uploaded: Mutex<Vec<PathBuf>>,
    }

    impl RemoteStorage for Arc<RecordingStorage> {
        fn name(&self) -> &str {
            "recording"
        }

        fn upload(&self, local_path: &Path) -> Result<String> {
            let mut uploaded = self.uploaded.lock().unwrap();
            uploaded.push(local_path.to_path_buf());
            Ok(format!("remote-{}", uploaded.len()))
        }
    }

    #[test]
    fn outputs_are_uploaded_through_injected_storage() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_docx(dir.path(), "a.docx", &["x"]);
        let b = write_docx(dir.path(), "b.docx", &["y"]);
        let storage = Arc::new(RecordingStorage::default());
        let orch = orchestrator().with_remote_storage(Box::new(Arc::clone(&storage)));
        let (left, right) = orch.edition_pair(a, b);

        let report = orch
            .process_books(&left, &right, &dir.path().join("out"), &CancelFlag::new())
            .unwrap();
        let ids = orch.upload_outputs(&report).unwrap();

        assert_eq!(ids, vec!["remote-1", "remote-2"]);
        assert_eq!(
            *storage.uploaded.lock().unwrap(),
            vec![dir.path().join("out.docx"), dir.path().join("out.epub")]
        );
    }

    #[test]
    fn upload_without_storage_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_docx(dir.path(), "a.docx", &["x"]);
        let b = write_docx(dir.path(), "b.docx", &["y"]);
        let orch = orchestrator();
        let (left, right) = orch.edition_pair(a, b);
        let report = orch
            .process_books(&left, &right, &dir.path().join("out"), &CancelFlag::new())
            .unwrap();

        assert!(matches!(orch.upload_outputs(&report), Err(DiglotError::Upload(_))));
    }
}
