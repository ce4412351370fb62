// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// diglot-pipeline — Sequences one bilingual run: extract both editions,
// guard, align, render every requested format, and report what was produced.

pub mod orchestrator;
pub mod services;
pub mod state;

pub use orchestrator::{Edition, FormatFailure, Orchestrator, ProducedOutput, RunReport};
pub use services::RemoteStorage;
pub use state::{CancelFlag, RunState};
