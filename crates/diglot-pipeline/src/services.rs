// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// External service seams. Implementations are constructed by the caller and
// handed to the orchestrator; nothing here reaches into global state.

use std::path::Path;

use diglot_core::error::Result;

/// Uploads a finished output file somewhere outside this machine.
///
/// Implementations report failures as `DiglotError::Upload`.
pub trait RemoteStorage: Send + Sync {
    /// Human-readable service name, used in logs.
    fn name(&self) -> &str;

    /// Upload the file at `local_path` and return the service's opaque
    /// identifier for it.
    fn upload(&self, local_path: &Path) -> Result<String>;
}
