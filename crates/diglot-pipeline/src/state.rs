// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Run state machine and cooperative cancellation.
//
// A run only ever moves forward:
//   Idle -> Extracting(left) -> Extracting(right) -> Aligning
//        -> Rendering(format)... -> Done
// with Failed reachable from any non-terminal state.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use diglot_core::error::DiglotError;
use diglot_core::types::{OutputFormat, Side};
use tracing::{debug, error, warn};

/// Where a run currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Extracting(Side),
    Aligning,
    Rendering(OutputFormat),
    Done,
    /// Terminal failure, carrying the error's display text.
    Failed(String),
}

impl RunState {
    /// Position in the linear order. `None` for the failure terminal.
    fn rank(&self) -> Option<u8> {
        Some(match self {
            Self::Idle => 0,
            Self::Extracting(Side::Left) => 1,
            Self::Extracting(Side::Right) => 2,
            Self::Aligning => 3,
            Self::Rendering(_) => 4,
            Self::Done => 5,
            Self::Failed(_) => return None,
        })
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed(_))
    }

    /// Whether `next` is a legal successor. Rendering may repeat, once per
    /// format; everything else strictly advances.
    pub fn can_transition_to(&self, next: &RunState) -> bool {
        if self.is_terminal() {
            return false;
        }
        match (self.rank(), next.rank()) {
            (_, None) => true,
            (Some(4), Some(4)) => self != next,
            (Some(current), Some(next)) => next == current + 1,
            (None, _) => false,
        }
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Extracting(side) => write!(f, "extracting {side} edition"),
            Self::Aligning => f.write_str("aligning"),
            Self::Rendering(format) => write!(f, "rendering {format}"),
            Self::Done => f.write_str("done"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Records the states a run passes through.
#[derive(Debug)]
pub(crate) struct RunTracker {
    history: Vec<RunState>,
}

impl RunTracker {
    pub(crate) fn new() -> Self {
        Self {
            history: vec![RunState::Idle],
        }
    }

    pub(crate) fn current(&self) -> &RunState {
        // History always holds at least `Idle`.
        &self.history[self.history.len() - 1]
    }

    pub(crate) fn history(&self) -> &[RunState] {
        &self.history
    }

    pub(crate) fn advance(&mut self, next: RunState) {
        if !self.current().can_transition_to(&next) {
            warn!(from = %self.current(), to = %next, "Illegal run state transition ignored");
            return;
        }
        debug!(from = %self.current(), to = %next, "Run state");
        self.history.push(next);
    }

    /// Move to `Failed` and hand the error back for propagation.
    pub(crate) fn fail(&mut self, err: DiglotError) -> DiglotError {
        error!(state = %self.current(), error = %err, "Run failed");
        self.advance(RunState::Failed(err.to_string()));
        err
    }
}

/// Shared flag asking a run to stop at its next stage boundary.
///
/// Clones share the same flag, so one clone can be handed to whatever
/// decides to cancel while the run holds another.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
