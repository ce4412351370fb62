// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Positional aligner — pairs the i-th unit of one edition with the i-th unit
// of the other.

use diglot_core::types::{AlignedPair, ContentUnit};
use tracing::{debug, instrument};

/// Pair two unit sequences by position.
///
/// The result has exactly `max(left.len(), right.len())` pairs. Past the end
/// of the shorter sequence the missing side is `None`. Pair `i` holds
/// `left[i]` and `right[i]` whenever they exist.
#[instrument(skip_all, fields(left = left.len(), right = right.len()))]
pub fn align<'a>(left: &'a [ContentUnit], right: &'a [ContentUnit]) -> Vec<AlignedPair<'a>> {
    let len = left.len().max(right.len());
    let pairs: Vec<AlignedPair<'a>> = (0..len)
        .map(|pair_index| AlignedPair {
            left: left.get(pair_index),
            right: right.get(pair_index),
            pair_index,
        })
        .collect();

    if left.len() != right.len() {
        debug!(
            unmatched = left.len().abs_diff(right.len()),
            "Editions differ in length, trailing rows are one-sided"
        );
    }
    pairs
}
