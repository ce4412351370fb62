// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — normalization of embedded images found during extraction.

pub mod processor;

use diglot_core::config::ImageSettings;
use diglot_core::types::{ContentUnit, UnitBody};
use rayon::prelude::*;
use tracing::{debug, warn};

pub use processor::{ImageProcessor, normalize};

/// Normalize every image unit in `units`, in parallel across the rayon pool.
///
/// Paragraph units pass through untouched. An image that fails to normalize
/// is logged and dropped; the rest of the batch continues. Returns the
/// surviving units in their original order plus the number dropped.
pub fn normalize_units(units: Vec<ContentUnit>, settings: &ImageSettings) -> (Vec<ContentUnit>, usize) {
    let image_count = units
        .iter()
        .filter(|unit| matches!(unit.body, UnitBody::Image { .. }))
        .count();
    if image_count == 0 {
        return (units, 0);
    }
    debug!(image_count, "Normalizing embedded images");

    let total = units.len();
    let kept: Vec<ContentUnit> = units
        .into_par_iter()
        .filter_map(|unit| {
            let outcome = match &unit.body {
                UnitBody::Paragraph { .. } => None,
                UnitBody::Image { bytes, reference } => Some(
                    normalize(bytes, settings).map_err(|err| {
                        warn!(reference = %reference, error = %err, "Skipping image");
                    }),
                ),
            };
            match outcome {
                None => Some(unit),
                Some(Ok(normalized)) => Some(unit.with_image_bytes(normalized)),
                Some(Err(())) => None,
            }
        })
        .collect();

    let dropped = total - kept.len();
    (kept, dropped)
}
