// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the diglot-document crate: image normalization
// and positional alignment.

use std::io::Cursor;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

use diglot_core::config::{ImageSettings, TargetImageFormat};
use diglot_core::types::ContentUnit;
use diglot_document::align;
use diglot_document::image::normalize;

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Normalize a 1200x800 PNG down to 600 pixels wide, re-encoded as JPEG.
fn bench_normalize(c: &mut Criterion) {
    let img = RgbImage::from_fn(1200, 800, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 128]));
    let mut png = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .unwrap();

    let settings = ImageSettings {
        max_width: 600,
        format: TargetImageFormat::Jpeg,
        ..ImageSettings::default()
    };

    c.bench_function("normalize (1200x800 png -> 600w jpeg)", |b| {
        b.iter(|| black_box(normalize(black_box(&png), &settings).unwrap()));
    });
}

/// Align two editions of unequal length.
fn bench_align(c: &mut Criterion) {
    let left: Vec<ContentUnit> = (0..5_000)
        .map(|i| ContentUnit::paragraph(i, format!("left paragraph {i}")))
        .collect();
    let right: Vec<ContentUnit> = (0..5_400)
        .map(|i| ContentUnit::paragraph(i, format!("right paragraph {i}")))
        .collect();

    c.bench_function("align (5000 x 5400 units)", |b| {
        b.iter(|| black_box(align(black_box(&left), black_box(&right)).len()));
    });
}

criterion_group!(benches, bench_normalize, bench_align);
criterion_main!(benches);
