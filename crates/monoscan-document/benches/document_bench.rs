// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the monoscan-document crate: the per-page
// enhancement pipeline and page assembly on synthetic scans.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{DynamicImage, GrayImage, Luma};

use monoscan_core::{AssemblyOptions, Factor, PipelineConfig, ThresholdMode};
use monoscan_document::{PdfAssembler, ScanEnhancer};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A 600x800 light page with a dark left margin and a few rows of "text".
fn synthetic_page() -> DynamicImage {
    let img = GrayImage::from_fn(600, 800, |x, y| {
        if x < 40 {
            Luma([50u8])
        } else if (y / 20) % 3 == 0 && (80..520).contains(&x) && x % 7 < 4 {
            Luma([25u8])
        } else {
            Luma([225u8])
        }
    });
    DynamicImage::ImageLuma8(img)
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Full pipeline with every stage enabled.
fn bench_enhance_pipeline(c: &mut Criterion) {
    let page = synthetic_page();
    let config = PipelineConfig {
        contrast: Factor(1.3),
        brightness: Factor(1.1),
        sharpness: Factor(2.0),
        threshold: ThresholdMode::Binarize(192),
        corner_tolerance: Some(30),
    };

    c.bench_function("enhance_pipeline (600x800)", |b| {
        b.iter(|| {
            let enhancer = ScanEnhancer::from_dynamic(black_box(page.clone()));
            black_box(enhancer.enhance(&config).into_dynamic());
        });
    });
}

/// Encoding and serialising a single bi-level page.
fn bench_assemble_bilevel(c: &mut Criterion) {
    let page = ScanEnhancer::from_dynamic(synthetic_page())
        .enhance(&PipelineConfig::default())
        .into_dynamic();

    c.bench_function("assemble_bilevel_page (600x800)", |b| {
        b.iter(|| {
            let mut assembler = PdfAssembler::new(AssemblyOptions::default());
            if assembler.push(black_box(page.clone())).is_ok() {
                black_box(assembler.to_bytes().map(|bytes| bytes.len()).unwrap_or(0));
            }
        });
    });
}

criterion_group!(benches, bench_enhance_pipeline, bench_assemble_bilevel);
criterion_main!(benches);
