// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for bitmap extraction in the scanwerk-document crate.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{DynamicImage, GrayImage, Luma};

use scanwerk_core::{InMemoryDib, RawImageHandle};
use scanwerk_document::{BitmapExtractor, pack_dib};

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Extract an A4 page at 150 DPI (1240x1754) at the two depths scanners
/// produce most: 1-bit text pages and 24-bit color pages.
///
/// The packed DIB is built once; each iteration clones it into a fresh
/// handle because extraction consumes the handle.
fn bench_extract_a4(c: &mut Criterion) {
    let (width, height) = (1240u32, 1754u32);
    let mut page = GrayImage::from_pixel(width, height, Luma([250u8]));
    for y in (100..height - 100).step_by(24) {
        for x in 100..width - 100 {
            page.put_pixel(x, y, Luma([20u8]));
        }
    }
    let page = DynamicImage::ImageLuma8(page);

    let mut group = c.benchmark_group("extract_a4_150dpi");
    for bit_count in [1u16, 24] {
        let dib = pack_dib(&page, bit_count, 150).expect("pack failed");
        group.bench_function(format!("{bit_count}-bit"), |b| {
            b.iter(|| {
                let handle = RawImageHandle::new(InMemoryDib::new(dib.clone()));
                let owned = BitmapExtractor::new()
                    .extract(black_box(handle), None)
                    .expect("extract failed");
                black_box(owned);
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_extract_a4);
criterion_main!(benches);
