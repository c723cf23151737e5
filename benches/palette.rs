//! Benchmarks for GVR palette conversion.
//!
//! A 256-entry palette is the largest a GVR texture carries.

extern crate needlework;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use needlework::formats::gvr::{PaletteCodec, PaletteFormat};
use std::hint::black_box;
use strum::IntoEnumIterator;

const ENTRIES: usize = 256;

/// Benchmark decoding a full palette in every format.
fn bench_decode(c: &mut Criterion) {
    let encoded: Vec<u8> = (0..ENTRIES * 2).map(|i| (i * 37) as u8).collect();

    let mut group = c.benchmark_group("palette_decode");
    group.throughput(Throughput::Elements(ENTRIES as u64));
    for format in PaletteFormat::iter() {
        let codec = format.codec(ENTRIES);
        group.bench_function(format.to_string(), |b| {
            b.iter(|| black_box(codec.decode(black_box(&encoded)).unwrap()));
        });
    }
    group.finish();
}

/// Benchmark encoding a full palette in every format.
fn bench_encode(c: &mut Criterion) {
    let rgba: Vec<u8> = (0..ENTRIES * 4).map(|i| (i * 13) as u8).collect();

    let mut group = c.benchmark_group("palette_encode");
    group.throughput(Throughput::Elements(ENTRIES as u64));
    for format in PaletteFormat::iter() {
        let codec = format.codec(ENTRIES);
        group.bench_function(format.to_string(), |b| {
            b.iter(|| black_box(codec.encode(black_box(&rgba)).unwrap()));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_decode, bench_encode);
criterion_main!(benches);
