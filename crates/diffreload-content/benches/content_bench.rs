//! Benchmarks for fingerprint construction.
//!
//! Run with: cargo bench -p diffreload-content

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use diffreload_content::{EncodableContent, HashableContent};
use std::hint::black_box;

struct CellModel {
    text: String,
    detail: String,
    red: f32,
    green: f32,
    blue: f32,
}

fn cell(i: usize, text_len: usize) -> CellModel {
    CellModel {
        text: "x".repeat(text_len) + &i.to_string(),
        detail: format!("${}", i * 1000),
        red: 0.5,
        green: 0.75,
        blue: 1.0,
    }
}

fn bench_fingerprints(c: &mut Criterion) {
    let mut group = c.benchmark_group("content/fingerprint");

    for text_len in [8usize, 64, 512] {
        let model = cell(7, text_len);

        group.bench_with_input(
            BenchmarkId::new("encodable", text_len),
            &model,
            |b, m| {
                b.iter(|| {
                    let fp = EncodableContent::of(m)
                        .field(|m| &m.text)
                        .field(|m| &m.detail)
                        .field(|m| m.red)
                        .field(|m| m.green)
                        .field(|m| m.blue)
                        .data();
                    black_box(fp);
                })
            },
        );

        group.bench_with_input(
            BenchmarkId::new("hashable", text_len),
            &model,
            |b, m| {
                b.iter(|| {
                    let fp = HashableContent::of(m)
                        .field(|m| &m.text)
                        .field(|m| &m.detail)
                        .field(|m| m.red.to_bits())
                        .field(|m| m.green.to_bits())
                        .field(|m| m.blue.to_bits())
                        .hash_value();
                    black_box(fp);
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_fingerprints);
criterion_main!(benches);
