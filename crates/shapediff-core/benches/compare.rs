//! Alignment strategy benchmarks on synthetic arrays of keyed records.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::{json, Value};
use shapediff_core::{compare, from_json_value, DiffSettings};
use std::hint::black_box;

// ============================================================================
// Test data
// ============================================================================

fn records(ids: impl Iterator<Item = usize>) -> Value {
    json!({
        "items": ids.map(|i| json!({"id": i, "name": format!("item-{i}"), "price": i as f64 * 1.5}))
            .collect::<Vec<_>>()
    })
}

/// Same records, rotated by a tenth and with every seventh one dropped.
fn shuffled_pair(len: usize) -> (Value, Value) {
    let a = records(0..len);
    let shift = len / 10;
    let b = records((0..len).map(|i| (i + shift) % len).filter(|i| i % 7 != 0));
    (a, b)
}

// ============================================================================
// Benchmarks
// ============================================================================

fn bench_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("align");
    for len in [10usize, 100, 500] {
        let (a, b) = shuffled_pair(len);
        let tree_a = from_json_value(&a);
        let tree_b = from_json_value(&b);
        group.throughput(Throughput::Elements(len as u64));

        let strategies = [
            ("indexed", DiffSettings::new()),
            ("keyed", DiffSettings::new().keyed_by("$.items", "id")),
            ("subsequence", DiffSettings::new().aligned_by_subsequence("$.items")),
        ];
        for (name, settings) in &strategies {
            group.bench_with_input(BenchmarkId::new(*name, len), &len, |bench, _| {
                bench.iter(|| compare(black_box(&tree_a), black_box(&tree_b), settings));
            });
        }
    }
    group.finish();
}

fn bench_identical(c: &mut Criterion) {
    let doc = records(0..1_000);
    let tree_a = from_json_value(&doc);
    let tree_b = from_json_value(&doc);
    let settings = DiffSettings::new();
    c.bench_function("identical_1000", |bench| {
        bench.iter(|| compare(black_box(&tree_a), black_box(&tree_b), &settings));
    });
}

fn bench_all_changed(c: &mut Criterion) {
    let tree_a = from_json_value(&json!((0..20_000).collect::<Vec<u32>>()));
    let tree_b = from_json_value(&json!((1..=20_000).collect::<Vec<u32>>()));
    let settings = DiffSettings::new();
    c.bench_function("indexed_all_changed_20000", |bench| {
        bench.iter(|| compare(black_box(&tree_a), black_box(&tree_b), &settings));
    });
}

criterion_group!(benches, bench_strategies, bench_identical, bench_all_changed);
criterion_main!(benches);
