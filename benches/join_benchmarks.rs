//! Join operator benchmarks: hash join, symmetric hash join, semi/anti join.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use relquery::join::{anti_join, hash_join, semi_join, symmetric_hash_join};
use relquery::relation::{BoxedIterator, Relation, SliceIter};
use relquery::value::{Symbol, Tuple, Value};
use std::sync::Arc;
use std::time::Duration;

fn keyed_relation(columns: &[&str], size: u32) -> Relation {
    let rows = (0..size)
        .map(|i| Tuple::new(vec![Value::Int64(i as i64), Value::Int64((i * 2) as i64)]))
        .collect();
    Relation::materialized(columns.iter().map(|c| Symbol::new(*c)).collect(), rows)
}

fn streaming_keyed_relation(columns: &[&str], size: u32) -> Relation {
    let tuples: Vec<Tuple> = (0..size)
        .map(|i| Tuple::new(vec![Value::Int64(i as i64), Value::Int64((i * 2) as i64)]))
        .collect();
    let source: BoxedIterator = Box::new(SliceIter::new(Arc::new(tuples)));
    Relation::streaming(columns.iter().map(|c| Symbol::new(*c)).collect(), source, false)
}

fn bench_hash_join(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash_join");
    for size in [100u32, 1_000, 10_000] {
        let left = keyed_relation(&["?k", "?a"], size);
        let right = keyed_relation(&["?k", "?b"], size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| hash_join(&left, &right, &[Symbol::new("?k")], 1024).unwrap());
        });
    }
    group.finish();
}

fn bench_symmetric_hash_join(c: &mut Criterion) {
    let mut group = c.benchmark_group("symmetric_hash_join");
    for size in [100u32, 1_000] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                let left = streaming_keyed_relation(&["?k", "?a"], size);
                let right = streaming_keyed_relation(&["?k", "?b"], size);
                symmetric_hash_join(&left, &right, &[Symbol::new("?k")]).unwrap()
            });
        });
    }
    group.finish();
}

fn bench_semi_anti_join(c: &mut Criterion) {
    let mut group = c.benchmark_group("semi_anti_join");
    for size in [1_000u32, 10_000] {
        let left = keyed_relation(&["?k", "?a"], size);
        let right = keyed_relation(&["?k", "?b"], size / 2);
        group.bench_with_input(BenchmarkId::new("semi", size), &size, |b, _| {
            b.iter(|| semi_join(&left, &right, &[Symbol::new("?k")]).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("anti", size), &size, |b, _| {
            b.iter(|| anti_join(&left, &right, &[Symbol::new("?k")]).unwrap());
        });
    }
    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .measurement_time(Duration::from_secs(10))
        .warm_up_time(Duration::from_secs(3));
    targets = bench_hash_join, bench_symmetric_hash_join, bench_semi_anti_join
}
criterion_main!(benches);
