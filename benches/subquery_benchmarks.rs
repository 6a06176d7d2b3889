//! Subquery executor benchmarks: sequential vs parallel correlated execution.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use relquery::context::Context;
use relquery::relation::Relation;
use relquery::subquery::{execute_subqueries, BatchRunner, SingleRunner, StrategyOptions};
use relquery::value::{Symbol, Tuple, Value};
use std::sync::Arc;
use std::time::Duration;

fn outer_rows(size: u32) -> Vec<Tuple> {
    (0..size).map(|i| Tuple::new(vec![Value::Int64((i % 20) as i64)])).collect()
}

fn inner_runner() -> SingleRunner {
    Arc::new(|combo, _ctx| {
        let group = combo.get(&Symbol::new("?group")).cloned().unwrap_or(Value::Null);
        let max = match group {
            Value::Int64(g) => g * 7,
            _ => 0,
        };
        Ok(Relation::materialized(vec![Symbol::new("?max")], vec![Tuple::new(vec![Value::Int64(max)])]))
    })
}

fn unused_batch_runner() -> BatchRunner {
    Arc::new(|_rel, _ctx| unreachable!())
}

fn bench_sequential_subqueries(c: &mut Criterion) {
    let mut group = c.benchmark_group("sequential_subqueries");
    for size in [100u32, 1_000] {
        let ctx = Context::background();
        let outer_cols = vec![Symbol::new("?group")];
        let rows = outer_rows(size);
        let opts = StrategyOptions { accepts_relation_input: false, parallel_enabled: false, parallel_threshold: usize::MAX };
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| execute_subqueries(&ctx, &outer_cols, &rows, &outer_cols, &opts, 1, inner_runner(), unused_batch_runner()).unwrap());
        });
    }
    group.finish();
}

fn bench_parallel_subqueries(c: &mut Criterion) {
    let mut group = c.benchmark_group("parallel_subqueries");
    for size in [100u32, 1_000] {
        let ctx = Context::background();
        let outer_cols = vec![Symbol::new("?group")];
        let rows = outer_rows(size);
        let opts = StrategyOptions { accepts_relation_input: false, parallel_enabled: true, parallel_threshold: 1 };
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| execute_subqueries(&ctx, &outer_cols, &rows, &outer_cols, &opts, 4, inner_runner(), unused_batch_runner()).unwrap());
        });
    }
    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .measurement_time(Duration::from_secs(10))
        .warm_up_time(Duration::from_secs(3));
    targets = bench_sequential_subqueries, bench_parallel_subqueries
}
criterion_main!(benches);
