//! Query materialization benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tablink_bench::{owners_and_dogs, people};
use tablink_core::Value;
use tablink_query::{Aggregate, CompareOp, LinkChain, Query, Range, SortDescriptor};

const NAME: usize = 0;
const AGE: usize = 1;

/// Benchmark scanning with local predicates.
fn bench_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan");

    for rows in [1_000, 10_000, 100_000] {
        let (source, table) = people(rows);

        group.bench_with_input(BenchmarkId::new("int_equal", rows), &rows, |b, _| {
            b.iter(|| {
                let mut query = Query::new(table);
                query
                    .compare(&source, AGE, CompareOp::Equal, Value::Int(30), true)
                    .unwrap();
                black_box(query.count(&source, Range::ALL).unwrap());
            });
        });

        group.bench_with_input(BenchmarkId::new("string_or_int", rows), &rows, |b, _| {
            b.iter(|| {
                let mut query = Query::new(table);
                query
                    .compare(&source, NAME, CompareOp::BeginsWith, Value::String("a".into()), false)
                    .unwrap();
                query.or().unwrap();
                query
                    .compare(&source, AGE, CompareOp::LessThan, Value::Int(18), true)
                    .unwrap();
                black_box(query.find_all(&source, Range::ALL).unwrap());
            });
        });

        group.bench_with_input(BenchmarkId::new("average", rows), &rows, |b, _| {
            b.iter(|| {
                let mut query = Query::new(table);
                black_box(query.aggregate(&source, AGE, Aggregate::Average).unwrap());
            });
        });
    }

    group.finish();
}

/// Benchmark predicates and sorts through link columns.
fn bench_links(c: &mut Criterion) {
    let mut group = c.benchmark_group("links");

    for owners in [1_000, 10_000] {
        let (source, table) = owners_and_dogs(owners, 100);

        group.bench_with_input(BenchmarkId::new("link_list_any", owners), &owners, |b, _| {
            b.iter(|| {
                let mut query = Query::new(table);
                query
                    .link_compare(
                        &source,
                        &LinkChain::new(vec![1]),
                        0,
                        CompareOp::Equal,
                        Value::String("dog7".into()),
                        true,
                    )
                    .unwrap();
                black_box(query.count(&source, Range::ALL).unwrap());
            });
        });

        group.bench_with_input(BenchmarkId::new("sort_by_path", owners), &owners, |b, _| {
            let clause = SortDescriptor::by_path(&source, table, "TopDog.Name", true).unwrap();
            let descriptor = SortDescriptor::new(vec![clause]);
            b.iter(|| {
                let mut query = Query::new(table);
                black_box(query.find_all_sorted(&source, &descriptor).unwrap());
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_scan, bench_links);
criterion_main!(benches);
